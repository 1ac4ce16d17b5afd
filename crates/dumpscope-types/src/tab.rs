use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::record::SourceKind;

/// Dashboard tab. The set and its order are fixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tab {
    #[default]
    #[serde(rename = "overview")]
    Overview,
    #[serde(rename = "thread-dump")]
    ThreadDump,
    #[serde(rename = "heap-dump")]
    HeapDump,
    #[serde(rename = "jboss-logs")]
    JbossLogs,
    #[serde(rename = "mysql-queries")]
    MysqlQueries,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TabInfo {
    pub id: &'static str,
    pub label: &'static str,
}

pub const TABS: [TabInfo; 5] = [
    TabInfo {
        id: "overview",
        label: "Overview",
    },
    TabInfo {
        id: "thread-dump",
        label: "Thread Dumps",
    },
    TabInfo {
        id: "heap-dump",
        label: "Heap Analysis",
    },
    TabInfo {
        id: "jboss-logs",
        label: "JBoss Logs",
    },
    TabInfo {
        id: "mysql-queries",
        label: "MySQL Queries",
    },
];

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Overview,
        Tab::ThreadDump,
        Tab::HeapDump,
        Tab::JbossLogs,
        Tab::MysqlQueries,
    ];

    pub fn info(&self) -> TabInfo {
        match self {
            Tab::Overview => TABS[0],
            Tab::ThreadDump => TABS[1],
            Tab::HeapDump => TABS[2],
            Tab::JbossLogs => TABS[3],
            Tab::MysqlQueries => TABS[4],
        }
    }

    pub fn id(&self) -> &'static str {
        self.info().id
    }

    pub fn label(&self) -> &'static str {
        self.info().label
    }

    /// Source kind rendered by this tab; `None` for the cross-source overview
    pub fn source_kind(&self) -> Option<SourceKind> {
        match self {
            Tab::Overview => None,
            Tab::ThreadDump => Some(SourceKind::Thread),
            Tab::HeapDump => Some(SourceKind::Heap),
            Tab::JbossLogs => Some(SourceKind::Log),
            Tab::MysqlQueries => Some(SourceKind::Query),
        }
    }

    pub fn for_kind(kind: SourceKind) -> Tab {
        match kind {
            SourceKind::Thread => Tab::ThreadDump,
            SourceKind::Heap => Tab::HeapDump,
            SourceKind::Log => Tab::JbossLogs,
            SourceKind::Query => Tab::MysqlQueries,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Tab {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::ALL
            .into_iter()
            .find(|tab| tab.id() == s)
            .ok_or_else(|| Error::UnknownTab(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tabs_fixed_order() {
        let ids: Vec<&str> = TABS.iter().map(|t| t.id).collect();
        assert_eq!(
            ids,
            vec![
                "overview",
                "thread-dump",
                "heap-dump",
                "jboss-logs",
                "mysql-queries"
            ]
        );
        for (tab, info) in Tab::ALL.iter().zip(TABS.iter()) {
            assert_eq!(tab.info(), *info);
        }
    }

    #[test]
    fn test_tab_round_trip_through_id() {
        for tab in Tab::ALL {
            assert_eq!(tab.id().parse::<Tab>().unwrap(), tab);
        }
        assert!(matches!("gc-logs".parse::<Tab>(), Err(Error::UnknownTab(_))));
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Tab::Overview.source_kind(), None);
        for kind in SourceKind::ALL {
            assert_eq!(Tab::for_kind(kind).source_kind(), Some(kind));
        }
    }
}
