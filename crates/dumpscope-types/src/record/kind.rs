use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Category of diagnostic artifact a record was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Thread,
    Heap,
    Log,
    Query,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Thread,
        SourceKind::Heap,
        SourceKind::Log,
        SourceKind::Query,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Thread => "thread",
            SourceKind::Heap => "heap",
            SourceKind::Log => "log",
            SourceKind::Query => "query",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "thread" => Ok(SourceKind::Thread),
            "heap" => Ok(SourceKind::Heap),
            "log" => Ok(SourceKind::Log),
            "query" => Ok(SourceKind::Query),
            _ => Err(Error::UnknownSourceKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Thread".parse::<SourceKind>().unwrap(), SourceKind::Thread);
        assert_eq!("QUERY".parse::<SourceKind>().unwrap(), SourceKind::Query);
        assert!("gc".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&SourceKind::Heap).unwrap();
        assert_eq!(json, "\"heap\"");
    }
}
