use serde::{Deserialize, Serialize};
use std::fmt;

use super::kind::SourceKind;

/// Record payload variants, one per source kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source_kind", content = "payload")]
#[serde(rename_all = "snake_case")]
pub enum RecordPayload {
    Thread(ThreadSnapshot),
    Heap(HeapSample),
    Log(LogEntry),
    Query(QueryRecord),
}

impl RecordPayload {
    pub fn kind(&self) -> SourceKind {
        match self {
            RecordPayload::Thread(_) => SourceKind::Thread,
            RecordPayload::Heap(_) => SourceKind::Heap,
            RecordPayload::Log(_) => SourceKind::Log,
            RecordPayload::Query(_) => SourceKind::Query,
        }
    }

    /// Categorical value the record is grouped and filtered by:
    /// thread state, heap region, log level or SQL verb.
    pub fn category(&self) -> String {
        match self {
            RecordPayload::Thread(t) => t.state.as_str().to_string(),
            RecordPayload::Heap(h) => h.region.clone(),
            RecordPayload::Log(l) => l.level.as_str().to_string(),
            RecordPayload::Query(q) => q.verb(),
        }
    }

    /// Every free-text field a search term is matched against
    pub fn text_fields(&self) -> Vec<&str> {
        match self {
            RecordPayload::Thread(t) => {
                let mut fields = vec![t.thread_id.as_str(), t.name.as_str(), t.state.as_str()];
                fields.push(t.priority.as_str());
                if let Some(wait) = &t.wait {
                    fields.push(wait.held_resource.as_str());
                    fields.push(wait.waiting_on_thread_id.as_str());
                }
                fields
            }
            RecordPayload::Heap(h) => {
                let mut fields = vec![h.region.as_str()];
                fields.extend(h.histogram.iter().map(|e| e.class_name.as_str()));
                fields
            }
            RecordPayload::Log(l) => vec![
                l.level.as_str(),
                l.logger.as_str(),
                l.message.as_str(),
                l.thread.as_str(),
                l.module.as_str(),
            ],
            RecordPayload::Query(q) => {
                let mut fields = vec![q.sql.as_str(), q.database.as_str()];
                fields.extend(q.suggestions.iter().map(String::as_str));
                fields
            }
        }
    }
}

// --- Thread dumps ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSnapshot {
    /// Stable identity of the thread across snapshots; wait edges point here
    pub thread_id: String,
    pub name: String,
    pub state: ThreadState,
    pub cpu_usage_percent: f64,
    pub priority: ThreadPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<WaitEdge>,
}

/// The thread holds `held_resource` and is blocked on a resource owned by
/// `waiting_on_thread_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaitEdge {
    pub held_resource: String,
    pub waiting_on_thread_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadState {
    Runnable,
    Blocked,
    Waiting,
    TimedWaiting,
    Terminated,
}

impl ThreadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreadState::Runnable => "RUNNABLE",
            ThreadState::Blocked => "BLOCKED",
            ThreadState::Waiting => "WAITING",
            ThreadState::TimedWaiting => "TIMED_WAITING",
            ThreadState::Terminated => "TERMINATED",
        }
    }

    pub fn is_live(&self) -> bool {
        !matches!(self, ThreadState::Terminated)
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadPriority {
    Low,
    Medium,
    High,
}

impl ThreadPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreadPriority::Low => "LOW",
            ThreadPriority::Medium => "MEDIUM",
            ThreadPriority::High => "HIGH",
        }
    }
}

impl fmt::Display for ThreadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Heap dumps ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeapSample {
    pub region: String,
    pub used_bytes: u64,
    pub capacity_bytes: u64,
    /// Partial histograms are allowed: entries need not sum to `used_bytes`
    #[serde(default)]
    pub histogram: Vec<ClassHistogramEntry>,
}

impl HeapSample {
    pub fn histogram_bytes(&self) -> u64 {
        self.histogram
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.bytes))
    }

    pub fn utilization_percent(&self) -> f64 {
        if self.capacity_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.capacity_bytes as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassHistogramEntry {
    pub class_name: String,
    pub instance_count: u64,
    pub bytes: u64,
}

// --- Application server logs ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub logger: String,
    pub message: String,
    pub thread: String,
    pub module: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Database query logs ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// Normalized SQL text
    pub sql: String,
    pub exec_time_ms: f64,
    pub lock_time_ms: f64,
    pub rows_examined: u64,
    pub rows_sent: u64,
    pub database: String,
    /// Advisory optimization hints; not guaranteed actionable
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl QueryRecord {
    /// Leading SQL keyword, upper-cased. `OTHER` when the text has none.
    pub fn verb(&self) -> String {
        let keyword: String = self
            .sql
            .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();

        if keyword.is_empty() {
            "OTHER".to_string()
        } else {
            keyword.to_ascii_uppercase()
        }
    }
}
