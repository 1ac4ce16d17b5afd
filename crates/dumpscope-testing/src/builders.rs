//! Fluent builders for diagnostic records.
//!
//! Every builder starts from valid defaults so a test only states the fields
//! it cares about. Ids default to `<kind>:<key>@<millis>`; set one explicitly
//! when two records would collide.

use chrono::{DateTime, Duration, TimeZone, Utc};
use dumpscope_types::{
    ClassHistogramEntry, DiagnosticRecord, HeapSample, LogEntry, LogLevel, QueryRecord,
    RecordPayload, ThreadPriority, ThreadSnapshot, ThreadState, WaitEdge,
};

/// 2024-01-15T10:00:00Z, the instant all fixtures are relative to.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
}

pub fn at_minute(minute: i64) -> DateTime<Utc> {
    base_time() + Duration::minutes(minute)
}

pub fn thread(thread_id: &str) -> ThreadBuilder {
    ThreadBuilder {
        id: None,
        at: base_time(),
        snapshot: ThreadSnapshot {
            thread_id: thread_id.to_string(),
            name: thread_id.to_string(),
            state: ThreadState::Runnable,
            cpu_usage_percent: 0.0,
            priority: ThreadPriority::Medium,
            wait: None,
        },
    }
}

pub fn heap(region: &str) -> HeapBuilder {
    HeapBuilder {
        id: None,
        at: base_time(),
        sample: HeapSample {
            region: region.to_string(),
            used_bytes: 0,
            capacity_bytes: 1024,
            histogram: Vec::new(),
        },
    }
}

pub fn log(level: LogLevel, message: &str) -> LogBuilder {
    LogBuilder {
        id: None,
        at: base_time(),
        entry: LogEntry {
            level,
            logger: "com.example.App".to_string(),
            message: message.to_string(),
            thread: "main".to_string(),
            module: "core".to_string(),
        },
    }
}

pub fn query(sql: &str) -> QueryBuilder {
    QueryBuilder {
        id: None,
        at: base_time(),
        query: QueryRecord {
            sql: sql.to_string(),
            exec_time_ms: 1.0,
            lock_time_ms: 0.0,
            rows_examined: 1,
            rows_sent: 1,
            database: "application_db".to_string(),
            suggestions: Vec::new(),
        },
    }
}

fn default_id(kind: &str, key: &str, at: DateTime<Utc>) -> String {
    format!("{}:{}@{}", kind, key, at.timestamp_millis())
}

pub struct ThreadBuilder {
    id: Option<String>,
    at: DateTime<Utc>,
    snapshot: ThreadSnapshot,
}

impl ThreadBuilder {
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = at;
        self
    }

    pub fn minute(self, minute: i64) -> Self {
        self.at(at_minute(minute))
    }

    pub fn name(mut self, name: &str) -> Self {
        self.snapshot.name = name.to_string();
        self
    }

    pub fn state(mut self, state: ThreadState) -> Self {
        self.snapshot.state = state;
        self
    }

    pub fn cpu(mut self, percent: f64) -> Self {
        self.snapshot.cpu_usage_percent = percent;
        self
    }

    pub fn priority(mut self, priority: ThreadPriority) -> Self {
        self.snapshot.priority = priority;
        self
    }

    /// Hold `resource` while waiting on whatever `thread_id` holds.
    pub fn waits_on(mut self, thread_id: &str, resource: &str) -> Self {
        self.snapshot.state = ThreadState::Blocked;
        self.snapshot.wait = Some(WaitEdge {
            held_resource: resource.to_string(),
            waiting_on_thread_id: thread_id.to_string(),
        });
        self
    }

    pub fn build(self) -> DiagnosticRecord {
        let id = self
            .id
            .unwrap_or_else(|| default_id("thread", &self.snapshot.thread_id, self.at));
        DiagnosticRecord::new(id, self.at, RecordPayload::Thread(self.snapshot))
    }
}

pub struct HeapBuilder {
    id: Option<String>,
    at: DateTime<Utc>,
    sample: HeapSample,
}

impl HeapBuilder {
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = at;
        self
    }

    pub fn minute(self, minute: i64) -> Self {
        self.at(at_minute(minute))
    }

    pub fn used(mut self, used_bytes: u64, capacity_bytes: u64) -> Self {
        self.sample.used_bytes = used_bytes;
        self.sample.capacity_bytes = capacity_bytes;
        self
    }

    pub fn class(mut self, class_name: &str, instance_count: u64, bytes: u64) -> Self {
        self.sample.histogram.push(ClassHistogramEntry {
            class_name: class_name.to_string(),
            instance_count,
            bytes,
        });
        self
    }

    pub fn build(self) -> DiagnosticRecord {
        let id = self
            .id
            .unwrap_or_else(|| default_id("heap", &self.sample.region, self.at));
        DiagnosticRecord::new(id, self.at, RecordPayload::Heap(self.sample))
    }
}

pub struct LogBuilder {
    id: Option<String>,
    at: DateTime<Utc>,
    entry: LogEntry,
}

impl LogBuilder {
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = at;
        self
    }

    pub fn minute(self, minute: i64) -> Self {
        self.at(at_minute(minute))
    }

    pub fn logger(mut self, logger: &str) -> Self {
        self.entry.logger = logger.to_string();
        self
    }

    pub fn thread(mut self, thread: &str) -> Self {
        self.entry.thread = thread.to_string();
        self
    }

    pub fn module(mut self, module: &str) -> Self {
        self.entry.module = module.to_string();
        self
    }

    pub fn build(self) -> DiagnosticRecord {
        let id = self
            .id
            .unwrap_or_else(|| default_id("log", &self.entry.logger, self.at));
        DiagnosticRecord::new(id, self.at, RecordPayload::Log(self.entry))
    }
}

pub struct QueryBuilder {
    id: Option<String>,
    at: DateTime<Utc>,
    query: QueryRecord,
}

impl QueryBuilder {
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = at;
        self
    }

    pub fn minute(self, minute: i64) -> Self {
        self.at(at_minute(minute))
    }

    pub fn exec_ms(mut self, exec_time_ms: f64) -> Self {
        self.query.exec_time_ms = exec_time_ms;
        self
    }

    pub fn lock_ms(mut self, lock_time_ms: f64) -> Self {
        self.query.lock_time_ms = lock_time_ms;
        self
    }

    pub fn rows(mut self, examined: u64, sent: u64) -> Self {
        self.query.rows_examined = examined;
        self.query.rows_sent = sent;
        self
    }

    pub fn database(mut self, database: &str) -> Self {
        self.query.database = database.to_string();
        self
    }

    pub fn suggest(mut self, suggestion: &str) -> Self {
        self.query.suggestions.push(suggestion.to_string());
        self
    }

    pub fn build(self) -> DiagnosticRecord {
        let id = self
            .id
            .unwrap_or_else(|| default_id("query", &self.query.database, self.at));
        DiagnosticRecord::new(id, self.at, RecordPayload::Query(self.query))
    }
}
