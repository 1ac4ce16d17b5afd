use chrono::Duration;
use dumpscope_types::SourceKind;
use serde::Serialize;

/// Health classification shared by stat cards, components and heap regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

/// Percent thresholds; a value at or above a threshold takes that status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warning_percent: f64,
    pub critical_percent: f64,
}

impl Thresholds {
    pub fn classify(&self, percent: f64) -> HealthStatus {
        if percent >= self.critical_percent {
            HealthStatus::Critical
        } else if percent >= self.warning_percent {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }
}

/// Per-source trend bucket widths
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketWidths {
    pub thread: Duration,
    pub heap: Duration,
    pub log: Duration,
    pub query: Duration,
}

impl BucketWidths {
    pub fn for_kind(&self, kind: SourceKind) -> Duration {
        match kind {
            SourceKind::Thread => self.thread,
            SourceKind::Heap => self.heap,
            SourceKind::Log => self.log,
            SourceKind::Query => self.query,
        }
    }

    pub fn set(&mut self, kind: SourceKind, width: Duration) {
        match kind {
            SourceKind::Thread => self.thread = width,
            SourceKind::Heap => self.heap = width,
            SourceKind::Log => self.log = width,
            SourceKind::Query => self.query = width,
        }
    }
}

impl Default for BucketWidths {
    fn default() -> Self {
        Self {
            thread: Duration::minutes(5),
            heap: Duration::minutes(5),
            log: Duration::minutes(15),
            query: Duration::minutes(15),
        }
    }
}

/// Knobs the view composer reads. Everything has a default.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    /// Length of every top-N list
    pub top_n: usize,
    pub bucket_widths: BucketWidths,
    /// Upper bound on trend length; wider spans get a coarser bucket
    pub max_trend_buckets: usize,
    /// Queries at or above this execution time count as slow
    pub slow_query_ms: f64,
    /// Utilization thresholds (heap regions, components)
    pub utilization: Thresholds,
    /// Error-rate thresholds (log share of ERROR entries)
    pub error_rate: Thresholds,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            top_n: 5,
            bucket_widths: BucketWidths::default(),
            max_trend_buckets: 500,
            slow_query_ms: 1000.0,
            utilization: Thresholds {
                warning_percent: 60.0,
                critical_percent: 80.0,
            },
            error_rate: Thresholds {
                warning_percent: 1.0,
                critical_percent: 5.0,
            },
        }
    }
}
