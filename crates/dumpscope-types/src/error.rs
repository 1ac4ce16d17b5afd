use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::record::SourceKind;

/// Result type for dumpscope-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the types layer
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A record failed the validation gate
    InvalidRecord(InvalidRecord),

    /// Tab identifier not in the fixed tab list
    UnknownTab(String),

    /// Source kind name not recognized
    UnknownSourceKind(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidRecord(err) => write!(f, "Invalid record: {}", err),
            Error::UnknownTab(id) => write!(f, "Unknown tab: {}", id),
            Error::UnknownSourceKind(name) => write!(f, "Unknown source kind: {}", name),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidRecord(err) => Some(err),
            Error::UnknownTab(_) | Error::UnknownSourceKind(_) => None,
        }
    }
}

impl From<InvalidRecord> for Error {
    fn from(err: InvalidRecord) -> Self {
        Error::InvalidRecord(err)
    }
}

/// A record rejected by validation.
///
/// Carries the record id when one could be read, so rejected lines from a
/// file that never decoded still produce a report entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub reason: InvalidReason,
}

impl InvalidRecord {
    pub fn new(record_id: impl Into<String>, reason: InvalidReason) -> Self {
        Self {
            record_id: Some(record_id.into()),
            reason,
        }
    }

    pub fn anonymous(reason: InvalidReason) -> Self {
        Self {
            record_id: None,
            reason,
        }
    }
}

impl fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record_id {
            Some(id) => write!(f, "record '{}': {}", id, self.reason),
            None => write!(f, "{}", self.reason),
        }
    }
}

impl std::error::Error for InvalidRecord {}

/// Why a record was rejected
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidReason {
    EmptyId,
    DuplicateId,
    OutOfOrder {
        previous: DateTime<Utc>,
        captured_at: DateTime<Utc>,
    },
    InvalidTimestamp {
        value: String,
    },
    Malformed {
        detail: String,
    },
    KindMismatch {
        declared: SourceKind,
        actual: SourceKind,
    },
    EmptyField {
        field: &'static str,
    },
    CpuOutOfRange {
        value: f64,
    },
    UsedExceedsCapacity {
        used_bytes: u64,
        capacity_bytes: u64,
    },
    HistogramExceedsUsed {
        histogram_bytes: u64,
        used_bytes: u64,
    },
    InvalidDuration {
        field: &'static str,
        value: f64,
    },
    LockExceedsExec {
        lock_time_ms: f64,
        exec_time_ms: f64,
    },
    RowsSentExceedsExamined {
        rows_sent: u64,
        rows_examined: u64,
    },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::EmptyId => write!(f, "record id is empty"),
            InvalidReason::DuplicateId => write!(f, "record id already used in this batch"),
            InvalidReason::OutOfOrder {
                previous,
                captured_at,
            } => write!(
                f,
                "captured_at {} precedes previous record at {}",
                captured_at.to_rfc3339(),
                previous.to_rfc3339()
            ),
            InvalidReason::InvalidTimestamp { value } => {
                write!(f, "captured_at '{}' is not a valid instant", value)
            }
            InvalidReason::Malformed { detail } => write!(f, "malformed record: {}", detail),
            InvalidReason::KindMismatch { declared, actual } => write!(
                f,
                "declared kind {} does not match record kind {}",
                declared, actual
            ),
            InvalidReason::EmptyField { field } => write!(f, "field `{}` is empty", field),
            InvalidReason::CpuOutOfRange { value } => {
                write!(f, "cpu_usage_percent {} outside [0, 100]", value)
            }
            InvalidReason::UsedExceedsCapacity {
                used_bytes,
                capacity_bytes,
            } => write!(
                f,
                "used_bytes {} exceeds capacity_bytes {}",
                used_bytes, capacity_bytes
            ),
            InvalidReason::HistogramExceedsUsed {
                histogram_bytes,
                used_bytes,
            } => write!(
                f,
                "histogram bytes {} exceed used_bytes {}",
                histogram_bytes, used_bytes
            ),
            InvalidReason::InvalidDuration { field, value } => {
                write!(f, "{} must be a non-negative number, got {}", field, value)
            }
            InvalidReason::LockExceedsExec {
                lock_time_ms,
                exec_time_ms,
            } => write!(
                f,
                "lock_time_ms {} exceeds exec_time_ms {}",
                lock_time_ms, exec_time_ms
            ),
            InvalidReason::RowsSentExceedsExamined {
                rows_sent,
                rows_examined,
            } => write!(
                f,
                "rows_sent {} exceeds rows_examined {}",
                rows_sent, rows_examined
            ),
        }
    }
}
