use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kind::SourceKind;
use super::payload::{HeapSample, LogEntry, QueryRecord, RecordPayload, ThreadSnapshot};

// NOTE: Record model
//
// A record is one normalized unit of evidence produced by the ingestion
// collaborator. The kind is carried by the payload variant only, so a record
// can never claim one kind and hold another kind's fields.
//
// Records are immutable after validation. Nothing downstream of the store
// takes `&mut DiagnosticRecord`.

/// Normalized diagnostic record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    /// Unique within one ingestion batch
    pub id: String,

    /// When the evidence was captured (UTC)
    pub captured_at: DateTime<Utc>,

    /// Kind discriminant and kind-specific fields (flattened)
    #[serde(flatten)]
    pub payload: RecordPayload,
}

impl DiagnosticRecord {
    pub fn new(id: impl Into<String>, captured_at: DateTime<Utc>, payload: RecordPayload) -> Self {
        Self {
            id: id.into(),
            captured_at,
            payload,
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        self.payload.kind()
    }

    pub fn as_thread(&self) -> Option<&ThreadSnapshot> {
        match &self.payload {
            RecordPayload::Thread(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_heap(&self) -> Option<&HeapSample> {
        match &self.payload {
            RecordPayload::Heap(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_log(&self) -> Option<&LogEntry> {
        match &self.payload {
            RecordPayload::Log(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_query(&self) -> Option<&QueryRecord> {
        match &self.payload {
            RecordPayload::Query(q) => Some(q),
            _ => None,
        }
    }
}
