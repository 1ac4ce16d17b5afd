use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::error::{InvalidReason, InvalidRecord};
use crate::record::{
    DiagnosticRecord, HeapSample, LogEntry, QueryRecord, RecordPayload, ThreadSnapshot,
};

/// Outcome of running one ingestion batch through the validation gate
#[derive(Debug, Clone, Default)]
pub struct ValidatedBatch {
    pub accepted: Vec<DiagnosticRecord>,
    pub rejected: Vec<InvalidRecord>,
}

impl ValidatedBatch {
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Check a single record against the per-kind invariants.
pub fn validate(record: &DiagnosticRecord) -> Result<(), InvalidRecord> {
    if record.id.trim().is_empty() {
        return Err(InvalidRecord::anonymous(InvalidReason::EmptyId));
    }

    let result = match &record.payload {
        RecordPayload::Thread(t) => validate_thread(t),
        RecordPayload::Heap(h) => validate_heap(h),
        RecordPayload::Log(l) => validate_log(l),
        RecordPayload::Query(q) => validate_query(q),
    };

    result.map_err(|reason| InvalidRecord::new(record.id.clone(), reason))
}

/// Validate a whole batch.
///
/// Besides the per-record checks, ids must be unique and `captured_at` must
/// not go backwards within the batch. The later record of a conflicting pair
/// is the one rejected. Invalid records are never repaired.
pub fn validate_batch(records: Vec<DiagnosticRecord>) -> ValidatedBatch {
    let mut batch = ValidatedBatch::default();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut last_at: Option<DateTime<Utc>> = None;

    for record in records {
        if let Err(err) = validate(&record) {
            batch.rejected.push(err);
            continue;
        }

        if seen_ids.contains(&record.id) {
            batch
                .rejected
                .push(InvalidRecord::new(record.id, InvalidReason::DuplicateId));
            continue;
        }

        if let Some(previous) = last_at
            && record.captured_at < previous
        {
            batch.rejected.push(InvalidRecord::new(
                record.id,
                InvalidReason::OutOfOrder {
                    previous,
                    captured_at: record.captured_at,
                },
            ));
            continue;
        }

        last_at = Some(record.captured_at);
        seen_ids.insert(record.id.clone());
        batch.accepted.push(record);
    }

    batch
}

fn require(field: &'static str, value: &str) -> Result<(), InvalidReason> {
    if value.trim().is_empty() {
        Err(InvalidReason::EmptyField { field })
    } else {
        Ok(())
    }
}

fn validate_thread(t: &ThreadSnapshot) -> Result<(), InvalidReason> {
    require("thread_id", &t.thread_id)?;
    if !t.cpu_usage_percent.is_finite() || !(0.0..=100.0).contains(&t.cpu_usage_percent) {
        return Err(InvalidReason::CpuOutOfRange {
            value: t.cpu_usage_percent,
        });
    }
    if let Some(wait) = &t.wait {
        require("wait.held_resource", &wait.held_resource)?;
        require("wait.waiting_on_thread_id", &wait.waiting_on_thread_id)?;
    }
    Ok(())
}

fn validate_heap(h: &HeapSample) -> Result<(), InvalidReason> {
    require("region", &h.region)?;
    if h.used_bytes > h.capacity_bytes {
        return Err(InvalidReason::UsedExceedsCapacity {
            used_bytes: h.used_bytes,
            capacity_bytes: h.capacity_bytes,
        });
    }
    let histogram_bytes = h.histogram_bytes();
    if histogram_bytes > h.used_bytes {
        return Err(InvalidReason::HistogramExceedsUsed {
            histogram_bytes,
            used_bytes: h.used_bytes,
        });
    }
    for entry in &h.histogram {
        require("histogram.class_name", &entry.class_name)?;
    }
    Ok(())
}

fn validate_log(l: &LogEntry) -> Result<(), InvalidReason> {
    require("logger", &l.logger)
}

fn validate_query(q: &QueryRecord) -> Result<(), InvalidReason> {
    require("sql", &q.sql)?;
    for (field, value) in [("exec_time_ms", q.exec_time_ms), ("lock_time_ms", q.lock_time_ms)] {
        if !value.is_finite() || value < 0.0 {
            return Err(InvalidReason::InvalidDuration { field, value });
        }
    }
    if q.lock_time_ms > q.exec_time_ms {
        return Err(InvalidReason::LockExceedsExec {
            lock_time_ms: q.lock_time_ms,
            exec_time_ms: q.exec_time_ms,
        });
    }
    if q.rows_sent > q.rows_examined {
        return Err(InvalidReason::RowsSentExceedsExamined {
            rows_sent: q.rows_sent,
            rows_examined: q.rows_examined,
        });
    }
    Ok(())
}
