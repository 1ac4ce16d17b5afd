// Ingestion boundary
//
// Turning raw dump and log bytes into records belongs to an external
// collaborator. The shell only knows the `Ingestor` trait: hand over an
// upload, eventually get records back or a failure reason. Anything an
// ingestor could not decode is reported through `rejected` instead of
// failing the whole upload.

use chrono::DateTime;
use dumpscope_types::{DiagnosticRecord, InvalidReason, InvalidRecord, SourceKind};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::path::Path;

use crate::Result;

/// File extensions the dashboard advertises for uploads. Advisory only:
/// other files are still forwarded to the ingestor.
pub const ACCEPTED_EXTENSIONS: [&str; 5] = ["txt", "log", "dump", "hprof", "sql"];

/// One uploaded file
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Source kind chosen by the user, if any
    pub declared_kind: Option<SourceKind>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            declared_kind: None,
        }
    }

    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.declared_kind = Some(kind);
        self
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    pub fn has_accepted_extension(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
    }
}

/// Upload-level failure; nothing from the upload reaches the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionError {
    pub reason: String,
}

impl IngestionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for IngestionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ingestion failed: {}", self.reason)
    }
}

impl std::error::Error for IngestionError {}

/// What an ingestor produced for one upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutput {
    /// Decoded records, not yet validated
    pub records: Vec<DiagnosticRecord>,
    /// Entries the ingestor could not turn into records
    pub rejected: Vec<InvalidRecord>,
}

/// External collaborator turning uploads into normalized records.
///
/// `submit` is called on a spawned task; implementations must not assume
/// completions are observed in submission order.
pub trait Ingestor: Send + Sync + 'static {
    fn submit(
        &self,
        upload: Upload,
    ) -> impl Future<Output = std::result::Result<IngestOutput, IngestionError>> + Send;
}

/// Ingestor for files that already hold normalized records, as a JSON array
/// or as one JSON object per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordIngestor;

impl Ingestor for JsonRecordIngestor {
    fn submit(
        &self,
        upload: Upload,
    ) -> impl Future<Output = std::result::Result<IngestOutput, IngestionError>> + Send {
        async move { decode_upload(&upload) }
    }
}

/// Decode an upload synchronously. Exposed for callers that do not need the
/// async boundary.
pub fn decode_upload(upload: &Upload) -> std::result::Result<IngestOutput, IngestionError> {
    let text = std::str::from_utf8(&upload.bytes)
        .map_err(|e| IngestionError::new(format!("{}: not UTF-8 text ({})", upload.name, e)))?;

    let entries: Vec<std::result::Result<Value, InvalidRecord>> =
        if text.trim_start().starts_with('[') {
            let values: Vec<Value> = serde_json::from_str(text).map_err(|e| {
                IngestionError::new(format!("{}: invalid JSON array ({})", upload.name, e))
            })?;
            values.into_iter().map(Ok).collect()
        } else {
            text.lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(n, line)| {
                    serde_json::from_str::<Value>(line).map_err(|e| {
                        InvalidRecord::anonymous(InvalidReason::Malformed {
                            detail: format!("line {}: {}", n + 1, e),
                        })
                    })
                })
                .collect()
        };

    let mut output = IngestOutput::default();
    let seen = entries.len();

    for entry in entries {
        match entry.and_then(|value| decode_record(value, upload.declared_kind)) {
            Ok(record) => output.records.push(record),
            Err(rejected) => output.rejected.push(rejected),
        }
    }

    if seen > 0 && output.records.is_empty() {
        let first = output
            .rejected
            .first()
            .map(|r| r.to_string())
            .unwrap_or_default();
        return Err(IngestionError::new(format!(
            "{}: no decodable record in {} entr{} (first problem: {})",
            upload.name,
            seen,
            if seen == 1 { "y" } else { "ies" },
            first
        )));
    }

    Ok(output)
}

fn decode_record(
    value: Value,
    declared: Option<SourceKind>,
) -> std::result::Result<DiagnosticRecord, InvalidRecord> {
    let id = value.get("id").and_then(Value::as_str).map(str::to_string);
    let reject = |reason: InvalidReason| match &id {
        Some(id) => InvalidRecord::new(id.clone(), reason),
        None => InvalidRecord::anonymous(reason),
    };

    // Report unparsable instants precisely rather than as a generic decode error
    if let Some(raw) = value.get("captured_at").and_then(Value::as_str)
        && DateTime::parse_from_rfc3339(raw).is_err()
    {
        return Err(reject(InvalidReason::InvalidTimestamp {
            value: raw.to_string(),
        }));
    }

    let record: DiagnosticRecord = serde_json::from_value(value).map_err(|e| {
        reject(InvalidReason::Malformed {
            detail: e.to_string(),
        })
    })?;

    if let Some(declared) = declared
        && declared != record.source_kind()
    {
        return Err(reject(InvalidReason::KindMismatch {
            declared,
            actual: record.source_kind(),
        }));
    }

    Ok(record)
}
