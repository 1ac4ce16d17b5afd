use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Handle returned by `Dashboard::upload`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UploadId(Uuid);

impl UploadId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Ingested { accepted: usize, rejected: usize },
    Failed { reason: String },
}

/// An upload as listed by the shell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadRef {
    pub id: UploadId,
    pub name: String,
    #[serde(flatten)]
    pub status: UploadStatus,
}

/// Outcome of one ingestion, as observed by the session owner
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    UploadIngested {
        id: UploadId,
        accepted: usize,
        rejected: usize,
    },
    UploadFailed {
        id: UploadId,
        reason: String,
    },
}

impl DashboardEvent {
    pub fn upload_id(&self) -> UploadId {
        match self {
            DashboardEvent::UploadIngested { id, .. } | DashboardEvent::UploadFailed { id, .. } => {
                *id
            }
        }
    }
}
