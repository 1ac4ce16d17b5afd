pub mod config;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod ingest;
pub mod store;

pub use config::{Config, resolve_config_path};
pub use dashboard::Dashboard;
pub use error::{Error, Result};
pub use events::{DashboardEvent, UploadId, UploadRef, UploadStatus};
pub use ingest::{
    ACCEPTED_EXTENSIONS, IngestOutput, IngestionError, Ingestor, JsonRecordIngestor, Upload,
    decode_upload,
};
pub use store::RecordStore;
