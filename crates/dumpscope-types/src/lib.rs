pub mod error;
pub mod filter;
pub mod record;
pub mod tab;
pub mod validation;

pub use error::{Error, InvalidReason, InvalidRecord, Result};
pub use filter::{RecordFilter, TimeRange};
pub use record::*;
pub use tab::{TABS, Tab, TabInfo};
pub use validation::{ValidatedBatch, validate, validate_batch};
