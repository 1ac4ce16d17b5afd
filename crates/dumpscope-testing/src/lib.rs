//! Testing infrastructure for dumpscope tests.
//!
//! - `builders`: Fluent record builders with sensible defaults
//! - `fixtures`: A sample record set spanning all four sources, and upload files on disk
//! - `assertions`: Checks for aggregate invariants (ordering, bucket spacing)

pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use builders::{at_minute, base_time, heap, log, query, thread};
pub use fixtures::{
    UploadDir, sample_heap, sample_logs, sample_queries, sample_records, sample_threads,
    to_json_lines,
};
