// Source adapters - one per source kind
//
// Each adapter knows which payload variant it consumes and how to derive the
// three aggregate shapes every source tab shows: a categorical distribution,
// a top-N ranking and a gap-free trend. Adapters are stateless apart from
// their configuration and never mutate records.

pub mod deadlock;
pub mod heap;
pub mod log;
pub mod query;
pub mod thread;

pub use deadlock::{DeadlockGroup, DeadlockMember, detect_deadlocks};
pub use heap::{ClassRank, HeapAdapter, HeapBucket, LeakSuspect, RegionUsage};
pub use log::{ErrorSignature, LogAdapter, LogBucket, ModuleBreakdown, severity_of, signature_of};
pub use query::{DatabaseStats, QueryAdapter, QueryBucket, QueryRank, VerbStats};
pub use thread::{ThreadAdapter, ThreadBucket, ThreadRank, latest_snapshots};

use chrono::Duration;
use dumpscope_types::{DiagnosticRecord, SourceKind};
use serde::Serialize;

use crate::aggregate::{self, Distribution, TrendBucket};

/// Severity attached to detected problems (deadlocks, leak suspects, error signatures)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Capability set shared by all source adapters.
///
/// Records of other kinds in the input are skipped, so an adapter can be
/// handed any window of records.
pub trait SourceAdapter {
    type Payload;
    type Ranked: Serialize;
    type BucketStats: Default + Serialize;

    const KIND: SourceKind;

    /// The adapter's payload, if the record is of its kind
    fn payload(record: &DiagnosticRecord) -> Option<&Self::Payload>;

    /// Categorical field used by `summarize`
    fn category(&self, payload: &Self::Payload) -> String;

    /// Top `n` entries by the adapter's severity field
    fn rank(&self, records: &[&DiagnosticRecord], n: usize) -> Vec<Self::Ranked>;

    /// Fold one record into its trend bucket
    fn accumulate(&self, stats: &mut Self::BucketStats, payload: &Self::Payload);

    /// Called once per bucket after all records were accumulated
    fn finish_bucket(&self, _stats: &mut Self::BucketStats, _count: usize) {}

    fn summarize(&self, records: &[&DiagnosticRecord]) -> Distribution {
        aggregate::distribution(
            records
                .iter()
                .filter_map(|r| Self::payload(r))
                .map(|p| self.category(p)),
        )
    }

    fn trend(
        &self,
        records: &[&DiagnosticRecord],
        width: Duration,
    ) -> Vec<TrendBucket<Self::BucketStats>> {
        let own = records
            .iter()
            .copied()
            .filter(|r| Self::payload(r).is_some());

        aggregate::trend(
            own,
            width,
            |stats, record| {
                if let Some(payload) = Self::payload(record) {
                    self.accumulate(stats, payload);
                }
            },
            |stats, count| self.finish_bucket(stats, count),
        )
    }
}
