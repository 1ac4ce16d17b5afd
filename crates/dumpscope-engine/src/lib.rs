// Engine module - aggregation and view composition
// Sits between normalized records (types) and the dashboard shell (runtime)

pub mod adapters;
pub mod aggregate;
pub mod composer;
pub mod filter;
pub mod options;
pub mod overview;
pub mod view_model;

pub use adapters::{
    ClassRank, DatabaseStats, DeadlockGroup, DeadlockMember, ErrorSignature, HeapAdapter,
    HeapBucket, LeakSuspect, LogAdapter, LogBucket, ModuleBreakdown, QueryAdapter, QueryBucket,
    QueryRank, RegionUsage, Severity, SourceAdapter, ThreadAdapter, ThreadBucket, ThreadRank,
    VerbStats, detect_deadlocks,
};
pub use aggregate::{CategoryCount, Distribution, TrendBucket};
pub use composer::ViewComposer;
pub use options::{BucketWidths, HealthStatus, Thresholds, ViewOptions};
pub use overview::{ComponentHealth, StatCard};
pub use view_model::{
    HeapView, LogView, OverviewView, QueryView, SourceCount, ThreadView, Trend, ViewContent,
    ViewModel,
};

use dumpscope_types::{DiagnosticRecord, RecordFilter, Tab};

// Façade API - stable entry point for the runtime and CLI

/// Render one tab over `records` with default options
pub fn render(records: &[DiagnosticRecord], tab: Tab, filter: &RecordFilter) -> ViewModel {
    ViewComposer::default().render(records, tab, filter)
}

/// Render one tab with explicit options
pub fn render_with(
    records: &[DiagnosticRecord],
    tab: Tab,
    filter: &RecordFilter,
    options: &ViewOptions,
) -> ViewModel {
    ViewComposer::new(options.clone()).render(records, tab, filter)
}
