use dumpscope_types::{RecordFilter, SourceKind, Tab};
use serde::Serialize;

use crate::adapters::{
    ClassRank, DatabaseStats, DeadlockGroup, ErrorSignature, HeapBucket, LeakSuspect, LogBucket,
    ModuleBreakdown, QueryBucket, QueryRank, RegionUsage, ThreadBucket, ThreadRank, VerbStats,
};
use crate::aggregate::{Distribution, TrendBucket};
use crate::overview::{ComponentHealth, StatCard};

/// Everything a renderer needs to draw one tab
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub tab: Tab,
    pub filter: RecordFilter,
    /// Store revision the view was computed at
    pub revision: u64,
    pub content: ViewContent,
}

impl ViewModel {
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    /// True when the tab has nothing to show under the current filter
    pub fn is_empty(&self) -> bool {
        match &self.content {
            ViewContent::Overview(v) => v.total_records == 0,
            ViewContent::Thread(v) => v.empty,
            ViewContent::Heap(v) => v.empty,
            ViewContent::Log(v) => v.empty,
            ViewContent::Query(v) => v.empty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewContent {
    Overview(OverviewView),
    Thread(ThreadView),
    Heap(HeapView),
    Log(LogView),
    Query(QueryView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend<S> {
    pub bucket_width_secs: i64,
    pub buckets: Vec<TrendBucket<S>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceCount {
    pub source_kind: SourceKind,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewView {
    /// Records passing the search and time filter, all kinds
    pub total_records: usize,
    pub per_source: Vec<SourceCount>,
    pub stats: Vec<StatCard>,
    pub components: Vec<ComponentHealth>,
    pub top_errors: Vec<ErrorSignature>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadView {
    pub total_records: usize,
    pub matched_records: usize,
    pub empty: bool,
    pub states: Distribution,
    pub top_cpu: Vec<ThreadRank>,
    pub trend: Trend<ThreadBucket>,
    pub deadlocks: Vec<DeadlockGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeapView {
    pub total_records: usize,
    pub matched_records: usize,
    pub empty: bool,
    pub regions: Distribution,
    pub region_usage: Vec<RegionUsage>,
    pub top_classes: Vec<ClassRank>,
    pub trend: Trend<HeapBucket>,
    pub leak_suspects: Vec<LeakSuspect>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogView {
    pub total_records: usize,
    pub matched_records: usize,
    pub empty: bool,
    pub levels: Distribution,
    pub top_errors: Vec<ErrorSignature>,
    pub trend: Trend<LogBucket>,
    pub modules: Vec<ModuleBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryView {
    pub total_records: usize,
    pub matched_records: usize,
    pub empty: bool,
    pub verbs: Distribution,
    pub slowest: Vec<QueryRank>,
    pub trend: Trend<QueryBucket>,
    pub databases: Vec<DatabaseStats>,
    /// Count and mean execution time per SQL verb
    pub verb_performance: Vec<VerbStats>,
    pub slow_queries: usize,
}
