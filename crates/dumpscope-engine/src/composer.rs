use chrono::Duration;
use dumpscope_types::{DiagnosticRecord, RecordFilter, SourceKind, Tab};

use crate::adapters::{HeapAdapter, LogAdapter, QueryAdapter, SourceAdapter, ThreadAdapter};
use crate::aggregate::{self, width_ms};
use crate::filter::{matches_window, select};
use crate::options::ViewOptions;
use crate::overview::overview;
use crate::view_model::{HeapView, LogView, QueryView, ThreadView, Trend, ViewContent, ViewModel};

/// Maps (records, tab, filter) to a ViewModel.
///
/// Stateless apart from its options: every call recomputes from the records it
/// is given, and no aggregate is shared between tabs.
#[derive(Debug, Clone, Default)]
pub struct ViewComposer {
    options: ViewOptions,
}

impl ViewComposer {
    pub fn new(options: ViewOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn render(
        &self,
        records: &[DiagnosticRecord],
        tab: Tab,
        filter: &RecordFilter,
    ) -> ViewModel {
        let content = match tab {
            Tab::Overview => {
                let window: Vec<&DiagnosticRecord> = records
                    .iter()
                    .filter(|r| matches_window(r, filter))
                    .collect();
                ViewContent::Overview(overview(&window, &self.options))
            }
            Tab::ThreadDump => ViewContent::Thread(self.thread_view(records, filter)),
            Tab::HeapDump => ViewContent::Heap(self.heap_view(records, filter)),
            Tab::JbossLogs => ViewContent::Log(self.log_view(records, filter)),
            Tab::MysqlQueries => ViewContent::Query(self.query_view(records, filter)),
        };

        ViewModel {
            tab,
            filter: filter.clone(),
            revision: 0,
            content,
        }
    }

    /// Configured width for `kind`, coarsened to a whole multiple when the
    /// records would otherwise span more than `max_trend_buckets`.
    fn trend_width(&self, kind: SourceKind, records: &[&DiagnosticRecord]) -> Duration {
        let configured = self.options.bucket_widths.for_kind(kind);
        let max = self.options.max_trend_buckets.max(1);
        let span = aggregate::bucket_span(records.iter().copied(), configured);
        if span <= max {
            return configured;
        }
        // Bucket edges are epoch-aligned, so a misaligned first record can add
        // one bucket to the estimate.
        let mut factor = span.div_ceil(max) as i64;
        loop {
            let width = Duration::milliseconds(width_ms(configured).saturating_mul(factor));
            if aggregate::bucket_span(records.iter().copied(), width) <= max {
                return width;
            }
            factor += 1;
        }
    }

    fn trend<A: SourceAdapter>(
        &self,
        adapter: &A,
        records: &[&DiagnosticRecord],
    ) -> Trend<A::BucketStats> {
        let width = self.trend_width(A::KIND, records);
        Trend {
            bucket_width_secs: width.num_seconds(),
            buckets: adapter.trend(records, width),
        }
    }

    fn total_of(records: &[DiagnosticRecord], kind: SourceKind) -> usize {
        records.iter().filter(|r| r.source_kind() == kind).count()
    }

    fn thread_view(&self, records: &[DiagnosticRecord], filter: &RecordFilter) -> ThreadView {
        let adapter = ThreadAdapter;
        let matched = select(records, SourceKind::Thread, filter);
        ThreadView {
            total_records: Self::total_of(records, SourceKind::Thread),
            matched_records: matched.len(),
            empty: matched.is_empty(),
            states: adapter.summarize(&matched),
            top_cpu: adapter.rank(&matched, self.options.top_n),
            trend: self.trend(&adapter, &matched),
            deadlocks: adapter.deadlocks(&matched),
        }
    }

    fn heap_view(&self, records: &[DiagnosticRecord], filter: &RecordFilter) -> HeapView {
        let adapter = HeapAdapter::new(self.options.utilization);
        let matched = select(records, SourceKind::Heap, filter);
        HeapView {
            total_records: Self::total_of(records, SourceKind::Heap),
            matched_records: matched.len(),
            empty: matched.is_empty(),
            regions: adapter.summarize(&matched),
            region_usage: adapter.region_usage(&matched),
            top_classes: adapter.rank(&matched, self.options.top_n),
            trend: self.trend(&adapter, &matched),
            leak_suspects: adapter.leak_suspects(&matched, self.options.top_n),
        }
    }

    fn log_view(&self, records: &[DiagnosticRecord], filter: &RecordFilter) -> LogView {
        let adapter = LogAdapter::new(self.options.error_rate);
        let matched = select(records, SourceKind::Log, filter);
        LogView {
            total_records: Self::total_of(records, SourceKind::Log),
            matched_records: matched.len(),
            empty: matched.is_empty(),
            levels: adapter.summarize(&matched),
            top_errors: adapter.rank(&matched, self.options.top_n),
            trend: self.trend(&adapter, &matched),
            modules: adapter.modules(&matched),
        }
    }

    fn query_view(&self, records: &[DiagnosticRecord], filter: &RecordFilter) -> QueryView {
        let adapter = QueryAdapter::new(self.options.slow_query_ms);
        let matched = select(records, SourceKind::Query, filter);
        QueryView {
            total_records: Self::total_of(records, SourceKind::Query),
            matched_records: matched.len(),
            empty: matched.is_empty(),
            verbs: adapter.summarize(&matched),
            slowest: adapter.rank(&matched, self.options.top_n),
            trend: self.trend(&adapter, &matched),
            databases: adapter.databases(&matched),
            verb_performance: adapter.verbs(&matched),
            slow_queries: adapter.slow_count(&matched),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dumpscope_testing::{at_minute, sample_records, thread};

    #[test]
    fn test_trend_width_is_coarsened_past_cap() {
        let composer = ViewComposer::new(ViewOptions {
            max_trend_buckets: 4,
            ..ViewOptions::default()
        });
        // 0..=45 minutes at 5 minute buckets spans 10 buckets
        let records = vec![
            thread("a").minute(0).build(),
            thread("b").minute(45).build(),
        ];
        let refs: Vec<&DiagnosticRecord> = records.iter().collect();

        let width = composer.trend_width(SourceKind::Thread, &refs);
        assert_eq!(width, Duration::minutes(15));
    }

    #[test]
    fn test_trend_width_respects_cap_when_misaligned() {
        let composer = ViewComposer::new(ViewOptions {
            max_trend_buckets: 2,
            ..ViewOptions::default()
        });
        // Bucket indices 1..=4 at 5 minutes; 10 minute buckets would span 0..=2
        let records = vec![
            thread("a").minute(5).build(),
            thread("b").minute(20).build(),
        ];
        let refs: Vec<&DiagnosticRecord> = records.iter().collect();

        let width = composer.trend_width(SourceKind::Thread, &refs);
        assert_eq!(width, Duration::minutes(15));
        let view = composer.render(&records, Tab::ThreadDump, &RecordFilter::new());
        let ViewContent::Thread(threads) = view.content else {
            panic!("expected thread view");
        };
        assert_eq!(threads.trend.buckets.len(), 2);
    }

    #[test]
    fn test_source_tab_ignores_other_kinds() {
        let records = sample_records();
        let view = ViewComposer::default().render(&records, Tab::HeapDump, &RecordFilter::new());

        let ViewContent::Heap(heap) = view.content else {
            panic!("expected heap view");
        };
        assert_eq!(heap.total_records, 3);
        assert_eq!(heap.matched_records, 3);
        assert_eq!(heap.trend.bucket_width_secs, 300);
    }

    #[test]
    fn test_no_match_is_empty_state() {
        let records = sample_records();
        let filter = RecordFilter::new().search("no such thing");
        let view = ViewComposer::default().render(&records, Tab::ThreadDump, &filter);

        assert!(view.is_empty());
        let ViewContent::Thread(threads) = view.content else {
            panic!("expected thread view");
        };
        assert_eq!(threads.total_records, 7);
        assert!(threads.trend.buckets.is_empty());
        assert!(threads.top_cpu.is_empty());
    }

    #[test]
    fn test_overview_ignores_categories() {
        let records = vec![thread("a").minute(0).build(), thread("b").minute(1).build()];
        let filter = RecordFilter::new()
            .category("BLOCKED")
            .time_range(dumpscope_types::TimeRange::until(at_minute(1)));
        let view = ViewComposer::default().render(&records, Tab::Overview, &filter);

        let ViewContent::Overview(overview) = view.content else {
            panic!("expected overview");
        };
        assert_eq!(overview.total_records, 1);
    }
}
