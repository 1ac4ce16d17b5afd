// Overview tab - cross-source headline numbers
//
// The overview is the only view that reads every source kind. It reuses the
// per-source adapters instead of keeping its own aggregates, so it can never
// disagree with the source tabs over the same records.

use dumpscope_types::{DiagnosticRecord, SourceKind, ThreadState};
use serde::Serialize;

use crate::adapters::{
    HeapAdapter, LogAdapter, QueryAdapter, SourceAdapter, ThreadAdapter, latest_snapshots,
};
use crate::options::{HealthStatus, ViewOptions};
use crate::view_model::{OverviewView, SourceCount};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub title: &'static str,
    pub value: f64,
    pub unit: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentHealth {
    pub component: &'static str,
    pub status: HealthStatus,
    pub utilization_percent: f64,
    pub issues: usize,
}

fn share(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Build the overview from records already narrowed by search text and time.
pub fn overview(records: &[&DiagnosticRecord], options: &ViewOptions) -> OverviewView {
    let threads = ThreadAdapter;
    let heap = HeapAdapter::new(options.utilization);
    let logs = LogAdapter::new(options.error_rate);
    let queries = QueryAdapter::new(options.slow_query_ms);

    let per_source: Vec<SourceCount> = SourceKind::ALL
        .iter()
        .map(|&kind| SourceCount {
            source_kind: kind,
            records: records.iter().filter(|r| r.source_kind() == kind).count(),
        })
        .collect();
    let count_of = |kind: SourceKind| {
        per_source
            .iter()
            .find(|c| c.source_kind == kind)
            .map_or(0, |c| c.records)
    };

    // Threads
    let live: Vec<_> = latest_snapshots(records)
        .into_iter()
        .filter(|(_, s)| s.state.is_live())
        .collect();
    let blocked = live
        .iter()
        .filter(|(_, s)| s.state == ThreadState::Blocked)
        .count();
    let deadlocks = threads.deadlocks(records);
    let avg_cpu = if live.is_empty() {
        0.0
    } else {
        live.iter().map(|(_, s)| s.cpu_usage_percent).sum::<f64>() / live.len() as f64
    };
    let thread_status = if !deadlocks.is_empty() {
        HealthStatus::Critical
    } else if blocked > 0 {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    };
    let jvm_status = if deadlocks.is_empty() {
        options.utilization.classify(avg_cpu)
    } else {
        HealthStatus::Critical
    };

    // Heap
    let heap_utilization = heap.overall_utilization(records);
    let heap_status = options.utilization.classify(heap_utilization);
    let leak_suspects = heap.leak_suspects(records, usize::MAX);
    let hot_regions = heap
        .region_usage(records)
        .iter()
        .filter(|r| r.status != HealthStatus::Healthy)
        .count();

    // Logs
    let log_total = count_of(SourceKind::Log);
    let error_rate = logs.error_rate_percent(records);
    let error_status = options.error_rate.classify(error_rate);
    let signatures = logs.rank(records, usize::MAX);
    let problem_share = share(
        signatures.iter().map(|s| s.occurrences).sum(),
        log_total,
    );

    // Queries
    let slow = queries.slow_count(records);
    let slow_share = share(slow, count_of(SourceKind::Query));
    let database_status = options.error_rate.classify(slow_share);

    let stats = vec![
        StatCard {
            title: "Active Threads",
            value: live.len() as f64,
            unit: "threads",
            status: thread_status,
            detail: (!deadlocks.is_empty())
                .then(|| format!("{} deadlock(s) detected", deadlocks.len())),
        },
        StatCard {
            title: "Heap Usage",
            value: heap_utilization,
            unit: "%",
            status: heap_status,
            detail: None,
        },
        StatCard {
            title: "Error Rate",
            value: error_rate,
            unit: "%",
            status: error_status,
            detail: None,
        },
        StatCard {
            title: "Slow Queries",
            value: slow as f64,
            unit: "queries",
            status: database_status,
            detail: None,
        },
    ];

    let components = vec![
        ComponentHealth {
            component: "JVM",
            status: jvm_status,
            utilization_percent: avg_cpu,
            issues: deadlocks.len() + blocked,
        },
        ComponentHealth {
            component: "Heap",
            status: heap_status,
            utilization_percent: heap_utilization,
            issues: leak_suspects.len() + hot_regions,
        },
        ComponentHealth {
            component: "Application Server",
            status: error_status,
            utilization_percent: problem_share,
            issues: signatures.len(),
        },
        ComponentHealth {
            component: "Database",
            status: database_status,
            utilization_percent: slow_share,
            issues: slow,
        },
    ];

    let mut top_errors = signatures;
    top_errors.truncate(options.top_n);

    OverviewView {
        total_records: records.len(),
        per_source,
        stats,
        components,
        top_errors,
    }
}
