use dumpscope_engine::{ViewContent, ViewOptions};
use dumpscope_runtime::{
    Dashboard, DashboardEvent, IngestOutput, IngestionError, Ingestor, JsonRecordIngestor,
    Upload, UploadStatus,
};
use dumpscope_testing::{
    at_minute, log, query, sample_heap, sample_records, sample_threads, thread, to_json_lines,
};
use dumpscope_types::{LogLevel, RecordFilter, Tab};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use tokio::sync::oneshot;

type Outcome = Result<IngestOutput, IngestionError>;

/// Ingestor whose answers, and when they arrive, are set by the test
#[derive(Default)]
struct ScriptedIngestor {
    script: Mutex<HashMap<String, (Option<oneshot::Receiver<()>>, Outcome)>>,
}

impl ScriptedIngestor {
    fn answer(self, name: &str, outcome: Outcome) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(name.to_string(), (None, outcome));
        self
    }

    /// Answer only after the returned sender fires
    fn gated(&self, name: &str, outcome: Outcome) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.script
            .lock()
            .unwrap()
            .insert(name.to_string(), (Some(rx), outcome));
        tx
    }
}

impl Ingestor for ScriptedIngestor {
    fn submit(&self, upload: Upload) -> impl Future<Output = Outcome> + Send {
        let entry = self.script.lock().unwrap().remove(&upload.name);
        async move {
            let (gate, outcome) =
                entry.unwrap_or_else(|| (None, Err(IngestionError::new("unscripted upload"))));
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            outcome
        }
    }
}

/// Ingestor that panics on uploads named `crash*` and answers one thread
/// record otherwise
struct CrashingIngestor;

impl Ingestor for CrashingIngestor {
    fn submit(&self, upload: Upload) -> impl Future<Output = Outcome> + Send {
        let crash = upload.name.starts_with("crash");
        async move {
            if crash {
                panic!("decoder crashed on {}", upload.name);
            }
            records(vec![thread("0x01").minute(0).build()])
        }
    }
}

fn records(records: Vec<dumpscope_types::DiagnosticRecord>) -> Outcome {
    Ok(IngestOutput {
        records,
        rejected: Vec::new(),
    })
}

fn matched_threads(dashboard: &Dashboard<impl Ingestor>) -> usize {
    match dashboard.view_of(Tab::ThreadDump).content {
        ViewContent::Thread(view) => view.matched_records,
        other => panic!("expected thread view, got {:?}", other),
    }
}

#[tokio::test]
async fn test_successful_upload_appends_records() {
    let ingestor = ScriptedIngestor::default().answer("threads.dump", records(sample_threads()));
    let mut dashboard = Dashboard::new(ingestor, ViewOptions::default());

    let id = dashboard.upload(Upload::new("threads.dump", ""));
    assert_eq!(dashboard.upload_status(id), Some(&UploadStatus::Pending));

    let event = dashboard.next_event().await.expect("one completion");
    assert_eq!(
        event,
        DashboardEvent::UploadIngested {
            id,
            accepted: 7,
            rejected: 0
        }
    );
    assert_eq!(dashboard.store().len(), 7);
    assert_eq!(dashboard.view_of(Tab::ThreadDump).revision, 1);
    assert_eq!(matched_threads(&dashboard), 7);
    assert!(dashboard.next_event().await.is_none());
}

#[tokio::test]
async fn test_failed_upload_leaves_store_untouched() {
    let ingestor = ScriptedIngestor::default()
        .answer("ok.dump", records(sample_threads()))
        .answer("bad.hprof", Err(IngestionError::new("truncated heap dump")));
    let mut dashboard = Dashboard::new(ingestor, ViewOptions::default());

    dashboard.upload(Upload::new("ok.dump", ""));
    dashboard.next_event().await;
    let before = dashboard.store().len();

    let id = dashboard.upload(Upload::new("bad.hprof", ""));
    let event = dashboard.next_event().await.expect("one completion");

    assert_eq!(event.upload_id(), id);
    assert_eq!(
        dashboard.upload_status(id),
        Some(&UploadStatus::Failed {
            reason: "truncated heap dump".to_string()
        })
    );
    assert_eq!(dashboard.store().len(), before);
}

#[tokio::test]
async fn test_panicking_ingestor_fails_the_upload() {
    let mut dashboard = Dashboard::new(CrashingIngestor, ViewOptions::default());

    let id = dashboard.upload(Upload::new("crash.hprof", ""));
    let event = dashboard.next_event().await.expect("panic is reported");

    let DashboardEvent::UploadFailed { id: failed, reason } = &event else {
        panic!("expected a failed upload, got {:?}", event);
    };
    assert_eq!(*failed, id);
    assert!(reason.contains("panicked"), "reason: {}", reason);
    assert!(matches!(
        dashboard.upload_status(id),
        Some(UploadStatus::Failed { .. })
    ));
    assert!(dashboard.store().is_empty());
    assert!(dashboard.next_event().await.is_none());

    // The session keeps working after the failure
    let next = dashboard.upload(Upload::new("threads.dump", ""));
    dashboard.next_event().await;
    assert_eq!(
        dashboard.upload_status(next),
        Some(&UploadStatus::Ingested {
            accepted: 1,
            rejected: 0
        })
    );
}

#[tokio::test]
async fn test_query_with_more_rows_sent_than_examined_is_excluded() {
    let batch = vec![
        query("SELECT id FROM users WHERE email = ?")
            .id("qry-ok")
            .exec_ms(12.0)
            .rows(1, 1)
            .minute(0)
            .build(),
        query("SELECT * FROM orders WHERE status = ?")
            .id("qry-bad")
            .exec_ms(5_000.0)
            .rows(100, 150)
            .minute(1)
            .build(),
    ];
    let ingestor = ScriptedIngestor::default().answer("slow.log", records(batch));
    let mut dashboard = Dashboard::new(ingestor, ViewOptions::default());

    let id = dashboard.upload(Upload::new("slow.log", ""));
    dashboard.next_event().await;

    assert_eq!(
        dashboard.upload_status(id),
        Some(&UploadStatus::Ingested {
            accepted: 1,
            rejected: 1
        })
    );

    let ViewContent::Query(queries) = dashboard.view_of(Tab::MysqlQueries).content else {
        panic!("expected query view");
    };
    assert_eq!(queries.total_records, 1);
    assert_eq!(queries.slow_queries, 0);
    assert!(queries.slowest.iter().all(|q| q.rows_sent <= q.rows_examined));

    let ViewContent::Overview(overview) = dashboard.view_of(Tab::Overview).content else {
        panic!("expected overview");
    };
    let slow = overview
        .stats
        .iter()
        .find(|c| c.title == "Slow Queries")
        .expect("slow query card");
    assert_eq!(slow.value, 0.0);
}

#[tokio::test]
async fn test_invalid_records_are_counted_not_stored() {
    let batch = vec![
        thread("a").id("dup").minute(0).build(),
        thread("b").id("dup").minute(1).build(),
        thread("c").cpu(140.0).minute(2).build(),
        thread("d").minute(3).build(),
    ];
    let ingestor = ScriptedIngestor::default().answer("t.dump", records(batch));
    let mut dashboard = Dashboard::new(ingestor, ViewOptions::default());

    let id = dashboard.upload(Upload::new("t.dump", ""));
    dashboard.next_event().await;

    assert_eq!(
        dashboard.upload_status(id),
        Some(&UploadStatus::Ingested {
            accepted: 2,
            rejected: 2
        })
    );
    assert_eq!(dashboard.store().rejected_total(), 2);
}

#[tokio::test]
async fn test_concurrent_uploads_apply_independently() {
    let ingestor = ScriptedIngestor::default();
    let release_threads = ingestor.gated("threads.dump", records(sample_threads()));
    let release_heap = ingestor.gated("heap.hprof", records(sample_heap()));
    let mut dashboard = Dashboard::new(ingestor, ViewOptions::default());

    let threads = dashboard.upload(Upload::new("threads.dump", ""));
    let heap = dashboard.upload(Upload::new("heap.hprof", ""));

    // Heap finishes first even though it was submitted second
    release_heap.send(()).unwrap();
    let first = dashboard.next_event().await.expect("heap completion");
    assert_eq!(first.upload_id(), heap);
    assert_eq!(dashboard.store().len(), 3);
    assert_eq!(dashboard.upload_status(threads), Some(&UploadStatus::Pending));

    release_threads.send(()).unwrap();
    let second = dashboard.next_event().await.expect("thread completion");
    assert_eq!(second.upload_id(), threads);
    assert_eq!(dashboard.store().len(), 10);
}

#[tokio::test]
async fn test_clear_ignores_late_completions() {
    let ingestor = ScriptedIngestor::default();
    let release_old = ingestor.gated("old.dump", records(sample_threads()));
    let release_new =
        ingestor.gated("new.log", records(vec![log(LogLevel::Error, "boom").build()]));
    let mut dashboard = Dashboard::new(ingestor, ViewOptions::default());

    dashboard.upload(Upload::new("old.dump", ""));
    dashboard.clear();
    assert!(dashboard.uploads().is_empty());

    let new = dashboard.upload(Upload::new("new.log", ""));
    release_old.send(()).unwrap();
    release_new.send(()).unwrap();

    let event = dashboard.next_event().await.expect("new upload completes");
    assert_eq!(event.upload_id(), new);
    dashboard.drain_events();

    assert_eq!(dashboard.store().len(), 1);
    assert_eq!(dashboard.uploads().len(), 1);
    assert_eq!(matched_threads(&dashboard), 0);
}

#[tokio::test]
async fn test_filters_are_per_tab() {
    let ingestor = ScriptedIngestor::default().answer("all.log", records(sample_records()));
    let mut dashboard = Dashboard::new(ingestor, ViewOptions::default());
    dashboard.upload(Upload::new("all.log", ""));
    dashboard.next_event().await;

    dashboard.set_filter(Tab::ThreadDump, RecordFilter::new().category("BLOCKED"));
    dashboard.select_tab(Tab::JbossLogs);

    assert_eq!(dashboard.active_tab(), Tab::JbossLogs);
    assert_eq!(dashboard.filter(Tab::JbossLogs), RecordFilter::new());
    assert_eq!(matched_threads(&dashboard), 2);

    let view = dashboard.view();
    assert_eq!(view.tab, Tab::JbossLogs);
    let ViewContent::Log(logs) = view.content else {
        panic!("expected log view");
    };
    assert_eq!(logs.matched_records, 5);
}

#[tokio::test]
async fn test_json_ingestor_end_to_end() {
    let mut dashboard = Dashboard::new(JsonRecordIngestor, ViewOptions::default());
    let lines = format!(
        "{}\n{{broken\n",
        to_json_lines(&[thread("0x01").minute(0).build(), thread("0x02").minute(1).build()])
    );

    let id = dashboard.upload(Upload::new("threads.txt", lines));
    dashboard.next_event().await;

    assert_eq!(
        dashboard.upload_status(id),
        Some(&UploadStatus::Ingested {
            accepted: 2,
            rejected: 1
        })
    );
    let filter =
        RecordFilter::new().time_range(dumpscope_types::TimeRange::since(at_minute(1)));
    dashboard.set_filter(Tab::ThreadDump, filter);
    assert_eq!(matched_threads(&dashboard), 1);
}

#[tokio::test]
async fn test_tabs_in_fixed_order() {
    let dashboard = Dashboard::new(JsonRecordIngestor, ViewOptions::default());
    let ids: Vec<&str> = dashboard.tabs().iter().map(|t| t.id).collect();
    assert_eq!(
        ids,
        vec!["overview", "thread-dump", "heap-dump", "jboss-logs", "mysql-queries"]
    );
    assert_eq!(dashboard.active_tab(), Tab::Overview);
}
