use dumpscope_types::{
    DiagnosticRecord, InvalidReason, InvalidRecord, RecordPayload, SourceKind, Tab, validate,
    validate_batch,
};

const BATCH: &str = r#"[
  {"id": "t1", "captured_at": "2024-01-15T10:00:00Z", "source_kind": "thread",
   "payload": {"thread_id": "0x01", "name": "TaskExecutor-1", "state": "BLOCKED",
               "cpu_usage_percent": 89.0, "priority": "HIGH",
               "wait": {"held_resource": "lock_a", "waiting_on_thread_id": "0x02"}}},
  {"id": "h1", "captured_at": "2024-01-15T10:01:00Z", "source_kind": "heap",
   "payload": {"region": "Eden Space", "used_bytes": 2048, "capacity_bytes": 1024}},
  {"id": "l1", "captured_at": "2024-01-15T10:02:00Z", "source_kind": "log",
   "payload": {"level": "ERROR", "logger": "com.example.App", "message": "boom",
               "thread": "main", "module": "core"}},
  {"id": "q1", "captured_at": "2024-01-15T10:03:00Z", "source_kind": "query",
   "payload": {"sql": "select 1", "exec_time_ms": 2.5, "lock_time_ms": 0.0,
               "rows_examined": 1, "rows_sent": 1, "database": "app"}}
]"#;

fn decode() -> Vec<DiagnosticRecord> {
    serde_json::from_str(BATCH).expect("batch decodes")
}

#[test]
fn test_decode_all_kinds() {
    let records = decode();
    let kinds: Vec<SourceKind> = records.iter().map(|r| r.source_kind()).collect();
    assert_eq!(kinds, SourceKind::ALL.to_vec());

    let thread = records[0].as_thread().expect("thread payload");
    assert_eq!(thread.wait.as_ref().map(|w| w.waiting_on_thread_id.as_str()), Some("0x02"));
    assert!(records[1].as_heap().is_some_and(|h| h.histogram.is_empty()));
    assert_eq!(records[3].payload.category(), "SELECT");
}

#[test]
fn test_gate_rejects_heap_over_capacity() {
    let batch = validate_batch(decode());

    let ids: Vec<&str> = batch.accepted.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "l1", "q1"]);
    assert_eq!(batch.rejected_count(), 1);

    insta::assert_json_snapshot!(batch.rejected[0], @r#"
    {
      "record_id": "h1",
      "reason": {
        "kind": "used_exceeds_capacity",
        "used_bytes": 2048,
        "capacity_bytes": 1024
      }
    }
    "#);
}

#[test]
fn test_record_round_trips_through_json() {
    let records = decode();
    let json = serde_json::to_string(&records[2]).expect("serializes");
    let back: DiagnosticRecord = serde_json::from_str(&json).expect("decodes");
    assert_eq!(back, records[2]);
    assert!(json.contains(r#""source_kind":"log""#));
}

#[test]
fn test_unknown_source_kind_does_not_decode() {
    let json = r#"{"id": "x", "captured_at": "2024-01-15T10:00:00Z",
                   "source_kind": "gc", "payload": {}}"#;
    assert!(serde_json::from_str::<DiagnosticRecord>(json).is_err());
}

#[test]
fn test_validate_reports_first_violation_with_id() {
    let mut records = decode();
    if let RecordPayload::Query(q) = &mut records[3].payload {
        q.lock_time_ms = 5.0;
    }
    let err = validate(&records[3]).unwrap_err();
    assert_eq!(
        err,
        InvalidRecord::new(
            "q1",
            InvalidReason::LockExceedsExec {
                lock_time_ms: 5.0,
                exec_time_ms: 2.5
            }
        )
    );
    assert_eq!(
        err.to_string(),
        "record 'q1': lock_time_ms 5 exceeds exec_time_ms 2.5"
    );
}

#[test]
fn test_tabs_parse_from_ids() {
    for tab in Tab::ALL {
        assert_eq!(tab.id().parse::<Tab>(), Ok(tab));
    }
    assert!("network".parse::<Tab>().is_err());
}
