//! Sample records and upload files.
//!
//! The sample set mirrors a small JBoss/MySQL incident: a deadlocked thread
//! pair, a growing cache in the old generation, a burst of errors and a few
//! slow queries.

use anyhow::Result;
use dumpscope_types::{DiagnosticRecord, LogLevel, ThreadPriority, ThreadState};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::builders::{heap, log, query, thread};

const MB: u64 = 1024 * 1024;

pub fn sample_threads() -> Vec<DiagnosticRecord> {
    vec![
        thread("0x01")
            .id("thr-1")
            .name("TaskExecutor-1")
            .cpu(89.0)
            .priority(ThreadPriority::High)
            .minute(0)
            .build(),
        thread("0x02")
            .id("thr-2")
            .name("HttpProcessor-2")
            .cpu(76.0)
            .minute(0)
            .build(),
        thread("0x03")
            .id("thr-3")
            .name("DatabaseConnection-Pool-1")
            .cpu(67.0)
            .priority(ThreadPriority::High)
            .waits_on("0x04", "connection_pool_lock")
            .minute(1)
            .build(),
        thread("0x04")
            .id("thr-4")
            .name("TransactionManager-2")
            .cpu(12.0)
            .waits_on("0x03", "transaction_lock")
            .minute(1)
            .build(),
        thread("0x05")
            .id("thr-5")
            .name("AsyncHandler-4")
            .state(ThreadState::Waiting)
            .cpu(54.0)
            .priority(ThreadPriority::Low)
            .minute(6)
            .build(),
        thread("0x06")
            .id("thr-6")
            .name("ScheduledTask-5")
            .state(ThreadState::TimedWaiting)
            .cpu(45.0)
            .minute(7)
            .build(),
        thread("0x07")
            .id("thr-7")
            .name("Reaper-7")
            .state(ThreadState::Terminated)
            .priority(ThreadPriority::Low)
            .minute(11)
            .build(),
    ]
}

pub fn sample_heap() -> Vec<DiagnosticRecord> {
    vec![
        heap("Eden Space")
            .id("heap-1")
            .used(387 * MB, 512 * MB)
            .class("java.lang.String", 145_623, 45 * MB)
            .class("byte[]", 89_234, 28 * MB)
            .minute(0)
            .build(),
        heap("Old Generation")
            .id("heap-2")
            .used(600 * MB, 1024 * MB)
            .class("com.example.CacheManager", 30_000, 150 * MB)
            .class("java.util.HashMap", 56_789, 12 * MB)
            .minute(0)
            .build(),
        heap("Old Generation")
            .id("heap-3")
            .used(756 * MB, 1024 * MB)
            .class("com.example.CacheManager", 45_623, 234 * MB)
            .class("java.util.HashMap", 56_789, 12 * MB)
            .minute(60)
            .build(),
    ]
}

pub fn sample_logs() -> Vec<DiagnosticRecord> {
    vec![
        log(
            LogLevel::Error,
            "java.lang.OutOfMemoryError: Java heap space",
        )
        .id("log-1")
        .logger("com.example.cache.CacheManager")
        .module("Notification Service")
        .minute(2)
        .build(),
        log(
            LogLevel::Error,
            "Failed to process user registration: java.sql.SQLException: Database connection timeout",
        )
        .id("log-2")
        .logger("com.example.service.UserService")
        .thread("http-nio-8080-exec-1")
        .module("User Management")
        .minute(3)
        .build(),
        log(
            LogLevel::Warn,
            "EJB invocation took longer than expected: 2.5 seconds",
        )
        .id("log-3")
        .logger("org.jboss.as.ejb3")
        .thread("EJB-pool-2")
        .module("Payment Processing")
        .minute(3)
        .build(),
        log(LogLevel::Info, "Processing API request for endpoint /api/users")
            .id("log-4")
            .logger("com.example.controller.ApiController")
            .thread("http-nio-8080-exec-3")
            .module("User Management")
            .minute(4)
            .build(),
        log(
            LogLevel::Error,
            "java.lang.OutOfMemoryError: GC overhead limit exceeded",
        )
        .id("log-5")
        .logger("com.example.cache.CacheManager")
        .module("Notification Service")
        .minute(20)
        .build(),
    ]
}

pub fn sample_queries() -> Vec<DiagnosticRecord> {
    vec![
        query("SELECT u.*, p.name FROM users u LEFT JOIN profiles p ON u.id = p.user_id WHERE u.created_at > ?")
            .id("qry-1")
            .exec_ms(15_720.0)
            .lock_ms(230.0)
            .rows(145_623, 847)
            .suggest("Add index on users.created_at")
            .suggest("Consider using INNER JOIN instead of LEFT JOIN")
            .minute(0)
            .build(),
        query("UPDATE orders SET status = ? WHERE payment_status = ? AND created_at < NOW() - INTERVAL ? HOUR")
            .id("qry-2")
            .exec_ms(12_450.0)
            .lock_ms(2_870.0)
            .rows(89_234, 0)
            .database("orders_db")
            .suggest("Add index on payment_status")
            .minute(16)
            .build(),
        query("INSERT INTO audit_log (user_id, action) VALUES (?, ?)")
            .id("qry-3")
            .exec_ms(0.45)
            .database("logging_db")
            .minute(17)
            .build(),
        query("SELECT COUNT(*) FROM logs WHERE level = ? AND timestamp BETWEEN ? AND ?")
            .id("qry-4")
            .exec_ms(8_930.0)
            .lock_ms(120.0)
            .rows(567_890, 1)
            .database("logging_db")
            .suggest("Add composite index on (level, timestamp)")
            .minute(31)
            .build(),
    ]
}

/// All sample records, ordered by `captured_at`.
pub fn sample_records() -> Vec<DiagnosticRecord> {
    let mut records = sample_threads();
    records.extend(sample_heap());
    records.extend(sample_logs());
    records.extend(sample_queries());
    records.sort_by_key(|r| r.captured_at);
    records
}

/// Serialize records as JSON lines, the interchange format of the
/// pass-through ingestor.
pub fn to_json_lines(records: &[DiagnosticRecord]) -> String {
    records
        .iter()
        .map(|r| serde_json::to_string(r).expect("records always serialize"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Temporary directory holding upload files.
pub struct UploadDir {
    temp_dir: TempDir,
}

impl UploadDir {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_records(&self, name: &str, records: &[DiagnosticRecord]) -> Result<PathBuf> {
        self.write_raw(name, &to_json_lines(records))
    }

    pub fn write_raw(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }
}
