use chrono::{DateTime, Utc};
use dumpscope_types::{DiagnosticRecord, LogEntry, LogLevel, SourceKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use super::{Severity, SourceAdapter};
use crate::aggregate::{Scored, top_n};
use crate::options::{HealthStatus, Thresholds, ViewOptions};

/// Fully-qualified exception or error class, e.g. `java.sql.SQLException`
static EXCEPTION_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[A-Za-z_$][\w$]*\.)+[A-Za-z_$][\w$]*(?:Exception|Error)\b")
        .expect("exception class pattern is valid")
});

/// Grouping key of an ERROR/WARN entry: the first exception class named in the
/// message, or the logger when the message names none.
pub fn signature_of(entry: &LogEntry) -> String {
    EXCEPTION_CLASS
        .find(&entry.message)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| entry.logger.clone())
}

fn is_problem(level: LogLevel) -> bool {
    matches!(level, LogLevel::Error | LogLevel::Warn)
}

/// `*Error` classes (OutOfMemoryError, StackOverflowError) are fatal to the
/// JVM and rank above ordinary exceptions.
pub fn severity_of(signature: &str, level: LogLevel) -> Severity {
    match level {
        LogLevel::Error if signature.ends_with("Error") => Severity::Critical,
        LogLevel::Error => Severity::High,
        LogLevel::Warn => Severity::Medium,
        LogLevel::Info | LogLevel::Debug => Severity::Low,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LogAdapter {
    pub error_rate: Thresholds,
}

impl Default for LogAdapter {
    fn default() -> Self {
        Self {
            error_rate: ViewOptions::default().error_rate,
        }
    }
}

/// Repeated error or warning, grouped by signature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorSignature {
    pub signature: String,
    /// ERROR if any occurrence was an error
    pub level: LogLevel,
    pub severity: Severity,
    pub occurrences: usize,
    pub last_seen: DateTime<Utc>,
    /// Message and logger of the most recent occurrence
    pub sample_message: String,
    pub logger: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogBucket {
    pub error: usize,
    pub warn: usize,
    pub info: usize,
    pub debug: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleBreakdown {
    pub module: String,
    pub errors: usize,
    pub warnings: usize,
    pub total: usize,
    pub error_rate_percent: f64,
    pub status: HealthStatus,
}

impl LogAdapter {
    pub fn new(error_rate: Thresholds) -> Self {
        Self { error_rate }
    }

    /// Share of ERROR entries among all log entries, in percent
    pub fn error_rate_percent(&self, records: &[&DiagnosticRecord]) -> f64 {
        let (errors, total) = records
            .iter()
            .filter_map(|r| r.as_log())
            .fold((0usize, 0usize), |(e, t), entry| {
                (e + usize::from(entry.level == LogLevel::Error), t + 1)
            });
        percent(errors, total)
    }

    /// Per-module counts in first-seen module order
    pub fn modules(&self, records: &[&DiagnosticRecord]) -> Vec<ModuleBreakdown> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut modules: Vec<ModuleBreakdown> = Vec::new();

        for entry in records.iter().filter_map(|r| r.as_log()) {
            let i = *index.entry(entry.module.as_str()).or_insert_with(|| {
                modules.push(ModuleBreakdown {
                    module: entry.module.clone(),
                    errors: 0,
                    warnings: 0,
                    total: 0,
                    error_rate_percent: 0.0,
                    status: HealthStatus::Healthy,
                });
                modules.len() - 1
            });
            let module = &mut modules[i];
            module.total += 1;
            match entry.level {
                LogLevel::Error => module.errors += 1,
                LogLevel::Warn => module.warnings += 1,
                LogLevel::Info | LogLevel::Debug => {}
            }
        }

        for module in &mut modules {
            module.error_rate_percent = percent(module.errors, module.total);
            module.status = self.error_rate.classify(module.error_rate_percent);
        }
        modules
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

impl SourceAdapter for LogAdapter {
    type Payload = LogEntry;
    type Ranked = ErrorSignature;
    type BucketStats = LogBucket;

    const KIND: SourceKind = SourceKind::Log;

    fn payload(record: &DiagnosticRecord) -> Option<&LogEntry> {
        record.as_log()
    }

    fn category(&self, payload: &LogEntry) -> String {
        payload.level.as_str().to_string()
    }

    /// Ranks ERROR and WARN signatures by occurrence count
    fn rank(&self, records: &[&DiagnosticRecord], n: usize) -> Vec<ErrorSignature> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut signatures: Vec<ErrorSignature> = Vec::new();

        for record in records {
            let Some(entry) = record.as_log() else {
                continue;
            };
            if !is_problem(entry.level) {
                continue;
            }

            let signature = signature_of(entry);
            match index.get(&signature) {
                Some(&i) => {
                    let existing = &mut signatures[i];
                    existing.occurrences += 1;
                    if entry.level == LogLevel::Error {
                        existing.level = LogLevel::Error;
                        existing.severity = severity_of(&existing.signature, LogLevel::Error);
                    }
                    if record.captured_at >= existing.last_seen {
                        existing.last_seen = record.captured_at;
                        existing.sample_message = entry.message.clone();
                        existing.logger = entry.logger.clone();
                    }
                }
                None => {
                    index.insert(signature.clone(), signatures.len());
                    signatures.push(ErrorSignature {
                        severity: severity_of(&signature, entry.level),
                        signature,
                        level: entry.level,
                        occurrences: 1,
                        last_seen: record.captured_at,
                        sample_message: entry.message.clone(),
                        logger: entry.logger.clone(),
                    });
                }
            }
        }

        let candidates = signatures
            .into_iter()
            .map(|s| Scored {
                score: s.occurrences as f64,
                captured_at: s.last_seen,
                item: s,
            })
            .collect();

        top_n(candidates, n)
    }

    fn accumulate(&self, stats: &mut LogBucket, payload: &LogEntry) {
        match payload.level {
            LogLevel::Error => stats.error += 1,
            LogLevel::Warn => stats.warn += 1,
            LogLevel::Info => stats.info += 1,
            LogLevel::Debug => stats.debug += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dumpscope_testing::{log, sample_logs};

    fn refs(records: &[DiagnosticRecord]) -> Vec<&DiagnosticRecord> {
        records.iter().collect()
    }

    #[test]
    fn test_signature_prefers_exception_class() {
        let entry = log(
            LogLevel::Error,
            "Failed: java.sql.SQLException: timeout caused by java.io.IOException",
        )
        .build();
        assert_eq!(signature_of(entry.as_log().unwrap()), "java.sql.SQLException");
    }

    #[test]
    fn test_signature_falls_back_to_logger() {
        let entry = log(LogLevel::Warn, "Slow EJB call")
            .logger("org.jboss.as.ejb3")
            .build();
        assert_eq!(signature_of(entry.as_log().unwrap()), "org.jboss.as.ejb3");

        // An unqualified name is not a class reference
        let entry = log(LogLevel::Error, "RuntimeError happened").build();
        assert_eq!(signature_of(entry.as_log().unwrap()), "com.example.App");
    }

    #[test]
    fn test_rank_counts_errors_and_warnings_only() {
        let records = sample_logs();
        let ranked = LogAdapter::default().rank(&refs(&records), 5);

        let keys: Vec<(&str, usize)> = ranked
            .iter()
            .map(|s| (s.signature.as_str(), s.occurrences))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("java.lang.OutOfMemoryError", 2),
                ("java.sql.SQLException", 1),
                ("org.jboss.as.ejb3", 1),
            ]
        );
        assert_eq!(
            ranked[0].sample_message,
            "java.lang.OutOfMemoryError: GC overhead limit exceeded"
        );
        assert_eq!(ranked[0].severity, Severity::Critical);
    }

    #[test]
    fn test_severity_by_class_and_level() {
        let records = vec![
            log(LogLevel::Warn, "Pool near limit: java.sql.SQLException: slow checkout")
                .id("w1")
                .build(),
            log(LogLevel::Error, "java.sql.SQLException: Connection timeout")
                .id("e1")
                .build(),
            log(LogLevel::Warn, "javax.servlet.ServletException: Request processing failed")
                .id("w2")
                .build(),
            log(LogLevel::Error, "java.lang.OutOfMemoryError: Java heap space")
                .id("e2")
                .build(),
        ];
        let ranked = LogAdapter::default().rank(&refs(&records), 5);

        let severities: Vec<(&str, Severity)> = ranked
            .iter()
            .map(|s| (s.signature.as_str(), s.severity))
            .collect();
        assert_eq!(
            severities,
            vec![
                ("java.sql.SQLException", Severity::High),
                ("javax.servlet.ServletException", Severity::Medium),
                ("java.lang.OutOfMemoryError", Severity::Critical),
            ]
        );
    }

    #[test]
    fn test_summarize_levels() {
        let records = sample_logs();
        let dist = LogAdapter::default().summarize(&refs(&records));
        let order: Vec<&str> = dist.entries().iter().map(|c| c.category.as_str()).collect();
        assert_eq!(order, vec!["ERROR", "WARN", "INFO"]);
        assert_eq!(dist.get("ERROR"), 3);
    }

    #[test]
    fn test_trend_counts_levels_per_bucket() {
        let records = sample_logs();
        let buckets = LogAdapter::default().trend(&refs(&records), Duration::minutes(15));

        assert_eq!(buckets.len(), 2);
        assert_eq!(
            buckets[0].stats,
            LogBucket { error: 2, warn: 1, info: 1, debug: 0 }
        );
        assert_eq!(buckets[1].stats.error, 1);
    }

    #[test]
    fn test_module_breakdown_status() {
        let records = sample_logs();
        let modules = LogAdapter::default().modules(&refs(&records));

        let names: Vec<&str> = modules.iter().map(|m| m.module.as_str()).collect();
        assert_eq!(
            names,
            vec!["Notification Service", "User Management", "Payment Processing"]
        );
        assert_eq!(modules[1].errors, 1);
        assert_eq!(modules[1].total, 2);
        assert_eq!(modules[1].status, HealthStatus::Critical);
        assert_eq!(modules[2].warnings, 1);
        assert_eq!(modules[2].status, HealthStatus::Healthy);
    }

    #[test]
    fn test_error_rate() {
        let records = sample_logs();
        let rate = LogAdapter::default().error_rate_percent(&refs(&records));
        assert!((rate - 60.0).abs() < 1e-9);
        assert_eq!(LogAdapter::default().error_rate_percent(&[]), 0.0);
    }
}
