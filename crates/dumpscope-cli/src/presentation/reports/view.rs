use dumpscope_engine::{
    Distribution, HeapView, LogView, OverviewView, QueryView, ThreadView, ViewContent, ViewModel,
};
use dumpscope_runtime::{UploadRef, UploadStatus};
use dumpscope_types::RecordFilter;
use serde::Serialize;
use std::fmt::{self, Write};

use crate::presentation::format::{
    format_bytes, format_duration_ms, format_ms, format_stat, format_time, truncate,
};
use crate::presentation::renderer::{ConsoleView, Style};

/// Result of `view`: what was ingested and the rendered tab
#[derive(Debug, Clone, Serialize)]
pub struct ViewReport {
    pub uploads: Vec<UploadRef>,
    pub rejected_total: usize,
    pub view: ViewModel,
}

impl ViewReport {
    pub fn failed_uploads(&self) -> usize {
        self.uploads
            .iter()
            .filter(|u| matches!(u.status, UploadStatus::Failed { .. }))
            .count()
    }

    pub fn accepted_total(&self) -> usize {
        self.uploads
            .iter()
            .map(|u| match u.status {
                UploadStatus::Ingested { accepted, .. } => accepted,
                _ => 0,
            })
            .sum()
    }
}

impl ConsoleView for ViewReport {
    fn write_console(&self, out: &mut String, style: Style) -> fmt::Result {
        write_uploads(out, style, &self.uploads)?;

        let view = &self.view;
        writeln!(
            out,
            "{}  {}",
            style.heading(view.tab.label()),
            style.dim(&format!("revision {}", view.revision))
        )?;
        if let Some(line) = describe_filter(&view.filter) {
            writeln!(out, "{}", style.dim(&line))?;
        }
        writeln!(out)?;

        if view.is_empty() {
            if view.filter.is_empty() {
                writeln!(out, "No records for this tab.")?;
            } else {
                writeln!(out, "No records match the current filter.")?;
            }
            return Ok(());
        }

        match &view.content {
            ViewContent::Overview(v) => write_overview(out, style, v),
            ViewContent::Thread(v) => write_threads(out, style, v),
            ViewContent::Heap(v) => write_heap(out, style, v),
            ViewContent::Log(v) => write_logs(out, style, v),
            ViewContent::Query(v) => write_queries(out, style, v),
        }
    }
}

fn write_uploads(out: &mut String, style: Style, uploads: &[UploadRef]) -> fmt::Result {
    if uploads.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}", style.heading("Uploads"))?;
    for upload in uploads {
        let status = match &upload.status {
            UploadStatus::Pending => "pending".to_string(),
            UploadStatus::Ingested { accepted, rejected } => {
                format!("{} accepted, {} rejected", accepted, rejected)
            }
            UploadStatus::Failed { reason } => format!("failed: {}", reason),
        };
        writeln!(out, "  {:<28} {}", truncate(&upload.name, 28), status)?;
    }
    writeln!(out)
}

fn describe_filter(filter: &RecordFilter) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(text) = &filter.search_text {
        parts.push(format!("search \"{}\"", text));
    }
    if !filter.categories.is_empty() {
        parts.push(format!("categories {}", filter.categories.join(", ")));
    }
    if let Some(range) = &filter.time_range {
        if let Some(start) = range.start {
            parts.push(format!("since {}", format_time(start)));
        }
        if let Some(end) = range.end {
            parts.push(format!("until {}", format_time(end)));
        }
    }
    (!parts.is_empty()).then(|| format!("Filter: {}", parts.join("; ")))
}

fn write_distribution(
    out: &mut String,
    style: Style,
    title: &str,
    distribution: &Distribution,
) -> fmt::Result {
    writeln!(out, "{}", style.heading(title))?;
    let total = distribution.total().max(1);
    for entry in distribution.entries() {
        writeln!(
            out,
            "  {:<24} {:>6}  {:>5.1}%",
            entry.category,
            entry.count,
            entry.count as f64 * 100.0 / total as f64
        )?;
    }
    writeln!(out)
}

fn write_matched(out: &mut String, matched: usize, total: usize) -> fmt::Result {
    writeln!(out, "{} of {} records match", matched, total)?;
    writeln!(out)
}

fn write_overview(out: &mut String, style: Style, view: &OverviewView) -> fmt::Result {
    let sources: Vec<String> = view
        .per_source
        .iter()
        .map(|s| format!("{} {}", s.source_kind, s.records))
        .collect();
    writeln!(out, "{} records ({})", view.total_records, sources.join(", "))?;
    writeln!(out)?;

    writeln!(out, "{}", style.heading("Stats"))?;
    for card in &view.stats {
        write!(
            out,
            "  {:<16} {:<14} {}",
            card.title,
            format_stat(card.value, card.unit),
            style.status(card.status, 8)
        )?;
        match &card.detail {
            Some(detail) => writeln!(out, " {}", style.dim(detail))?,
            None => writeln!(out)?,
        }
    }
    writeln!(out)?;

    writeln!(out, "{}", style.heading("Components"))?;
    writeln!(
        out,
        "  {:<22} {:<8} {:>7} {:>7}",
        "COMPONENT", "STATUS", "UTIL", "ISSUES"
    )?;
    for component in &view.components {
        writeln!(
            out,
            "  {:<22} {} {:>6.1}% {:>7}",
            component.component,
            style.status(component.status, 8),
            component.utilization_percent,
            component.issues
        )?;
    }

    if !view.top_errors.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", style.heading("Top errors"))?;
        for error in &view.top_errors {
            writeln!(
                out,
                "  {:>4}x  {:<5} {} {}",
                error.occurrences,
                error.level.as_str(),
                style.severity(error.severity, 8),
                truncate(&error.signature, 60)
            )?;
        }
    }
    Ok(())
}

fn write_threads(out: &mut String, style: Style, view: &ThreadView) -> fmt::Result {
    write_matched(out, view.matched_records, view.total_records)?;

    if !view.deadlocks.is_empty() {
        writeln!(out, "{}", style.heading("Deadlocks"))?;
        for group in &view.deadlocks {
            let mut cycle: Vec<&str> = group.threads.iter().map(|t| t.thread_id.as_str()).collect();
            if let Some(first) = cycle.first().copied() {
                cycle.push(first);
            }
            writeln!(
                out,
                "  {} {}  for {} since {}",
                style.severity(group.severity, 8),
                cycle.join(" -> "),
                format_duration_ms(group.duration_ms),
                format_time(group.first_observed)
            )?;
            for member in &group.threads {
                writeln!(
                    out,
                    "      {} {} ({}) holds {}, waits for {}",
                    member.thread_id,
                    member.name,
                    member.priority,
                    member.holds,
                    member.waits_for_thread_id
                )?;
            }
        }
        writeln!(out)?;
    }

    write_distribution(out, style, "States", &view.states)?;

    writeln!(out, "{}", style.heading("Top CPU"))?;
    writeln!(
        out,
        "  {:<10} {:<28} {:<14} {:>6}",
        "THREAD", "NAME", "STATE", "CPU"
    )?;
    for rank in &view.top_cpu {
        writeln!(
            out,
            "  {:<10} {:<28} {:<14} {:>5.1}%",
            rank.thread_id,
            truncate(&rank.name, 28),
            rank.state.as_str(),
            rank.cpu_usage_percent
        )?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "{}",
        style.heading(&format!("Trend ({}s buckets)", view.trend.bucket_width_secs))
    )?;
    for bucket in &view.trend.buckets {
        writeln!(
            out,
            "  {}  {:>5} snapshots  {:>4} blocked  {:>4} waiting",
            format_time(bucket.start),
            bucket.count,
            bucket.stats.blocked,
            bucket.stats.waiting
        )?;
    }
    Ok(())
}

fn write_heap(out: &mut String, style: Style, view: &HeapView) -> fmt::Result {
    write_matched(out, view.matched_records, view.total_records)?;

    writeln!(out, "{}", style.heading("Regions"))?;
    for usage in &view.region_usage {
        writeln!(
            out,
            "  {:<20} {:>10} / {:<10} {:>5.1}%  {}",
            usage.region,
            format_bytes(usage.used_bytes),
            format_bytes(usage.capacity_bytes),
            usage.utilization_percent,
            style.status(usage.status, 8)
        )?;
    }
    writeln!(out)?;

    writeln!(out, "{}", style.heading("Top classes"))?;
    for class in &view.top_classes {
        writeln!(
            out,
            "  {:<40} {:>10} {:>10} instances",
            truncate(&class.class_name, 40),
            format_bytes(class.bytes),
            class.instance_count
        )?;
    }

    if !view.leak_suspects.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", style.heading("Leak suspects"))?;
        for suspect in &view.leak_suspects {
            writeln!(
                out,
                "  {} {:<40} {} -> {}  (+{:.1}%/h)",
                style.severity(suspect.severity, 8),
                truncate(&suspect.class_name, 40),
                format_bytes(suspect.first_bytes),
                format_bytes(suspect.latest_bytes),
                suspect.growth_percent_per_hour
            )?;
        }
    }
    writeln!(out)?;

    writeln!(
        out,
        "{}",
        style.heading(&format!("Trend ({}s buckets)", view.trend.bucket_width_secs))
    )?;
    for bucket in &view.trend.buckets {
        writeln!(
            out,
            "  {}  {:>5} samples  peak {:>10}  {:>5.1}%",
            format_time(bucket.start),
            bucket.count,
            format_bytes(bucket.stats.peak_used_bytes),
            bucket.stats.peak_utilization_percent
        )?;
    }
    Ok(())
}

fn write_logs(out: &mut String, style: Style, view: &LogView) -> fmt::Result {
    write_matched(out, view.matched_records, view.total_records)?;
    write_distribution(out, style, "Levels", &view.levels)?;

    if !view.top_errors.is_empty() {
        writeln!(out, "{}", style.heading("Top errors"))?;
        for error in &view.top_errors {
            writeln!(
                out,
                "  {:>4}x  {:<5} {} {}",
                error.occurrences,
                error.level.as_str(),
                style.severity(error.severity, 8),
                truncate(&error.signature, 60)
            )?;
            writeln!(
                out,
                "         {}",
                style.dim(&format!(
                    "last {} in {}",
                    format_time(error.last_seen),
                    error.logger
                ))
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", style.heading("Modules"))?;
    writeln!(
        out,
        "  {:<24} {:>6} {:>8} {:>6} {:>7}  STATUS",
        "MODULE", "ERRORS", "WARNINGS", "TOTAL", "RATE"
    )?;
    for module in &view.modules {
        writeln!(
            out,
            "  {:<24} {:>6} {:>8} {:>6} {:>6.1}%  {}",
            truncate(&module.module, 24),
            module.errors,
            module.warnings,
            module.total,
            module.error_rate_percent,
            style.status(module.status, 8)
        )?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "{}",
        style.heading(&format!("Trend ({}s buckets)", view.trend.bucket_width_secs))
    )?;
    for bucket in &view.trend.buckets {
        let s = &bucket.stats;
        writeln!(
            out,
            "  {}  {:>5} entries  E {:<4} W {:<4} I {:<4} D {:<4}",
            format_time(bucket.start),
            bucket.count,
            s.error,
            s.warn,
            s.info,
            s.debug
        )?;
    }
    Ok(())
}

fn write_queries(out: &mut String, style: Style, view: &QueryView) -> fmt::Result {
    write_matched(out, view.matched_records, view.total_records)?;
    writeln!(out, "{} slow queries", view.slow_queries)?;
    writeln!(out)?;

    write_distribution(out, style, "Statements", &view.verbs)?;

    if !view.verb_performance.is_empty() {
        writeln!(out, "{}", style.heading("Performance by verb"))?;
        for verb in &view.verb_performance {
            writeln!(
                out,
                "  {:<8} {:>6} queries  avg {:>9}",
                verb.verb,
                verb.count,
                format_ms(verb.avg_exec_ms)
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", style.heading("Slowest"))?;
    for rank in &view.slowest {
        let marker = if rank.slow { "slow" } else { "" };
        writeln!(
            out,
            "  {:>9} {:<4} {:<12} {}",
            format_ms(rank.exec_time_ms),
            marker,
            truncate(&rank.database, 12),
            truncate(&rank.sql, 60)
        )?;
        writeln!(
            out,
            "            {}",
            style.dim(&format!(
                "{}x, avg {}, lock {}, rows {}/{}",
                rank.occurrences,
                format_ms(rank.avg_exec_time_ms),
                format_ms(rank.lock_time_ms),
                rank.rows_sent,
                rank.rows_examined
            ))
        )?;
        for suggestion in &rank.suggestions {
            writeln!(out, "            - {}", suggestion)?;
        }
    }
    writeln!(out)?;

    writeln!(out, "{}", style.heading("Databases"))?;
    for db in &view.databases {
        writeln!(
            out,
            "  {:<20} {:>6} queries  avg {:>9}  max {:>9}  {:>4} slow",
            truncate(&db.database, 20),
            db.queries,
            format_ms(db.avg_exec_ms),
            format_ms(db.max_exec_ms),
            db.slow
        )?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "{}",
        style.heading(&format!("Trend ({}s buckets)", view.trend.bucket_width_secs))
    )?;
    for bucket in &view.trend.buckets {
        writeln!(
            out,
            "  {}  {:>5} queries  avg {:>9}  max {:>9}  {:>4} slow",
            format_time(bucket.start),
            bucket.count,
            format_ms(bucket.stats.avg_exec_ms),
            format_ms(bucket.stats.max_exec_ms),
            bucket.stats.slow
        )?;
    }
    Ok(())
}
