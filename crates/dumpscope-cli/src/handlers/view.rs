use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use dumpscope_engine::ViewOptions;
use dumpscope_runtime::{Config, Dashboard, DashboardEvent, JsonRecordIngestor, Upload};
use dumpscope_types::{RecordFilter, SourceKind, Tab, TimeRange};

use crate::args::ViewArgs;
use crate::files::collect_files;
use crate::presentation::{
    CommandResultViewModel, ConsoleRenderer, Guidance, StatusBadge, ViewReport,
};

pub fn handle(renderer: &ConsoleRenderer, config: &Config, args: ViewArgs) -> Result<()> {
    let tab: Tab = args.tab.into();
    let filter = build_filter(&args)?;
    let options = view_options(config, &args, tab);
    let kind: Option<SourceKind> = args.kind.map(Into::into);

    let files = collect_files(&args.paths)?;
    let uploads = files
        .iter()
        .map(|path| {
            let upload = Upload::from_path(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(match kind {
                Some(kind) => upload.with_kind(kind),
                None => upload,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(run_session(uploads, options, tab, filter));

    let badge = badge_for(&report);
    let suggestions = suggestions_for(&report, &args);
    renderer.render(
        CommandResultViewModel::new(report)
            .with_badge(badge)
            .with_suggestions(suggestions),
    )
}

/// One dashboard session: ingest everything, then render the selected tab
async fn run_session(
    uploads: Vec<Upload>,
    options: ViewOptions,
    tab: Tab,
    filter: RecordFilter,
) -> ViewReport {
    let mut dashboard = Dashboard::new(JsonRecordIngestor, options);
    for upload in uploads {
        dashboard.upload(upload);
    }

    while let Some(event) = dashboard.next_event().await {
        if let DashboardEvent::UploadFailed { id, reason } = event {
            tracing::debug!(%id, %reason, "upload failed");
        }
    }

    dashboard.select_tab(tab);
    dashboard.set_filter(tab, filter);

    ViewReport {
        uploads: dashboard.uploads().to_vec(),
        rejected_total: dashboard.store().rejected_total(),
        view: dashboard.view(),
    }
}

fn build_filter(args: &ViewArgs) -> Result<RecordFilter> {
    let mut filter = RecordFilter::new();

    if let Some(text) = &args.search {
        filter = filter.search(text.clone());
    }
    for category in &args.categories {
        filter = filter.category(category.clone());
    }

    let since = args
        .since
        .as_deref()
        .map(|s| parse_instant("--since", s))
        .transpose()?;
    let until = args
        .until
        .as_deref()
        .map(|s| parse_instant("--until", s))
        .transpose()?;
    if since.is_some() || until.is_some() {
        filter = filter.time_range(TimeRange {
            start: since,
            end: until,
        });
    }

    Ok(filter)
}

fn parse_instant(flag: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .with_context(|| format!("{} expects an RFC 3339 instant, got '{}'", flag, value))
}

fn view_options(config: &Config, args: &ViewArgs, tab: Tab) -> ViewOptions {
    let mut options = config.to_view_options();

    if let Some(top) = args.top {
        options.top_n = top as usize;
    }
    if let Some(secs) = args.bucket {
        match tab.source_kind() {
            // Range-checked by clap, so the conversion cannot overflow
            Some(kind) => options
                .bucket_widths
                .set(kind, Duration::seconds(secs as i64)),
            None => tracing::warn!("--bucket has no effect on the overview tab"),
        }
    }

    options
}

fn badge_for(report: &ViewReport) -> StatusBadge {
    let uploads = report.uploads.len();
    let failed = report.failed_uploads();
    let accepted = report.accepted_total();

    if uploads == 0 {
        StatusBadge::info("No files to ingest")
    } else if failed == uploads {
        StatusBadge::error(format!("All {} upload(s) failed", uploads))
    } else if failed > 0 || report.rejected_total > 0 {
        StatusBadge::warning(format!(
            "Ingested {} record(s); {} rejected, {} of {} upload(s) failed",
            accepted, report.rejected_total, failed, uploads
        ))
    } else {
        StatusBadge::success(format!(
            "Ingested {} record(s) from {} upload(s)",
            accepted, uploads
        ))
    }
}

fn suggestions_for(report: &ViewReport, args: &ViewArgs) -> Vec<Guidance> {
    let mut tips = Vec::new();
    let paths: Vec<String> = args
        .paths
        .iter()
        .map(|p| p.display().to_string())
        .collect();

    if report.rejected_total > 0 || report.failed_uploads() > 0 {
        tips.push(
            Guidance::new("See why records were rejected")
                .with_command(format!("dumpscope validate {}", paths.join(" "))),
        );
    }
    if report.view.is_empty() && !report.view.filter.is_empty() {
        tips.push(Guidance::new(
            "Nothing matched; loosen --search, --category, --since or --until",
        ));
    }
    tips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TabArg;
    use dumpscope_testing::at_minute;
    use std::path::PathBuf;

    fn args() -> ViewArgs {
        ViewArgs {
            paths: vec![PathBuf::from("x.log")],
            tab: TabArg::ThreadDump,
            search: None,
            categories: Vec::new(),
            since: None,
            until: None,
            top: None,
            bucket: None,
            kind: None,
        }
    }

    #[test]
    fn test_build_filter_from_flags() {
        let mut a = args();
        a.search = Some("pool".to_string());
        a.categories = vec!["BLOCKED".to_string()];
        a.since = Some("2024-01-15T10:01:00Z".to_string());

        let filter = build_filter(&a).unwrap();
        assert_eq!(filter.search_text.as_deref(), Some("pool"));
        assert_eq!(filter.categories, vec!["BLOCKED"]);
        assert_eq!(filter.time_range, Some(TimeRange::since(at_minute(1))));
    }

    #[test]
    fn test_bad_instant_names_the_flag() {
        let mut a = args();
        a.until = Some("tomorrow".to_string());
        let err = build_filter(&a).unwrap_err();
        assert!(err.to_string().contains("--until"));
    }

    #[test]
    fn test_flags_override_config() {
        let mut a = args();
        a.top = Some(3);
        a.bucket = Some(60);

        let options = view_options(&Config::default(), &a, Tab::ThreadDump);
        assert_eq!(options.top_n, 3);
        assert_eq!(
            options.bucket_widths.for_kind(SourceKind::Thread),
            Duration::seconds(60)
        );
        assert_eq!(
            options.bucket_widths.for_kind(SourceKind::Log),
            Duration::minutes(15)
        );
    }
}
