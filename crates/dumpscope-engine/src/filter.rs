use dumpscope_types::{DiagnosticRecord, RecordFilter, SourceKind};

fn matches_search(record: &DiagnosticRecord, search_text: Option<&str>) -> bool {
    let Some(needle) = search_text.map(str::trim).filter(|s| !s.is_empty()) else {
        return true;
    };
    let needle = needle.to_lowercase();
    record
        .payload
        .text_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

fn matches_time(record: &DiagnosticRecord, filter: &RecordFilter) -> bool {
    filter
        .time_range
        .is_none_or(|range| range.contains(record.captured_at))
}

fn matches_category(record: &DiagnosticRecord, filter: &RecordFilter) -> bool {
    if filter.categories.is_empty() {
        return true;
    }
    let category = record.payload.category();
    filter
        .categories
        .iter()
        .any(|c| c.eq_ignore_ascii_case(&category))
}

/// Full predicate: search text, time range and category must all pass.
pub fn matches(record: &DiagnosticRecord, filter: &RecordFilter) -> bool {
    matches_search(record, filter.search_text.as_deref())
        && matches_time(record, filter)
        && matches_category(record, filter)
}

/// Search text and time range only. Categories are per-source, so the
/// cross-source overview ignores them.
pub fn matches_window(record: &DiagnosticRecord, filter: &RecordFilter) -> bool {
    matches_search(record, filter.search_text.as_deref()) && matches_time(record, filter)
}

/// Records of `kind` passing `filter`, in input order.
pub fn select<'a>(
    records: &'a [DiagnosticRecord],
    kind: SourceKind,
    filter: &RecordFilter,
) -> Vec<&'a DiagnosticRecord> {
    records
        .iter()
        .filter(|r| r.source_kind() == kind && matches(r, filter))
        .collect()
}
