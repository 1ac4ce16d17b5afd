// Aggregation primitives shared by every source adapter.
// All functions are pure: they read records and return fresh values.

use chrono::{DateTime, Duration, Utc};
use dumpscope_types::DiagnosticRecord;
use serde::Serialize;
use std::collections::HashMap;

/// Count of records in one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Categorical distribution in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Distribution(pub Vec<CategoryCount>);

impl Distribution {
    pub fn total(&self) -> usize {
        self.0.iter().map(|c| c.count).sum()
    }

    pub fn get(&self, category: &str) -> usize {
        self.0
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[CategoryCount] {
        &self.0
    }
}

/// Group values and count them, keeping the order in which each category
/// first appeared.
pub fn distribution<I>(categories: I) -> Distribution
where
    I: IntoIterator<Item = String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<CategoryCount> = Vec::new();

    for category in categories {
        match index.get(&category) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(category.clone(), counts.len());
                counts.push(CategoryCount { category, count: 1 });
            }
        }
    }

    Distribution(counts)
}

/// Candidate for a top-N ranking
pub struct Scored<T> {
    pub item: T,
    pub score: f64,
    pub captured_at: DateTime<Utc>,
}

/// Keep the `n` highest-scoring items.
///
/// Order: score descending, then most recent `captured_at` first, then input
/// order (the sort is stable).
pub fn top_n<T>(mut candidates: Vec<Scored<T>>, n: usize) -> Vec<T> {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.captured_at.cmp(&a.captured_at))
    });
    candidates.into_iter().take(n).map(|c| c.item).collect()
}

/// One time bucket of a trend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendBucket<S> {
    pub start: DateTime<Utc>,
    pub count: usize,
    #[serde(flatten)]
    pub stats: S,
}

fn bucket_index(at: DateTime<Utc>, width_ms: i64) -> i64 {
    at.timestamp_millis().div_euclid(width_ms)
}

fn bucket_start(index: i64, width_ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(index.saturating_mul(width_ms)).unwrap_or_default()
}

pub(crate) fn width_ms(width: Duration) -> i64 {
    width.num_milliseconds().max(1)
}

/// Number of buckets a trend over these records would produce.
pub fn bucket_span<'a, I>(records: I, width: Duration) -> usize
where
    I: IntoIterator<Item = &'a DiagnosticRecord>,
{
    let width_ms = width_ms(width);
    let mut bounds: Option<(i64, i64)> = None;
    for record in records {
        let idx = bucket_index(record.captured_at, width_ms);
        bounds = Some(match bounds {
            None => (idx, idx),
            Some((lo, hi)) => (lo.min(idx), hi.max(idx)),
        });
    }
    bounds.map_or(0, |(lo, hi)| (hi - lo + 1) as usize)
}

/// Assign each record to bucket `floor(captured_at / width)` and fold it into
/// that bucket's stats.
///
/// Every bucket between the first and last record is emitted, including empty
/// ones, so chart axes stay evenly spaced. `finish` runs once per bucket with
/// its final count.
pub fn trend<'a, I, S, A, F>(
    records: I,
    width: Duration,
    mut add: A,
    mut finish: F,
) -> Vec<TrendBucket<S>>
where
    I: IntoIterator<Item = &'a DiagnosticRecord>,
    S: Default,
    A: FnMut(&mut S, &DiagnosticRecord),
    F: FnMut(&mut S, usize),
{
    let width_ms = width_ms(width);
    let indexed: Vec<(i64, &DiagnosticRecord)> = records
        .into_iter()
        .map(|r| (bucket_index(r.captured_at, width_ms), r))
        .collect();

    let Some(lo) = indexed.iter().map(|(i, _)| *i).min() else {
        return Vec::new();
    };
    let hi = indexed.iter().map(|(i, _)| *i).max().unwrap_or(lo);

    let mut buckets: Vec<TrendBucket<S>> = (lo..=hi)
        .map(|i| TrendBucket {
            start: bucket_start(i, width_ms),
            count: 0,
            stats: S::default(),
        })
        .collect();

    for (idx, record) in indexed {
        let bucket = &mut buckets[(idx - lo) as usize];
        bucket.count += 1;
        add(&mut bucket.stats, record);
    }

    for bucket in &mut buckets {
        finish(&mut bucket.stats, bucket.count);
    }

    buckets
}
