use chrono::{DateTime, Utc};
use dumpscope_types::{DiagnosticRecord, HeapSample, SourceKind};
use serde::Serialize;
use std::collections::HashMap;

use super::{Severity, SourceAdapter};
use crate::aggregate::{Scored, top_n};
use crate::options::{HealthStatus, Thresholds, ViewOptions};

/// Growth (percent per hour) at which a leak suspect becomes high severity
const LEAK_HIGH_PER_HOUR: f64 = 10.0;
const LEAK_MEDIUM_PER_HOUR: f64 = 6.0;

#[derive(Debug, Clone, Copy)]
pub struct HeapAdapter {
    pub utilization: Thresholds,
}

impl Default for HeapAdapter {
    fn default() -> Self {
        Self {
            utilization: ViewOptions::default().utilization,
        }
    }
}

/// Class retaining the most memory across the latest sample of every region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassRank {
    pub class_name: String,
    pub bytes: u64,
    pub instance_count: u64,
    pub regions: Vec<String>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeapBucket {
    pub peak_used_bytes: u64,
    pub peak_capacity_bytes: u64,
    pub peak_utilization_percent: f64,
}

/// Latest state of one memory region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionUsage {
    pub region: String,
    pub used_bytes: u64,
    pub capacity_bytes: u64,
    pub utilization_percent: f64,
    pub status: HealthStatus,
    pub captured_at: DateTime<Utc>,
}

/// Class whose retained bytes grew between its first and last sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeakSuspect {
    pub class_name: String,
    pub first_bytes: u64,
    pub latest_bytes: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub growth_percent_per_hour: f64,
    pub severity: Severity,
}

/// Latest sample per region, in first-seen region order
fn latest_per_region<'a>(
    records: &[&'a DiagnosticRecord],
) -> Vec<(&'a DiagnosticRecord, &'a HeapSample)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut latest: Vec<(&DiagnosticRecord, &HeapSample)> = Vec::new();

    for &record in records {
        let Some(sample) = record.as_heap() else {
            continue;
        };
        match index.get(sample.region.as_str()) {
            Some(&i) => {
                if record.captured_at >= latest[i].0.captured_at {
                    latest[i] = (record, sample);
                }
            }
            None => {
                index.insert(sample.region.as_str(), latest.len());
                latest.push((record, sample));
            }
        }
    }

    latest
}

impl HeapAdapter {
    pub fn new(utilization: Thresholds) -> Self {
        Self { utilization }
    }

    pub fn region_usage(&self, records: &[&DiagnosticRecord]) -> Vec<RegionUsage> {
        latest_per_region(records)
            .into_iter()
            .map(|(record, sample)| {
                let utilization_percent = sample.utilization_percent();
                RegionUsage {
                    region: sample.region.clone(),
                    used_bytes: sample.used_bytes,
                    capacity_bytes: sample.capacity_bytes,
                    utilization_percent,
                    status: self.utilization.classify(utilization_percent),
                    captured_at: record.captured_at,
                }
            })
            .collect()
    }

    /// Overall utilization of the latest sample per region, 0 without samples
    pub fn overall_utilization(&self, records: &[&DiagnosticRecord]) -> f64 {
        let (used, capacity) = latest_per_region(records)
            .iter()
            .fold((0u64, 0u64), |(u, c), (_, s)| {
                (u.saturating_add(s.used_bytes), c.saturating_add(s.capacity_bytes))
            });
        if capacity == 0 {
            0.0
        } else {
            used as f64 / capacity as f64 * 100.0
        }
    }

    /// Classes whose retained bytes grew, fastest growth first.
    ///
    /// A class needs samples at two distinct instants with a non-zero first
    /// value. Bytes of one class in samples captured at the same instant are
    /// summed.
    pub fn leak_suspects(&self, records: &[&DiagnosticRecord], n: usize) -> Vec<LeakSuspect> {
        // class -> (first_at, first_bytes, last_at, last_bytes)
        let mut spans: Vec<(String, DateTime<Utc>, u64, DateTime<Utc>, u64)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        let mut ordered: Vec<&DiagnosticRecord> = records.to_vec();
        ordered.sort_by_key(|r| r.captured_at);

        for record in ordered {
            let Some(sample) = record.as_heap() else {
                continue;
            };
            for entry in &sample.histogram {
                let at = record.captured_at;
                match index.get(&entry.class_name) {
                    Some(&i) => {
                        let span = &mut spans[i];
                        if span.1 == at {
                            span.2 = span.2.saturating_add(entry.bytes);
                        }
                        if span.3 == at {
                            span.4 = span.4.saturating_add(entry.bytes);
                        } else {
                            span.3 = at;
                            span.4 = entry.bytes;
                        }
                    }
                    None => {
                        index.insert(entry.class_name.clone(), spans.len());
                        spans.push((entry.class_name.clone(), at, entry.bytes, at, entry.bytes));
                    }
                }
            }
        }

        let candidates = spans
            .into_iter()
            .filter_map(|(class_name, first_at, first_bytes, last_at, last_bytes)| {
                let hours = (last_at - first_at).num_milliseconds() as f64 / 3_600_000.0;
                if hours <= 0.0 || first_bytes == 0 || last_bytes <= first_bytes {
                    return None;
                }
                let growth = (last_bytes - first_bytes) as f64 / first_bytes as f64 * 100.0;
                let per_hour = growth / hours;
                let severity = if per_hour >= LEAK_HIGH_PER_HOUR {
                    Severity::High
                } else if per_hour >= LEAK_MEDIUM_PER_HOUR {
                    Severity::Medium
                } else {
                    Severity::Low
                };
                Some(Scored {
                    item: LeakSuspect {
                        class_name,
                        first_bytes,
                        latest_bytes: last_bytes,
                        first_seen: first_at,
                        last_seen: last_at,
                        growth_percent_per_hour: per_hour,
                        severity,
                    },
                    score: per_hour,
                    captured_at: last_at,
                })
            })
            .collect();

        top_n(candidates, n)
    }
}

impl SourceAdapter for HeapAdapter {
    type Payload = HeapSample;
    type Ranked = ClassRank;
    type BucketStats = HeapBucket;

    const KIND: SourceKind = SourceKind::Heap;

    fn payload(record: &DiagnosticRecord) -> Option<&HeapSample> {
        record.as_heap()
    }

    fn category(&self, payload: &HeapSample) -> String {
        payload.region.clone()
    }

    /// Ranks classes by retained bytes, summed over the latest sample of each
    /// region so repeated samples of one region are not double counted.
    fn rank(&self, records: &[&DiagnosticRecord], n: usize) -> Vec<ClassRank> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut classes: Vec<ClassRank> = Vec::new();

        for (record, sample) in latest_per_region(records) {
            for entry in &sample.histogram {
                match index.get(entry.class_name.as_str()) {
                    Some(&i) => {
                        let class = &mut classes[i];
                        class.bytes = class.bytes.saturating_add(entry.bytes);
                        class.instance_count =
                            class.instance_count.saturating_add(entry.instance_count);
                        if !class.regions.contains(&sample.region) {
                            class.regions.push(sample.region.clone());
                        }
                        class.captured_at = class.captured_at.max(record.captured_at);
                    }
                    None => {
                        index.insert(entry.class_name.as_str(), classes.len());
                        classes.push(ClassRank {
                            class_name: entry.class_name.clone(),
                            bytes: entry.bytes,
                            instance_count: entry.instance_count,
                            regions: vec![sample.region.clone()],
                            captured_at: record.captured_at,
                        });
                    }
                }
            }
        }

        let candidates = classes
            .into_iter()
            .map(|class| Scored {
                score: class.bytes as f64,
                captured_at: class.captured_at,
                item: class,
            })
            .collect();

        top_n(candidates, n)
    }

    fn accumulate(&self, stats: &mut HeapBucket, payload: &HeapSample) {
        stats.peak_used_bytes = stats.peak_used_bytes.max(payload.used_bytes);
        stats.peak_capacity_bytes = stats.peak_capacity_bytes.max(payload.capacity_bytes);
        stats.peak_utilization_percent = stats
            .peak_utilization_percent
            .max(payload.utilization_percent());
    }
}
