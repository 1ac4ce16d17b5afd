use chrono::{DateTime, Utc};
use dumpscope_types::{DiagnosticRecord, QueryRecord, SourceKind};
use serde::Serialize;
use std::collections::HashMap;

use super::SourceAdapter;
use crate::aggregate::{Scored, top_n};
use crate::options::ViewOptions;

#[derive(Debug, Clone, Copy)]
pub struct QueryAdapter {
    pub slow_query_ms: f64,
}

impl Default for QueryAdapter {
    fn default() -> Self {
        Self {
            slow_query_ms: ViewOptions::default().slow_query_ms,
        }
    }
}

/// Normalized statement, represented by its slowest execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRank {
    pub sql: String,
    pub verb: String,
    pub database: String,
    pub exec_time_ms: f64,
    pub lock_time_ms: f64,
    pub rows_examined: u64,
    pub rows_sent: u64,
    pub occurrences: usize,
    pub avg_exec_time_ms: f64,
    pub slow: bool,
    pub suggestions: Vec<String>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryBucket {
    pub avg_exec_ms: f64,
    pub max_exec_ms: f64,
    pub slow: usize,
    #[serde(skip)]
    sum_exec_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseStats {
    pub database: String,
    pub queries: usize,
    pub avg_exec_ms: f64,
    pub max_exec_ms: f64,
    pub slow: usize,
}

/// Statement count and mean execution time per SQL verb
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerbStats {
    pub verb: String,
    pub count: usize,
    pub avg_exec_ms: f64,
}

impl QueryAdapter {
    pub fn new(slow_query_ms: f64) -> Self {
        Self { slow_query_ms }
    }

    pub fn is_slow(&self, query: &QueryRecord) -> bool {
        query.exec_time_ms >= self.slow_query_ms
    }

    pub fn slow_count(&self, records: &[&DiagnosticRecord]) -> usize {
        records
            .iter()
            .filter_map(|r| r.as_query())
            .filter(|q| self.is_slow(q))
            .count()
    }

    /// Per-database totals in first-seen order
    pub fn databases(&self, records: &[&DiagnosticRecord]) -> Vec<DatabaseStats> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut stats: Vec<(DatabaseStats, f64)> = Vec::new();

        for query in records.iter().filter_map(|r| r.as_query()) {
            let i = *index.entry(query.database.as_str()).or_insert_with(|| {
                stats.push((
                    DatabaseStats {
                        database: query.database.clone(),
                        queries: 0,
                        avg_exec_ms: 0.0,
                        max_exec_ms: 0.0,
                        slow: 0,
                    },
                    0.0,
                ));
                stats.len() - 1
            });
            let (db, sum) = &mut stats[i];
            db.queries += 1;
            *sum += query.exec_time_ms;
            db.max_exec_ms = db.max_exec_ms.max(query.exec_time_ms);
            if self.is_slow(query) {
                db.slow += 1;
            }
        }

        stats
            .into_iter()
            .map(|(mut db, sum)| {
                db.avg_exec_ms = sum / db.queries as f64;
                db
            })
            .collect()
    }
}

impl QueryAdapter {
    /// Per-verb totals in first-seen order
    pub fn verbs(&self, records: &[&DiagnosticRecord]) -> Vec<VerbStats> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut stats: Vec<(VerbStats, f64)> = Vec::new();

        for query in records.iter().filter_map(|r| r.as_query()) {
            let verb = query.verb();
            let i = match index.get(&verb) {
                Some(&i) => i,
                None => {
                    index.insert(verb.clone(), stats.len());
                    stats.push((
                        VerbStats {
                            verb,
                            count: 0,
                            avg_exec_ms: 0.0,
                        },
                        0.0,
                    ));
                    stats.len() - 1
                }
            };
            let (entry, sum) = &mut stats[i];
            entry.count += 1;
            *sum += query.exec_time_ms;
        }

        stats
            .into_iter()
            .map(|(mut entry, sum)| {
                entry.avg_exec_ms = sum / entry.count as f64;
                entry
            })
            .collect()
    }
}

impl SourceAdapter for QueryAdapter {
    type Payload = QueryRecord;
    type Ranked = QueryRank;
    type BucketStats = QueryBucket;

    const KIND: SourceKind = SourceKind::Query;

    fn payload(record: &DiagnosticRecord) -> Option<&QueryRecord> {
        record.as_query()
    }

    fn category(&self, payload: &QueryRecord) -> String {
        payload.verb()
    }

    /// Ranks distinct statements by their slowest execution time.
    fn rank(&self, records: &[&DiagnosticRecord], n: usize) -> Vec<QueryRank> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(QueryRank, f64)> = Vec::new();

        for record in records {
            let Some(query) = record.as_query() else {
                continue;
            };
            match index.get(query.sql.as_str()) {
                Some(&i) => {
                    let (rank, sum) = &mut groups[i];
                    rank.occurrences += 1;
                    *sum += query.exec_time_ms;
                    let slower = query.exec_time_ms > rank.exec_time_ms;
                    let as_slow_but_newer = query.exec_time_ms == rank.exec_time_ms
                        && record.captured_at > rank.captured_at;
                    if slower || as_slow_but_newer {
                        rank.database = query.database.clone();
                        rank.exec_time_ms = query.exec_time_ms;
                        rank.lock_time_ms = query.lock_time_ms;
                        rank.rows_examined = query.rows_examined;
                        rank.rows_sent = query.rows_sent;
                        rank.captured_at = record.captured_at;
                    }
                    for suggestion in &query.suggestions {
                        if !rank.suggestions.contains(suggestion) {
                            rank.suggestions.push(suggestion.clone());
                        }
                    }
                }
                None => {
                    index.insert(query.sql.as_str(), groups.len());
                    groups.push((
                        QueryRank {
                            sql: query.sql.clone(),
                            verb: query.verb(),
                            database: query.database.clone(),
                            exec_time_ms: query.exec_time_ms,
                            lock_time_ms: query.lock_time_ms,
                            rows_examined: query.rows_examined,
                            rows_sent: query.rows_sent,
                            occurrences: 1,
                            avg_exec_time_ms: query.exec_time_ms,
                            slow: false,
                            suggestions: query.suggestions.clone(),
                            captured_at: record.captured_at,
                        },
                        query.exec_time_ms,
                    ));
                }
            }
        }

        let candidates = groups
            .into_iter()
            .map(|(mut rank, sum)| {
                rank.avg_exec_time_ms = sum / rank.occurrences as f64;
                rank.slow = rank.exec_time_ms >= self.slow_query_ms;
                Scored {
                    score: rank.exec_time_ms,
                    captured_at: rank.captured_at,
                    item: rank,
                }
            })
            .collect();

        top_n(candidates, n)
    }

    fn accumulate(&self, stats: &mut QueryBucket, payload: &QueryRecord) {
        stats.sum_exec_ms += payload.exec_time_ms;
        stats.max_exec_ms = stats.max_exec_ms.max(payload.exec_time_ms);
        if self.is_slow(payload) {
            stats.slow += 1;
        }
    }

    fn finish_bucket(&self, stats: &mut QueryBucket, count: usize) {
        if count > 0 {
            stats.avg_exec_ms = stats.sum_exec_ms / count as f64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dumpscope_testing::{query, sample_queries};

    fn refs(records: &[DiagnosticRecord]) -> Vec<&DiagnosticRecord> {
        records.iter().collect()
    }

    #[test]
    fn test_summarize_by_verb() {
        let records = sample_queries();
        let dist = QueryAdapter::default().summarize(&refs(&records));
        let pairs: Vec<(&str, usize)> = dist
            .entries()
            .iter()
            .map(|c| (c.category.as_str(), c.count))
            .collect();
        assert_eq!(pairs, vec![("SELECT", 2), ("UPDATE", 1), ("INSERT", 1)]);
    }

    #[test]
    fn test_rank_by_exec_time() {
        let records = sample_queries();
        let ranked = QueryAdapter::default().rank(&refs(&records), 3);

        let times: Vec<f64> = ranked.iter().map(|r| r.exec_time_ms).collect();
        assert_eq!(times, vec![15_720.0, 12_450.0, 8_930.0]);
        assert!(ranked.iter().all(|r| r.slow));
        assert_eq!(ranked[0].suggestions.len(), 2);
    }

    #[test]
    fn test_rank_groups_repeated_statements() {
        let records = vec![
            query("SELECT 1").exec_ms(10.0).minute(0).build(),
            query("SELECT 1").exec_ms(30.0).minute(1).build(),
            query("SELECT 2").exec_ms(20.0).minute(2).build(),
        ];
        let ranked = QueryAdapter::default().rank(&refs(&records), 5);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].sql, "SELECT 1");
        assert_eq!(ranked[0].occurrences, 2);
        assert_eq!(ranked[0].avg_exec_time_ms, 20.0);
        assert!(!ranked[0].slow);
    }

    #[test]
    fn test_trend_average_and_max() {
        let records = sample_queries();
        let buckets = QueryAdapter::default().trend(&refs(&records), Duration::minutes(15));

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].stats.max_exec_ms, 15_720.0);
        assert_eq!(buckets[0].stats.slow, 1);
        assert_eq!(buckets[1].count, 2);
        assert_eq!(buckets[1].stats.avg_exec_ms, (12_450.0 + 0.45) / 2.0);
        assert_eq!(buckets[2].stats.slow, 1);
    }

    #[test]
    fn test_slow_threshold_is_inclusive() {
        let adapter = QueryAdapter::new(1000.0);
        let records = vec![
            query("SELECT a").exec_ms(999.9).build(),
            query("SELECT b").exec_ms(1000.0).build(),
        ];
        assert_eq!(adapter.slow_count(&refs(&records)), 1);
    }

    #[test]
    fn test_verb_performance() {
        let records = sample_queries();
        let verbs = QueryAdapter::default().verbs(&refs(&records));

        let rows: Vec<(&str, usize, f64)> = verbs
            .iter()
            .map(|v| (v.verb.as_str(), v.count, v.avg_exec_ms))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("SELECT", 2, (15_720.0 + 8_930.0) / 2.0),
                ("UPDATE", 1, 12_450.0),
                ("INSERT", 1, 0.45),
            ]
        );
        assert!(QueryAdapter::default().verbs(&[]).is_empty());
    }

    #[test]
    fn test_database_stats() {
        let records = sample_queries();
        let dbs = QueryAdapter::default().databases(&refs(&records));

        let names: Vec<&str> = dbs.iter().map(|d| d.database.as_str()).collect();
        assert_eq!(names, vec!["application_db", "orders_db", "logging_db"]);
        assert_eq!(dbs[2].queries, 2);
        assert_eq!(dbs[2].slow, 1);
        assert_eq!(dbs[2].max_exec_ms, 8_930.0);
    }
}
