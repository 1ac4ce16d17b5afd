// Deadlock detection over thread snapshots
//
// Graph: every live thread with a wait edge points at the thread that owns the
// resource it is blocked on. Each thread has at most one outgoing edge (taken
// from its latest snapshot), so a depth-first walk with visited/in-progress
// marking finds every cycle exactly once.

use chrono::{DateTime, Utc};
use dumpscope_types::{DiagnosticRecord, ThreadPriority, WaitEdge};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::Severity;

/// Groups waiting at least this long are critical regardless of priority
const CRITICAL_AFTER_MS: i64 = 2_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadlockMember {
    pub thread_id: String,
    pub name: String,
    pub priority: ThreadPriority,
    /// Resource this thread holds
    pub holds: String,
    /// Next thread in the cycle; it holds what this thread needs
    pub waits_for_thread_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadlockGroup {
    /// Cycle members, starting at the smallest thread id
    pub threads: Vec<DeadlockMember>,
    /// Earliest time any edge of the cycle was first observed
    pub first_observed: DateTime<Utc>,
    pub duration_ms: i64,
    pub severity: Severity,
}

impl DeadlockGroup {
    pub fn thread_ids(&self) -> Vec<&str> {
        self.threads.iter().map(|m| m.thread_id.as_str()).collect()
    }
}

struct Node<'a> {
    name: &'a str,
    priority: ThreadPriority,
    live: bool,
    wait: Option<&'a WaitEdge>,
    /// When the current wait edge was first seen, unchanged, for this thread
    edge_since: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Find deadlock cycles among thread snapshots.
///
/// Wait edges pointing at unknown or terminated threads are ignored. A thread
/// waiting on itself is not reported; cycles need two or more threads.
pub fn detect_deadlocks(records: &[&DiagnosticRecord]) -> Vec<DeadlockGroup> {
    let mut ordered: Vec<&DiagnosticRecord> = records
        .iter()
        .copied()
        .filter(|r| r.as_thread().is_some())
        .collect();
    ordered.sort_by_key(|r| r.captured_at);

    let Some(window_end) = ordered.last().map(|r| r.captured_at) else {
        return Vec::new();
    };

    // BTreeMap keeps traversal order, and therefore output, deterministic
    let mut nodes: BTreeMap<&str, Node> = BTreeMap::new();
    for &record in &ordered {
        let Some(snapshot) = record.as_thread() else {
            continue;
        };
        let edge_since = match (&snapshot.wait, nodes.get(snapshot.thread_id.as_str())) {
            (None, _) => None,
            (Some(edge), Some(prev)) if prev.wait == Some(edge) => prev.edge_since,
            (Some(_), _) => Some(record.captured_at),
        };
        nodes.insert(
            snapshot.thread_id.as_str(),
            Node {
                name: snapshot.name.as_str(),
                priority: snapshot.priority,
                live: snapshot.state.is_live(),
                wait: snapshot.wait.as_ref(),
                edge_since,
            },
        );
    }

    let mut marks: HashMap<&str, Mark> = nodes.keys().map(|id| (*id, Mark::Unvisited)).collect();
    let mut cycles: Vec<Vec<&str>> = Vec::new();

    for &start in nodes.keys() {
        if marks[start] != Mark::Unvisited {
            continue;
        }

        let mut path: Vec<&str> = Vec::new();
        let mut current = start;
        loop {
            marks.insert(current, Mark::InProgress);
            path.push(current);

            let Some(target) = next_live(&nodes, current) else {
                break;
            };
            match marks[target] {
                Mark::Unvisited => current = target,
                Mark::InProgress => {
                    if let Some(pos) = path.iter().position(|id| *id == target) {
                        cycles.push(path[pos..].to_vec());
                    }
                    break;
                }
                Mark::Done => break,
            }
        }

        for id in path {
            marks.insert(id, Mark::Done);
        }
    }

    let mut groups: Vec<DeadlockGroup> = cycles
        .into_iter()
        .filter(|cycle| cycle.len() >= 2)
        .filter_map(|cycle| build_group(&nodes, cycle, window_end))
        .collect();

    groups.sort_by(|a, b| {
        b.duration_ms
            .cmp(&a.duration_ms)
            .then_with(|| a.threads[0].thread_id.cmp(&b.threads[0].thread_id))
    });
    groups
}

/// Thread `id` waits on, if both ends are live and known
fn next_live<'a>(nodes: &BTreeMap<&'a str, Node<'a>>, id: &str) -> Option<&'a str> {
    let node = nodes.get(id)?;
    if !node.live {
        return None;
    }
    let target = node.wait?.waiting_on_thread_id.as_str();
    let (target_id, target_node) = nodes.get_key_value(target)?;
    target_node.live.then_some(*target_id)
}

fn build_group(
    nodes: &BTreeMap<&str, Node>,
    mut cycle: Vec<&str>,
    window_end: DateTime<Utc>,
) -> Option<DeadlockGroup> {
    let smallest = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| **id)
        .map(|(i, _)| i)?;
    cycle.rotate_left(smallest);

    let mut members = Vec::with_capacity(cycle.len());
    let mut first_observed: Option<DateTime<Utc>> = None;

    for (i, id) in cycle.iter().enumerate() {
        let node = nodes.get(id)?;
        let edge = node.wait?;
        let since = node.edge_since?;
        first_observed = Some(first_observed.map_or(since, |t| t.min(since)));

        members.push(DeadlockMember {
            thread_id: id.to_string(),
            name: node.name.to_string(),
            priority: node.priority,
            holds: edge.held_resource.clone(),
            waits_for_thread_id: cycle[(i + 1) % cycle.len()].to_string(),
        });
    }

    let first_observed = first_observed?;
    let duration_ms = (window_end - first_observed).num_milliseconds().max(0);
    let any_high = members.iter().any(|m| m.priority == ThreadPriority::High);
    let severity = if duration_ms >= CRITICAL_AFTER_MS || any_high {
        Severity::Critical
    } else {
        Severity::High
    };

    Some(DeadlockGroup {
        threads: members,
        first_observed,
        duration_ms,
        severity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dumpscope_testing::{at_minute, base_time, thread};
    use dumpscope_types::ThreadState;

    fn refs(records: &[DiagnosticRecord]) -> Vec<&DiagnosticRecord> {
        records.iter().collect()
    }

    #[test]
    fn test_two_thread_cycle_reported_once() {
        let records = vec![
            thread("B").waits_on("A", "lock_b").minute(0).build(),
            thread("A").waits_on("B", "lock_a").minute(0).build(),
        ];
        let groups = detect_deadlocks(&refs(&records));

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].thread_ids(), vec!["A", "B"]);
        assert_eq!(groups[0].threads[0].holds, "lock_a");
        assert_eq!(groups[0].threads[0].waits_for_thread_id, "B");
        assert_eq!(groups[0].threads[1].waits_for_thread_id, "A");
    }

    #[test]
    fn test_duration_from_earliest_edge_observation() {
        let records = vec![
            thread("A").waits_on("B", "lock_a").at(base_time()).build(),
            thread("B")
                .waits_on("A", "lock_b")
                .at(base_time() + Duration::milliseconds(500))
                .build(),
            thread("A")
                .id("A-again")
                .waits_on("B", "lock_a")
                .at(base_time() + Duration::milliseconds(2300))
                .build(),
        ];
        let groups = detect_deadlocks(&refs(&records));

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].first_observed, base_time());
        assert_eq!(groups[0].duration_ms, 2300);
        assert_eq!(groups[0].severity, Severity::Critical);
    }

    #[test]
    fn test_short_medium_priority_cycle_is_high() {
        let records = vec![
            thread("A").waits_on("B", "r1").minute(0).build(),
            thread("B").waits_on("A", "r2").minute(0).build(),
        ];
        let groups = detect_deadlocks(&refs(&records));
        assert_eq!(groups[0].duration_ms, 0);
        assert_eq!(groups[0].severity, Severity::High);
    }

    #[test]
    fn test_unresolved_and_terminated_targets_are_ignored() {
        let records = vec![
            thread("A").waits_on("ghost", "r1").minute(0).build(),
            thread("B").waits_on("C", "r2").minute(0).build(),
            thread("C").waits_on("B", "r3").minute(0).build(),
            thread("C").state(ThreadState::Terminated).minute(1).build(),
        ];
        assert!(detect_deadlocks(&refs(&records)).is_empty());
    }

    #[test]
    fn test_self_wait_is_not_a_deadlock() {
        let records = vec![thread("A").waits_on("A", "r").minute(0).build()];
        assert!(detect_deadlocks(&refs(&records)).is_empty());
    }

    #[test]
    fn test_tail_into_cycle_reports_only_cycle() {
        let records = vec![
            thread("A").waits_on("B", "r1").minute(0).build(),
            thread("B").waits_on("C", "r2").minute(0).build(),
            thread("C").waits_on("D", "r3").minute(0).build(),
            thread("D").waits_on("C", "r4").minute(0).build(),
            thread("E").waits_on("F", "r5").minute(2).build(),
            thread("F").waits_on("G", "r6").minute(2).build(),
            thread("G").waits_on("E", "r7").minute(2).build(),
        ];
        let groups = detect_deadlocks(&refs(&records));

        assert_eq!(groups.len(), 2);
        // C/D has been waiting since minute 0, longer than E/F/G
        assert_eq!(groups[0].thread_ids(), vec!["C", "D"]);
        assert_eq!(groups[0].duration_ms, Duration::minutes(2).num_milliseconds());
        assert_eq!(groups[1].thread_ids(), vec!["E", "F", "G"]);
        assert_eq!(groups[1].first_observed, at_minute(2));
    }

    #[test]
    fn test_edge_change_resets_observation() {
        let records = vec![
            thread("A").waits_on("B", "r1").minute(0).build(),
            thread("B").waits_on("A", "r2").minute(0).build(),
            thread("A").waits_on("B", "r9").minute(3).build(),
            thread("B").waits_on("A", "r2").minute(4).build(),
        ];
        let groups = detect_deadlocks(&refs(&records));

        // B's edge is unchanged since minute 0, so the cycle dates from there
        assert_eq!(groups[0].first_observed, at_minute(0));
        assert_eq!(groups[0].threads[0].holds, "r9");
    }
}
