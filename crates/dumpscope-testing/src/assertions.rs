//! Assertions for aggregate invariants.

use chrono::{DateTime, Utc};

/// Assert a sequence is non-increasing.
pub fn assert_descending(values: &[f64]) {
    for pair in values.windows(2) {
        assert!(
            pair[0] >= pair[1],
            "expected descending order, found {} before {} in {:?}",
            pair[0],
            pair[1],
            values
        );
    }
}

/// Assert bucket starts are exactly `width_ms` apart with no gaps.
pub fn assert_evenly_spaced(starts: &[DateTime<Utc>], width_ms: i64) {
    for pair in starts.windows(2) {
        let step = (pair[1] - pair[0]).num_milliseconds();
        assert_eq!(
            step, width_ms,
            "bucket starts {} and {} are {}ms apart, expected {}ms",
            pair[0], pair[1], step, width_ms
        );
    }
}
