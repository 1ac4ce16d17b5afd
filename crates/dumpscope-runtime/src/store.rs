use dumpscope_types::DiagnosticRecord;

/// Validated records of the current session.
///
/// Append-only until `clear`. Every mutation bumps `revision`, so a view
/// computed at an older revision is known to be stale.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<DiagnosticRecord>,
    revision: u64,
    rejected_total: usize,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Records dropped by validation or decoding since the last clear
    pub fn rejected_total(&self) -> usize {
        self.rejected_total
    }

    /// Apply one upload's outcome in a single step
    pub fn append(&mut self, accepted: Vec<DiagnosticRecord>, rejected: usize) {
        self.records.extend(accepted);
        self.rejected_total += rejected;
        self.revision += 1;
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.rejected_total = 0;
        self.revision += 1;
    }
}
