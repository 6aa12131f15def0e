// ABOUTME: Append-only evaluation trace for diagnostic replay

use std::cell::RefCell;

/// One observable evaluation step. `from` is what was about to be
/// evaluated, `to` what it became, `note` a short description of the step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub seq: usize,
    pub line: usize,
    pub from: String,
    pub to: String,
    pub note: String,
}

thread_local! {
    static TRACE: RefCell<TraceLog> = const {
        RefCell::new(TraceLog {
            next_seq: 0,
            records: Vec::new(),
        })
    };
}

struct TraceLog {
    next_seq: usize,
    records: Vec<TraceRecord>,
}

/// Appends a record. Sequence numbers are monotonic within a run.
pub fn record(line: usize, from: impl Into<String>, to: impl Into<String>, note: impl Into<String>) {
    TRACE.with(|trace| {
        let mut trace = trace.borrow_mut();
        trace.next_seq += 1;
        let seq = trace.next_seq;
        trace.records.push(TraceRecord {
            seq,
            line,
            from: from.into(),
            to: to.into(),
            note: note.into(),
        });
    });
}

/// Clears the trace and restarts sequence numbering. Called per run.
pub fn reset() {
    TRACE.with(|trace| {
        let mut trace = trace.borrow_mut();
        trace.next_seq = 0;
        trace.records.clear();
    });
}

/// A copy of everything recorded since the last reset, in append order.
pub fn snapshot() -> Vec<TraceRecord> {
    TRACE.with(|trace| trace.borrow().records.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        reset();
        record(1, "a", "b", "first");
        record(2, "c", "d", "second");
        let records = snapshot();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].seq, 1);
        assert_eq!(records[1].seq, 2);
        assert_eq!(records[0].from, "a");
        assert_eq!(records[1].note, "second");
    }

    #[test]
    fn test_reset_restarts_numbering() {
        reset();
        record(1, "a", "b", "");
        reset();
        assert!(snapshot().is_empty());
        record(9, "x", "y", "");
        let records = snapshot();
        assert_eq!(records[0].seq, 1);
        assert_eq!(records[0].line, 9);
    }
}
