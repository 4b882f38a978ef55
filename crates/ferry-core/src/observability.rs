//! Status views over the executor.

use serde::{Deserialize, Serialize};

/// Snapshot of submissions by lifecycle state.
///
/// Terminal buckets are cumulative since the executor was created; `pending`
/// and `running` reflect the moment of the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorCounts {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub failed: usize,
}

impl ExecutorCounts {
    /// Submissions that have not yet reached a terminal state.
    pub fn active(&self) -> usize {
        self.pending + self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_sums_pending_and_running() {
        let counts = ExecutorCounts {
            pending: 2,
            running: 3,
            completed: 10,
            cancelled: 1,
            failed: 4,
        };
        assert_eq!(counts.active(), 5);
    }

    #[test]
    fn counts_roundtrip_json() {
        let counts = ExecutorCounts {
            pending: 1,
            ..Default::default()
        };
        let json = serde_json::to_string(&counts).unwrap();
        let back: ExecutorCounts = serde_json::from_str(&json).unwrap();
        assert_eq!(counts, back);
    }
}
