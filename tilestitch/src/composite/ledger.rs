//! Per-stitch tile success and failure accounting.

use crate::provider::FetchFailure;
use std::fmt;

/// A tile position for which every URL template failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTile {
    pub x: u32,
    pub y: u32,
    /// Templates tried for this position
    pub attempts: u32,
    /// Failure of the last template tried
    pub failure: FetchFailure,
}

/// Why a stitch produced no usable image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustionReason {
    NoTilesSucceeded,
    TooManyFailures { failed: usize, total: usize },
}

impl fmt::Display for ExhaustionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhaustionReason::NoTilesSucceeded => write!(f, "no tiles could be fetched"),
            ExhaustionReason::TooManyFailures { failed, total } => {
                write!(f, "{} of {} tiles failed", failed, total)
            }
        }
    }
}

/// Outcome of applying the failure policy to a finished ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerVerdict {
    /// Every tile position was filled
    Complete,
    /// Some tiles failed but few enough to accept the image
    Partial,
    Exhausted(ExhaustionReason),
}

/// Tile accounting for one stitch operation.
///
/// `total_tiles` counts tile positions, not template attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureLedger {
    total_tiles: usize,
    successful_tiles: usize,
    failed_tiles: Vec<FailedTile>,
}

impl FailureLedger {
    pub fn new(total_tiles: usize) -> Self {
        Self {
            total_tiles,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self) {
        self.successful_tiles += 1;
    }

    pub fn record_failure(&mut self, failed: FailedTile) {
        self.failed_tiles.push(failed);
    }

    pub fn total_tiles(&self) -> usize {
        self.total_tiles
    }

    pub fn successful_tiles(&self) -> usize {
        self.successful_tiles
    }

    /// Failed positions in the order they were visited.
    pub fn failed_tiles(&self) -> &[FailedTile] {
        &self.failed_tiles
    }

    pub fn failed_count(&self) -> usize {
        self.failed_tiles.len()
    }

    /// Positions recorded so far.
    pub fn processed(&self) -> usize {
        self.successful_tiles + self.failed_tiles.len()
    }

    /// Applies the failure policy.
    ///
    /// Zero successes is always exhaustion. Otherwise the run is exhausted
    /// when `failed > total * max_failure_ratio`; with the default ratio of
    /// 0.5 that is "more than half the grid missing".
    pub fn verdict(&self, max_failure_ratio: f64) -> LedgerVerdict {
        let failed = self.failed_count();

        if self.successful_tiles == 0 {
            return LedgerVerdict::Exhausted(ExhaustionReason::NoTilesSucceeded);
        }
        if failed as f64 > self.total_tiles as f64 * max_failure_ratio {
            return LedgerVerdict::Exhausted(ExhaustionReason::TooManyFailures {
                failed,
                total: self.total_tiles,
            });
        }
        if failed == 0 {
            LedgerVerdict::Complete
        } else {
            LedgerVerdict::Partial
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(x: u32) -> FailedTile {
        FailedTile {
            x,
            y: 0,
            attempts: 1,
            failure: FetchFailure {
                url: format!("http://t/10/{}/0.png", x),
                http_status: Some(404),
                reason: "HTTP 404".to_string(),
            },
        }
    }

    fn ledger(successes: usize, failures: usize) -> FailureLedger {
        let mut ledger = FailureLedger::new(successes + failures);
        for _ in 0..successes {
            ledger.record_success();
        }
        for x in 0..failures {
            ledger.record_failure(failed(x as u32));
        }
        ledger
    }

    #[test]
    fn test_all_succeeded_is_complete() {
        assert_eq!(ledger(4, 0).verdict(0.5), LedgerVerdict::Complete);
    }

    #[test]
    fn test_seven_of_ten_failed_is_exhausted() {
        assert_eq!(
            ledger(3, 7).verdict(0.5),
            LedgerVerdict::Exhausted(ExhaustionReason::TooManyFailures {
                failed: 7,
                total: 10
            })
        );
    }

    #[test]
    fn test_four_of_ten_failed_is_partial() {
        let ledger = ledger(6, 4);
        assert_eq!(ledger.verdict(0.5), LedgerVerdict::Partial);
        assert_eq!(ledger.failed_count(), 4);
        assert_eq!(ledger.successful_tiles(), 6);
    }

    #[test]
    fn test_exactly_half_failed_is_partial() {
        assert_eq!(ledger(5, 5).verdict(0.5), LedgerVerdict::Partial);
    }

    #[test]
    fn test_odd_total_majority_failed() {
        // 2 > 3 / 2
        assert!(matches!(
            ledger(1, 2).verdict(0.5),
            LedgerVerdict::Exhausted(_)
        ));
    }

    #[test]
    fn test_zero_successes_is_exhausted() {
        assert_eq!(
            ledger(0, 1).verdict(1.0),
            LedgerVerdict::Exhausted(ExhaustionReason::NoTilesSucceeded)
        );
    }

    #[test]
    fn test_ratio_is_configurable() {
        assert_eq!(ledger(9, 1).verdict(0.5), LedgerVerdict::Partial);
        assert!(matches!(ledger(9, 1).verdict(0.05), LedgerVerdict::Exhausted(_)));
        assert_eq!(ledger(2, 8).verdict(0.8), LedgerVerdict::Partial);
    }

    #[test]
    fn test_failures_kept_in_order() {
        let ledger = ledger(1, 3);
        let xs: Vec<u32> = ledger.failed_tiles().iter().map(|f| f.x).collect();
        assert_eq!(xs, vec![0, 1, 2]);
        assert_eq!(ledger.processed(), 4);
    }

    #[test]
    fn test_reason_display() {
        let reason = ExhaustionReason::TooManyFailures {
            failed: 7,
            total: 10,
        };
        assert_eq!(reason.to_string(), "7 of 10 tiles failed");
    }
}
