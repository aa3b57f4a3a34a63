//! Status classifications for monitoring checks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Balance synchronization status, by number of unsynchronized accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// No discrepancies.
    Ok,
    /// One to three discrepancies.
    Warning,
    /// More than three discrepancies.
    Error,
}

impl SyncStatus {
    /// Classifies a discrepancy count.
    #[must_use]
    pub const fn from_count(discrepancies: usize) -> Self {
        match discrepancies {
            0 => Self::Ok,
            1..=3 => Self::Warning,
            _ => Self::Error,
        }
    }

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Double-posting status, by number of patterns found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoublePostingStatus {
    /// No patterns.
    Clean,
    /// One or two patterns.
    Warning,
    /// More than two patterns.
    Critical,
}

impl DoublePostingStatus {
    /// Classifies a pattern count.
    #[must_use]
    pub const fn from_count(patterns: usize) -> Self {
        match patterns {
            0 => Self::Clean,
            1..=2 => Self::Warning,
            _ => Self::Critical,
        }
    }

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "CLEAN",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for DoublePostingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monitoring cycle state machine.
///
/// IDLE → CHECKING → (CLEAN | DEGRADED) → IDLE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleState {
    /// Waiting for the next tick.
    Idle,
    /// Checks are running.
    Checking,
    /// Last checks found nothing.
    Clean,
    /// Last checks found discrepancies or patterns.
    Degraded,
}

impl CycleState {
    /// Verdict for a finished set of checks.
    #[must_use]
    pub fn from_results(sync: SyncStatus, double_posting: DoublePostingStatus) -> Self {
        if sync == SyncStatus::Ok && double_posting == DoublePostingStatus::Clean {
            Self::Clean
        } else {
            Self::Degraded
        }
    }

    /// Returns the string representation of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Checking => "CHECKING",
            Self::Clean => "CLEAN",
            Self::Degraded => "DEGRADED",
        }
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, SyncStatus::Ok)]
    #[case(1, SyncStatus::Warning)]
    #[case(3, SyncStatus::Warning)]
    #[case(4, SyncStatus::Error)]
    fn test_sync_status(#[case] count: usize, #[case] expected: SyncStatus) {
        assert_eq!(SyncStatus::from_count(count), expected);
    }

    #[rstest]
    #[case(0, DoublePostingStatus::Clean)]
    #[case(2, DoublePostingStatus::Warning)]
    #[case(3, DoublePostingStatus::Critical)]
    fn test_double_posting_status(#[case] count: usize, #[case] expected: DoublePostingStatus) {
        assert_eq!(DoublePostingStatus::from_count(count), expected);
    }

    #[test]
    fn test_cycle_verdict() {
        assert_eq!(
            CycleState::from_results(SyncStatus::Ok, DoublePostingStatus::Clean),
            CycleState::Clean
        );
        assert_eq!(
            CycleState::from_results(SyncStatus::Ok, DoublePostingStatus::Warning),
            CycleState::Degraded
        );
        assert_eq!(
            CycleState::from_results(SyncStatus::Error, DoublePostingStatus::Clean),
            CycleState::Degraded
        );
    }
}
