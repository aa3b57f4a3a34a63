//! Severity classification for balance deltas.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ConsistencyError;

/// How urgently a finding needs attention.
///
/// Ordered from least to most severe so findings can be sorted or compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Cosmetic or rounding-sized delta.
    Low,
    /// Small delta on a derived balance.
    Medium,
    /// Material delta.
    High,
    /// Delta large enough, or structural enough, to need immediate action.
    Critical,
}

impl Severity {
    /// Returns the string representation used in logs and storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amount thresholds used to grade a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    /// Deltas strictly above this are [`Severity::Critical`].
    pub critical: Decimal,
    /// Deltas strictly below this fall into the caller's minor tier.
    pub minor: Decimal,
}

impl SeverityThresholds {
    /// Creates thresholds, rejecting negative or inverted bounds.
    pub fn new(critical: Decimal, minor: Decimal) -> Result<Self, ConsistencyError> {
        if minor.is_sign_negative() || minor > critical {
            return Err(ConsistencyError::InvalidThresholds { critical, minor });
        }
        Ok(Self { critical, minor })
    }

    /// Grades `delta` by its absolute value.
    ///
    /// Above `critical` is CRITICAL, below `minor` is `minor_tier`, anything
    /// in between (bounds inclusive) is HIGH.
    #[must_use]
    pub fn classify(&self, delta: Decimal, minor_tier: Severity) -> Severity {
        let magnitude = delta.abs();
        if magnitude > self.critical {
            Severity::Critical
        } else if magnitude < self.minor {
            minor_tier
        } else {
            Severity::High
        }
    }
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            critical: Decimal::from(1_000_000),
            minor: Decimal::from(1_000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(1000000.01), Severity::Critical)]
    #[case(dec!(-2500000), Severity::Critical)]
    #[case(dec!(1000000), Severity::High)]
    #[case(dec!(1000), Severity::High)]
    #[case(dec!(-5000), Severity::High)]
    #[case(dec!(999.99), Severity::Low)]
    #[case(dec!(-0.01), Severity::Low)]
    fn test_classify_with_low_tier(#[case] delta: Decimal, #[case] expected: Severity) {
        let thresholds = SeverityThresholds::default();
        assert_eq!(thresholds.classify(delta, Severity::Low), expected);
    }

    #[test]
    fn test_classify_uses_requested_minor_tier() {
        let thresholds = SeverityThresholds::default();
        assert_eq!(thresholds.classify(dec!(12.50), Severity::Medium), Severity::Medium);
    }

    #[test]
    fn test_new_rejects_inverted_bounds() {
        assert!(matches!(
            SeverityThresholds::new(dec!(100), dec!(1000)),
            Err(ConsistencyError::InvalidThresholds { .. })
        ));
        assert!(SeverityThresholds::new(dec!(100), dec!(-1)).is_err());
        assert!(SeverityThresholds::new(dec!(1000), dec!(1000)).is_ok());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }
}
