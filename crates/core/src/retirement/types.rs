//! Types for the retirement module.

use serde::Serialize;
use std::fmt;

/// When converted sources are deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RetirementPolicy {
    /// Sources are never deleted.
    Disabled,
    /// Sources are deleted as soon as they are converted.
    Immediate,
    /// Sources are deleted once their modification time is this many days old.
    OlderThan { days: u32 },
}

impl RetirementPolicy {
    /// Maps the configured day count to a policy.
    ///
    /// Returns `None` for values below `-1` and above `u32::MAX`.
    pub fn from_days(days: i64) -> Option<Self> {
        match days {
            -1 => Some(Self::Disabled),
            0 => Some(Self::Immediate),
            n if n > 0 => u32::try_from(n).ok().map(|days| Self::OlderThan { days }),
            _ => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl fmt::Display for RetirementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "never"),
            Self::Immediate => write!(f, "immediately"),
            Self::OlderThan { days } => write!(f, "after {days} days"),
        }
    }
}

/// What the policy did with one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RetirementDecision {
    /// Retirement is turned off; the file was not inspected.
    Disabled,
    /// The source was deleted.
    Deleted,
    /// The source is younger than the threshold and was kept.
    TooRecent { age_days: f64, threshold_days: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_days() {
        assert_eq!(RetirementPolicy::from_days(-1), Some(RetirementPolicy::Disabled));
        assert_eq!(RetirementPolicy::from_days(0), Some(RetirementPolicy::Immediate));
        assert_eq!(
            RetirementPolicy::from_days(30),
            Some(RetirementPolicy::OlderThan { days: 30 })
        );
        assert_eq!(RetirementPolicy::from_days(-2), None);
        assert_eq!(RetirementPolicy::from_days(i64::MAX), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(RetirementPolicy::Disabled.to_string(), "never");
        assert_eq!(RetirementPolicy::OlderThan { days: 5 }.to_string(), "after 5 days");
        assert!(!RetirementPolicy::Disabled.is_enabled());
        assert!(RetirementPolicy::Immediate.is_enabled());
    }
}
