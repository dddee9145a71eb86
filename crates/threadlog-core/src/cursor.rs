//! Pagination cursor.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::action::timestamp_from_millis;

/// Exclusive upper bound for "actions older than this point".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    /// Start from the most recent action
    #[default]
    Latest,
    /// Actions strictly older than this instant
    Before(DateTime<Utc>),
}

impl Cursor {
    /// Build a cursor from epoch milliseconds; `0` (or an out of range
    /// value) means [`Cursor::Latest`].
    pub fn from_millis(ms: i64) -> Self {
        if ms == 0 {
            return Cursor::Latest;
        }
        timestamp_from_millis(ms).map(Cursor::Before).unwrap_or_default()
    }

    /// The bound in epoch milliseconds, `None` for [`Cursor::Latest`].
    pub fn as_millis(&self) -> Option<i64> {
        match self {
            Cursor::Latest => None,
            Cursor::Before(ts) => Some(ts.timestamp_millis()),
        }
    }

    pub fn is_latest(&self) -> bool {
        matches!(self, Cursor::Latest)
    }

    /// Move the bound one millisecond older. `Latest` is unchanged.
    pub fn step_back(self) -> Self {
        match self {
            Cursor::Latest => Cursor::Latest,
            Cursor::Before(ts) => Cursor::Before(ts - Duration::milliseconds(1)),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_millis() {
            None => f.write_str("latest"),
            Some(ms) => write!(f, "before {}", ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_latest() {
        assert_eq!(Cursor::from_millis(0), Cursor::Latest);
        assert_eq!(Cursor::Latest.as_millis(), None);
    }

    #[test]
    fn test_millis_round_trip() {
        let cursor = Cursor::from_millis(1_500_000_000_123);
        assert_eq!(cursor.as_millis(), Some(1_500_000_000_123));
        assert_eq!(cursor.to_string(), "before 1500000000123");
    }

    #[test]
    fn test_step_back() {
        assert_eq!(Cursor::from_millis(10).step_back().as_millis(), Some(9));
        assert!(Cursor::Latest.step_back().is_latest());
    }
}
