use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, FieldError, Result};

/// A UTC instant.
///
/// `Timestamp` is `Copy`; arithmetic returns new values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn from_millis(millis: i64) -> Result<Self> {
        Utc.timestamp_millis_opt(millis)
            .single()
            .map(Self)
            .ok_or_else(|| {
                Error::validation(FieldError::OutOfRange {
                    field: "timestamp",
                    value: millis.to_string(),
                    constraint: "a representable instant".to_owned(),
                })
            })
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Saturates at the representable range instead of overflowing.
    #[must_use]
    pub fn add(self, duration: Duration) -> Self {
        Self(self.0.checked_add_signed(duration).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    #[must_use]
    pub fn subtract(self, duration: Duration) -> Self {
        Self(self.0.checked_sub_signed(duration).unwrap_or(DateTime::<Utc>::MIN_UTC))
    }

    pub fn is_before(&self, other: &Self) -> bool {
        self.0 < other.0
    }

    pub fn is_after(&self, other: &Self) -> bool {
        self.0 > other.0
    }

    /// Inclusive on both ends.
    pub fn is_between(&self, start: &Self, end: &Self) -> bool {
        start.0 <= self.0 && self.0 <= end.0
    }

    pub fn is_future(&self) -> bool {
        self.0 > Utc::now()
    }

    pub fn is_past(&self) -> bool {
        self.0 < Utc::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_returns_copies() {
        let start = Timestamp::now();
        let later = start.add(Duration::hours(1));

        assert!(later.is_after(&start));
        assert!(start.is_before(&later));
        assert_eq!(later.subtract(Duration::hours(1)), start);
    }

    #[test]
    fn test_between_is_inclusive() {
        let start = Timestamp::from_millis(1_000).unwrap();
        let end = Timestamp::from_millis(2_000).unwrap();

        assert!(start.is_between(&start, &end));
        assert!(end.is_between(&start, &end));
        assert!(Timestamp::from_millis(1_500).unwrap().is_between(&start, &end));
        assert!(!Timestamp::from_millis(2_001).unwrap().is_between(&start, &end));
    }

    #[test]
    fn test_future_and_past() {
        let now = Timestamp::now();
        assert!(now.add(Duration::days(1)).is_future());
        assert!(now.subtract(Duration::days(1)).is_past());
    }

    #[test]
    fn test_from_millis_out_of_range() {
        assert!(Timestamp::from_millis(i64::MAX).is_err());
        assert_eq!(Timestamp::from_millis(42).unwrap().as_millis(), 42);
    }

    #[test]
    fn test_add_saturates() {
        let far = Timestamp::now().add(Duration::MAX);
        assert_eq!(far.as_datetime(), DateTime::<Utc>::MAX_UTC);
    }
}
