//! `NumericDate` (RFC 7519 §2)
//!
//! Seconds since the epoch, integral or fractional. Fractional values keep
//! nanosecond precision: the sub-second part is rounded half-to-even to whole
//! nanoseconds, and a value that rounds up to a full second carries into the
//! seconds field.

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// Point in time carried by `exp`, `nbf` and `iat`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NumericDate {
    secs: i64,
    nanos: u32,
}

impl NumericDate {
    /// Whole seconds since the epoch
    #[must_use]
    pub const fn from_seconds(secs: i64) -> Self {
        Self { secs, nanos: 0 }
    }

    /// Fractional seconds since the epoch. `None` for non-finite values or
    /// values outside the `i64` seconds range.
    #[must_use]
    pub fn from_f64(value: f64) -> Option<Self> {
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;
        if !value.is_finite() || value < -LIMIT || value >= LIMIT {
            return None;
        }
        let whole = value.floor();
        let nanos = ((value - whole) * f64::from(NANOS_PER_SEC)).round_ties_even();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (secs, nanos) = (whole as i64, nanos as u32);
        if nanos >= NANOS_PER_SEC {
            return secs.checked_add(1).map(Self::from_seconds);
        }
        Some(Self { secs, nanos })
    }

    /// Date of a UTC timestamp
    #[must_use]
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self {
            secs: datetime.timestamp(),
            nanos: datetime.timestamp_subsec_nanos(),
        }
    }

    /// Whole seconds part (floor)
    #[must_use]
    pub const fn seconds(&self) -> i64 {
        self.secs
    }

    /// Sub-second part, always below one billion
    #[must_use]
    pub const fn subsec_nanos(&self) -> u32 {
        self.nanos
    }

    /// As a UTC timestamp; `None` outside chrono's range
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.secs, self.nanos)
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_f64(&self) -> f64 {
        self.secs as f64 + f64::from(self.nanos) / f64::from(NANOS_PER_SEC)
    }
}

impl From<DateTime<Utc>> for NumericDate {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::from_datetime(datetime)
    }
}

impl fmt::Display for NumericDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos == 0 {
            write!(f, "{}", self.secs)
        } else {
            write!(f, "{}.{:09}", self.secs, self.nanos)
        }
    }
}

impl Serialize for NumericDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.nanos == 0 {
            serializer.serialize_i64(self.secs)
        } else {
            serializer.serialize_f64(self.as_f64())
        }
    }
}

struct NumericDateVisitor;

impl Visitor<'_> for NumericDateVisitor {
    type Value = NumericDate;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("seconds since the epoch as a JSON number")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<NumericDate, E> {
        Ok(NumericDate::from_seconds(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<NumericDate, E> {
        i64::try_from(value)
            .map(NumericDate::from_seconds)
            .map_err(|_| E::custom("NumericDate out of range"))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<NumericDate, E> {
        NumericDate::from_f64(value).ok_or_else(|| E::custom("NumericDate out of range"))
    }
}

impl<'de> Deserialize<'de> for NumericDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NumericDateVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sub_second_part_rounds_half_to_even() {
        let cases = [
            (0.000_000_000_5, 0, 0),
            (0.000_000_001_5, 0, 2),
            (0.000_000_002_5, 0, 2),
            (0.000_000_003_5, 0, 4),
            (0.123_456_789_5, 0, 123_456_790),
        ];
        for (value, secs, nanos) in cases {
            let date = NumericDate::from_f64(value).unwrap();
            assert_eq!((date.seconds(), date.subsec_nanos()), (secs, nanos), "{value}");
        }
    }

    #[test]
    fn rounding_up_to_a_full_second_carries() {
        let date = NumericDate::from_f64(0.999_999_999_5).unwrap();
        assert_eq!(date, NumericDate::from_seconds(1));
        let date = NumericDate::from_f64(2.999_999_999_5).unwrap();
        assert_eq!(date, NumericDate::from_seconds(3));
    }

    #[test]
    fn negative_values_floor_the_seconds() {
        let date = NumericDate::from_f64(-1.5).unwrap();
        assert_eq!((date.seconds(), date.subsec_nanos()), (-2, 500_000_000));
    }

    #[test]
    fn non_finite_and_huge_values_are_rejected() {
        assert_eq!(NumericDate::from_f64(f64::NAN), None);
        assert_eq!(NumericDate::from_f64(f64::INFINITY), None);
        assert_eq!(NumericDate::from_f64(1e19), None);
    }

    #[test]
    fn serializes_integral_dates_as_integers() {
        assert_eq!(
            serde_json::to_string(&NumericDate::from_seconds(1_300_819_380)).unwrap(),
            "1300819380"
        );
        let date: NumericDate = serde_json::from_str("1300819380.5").unwrap();
        assert_eq!(date.subsec_nanos(), 500_000_000);
        assert_eq!(serde_json::to_string(&date).unwrap(), "1300819380.5");
        assert!(serde_json::from_str::<NumericDate>("\"1300819380\"").is_err());
        assert!(serde_json::from_str::<NumericDate>("18446744073709551615").is_err());
    }

    proptest! {
        #[test]
        fn nanos_always_below_one_second(value in -1.0e12f64..1.0e12) {
            let date = NumericDate::from_f64(value).unwrap();
            prop_assert!(date.subsec_nanos() < NANOS_PER_SEC);
        }

        #[test]
        fn integral_values_are_exact(secs in -1_000_000_000_000i64..1_000_000_000_000) {
            #[allow(clippy::cast_precision_loss)]
            let date = NumericDate::from_f64(secs as f64).unwrap();
            prop_assert_eq!(date, NumericDate::from_seconds(secs));
        }
    }
}
