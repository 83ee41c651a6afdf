use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A point in time, in milliseconds since the Unix epoch.
///
/// Serializes as the bare millisecond count so persisted documents stay
/// independent of the in-memory representation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(0);

    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * 1_000)
    }

    /// Rounds to the nearest millisecond.
    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs * 1_000.0).round() as i64)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        Self((nanos / 1_000_000) as i64)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// Signed number of seconds from `earlier` to `self`.
    pub fn seconds_since(self, earlier: Timestamp) -> f64 {
        (self.0 - earlier.0) as f64 / 1_000.0
    }

    /// Shift by a (possibly negative, possibly fractional) number of seconds.
    pub fn advanced_by_secs(self, secs: f64) -> Self {
        Self(self.0 + (secs * 1_000.0).round() as i64)
    }

    /// Position of `self` inside `range`: 0 at `start`, 1 at `end`.
    ///
    /// Values outside the range map outside `[0, 1]`. An empty range yields a
    /// non-finite position, which callers treat as a degenerate pair.
    pub fn fraction_position(self, range: &Range<Timestamp>) -> f64 {
        let span = (range.end.0 - range.start.0) as f64;
        (self.0 - range.start.0) as f64 / span
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match OffsetDateTime::from_unix_timestamp_nanos(self.0 as i128 * 1_000_000) {
            Ok(dt) => write!(
                f,
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
                dt.year(),
                dt.month() as u8,
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second(),
                dt.millisecond()
            ),
            Err(_) => write!(f, "{}ms", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_position_endpoints() {
        let range = Timestamp::from_secs(10)..Timestamp::from_secs(20);
        assert_eq!(Timestamp::from_secs(10).fraction_position(&range), 0.0);
        assert_eq!(Timestamp::from_secs(20).fraction_position(&range), 1.0);
        assert_eq!(Timestamp::from_secs(15).fraction_position(&range), 0.5);
        assert_eq!(Timestamp::from_secs(30).fraction_position(&range), 2.0);
    }

    #[test]
    fn seconds_arithmetic() {
        let t = Timestamp::from_millis(1_500);
        assert_eq!(t.advanced_by_secs(0.25), Timestamp::from_millis(1_750));
        assert_eq!(t.advanced_by_secs(-1.5), Timestamp::EPOCH);
        assert_eq!(Timestamp::from_secs(3).seconds_since(t), 1.5);
    }

    #[test]
    fn display_is_utc() {
        let t = Timestamp::from_millis(86_400_000 + 1_234);
        assert_eq!(t.to_string(), "1970-01-02T00:00:01.234Z");
    }
}
