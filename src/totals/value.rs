use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::core::Timestamp;
use crate::derive::{Intensity, MotionType};
use crate::storage::codec;

/// The axes a segment is keyed by. A change on any axis starts a new segment.
///
/// `motion` and `is_active` stay `None` while their axis is untracked or no
/// event for it has been seen yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TotalsKey {
    pub reset_date: Timestamp,
    pub intensity: Intensity,
    pub motion: Option<MotionType>,
    pub is_active: Option<bool>,
}

/// Accumulated measurements of one segment.
///
/// Values are signed: retracting a contribution subtracts it. Optional
/// fields are `None` only while neither side of every combination had them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalsValue {
    /// Seconds.
    #[serde(with = "codec::real")]
    pub duration: f64,
    #[serde(with = "codec::real")]
    pub distance_m: f64,
    /// Integral of heart rate over time, in beats per minute times seconds.
    #[serde(with = "codec::real")]
    pub heartrate_seconds: f64,
    pub number_of_steps: Option<i64>,
    #[serde(default, with = "codec::optional_real")]
    pub active_duration: Option<f64>,
    #[serde(default, with = "codec::optional_real")]
    pub energy_expended: Option<f64>,
}

fn combine<T: Copy + Default>(a: Option<T>, b: Option<T>, f: impl Fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(f(a.unwrap_or_default(), b.unwrap_or_default())),
    }
}

impl Add for TotalsValue {
    type Output = TotalsValue;

    fn add(self, rhs: TotalsValue) -> TotalsValue {
        TotalsValue {
            duration: self.duration + rhs.duration,
            distance_m: self.distance_m + rhs.distance_m,
            heartrate_seconds: self.heartrate_seconds + rhs.heartrate_seconds,
            number_of_steps: combine(self.number_of_steps, rhs.number_of_steps, |a, b| a + b),
            active_duration: combine(self.active_duration, rhs.active_duration, |a, b| a + b),
            energy_expended: combine(self.energy_expended, rhs.energy_expended, |a, b| a + b),
        }
    }
}

impl Neg for TotalsValue {
    type Output = TotalsValue;

    fn neg(self) -> TotalsValue {
        TotalsValue {
            duration: -self.duration,
            distance_m: -self.distance_m,
            heartrate_seconds: -self.heartrate_seconds,
            number_of_steps: self.number_of_steps.map(|v| -v),
            active_duration: self.active_duration.map(|v| -v),
            energy_expended: self.energy_expended.map(|v| -v),
        }
    }
}

impl Sub for TotalsValue {
    type Output = TotalsValue;

    fn sub(self, rhs: TotalsValue) -> TotalsValue {
        self + (-rhs)
    }
}

impl AddAssign for TotalsValue {
    fn add_assign(&mut self, rhs: TotalsValue) {
        *self = *self + rhs;
    }
}

impl SubAssign for TotalsValue {
    fn sub_assign(&mut self, rhs: TotalsValue) {
        *self = *self - rhs;
    }
}

impl std::iter::Sum for TotalsValue {
    fn sum<I: Iterator<Item = TotalsValue>>(iter: I) -> TotalsValue {
        iter.fold(TotalsValue::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_combine_when_either_side_has_them() {
        let a = TotalsValue {
            duration: 10.0,
            number_of_steps: Some(12),
            ..TotalsValue::default()
        };
        let b = TotalsValue {
            duration: 5.0,
            energy_expended: Some(2.5),
            ..TotalsValue::default()
        };
        let sum = a + b;
        assert_eq!(sum.duration, 15.0);
        assert_eq!(sum.number_of_steps, Some(12));
        assert_eq!(sum.energy_expended, Some(2.5));
        assert_eq!(sum.active_duration, None);
    }

    #[test]
    fn subtraction_undoes_addition() {
        let a = TotalsValue {
            duration: 10.0,
            distance_m: 40.0,
            heartrate_seconds: 1_200.0,
            number_of_steps: Some(30),
            active_duration: Some(10.0),
            energy_expended: None,
        };
        let b = TotalsValue {
            duration: 3.0,
            distance_m: 9.0,
            heartrate_seconds: 300.0,
            number_of_steps: Some(7),
            active_duration: Some(0.0),
            energy_expended: None,
        };
        assert_eq!((a + b) - b, a);
        let mut c = a;
        c += b;
        c -= b;
        assert_eq!(c, a);
    }

    #[test]
    fn non_finite_values_survive_serialization() {
        let value = TotalsValue {
            duration: f64::INFINITY,
            active_duration: Some(f64::NEG_INFINITY),
            energy_expended: Some(f64::NAN),
            ..TotalsValue::default()
        };
        let json = serde_json::to_string(&value).expect("encode");
        assert!(json.contains(r#""duration":"+inf""#));
        assert!(json.contains(r#""active_duration":"-inf""#));
        assert!(json.contains(r#""energy_expended":"nan""#));

        let decoded: TotalsValue = serde_json::from_str(&json).expect("decode");
        assert_eq!(decoded.duration, f64::INFINITY);
        assert_eq!(decoded.active_duration, Some(f64::NEG_INFINITY));
        assert!(decoded.energy_expended.map_or(false, f64::is_nan));
        assert_eq!(decoded.number_of_steps, None);
    }

    #[test]
    fn missing_optional_reals_decode_as_none() {
        let json = r#"{"duration":1.0,"distance_m":2.0,"heartrate_seconds":3.0,"number_of_steps":null}"#;
        let decoded: TotalsValue = serde_json::from_str(json).expect("decode");
        assert_eq!(decoded.active_duration, None);
        assert_eq!(decoded.energy_expended, None);
    }
}
