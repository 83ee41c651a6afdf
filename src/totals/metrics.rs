use serde::{Deserialize, Serialize};

use crate::core::Timestamp;
use crate::totals::{TotalsKey, TotalsValue};

/// Jack Daniels' oxygen cost of running: VO2 = C + B·v + A·v², v in m/min.
const DANIELS_A: f64 = 0.000_104;
const DANIELS_B: f64 = 0.182_258;
const DANIELS_C: f64 = -4.60;

/// Fraction of VO2max sustainable for t minutes:
/// 0.8 + P1·e^(-K1·t) + P2·e^(-K2·t).
const PERCENT_MAX_BASE: f64 = 0.8;
const PERCENT_MAX_P1: f64 = 0.189_439_3;
const PERCENT_MAX_K1: f64 = 0.012_778;
const PERCENT_MAX_P2: f64 = 0.298_955_8;
const PERCENT_MAX_K2: f64 = 0.193_260_5;

/// One segment as reported by [`Totals::refresh_totals`](crate::totals::Totals::refresh_totals).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TotalsSnapshot {
    pub key: TotalsKey,
    pub start: Timestamp,
    pub end: Timestamp,
    /// Still accumulating.
    pub is_open: bool,
    pub value: TotalsValue,
}

impl TotalsSnapshot {
    /// Mean heart rate over the segment, in beats per minute.
    pub fn average_heartrate(&self) -> Option<f64> {
        let TotalsValue {
            duration,
            heartrate_seconds,
            ..
        } = self.value;
        (duration > 0.0 && heartrate_seconds > 0.0).then(|| heartrate_seconds / duration)
    }

    pub fn pace_seconds_per_km(&self) -> Option<f64> {
        let TotalsValue {
            duration,
            distance_m,
            ..
        } = self.value;
        (duration > 0.0 && distance_m > 0.0).then(|| duration / (distance_m / 1_000.0))
    }

    /// Daniels VDOT for running the segment's distance in its duration.
    pub fn vdot(&self) -> Option<f64> {
        vdot(self.value.distance_m, self.value.duration)
    }
}

/// VDOT for covering `distance_m` in `seconds`, or `None` when either is
/// non-positive or the pace is too slow to register.
pub fn vdot(distance_m: f64, seconds: f64) -> Option<f64> {
    if !(distance_m > 0.0 && seconds > 0.0) {
        return None;
    }
    let minutes = seconds / 60.0;
    let velocity = distance_m / minutes;
    let vo2 = (DANIELS_A * velocity).mul_add(velocity, DANIELS_B.mul_add(velocity, DANIELS_C));
    if vo2 <= 0.0 {
        return None;
    }
    let percent_max = PERCENT_MAX_BASE
        + PERCENT_MAX_P1 * (-PERCENT_MAX_K1 * minutes).exp()
        + PERCENT_MAX_P2 * (-PERCENT_MAX_K2 * minutes).exp();
    Some(vo2 / percent_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::Intensity;

    fn snapshot(duration: f64, distance_m: f64, heartrate_seconds: f64) -> TotalsSnapshot {
        TotalsSnapshot {
            key: TotalsKey {
                reset_date: Timestamp::EPOCH,
                intensity: Intensity::Threshold,
                motion: None,
                is_active: None,
            },
            start: Timestamp::EPOCH,
            end: Timestamp::from_secs_f64(duration),
            is_open: false,
            value: TotalsValue {
                duration,
                distance_m,
                heartrate_seconds,
                ..TotalsValue::default()
            },
        }
    }

    #[test]
    fn five_k_in_twenty_minutes() {
        let vdot = snapshot(1_200.0, 5_000.0, 0.0).vdot().expect("vdot");
        assert!((49.5..50.2).contains(&vdot), "vdot {vdot}");
    }

    #[test]
    fn derived_rates() {
        let s = snapshot(600.0, 2_000.0, 600.0 * 150.0);
        assert_eq!(s.average_heartrate(), Some(150.0));
        assert_eq!(s.pace_seconds_per_km(), Some(300.0));
    }

    #[test]
    fn empty_segment_has_no_rates() {
        let s = snapshot(0.0, 0.0, 0.0);
        assert_eq!(s.average_heartrate(), None);
        assert_eq!(s.pace_seconds_per_km(), None);
        assert_eq!(s.vdot(), None);
        assert_eq!(vdot(10.0, 3_600.0), None);
    }
}
