//! Concrete element kinds fed by the sensor integration layer.

use serde::{Deserialize, Serialize};

use crate::core::Timestamp;
use crate::derive::{Intensity, IntensityEvent, MotionEvent, MotionType};
use crate::element::{
    Delta, TimeSeriesElement, VectorElement, VectorElementDelta, VectorSchema,
};
use crate::storage::codec;

/// Difference of two single-valued elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarDelta {
    pub duration: f64,
    pub value: f64,
}

impl Delta for ScalarDelta {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            duration: self.duration * factor,
            value: self.value * factor,
        }
    }
}

/// Heart rate in beats per minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartrate {
    pub date: Timestamp,
    #[serde(with = "codec::real")]
    pub bpm: f64,
}

impl Heartrate {
    pub fn new(date: Timestamp, bpm: f64) -> Self {
        Self { date, bpm }
    }
}

impl TimeSeriesElement for Heartrate {
    type Delta = ScalarDelta;

    const KIND: &'static str = "heartrate";

    fn date(&self) -> Timestamp {
        self.date
    }

    fn distance_to(&self, other: &Self) -> ScalarDelta {
        ScalarDelta {
            duration: other.date.seconds_since(self.date),
            value: other.bpm - self.bpm,
        }
    }

    fn advanced_by(&self, delta: &ScalarDelta) -> Self {
        Self {
            date: self.date.advanced_by_secs(delta.duration),
            bpm: self.bpm + delta.value,
        }
    }

    fn extrapolate(&self, at: Timestamp) -> Self {
        Self {
            date: at,
            bpm: self.bpm,
        }
    }
}

/// Cumulative pedometer counters since the start of a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pedometer(pub VectorElement<()>);

impl Pedometer {
    /// `floors_ascended` arrived after the first release; stored samples
    /// without it load as unknown.
    pub const SCHEMA: VectorSchema = VectorSchema {
        doubles: &[0.0],
        ints: &[0],
        optional_doubles: &[None, None],
        optional_ints: &[None],
    };

    pub fn new(date: Timestamp, distance_m: f64, number_of_steps: i64) -> Self {
        let mut inner = VectorElement::with_schema(date, &Self::SCHEMA, ());
        inner.doubles[0] = distance_m;
        inner.ints[0] = number_of_steps;
        Self(inner)
    }

    pub fn with_pace(mut self, average_active_pace: f64, current_cadence: f64) -> Self {
        self.0.optional_doubles = vec![Some(average_active_pace), Some(current_cadence)];
        self
    }

    pub fn with_floors(mut self, floors_ascended: i64) -> Self {
        self.0.optional_ints = vec![Some(floors_ascended)];
        self
    }

    pub fn distance_m(&self) -> f64 {
        self.0.doubles[0]
    }

    pub fn number_of_steps(&self) -> i64 {
        self.0.ints[0]
    }

    /// Seconds per metre.
    pub fn average_active_pace(&self) -> Option<f64> {
        self.0.optional_doubles[0]
    }

    /// Steps per second.
    pub fn current_cadence(&self) -> Option<f64> {
        self.0.optional_doubles[1]
    }

    pub fn floors_ascended(&self) -> Option<i64> {
        self.0.optional_ints[0]
    }
}

impl TimeSeriesElement for Pedometer {
    type Delta = VectorElementDelta;

    const KIND: &'static str = "pedometer";

    fn date(&self) -> Timestamp {
        self.0.date
    }

    fn distance_to(&self, other: &Self) -> VectorElementDelta {
        self.0.distance_to(&other.0)
    }

    fn advanced_by(&self, delta: &VectorElementDelta) -> Self {
        Self(self.0.advanced_by(delta))
    }

    fn extrapolate(&self, at: Timestamp) -> Self {
        Self(self.0.extrapolate(at))
    }

    fn migrate(&mut self) -> bool {
        self.0.migrate(&Self::SCHEMA)
    }
}

/// Cumulative distance derived from location fixes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistanceSample(pub VectorElement<()>);

impl DistanceSample {
    pub const SCHEMA: VectorSchema = VectorSchema {
        doubles: &[0.0],
        ints: &[],
        optional_doubles: &[None, None],
        optional_ints: &[],
    };

    pub fn new(date: Timestamp, distance_m: f64) -> Self {
        let mut inner = VectorElement::with_schema(date, &Self::SCHEMA, ());
        inner.doubles[0] = distance_m;
        Self(inner)
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.0.optional_doubles[0] = Some(speed_mps);
        self
    }

    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.0.optional_doubles[1] = Some(altitude_m);
        self
    }

    pub fn distance_m(&self) -> f64 {
        self.0.doubles[0]
    }

    pub fn speed_mps(&self) -> Option<f64> {
        self.0.optional_doubles[0]
    }

    pub fn altitude_m(&self) -> Option<f64> {
        self.0.optional_doubles[1]
    }
}

impl TimeSeriesElement for DistanceSample {
    type Delta = VectorElementDelta;

    const KIND: &'static str = "distance";

    fn date(&self) -> Timestamp {
        self.0.date
    }

    fn distance_to(&self, other: &Self) -> VectorElementDelta {
        self.0.distance_to(&other.0)
    }

    fn advanced_by(&self, delta: &VectorElementDelta) -> Self {
        Self(self.0.advanced_by(delta))
    }

    fn extrapolate(&self, at: Timestamp) -> Self {
        Self(self.0.extrapolate(at))
    }

    fn migrate(&mut self) -> bool {
        self.0.migrate(&Self::SCHEMA)
    }
}

/// Workout intensity in effect from `date` on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntensitySample(pub VectorElement<Intensity>);

impl IntensitySample {
    pub fn new(date: Timestamp, intensity: Intensity) -> Self {
        Self(VectorElement::with_schema(date, &VectorSchema::EMPTY, intensity))
    }

    pub fn intensity(&self) -> Intensity {
        self.0.categorical
    }
}

impl From<IntensityEvent> for IntensitySample {
    fn from(event: IntensityEvent) -> Self {
        Self::new(event.date, event.intensity)
    }
}

impl TimeSeriesElement for IntensitySample {
    type Delta = VectorElementDelta;

    const KIND: &'static str = "intensity";

    fn date(&self) -> Timestamp {
        self.0.date
    }

    fn distance_to(&self, other: &Self) -> VectorElementDelta {
        self.0.distance_to(&other.0)
    }

    fn advanced_by(&self, delta: &VectorElementDelta) -> Self {
        Self(self.0.advanced_by(delta))
    }

    fn extrapolate(&self, at: Timestamp) -> Self {
        Self(self.0.extrapolate(at))
    }

    fn migrate(&mut self) -> bool {
        self.0.migrate(&VectorSchema::EMPTY)
    }
}

/// Classified motion with an optional classifier confidence (0..=100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotionSample(pub VectorElement<MotionType>);

impl MotionSample {
    pub const SCHEMA: VectorSchema = VectorSchema {
        doubles: &[],
        ints: &[],
        optional_doubles: &[],
        optional_ints: &[None],
    };

    pub fn new(date: Timestamp, motion: MotionType, confidence: Option<i64>) -> Self {
        let mut inner = VectorElement::with_schema(date, &Self::SCHEMA, motion);
        inner.optional_ints[0] = confidence;
        Self(inner)
    }

    pub fn motion(&self) -> MotionType {
        self.0.categorical
    }

    pub fn confidence(&self) -> Option<i64> {
        self.0.optional_ints[0]
    }
}

impl From<MotionEvent> for MotionSample {
    fn from(event: MotionEvent) -> Self {
        Self::new(event.date, event.motion, None)
    }
}

impl TimeSeriesElement for MotionSample {
    type Delta = VectorElementDelta;

    const KIND: &'static str = "motion";

    fn date(&self) -> Timestamp {
        self.0.date
    }

    fn distance_to(&self, other: &Self) -> VectorElementDelta {
        self.0.distance_to(&other.0)
    }

    fn advanced_by(&self, delta: &VectorElementDelta) -> Self {
        Self(self.0.advanced_by(delta))
    }

    fn extrapolate(&self, at: Timestamp) -> Self {
        Self(self.0.extrapolate(at))
    }

    fn migrate(&mut self) -> bool {
        self.0.migrate(&Self::SCHEMA)
    }
}

/// A user-requested reset of the running totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResetMarker(pub VectorElement<()>);

impl ResetMarker {
    pub fn new(date: Timestamp) -> Self {
        Self(VectorElement::with_schema(date, &VectorSchema::EMPTY, ()))
    }
}

impl TimeSeriesElement for ResetMarker {
    type Delta = VectorElementDelta;

    const KIND: &'static str = "reset";

    fn date(&self) -> Timestamp {
        self.0.date
    }

    fn distance_to(&self, other: &Self) -> VectorElementDelta {
        self.0.distance_to(&other.0)
    }

    fn advanced_by(&self, delta: &VectorElementDelta) -> Self {
        Self(self.0.advanced_by(delta))
    }

    fn extrapolate(&self, at: Timestamp) -> Self {
        Self(self.0.extrapolate(at))
    }

    fn migrate(&mut self) -> bool {
        self.0.migrate(&VectorSchema::EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Clamping;

    #[test]
    fn interpolation_is_exact_at_endpoints() {
        let a = Heartrate::new(Timestamp::from_millis(1_000), 0.1);
        let b = Heartrate::new(Timestamp::from_millis(4_000), 0.7);
        assert_eq!(a.interpolate(a.date, &b), a);
        assert_eq!(a.interpolate(b.date, &b), b);
    }

    #[test]
    fn interpolation_blends_linearly() {
        let a = Pedometer::new(Timestamp::from_secs(0), 0.0, 0);
        let b = Pedometer::new(Timestamp::from_secs(10), 15.0, 21);
        let mid = a.interpolate(Timestamp::from_secs(5), &b);
        assert_eq!(mid.date(), Timestamp::from_secs(5));
        assert_eq!(mid.distance_m(), 7.5);
        assert_eq!(mid.number_of_steps(), 11);
        assert_eq!(mid.floors_ascended(), None);
    }

    #[test]
    fn clamped_interpolation_holds_endpoint_values() {
        let a = Heartrate::new(Timestamp::from_secs(0), 100.0);
        let b = Heartrate::new(Timestamp::from_secs(10), 120.0);
        let after = a.interpolate(Timestamp::from_secs(20), &b);
        assert_eq!(after, Heartrate::new(Timestamp::from_secs(20), 120.0));
        let before = a.interpolate(Timestamp::from_secs(-5), &b);
        assert_eq!(before, Heartrate::new(Timestamp::from_secs(-5), 100.0));
    }

    #[test]
    fn unclamped_interpolation_continues_trend() {
        let a = Heartrate::new(Timestamp::from_secs(0), 100.0);
        let b = Heartrate::new(Timestamp::from_secs(10), 120.0);
        let after = a.interpolate_with(Timestamp::from_secs(20), &b, Clamping::Unclamped);
        assert_eq!(after.date, Timestamp::from_secs(20));
        assert!((after.bpm - 140.0).abs() < 1e-9);
        let before = a.interpolate_with(Timestamp::from_secs(-5), &b, Clamping::Unclamped);
        assert_eq!(before.date, Timestamp::from_secs(-5));
        assert!((before.bpm - 90.0).abs() < 1e-9);
    }

    #[test]
    fn gradient_of_same_date_pair_is_infinite() {
        let a = Heartrate::new(Timestamp::from_secs(3), 100.0);
        let b = Heartrate::new(Timestamp::from_secs(3), 110.0);
        let rate = a.gradient_to(&b);
        assert!(rate.value.is_infinite() && rate.value.is_sign_positive());
        let falling = b.gradient_to(&a);
        assert!(falling.value.is_infinite() && falling.value.is_sign_negative());
    }

    #[test]
    fn gradient_is_per_second() {
        let a = DistanceSample::new(Timestamp::from_secs(0), 10.0);
        let b = DistanceSample::new(Timestamp::from_secs(4), 30.0);
        let rate = a.gradient_to(&b);
        assert_eq!(rate.duration, 1.0);
        assert_eq!(rate.doubles, vec![5.0]);
    }

    #[test]
    fn categorical_comes_from_earlier_element() {
        let a = IntensitySample::new(Timestamp::from_secs(0), Intensity::Easy);
        let b = IntensitySample::new(Timestamp::from_secs(10), Intensity::Threshold);
        assert_eq!(a.interpolate(Timestamp::from_secs(9), &b).intensity(), Intensity::Easy);
        assert_eq!(
            a.interpolate(Timestamp::from_secs(10), &b).intensity(),
            Intensity::Threshold
        );
    }

    #[test]
    fn pedometer_migrates_missing_floors() {
        let json = r#"{"date":0,"doubles":[12.5],"ints":[20],"optional_doubles":[null,null],"categorical":null}"#;
        let mut sample: Pedometer = serde_json::from_str(json).expect("decode");
        assert!(sample.migrate());
        assert_eq!(sample.floors_ascended(), None);
        assert_eq!(sample.number_of_steps(), 20);
    }

    #[test]
    fn reset_marker_drops_surplus_components() {
        let json = r#"{"date":5000,"doubles":[1.0],"ints":[2],"optional_doubles":[null],"optional_ints":[3],"categorical":null}"#;
        let mut marker: ResetMarker = serde_json::from_str(json).expect("decode");
        assert!(marker.migrate());
        assert_eq!(marker, ResetMarker::new(Timestamp::from_secs(5)));
        assert!(!marker.migrate());
    }
}
