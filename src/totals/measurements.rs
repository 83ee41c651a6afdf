//! Sources of the quantities accumulated into totals.

use crate::core::Timestamp;
use crate::element::{Clamping, DistanceSample, Heartrate, Pedometer, TimeSeriesElement};
use crate::series::value_in;
use crate::totals::{TotalsKey, TotalsValue};

/// Quantities accumulated between two dates.
///
/// Every method is asked about a closed interval `[from, to]` with
/// `from <= to`. Sources without data for a quantity keep the default.
pub trait Measurements {
    fn distance_between(&self, _from: Timestamp, _to: Timestamp) -> f64 {
        0.0
    }

    fn heartrate_seconds_between(&self, _from: Timestamp, _to: Timestamp) -> f64 {
        0.0
    }

    fn steps_between(&self, _from: Timestamp, _to: Timestamp) -> Option<i64> {
        None
    }

    fn energy_between(&self, _from: Timestamp, _to: Timestamp) -> Option<f64> {
        None
    }
}

/// Measures nothing; totals then only track durations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMeasurements;

impl Measurements for NoMeasurements {}

/// Measure `[from, to]` for a segment keyed `key`.
pub fn measure(key: &TotalsKey, from: Timestamp, to: Timestamp, m: &dyn Measurements) -> TotalsValue {
    let duration = to.seconds_since(from);
    TotalsValue {
        duration,
        distance_m: m.distance_between(from, to),
        heartrate_seconds: m.heartrate_seconds_between(from, to),
        number_of_steps: m.steps_between(from, to),
        active_duration: key
            .is_active
            .map(|active| if active { duration } else { 0.0 }),
        energy_expended: m.energy_between(from, to),
    }
}

/// Measurements read from stored samples.
///
/// Cumulative counters are differenced at interpolated boundary values and
/// held constant outside their recorded span. Location distance is preferred
/// over pedometer distance when both are present.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesMeasurements<'a> {
    pub distance: &'a [DistanceSample],
    pub heartrate: &'a [Heartrate],
    pub pedometer: &'a [Pedometer],
}

impl<'a> SeriesMeasurements<'a> {
    pub fn with_distance(mut self, distance: &'a [DistanceSample]) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_heartrate(mut self, heartrate: &'a [Heartrate]) -> Self {
        self.heartrate = heartrate;
        self
    }

    pub fn with_pedometer(mut self, pedometer: &'a [Pedometer]) -> Self {
        self.pedometer = pedometer;
        self
    }
}

fn counter_delta<E: TimeSeriesElement, T>(
    elements: &[E],
    from: Timestamp,
    to: Timestamp,
    read: impl Fn(&E) -> T,
) -> Option<(T, T)> {
    let start = value_in(elements, from, Clamping::Clamped)?;
    let end = value_in(elements, to, Clamping::Clamped)?;
    Some((read(&start), read(&end)))
}

impl Measurements for SeriesMeasurements<'_> {
    fn distance_between(&self, from: Timestamp, to: Timestamp) -> f64 {
        let gps = counter_delta(self.distance, from, to, DistanceSample::distance_m);
        let delta = match gps {
            Some(delta) => Some(delta),
            None => counter_delta(self.pedometer, from, to, Pedometer::distance_m),
        };
        delta.map_or(0.0, |(start, end)| end - start)
    }

    /// Trapezoid integral over interpolated boundaries and every sample in
    /// between.
    fn heartrate_seconds_between(&self, from: Timestamp, to: Timestamp) -> f64 {
        if to <= from {
            return 0.0;
        }
        let (Some(start), Some(end)) = (
            value_in(self.heartrate, from, Clamping::Clamped),
            value_in(self.heartrate, to, Clamping::Clamped),
        ) else {
            return 0.0;
        };
        let lo = self.heartrate.partition_point(|e| e.date <= from);
        let hi = self.heartrate.partition_point(|e| e.date < to);
        let inner = &self.heartrate[lo..hi.max(lo)];

        let mut area = 0.0;
        let mut previous = &start;
        for sample in inner.iter().chain(std::iter::once(&end)) {
            let dt = sample.date.seconds_since(previous.date);
            area += 0.5 * (previous.bpm + sample.bpm) * dt;
            previous = sample;
        }
        area
    }

    fn steps_between(&self, from: Timestamp, to: Timestamp) -> Option<i64> {
        counter_delta(self.pedometer, from, to, Pedometer::number_of_steps)
            .map(|(start, end)| end - start)
    }
}

/// Owned copies of the samples a [`SeriesMeasurements`] borrows, for
/// handing to another serial context.
#[derive(Debug, Clone, Default)]
pub struct MeasurementSnapshot {
    pub distance: Vec<DistanceSample>,
    pub heartrate: Vec<Heartrate>,
    pub pedometer: Vec<Pedometer>,
}

impl MeasurementSnapshot {
    pub fn measurements(&self) -> SeriesMeasurements<'_> {
        SeriesMeasurements {
            distance: &self.distance,
            heartrate: &self.heartrate,
            pedometer: &self.pedometer,
        }
    }
}

impl Measurements for MeasurementSnapshot {
    fn distance_between(&self, from: Timestamp, to: Timestamp) -> f64 {
        self.measurements().distance_between(from, to)
    }

    fn heartrate_seconds_between(&self, from: Timestamp, to: Timestamp) -> f64 {
        self.measurements().heartrate_seconds_between(from, to)
    }

    fn steps_between(&self, from: Timestamp, to: Timestamp) -> Option<i64> {
        self.measurements().steps_between(from, to)
    }
}
