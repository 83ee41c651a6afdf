//! Dated elements and the capability set a time series needs from them.
//!
//! A [`TimeSeries`](crate::series::TimeSeries) never looks inside its
//! elements. It only asks for their date and for the arithmetic below:
//! the difference between two elements ([`TimeSeriesElement::distance_to`]),
//! applying such a difference ([`TimeSeriesElement::advanced_by`]) and moving
//! an element in time without changing its measurements
//! ([`TimeSeriesElement::extrapolate`]). Interpolation is derived from those.
//!
//! Most concrete kinds wrap a [`VectorElement`]; [`Heartrate`] shows a direct
//! implementation.

mod samples;
mod vector;

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::Timestamp;

pub use samples::{
    DistanceSample, Heartrate, IntensitySample, MotionSample, Pedometer, ResetMarker, ScalarDelta,
};
pub use vector::{map2, VectorElement, VectorElementDelta, VectorSchema};

/// The difference between two elements of one kind.
pub trait Delta: Clone + Debug {
    /// Seconds between the two elements the delta was taken from.
    fn duration(&self) -> f64;

    /// Multiply every component, including the duration, by `factor`.
    fn scaled(&self, factor: f64) -> Self;
}

/// Whether interpolation may leave the span of its two input elements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Clamping {
    /// Dates outside the pair yield the nearest endpoint's value.
    #[default]
    Clamped,
    /// Dates outside the pair continue the pair's linear trend.
    Unclamped,
}

pub trait TimeSeriesElement: Clone + Debug + Serialize + DeserializeOwned + Send + 'static {
    type Delta: Delta;

    /// Persistence key of a series holding this kind.
    const KIND: &'static str;

    fn date(&self) -> Timestamp;

    /// Component-wise `other - self`.
    fn distance_to(&self, other: &Self) -> Self::Delta;

    /// Component-wise `self + delta`, dated `self.date() + delta.duration()`.
    fn advanced_by(&self, delta: &Self::Delta) -> Self;

    /// Same measurements, new date.
    fn extrapolate(&self, at: Timestamp) -> Self;

    /// Rate of change per second towards `other`.
    ///
    /// A zero duration divides by zero on purpose: same-date pairs yield
    /// non-finite rates.
    fn gradient_to(&self, other: &Self) -> Self::Delta {
        let distance = self.distance_to(other);
        let duration = distance.duration();
        distance.scaled(1.0 / duration)
    }

    fn interpolate(&self, at: Timestamp, towards: &Self) -> Self {
        self.interpolate_with(at, towards, Clamping::Clamped)
    }

    /// Linear blend of `self` and `towards` at `at`.
    ///
    /// Below `p = 1` the result is built from `self`, otherwise from
    /// `towards`, so both endpoints come out exactly equal to their element.
    fn interpolate_with(&self, at: Timestamp, towards: &Self, clamping: Clamping) -> Self {
        let mut p = at.fraction_position(&(self.date()..towards.date()));
        if clamping == Clamping::Clamped {
            p = p.clamp(0.0, 1.0);
        }
        let blended = if p < 1.0 {
            self.advanced_by(&self.distance_to(towards).scaled(p))
        } else {
            towards.advanced_by(&towards.distance_to(self).scaled(1.0 - p))
        };
        if clamping == Clamping::Clamped && blended.date() != at {
            blended.extrapolate(at)
        } else {
            blended
        }
    }

    /// Upgrade an element decoded from an older, shorter schema.
    ///
    /// Returns `true` when the element changed.
    fn migrate(&mut self) -> bool {
        false
    }
}
