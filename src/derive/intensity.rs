//! Heart-rate intensity classification after Jack Daniels' training zones.
//!
//! Each [`Intensity`] owns a [`Band`] of heart rate expressed as a fraction of
//! the athlete's maximum. The default bands overlap (Marathon and Threshold)
//! and leave a gap (between Threshold and Interval), so classification is
//! stateful: it depends on the previous intensity and on whether heart rate
//! is rising or falling.
//!
//! Resolution order in [`IntensityBands::classify`]:
//!
//! 1. Stay in the previous band while it still contains the value.
//! 2. Otherwise, if exactly one band contains it, take that band.
//! 3. In an overlap, take the candidate closest in order to the previous
//!    intensity, or the lower one without a previous intensity.
//! 4. In a gap, keep the previous intensity if it flanks the gap, otherwise
//!    take the flanking band closest to it, or the lower flank without one.

use serde::{Deserialize, Serialize};

use crate::core::Timestamp;
use crate::derive::IntensityEvent;
use crate::element::Heartrate;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    #[default]
    Resting,
    Easy,
    Marathon,
    Threshold,
    Interval,
    Repetition,
}

impl Intensity {
    fn rank(self) -> i32 {
        self as i32
    }
}

/// Direction of travel of the classified value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
}

/// Heart-rate range of one intensity, as fractions of the maximum.
///
/// Membership is `[lo, hi)` while rising and `(lo, hi]` while falling, so a
/// value sitting exactly on an edge belongs to the band it came from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub intensity: Intensity,
    pub lo: f64,
    pub hi: f64,
}

impl Band {
    pub fn contains(&self, fraction: f64, direction: Direction) -> bool {
        match direction {
            Direction::Rising => self.lo <= fraction && fraction < self.hi,
            Direction::Falling => self.lo < fraction && fraction <= self.hi,
        }
    }
}

const DANIELS_BANDS: [Band; 6] = [
    Band { intensity: Intensity::Resting, lo: 0.0, hi: 0.65 },
    Band { intensity: Intensity::Easy, lo: 0.65, hi: 0.80 },
    Band { intensity: Intensity::Marathon, lo: 0.80, hi: 0.90 },
    Band { intensity: Intensity::Threshold, lo: 0.88, hi: 0.93 },
    Band { intensity: Intensity::Interval, lo: 0.98, hi: 1.0 },
    Band { intensity: Intensity::Repetition, lo: 1.0, hi: f64::INFINITY },
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntensityBands {
    bands: Vec<Band>,
}

impl Default for IntensityBands {
    fn default() -> Self {
        Self::new(DANIELS_BANDS.to_vec())
    }
}

impl IntensityBands {
    pub fn new(mut bands: Vec<Band>) -> Self {
        bands.sort_by_key(|b| b.intensity);
        Self { bands }
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    fn band(&self, intensity: Intensity) -> Option<&Band> {
        self.bands.iter().find(|b| b.intensity == intensity)
    }

    /// Finite band edges, ascending and deduplicated.
    pub fn edges(&self) -> Vec<f64> {
        let mut edges: Vec<f64> = self
            .bands
            .iter()
            .flat_map(|b| [b.lo, b.hi])
            .filter(|e| e.is_finite())
            .collect();
        edges.sort_by(f64::total_cmp);
        edges.dedup();
        edges
    }

    pub fn classify(&self, fraction: f64, previous: Option<Intensity>, direction: Direction) -> Intensity {
        if let Some(band) = previous.and_then(|p| self.band(p)) {
            if band.contains(fraction, direction) {
                return band.intensity;
            }
        }
        let candidates: Vec<Intensity> = self
            .bands
            .iter()
            .filter(|b| b.contains(fraction, direction))
            .map(|b| b.intensity)
            .collect();
        match candidates.as_slice() {
            [only] => *only,
            [] => self.resolve_gap(fraction, previous, direction),
            many => closest(many, previous),
        }
    }

    fn resolve_gap(&self, fraction: f64, previous: Option<Intensity>, direction: Direction) -> Intensity {
        let below = |b: &&Band| match direction {
            Direction::Rising => b.hi <= fraction,
            Direction::Falling => b.hi < fraction,
        };
        let above = |b: &&Band| match direction {
            Direction::Rising => b.lo > fraction,
            Direction::Falling => b.lo >= fraction,
        };
        let lower = self.bands.iter().filter(below).max_by(|a, b| a.hi.total_cmp(&b.hi));
        let upper = self.bands.iter().filter(above).min_by(|a, b| a.lo.total_cmp(&b.lo));
        let flanks: Vec<Intensity> = lower.into_iter().chain(upper).map(|b| b.intensity).collect();
        if let Some(previous) = previous {
            if flanks.contains(&previous) {
                return previous;
            }
        }
        if flanks.is_empty() {
            return previous.unwrap_or_default();
        }
        closest(&flanks, previous)
    }
}

/// Candidate nearest in order to `previous`; ties and no previous pick the
/// first (lowest) candidate.
fn closest(candidates: &[Intensity], previous: Option<Intensity>) -> Intensity {
    match previous {
        Some(previous) => candidates
            .iter()
            .copied()
            .min_by_key(|c| (c.rank() - previous.rank()).abs())
            .unwrap_or(previous),
        None => candidates.iter().copied().min().unwrap_or_default(),
    }
}

/// Turns a heart-rate stream into intensity change events.
#[derive(Clone, Debug)]
pub struct IntensityDeriver {
    hr_max: f64,
    bands: IntensityBands,
    last: Option<Heartrate>,
    current: Option<Intensity>,
}

impl IntensityDeriver {
    pub fn new(hr_max: f64) -> Self {
        Self::with_bands(hr_max, IntensityBands::default())
    }

    pub fn with_bands(hr_max: f64, bands: IntensityBands) -> Self {
        Self {
            hr_max,
            bands,
            last: None,
            current: None,
        }
    }

    pub fn hr_max(&self) -> f64 {
        self.hr_max
    }

    pub fn current(&self) -> Option<Intensity> {
        self.current
    }

    /// Feed the next sample; returns the intensity changes it implies.
    ///
    /// Each crossed band edge is dated at the linearly interpolated time the
    /// heart rate reached it. Samples not after the previous one produce
    /// nothing.
    pub fn observe(&mut self, sample: &Heartrate) -> Vec<IntensityEvent> {
        if !sample.bpm.is_finite() || !(self.hr_max > 0.0) {
            log::debug!("skipping heart rate {} at {} (hr_max {})", sample.bpm, sample.date, self.hr_max);
            return Vec::new();
        }
        let fraction = sample.bpm / self.hr_max;

        let last = match &self.last {
            Some(last) if sample.date <= last.date => {
                log::debug!("heart rate at {} is not after {}; ignored", sample.date, last.date);
                return Vec::new();
            }
            Some(last) => last.clone(),
            None => {
                let intensity = self.bands.classify(fraction, None, Direction::Rising);
                self.current = Some(intensity);
                self.last = Some(sample.clone());
                return vec![IntensityEvent {
                    date: sample.date,
                    intensity,
                }];
            }
        };

        let from = last.bpm / self.hr_max;
        let mut events = Vec::new();
        if fraction != from {
            let direction = if fraction > from {
                Direction::Rising
            } else {
                Direction::Falling
            };
            // A turn exactly on an edge changes membership at the turn itself.
            self.step(from, direction, last.date, &mut events);

            let mut crossed: Vec<f64> = self
                .bands
                .edges()
                .into_iter()
                .filter(|&e| match direction {
                    Direction::Rising => from < e && e <= fraction,
                    Direction::Falling => fraction <= e && e < from,
                })
                .collect();
            if direction == Direction::Falling {
                crossed.reverse();
            }
            let span = sample.date.seconds_since(last.date);
            for edge in crossed {
                let at = last.date.advanced_by_secs(span * (edge - from) / (fraction - from));
                self.step(edge, direction, at, &mut events);
            }
        }
        self.last = Some(sample.clone());
        events
    }

    fn step(&mut self, fraction: f64, direction: Direction, at: Timestamp, events: &mut Vec<IntensityEvent>) {
        let next = self.bands.classify(fraction, self.current, direction);
        if self.current != Some(next) {
            self.current = Some(next);
            events.push(IntensityEvent {
                date: at,
                intensity: next,
            });
        }
    }
}
