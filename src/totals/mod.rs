//! Segmented workout totals.
//!
//! # Segments
//!
//! Time is cut into segments at every change of the [`TotalsKey`]. Each
//! segment accumulates a [`TotalsValue`] measured over its span. At most one
//! segment is open (still accumulating); closed segments are kept newest
//! first.
//!
//! # Contributions
//!
//! Every fold of `[previous event, event]` into the open segment is recorded
//! as a contribution. Late-arriving samples invalidate contributions:
//! [`Totals::reflect_dirty_after`] subtracts every contribution ending after
//! a date from its segment and queues it, and the next `reflect` or
//! `refresh_totals` measures the queued intervals again. Contributions older
//! than [`TotalsConfig::correction_horizon`] are forgotten.
//!
//! # Ordering
//!
//! Events must arrive in date order. An event dated before the last one is
//! applied at the last event's date.

mod config;
mod measurements;
mod metrics;
mod value;
mod worker;

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::core::Timestamp;
use crate::derive::{Intensity, MotionType, TotalsEvent};
use crate::storage::{load_json, save_json, Store};

pub use config::TotalsConfig;
pub use measurements::{measure, MeasurementSnapshot, Measurements, NoMeasurements, SeriesMeasurements};
pub use metrics::{vdot, TotalsSnapshot};
pub use value::{TotalsKey, TotalsValue};
pub use worker::TotalsWorker;

/// Store key of the persisted totals state.
pub const TOTALS_KEY: &str = "totals";

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Segment {
    id: u64,
    key: TotalsKey,
    start: Timestamp,
    end: Timestamp,
    value: TotalsValue,
}

impl Segment {
    fn snapshot(&self, is_open: bool) -> TotalsSnapshot {
        TotalsSnapshot {
            key: self.key,
            start: self.start,
            end: self.end,
            is_open,
            value: self.value,
        }
    }
}

/// One measured interval folded into a segment.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct Contribution {
    segment: u64,
    key: TotalsKey,
    from: Timestamp,
    to: Timestamp,
    value: TotalsValue,
}

/// Current value of every key axis.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Axes {
    reset_date: Option<Timestamp>,
    intensity: Intensity,
    motion: Option<MotionType>,
    is_active: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Totals {
    #[serde(skip)]
    config: TotalsConfig,
    axes: Axes,
    open: Option<Segment>,
    /// Newest first.
    closed: VecDeque<Segment>,
    last_date: Option<Timestamp>,
    /// Ordered by `to`, oldest first.
    contributions: VecDeque<Contribution>,
    /// Retracted, waiting to be measured again. Oldest first.
    pending: VecDeque<Contribution>,
    next_id: u64,
}

impl Totals {
    pub fn new(config: TotalsConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Restore the state saved under [`TOTALS_KEY`], or start empty.
    pub fn load(store: &dyn Store, config: TotalsConfig) -> Self {
        match load_json::<Totals>(store, TOTALS_KEY) {
            Some(mut totals) => {
                totals.config = config;
                log::debug!(
                    "restored totals with {} closed segments",
                    totals.closed.len()
                );
                totals
            }
            None => Self::new(config),
        }
    }

    /// Returns whether the state reached the store.
    pub fn save(&self, store: &dyn Store) -> bool {
        save_json(store, TOTALS_KEY, self)
    }

    pub fn config(&self) -> &TotalsConfig {
        &self.config
    }

    /// Date of the last reflected event.
    pub fn last_date(&self) -> Option<Timestamp> {
        self.last_date
    }

    pub fn current_key(&self) -> Option<TotalsKey> {
        self.open.as_ref().map(|s| s.key)
    }

    pub fn has_pending_corrections(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Fold the time since the last event into the open segment, then apply
    /// `event` and start a new segment if the key changed.
    pub fn reflect(&mut self, event: &TotalsEvent, m: &dyn Measurements) {
        self.rederive_pending(m);

        let mut date = event.date();
        if let Some(last) = self.last_date {
            if date < last {
                log::debug!("event at {date} arrived after {last}; applied at {last}");
                date = last;
            }
            self.accumulate(last, date, m);
        }
        self.last_date = Some(date);

        self.apply(event, date);
        let key = self.key_at(date);
        self.roll_segment(key, date);
        self.prune();
    }

    /// Retract every contribution that ends after `date`.
    ///
    /// The retracted intervals are measured again on the next `reflect` or
    /// `refresh_totals`, so samples inserted since they were first measured
    /// are taken into account.
    pub fn reflect_dirty_after(&mut self, date: Timestamp) {
        if let Some(horizon_start) = self.horizon_start() {
            if date < horizon_start {
                log::warn!(
                    "correction after {date} reaches past the correction horizon at {horizon_start}; \
                     earlier contributions are kept"
                );
            }
        }
        let mut retracted = 0usize;
        while self.contributions.back().map_or(false, |c| c.to > date) {
            let Some(contribution) = self.contributions.pop_back() else {
                break;
            };
            match self.segment_mut(contribution.segment) {
                Some(segment) => segment.value -= contribution.value,
                None => log::warn!("contribution for unknown segment {}", contribution.segment),
            }
            self.pending.push_front(contribution);
            retracted += 1;
        }
        if retracted > 0 {
            log::debug!("retracted {retracted} contributions after {date}");
        }
    }

    /// All segments, newest first. The open segment is extended to `up_to`
    /// without changing the stored state.
    pub fn refresh_totals(&mut self, up_to: Timestamp, m: &dyn Measurements) -> Vec<TotalsSnapshot> {
        self.rederive_pending(m);

        let mut snapshots = Vec::with_capacity(self.closed.len() + 1);
        if let Some(open) = &self.open {
            let mut snapshot = open.snapshot(true);
            if up_to > open.end {
                snapshot.value += measure(&open.key, open.end, up_to, m);
                snapshot.end = up_to;
            }
            snapshots.push(snapshot);
        }
        snapshots.extend(self.closed.iter().map(|s| s.snapshot(false)));
        snapshots
    }

    /// Segment values summed per key.
    pub fn totals_by_key(&mut self, up_to: Timestamp, m: &dyn Measurements) -> BTreeMap<TotalsKey, TotalsValue> {
        let mut sums = BTreeMap::new();
        for snapshot in self.refresh_totals(up_to, m) {
            *sums.entry(snapshot.key).or_default() += snapshot.value;
        }
        sums
    }

    /// Everything accumulated since the most recent reset.
    pub fn totals_since_reset(&mut self, up_to: Timestamp, m: &dyn Measurements) -> TotalsValue {
        let Some(reset_date) = self.axes.reset_date else {
            return TotalsValue::default();
        };
        self.refresh_totals(up_to, m)
            .into_iter()
            .filter(|s| s.key.reset_date == reset_date)
            .map(|s| s.value)
            .sum()
    }

    fn accumulate(&mut self, from: Timestamp, to: Timestamp, m: &dyn Measurements) {
        if to <= from {
            return;
        }
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let value = measure(&open.key, from, to, m);
        open.value += value;
        open.end = to;
        self.contributions.push_back(Contribution {
            segment: open.id,
            key: open.key,
            from,
            to,
            value,
        });
    }

    fn apply(&mut self, event: &TotalsEvent, date: Timestamp) {
        match event {
            TotalsEvent::Intensity(e) => self.axes.intensity = e.intensity,
            TotalsEvent::Motion(e) => {
                if self.config.track_motion {
                    self.axes.motion = Some(e.motion);
                }
            }
            TotalsEvent::Activity(e) => {
                if self.config.track_activity {
                    self.axes.is_active = Some(e.is_active);
                }
            }
            TotalsEvent::Reset(_) => self.axes.reset_date = Some(date),
        }
        if self.axes.reset_date.is_none() {
            self.axes.reset_date = Some(date);
        }
    }

    fn key_at(&self, date: Timestamp) -> TotalsKey {
        TotalsKey {
            reset_date: self.axes.reset_date.unwrap_or(date),
            intensity: self.axes.intensity,
            motion: self.axes.motion,
            is_active: self.axes.is_active,
        }
    }

    fn roll_segment(&mut self, key: TotalsKey, date: Timestamp) {
        match self.open.take() {
            Some(open) if open.key == key => self.open = Some(open),
            Some(mut open) => {
                open.end = date;
                if open.end > open.start {
                    self.closed.push_front(open);
                } else {
                    log::debug!("dropping zero-length segment at {date}");
                }
                self.open = Some(self.new_segment(key, date));
            }
            None => self.open = Some(self.new_segment(key, date)),
        }
    }

    fn new_segment(&mut self, key: TotalsKey, start: Timestamp) -> Segment {
        let id = self.next_id;
        self.next_id += 1;
        Segment {
            id,
            key,
            start,
            end: start,
            value: TotalsValue::default(),
        }
    }

    fn rederive_pending(&mut self, m: &dyn Measurements) {
        while let Some(mut contribution) = self.pending.pop_front() {
            contribution.value = measure(&contribution.key, contribution.from, contribution.to, m);
            match self.segment_mut(contribution.segment) {
                Some(segment) => segment.value += contribution.value,
                None => {
                    log::warn!("dropping correction for unknown segment {}", contribution.segment);
                    continue;
                }
            }
            self.contributions.push_back(contribution);
        }
    }

    fn segment_mut(&mut self, id: u64) -> Option<&mut Segment> {
        match &mut self.open {
            Some(open) if open.id == id => Some(open),
            _ => self.closed.iter_mut().find(|s| s.id == id),
        }
    }

    fn horizon_start(&self) -> Option<Timestamp> {
        let last = self.last_date?;
        Some(last.advanced_by_secs(-self.config.correction_horizon.as_secs_f64()))
    }

    fn prune(&mut self) {
        let Some(horizon_start) = self.horizon_start() else {
            return;
        };
        while self.contributions.front().map_or(false, |c| c.to < horizon_start) {
            self.contributions.pop_front();
        }
    }
}
