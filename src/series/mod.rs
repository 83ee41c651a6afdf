//! Date-ordered series with interpolating point queries.
//!
//! # Ordering
//!
//! Elements are kept strictly increasing by date. Inserting at a date that
//! already holds an element replaces it in place.
//!
//! # Queries
//!
//! - [`TimeSeries::value_at`]: exact hit, interpolation between the two
//!   bracketing elements, or extrapolation from the nearest end.
//! - [`TimeSeries::range`]: the stored elements inside a half-open range; no
//!   synthetic boundary elements.
//!
//! # Persistence
//!
//! Mutations only mark the series dirty. The document is written when the
//! series moves to background, or by [`TimeSeries::tick`] once it has been
//! dirty in background for [`SeriesConfig::idle_flush_interval`].
//! [`TimeSeries::archive`] moves old elements to a separate snapshot document.

mod archive;
mod config;

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::Timestamp;
use crate::element::{Clamping, TimeSeriesElement};
use crate::serial::Tick;
use crate::storage::{load_json, save_json, Store};

pub use archive::{cut_index, is_snapshot_of};
pub use config::SeriesConfig;

#[derive(Serialize)]
struct DocumentRef<'a, E, M> {
    elements: &'a [E],
    meta: Option<&'a M>,
}

#[derive(Deserialize)]
#[serde(bound = "E: DeserializeOwned, M: DeserializeOwned")]
struct Document<E, M> {
    #[serde(default = "Vec::new")]
    elements: Vec<E>,
    #[serde(default = "Option::default")]
    meta: Option<M>,
}

/// Indices of the elements around a query date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    pub before: Option<usize>,
    pub at: Option<usize>,
    pub after: Option<usize>,
}

pub struct TimeSeries<E, M = ()> {
    key: String,
    store: Arc<dyn Store>,
    config: SeriesConfig,
    elements: Vec<E>,
    meta: Option<M>,
    dirty: bool,
    dirty_since: Option<Instant>,
    in_background: bool,
}

impl<E, M> TimeSeries<E, M>
where
    E: TimeSeriesElement,
    M: Serialize + DeserializeOwned + Send + 'static,
{
    /// Open the series stored under `E::KIND`.
    pub fn open(store: Arc<dyn Store>, config: SeriesConfig) -> Self {
        Self::open_with_key(store, E::KIND, config)
    }

    /// Open the series stored under `key`, starting empty if nothing usable
    /// is stored there.
    pub fn open_with_key(store: Arc<dyn Store>, key: impl Into<String>, config: SeriesConfig) -> Self {
        let key = key.into();
        let mut series = Self {
            key,
            store,
            config,
            elements: Vec::new(),
            meta: None,
            dirty: false,
            dirty_since: None,
            in_background: false,
        };
        if let Some(document) = load_json::<Document<E, M>>(series.store.as_ref(), &series.key) {
            let (elements, repaired) = prepare_loaded(&series.key, document.elements);
            series.elements = elements;
            series.meta = document.meta;
            if repaired {
                series.mark_dirty();
            }
            log::debug!(
                "loaded {} elements for `{}`",
                series.elements.len(),
                series.key
            );
        }
        series
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn config(&self) -> &SeriesConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[E] {
        &self.elements
    }

    pub fn first(&self) -> Option<&E> {
        self.elements.first()
    }

    pub fn last(&self) -> Option<&E> {
        self.elements.last()
    }

    pub fn meta(&self) -> Option<&M> {
        self.meta.as_ref()
    }

    pub fn set_meta(&mut self, meta: M) {
        self.meta = Some(meta);
        self.mark_dirty();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_in_background(&self) -> bool {
        self.in_background
    }

    /// Insert `element`, replacing any element at the same date.
    pub fn insert(&mut self, element: E) {
        let date = element.date();
        match self.elements.binary_search_by(|e| e.date().cmp(&date)) {
            Ok(index) => self.elements[index] = element,
            Err(index) => self.elements.insert(index, element),
        }
        self.mark_dirty();
    }

    pub fn extend(&mut self, elements: impl IntoIterator<Item = E>) {
        for element in elements {
            self.insert(element);
        }
    }

    pub fn bracket(&self, at: Timestamp) -> Bracket {
        bracket(&self.elements, at)
    }

    /// Value at `at`, interpolated or held constant past either end.
    ///
    /// # Panics
    ///
    /// Panics if the series is empty. Producers must supply a sample before
    /// anyone queries the series.
    pub fn value_at(&self, at: Timestamp) -> E {
        self.value_at_with(at, Clamping::Clamped)
    }

    /// Like [`value_at`](Self::value_at); `Clamping::Unclamped` extends the
    /// linear trend of the two outermost elements past either end instead of
    /// holding the end value.
    ///
    /// # Panics
    ///
    /// Panics if the series is empty.
    pub fn value_at_with(&self, at: Timestamp, clamping: Clamping) -> E {
        assert!(
            !self.elements.is_empty(),
            "point query at {at} on empty series `{}`",
            self.key
        );
        match value_in(&self.elements, at, clamping) {
            Some(value) => value,
            None => unreachable!("non-empty series brackets every date"),
        }
    }

    /// Stored elements with `range.start <= date < range.end`.
    pub fn range(&self, range: Range<Timestamp>) -> &[E] {
        let start = self.elements.partition_point(|e| e.date() < range.start);
        let end = self.elements.partition_point(|e| e.date() < range.end);
        &self.elements[start..end.max(start)]
    }

    /// Move elements older than `up_to` into a snapshot document.
    ///
    /// The snapshot also holds the element kept as the new left boundary, so
    /// both documents can interpolate up to the cut. Returns the number of
    /// elements removed from memory; nothing is removed when the snapshot
    /// cannot be written.
    pub fn archive(&mut self, up_to: Timestamp) -> usize {
        let cut = archive::cut_index(&self.elements, up_to);
        if cut == 0 {
            return 0;
        }
        let Some(snapshot_key) = archive::snapshot_key(self.store.as_ref(), &self.key, up_to) else {
            log::warn!("archive of `{}` up to {up_to} skipped", self.key);
            return 0;
        };
        let document = DocumentRef {
            elements: &self.elements[..=cut],
            meta: self.meta.as_ref(),
        };
        if !save_json(self.store.as_ref(), &snapshot_key, &document) {
            log::warn!("archive of `{}` up to {up_to} skipped", self.key);
            return 0;
        }
        self.elements.drain(..cut);
        self.mark_dirty();
        log::info!("archived {cut} elements of `{}` to `{snapshot_key}`", self.key);
        cut
    }

    /// Snapshot keys written by [`archive`](Self::archive), oldest first.
    pub fn archived_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = match self.store.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| archive::is_snapshot_of(&self.key, k))
                .collect(),
            Err(err) => {
                log::warn!("failed to list archives of `{}`: {err:#}", self.key);
                Vec::new()
            }
        };
        keys.sort_by_key(|k| snapshot_order(&self.key, k));
        keys
    }

    /// Elements of one archive snapshot.
    pub fn load_archive(&self, snapshot_key: &str) -> Option<Vec<E>> {
        let document = load_json::<Document<E, M>>(self.store.as_ref(), snapshot_key)?;
        Some(prepare_loaded(snapshot_key, document.elements).0)
    }

    /// Enter or leave background. Entering background writes pending changes
    /// before returning.
    pub fn set_in_background(&mut self, in_background: bool) {
        self.in_background = in_background;
        if in_background && self.dirty {
            self.flush();
        }
    }

    /// Write the series if it has pending changes. Returns whether the series
    /// is clean afterwards.
    pub fn flush(&mut self) -> bool {
        if !self.dirty {
            return true;
        }
        let document = DocumentRef {
            elements: &self.elements,
            meta: self.meta.as_ref(),
        };
        if save_json(self.store.as_ref(), &self.key, &document) {
            self.dirty = false;
            self.dirty_since = None;
            log::debug!("flushed {} elements of `{}`", self.elements.len(), self.key);
            true
        } else {
            false
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        if self.dirty_since.is_none() {
            self.dirty_since = Some(Instant::now());
        }
    }
}

impl<E, M> Tick for TimeSeries<E, M>
where
    E: TimeSeriesElement,
    M: Serialize + DeserializeOwned + Send + 'static,
{
    /// Flush if dirty in background for at least the idle interval.
    fn tick(&mut self, now: Instant) {
        if !self.in_background || !self.dirty {
            return;
        }
        let idle = self
            .dirty_since
            .map_or(false, |since| now.saturating_duration_since(since) >= self.config.idle_flush_interval);
        if idle {
            self.flush();
        }
    }
}

/// Indices around `at` in date-ordered `elements`.
pub fn bracket<E: TimeSeriesElement>(elements: &[E], at: Timestamp) -> Bracket {
    let after = elements.partition_point(|e| e.date() < at);
    let hit = elements.get(after).map_or(false, |e| e.date() == at);
    let next = if hit { after + 1 } else { after };
    Bracket {
        before: after.checked_sub(1),
        at: hit.then_some(after),
        after: (next < elements.len()).then_some(next),
    }
}

/// Point query over date-ordered `elements`; `None` only when empty.
pub fn value_in<E: TimeSeriesElement>(elements: &[E], at: Timestamp, clamping: Clamping) -> Option<E> {
    let bracket = bracket(elements, at);
    if let Some(index) = bracket.at {
        return Some(elements[index].clone());
    }
    let len = elements.len();
    let value = match (bracket.before, bracket.after) {
        (Some(before), Some(after)) => elements[before].interpolate(at, &elements[after]),
        (Some(before), None) => {
            if clamping == Clamping::Unclamped && len >= 2 {
                elements[len - 2].interpolate_with(at, &elements[before], clamping)
            } else {
                elements[before].extrapolate(at)
            }
        }
        (None, Some(after)) => {
            if clamping == Clamping::Unclamped && len >= 2 {
                elements[after].interpolate_with(at, &elements[1], clamping)
            } else {
                elements[after].extrapolate(at)
            }
        }
        (None, None) => return None,
    };
    Some(value)
}

/// Migrate decoded elements and restore the ordering invariant.
///
/// Returns the elements and whether anything had to change.
fn prepare_loaded<E: TimeSeriesElement>(key: &str, mut elements: Vec<E>) -> (Vec<E>, bool) {
    let mut changed = false;
    for element in &mut elements {
        changed |= element.migrate();
    }
    if changed {
        log::info!("migrated stored elements of `{key}` to the current schema");
    }
    let ordered = elements.windows(2).all(|w| w[0].date() < w[1].date());
    if !ordered {
        log::warn!("stored elements of `{key}` were out of order; re-sorting");
        elements.sort_by_key(|e| e.date());
        // keep the last of equal dates, matching upsert
        elements.reverse();
        elements.dedup_by_key(|e| e.date());
        elements.reverse();
        changed = true;
    }
    (elements, changed)
}

fn snapshot_order(key: &str, snapshot: &str) -> (i64, u32) {
    let rest = snapshot
        .strip_prefix(key)
        .and_then(|r| r.strip_prefix('-'))
        .unwrap_or("");
    let mut parts = rest.split('-');
    let stamp = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let n = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (stamp, n)
}
