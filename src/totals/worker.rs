use std::sync::Arc;
use std::time::Instant;

use crate::core::Timestamp;
use crate::derive::TotalsEvent;
use crate::serial::Tick;
use crate::storage::Store;
use crate::totals::{Measurements, Totals, TotalsConfig, TotalsSnapshot};

/// [`Totals`] plus its persistence, for running on a
/// [`Serial`](crate::serial::Serial). Changed state is saved on the next tick.
pub struct TotalsWorker {
    totals: Totals,
    store: Arc<dyn Store>,
    unsaved: bool,
}

impl TotalsWorker {
    pub fn open(store: Arc<dyn Store>, config: TotalsConfig) -> Self {
        Self {
            totals: Totals::load(store.as_ref(), config),
            store,
            unsaved: false,
        }
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn is_unsaved(&self) -> bool {
        self.unsaved
    }

    pub fn reflect(&mut self, event: &TotalsEvent, m: &dyn Measurements) {
        self.totals.reflect(event, m);
        self.unsaved = true;
    }

    pub fn reflect_dirty_after(&mut self, date: Timestamp) {
        self.totals.reflect_dirty_after(date);
        self.unsaved = true;
    }

    pub fn refresh_totals(&mut self, up_to: Timestamp, m: &dyn Measurements) -> Vec<TotalsSnapshot> {
        if self.totals.has_pending_corrections() {
            self.unsaved = true;
        }
        self.totals.refresh_totals(up_to, m)
    }

    /// Returns whether the state is saved afterwards.
    pub fn save(&mut self) -> bool {
        if self.totals.save(self.store.as_ref()) {
            self.unsaved = false;
        }
        !self.unsaved
    }
}

impl Tick for TotalsWorker {
    fn tick(&mut self, _now: Instant) {
        if self.unsaved {
            self.save();
        }
    }
}
