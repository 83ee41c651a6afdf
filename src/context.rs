//! Engine entry point.
//!
//! A [`Context`] ties one [`Store`] to the engine configuration and hands out
//! the components that persist into it. Nothing in the crate is global: two
//! contexts over two stores are fully independent.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::derive::{IntensityBands, IntensityDeriver};
use crate::element::TimeSeriesElement;
use crate::serial::Serial;
use crate::series::{SeriesConfig, TimeSeries};
use crate::storage::{FileStore, MemoryStore, Persistent, Store};
use crate::totals::{Totals, TotalsConfig, TotalsWorker};

/// Store key of the athlete profile.
pub const PROFILE_KEY: &str = "profile";

/// Maximum heart rate assumed until a profile is stored.
const DEFAULT_HR_MAX: f64 = 190.0;

/// Athlete parameters the derivations depend on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Beats per minute.
    pub hr_max: f64,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub series: SeriesConfig,
    pub totals: TotalsConfig,
    pub intensity_bands: IntensityBands,
    /// Used when no [`Profile`] is stored.
    pub default_hr_max: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            series: SeriesConfig::default(),
            totals: TotalsConfig::default(),
            intensity_bands: IntensityBands::default(),
            default_hr_max: DEFAULT_HR_MAX,
        }
    }
}

pub struct Context {
    store: Arc<dyn Store>,
    config: EngineConfig,
}

impl Context {
    /// Context persisting into files under `dir`.
    pub fn open(dir: impl Into<PathBuf>, config: EngineConfig) -> anyhow::Result<Self> {
        let store = FileStore::open(dir)?;
        log::info!("opened store at {}", store.root().display());
        Ok(Self::with_store(Arc::new(store), config))
    }

    /// Context whose documents live only as long as the process.
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), config)
    }

    pub fn with_store(store: Arc<dyn Store>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The series of kind `E`, loaded from the store.
    pub fn series<E: TimeSeriesElement>(&self) -> TimeSeries<E> {
        TimeSeries::open(self.store.clone(), self.config.series)
    }

    /// The series of kind `E` on its own serial context, named after the kind.
    pub fn spawn_series<E: TimeSeriesElement>(&self) -> Result<Serial<TimeSeries<E>>> {
        Serial::spawn(
            format!("series-{}", E::KIND),
            self.series::<E>(),
            self.config.series.tick_interval,
        )
    }

    pub fn totals(&self) -> Totals {
        Totals::load(self.store.as_ref(), self.config.totals)
    }

    /// Totals on a serial context that saves changed state on every tick.
    pub fn spawn_totals(&self) -> Result<Serial<TotalsWorker>> {
        Serial::spawn(
            "totals",
            TotalsWorker::open(self.store.clone(), self.config.totals),
            self.config.series.tick_interval,
        )
    }

    pub fn profile(&self) -> Persistent<Profile> {
        Persistent::new(self.store.clone(), PROFILE_KEY)
    }

    /// Stored maximum heart rate, or the configured default.
    pub fn hr_max(&self) -> f64 {
        self.profile()
            .get()
            .map_or(self.config.default_hr_max, |p| p.hr_max)
    }

    pub fn intensity_deriver(&self) -> IntensityDeriver {
        IntensityDeriver::with_bands(self.hr_max(), self.config.intensity_bands.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Timestamp;
    use crate::element::Heartrate;

    #[test]
    fn hr_max_falls_back_to_config() {
        let context = Context::in_memory(EngineConfig::default());
        assert_eq!(context.hr_max(), DEFAULT_HR_MAX);
        assert!(context.profile().set(Profile { hr_max: 200.0 }));
        assert_eq!(context.hr_max(), 200.0);
        assert_eq!(context.intensity_deriver().hr_max(), 200.0);
    }

    #[test]
    fn series_share_the_store() {
        let context = Context::in_memory(EngineConfig::default());
        let mut series = context.series::<Heartrate>();
        series.insert(Heartrate::new(Timestamp::from_secs(1), 72.0));
        series.set_in_background(true);

        let reopened = context.series::<Heartrate>();
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn serial_series_flushes_on_background() {
        let context = Context::in_memory(EngineConfig::default());
        let serial = context.spawn_series::<Heartrate>().expect("spawn");
        assert_eq!(serial.name(), "series-heartrate");
        serial
            .sync(|s| {
                s.insert(Heartrate::new(Timestamp::from_secs(1), 60.0));
                s.set_in_background(true);
            })
            .expect("sync");
        let series = serial.shutdown().expect("shutdown");
        assert!(!series.is_dirty());
        assert!(context.store().contains("heartrate").expect("contains"));
    }
}
