//! Interpolating time series and segmented workout totals.
//!
//! - [`element`]: dated sample kinds and their interpolation arithmetic.
//! - [`series`]: date-ordered series with point and range queries, archiving
//!   and idle background persistence.
//! - [`derive`]: intensity and other events derived from samples.
//! - [`totals`]: per-key segment totals with late-data correction.
//! - [`storage`]: framed document persistence behind the [`Store`] trait.
//! - [`serial`]: single-threaded contexts owning mutable state.
//! - [`context`]: the entry point tying a store to the configuration.

pub mod context;
pub mod core;
pub mod derive;
pub mod element;
pub mod serial;
pub mod series;
pub mod storage;
pub mod totals;

pub use crate::context::{Context, EngineConfig, Profile};
pub use crate::core::{Error, Result, Timestamp};
pub use crate::element::{Clamping, TimeSeriesElement, VectorElement};
pub use crate::serial::{Serial, Tick};
pub use crate::series::{SeriesConfig, TimeSeries};
pub use crate::storage::{FileStore, MemoryStore, Store};
pub use crate::totals::{Totals, TotalsConfig, TotalsSnapshot};
