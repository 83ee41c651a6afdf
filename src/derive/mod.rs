//! Events derived from raw samples.
//!
//! Heart rate is turned into intensity changes by [`IntensityDeriver`]; the
//! other event kinds are produced by the sensor integration layer and fed to
//! [`Totals`](crate::totals::Totals) as [`TotalsEvent`]s.

mod events;
mod intensity;

pub use events::{ActivityEvent, IntensityEvent, MotionEvent, MotionType, ResetEvent, TotalsEvent};
pub use intensity::{Band, Direction, Intensity, IntensityBands, IntensityDeriver};
