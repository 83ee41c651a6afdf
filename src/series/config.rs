use std::time::Duration;

/// Default idle period after which a dirty, backgrounded series is flushed.
const DEFAULT_IDLE_FLUSH_INTERVAL: Duration = Duration::from_secs(30);
/// Default period of the serial context's recurring flush check.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Persistence timing for a [`TimeSeries`](crate::series::TimeSeries).
#[derive(Debug, Clone, Copy)]
pub struct SeriesConfig {
    /// How long a series may stay dirty while in background before
    /// [`tick`](crate::series::TimeSeries::tick) writes it out.
    pub idle_flush_interval: Duration,
    /// How often the owning serial context checks for an idle flush.
    pub tick_interval: Duration,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            idle_flush_interval: DEFAULT_IDLE_FLUSH_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}
