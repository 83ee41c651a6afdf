use std::time::Duration;

/// Default window during which recorded contributions can still be corrected.
const DEFAULT_CORRECTION_HORIZON: Duration = Duration::from_secs(10 * 60);

/// Totals configuration.
#[derive(Debug, Clone, Copy)]
pub struct TotalsConfig {
    /// How far back `reflect_dirty_after` can retract contributions.
    /// Contributions that ended longer ago than this before the last event
    /// are forgotten.
    pub correction_horizon: Duration,
    /// Split segments on motion type changes.
    pub track_motion: bool,
    /// Split segments on active/inactive changes.
    pub track_activity: bool,
}

impl Default for TotalsConfig {
    fn default() -> Self {
        Self {
            correction_horizon: DEFAULT_CORRECTION_HORIZON,
            track_motion: true,
            track_activity: true,
        }
    }
}
