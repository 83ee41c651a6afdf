use serde::{Deserialize, Serialize};

use crate::core::Timestamp;
use crate::derive::Intensity;

/// Motion class reported by the activity classifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionType {
    Stationary,
    Walking,
    Running,
    Cycling,
    Automotive,
    #[default]
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityEvent {
    pub date: Timestamp,
    pub intensity: Intensity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionEvent {
    pub date: Timestamp,
    pub motion: MotionType,
}

/// Start or end of an active (moving) stretch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub date: Timestamp,
    pub is_active: bool,
}

/// Everything after `date` is counted separately from everything before.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetEvent {
    pub date: Timestamp,
}

/// An event that changes one axis of the totals key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TotalsEvent {
    Intensity(IntensityEvent),
    Motion(MotionEvent),
    Activity(ActivityEvent),
    Reset(ResetEvent),
}

impl TotalsEvent {
    pub fn date(&self) -> Timestamp {
        match self {
            TotalsEvent::Intensity(e) => e.date,
            TotalsEvent::Motion(e) => e.date,
            TotalsEvent::Activity(e) => e.date,
            TotalsEvent::Reset(e) => e.date,
        }
    }
}

impl From<IntensityEvent> for TotalsEvent {
    fn from(event: IntensityEvent) -> Self {
        TotalsEvent::Intensity(event)
    }
}

impl From<MotionEvent> for TotalsEvent {
    fn from(event: MotionEvent) -> Self {
        TotalsEvent::Motion(event)
    }
}

impl From<ActivityEvent> for TotalsEvent {
    fn from(event: ActivityEvent) -> Self {
        TotalsEvent::Activity(event)
    }
}

impl From<ResetEvent> for TotalsEvent {
    fn from(event: ResetEvent) -> Self {
        TotalsEvent::Reset(event)
    }
}
