use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One discrete unit of work within a section item.
///
/// Target values describe what was planned, achieved values what was done.
/// Each metric is tracked independently, so a set may carry any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSet {
    pub id: Uuid,
    pub item_id: Uuid,
    pub order: i32,
    pub target_reps: Option<i32>,
    pub target_weight: Option<f64>,
    /// Seconds
    pub target_time: Option<i32>,
    /// Meters
    pub target_distance: Option<f64>,
    pub achieved_reps: Option<i32>,
    pub achieved_weight: Option<f64>,
    pub achieved_time: Option<i32>,
    pub achieved_distance: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub skipped: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkoutSet {
    /// A set is done once it has been completed or skipped.
    pub fn is_done(&self) -> bool {
        self.completed_at.is_some() || self.skipped
    }
}

/// Values for writing a set. `id` is generated by the store when absent.
#[derive(Debug, Clone, Default)]
pub struct SetDraft {
    pub id: Option<Uuid>,
    pub item_id: Uuid,
    pub order: i32,
    pub target_reps: Option<i32>,
    pub target_weight: Option<f64>,
    pub target_time: Option<i32>,
    pub target_distance: Option<f64>,
    pub achieved_reps: Option<i32>,
    pub achieved_weight: Option<f64>,
    pub achieved_time: Option<i32>,
    pub achieved_distance: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub skipped: bool,
}

/// Achieved metrics reported when completing a set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievedValues {
    pub achieved_reps: Option<i32>,
    pub achieved_weight: Option<f64>,
    pub achieved_time: Option<i32>,
    pub achieved_distance: Option<f64>,
}

impl AchievedValues {
    pub fn reps(reps: i32) -> Self {
        Self {
            achieved_reps: Some(reps),
            ..Self::default()
        }
    }
}

/// Partial update of a set. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct SetPatch {
    pub achieved_reps: Option<i32>,
    pub achieved_weight: Option<f64>,
    pub achieved_time: Option<i32>,
    pub achieved_distance: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub skipped: Option<bool>,
}

impl SetPatch {
    pub fn completed(achieved: &AchievedValues, at: DateTime<Utc>) -> Self {
        Self {
            achieved_reps: achieved.achieved_reps,
            achieved_weight: achieved.achieved_weight,
            achieved_time: achieved.achieved_time,
            achieved_distance: achieved.achieved_distance,
            completed_at: Some(at),
            skipped: None,
        }
    }

    pub fn skipped() -> Self {
        Self {
            skipped: Some(true),
            ..Self::default()
        }
    }

    pub fn apply(&self, set: &mut WorkoutSet) {
        if let Some(reps) = self.achieved_reps {
            set.achieved_reps = Some(reps);
        }
        if let Some(weight) = self.achieved_weight {
            set.achieved_weight = Some(weight);
        }
        if let Some(time) = self.achieved_time {
            set.achieved_time = Some(time);
        }
        if let Some(distance) = self.achieved_distance {
            set.achieved_distance = Some(distance);
        }
        if let Some(at) = self.completed_at {
            set.completed_at = Some(at);
        }
        if let Some(skipped) = self.skipped {
            set.skipped = skipped;
        }
    }
}
