//! Request shapes for writing a whole workout log tree in one call.
//!
//! Every level may omit its `id` to create a new row or supply one to
//! update that row in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::section_type::SectionType;
use super::workout_log::PopulatedWorkoutLog;
use super::workout_set::WorkoutSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertWorkoutLog {
    pub id: Option<Uuid>,
    pub workout_id: Option<Uuid>,
    pub name: String,
    /// Defaults to the stored value, or now for a new log.
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sections: Vec<UpsertSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSection {
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    /// Defaults to the position in the parent list.
    pub order: Option<i32>,
    #[serde(default)]
    pub items: Vec<UpsertSectionItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSectionItem {
    pub id: Option<Uuid>,
    pub exercise_id: Uuid,
    /// Snapshot of the exercise name; resolved from the exercise when omitted.
    pub name: Option<String>,
    pub order: Option<i32>,
    #[serde(default)]
    pub rest_between_sets: i32,
    #[serde(default)]
    pub break_after: i32,
    #[serde(default)]
    pub sets: Vec<UpsertSet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSet {
    pub id: Option<Uuid>,
    pub order: Option<i32>,
    pub target_reps: Option<i32>,
    pub target_weight: Option<f64>,
    pub target_time: Option<i32>,
    pub target_distance: Option<f64>,
    pub achieved_reps: Option<i32>,
    pub achieved_weight: Option<f64>,
    pub achieved_time: Option<i32>,
    pub achieved_distance: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub skipped: bool,
}

/// Body of the bulk skip request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipSets {
    pub set_ids: Vec<Uuid>,
}

impl UpsertWorkoutLog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            workout_id: None,
            name: name.into(),
            started_at: None,
            sections: Vec::new(),
        }
    }

    pub fn with_section(mut self, section: UpsertSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut UpsertSectionItem> {
        self.sections.iter_mut().flat_map(|s| s.items.iter_mut())
    }
}

impl From<&PopulatedWorkoutLog> for UpsertWorkoutLog {
    /// Rebuild the request that would write `populated` back unchanged.
    fn from(populated: &PopulatedWorkoutLog) -> Self {
        let sections = populated
            .sections
            .iter()
            .map(|section| UpsertSection {
                id: Some(section.section.id),
                name: section.section.name.clone(),
                section_type: section.section.section_type,
                order: Some(section.section.order),
                items: section
                    .items
                    .iter()
                    .map(|item| UpsertSectionItem {
                        id: Some(item.item.id),
                        exercise_id: item.item.exercise_id,
                        name: Some(item.item.name.clone()),
                        order: Some(item.item.order),
                        rest_between_sets: item.item.rest_between_sets,
                        break_after: item.item.break_after,
                        sets: item.sets.iter().map(UpsertSet::from).collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            id: Some(populated.log.id),
            workout_id: populated.log.workout_id,
            name: populated.log.name.clone(),
            started_at: Some(populated.log.started_at),
            sections,
        }
    }
}

impl From<&WorkoutSet> for UpsertSet {
    fn from(set: &WorkoutSet) -> Self {
        Self {
            id: Some(set.id),
            order: Some(set.order),
            target_reps: set.target_reps,
            target_weight: set.target_weight,
            target_time: set.target_time,
            target_distance: set.target_distance,
            achieved_reps: set.achieved_reps,
            achieved_weight: set.achieved_weight,
            achieved_time: set.achieved_time,
            achieved_distance: set.achieved_distance,
            completed_at: set.completed_at,
            skipped: set.skipped,
        }
    }
}

impl UpsertSection {
    pub fn new(name: impl Into<String>, section_type: SectionType) -> Self {
        Self {
            id: None,
            name: name.into(),
            section_type,
            order: None,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: UpsertSectionItem) -> Self {
        self.items.push(item);
        self
    }
}

impl UpsertSectionItem {
    pub fn new(exercise_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: None,
            exercise_id,
            name: Some(name.into()),
            order: None,
            rest_between_sets: 0,
            break_after: 0,
            sets: Vec::new(),
        }
    }

    pub fn with_rest(mut self, rest_between_sets: i32, break_after: i32) -> Self {
        self.rest_between_sets = rest_between_sets;
        self.break_after = break_after;
        self
    }

    pub fn with_set(mut self, set: UpsertSet) -> Self {
        self.sets.push(set);
        self
    }
}

impl UpsertSet {
    pub fn reps(target_reps: i32) -> Self {
        Self {
            target_reps: Some(target_reps),
            ..Self::default()
        }
    }

    pub fn with_weight(mut self, target_weight: f64) -> Self {
        self.target_weight = Some(target_weight);
        self
    }
}
