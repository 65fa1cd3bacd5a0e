use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::section::Section;
use super::section_item::SectionItem;
use super::workout_set::WorkoutSet;

/// One user's recorded execution of a workout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLog {
    pub id: Uuid,
    /// Workout template the session was started from, if any.
    pub workout_id: Option<Uuid>,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub section_ids: Vec<Uuid>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LogDraft {
    pub id: Option<Uuid>,
    pub workout_id: Option<Uuid>,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub section_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct LogPatch {
    pub name: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl LogPatch {
    pub fn completed(at: DateTime<Utc>) -> Self {
        Self {
            completed_at: Some(at),
            ..Self::default()
        }
    }

    pub fn apply(&self, log: &mut WorkoutLog) {
        if let Some(name) = &self.name {
            log.name = name.clone();
        }
        if let Some(at) = self.completed_at {
            log.completed_at = Some(at);
        }
    }
}

/// A section item with its sets resolved in `set_ids` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedItem {
    #[serde(flatten)]
    pub item: SectionItem,
    pub sets: Vec<WorkoutSet>,
}

/// A section with its items resolved in `item_ids` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedSection {
    #[serde(flatten)]
    pub section: Section,
    pub items: Vec<PopulatedItem>,
}

/// A workout log with the full section/item/set tree attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedWorkoutLog {
    #[serde(flatten)]
    pub log: WorkoutLog,
    pub sections: Vec<PopulatedSection>,
}

impl PopulatedWorkoutLog {
    pub fn sets(&self) -> impl Iterator<Item = &WorkoutSet> {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter())
            .flat_map(|i| i.sets.iter())
    }
}

fn status(completed_at: Option<DateTime<Utc>>) -> String {
    match completed_at {
        Some(at) => format!("done {}", at.format("%H:%M")),
        None => "pending".to_string(),
    }
}

fn set_summary(set: &WorkoutSet) -> String {
    let mut parts = Vec::new();
    if let Some(reps) = set.achieved_reps.or(set.target_reps) {
        parts.push(format!("{} reps", reps));
    }
    if let Some(weight) = set.achieved_weight.or(set.target_weight) {
        parts.push(format!("{} kg", weight));
    }
    if let Some(time) = set.achieved_time.or(set.target_time) {
        parts.push(format!("{}s", time));
    }
    if let Some(distance) = set.achieved_distance.or(set.target_distance) {
        parts.push(format!("{} m", distance));
    }
    if parts.is_empty() {
        parts.push("-".to_string());
    }

    let state = if set.skipped {
        "skipped".to_string()
    } else {
        status(set.completed_at)
    };
    format!("{} [{}]", parts.join(", "), state)
}

impl fmt::Display for PopulatedWorkoutLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.log.name)?;
        writeln!(f, "{}", "=".repeat(self.log.name.len()))?;
        writeln!(f, "ID: {}", self.log.id)?;
        writeln!(f, "Started: {}", self.log.started_at.format("%Y-%m-%d %H:%M"))?;
        writeln!(f, "Status: {}", status(self.log.completed_at))?;

        for section in &self.sections {
            writeln!(
                f,
                "\n{} ({}) [{}]",
                section.section.name,
                section.section.section_type,
                status(section.section.completed_at)
            )?;
            for item in &section.items {
                writeln!(
                    f,
                    "  - {} [{}]",
                    item.item.name,
                    status(item.item.completed_at)
                )?;
                for (index, set) in item.sets.iter().enumerate() {
                    writeln!(f, "      {}. {}", index + 1, set_summary(set))?;
                    writeln!(f, "         id: {}", set.id)?;
                }
            }
        }

        Ok(())
    }
}
