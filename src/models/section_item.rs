use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One exercise occurrence within a log section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionItem {
    pub id: Uuid,
    pub section_id: Uuid,
    pub exercise_id: Uuid,
    /// Exercise name captured when the item was first written.
    pub name: String,
    pub order: i32,
    /// Seconds
    pub rest_between_sets: i32,
    /// Seconds
    pub break_after: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub set_ids: Vec<Uuid>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ItemDraft {
    pub id: Option<Uuid>,
    pub section_id: Uuid,
    pub exercise_id: Uuid,
    /// Only written on insert.
    pub name: String,
    pub order: i32,
    pub rest_between_sets: i32,
    pub break_after: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub set_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub rest_between_sets: Option<i32>,
    pub break_after: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ItemPatch {
    pub fn completed(at: DateTime<Utc>) -> Self {
        Self {
            completed_at: Some(at),
            ..Self::default()
        }
    }

    pub fn apply(&self, item: &mut SectionItem) {
        if let Some(rest) = self.rest_between_sets {
            item.rest_between_sets = rest;
        }
        if let Some(brk) = self.break_after {
            item.break_after = brk;
        }
        if let Some(at) = self.completed_at {
            item.completed_at = Some(at);
        }
    }
}
