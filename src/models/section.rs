use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::section_type::SectionType;

/// A phase of a workout log, e.g. warmup or strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: Uuid,
    pub log_id: Uuid,
    pub name: String,
    pub order: i32,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    pub completed_at: Option<DateTime<Utc>>,
    pub item_ids: Vec<Uuid>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SectionDraft {
    pub id: Option<Uuid>,
    pub log_id: Uuid,
    pub name: String,
    pub order: i32,
    pub section_type: SectionType,
    pub completed_at: Option<DateTime<Utc>>,
    pub item_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct SectionPatch {
    pub name: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SectionPatch {
    pub fn completed(at: DateTime<Utc>) -> Self {
        Self {
            completed_at: Some(at),
            ..Self::default()
        }
    }

    pub fn apply(&self, section: &mut Section) {
        if let Some(name) = &self.name {
            section.name = name.clone();
        }
        if let Some(at) = self.completed_at {
            section.completed_at = Some(at);
        }
    }
}
