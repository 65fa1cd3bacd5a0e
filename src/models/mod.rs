mod exercise;
mod section;
mod section_item;
mod section_type;
mod upsert;
mod workout_log;
mod workout_set;

pub use exercise::Exercise;
pub use section::{Section, SectionDraft, SectionPatch};
pub use section_item::{ItemDraft, ItemPatch, SectionItem};
pub use section_type::SectionType;
pub use upsert::{SkipSets, UpsertSection, UpsertSectionItem, UpsertSet, UpsertWorkoutLog};
pub use workout_log::{
    LogDraft, LogPatch, PopulatedItem, PopulatedSection, PopulatedWorkoutLog, WorkoutLog,
};
pub use workout_set::{AchievedValues, SetDraft, SetPatch, WorkoutSet};
