//! Workout log aggregation engine.
//!
//! A log is a four level tree (log → sections → items → sets) stored as flat
//! rows. Each parent keeps an ordered id list of its children and each child
//! row carries its parent id, which doubles as the reverse index used when
//! completion cascades upward.
//!
//! Writes are bottom-up: children are persisted before the parent that lists
//! them, all inside one transaction. Completion of a parent is derived from
//! its children and never accepted from callers.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::db::{item_store, log_store, section_store, set_store};
use crate::error::LogError;
use crate::models::{
    AchievedValues, ItemDraft, ItemPatch, LogDraft, LogPatch, PopulatedItem, PopulatedSection,
    PopulatedWorkoutLog, Section, SectionDraft, SectionItem, SectionPatch, SetDraft, SetPatch,
    UpsertSection, UpsertSectionItem, UpsertSet, UpsertWorkoutLog, WorkoutLog, WorkoutSet,
};

/// Entry point for writing, reading and completing workout logs.
#[derive(Clone)]
pub struct WorkoutLogService {
    pool: SqlitePool,
}

/// Per-call values threaded through the nested upsert.
struct WriteContext<'a> {
    actor: &'a str,
    now: DateTime<Utc>,
}

/// Rows written by one upsert, used to prune children that were dropped
/// from the request.
#[derive(Default)]
struct WrittenTree {
    sections: Vec<Section>,
    items: Vec<SectionItem>,
}

impl WorkoutLogService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a whole log tree, creating rows without ids and updating rows
    /// with ids. Returns the top-level log without its children.
    pub async fn upsert_log(
        &self,
        input: &UpsertWorkoutLog,
        actor: &str,
    ) -> Result<WorkoutLog, LogError> {
        ensure_unique_ids(input)?;

        let ctx = WriteContext {
            actor,
            now: Utc::now(),
        };
        let mut tx = self.pool.begin().await?;

        let log_id = input.id.unwrap_or_else(Uuid::new_v4);
        let mut written = WrittenTree::default();
        let mut section_ids = Vec::with_capacity(input.sections.len());
        let mut sections_done = Vec::with_capacity(input.sections.len());

        for (index, section_input) in input.sections.iter().enumerate() {
            let section =
                upsert_section(&mut tx, &ctx, section_input, log_id, index, &mut written).await?;
            sections_done.push(section.completed_at.is_some());
            section_ids.push(section.id);
            written.sections.push(section);
        }

        let existing = log_store::find_by_id(&mut tx, log_id).await?;
        let started_at = input
            .started_at
            .or(existing.as_ref().map(|log| log.started_at))
            .unwrap_or(ctx.now);
        let previous = existing.and_then(|log| log.completed_at);

        let draft = LogDraft {
            id: Some(log_id),
            workout_id: input.workout_id,
            name: input.name.clone(),
            started_at,
            completed_at: derive_completion(previous, &sections_done, ctx.now),
            section_ids,
        };
        let log = log_store::upsert(&mut tx, &draft, ctx.actor).await?;

        let pruned = prune_detached(&mut tx, &log, &written).await?;
        tx.commit().await?;

        tracing::info!(
            log_id = %log.id,
            sections = log.section_ids.len(),
            items = written.items.len(),
            pruned,
            actor,
            "Upserted workout log"
        );
        Ok(log)
    }

    /// Load a log with its sections, items and sets in list order.
    ///
    /// Ids that no longer resolve are left out of the result rather than
    /// failing the read.
    pub async fn get_log(&self, id: Uuid) -> Result<PopulatedWorkoutLog, LogError> {
        let mut conn = self.pool.acquire().await?;

        let log = log_store::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| LogError::not_found("workout log", id))?;

        let sections = section_store::find_by_ids(&mut conn, &log.section_ids).await?;
        let item_ids: Vec<Uuid> = sections
            .iter()
            .flat_map(|s| s.item_ids.iter().copied())
            .collect();
        let items = item_store::find_by_ids(&mut conn, &item_ids).await?;
        let set_ids: Vec<Uuid> = items
            .iter()
            .flat_map(|i| i.set_ids.iter().copied())
            .collect();
        let sets = set_store::find_by_ids(&mut conn, &set_ids).await?;

        Ok(populate(log, sections, items, sets))
    }

    /// Logs written by `actor`, newest first, without children.
    pub async fn list_logs(&self, actor: &str) -> Result<Vec<WorkoutLog>, LogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(log_store::list_by_actor(&mut conn, actor).await?)
    }

    /// Delete a log together with all of its descendants.
    pub async fn delete_log(&self, id: Uuid) -> Result<(), LogError> {
        let mut conn = self.pool.acquire().await?;
        if !log_store::delete(&mut conn, id).await? {
            return Err(LogError::not_found("workout log", id));
        }
        tracing::info!(log_id = %id, "Deleted workout log");
        Ok(())
    }

    pub async fn get_set(&self, id: Uuid) -> Result<WorkoutSet, LogError> {
        let mut conn = self.pool.acquire().await?;
        set_store::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| LogError::not_found("set", id))
    }

    /// Record a set as completed with the achieved values, then cascade
    /// completion to its item, section and log where every sibling is done.
    ///
    /// Completing an already completed set refreshes its timestamp and
    /// overwrites the reported values.
    pub async fn complete_set(
        &self,
        set_id: Uuid,
        achieved: &AchievedValues,
    ) -> Result<WorkoutSet, LogError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let set = finish_set(&mut tx, set_id, &SetPatch::completed(achieved, now), now).await?;

        tx.commit().await?;
        tracing::info!(set_id = %set.id, "Completed set");
        Ok(set)
    }

    /// Skip each set in order. A skipped set counts as done for cascading.
    /// Nothing is applied if any id is unknown.
    pub async fn skip_sets(&self, set_ids: &[Uuid]) -> Result<Vec<WorkoutSet>, LogError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut skipped = Vec::with_capacity(set_ids.len());
        for set_id in set_ids {
            skipped.push(finish_set(&mut tx, *set_id, &SetPatch::skipped(), now).await?);
        }

        tx.commit().await?;
        tracing::info!(count = skipped.len(), "Skipped sets");
        Ok(skipped)
    }
}

async fn upsert_section(
    conn: &mut SqliteConnection,
    ctx: &WriteContext<'_>,
    input: &UpsertSection,
    log_id: Uuid,
    index: usize,
    written: &mut WrittenTree,
) -> Result<Section, LogError> {
    let section_id = input.id.unwrap_or_else(Uuid::new_v4);
    let existing = section_store::find_by_id(&mut *conn, section_id).await?;
    if let Some(existing) = &existing {
        if existing.log_id != log_id {
            log_store::detach_section(&mut *conn, existing.log_id, section_id).await?;
            tracing::debug!(%section_id, from = %existing.log_id, to = %log_id, "Moved section");
        }
    }

    let mut item_ids = Vec::with_capacity(input.items.len());
    let mut items_done = Vec::with_capacity(input.items.len());

    for (item_index, item_input) in input.items.iter().enumerate() {
        let item = upsert_item(&mut *conn, ctx, item_input, section_id, item_index).await?;
        items_done.push(item.completed_at.is_some());
        item_ids.push(item.id);
        written.items.push(item);
    }

    let previous = existing.and_then(|s| s.completed_at);

    let draft = SectionDraft {
        id: Some(section_id),
        log_id,
        name: input.name.clone(),
        order: input.order.unwrap_or(index as i32),
        section_type: input.section_type,
        completed_at: derive_completion(previous, &items_done, ctx.now),
        item_ids,
    };
    Ok(section_store::upsert(conn, &draft, ctx.actor).await?)
}

async fn upsert_item(
    conn: &mut SqliteConnection,
    ctx: &WriteContext<'_>,
    input: &UpsertSectionItem,
    section_id: Uuid,
    index: usize,
) -> Result<SectionItem, LogError> {
    let item_id = input.id.unwrap_or_else(Uuid::new_v4);
    let existing = item_store::find_by_id(&mut *conn, item_id).await?;
    if let Some(existing) = &existing {
        if existing.section_id != section_id {
            section_store::detach_item(&mut *conn, existing.section_id, item_id).await?;
            tracing::debug!(%item_id, from = %existing.section_id, to = %section_id, "Moved item");
        }
    }

    let mut set_ids = Vec::with_capacity(input.sets.len());
    let mut sets_done = Vec::with_capacity(input.sets.len());

    for (set_index, set_input) in input.sets.iter().enumerate() {
        if let Some(set_id) = set_input.id {
            if let Some(existing) = set_store::find_by_id(&mut *conn, set_id).await? {
                if existing.item_id != item_id {
                    item_store::detach_set(&mut *conn, existing.item_id, set_id).await?;
                    tracing::debug!(%set_id, from = %existing.item_id, to = %item_id, "Moved set");
                }
            }
        }
        let draft = set_draft(set_input, item_id, set_index);
        let set = set_store::upsert(&mut *conn, &draft, ctx.actor).await?;
        sets_done.push(set.is_done());
        set_ids.push(set.id);
    }

    let previous = existing.and_then(|i| i.completed_at);

    let draft = ItemDraft {
        id: Some(item_id),
        section_id,
        exercise_id: input.exercise_id,
        name: input.name.clone().unwrap_or_default(),
        order: input.order.unwrap_or(index as i32),
        rest_between_sets: input.rest_between_sets,
        break_after: input.break_after,
        completed_at: derive_completion(previous, &sets_done, ctx.now),
        set_ids,
    };
    Ok(item_store::upsert(conn, &draft, ctx.actor).await?)
}

/// Reject requests that name the same id twice at one level; the id list
/// would repeat an id backed by a single row.
fn ensure_unique_ids(input: &UpsertWorkoutLog) -> Result<(), LogError> {
    fn check(
        seen: &mut HashSet<Uuid>,
        entity: &'static str,
        id: Option<Uuid>,
    ) -> Result<(), LogError> {
        match id {
            Some(id) if !seen.insert(id) => Err(LogError::DuplicateId { entity, id }),
            _ => Ok(()),
        }
    }

    let (mut sections, mut items, mut sets) = (HashSet::new(), HashSet::new(), HashSet::new());
    for section in &input.sections {
        check(&mut sections, "section", section.id)?;
        for item in &section.items {
            check(&mut items, "section item", item.id)?;
            for set in &item.sets {
                check(&mut sets, "set", set.id)?;
            }
        }
    }
    Ok(())
}

fn set_draft(input: &UpsertSet, item_id: Uuid, index: usize) -> SetDraft {
    SetDraft {
        id: input.id,
        item_id,
        order: input.order.unwrap_or(index as i32),
        target_reps: input.target_reps,
        target_weight: input.target_weight,
        target_time: input.target_time,
        target_distance: input.target_distance,
        achieved_reps: input.achieved_reps,
        achieved_weight: input.achieved_weight,
        achieved_time: input.achieved_time,
        achieved_distance: input.achieved_distance,
        completed_at: input.completed_at,
        skipped: input.skipped,
    }
}

/// A parent is complete once it has children and all of them are done.
/// An earlier completion timestamp is kept while that holds.
fn derive_completion(
    previous: Option<DateTime<Utc>>,
    children_done: &[bool],
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if !children_done.is_empty() && children_done.iter().all(|done| *done) {
        Some(previous.unwrap_or(now))
    } else {
        None
    }
}

/// Delete children still pointing at a written parent but no longer in its
/// id list. Runs after every level is written so moved children are kept.
async fn prune_detached(
    conn: &mut SqliteConnection,
    log: &WorkoutLog,
    written: &WrittenTree,
) -> Result<usize, LogError> {
    let mut pruned = 0;

    let keep: HashSet<Uuid> = log.section_ids.iter().copied().collect();
    for section in section_store::find_by_log(&mut *conn, log.id).await? {
        if !keep.contains(&section.id) && section_store::delete(&mut *conn, section.id).await? {
            pruned += 1;
        }
    }

    for section in &written.sections {
        let keep: HashSet<Uuid> = section.item_ids.iter().copied().collect();
        for item in item_store::find_by_section(&mut *conn, section.id).await? {
            if !keep.contains(&item.id) && item_store::delete(&mut *conn, item.id).await? {
                pruned += 1;
            }
        }
    }

    for item in &written.items {
        let keep: HashSet<Uuid> = item.set_ids.iter().copied().collect();
        for set in set_store::find_by_item(&mut *conn, item.id).await? {
            if !keep.contains(&set.id) && set_store::delete(&mut *conn, set.id).await? {
                pruned += 1;
            }
        }
    }

    Ok(pruned)
}

/// Rebuild the nested tree following each parent's id list. A child is only
/// placed under the parent its own row points at.
fn populate(
    log: WorkoutLog,
    sections: Vec<Section>,
    items: Vec<SectionItem>,
    sets: Vec<WorkoutSet>,
) -> PopulatedWorkoutLog {
    let sections_by_id: HashMap<Uuid, Section> = sections.into_iter().map(|s| (s.id, s)).collect();
    let items_by_id: HashMap<Uuid, SectionItem> = items.into_iter().map(|i| (i.id, i)).collect();
    let sets_by_id: HashMap<Uuid, WorkoutSet> = sets.into_iter().map(|s| (s.id, s)).collect();

    let populate_item = |item: &SectionItem| PopulatedItem {
        sets: item
            .set_ids
            .iter()
            .filter_map(|id| sets_by_id.get(id))
            .filter(|set| set.item_id == item.id)
            .cloned()
            .collect(),
        item: item.clone(),
    };

    let populate_section = |section: &Section| PopulatedSection {
        items: section
            .item_ids
            .iter()
            .filter_map(|id| items_by_id.get(id))
            .filter(|item| item.section_id == section.id)
            .map(&populate_item)
            .collect(),
        section: section.clone(),
    };

    let sections = log
        .section_ids
        .iter()
        .filter_map(|id| sections_by_id.get(id))
        .filter(|section| section.log_id == log.id)
        .map(&populate_section)
        .collect();

    PopulatedWorkoutLog { log, sections }
}

/// Apply `patch` to a set and cascade completion upward.
async fn finish_set(
    conn: &mut SqliteConnection,
    set_id: Uuid,
    patch: &SetPatch,
    now: DateTime<Utc>,
) -> Result<WorkoutSet, LogError> {
    let set = set_store::update(&mut *conn, set_id, patch)
        .await?
        .ok_or_else(|| LogError::not_found("set", set_id))?;

    cascade_completion(conn, &set, now).await?;
    Ok(set)
}

/// True when every id in `ids` resolves to a row owned by the parent and
/// each of those rows is done. An id that does not resolve counts as pending.
fn all_children_done<T>(
    ids: &[Uuid],
    children: &[T],
    is_owned: impl Fn(&T) -> bool,
    is_done: impl Fn(&T) -> bool,
) -> bool {
    let expected: HashSet<&Uuid> = ids.iter().collect();
    let owned: Vec<&T> = children.iter().filter(|c| is_owned(*c)).collect();
    owned.len() == expected.len() && owned.into_iter().all(is_done)
}

/// Walk item → section → log, marking each complete when all of its
/// children are. Stops at the first level that is not fully done.
async fn cascade_completion(
    conn: &mut SqliteConnection,
    set: &WorkoutSet,
    now: DateTime<Utc>,
) -> Result<(), LogError> {
    let Some(item) = item_store::find_by_id(&mut *conn, set.item_id).await? else {
        tracing::warn!(set_id = %set.id, "Set has no owning item");
        return Ok(());
    };
    if !item.set_ids.contains(&set.id) {
        tracing::warn!(set_id = %set.id, item_id = %item.id, "Set missing from item set list");
        return Ok(());
    }

    let sets = set_store::find_by_ids(&mut *conn, &item.set_ids).await?;
    if !all_children_done(&item.set_ids, &sets, |s| s.item_id == item.id, WorkoutSet::is_done) {
        return Ok(());
    }
    item_store::update(&mut *conn, item.id, &ItemPatch::completed(now))
        .await?
        .ok_or_else(|| LogError::not_found("section item", item.id))?;
    tracing::debug!(item_id = %item.id, "Item complete");

    let Some(section) = section_store::find_by_id(&mut *conn, item.section_id).await? else {
        return Ok(());
    };
    if !section.item_ids.contains(&item.id) {
        return Ok(());
    }
    let items = item_store::find_by_ids(&mut *conn, &section.item_ids).await?;
    if !all_children_done(
        &section.item_ids,
        &items,
        |i| i.section_id == section.id,
        |i| i.completed_at.is_some(),
    ) {
        return Ok(());
    }
    section_store::update(&mut *conn, section.id, &SectionPatch::completed(now))
        .await?
        .ok_or_else(|| LogError::not_found("section", section.id))?;
    tracing::debug!(section_id = %section.id, "Section complete");

    let Some(log) = log_store::find_by_id(&mut *conn, section.log_id).await? else {
        return Ok(());
    };
    if !log.section_ids.contains(&section.id) {
        return Ok(());
    }
    let sections = section_store::find_by_ids(&mut *conn, &log.section_ids).await?;
    if !all_children_done(
        &log.section_ids,
        &sections,
        |s| s.log_id == log.id,
        |s| s.completed_at.is_some(),
    ) {
        return Ok(());
    }
    log_store::update(&mut *conn, log.id, &LogPatch::completed(now))
        .await?
        .ok_or_else(|| LogError::not_found("workout log", log.id))?;
    tracing::debug!(log_id = %log.id, "Workout log complete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{seed_exercise, TestDb};
    use crate::models::SectionType;

    struct Fixture {
        db: TestDb,
        service: WorkoutLogService,
        exercise_id: Uuid,
    }

    async fn setup() -> Fixture {
        let db = TestDb::new().await;
        let exercise_id = seed_exercise(&db.pool, "Air Squat").await;
        Fixture {
            service: WorkoutLogService::new(db.pool.clone()),
            db,
            exercise_id,
        }
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    /// One warmup section, one item, two sets.
    fn warmup_log(exercise_id: Uuid) -> UpsertWorkoutLog {
        UpsertWorkoutLog::new("Morning Session").with_section(
            UpsertSection::new("Warmup", SectionType::Warmup).with_item(
                UpsertSectionItem::new(exercise_id, "Air Squat")
                    .with_rest(30, 60)
                    .with_set(UpsertSet::reps(10))
                    .with_set(UpsertSet::reps(8)),
            ),
        )
    }

    /// One section holding two items of two sets each.
    fn two_item_log(exercise_id: Uuid) -> UpsertWorkoutLog {
        UpsertWorkoutLog::new("Legs").with_section(
            UpsertSection::new("Strength", SectionType::Strength)
                .with_item(
                    UpsertSectionItem::new(exercise_id, "Squat")
                        .with_set(UpsertSet::reps(5))
                        .with_set(UpsertSet::reps(5)),
                )
                .with_item(
                    UpsertSectionItem::new(exercise_id, "Lunge")
                        .with_set(UpsertSet::reps(12))
                        .with_set(UpsertSet::reps(12)),
                ),
        )
    }

    fn set_ids(log: &PopulatedWorkoutLog) -> Vec<Uuid> {
        log.sets().map(|s| s.id).collect()
    }

    #[tokio::test]
    async fn test_upsert_without_ids_generates_every_id() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&warmup_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        assert_eq!(log.section_ids.len(), 1);
        assert_eq!(log.created_by, "user1");
        assert!(log.completed_at.is_none());

        let populated = fx.service.get_log(log.id).await.unwrap();
        assert_eq!(populated.log, log);

        let section = &populated.sections[0];
        assert_eq!(section.section.id, log.section_ids[0]);
        assert_eq!(section.section.log_id, log.id);
        assert_eq!(section.section.section_type, SectionType::Warmup);

        let item = &section.items[0];
        assert_eq!(item.item.id, section.section.item_ids[0]);
        assert_eq!(item.item.name, "Air Squat");
        assert_eq!(item.item.rest_between_sets, 30);
        assert_eq!(item.item.break_after, 60);

        let reps: Vec<Option<i32>> = item.sets.iter().map(|s| s.target_reps).collect();
        assert_eq!(reps, vec![Some(10), Some(8)]);
        assert_eq!(
            item.sets.iter().map(|s| s.id).collect::<Vec<_>>(),
            item.item.set_ids
        );
        assert!(item.sets.iter().all(|s| s.created_by == "user1"));
    }

    #[tokio::test]
    async fn test_upsert_keeps_supplied_ids() {
        let fx = setup().await;

        let log_id = Uuid::new_v4();
        let section_id = Uuid::new_v4();
        let set_id = Uuid::new_v4();
        let mut input = warmup_log(fx.exercise_id);
        input.id = Some(log_id);
        input.sections[0].id = Some(section_id);
        input.sections[0].items[0].sets[1].id = Some(set_id);

        let log = fx.service.upsert_log(&input, "user1").await.unwrap();
        assert_eq!(log.id, log_id);

        let populated = fx.service.get_log(log_id).await.unwrap();
        assert_eq!(populated.sections[0].section.id, section_id);
        assert_eq!(populated.sections[0].items[0].sets[1].id, set_id);
    }

    #[tokio::test]
    async fn test_upsert_twice_does_not_duplicate_rows() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&two_item_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let first = fx.service.get_log(log.id).await.unwrap();

        let again = fx
            .service
            .upsert_log(&UpsertWorkoutLog::from(&first), "user1")
            .await
            .unwrap();
        assert_eq!(again.id, log.id);

        let second = fx.service.get_log(log.id).await.unwrap();
        assert_eq!(set_ids(&second), set_ids(&first));
        assert_eq!(second.sections[0].section.item_ids, first.sections[0].section.item_ids);

        assert_eq!(count(&fx.db.pool, "workout_logs").await, 1);
        assert_eq!(count(&fx.db.pool, "log_sections").await, 1);
        assert_eq!(count(&fx.db.pool, "section_items").await, 2);
        assert_eq!(count(&fx.db.pool, "log_sets").await, 4);
    }

    #[tokio::test]
    async fn test_child_order_follows_id_list() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&two_item_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let populated = fx.service.get_log(log.id).await.unwrap();

        let mut input = UpsertWorkoutLog::from(&populated);
        input.sections[0].items.reverse();
        fx.service.upsert_log(&input, "user1").await.unwrap();

        let reordered = fx.service.get_log(log.id).await.unwrap();
        let names: Vec<&str> = reordered.sections[0]
            .items
            .iter()
            .map(|i| i.item.name.as_str())
            .collect();
        assert_eq!(names, vec!["Lunge", "Squat"]);
    }

    #[tokio::test]
    async fn test_upsert_prunes_dropped_children() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&two_item_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let populated = fx.service.get_log(log.id).await.unwrap();
        let dropped_item = populated.sections[0].items[1].item.id;
        let dropped_set = populated.sections[0].items[0].sets[1].id;

        let mut input = UpsertWorkoutLog::from(&populated);
        input.sections[0].items.pop();
        input.sections[0].items[0].sets.pop();
        fx.service.upsert_log(&input, "user1").await.unwrap();

        let mut conn = fx.db.pool.acquire().await.unwrap();
        assert!(item_store::find_by_id(&mut conn, dropped_item)
            .await
            .unwrap()
            .is_none());
        assert!(set_store::find_by_id(&mut conn, dropped_set)
            .await
            .unwrap()
            .is_none());
        assert_eq!(count(&fx.db.pool, "section_items").await, 1);
        assert_eq!(count(&fx.db.pool, "log_sets").await, 1);
    }

    #[tokio::test]
    async fn test_item_name_is_snapshot() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&warmup_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let populated = fx.service.get_log(log.id).await.unwrap();

        let mut input = UpsertWorkoutLog::from(&populated);
        input.sections[0].items[0].name = Some("Goblet Squat".to_string());
        fx.service.upsert_log(&input, "user1").await.unwrap();

        let reread = fx.service.get_log(log.id).await.unwrap();
        assert_eq!(reread.sections[0].items[0].item.name, "Air Squat");
    }

    #[tokio::test]
    async fn test_get_log_missing_is_not_found() {
        let fx = setup().await;

        let err = fx.service.get_log(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_log_drops_unresolved_descendants() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&warmup_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let populated = fx.service.get_log(log.id).await.unwrap();
        let gone = populated.sections[0].items[0].sets[0].id;

        let mut conn = fx.db.pool.acquire().await.unwrap();
        assert!(set_store::delete(&mut conn, gone).await.unwrap());

        let reread = fx.service.get_log(log.id).await.unwrap();
        let item = &reread.sections[0].items[0];
        assert_eq!(item.item.set_ids.len(), 2);
        assert_eq!(item.sets.len(), 1);
        assert_eq!(item.sets[0].target_reps, Some(8));
    }

    #[tokio::test]
    async fn test_unknown_exercise_rolls_back_whole_upsert() {
        let fx = setup().await;

        let mut input = warmup_log(Uuid::new_v4());
        let log_id = Uuid::new_v4();
        input.id = Some(log_id);

        let err = fx.service.upsert_log(&input, "user1").await.unwrap_err();
        assert!(matches!(err, LogError::ReferentialViolation(_)));

        assert!(fx.service.get_log(log_id).await.unwrap_err().is_not_found());
        assert_eq!(count(&fx.db.pool, "log_sets").await, 0);
    }

    #[tokio::test]
    async fn test_warmup_scenario_cascades_on_last_set() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&warmup_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let ids = set_ids(&fx.service.get_log(log.id).await.unwrap());

        let first = fx
            .service
            .complete_set(ids[0], &AchievedValues::reps(10))
            .await
            .unwrap();
        assert_eq!(first.achieved_reps, Some(10));
        assert!(first.completed_at.is_some());

        let midway = fx.service.get_log(log.id).await.unwrap();
        assert!(midway.sections[0].items[0].item.completed_at.is_none());
        assert!(midway.sections[0].section.completed_at.is_none());
        assert!(midway.log.completed_at.is_none());

        let second = fx
            .service
            .complete_set(ids[1], &AchievedValues::reps(8))
            .await
            .unwrap();
        let second_at = second.completed_at.unwrap();

        let done = fx.service.get_log(log.id).await.unwrap();
        let item_at = done.sections[0].items[0].item.completed_at.unwrap();
        let section_at = done.sections[0].section.completed_at.unwrap();
        let log_at = done.log.completed_at.unwrap();
        assert!(item_at >= second_at);
        assert!(section_at >= second_at);
        assert!(log_at >= second_at);
        assert_eq!(done.sections[0].items[0].sets[1].achieved_reps, Some(8));
    }

    #[tokio::test]
    async fn test_item_not_complete_until_last_of_n_sets() {
        let fx = setup().await;

        let input = UpsertWorkoutLog::new("Conditioning").with_section(
            UpsertSection::new("Circuit", SectionType::Conditioning).with_item(
                UpsertSectionItem::new(fx.exercise_id, "Burpee")
                    .with_set(UpsertSet::reps(10))
                    .with_set(UpsertSet::reps(10))
                    .with_set(UpsertSet::reps(10)),
            ),
        );
        let log = fx.service.upsert_log(&input, "user1").await.unwrap();
        let ids = set_ids(&fx.service.get_log(log.id).await.unwrap());

        for set_id in &ids[..2] {
            fx.service
                .complete_set(*set_id, &AchievedValues::default())
                .await
                .unwrap();
            let populated = fx.service.get_log(log.id).await.unwrap();
            assert!(populated.sections[0].items[0].item.completed_at.is_none());
        }

        fx.service
            .complete_set(ids[2], &AchievedValues::default())
            .await
            .unwrap();
        let populated = fx.service.get_log(log.id).await.unwrap();
        assert!(populated.sections[0].items[0].item.completed_at.is_some());
        assert!(populated.log.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_section_stays_open_while_sibling_item_pending() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&two_item_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let populated = fx.service.get_log(log.id).await.unwrap();
        let first_item_sets: Vec<Uuid> = populated.sections[0].items[0]
            .sets
            .iter()
            .map(|s| s.id)
            .collect();

        for set_id in first_item_sets {
            fx.service
                .complete_set(set_id, &AchievedValues::reps(5))
                .await
                .unwrap();
        }

        let populated = fx.service.get_log(log.id).await.unwrap();
        assert!(populated.sections[0].items[0].item.completed_at.is_some());
        assert!(populated.sections[0].items[1].item.completed_at.is_none());
        assert!(populated.sections[0].section.completed_at.is_none());
        assert!(populated.log.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_skip_counts_as_done() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&warmup_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let ids = set_ids(&fx.service.get_log(log.id).await.unwrap());

        fx.service
            .complete_set(ids[0], &AchievedValues::reps(10))
            .await
            .unwrap();
        let skipped = fx.service.skip_sets(&ids[1..]).await.unwrap();
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].skipped);
        assert!(skipped[0].completed_at.is_none());

        let populated = fx.service.get_log(log.id).await.unwrap();
        assert!(populated.sections[0].items[0].item.completed_at.is_some());
        assert!(populated.sections[0].section.completed_at.is_some());
        assert!(populated.log.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_skip_sets_returns_input_order() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&two_item_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let mut ids = set_ids(&fx.service.get_log(log.id).await.unwrap());
        ids.reverse();

        let skipped = fx.service.skip_sets(&ids).await.unwrap();
        assert_eq!(skipped.iter().map(|s| s.id).collect::<Vec<_>>(), ids);

        let populated = fx.service.get_log(log.id).await.unwrap();
        assert!(populated.log.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_skip_sets_unknown_id_applies_nothing() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&warmup_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let ids = set_ids(&fx.service.get_log(log.id).await.unwrap());

        let err = fx
            .service
            .skip_sets(&[ids[0], Uuid::new_v4()])
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let first = fx.service.get_set(ids[0]).await.unwrap();
        assert!(!first.skipped);
    }

    #[tokio::test]
    async fn test_complete_missing_set_is_not_found() {
        let fx = setup().await;

        let err = fx
            .service
            .complete_set(Uuid::new_v4(), &AchievedValues::reps(1))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_recompleting_set_refreshes_values() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&warmup_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let ids = set_ids(&fx.service.get_log(log.id).await.unwrap());

        let first = fx
            .service
            .complete_set(ids[0], &AchievedValues::reps(6))
            .await
            .unwrap();
        let again = fx
            .service
            .complete_set(ids[0], &AchievedValues::reps(7))
            .await
            .unwrap();

        assert_eq!(again.achieved_reps, Some(7));
        assert!(again.completed_at >= first.completed_at);
    }

    #[tokio::test]
    async fn test_upsert_derives_completion_from_sets() {
        let fx = setup().await;

        let mut input = warmup_log(fx.exercise_id);
        let done_at = Utc::now();
        input.sections[0].items[0].sets[0].completed_at = Some(done_at);
        input.sections[0].items[0].sets[1].skipped = true;

        let log = fx.service.upsert_log(&input, "user1").await.unwrap();
        assert!(log.completed_at.is_some());

        let populated = fx.service.get_log(log.id).await.unwrap();
        assert!(populated.sections[0].items[0].item.completed_at.is_some());
        assert_eq!(
            populated.sections[0].items[0].sets[0].completed_at,
            Some(done_at)
        );
    }

    #[tokio::test]
    async fn test_adding_pending_set_reopens_completed_parents() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&warmup_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let ids = set_ids(&fx.service.get_log(log.id).await.unwrap());
        fx.service.skip_sets(&ids).await.unwrap();

        let completed = fx.service.get_log(log.id).await.unwrap();
        assert!(completed.log.completed_at.is_some());

        let mut input = UpsertWorkoutLog::from(&completed);
        input.sections[0].items[0].sets.push(UpsertSet::reps(6));
        let reopened = fx.service.upsert_log(&input, "user1").await.unwrap();
        assert!(reopened.completed_at.is_none());

        let populated = fx.service.get_log(log.id).await.unwrap();
        assert!(populated.sections[0].items[0].item.completed_at.is_none());
        assert!(populated.sections[0].section.completed_at.is_none());
        assert_eq!(populated.sections[0].items[0].sets.len(), 3);
    }

    #[tokio::test]
    async fn test_upsert_keeps_existing_completion_timestamp() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&warmup_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let ids = set_ids(&fx.service.get_log(log.id).await.unwrap());
        fx.service.skip_sets(&ids).await.unwrap();
        let completed = fx.service.get_log(log.id).await.unwrap();

        let rewritten = fx
            .service
            .upsert_log(&UpsertWorkoutLog::from(&completed), "user1")
            .await
            .unwrap();
        assert_eq!(rewritten.completed_at, completed.log.completed_at);
    }

    #[tokio::test]
    async fn test_empty_item_is_never_complete() {
        let fx = setup().await;

        let input = UpsertWorkoutLog::new("Rest Day").with_section(
            UpsertSection::new("Mobility", SectionType::Mobility)
                .with_item(UpsertSectionItem::new(fx.exercise_id, "Air Squat")),
        );
        let log = fx.service.upsert_log(&input, "user1").await.unwrap();
        assert!(log.completed_at.is_none());

        let populated = fx.service.get_log(log.id).await.unwrap();
        assert!(populated.sections[0].items[0].item.completed_at.is_none());
        assert!(populated.sections[0].items[0].sets.is_empty());
    }

    #[tokio::test]
    async fn test_list_and_delete_logs() {
        let fx = setup().await;

        let kept = fx
            .service
            .upsert_log(&warmup_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let removed = fx
            .service
            .upsert_log(&two_item_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        fx.service
            .upsert_log(&warmup_log(fx.exercise_id), "user2")
            .await
            .unwrap();

        assert_eq!(fx.service.list_logs("user1").await.unwrap().len(), 2);

        fx.service.delete_log(removed.id).await.unwrap();
        let remaining = fx.service.list_logs("user1").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept.id);

        assert_eq!(count(&fx.db.pool, "section_items").await, 2);
        assert_eq!(count(&fx.db.pool, "log_sets").await, 4);

        let err = fx.service.delete_log(removed.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    async fn overwrite_set_ids(pool: &SqlitePool, item_id: Uuid, ids: &[Uuid]) {
        sqlx::query("UPDATE section_items SET set_ids = ? WHERE id = ?")
            .bind(crate::db::encode_id_list(ids))
            .bind(item_id.to_string())
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reused_set_id_moves_set_to_new_item() {
        let fx = setup().await;

        let first = fx
            .service
            .upsert_log(&warmup_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let moved = fx.service.get_log(first.id).await.unwrap().sections[0].items[0].sets[0].id;

        let mut input = warmup_log(fx.exercise_id);
        input.items_mut().next().unwrap().sets[0].id = Some(moved);
        let second = fx.service.upsert_log(&input, "user1").await.unwrap();

        let first = fx.service.get_log(first.id).await.unwrap();
        let second = fx.service.get_log(second.id).await.unwrap();
        assert!(!set_ids(&first).contains(&moved));
        assert!(!first.sections[0].items[0].item.set_ids.contains(&moved));
        assert_eq!(first.sets().count(), 1);
        assert!(set_ids(&second).contains(&moved));
        assert_eq!(count(&fx.db.pool, "log_sets").await, 3);
    }

    #[tokio::test]
    async fn test_reused_item_and_section_ids_leave_old_log() {
        let fx = setup().await;

        let legs = fx
            .service
            .upsert_log(&two_item_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let populated = fx.service.get_log(legs.id).await.unwrap();
        let section_id = populated.sections[0].section.id;
        let item_id = populated.sections[0].items[0].item.id;

        let mut input = warmup_log(fx.exercise_id);
        input.items_mut().next().unwrap().id = Some(item_id);
        let morning = fx.service.upsert_log(&input, "user1").await.unwrap();

        let legs_now = fx.service.get_log(legs.id).await.unwrap();
        assert_eq!(legs_now.sections[0].section.item_ids.len(), 1);
        assert_eq!(legs_now.sections[0].items.len(), 1);
        assert_ne!(legs_now.sections[0].items[0].item.id, item_id);
        let morning = fx.service.get_log(morning.id).await.unwrap();
        assert_eq!(morning.sections[0].items[0].item.id, item_id);

        let mut input = warmup_log(fx.exercise_id);
        input.sections[0].id = Some(section_id);
        let evening = fx.service.upsert_log(&input, "user1").await.unwrap();

        let legs_now = fx.service.get_log(legs.id).await.unwrap();
        assert!(legs_now.log.section_ids.is_empty());
        assert!(legs_now.sections.is_empty());
        let evening = fx.service.get_log(evening.id).await.unwrap();
        assert_eq!(evening.sections[0].section.id, section_id);
    }

    #[tokio::test]
    async fn test_get_log_skips_children_owned_by_another_parent() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&two_item_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let populated = fx.service.get_log(log.id).await.unwrap();
        let squat = &populated.sections[0].items[0];
        let lunge = &populated.sections[0].items[1];

        let mut ids = squat.item.set_ids.clone();
        ids.push(lunge.sets[0].id);
        overwrite_set_ids(&fx.db.pool, squat.item.id, &ids).await;

        let populated = fx.service.get_log(log.id).await.unwrap();
        assert_eq!(populated.sections[0].items[0].sets.len(), 2);
        assert_eq!(populated.sections[0].items[1].sets.len(), 2);
        assert_eq!(populated.sets().count(), 4);
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_rejected() {
        let fx = setup().await;

        let repeated = Uuid::new_v4();
        let mut input = warmup_log(fx.exercise_id);
        for set in &mut input.items_mut().next().unwrap().sets {
            set.id = Some(repeated);
        }
        let err = fx.service.upsert_log(&input, "user1").await.unwrap_err();
        assert!(matches!(err, LogError::DuplicateId { entity: "set", id } if id == repeated));

        let mut input = two_item_log(fx.exercise_id);
        for item in input.items_mut() {
            item.id = Some(repeated);
        }
        let err = fx.service.upsert_log(&input, "user1").await.unwrap_err();
        assert!(matches!(err, LogError::DuplicateId { entity: "section item", .. }));

        assert_eq!(count(&fx.db.pool, "workout_logs").await, 0);
        assert_eq!(count(&fx.db.pool, "log_sets").await, 0);
    }

    #[tokio::test]
    async fn test_unresolved_set_id_keeps_item_pending() {
        let fx = setup().await;

        let log = fx
            .service
            .upsert_log(&warmup_log(fx.exercise_id), "user1")
            .await
            .unwrap();
        let populated = fx.service.get_log(log.id).await.unwrap();
        let item = &populated.sections[0].items[0];

        let mut ids = item.item.set_ids.clone();
        ids.push(Uuid::new_v4());
        overwrite_set_ids(&fx.db.pool, item.item.id, &ids).await;

        for set in &item.sets {
            fx.service
                .complete_set(set.id, &AchievedValues::reps(10))
                .await
                .unwrap();
        }

        let populated = fx.service.get_log(log.id).await.unwrap();
        assert_eq!(populated.sets().filter(|s| s.is_done()).count(), 2);
        assert!(populated.sections[0].items[0].item.completed_at.is_none());
        assert!(populated.log.completed_at.is_none());
    }

    #[test]
    fn test_derive_completion() {
        let now = Utc::now();
        let earlier = now - chrono::Duration::minutes(5);

        assert_eq!(derive_completion(None, &[], now), None);
        assert_eq!(derive_completion(None, &[true, false], now), None);
        assert_eq!(derive_completion(Some(earlier), &[true, false], now), None);
        assert_eq!(derive_completion(None, &[true, true], now), Some(now));
        assert_eq!(
            derive_completion(Some(earlier), &[true, true], now),
            Some(earlier)
        );
    }
}
