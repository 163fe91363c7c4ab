//! The schedule workflow: create, update, logical delete, bulk create,
//! search and per-entity listings.
//!
//! Every write goes through the same steps: structural validation, reference
//! checks against the directory, then the conflict policy against the active
//! schedules of the record's term.

use chrono::{NaiveTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::conflicts::{describe_conflicts, term_snapshot, ConflictDetail};
use super::error::{or_not_found, ScheduleError, ScheduleResult};
use crate::db::{FullRepository, ScheduleFilter, ScheduleQuery};
use crate::models::{
    AcademicTerm, ClassRoomId, DayOfWeek, ScheduleDraft, ScheduleId, ScheduleRecord,
    SubjectId, TeacherId, TimeRange,
};
use crate::scheduler::find_conflicts;

pub const MAX_NOTES_CHARS: usize = 500;
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

fn default_true() -> bool {
    true
}

/// Request body for creating one schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub class_room_id: ClassRoomId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub academic_year: String,
    pub semester: u8,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to active.
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Store without looking for conflicts at all.
    #[serde(default)]
    pub skip_conflict_check: bool,
    /// Store despite conflicts, returning them as warnings.
    #[serde(default)]
    pub allow_overlap: bool,
}

impl CreateScheduleRequest {
    pub fn to_draft(&self) -> ScheduleDraft {
        ScheduleDraft {
            class_room_id: self.class_room_id,
            subject_id: self.subject_id,
            teacher_id: self.teacher_id,
            range: TimeRange::new(
                self.day_of_week,
                self.start_time,
                self.end_time,
                AcademicTerm::new(self.academic_year.clone(), self.semester),
            ),
            is_active: self.is_active.unwrap_or(true),
            notes: self.notes.clone(),
        }
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        ConflictPolicy {
            skip_conflict_check: self.skip_conflict_check,
            allow_overlap: self.allow_overlap,
        }
    }
}

/// Partial edit of a stored schedule. Unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    #[serde(default)]
    pub class_room_id: Option<ClassRoomId>,
    #[serde(default)]
    pub subject_id: Option<SubjectId>,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    #[serde(default)]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub semester: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub skip_conflict_check: bool,
    #[serde(default)]
    pub allow_overlap: bool,
}

impl UpdateScheduleRequest {
    /// The draft obtained by applying this edit to `current`.
    pub fn merge_over(&self, current: &ScheduleRecord) -> ScheduleDraft {
        let term = current.term();
        ScheduleDraft {
            class_room_id: self.class_room_id.unwrap_or(current.class_room_id),
            subject_id: self.subject_id.unwrap_or(current.subject_id),
            teacher_id: self.teacher_id.unwrap_or(current.teacher_id),
            range: TimeRange::new(
                self.day_of_week.unwrap_or(current.day_of_week()),
                self.start_time.unwrap_or(current.start_time()),
                self.end_time.unwrap_or(current.end_time()),
                AcademicTerm::new(
                    self.academic_year
                        .clone()
                        .unwrap_or_else(|| term.academic_year.clone()),
                    self.semester.unwrap_or(term.semester),
                ),
            ),
            is_active: self.is_active.unwrap_or(current.is_active),
            notes: self.notes.clone().or_else(|| current.notes.clone()),
        }
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        ConflictPolicy {
            skip_conflict_check: self.skip_conflict_check,
            allow_overlap: self.allow_overlap,
        }
    }
}

/// Several creations in one request.
///
/// The batch-level conflict flags replace the flags of every item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkScheduleRequest {
    pub schedules: Vec<CreateScheduleRequest>,
    /// `true`: all-or-nothing. `false`: each item stands on its own.
    #[serde(default = "default_true")]
    pub stop_on_first_error: bool,
    #[serde(default)]
    pub skip_conflict_check: bool,
    #[serde(default)]
    pub allow_overlap: bool,
}

/// What to do with conflicts found for a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConflictPolicy {
    pub skip_conflict_check: bool,
    pub allow_overlap: bool,
}

/// A stored schedule plus the conflicts tolerated under `allow_overlap`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    pub schedule: ScheduleRecord,
    #[serde(default)]
    pub warnings: Vec<ConflictDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkItemResult {
    /// Zero-based position in the request.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ConflictDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkItemResult {
    pub fn is_success(&self) -> bool {
        self.schedule.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BulkItemResult>,
}

impl BulkOutcome {
    fn from_results(results: Vec<BulkItemResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }
}

/// Zero-based page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> usize {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.limit())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePage {
    pub content: Vec<ScheduleRecord>,
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
}

/// Structural checks that do not need the repository.
pub fn validate_draft(draft: &ScheduleDraft) -> ScheduleResult<()> {
    if !draft.range.is_well_formed() {
        return Err(ScheduleError::validation(
            "Invalid time slot: start time must be before end time",
        ));
    }
    draft.range.term.validate().map_err(ScheduleError::Validation)?;
    if let Some(notes) = &draft.notes {
        if notes.chars().count() > MAX_NOTES_CHARS {
            return Err(ScheduleError::validation(format!(
                "Notes must not exceed {} characters",
                MAX_NOTES_CHARS
            )));
        }
    }
    Ok(())
}

async fn ensure_references<R: FullRepository + ?Sized>(
    repo: &R,
    draft: &ScheduleDraft,
) -> ScheduleResult<()> {
    repo.get_class_room(draft.class_room_id)
        .await
        .map_err(or_not_found("ClassRoom", draft.class_room_id.value()))?;
    repo.get_subject(draft.subject_id)
        .await
        .map_err(or_not_found("Subject", draft.subject_id.value()))?;
    repo.get_teacher(draft.teacher_id)
        .await
        .map_err(or_not_found("Teacher", draft.teacher_id.value()))?;
    Ok(())
}

/// Run the checker for `draft` and apply `policy`.
///
/// Returns the conflicts to report as warnings, or
/// [`ScheduleError::Conflicts`] when they block the write. Inactive drafts
/// never conflict.
async fn apply_conflict_policy<R: FullRepository + ?Sized>(
    repo: &R,
    draft: &ScheduleDraft,
    snapshot: &[ScheduleRecord],
    exclude_id: Option<ScheduleId>,
    policy: ConflictPolicy,
) -> ScheduleResult<Vec<ConflictDetail>> {
    if policy.skip_conflict_check || !draft.is_active {
        return Ok(Vec::new());
    }

    let conflicts = find_conflicts(draft, snapshot, exclude_id);
    if conflicts.is_empty() {
        return Ok(Vec::new());
    }

    let details = describe_conflicts(repo, conflicts, snapshot).await?;
    if policy.allow_overlap {
        warn!(
            "Storing schedule despite {} conflicts (overlap allowed)",
            details.len()
        );
        Ok(details)
    } else {
        Err(ScheduleError::Conflicts(details))
    }
}

pub async fn create_schedule<R: FullRepository + ?Sized>(
    repo: &R,
    request: &CreateScheduleRequest,
) -> ScheduleResult<ScheduleOutcome> {
    info!(
        "Creating new schedule for class room: {}, subject: {}, teacher: {}",
        request.class_room_id, request.subject_id, request.teacher_id
    );

    let draft = request.to_draft();
    validate_draft(&draft)?;
    ensure_references(repo, &draft).await?;

    let snapshot = term_snapshot(repo, &draft.range.term).await?;
    let warnings =
        apply_conflict_policy(repo, &draft, &snapshot, None, request.conflict_policy()).await?;

    let schedule = repo.store_schedule(&draft).await?;
    info!("Schedule created successfully with id: {}", schedule.id);
    Ok(ScheduleOutcome { schedule, warnings })
}

pub async fn update_schedule<R: FullRepository + ?Sized>(
    repo: &R,
    id: ScheduleId,
    request: &UpdateScheduleRequest,
) -> ScheduleResult<ScheduleOutcome> {
    info!("Updating schedule with id: {}", id);

    let current = repo
        .get_schedule(id)
        .await
        .map_err(or_not_found("Schedule", id.value()))?;
    let draft = request.merge_over(&current);
    validate_draft(&draft)?;
    ensure_references(repo, &draft).await?;

    let snapshot = if draft.is_active {
        term_snapshot(repo, &draft.range.term).await?
    } else {
        Vec::new()
    };
    let warnings =
        apply_conflict_policy(repo, &draft, &snapshot, Some(id), request.conflict_policy())
            .await?;

    let schedule = repo
        .update_schedule(id, &draft)
        .await
        .map_err(or_not_found("Schedule", id.value()))?;
    info!("Schedule updated successfully: {}", id);
    Ok(ScheduleOutcome { schedule, warnings })
}

/// Logical delete: the record stays retrievable with `is_active = false`.
pub async fn delete_schedule<R: FullRepository + ?Sized>(
    repo: &R,
    id: ScheduleId,
) -> ScheduleResult<ScheduleRecord> {
    info!("Deleting schedule with id: {}", id);
    let record = repo
        .set_schedule_active(id, false)
        .await
        .map_err(or_not_found("Schedule", id.value()))?;
    Ok(record)
}

pub async fn get_schedule<R: FullRepository + ?Sized>(
    repo: &R,
    id: ScheduleId,
) -> ScheduleResult<ScheduleRecord> {
    repo.get_schedule(id)
        .await
        .map_err(or_not_found("Schedule", id.value()))
}

pub async fn search_schedules<R: FullRepository + ?Sized>(
    repo: &R,
    filter: &ScheduleFilter,
    page: PageRequest,
) -> ScheduleResult<SchedulePage> {
    let limit = page.limit();
    let (content, total) = repo.search_schedules(filter, page.offset(), limit).await?;
    Ok(SchedulePage {
        content,
        page: page.page,
        size: limit,
        total_elements: total,
        total_pages: total.div_ceil(limit),
    })
}

pub async fn schedules_by_class_room<R: FullRepository + ?Sized>(
    repo: &R,
    class_room_id: ClassRoomId,
    term: &AcademicTerm,
) -> ScheduleResult<Vec<ScheduleRecord>> {
    term.validate().map_err(ScheduleError::Validation)?;
    repo.get_class_room(class_room_id)
        .await
        .map_err(or_not_found("ClassRoom", class_room_id.value()))?;
    Ok(repo
        .list_schedules_for_term(term, &ScheduleQuery::for_class_room(class_room_id))
        .await?)
}

pub async fn schedules_by_teacher<R: FullRepository + ?Sized>(
    repo: &R,
    teacher_id: TeacherId,
    term: &AcademicTerm,
) -> ScheduleResult<Vec<ScheduleRecord>> {
    term.validate().map_err(ScheduleError::Validation)?;
    repo.get_teacher(teacher_id)
        .await
        .map_err(or_not_found("Teacher", teacher_id.value()))?;
    Ok(repo
        .list_schedules_for_term(term, &ScheduleQuery::for_teacher(teacher_id))
        .await?)
}

pub async fn schedules_by_subject<R: FullRepository + ?Sized>(
    repo: &R,
    subject_id: SubjectId,
    term: &AcademicTerm,
) -> ScheduleResult<Vec<ScheduleRecord>> {
    term.validate().map_err(ScheduleError::Validation)?;
    repo.get_subject(subject_id)
        .await
        .map_err(or_not_found("Subject", subject_id.value()))?;
    Ok(repo
        .list_schedules_for_term(term, &ScheduleQuery::for_subject(subject_id))
        .await?)
}

/// Id standing in for item `index` of a batch until the batch is stored.
///
/// Provisional ids are negative: item 1 is `-1`, item 2 is `-2`.
fn provisional_id(index: usize) -> ScheduleId {
    ScheduleId::new(-(index as i64) - 1)
}

fn provisional_record(index: usize, draft: &ScheduleDraft) -> ScheduleRecord {
    ScheduleRecord {
        id: provisional_id(index),
        class_room_id: draft.class_room_id,
        subject_id: draft.subject_id,
        teacher_id: draft.teacher_id,
        range: draft.range.clone(),
        is_active: draft.is_active,
        notes: draft.notes.clone(),
        created_at: Utc::now(),
        updated_at: None,
    }
}

/// Checks one batch item against the stored schedules of its term followed
/// by the items accepted before it.
async fn prepare_bulk_item<R: FullRepository + ?Sized>(
    repo: &R,
    draft: &ScheduleDraft,
    snapshots: &mut HashMap<AcademicTerm, Vec<ScheduleRecord>>,
    accepted: &[ScheduleRecord],
    policy: ConflictPolicy,
) -> ScheduleResult<Vec<ConflictDetail>> {
    validate_draft(draft)?;
    ensure_references(repo, draft).await?;

    if !snapshots.contains_key(&draft.range.term) {
        let snapshot = term_snapshot(repo, &draft.range.term).await?;
        snapshots.insert(draft.range.term.clone(), snapshot);
    }
    let existing: Vec<ScheduleRecord> = snapshots
        .get(&draft.range.term)
        .into_iter()
        .flatten()
        .chain(accepted.iter().filter(|r| r.term() == &draft.range.term))
        .cloned()
        .collect();

    apply_conflict_policy(repo, draft, &existing, None, policy).await
}

/// Replace provisional ids in `warnings` with the ids the batch got on store.
fn resolve_provisional_ids(warnings: &mut [ConflictDetail], stored: &[ScheduleRecord]) {
    for detail in warnings {
        let id = detail.conflict.existing_schedule_id.value();
        if id >= 0 {
            continue;
        }
        if let Some(record) = stored.get((-id - 1) as usize) {
            detail.conflict.existing_schedule_id = record.id;
        }
    }
}

/// Create several schedules.
///
/// With `stop_on_first_error` every item is checked, in order, against the
/// stored schedules and the items before it; the first failure aborts the
/// batch with [`ScheduleError::BulkAborted`] and nothing is stored. A
/// conflict with an earlier item of the batch names it by provisional id
/// (`-1` for the first item) in an aborted batch, and by its stored id in
/// the warnings of a stored one.
///
/// Otherwise each item is created on its own and the outcome lists a
/// success or an error message per item.
pub async fn bulk_create_schedules<R: FullRepository + ?Sized>(
    repo: &R,
    request: &BulkScheduleRequest,
) -> ScheduleResult<BulkOutcome> {
    info!(
        "Creating {} schedules in bulk (stop on first error: {})",
        request.schedules.len(),
        request.stop_on_first_error
    );

    let items: Vec<CreateScheduleRequest> = request
        .schedules
        .iter()
        .map(|item| CreateScheduleRequest {
            skip_conflict_check: request.skip_conflict_check,
            allow_overlap: request.allow_overlap,
            ..item.clone()
        })
        .collect();

    if request.stop_on_first_error {
        bulk_all_or_nothing(repo, &items).await
    } else {
        Ok(bulk_each(repo, &items).await)
    }
}

async fn bulk_all_or_nothing<R: FullRepository + ?Sized>(
    repo: &R,
    items: &[CreateScheduleRequest],
) -> ScheduleResult<BulkOutcome> {
    let mut snapshots = HashMap::new();
    let mut drafts: Vec<ScheduleDraft> = Vec::with_capacity(items.len());
    let mut accepted: Vec<ScheduleRecord> = Vec::with_capacity(items.len());
    let mut warnings = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let draft = item.to_draft();
        match prepare_bulk_item(repo, &draft, &mut snapshots, &accepted, item.conflict_policy())
            .await
        {
            Ok(item_warnings) => {
                accepted.push(provisional_record(index, &draft));
                drafts.push(draft);
                warnings.push(item_warnings);
            }
            Err(source) => {
                warn!("Bulk creation aborted at item {}: {}", index + 1, source);
                return Err(ScheduleError::BulkAborted {
                    index,
                    source: Box::new(source),
                });
            }
        }
    }

    let stored = repo.store_schedules(&drafts).await?;
    info!("Stored {} schedules in one batch", stored.len());

    for item_warnings in &mut warnings {
        resolve_provisional_ids(item_warnings, &stored);
    }

    let results = stored
        .into_iter()
        .zip(warnings)
        .enumerate()
        .map(|(index, (schedule, warnings))| BulkItemResult {
            index,
            schedule: Some(schedule),
            warnings,
            error: None,
        })
        .collect();
    Ok(BulkOutcome::from_results(results))
}

async fn bulk_each<R: FullRepository + ?Sized>(
    repo: &R,
    items: &[CreateScheduleRequest],
) -> BulkOutcome {
    let mut results = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let result = match create_schedule(repo, item).await {
            Ok(outcome) => BulkItemResult {
                index,
                schedule: Some(outcome.schedule),
                warnings: outcome.warnings,
                error: None,
            },
            Err(e) => {
                let message = format!("Error creating schedule {}: {}", index + 1, e);
                warn!("{}", message);
                BulkItemResult {
                    index,
                    schedule: None,
                    warnings: Vec::new(),
                    error: Some(message),
                }
            }
        };
        results.push(result);
    }

    let outcome = BulkOutcome::from_results(results);
    info!(
        "Bulk creation finished: {} succeeded, {} failed",
        outcome.succeeded, outcome.failed
    );
    outcome
}

#[cfg(test)]
#[path = "schedules_tests.rs"]
mod schedules_tests;
