use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::clock::{millis_to_datetime, Clock};
use crate::error::Result;
use crate::keys;
use crate::manager::LearningManager;
use crate::store::{StoredValue, UserScope};
use crate::types::{ReviewEntry, ReviewKind, StudyType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewSchedule {
    pub next_due_at: i64,
    pub interval_ms: i64,
}

impl ReviewSchedule {
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.next_due_at)
    }
}

impl LearningManager {
    pub(crate) fn schedule_review_in(
        &self,
        scope: &UserScope<'_>,
        item: &str,
        study_type: StudyType,
        is_correct: bool,
    ) -> Result<i64> {
        let now = self.clock().now_millis();
        let config = self.config();

        let next_due_at = if is_correct {
            let interval_key = keys::review_interval(study_type, item);
            let previous = scope.get_long(&interval_key, config.base_interval_ms)?;
            let next = previous.saturating_mul(2).min(config.max_interval_ms);
            scope.set_long(&interval_key, next)?;
            now + next
        } else {
            now + config.base_interval_ms
        };

        scope.set_long(&keys::review_schedule(study_type, item), next_due_at)?;
        debug!(item, study_type = %study_type, is_correct, next_due_at, "Scheduled review");
        Ok(next_due_at)
    }

    /// Moves the item's next review date according to the answer. Returns the new due time in epoch millis.
    pub fn schedule_review(&self, item: &str, study_type: StudyType, is_correct: bool) -> Result<i64> {
        self.locked(|scope| self.schedule_review_in(scope, item, study_type, is_correct))
    }

    pub fn answer_item(&self, item: &str, study_type: StudyType, is_correct: bool) -> Result<i64> {
        self.locked(|scope| {
            self.record_outcome_in(scope, item, study_type, is_correct)?;
            self.schedule_review_in(scope, item, study_type, is_correct)
        })
    }

    pub fn review_schedule(&self, item: &str, study_type: StudyType) -> Result<Option<ReviewSchedule>> {
        let scope = self.scope();
        let Some(next_due_at) = scope.get_long_opt(&keys::review_schedule(study_type, item))? else {
            return Ok(None);
        };
        let interval_ms = scope.get_long(
            &keys::review_interval(study_type, item),
            self.config().base_interval_ms,
        )?;
        Ok(Some(ReviewSchedule {
            next_due_at,
            interval_ms,
        }))
    }

    pub fn due_items(&self, study_type: StudyType) -> Result<Vec<String>> {
        let now = self.clock().now_millis();
        Ok(self
            .scope()
            .entries_with_prefix(&keys::review_schedule_prefix(study_type))?
            .into_iter()
            .filter_map(|(item, value)| match value {
                StoredValue::Long(due) if due <= now => Some(item),
                _ => None,
            })
            .collect())
    }

    /// Counts a wrong answer to `question_id`; at the threshold it joins the review list.
    pub fn record_mistake(&self, question_id: &str) -> Result<i32> {
        self.locked(|scope| {
            let key = keys::mistake_count(question_id);
            let count = scope.get_int(&key, 0)?.saturating_add(1);
            scope.set_int(&key, count)?;

            if count >= self.config().mistake_threshold {
                let mut review_list = scope.get_string_set(keys::REVIEW_LIST)?;
                if review_list.insert(question_id.to_string()) {
                    info!(question_id, mistakes = count, "Added question to review list");
                    scope.set_string_set(keys::REVIEW_LIST, review_list)?;
                }
            }
            Ok(count)
        })
    }

    pub fn mistake_count(&self, question_id: &str) -> Result<i32> {
        self.scope().get_int(&keys::mistake_count(question_id), 0)
    }

    pub fn review_list(&self) -> Result<BTreeSet<String>> {
        self.scope().get_string_set(keys::REVIEW_LIST)
    }

    pub fn remove_from_review_list(&self, question_id: &str) -> Result<()> {
        self.locked(|scope| {
            let mut review_list = scope.get_string_set(keys::REVIEW_LIST)?;
            if review_list.remove(question_id) {
                scope.set_string_set(keys::REVIEW_LIST, review_list)?;
            }
            Ok(())
        })
    }

    /// Everything to go through in a review session: due words, due grammar,
    /// then questions from the mistake list.
    pub fn review_queue(&self) -> Result<Vec<ReviewEntry>> {
        let mut queue = Vec::new();
        for study_type in StudyType::ALL {
            queue.extend(self.due_items(study_type)?.into_iter().map(|content| ReviewEntry {
                kind: study_type.into(),
                content,
            }));
        }
        queue.extend(self.review_list()?.into_iter().map(|content| ReviewEntry {
            kind: ReviewKind::Mistake,
            content,
        }));
        Ok(queue)
    }

    pub fn complete_review(&self, entry: &ReviewEntry) -> Result<()> {
        match entry.kind {
            ReviewKind::Word => self.schedule_review(&entry.content, StudyType::Word, true).map(drop),
            ReviewKind::Grammar => self
                .schedule_review(&entry.content, StudyType::Grammar, true)
                .map(drop),
            ReviewKind::Mistake => self.remove_from_review_list(&entry.content),
        }
    }
}
