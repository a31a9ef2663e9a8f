use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::error::Result;
use crate::keys;
use crate::manager::LearningManager;
use crate::store::{StoredValue, UserScope};
use crate::types::{CorrectRate, StudyItem, StudyType};

// Unreadable records, including values of the wrong kind, count as {0,0}.
fn decode_rate(key: &str, value: &StoredValue) -> CorrectRate {
    let decoded = match value {
        StoredValue::Str(raw) => CorrectRate::decode(raw),
        _ => None,
    };
    decoded.unwrap_or_else(|| {
        warn!(key, kind = value.kind(), "Corrupt correct-rate record, resetting");
        CorrectRate::default()
    })
}

pub(crate) fn read_rate(scope: &UserScope<'_>, key: &str) -> Result<CorrectRate> {
    Ok(scope
        .get(key)?
        .map(|value| decode_rate(key, &value))
        .unwrap_or_default())
}

pub(crate) fn bump_rate(scope: &UserScope<'_>, key: &str, success: bool) -> Result<CorrectRate> {
    let mut record = read_rate(scope, key)?;
    record.record(success);
    scope.set_string(key, record.encode()?)?;
    Ok(record)
}

impl LearningManager {
    /// Records one answer for `item`. Updates the item's record and the
    /// aggregate record for its type.
    pub fn record_outcome(&self, item: &str, study_type: StudyType, is_correct: bool) -> Result<CorrectRate> {
        self.locked(|scope| self.record_outcome_in(scope, item, study_type, is_correct))
    }

    pub(crate) fn record_outcome_in(
        &self,
        scope: &UserScope<'_>,
        item: &str,
        study_type: StudyType,
        is_correct: bool,
    ) -> Result<CorrectRate> {
        let record = bump_rate(scope, &keys::item_correct_rate(study_type, item), is_correct)?;
        bump_rate(scope, &keys::correct_rate(study_type), is_correct)?;
        debug!(
            item,
            study_type = %study_type,
            correct = record.correct,
            total = record.total,
            "Recorded outcome"
        );
        Ok(record)
    }

    pub fn item_correct_rate(&self, item: &str, study_type: StudyType) -> Result<CorrectRate> {
        read_rate(&self.scope(), &keys::item_correct_rate(study_type, item))
    }

    pub fn overall_correct_rate(&self, study_type: StudyType) -> Result<f64> {
        Ok(read_rate(&self.scope(), &keys::correct_rate(study_type))?.rate())
    }

    pub fn toggle_favorite(&self, item: &str, study_type: StudyType) -> Result<()> {
        self.locked(|scope| {
            let key = keys::favorites(study_type);
            let mut favorites = scope.get_string_set(&key)?;
            if !favorites.remove(item) {
                favorites.insert(item.to_string());
            }
            scope.set_string_set(&key, favorites)
        })
    }

    pub fn is_favorite(&self, item: &str, study_type: StudyType) -> Result<bool> {
        Ok(self.favorites(study_type)?.contains(item))
    }

    pub fn favorites(&self, study_type: StudyType) -> Result<BTreeSet<String>> {
        self.scope().get_string_set(&keys::favorites(study_type))
    }

    /// The lowest-rate items that have at least one record, ascending by rate.
    /// Ties keep key order.
    pub fn weak_items(&self, study_type: StudyType) -> Result<Vec<(String, f64)>> {
        let scope = self.scope();
        let mut rated: Vec<(String, f64)> = scope
            .entries_with_prefix(&keys::item_correct_rate_prefix(study_type))?
            .into_iter()
            .map(|(item, value)| {
                let rate = decode_rate(&item, &value).rate();
                (item, rate)
            })
            .collect();

        rated.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        rated.truncate(self.config().weak_item_limit);
        Ok(rated)
    }

    /// Display order for a study sequence: weak items first in weak-list rank,
    /// then favorites before the rest. The sort is stable.
    pub fn sort_by_weakness_then_favorite<T: StudyItem + Clone>(&self, items: &[T]) -> Result<Vec<T>> {
        let weak: Vec<String> = self
            .weak_items(T::TYPE)?
            .into_iter()
            .map(|(item, _)| item)
            .collect();
        let favorites = self.favorites(T::TYPE)?;

        // Items outside the weak list rank after every weak item, unlike the
        // Android app where indexOf's -1 put them first.
        let mut ranked: Vec<(usize, bool, &T)> = items
            .iter()
            .map(|item| {
                let rank = weak
                    .iter()
                    .position(|w| w == item.key())
                    .unwrap_or(usize::MAX);
                (rank, !favorites.contains(item.key()), item)
            })
            .collect();
        ranked.sort_by_key(|(rank, not_favorite, _)| (*rank, *not_favorite));

        Ok(ranked.into_iter().map(|(_, _, item)| item.clone()).collect())
    }
}
