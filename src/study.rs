use tracing::debug;

use crate::error::Result;
use crate::keys;
use crate::manager::LearningManager;
use crate::types::{Grammar, StudyType, Word};

impl LearningManager {
    /// Position of the study cursor. `item_count` means every item was studied.
    pub fn current_study_index(&self, study_type: StudyType) -> Result<usize> {
        let index = self.scope().get_int(&keys::study_progress(study_type), 0)?;
        Ok(usize::try_from(index).unwrap_or(0))
    }

    /// Stores the cursor, clamped to `[0, item_count]`. Returns the stored value.
    pub fn save_study_index(&self, study_type: StudyType, index: usize, item_count: usize) -> Result<usize> {
        let index = index.min(item_count);
        self.scope()
            .set_int(&keys::study_progress(study_type), cursor_value(index))?;
        Ok(index)
    }

    pub fn learning_progress(&self, study_type: StudyType) -> Result<f64> {
        Ok(self.scope().get_float(&keys::learning_progress(study_type), 0.0)? as f64)
    }

    pub fn update_learning_progress(&self, study_type: StudyType, progress: f64) -> Result<()> {
        self.scope()
            .set_float(&keys::learning_progress(study_type), clamp_progress(progress))
    }

    /// Moves the cursor and records `index / item_count` as learning progress.
    pub fn advance_study(&self, study_type: StudyType, index: usize, item_count: usize) -> Result<usize> {
        let index = index.min(item_count);
        let progress = if item_count == 0 {
            0.0
        } else {
            index as f64 / item_count as f64
        };

        self.locked(|scope| {
            scope.set_int(&keys::study_progress(study_type), cursor_value(index))?;
            scope.set_float(&keys::learning_progress(study_type), clamp_progress(progress))
        })?;
        debug!(study_type = %study_type, index, item_count, progress, "Advanced study cursor");
        Ok(index)
    }
}

fn cursor_value(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

fn clamp_progress(progress: f64) -> f32 {
    if progress.is_finite() {
        progress.clamp(0.0, 1.0) as f32
    } else {
        0.0
    }
}

pub fn index_of_word(words: &[Word], key: &str) -> Option<usize> {
    words.iter().position(|w| w.word == key)
}

pub fn index_of_grammar(grammars: &[Grammar], key: &str) -> Option<usize> {
    grammars.iter().position(|g| g.grammar == key)
}
