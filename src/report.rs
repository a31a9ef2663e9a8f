use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::manager::LearningManager;
use crate::types::{Activity, Difficulty, StudyType};

/// Per-user summary for the analysis screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub user: String,
    /// Milliseconds per activity.
    pub learning_time: BTreeMap<Activity, i64>,
    pub total_study_time: i64,
    pub learning_streak: i32,
    pub quiz_attempts: BTreeMap<Difficulty, i32>,
    pub high_scores: BTreeMap<Difficulty, i32>,
    pub correct_rates: BTreeMap<StudyType, f64>,
    pub learning_progress: BTreeMap<StudyType, f64>,
    pub review_list_size: usize,
}

impl LearningManager {
    pub fn progress_report(&self) -> Result<ProgressReport> {
        let mut learning_time = BTreeMap::new();
        for activity in Activity::ALL {
            learning_time.insert(activity, self.learning_time(activity)?);
        }

        let mut quiz_attempts = BTreeMap::new();
        let mut high_scores = BTreeMap::new();
        for difficulty in Difficulty::ALL {
            quiz_attempts.insert(difficulty, self.quiz_attempt_count(difficulty)?);
            high_scores.insert(difficulty, self.high_score(difficulty)?);
        }

        let mut correct_rates = BTreeMap::new();
        let mut learning_progress = BTreeMap::new();
        for study_type in StudyType::ALL {
            correct_rates.insert(study_type, self.overall_correct_rate(study_type)?);
            learning_progress.insert(study_type, self.learning_progress(study_type)?);
        }

        Ok(ProgressReport {
            user: self.current_user(),
            learning_time,
            total_study_time: self.total_study_time()?,
            learning_streak: self.learning_streak()?,
            quiz_attempts,
            high_scores,
            correct_rates,
            learning_progress,
            review_list_size: self.review_list()?.len(),
        })
    }
}
