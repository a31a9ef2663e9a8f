use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::badges::BadgeId;
use crate::error::Result;
use crate::keys;
use crate::manager::LearningManager;
use crate::mastery::bump_rate;
use crate::types::{Difficulty, QuizQuestion};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizSummary {
    pub difficulty: Difficulty,
    pub score: i32,
    pub high_score: i32,
    pub new_high_score: bool,
    pub newly_awarded: Vec<BadgeId>,
}

pub fn questions_by_difficulty<R: Rng + ?Sized>(
    questions: &[QuizQuestion],
    difficulty: Difficulty,
    rng: &mut R,
) -> Vec<QuizQuestion> {
    let mut selected: Vec<QuizQuestion> = questions
        .iter()
        .filter(|q| q.difficulty == difficulty)
        .cloned()
        .collect();
    selected.shuffle(rng);
    selected
}

impl LearningManager {
    pub fn increment_quiz_attempt_count(&self, difficulty: Difficulty) -> Result<i32> {
        self.locked(|scope| {
            let key = keys::quiz_attempt_count(difficulty);
            let count = scope.get_int(&key, 0)?.saturating_add(1);
            scope.set_int(&key, count)?;
            Ok(count)
        })
    }

    pub fn quiz_attempt_count(&self, difficulty: Difficulty) -> Result<i32> {
        self.scope().get_int(&keys::quiz_attempt_count(difficulty), 0)
    }

    /// Raises the stored high score if `score` beats it. Returns whether it did.
    pub fn update_high_score(&self, difficulty: Difficulty, score: i32) -> Result<bool> {
        self.locked(|scope| {
            let key = keys::high_score(difficulty);
            if score > scope.get_int(&key, 0)? {
                scope.set_int(&key, score)?;
                return Ok(true);
            }
            Ok(false)
        })
    }

    pub fn high_score(&self, difficulty: Difficulty) -> Result<i32> {
        self.scope().get_int(&keys::high_score(difficulty), 0)
    }

    /// Checks one answer. A wrong answer counts as a mistake on the question;
    /// every answer feeds the overall rate of the quiz's study type.
    pub fn record_quiz_answer(&self, question: &QuizQuestion, selected_index: usize) -> Result<bool> {
        let is_correct = question.is_correct(selected_index);
        if !is_correct {
            self.record_mistake(&question.id)?;
        }
        self.locked(|scope| {
            bump_rate(
                scope,
                &keys::correct_rate(question.difficulty.study_type()),
                is_correct,
            )
        })?;
        debug!(question_id = %question.id, selected_index, is_correct, "Recorded quiz answer");
        Ok(is_correct)
    }

    pub fn finish_quiz(&self, difficulty: Difficulty, score: i32) -> Result<QuizSummary> {
        let new_high_score = self.update_high_score(difficulty, score)?;
        let newly_awarded = self.evaluate_all()?;
        let high_score = self.high_score(difficulty)?;

        info!(
            difficulty = %difficulty,
            score,
            high_score,
            new_high_score,
            "Quiz finished"
        );
        Ok(QuizSummary {
            difficulty,
            score,
            high_score,
            new_high_score,
            newly_awarded,
        })
    }
}
