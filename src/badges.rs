use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::{millis_to_datetime, Clock};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::keys;
use crate::manager::LearningManager;
use crate::mastery::read_rate;
use crate::store::UserScope;
use crate::types::{Activity, Difficulty, StudyType};

const HOUR_IN_MILLIS: i64 = 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeId {
    Streak7,
    Streak30,
    TotalTime10h,
    QuizMasterEasy,
    QuizMasterHard,
    PerfectQuizEasy,
    PerfectQuizHard,
}

impl BadgeId {
    pub const ALL: [BadgeId; 7] = [
        BadgeId::Streak7,
        BadgeId::Streak30,
        BadgeId::TotalTime10h,
        BadgeId::QuizMasterEasy,
        BadgeId::QuizMasterHard,
        BadgeId::PerfectQuizEasy,
        BadgeId::PerfectQuizHard,
    ];

    /// Identifier used in persisted keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeId::Streak7 => "streak_7",
            BadgeId::Streak30 => "streak_30",
            BadgeId::TotalTime10h => "total_time_10h",
            BadgeId::QuizMasterEasy => "quiz_master_easy",
            BadgeId::QuizMasterHard => "quiz_master_hard",
            BadgeId::PerfectQuizEasy => "perfect_quiz_easy",
            BadgeId::PerfectQuizHard => "perfect_quiz_hard",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BadgeId::Streak7 => "7-day streak",
            BadgeId::Streak30 => "30-day streak",
            BadgeId::TotalTime10h => "10 hours of study time",
            BadgeId::QuizMasterEasy => "Quiz Master (word)",
            BadgeId::QuizMasterHard => "Quiz Master (grammar)",
            BadgeId::PerfectQuizEasy => "Perfect score (Word)",
            BadgeId::PerfectQuizHard => "Perfect score (Grammar)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BadgeId::Streak7 => "7 consecutive days of study",
            BadgeId::Streak30 => "30 consecutive days of study",
            BadgeId::TotalTime10h => "Total study time exceeds 10 hours",
            BadgeId::QuizMasterEasy => "Achieve 90% or more correct answers on word quizzes",
            BadgeId::QuizMasterHard => "Achieve 90% or more correct answers on grammar quizzes",
            BadgeId::PerfectQuizEasy => "Get a perfect score on all word quiz questions",
            BadgeId::PerfectQuizHard => "Get a perfect score on all grammar quiz questions",
        }
    }

    pub fn perfect_quiz(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => BadgeId::PerfectQuizEasy,
            Difficulty::Hard => BadgeId::PerfectQuizHard,
        }
    }

    pub fn is_earned(&self, snapshot: &BadgeSnapshot, config: &EngineConfig) -> bool {
        match self {
            BadgeId::Streak7 => snapshot.streak >= 7,
            BadgeId::Streak30 => snapshot.streak >= 30,
            BadgeId::TotalTime10h => snapshot.total_study_ms / HOUR_IN_MILLIS >= 10,
            BadgeId::QuizMasterEasy => snapshot.word_correct_rate >= 0.9,
            BadgeId::QuizMasterHard => snapshot.grammar_correct_rate >= 0.9,
            BadgeId::PerfectQuizEasy => {
                perfect(snapshot.easy_high_score, config.perfect_score(Difficulty::Easy))
            }
            BadgeId::PerfectQuizHard => {
                perfect(snapshot.hard_high_score, config.perfect_score(Difficulty::Hard))
            }
        }
    }
}

// A difficulty with no questions has no perfect score to reach.
fn perfect(high_score: i32, question_count: i32) -> bool {
    question_count > 0 && high_score == question_count
}

/// Read-only view of the state the badge rules look at.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BadgeSnapshot {
    pub streak: i32,
    pub total_study_ms: i64,
    pub word_correct_rate: f64,
    pub grammar_correct_rate: f64,
    pub easy_high_score: i32,
    pub hard_high_score: i32,
}

impl BadgeSnapshot {
    fn read(scope: &UserScope<'_>) -> Result<Self> {
        let total_study_ms = scope
            .get_long(&keys::learning_time(Activity::Word), 0)?
            .saturating_add(scope.get_long(&keys::learning_time(Activity::Grammar), 0)?);
        Ok(Self {
            streak: scope.get_int(keys::LEARNING_STREAK, 0)?,
            total_study_ms,
            word_correct_rate: read_rate(scope, &keys::correct_rate(StudyType::Word))?.rate(),
            grammar_correct_rate: read_rate(scope, &keys::correct_rate(StudyType::Grammar))?.rate(),
            easy_high_score: scope.get_int(&keys::high_score(Difficulty::Easy), 0)?,
            hard_high_score: scope.get_int(&keys::high_score(Difficulty::Hard), 0)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeStatus {
    pub id: BadgeId,
    pub name: &'static str,
    pub description: &'static str,
    pub achieved: bool,
    pub awarded_at: Option<DateTime<Utc>>,
}

impl LearningManager {
    pub fn badge_snapshot(&self) -> Result<BadgeSnapshot> {
        BadgeSnapshot::read(&self.scope())
    }

    /// Awards every badge whose rule now holds and that was not yet awarded.
    /// Returns the newly awarded ones.
    pub fn evaluate_all(&self) -> Result<Vec<BadgeId>> {
        self.locked(|scope| {
            let snapshot = BadgeSnapshot::read(scope)?;
            let mut awarded = Vec::new();
            for badge in BadgeId::ALL {
                if badge.is_earned(&snapshot, self.config()) && self.award_in(scope, badge)? {
                    awarded.push(badge);
                }
            }
            Ok(awarded)
        })
    }

    /// Marks `badge` achieved now unless it already is. Returns whether it was newly written.
    pub fn award_badge(&self, badge: BadgeId) -> Result<bool> {
        self.locked(|scope| self.award_in(scope, badge))
    }

    fn award_in(&self, scope: &UserScope<'_>, badge: BadgeId) -> Result<bool> {
        if scope.get_bool(&keys::badge(badge.as_str()), false)? {
            return Ok(false);
        }
        let now = self.clock().now_millis();
        scope.set_bool(&keys::badge(badge.as_str()), true)?;
        scope.set_long(&keys::badge_awarded_at(badge.as_str()), now)?;
        info!(badge = badge.as_str(), awarded_at = now, "Awarded badge");
        Ok(true)
    }

    pub fn is_badge_achieved(&self, badge: BadgeId) -> Result<bool> {
        self.scope().get_bool(&keys::badge(badge.as_str()), false)
    }

    pub fn badge_awarded_at(&self, badge: BadgeId) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .scope()
            .get_long_opt(&keys::badge_awarded_at(badge.as_str()))?
            .and_then(millis_to_datetime))
    }

    pub fn badges(&self) -> Result<Vec<BadgeStatus>> {
        BadgeId::ALL
            .iter()
            .map(|&id| {
                Ok(BadgeStatus {
                    id,
                    name: id.name(),
                    description: id.description(),
                    achieved: self.is_badge_achieved(id)?,
                    awarded_at: self.badge_awarded_at(id)?,
                })
            })
            .collect()
    }
}
