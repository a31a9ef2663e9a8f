use crate::types::{Activity, Difficulty, StudyType};

pub const CURRENT_WORD: &str = "current_word";
pub const REVIEW_LIST: &str = "review_list";
pub const LEARNING_STREAK: &str = "learning_streak";
pub const LAST_LEARNING_DAY: &str = "last_learning_day";

pub fn favorites(study_type: StudyType) -> String {
    format!("{}_favorites", study_type)
}

pub fn study_progress(study_type: StudyType) -> String {
    format!("{}_progress", study_type)
}

pub fn learning_progress(study_type: StudyType) -> String {
    format!("{}_learning_progress", study_type)
}

/// Aggregate record across every answer of this type.
pub fn correct_rate(study_type: StudyType) -> String {
    format!("{}_correct_rate", study_type)
}

pub fn item_correct_rate_prefix(study_type: StudyType) -> String {
    format!("{}_correct_rate_", study_type)
}

pub fn item_correct_rate(study_type: StudyType, item: &str) -> String {
    format!("{}{}", item_correct_rate_prefix(study_type), item)
}

pub fn review_schedule_prefix(study_type: StudyType) -> String {
    format!("{}_review_schedule_", study_type)
}

pub fn review_schedule(study_type: StudyType, item: &str) -> String {
    format!("{}{}", review_schedule_prefix(study_type), item)
}

pub fn review_interval(study_type: StudyType, item: &str) -> String {
    format!("{}_review_interval_{}", study_type, item)
}

pub fn quiz_attempt_count(difficulty: Difficulty) -> String {
    format!("quiz_attempt_count_{}", difficulty)
}

pub fn high_score(difficulty: Difficulty) -> String {
    format!("high_score_{}", difficulty)
}

pub fn mistake_count(question_id: &str) -> String {
    format!("mistake_count_{}", question_id)
}

pub fn learning_time(activity: Activity) -> String {
    format!("{}_learning_time", activity)
}

pub fn badge(badge_id: &str) -> String {
    format!("badge_{}", badge_id)
}

pub fn badge_awarded_at(badge_id: &str) -> String {
    format!("badge_{}_awarded_at", badge_id)
}
