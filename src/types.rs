use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyType {
    Word,
    Grammar,
}

impl StudyType {
    pub const ALL: [StudyType; 2] = [StudyType::Word, StudyType::Grammar];

    pub fn as_str(&self) -> &'static str {
        match self {
            StudyType::Word => "word",
            StudyType::Grammar => "grammar",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            StudyType::Word => "words",
            StudyType::Grammar => "grammars",
        }
    }
}

impl fmt::Display for StudyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Word,
    Grammar,
    Quiz,
}

impl Activity {
    pub const ALL: [Activity; 3] = [Activity::Word, Activity::Grammar, Activity::Quiz];

    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Word => "word",
            Activity::Grammar => "grammar",
            Activity::Quiz => "quiz",
        }
    }
}

impl From<StudyType> for Activity {
    fn from(study_type: StudyType) -> Self {
        match study_type {
            StudyType::Word => Activity::Word,
            StudyType::Grammar => Activity::Grammar,
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 2] = [Difficulty::Easy, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Hard => "hard",
        }
    }

    /// Easy quizzes drill vocabulary, hard quizzes drill grammar.
    pub fn study_type(&self) -> StudyType {
        match self {
            Difficulty::Easy => StudyType::Word,
            Difficulty::Hard => StudyType::Grammar,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correct/total counter pair, persisted as `{"correct":n,"total":m}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectRate {
    pub correct: u32,
    pub total: u32,
}

impl CorrectRate {
    pub fn record(&mut self, success: bool) {
        self.total = self.total.saturating_add(1);
        if success {
            self.correct = self.correct.saturating_add(1);
        }
    }

    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }

    /// Parses a stored record. Returns `None` for unparsable JSON or a
    /// record that breaks `correct <= total`.
    pub fn decode(raw: &str) -> Option<Self> {
        let record: CorrectRate = serde_json::from_str(raw).ok()?;
        (record.correct <= record.total).then_some(record)
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub trait StudyItem {
    const TYPE: StudyType;

    fn key(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    pub reading: String,
    pub meaning: String,
}

impl StudyItem for Word {
    const TYPE: StudyType = StudyType::Word;

    fn key(&self) -> &str {
        &self.word
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grammar {
    pub grammar: String,
    pub example: String,
}

impl StudyItem for Grammar {
    const TYPE: StudyType = StudyType::Grammar;

    fn key(&self) -> &str {
        &self.grammar
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    pub difficulty: Difficulty,
}

impl QuizQuestion {
    pub fn is_correct(&self, selected_index: usize) -> bool {
        selected_index == self.correct_answer_index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewKind {
    Word,
    Grammar,
    Mistake,
}

impl From<StudyType> for ReviewKind {
    fn from(study_type: StudyType) -> Self {
        match study_type {
            StudyType::Word => ReviewKind::Word,
            StudyType::Grammar => ReviewKind::Grammar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub kind: ReviewKind,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_zero_without_attempts() {
        assert_eq!(CorrectRate::default().rate(), 0.0);
    }

    #[test]
    fn record_keeps_correct_within_total() {
        let mut rate = CorrectRate::default();
        rate.record(true);
        rate.record(false);
        rate.record(true);
        assert_eq!(rate, CorrectRate { correct: 2, total: 3 });
        assert!((rate.rate() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn decode_rejects_corrupt_records() {
        assert_eq!(
            CorrectRate::decode(r#"{"correct":1,"total":2}"#),
            Some(CorrectRate { correct: 1, total: 2 })
        );
        assert_eq!(CorrectRate::decode("not json"), None);
        assert_eq!(CorrectRate::decode(r#"{"correct":5,"total":2}"#), None);
    }

    #[test]
    fn quiz_question_uses_camel_case_fields() {
        let raw = r#"{"id":"easy_1","questionText":"猫","options":["cat","dog"],"correctAnswerIndex":0,"difficulty":"easy"}"#;
        let question: QuizQuestion = serde_json::from_str(raw).unwrap();
        assert_eq!(question.difficulty, Difficulty::Easy);
        assert!(question.is_correct(0));
        assert!(!question.is_correct(1));
    }
}
