use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::clock::DAY_IN_MILLIS;
use crate::error::Result;
use crate::types::{Difficulty, QuizQuestion};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Interval assumed for an item that has never been answered correctly.
    pub base_interval_ms: i64,
    pub max_interval_ms: i64,
    /// Mistakes after which a question joins the review list.
    pub mistake_threshold: i32,
    pub weak_item_limit: usize,
    /// How many weak items a recommendation names.
    pub recommendation_weak_limit: usize,
    pub progress_threshold: f64,
    pub perfect_score_easy: i32,
    pub perfect_score_hard: i32,
    /// Calendar used for streak days. `None` follows the device.
    pub utc_offset_seconds: Option<i32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: DAY_IN_MILLIS,
            max_interval_ms: 30 * DAY_IN_MILLIS,
            mistake_threshold: 3,
            weak_item_limit: 5,
            recommendation_weak_limit: 3,
            progress_threshold: 0.5,
            perfect_score_easy: 98,
            perfect_score_hard: 96,
            utc_offset_seconds: None,
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        let config: EngineConfig = serde_json::from_reader(file)?;
        info!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Derives the perfect-score thresholds from the loaded quiz catalog.
    pub fn with_quiz_catalog(mut self, questions: &[QuizQuestion]) -> Self {
        let count = |difficulty: Difficulty| {
            questions.iter().filter(|q| q.difficulty == difficulty).count() as i32
        };
        self.perfect_score_easy = count(Difficulty::Easy);
        self.perfect_score_hard = count(Difficulty::Hard);
        self
    }

    pub fn perfect_score(&self, difficulty: Difficulty) -> i32 {
        match difficulty {
            Difficulty::Easy => self.perfect_score_easy,
            Difficulty::Hard => self.perfect_score_hard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn question(id: &str, difficulty: Difficulty) -> QuizQuestion {
        QuizQuestion {
            id: id.to_string(),
            question_text: String::new(),
            options: vec!["a".into(), "b".into()],
            correct_answer_index: 0,
            difficulty,
        }
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = File::create(&path).unwrap();
        write!(file, r#"{{"mistake_threshold": 5, "utc_offset_seconds": 32400}}"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.mistake_threshold, 5);
        assert_eq!(config.utc_offset_seconds, Some(32400));
        assert_eq!(config.max_interval_ms, 30 * DAY_IN_MILLIS);
    }

    #[test]
    fn catalog_sets_perfect_scores() {
        let questions = vec![
            question("easy_1", Difficulty::Easy),
            question("easy_2", Difficulty::Easy),
            question("hard_3", Difficulty::Hard),
        ];
        let config = EngineConfig::default().with_quiz_catalog(&questions);
        assert_eq!(config.perfect_score(Difficulty::Easy), 2);
        assert_eq!(config.perfect_score(Difficulty::Hard), 1);
    }
}
