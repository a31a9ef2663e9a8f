use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{ProgressError, Result};
use crate::types::{Difficulty, Grammar, QuizQuestion, Word};

/// Quiz file entry. Ids are assigned from the position in the file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    question_text: String,
    options: Vec<String>,
    correct_answer_index: usize,
    difficulty: Difficulty,
}

fn parse_list<T: DeserializeOwned>(path: &Path, raw: &str) -> Result<Vec<T>> {
    let items: Vec<T> = serde_json::from_str(raw)?;
    if items.is_empty() {
        return Err(ProgressError::EmptyContent(path.display().to_string()));
    }
    Ok(items)
}

fn load_optional<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read content file, continuing without it");
            return Ok(Vec::new());
        }
    };
    let items = parse_list(path, &raw)?;
    info!(path = %path.display(), count = items.len(), "Loaded content");
    Ok(items)
}

pub fn load_words(path: impl AsRef<Path>) -> Result<Vec<Word>> {
    load_optional(path.as_ref())
}

pub fn load_grammars(path: impl AsRef<Path>) -> Result<Vec<Grammar>> {
    load_optional(path.as_ref())
}

pub fn load_quiz_questions(path: impl AsRef<Path>) -> Result<Vec<QuizQuestion>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let questions: Vec<QuizQuestion> = parse_list::<RawQuestion>(path, &raw)?
        .into_iter()
        .enumerate()
        .map(|(i, q)| QuizQuestion {
            id: format!("{}_{}", q.difficulty, i + 1),
            question_text: q.question_text,
            options: q.options,
            correct_answer_index: q.correct_answer_index,
            difficulty: q.difficulty,
        })
        .collect();

    info!(path = %path.display(), count = questions.len(), "Loaded quiz questions");
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn words_load_from_json_array() {
        let file = file_with(r#"[{"word":"猫","reading":"ねこ","meaning":"cat"}]"#);
        let words = load_words(file.path()).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].reading, "ねこ");
    }

    #[test]
    fn missing_word_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_words(dir.path().join("words.json")).unwrap().is_empty());
        assert!(load_grammars(dir.path().join("grammar.json")).unwrap().is_empty());
    }

    #[test]
    fn empty_array_is_an_error() {
        let file = file_with("[]");
        assert!(matches!(load_grammars(file.path()), Err(ProgressError::EmptyContent(_))));
        assert!(matches!(load_quiz_questions(file.path()), Err(ProgressError::EmptyContent(_))));
    }

    #[test]
    fn missing_quiz_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_quiz_questions(dir.path().join("quiz_questions.json")),
            Err(ProgressError::Io(_))
        ));
    }

    #[test]
    fn quiz_ids_follow_file_position() {
        let file = file_with(
            r#"[
                {"questionText":"猫","options":["cat","dog"],"correctAnswerIndex":0,"difficulty":"easy"},
                {"questionText":"〜ている","options":["a","b"],"correctAnswerIndex":1,"difficulty":"hard"}
            ]"#,
        );
        let questions = load_quiz_questions(file.path()).unwrap();
        let ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["easy_1", "hard_2"]);
        assert_eq!(questions[1].correct_answer_index, 1);
    }
}
