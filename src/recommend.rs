use crate::error::Result;
use crate::manager::LearningManager;
use crate::types::StudyType;

impl LearningManager {
    /// Suggestions in fixed order: low word progress, low grammar progress,
    /// weak words, weak grammar. Conditions that do not hold are skipped.
    pub fn recommendations(&self) -> Result<Vec<String>> {
        let threshold = self.config().progress_threshold;
        let weak_limit = self.config().recommendation_weak_limit;
        let mut recommendations = Vec::new();

        for study_type in StudyType::ALL {
            let progress = self.learning_progress(study_type)?;
            if progress < threshold {
                recommendations.push(format!(
                    "Keep learning {}. Current Progress: {}%",
                    study_type.plural(),
                    (progress * 100.0) as i32
                ));
            }
        }

        for study_type in StudyType::ALL {
            let weak: Vec<String> = self
                .weak_items(study_type)?
                .into_iter()
                .take(weak_limit)
                .map(|(item, _)| item)
                .collect();
            if !weak.is_empty() {
                recommendations.push(format!(
                    "Review the following {}: {}",
                    study_type.plural(),
                    weak.join(", ")
                ));
            }
        }

        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use crate::manager::test_support::manager;
    use crate::types::StudyType;

    #[test]
    fn fresh_user_gets_progress_suggestions_only() {
        let (manager, _) = manager();
        assert_eq!(
            manager.recommendations().unwrap(),
            vec![
                "Keep learning words. Current Progress: 0%".to_string(),
                "Keep learning grammars. Current Progress: 0%".to_string(),
            ]
        );
    }

    #[test]
    fn weak_items_are_named_in_order() {
        let (manager, _) = manager();
        manager.update_learning_progress(StudyType::Word, 0.8).unwrap();
        manager.update_learning_progress(StudyType::Grammar, 0.25).unwrap();
        for (item, correct) in [("A", true), ("B", false), ("C", true), ("C", false), ("D", true)] {
            manager.record_outcome(item, StudyType::Word, correct).unwrap();
        }
        manager.record_outcome("は", StudyType::Grammar, false).unwrap();

        assert_eq!(
            manager.recommendations().unwrap(),
            vec![
                "Keep learning grammars. Current Progress: 25%".to_string(),
                "Review the following words: B, C, A".to_string(),
                "Review the following grammars: は".to_string(),
            ]
        );
    }

    #[test]
    fn nothing_to_suggest() {
        let (manager, _) = manager();
        manager.update_learning_progress(StudyType::Word, 0.5).unwrap();
        manager.update_learning_progress(StudyType::Grammar, 1.0).unwrap();
        assert!(manager.recommendations().unwrap().is_empty());
    }
}
