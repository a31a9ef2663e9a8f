pub mod badges;
pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod keys;
pub mod manager;
pub mod mastery;
pub mod quiz;
pub mod recommend;
pub mod report;
pub mod scheduler;
pub mod store;
pub mod streak;
pub mod study;
pub mod types;

pub use badges::{BadgeId, BadgeSnapshot, BadgeStatus};
pub use clock::{Clock, ManualClock, SystemClock, DAY_IN_MILLIS};
pub use config::EngineConfig;
pub use content::{load_grammars, load_quiz_questions, load_words};
pub use error::{ProgressError, Result};
pub use manager::LearningManager;
pub use quiz::{questions_by_difficulty, QuizSummary};
pub use report::ProgressReport;
pub use scheduler::ReviewSchedule;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreKey, StoredValue, UserScope};
pub use streak::{next_streak, StreakState};
pub use study::{index_of_grammar, index_of_word};
pub use types::*;
