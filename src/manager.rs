use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::keys;
use crate::store::{KeyValueStore, UserScope};

/// One mutex per user id. Read-modify-write sequences hold it for their whole span.
#[derive(Debug, Default)]
struct UserLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    fn for_user(&self, user: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(user.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Entry point for the progress engine. Holds the store, clock and config and
/// routes every call to the partition of the current user.
pub struct LearningManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    current_user: RwLock<String>,
    locks: UserLocks,
}

impl LearningManager {
    pub fn new(store: Arc<dyn KeyValueStore>, config: EngineConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            clock,
            config,
            current_user: RwLock::new(String::new()),
            locks: UserLocks::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn current_user(&self) -> String {
        self.current_user.read().clone()
    }

    /// Makes `user` the active partition. Nothing is copied or merged.
    pub fn switch_user(&self, user: impl Into<String>) {
        let user = user.into();
        info!(user = %user, "Switched current user");
        *self.current_user.write() = user;
    }

    pub(crate) fn scope(&self) -> UserScope<'_> {
        UserScope::new(self.store.as_ref(), self.current_user())
    }

    /// Runs `f` against the current user's partition while holding that user's lock.
    pub(crate) fn locked<T>(&self, f: impl FnOnce(&UserScope<'_>) -> Result<T>) -> Result<T> {
        let scope = self.scope();
        let lock = self.locks.for_user(scope.user());
        let _guard = lock.lock();
        f(&scope)
    }

    pub fn set_current_word(&self, word: &str) -> Result<()> {
        self.scope().set_string(keys::CURRENT_WORD, word)
    }

    pub fn current_word(&self) -> Result<Option<String>> {
        self.scope().get_string(keys::CURRENT_WORD)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    pub fn manager() -> (LearningManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        ));
        let config = EngineConfig {
            utc_offset_seconds: Some(0),
            ..EngineConfig::default()
        };
        let manager =
            LearningManager::with_clock(Arc::new(MemoryStore::new()), config, clock.clone());
        manager.switch_user("tester");
        (manager, clock)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::manager;

    #[test]
    fn current_word_round_trips_per_user() {
        let (manager, _) = manager();
        assert_eq!(manager.current_word().unwrap(), None);
        manager.set_current_word("猫").unwrap();
        assert_eq!(manager.current_word().unwrap().as_deref(), Some("猫"));

        manager.switch_user("someone_else");
        assert_eq!(manager.current_word().unwrap(), None);
    }
}
