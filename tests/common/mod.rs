use chrono::{TimeZone, Utc};
use nihongo_progress::{EngineConfig, KeyValueStore, LearningManager, ManualClock, MemoryStore};
use std::sync::Arc;

pub fn manager_with_store(store: Arc<dyn KeyValueStore>) -> (LearningManager, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap(),
    ));
    let config = EngineConfig {
        utc_offset_seconds: Some(9 * 3600),
        ..EngineConfig::default()
    };
    let manager = LearningManager::with_clock(store, config, clock.clone());
    manager.switch_user("yuki");
    (manager, clock)
}

pub fn manager() -> (LearningManager, Arc<ManualClock>) {
    manager_with_store(Arc::new(MemoryStore::new()))
}
