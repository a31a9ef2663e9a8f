use tracing::debug;

use crate::clock::{start_of_day_millis, Clock, DAY_IN_MILLIS};
use crate::error::Result;
use crate::keys;
use crate::manager::LearningManager;
use crate::store::UserScope;
use crate::types::{Activity, StudyType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakState {
    /// Midnight of the last day with activity, epoch millis. Zero if never.
    pub last_learning_day: i64,
    pub current_streak: i32,
}

// A gap of more than one day of millis starts the streak over.
pub fn next_streak(last_learning_day: i64, current_streak: i32, today: i64) -> i32 {
    if today - last_learning_day > DAY_IN_MILLIS {
        1
    } else if today > last_learning_day {
        current_streak.saturating_add(1)
    } else {
        current_streak
    }
}

impl LearningManager {
    /// Adds `duration_ms` to the activity's total, then updates the streak.
    /// Call once when a timed study or quiz session ends.
    pub fn record_activity(&self, activity: Activity, duration_ms: i64) -> Result<StreakState> {
        self.locked(|scope| {
            let time_key = keys::learning_time(activity);
            let total = scope.get_long(&time_key, 0)?.saturating_add(duration_ms.max(0));
            scope.set_long(&time_key, total)?;
            debug!(activity = %activity, duration_ms, total, "Recorded learning time");

            self.update_streak_in(scope)
        })
    }

    fn update_streak_in(&self, scope: &UserScope<'_>) -> Result<StreakState> {
        let today = start_of_day_millis(self.clock().now(), self.config().utc_offset_seconds);
        let last_learning_day = scope.get_long(keys::LAST_LEARNING_DAY, 0)?;
        let current = scope.get_int(keys::LEARNING_STREAK, 0)?;

        let streak = next_streak(last_learning_day, current, today);
        if streak != current {
            scope.set_int(keys::LEARNING_STREAK, streak)?;
        }
        scope.set_long(keys::LAST_LEARNING_DAY, today)?;

        debug!(previous = current, streak, today, "Updated learning streak");
        Ok(StreakState {
            last_learning_day: today,
            current_streak: streak,
        })
    }

    pub fn learning_streak(&self) -> Result<i32> {
        self.scope().get_int(keys::LEARNING_STREAK, 0)
    }

    pub fn streak_state(&self) -> Result<StreakState> {
        let scope = self.scope();
        Ok(StreakState {
            last_learning_day: scope.get_long(keys::LAST_LEARNING_DAY, 0)?,
            current_streak: scope.get_int(keys::LEARNING_STREAK, 0)?,
        })
    }

    pub fn learning_time(&self, activity: Activity) -> Result<i64> {
        self.scope().get_long(&keys::learning_time(activity), 0)
    }

    pub fn total_study_time(&self) -> Result<i64> {
        let mut total = 0i64;
        for study_type in StudyType::ALL {
            total = total.saturating_add(self.learning_time(study_type.into())?);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::test_support::manager;
    use chrono::Duration;

    #[test]
    fn streak_transitions() {
        let day = DAY_IN_MILLIS;
        assert_eq!(next_streak(10 * day, 4, 11 * day), 5);
        assert_eq!(next_streak(10 * day, 4, 12 * day), 1);
        assert_eq!(next_streak(10 * day, 4, 30 * day), 1);
        assert_eq!(next_streak(10 * day, 4, 10 * day), 4);
        assert_eq!(next_streak(0, 0, 10 * day), 1);
    }

    #[test]
    fn activity_accumulates_time() {
        let (manager, _) = manager();
        manager.record_activity(Activity::Word, 60_000).unwrap();
        manager.record_activity(Activity::Word, 30_000).unwrap();
        manager.record_activity(Activity::Grammar, 15_000).unwrap();
        manager.record_activity(Activity::Quiz, 45_000).unwrap();

        assert_eq!(manager.learning_time(Activity::Word).unwrap(), 90_000);
        assert_eq!(manager.learning_time(Activity::Quiz).unwrap(), 45_000);
        assert_eq!(manager.total_study_time().unwrap(), 105_000);
    }

    #[test]
    fn streak_follows_calendar_days() {
        let (manager, clock) = manager();

        assert_eq!(manager.record_activity(Activity::Word, 1).unwrap().current_streak, 1);
        clock.advance(Duration::hours(3));
        assert_eq!(manager.record_activity(Activity::Word, 1).unwrap().current_streak, 1);

        clock.advance(Duration::days(1));
        assert_eq!(manager.record_activity(Activity::Word, 1).unwrap().current_streak, 2);
        clock.advance(Duration::days(1));
        assert_eq!(manager.record_activity(Activity::Grammar, 1).unwrap().current_streak, 3);

        clock.advance(Duration::days(2));
        let state = manager.record_activity(Activity::Quiz, 1).unwrap();
        assert_eq!(state.current_streak, 1);
        assert_eq!(manager.streak_state().unwrap(), state);
        assert_eq!(manager.learning_streak().unwrap(), 1);
    }

    #[test]
    fn last_day_is_midnight() {
        let (manager, clock) = manager();
        let state = manager.record_activity(Activity::Word, 1).unwrap();
        assert_eq!(state.last_learning_day % DAY_IN_MILLIS, 0);
        assert!(state.last_learning_day <= clock.now().timestamp_millis());
    }
}
