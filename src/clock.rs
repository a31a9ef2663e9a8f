use chrono::{DateTime, Duration, FixedOffset, Local, NaiveTime, Offset, TimeZone, Utc};
use parking_lot::Mutex;

pub const DAY_IN_MILLIS: i64 = 24 * 60 * 60 * 1000;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Used by simulations and tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Epoch millis of the midnight that starts the calendar day containing `at`.
///
/// `utc_offset_seconds` pins the calendar; `None` uses the device's local offset.
pub fn start_of_day_millis(at: DateTime<Utc>, utc_offset_seconds: Option<i32>) -> i64 {
    let offset = utc_offset_seconds
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Local.offset_from_utc_datetime(&at.naive_utc()).fix());

    let local_midnight = at.with_timezone(&offset).date_naive().and_time(NaiveTime::MIN);
    match offset.from_local_datetime(&local_midnight).single() {
        Some(midnight) => midnight.timestamp_millis(),
        // Fixed offsets never produce ambiguous local times; keep the raw value as a fallback.
        None => at.timestamp_millis(),
    }
}

pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
