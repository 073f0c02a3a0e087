use crossbeam::atomic::AtomicCell;
use time::OffsetDateTime;

/// Source of "now" for deadlines, as Unix timestamps in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }
}

/// A clock that only moves when told to. Handy for replaying a history of
/// giveaways or for driving the engine in tests.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicCell<i64>,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        ManualClock {
            now: AtomicCell::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load()
    }
}
