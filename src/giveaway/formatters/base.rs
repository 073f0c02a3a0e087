use crate::giveaway::models::{Giveaway, SECONDS_PER_DAY};

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_MINUTE: i64 = 60;

/// Time left until a deadline, floored to whole minutes.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl Countdown {
    // Never negative: once the deadline passed everything stays at zero.
    pub fn until(end_timestamp: i64, now: i64) -> Self {
        let mut remaining = end_timestamp.saturating_sub(now).max(0);

        let days = remaining / SECONDS_PER_DAY;
        remaining %= SECONDS_PER_DAY;
        let hours = remaining / SECONDS_PER_HOUR;
        remaining %= SECONDS_PER_HOUR;
        let minutes = remaining / SECONDS_PER_MINUTE;

        Countdown {
            days,
            hours,
            minutes,
        }
    }

    pub fn is_elapsed(&self) -> bool {
        *self == Countdown::default()
    }
}

pub trait GiveawayFormatter {
    // Describes when the winners get (or got) drawn.
    fn deadline(&self, giveaway: &Giveaway, now: i64) -> String;
    // The message posted in the hosting channel after the draw.
    fn announcement(&self, giveaway: &Giveaway) -> String;
    // One-line description used in listings and logs.
    fn pretty_print(&self, id: &str, giveaway: &Giveaway) -> String;
}
