pub mod base;
pub mod panel;

pub use crate::giveaway::formatters::base::{Countdown, GiveawayFormatter};
pub use crate::giveaway::formatters::panel::DefaultGiveawayFormatter;
