use tracing::info;

use crate::error::Result;
use crate::giveaway::formatters::{DefaultGiveawayFormatter, GiveawayFormatter};
use crate::giveaway::models::Giveaway;

/// Gets called once a giveaway has been drawn, so the hosting panel can be
/// refreshed and the winners announced.
pub trait ConcludeHandler: Send + Sync {
    fn on_concluded(&self, id: &str, giveaway: &Giveaway) -> Result<()>;
}

/// Writes the announcement into the log instead of a chat channel.
#[derive(Default)]
pub struct LoggingConcludeHandler {
    formatter: DefaultGiveawayFormatter,
}

impl LoggingConcludeHandler {
    pub fn new() -> Self {
        LoggingConcludeHandler {
            formatter: DefaultGiveawayFormatter::new(),
        }
    }
}

impl ConcludeHandler for LoggingConcludeHandler {
    fn on_concluded(&self, id: &str, giveaway: &Giveaway) -> Result<()> {
        info!(
            "Giveaway `{}` in channel {} concluded: {}",
            id,
            giveaway.channel_id().get(),
            self.formatter.announcement(giveaway)
        );
        Ok(())
    }
}
