// Text shown on the giveaway panel and in the winner announcement.
use time::OffsetDateTime;
use time::macros::format_description;

use crate::giveaway::formatters::base::{Countdown, GiveawayFormatter};
use crate::giveaway::models::{Giveaway, GiveawayStatus, UserId};

#[derive(Debug, Default)]
pub struct DefaultGiveawayFormatter;

impl DefaultGiveawayFormatter {
    pub fn new() -> Self {
        DefaultGiveawayFormatter {}
    }

    // Renders the timestamp as a UTC date, or as the raw number when it is
    // outside of the representable range.
    fn format_date(&self, timestamp: i64) -> String {
        let format = format_description!("[day]/[month]/[year] at [hour]:[minute]");
        OffsetDateTime::from_unix_timestamp(timestamp)
            .ok()
            .and_then(|date| date.format(format).ok())
            .unwrap_or_else(|| timestamp.to_string())
    }

    fn mentions(&self, winners: &[UserId]) -> String {
        winners
            .iter()
            .map(|winner| winner.mention())
            .collect::<Vec<String>>()
            .join(", ")
    }
}

impl GiveawayFormatter for DefaultGiveawayFormatter {
    fn deadline(&self, giveaway: &Giveaway, now: i64) -> String {
        let date = self.format_date(giveaway.end_timestamp());
        match giveaway.status() {
            GiveawayStatus::Ended => format!("Ended on **{}**", date),
            _ => {
                let countdown = Countdown::until(giveaway.end_timestamp(), now);
                format!(
                    "The winners will be revealed in **{} days, {} hours and {} minutes** `({})`",
                    countdown.days, countdown.hours, countdown.minutes, date
                )
            }
        }
    }

    fn announcement(&self, giveaway: &Giveaway) -> String {
        match giveaway.winners().is_empty() {
            true => format!("No one won the {} giveaway.", giveaway.prize()),
            false => format!(
                "Congratulations to {} for winning the {} giveaway!",
                self.mentions(giveaway.winners()),
                giveaway.prize()
            ),
        }
    }

    fn pretty_print(&self, id: &str, giveaway: &Giveaway) -> String {
        format!(
            "{} [id: {}, status: {}, participants: {}, winners: {}/{}]",
            giveaway.title(),
            id,
            giveaway.status(),
            giveaway.participants().len(),
            giveaway.winners().len(),
            giveaway.winners_count(),
        )
    }
}
