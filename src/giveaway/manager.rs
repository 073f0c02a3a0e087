use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::giveaway::handlers::ConcludeHandler;
use crate::giveaway::models::{
    deadline_after, parse_positive, parse_text, ChannelId, Giveaway, GiveawayField,
    GiveawayOptions, GiveawayStatus, UserId,
};
use crate::giveaway::strategies::{DrawOptions, DrawStrategy, UniformDrawStrategy};
use crate::storage::GiveawayStore;

/// What happened when a user pressed the join button.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum JoinOutcome {
    Joined(Giveaway),
    // Not an error: the user was already in, nothing changed.
    AlreadyJoined(Giveaway),
}

impl JoinOutcome {
    pub fn giveaway(&self) -> &Giveaway {
        match self {
            JoinOutcome::Joined(giveaway) | JoinOutcome::AlreadyJoined(giveaway) => giveaway,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, JoinOutcome::Joined(_))
    }
}

/// Result of a draw request. `drawn` is false when the giveaway had already
/// been concluded earlier and the stored winners were returned untouched.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Conclusion {
    pub giveaway: Giveaway,
    pub drawn: bool,
}

fn ensure_status(
    id: &str,
    giveaway: &Giveaway,
    expected: GiveawayStatus,
    operation: &'static str,
) -> Result<()> {
    match giveaway.status == expected {
        true => Ok(()),
        false => Err(Error::InvalidState {
            id: id.to_string(),
            status: giveaway.status,
            operation,
        }),
    }
}

/// The giveaway state machine. Every mutation goes through a single
/// `GiveawayStore::update` call, so checks and writes happen atomically.
pub struct GiveawayEngine<S: GiveawayStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    // Determines how winners get picked among the participants.
    strategy: Arc<Box<dyn DrawStrategy>>,
    // Notified after every successful draw.
    handlers: Vec<Arc<dyn ConcludeHandler>>,
}

impl<S: GiveawayStore> GiveawayEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        GiveawayEngine {
            store,
            clock: Arc::new(SystemClock),
            strategy: Arc::new(Box::new(UniformDrawStrategy::new())),
            handlers: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_strategy(mut self, strategy: Box<dyn DrawStrategy>) -> Self {
        self.strategy = Arc::new(strategy);
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn ConcludeHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    pub fn get(&self, id: &str) -> Result<Giveaway> {
        self.store.get(id)
    }

    pub fn list(&self) -> Result<Vec<(String, Giveaway)>> {
        self.store.list()
    }

    // Returns ids of the running giveaways whose deadline is at or before `now`.
    pub fn overdue(&self, now: i64) -> Result<Vec<String>> {
        let ids = self
            .store
            .list()?
            .into_iter()
            .filter(|(_, giveaway)| giveaway.is_overdue(now))
            .map(|(id, _)| id)
            .collect::<Vec<String>>();
        Ok(ids)
    }

    #[instrument(skip(self, options))]
    pub fn create(
        &self,
        id: &str,
        channel_id: ChannelId,
        options: &GiveawayOptions,
    ) -> Result<Giveaway> {
        let giveaway = Giveaway::new(channel_id, options, self.clock.now())?;
        self.store.create(id, giveaway.clone())?;

        info!("Giveaway `{}` created in channel {}", id, channel_id.get());
        Ok(giveaway)
    }

    #[instrument(skip(self))]
    pub fn edit_field(&self, id: &str, field: GiveawayField, value: &str) -> Result<Giveaway> {
        let now = self.clock.now();
        let giveaway = self.store.update(id, |giveaway| {
            ensure_status(id, giveaway, GiveawayStatus::Setup, "edit")?;

            match field {
                GiveawayField::Title => giveaway.title = parse_text(field, value)?,
                GiveawayField::Rules => giveaway.rules = parse_text(field, value)?,
                GiveawayField::Prize => giveaway.prize = parse_text(field, value)?,
                GiveawayField::ImageUrl => giveaway.image_url = parse_text(field, value)?,
                GiveawayField::DurationDays => {
                    let duration_days = parse_positive(field, value)?;
                    giveaway.end_timestamp = deadline_after(now, duration_days)?;
                    giveaway.duration_days = duration_days;
                }
                GiveawayField::WinnersCount => {
                    giveaway.winners_count = parse_positive(field, value)?;
                }
            }
            Ok(giveaway.clone())
        })?;

        debug!("Giveaway `{}` got a new {}", id, field.as_str());
        Ok(giveaway)
    }

    // Opens the giveaway for participants. The countdown starts now, not when
    // the giveaway was created.
    #[instrument(skip(self))]
    pub fn start(&self, id: &str) -> Result<Giveaway> {
        let now = self.clock.now();
        let giveaway = self.store.update(id, |giveaway| {
            ensure_status(id, giveaway, GiveawayStatus::Setup, "start")?;

            giveaway.end_timestamp = deadline_after(now, giveaway.duration_days)?;
            giveaway.status = GiveawayStatus::Running;
            Ok(giveaway.clone())
        })?;

        info!(
            "Giveaway `{}` started, the draw happens at {}",
            id,
            giveaway.end_timestamp()
        );
        Ok(giveaway)
    }

    #[instrument(skip(self))]
    pub fn join(&self, id: &str, user_id: UserId) -> Result<JoinOutcome> {
        let outcome = self.store.update(id, |giveaway| {
            ensure_status(id, giveaway, GiveawayStatus::Running, "join")?;

            match giveaway.participants.insert(user_id) {
                true => Ok(JoinOutcome::Joined(giveaway.clone())),
                false => Ok(JoinOutcome::AlreadyJoined(giveaway.clone())),
            }
        })?;

        match outcome.is_new() {
            true => debug!("User {} joined the giveaway `{}`", user_id, id),
            false => debug!("User {} has already joined the giveaway `{}`", user_id, id),
        }
        Ok(outcome)
    }

    // Draws the winners once the deadline has been reached. Calling it on an
    // ended giveaway returns the existing winners.
    #[instrument(skip(self))]
    pub fn conclude(&self, id: &str, at_time: i64) -> Result<Conclusion> {
        self.draw(id, at_time, false)
    }

    // The operator "draw now": like `conclude`, but the deadline is moved to
    // the actual draw time so the panel shows when it really happened.
    #[instrument(skip(self))]
    pub fn force_conclude(&self, id: &str, at_time: i64) -> Result<Conclusion> {
        self.draw(id, at_time, true)
    }

    fn draw(&self, id: &str, at_time: i64, forced: bool) -> Result<Conclusion> {
        let strategy = self.strategy.clone();
        let conclusion = self.store.update(id, |giveaway| {
            if giveaway.status == GiveawayStatus::Ended {
                return Ok(Conclusion {
                    giveaway: giveaway.clone(),
                    drawn: false,
                });
            }
            ensure_status(id, giveaway, GiveawayStatus::Running, "conclude")?;

            if forced {
                giveaway.end_timestamp = at_time;
            }
            let candidates = giveaway.participants.iter().copied().collect::<Vec<UserId>>();
            let options = DrawOptions::new(&candidates, giveaway.winners_count as usize);
            giveaway.winners = strategy.draw(&options);
            giveaway.status = GiveawayStatus::Ended;

            Ok(Conclusion {
                giveaway: giveaway.clone(),
                drawn: true,
            })
        })?;

        match conclusion.drawn {
            true => {
                info!(
                    "Giveaway `{}` concluded with {} winner(s) out of {} participant(s)",
                    id,
                    conclusion.giveaway.winners().len(),
                    conclusion.giveaway.participants().len()
                );
                self.notify(id, &conclusion.giveaway);
            }
            false => debug!("Giveaway `{}` has already been concluded", id),
        }
        Ok(conclusion)
    }

    // Replaces one winner by another participant. The current winner stays
    // eligible unless `exclude_self` is set, so a giveaway where everybody won
    // can still be rerolled.
    #[instrument(skip(self))]
    pub fn reroll(&self, id: &str, winner_index: usize, exclude_self: bool) -> Result<Giveaway> {
        let strategy = self.strategy.clone();
        let giveaway = self.store.update(id, |giveaway| {
            ensure_status(id, giveaway, GiveawayStatus::Ended, "reroll")?;

            let current = match giveaway.winners.get(winner_index) {
                Some(current) => *current,
                None => {
                    let message = format!(
                        "The winner #{} doesn't exist.",
                        winner_index.saturating_add(1)
                    );
                    return Err(Error::InvalidInput(message));
                }
            };
            let pool = giveaway
                .participants
                .iter()
                .copied()
                .filter(|participant| match *participant == current {
                    true => !exclude_self,
                    false => !giveaway.winners.contains(participant),
                })
                .collect::<Vec<UserId>>();

            let replacement = strategy
                .draw(&DrawOptions::new(&pool, 1))
                .first()
                .copied()
                .ok_or(Error::NoEligibleCandidates)?;
            giveaway.winners[winner_index] = replacement;
            Ok(giveaway.clone())
        })?;

        info!(
            "Giveaway `{}` winner #{} rerolled to {}",
            id,
            winner_index.saturating_add(1),
            giveaway.winners()[winner_index]
        );
        Ok(giveaway)
    }

    // The hosting panel is gone: close the giveaway as it is, without a draw.
    #[instrument(skip(self))]
    pub fn mark_abandoned(&self, id: &str) -> Result<Giveaway> {
        let (giveaway, previous) = self.store.update(id, |giveaway| {
            let previous = giveaway.status;
            giveaway.status = GiveawayStatus::Ended;
            Ok((giveaway.clone(), previous))
        })?;

        if previous != GiveawayStatus::Ended {
            warn!(
                "Giveaway `{}` was abandoned while {}, closing it without a draw",
                id, previous
            );
        }
        Ok(giveaway)
    }

    fn notify(&self, id: &str, giveaway: &Giveaway) {
        for handler in &self.handlers {
            if let Err(err) = handler.on_concluded(id, giveaway) {
                error!(
                    "Can't deliver the conclusion of the giveaway `{}`: {}",
                    id,
                    err.to_string()
                );
            }
        }
    }
}
