use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::giveaway::manager::GiveawayEngine;
use crate::storage::GiveawayStore;

/// Outcome of a single pass over the stored giveaways.
#[readonly::make]
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct SweepReport {
    // Records looked at.
    pub scanned: usize,
    // Giveaways this pass actually drew.
    pub concluded: usize,
    // Conclusions that failed and will be retried on the next pass.
    pub failed: usize,
}

/// Periodically concludes the running giveaways whose deadline has passed.
pub struct Scheduler<S: GiveawayStore + 'static> {
    engine: Arc<GiveawayEngine<S>>,
    interval: Duration,
}

impl<S: GiveawayStore + 'static> Scheduler<S> {
    pub fn new(engine: Arc<GiveawayEngine<S>>, interval: Duration) -> Self {
        Scheduler { engine, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ticks until `shutdown` flips to `true` or its sender goes away. A sweep
    /// that has already started always runs to completion first.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Scheduler started, sweeping every {:?}", self.interval);

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    let report = self.sweep().await;
                    if report.concluded > 0 || report.failed > 0 {
                        info!(
                            "Sweep concluded {} giveaway(s), {} failed, {} scanned",
                            report.concluded, report.failed, report.scanned
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Scheduler stopped");
    }

    pub async fn sweep(&self) -> SweepReport {
        let now = self.engine.now();
        let giveaways = match self.engine.list() {
            Ok(giveaways) => giveaways,
            Err(err) => {
                error!("Can't list the giveaways, skipping the sweep: {}", err.to_string());
                return SweepReport::default();
            }
        };
        let scanned = giveaways.len();

        // Each draw goes to the blocking pool, so a slow write doesn't hold up
        // the other overdue giveaways.
        let handles = giveaways
            .into_iter()
            .filter(|(_, giveaway)| giveaway.is_overdue(now))
            .map(|(id, _)| {
                let engine = self.engine.clone();
                task::spawn_blocking(move || {
                    let result = engine.conclude(&id, now);
                    (id, result)
                })
            })
            .collect::<Vec<_>>();

        let mut concluded = 0;
        let mut failed = 0;
        for handle in handles {
            match handle.await {
                Ok((id, Ok(conclusion))) => match conclusion.drawn {
                    true => concluded += 1,
                    false => debug!("Giveaway `{}` was concluded by someone else", id),
                },
                Ok((id, Err(err))) => {
                    failed += 1;
                    match err.is_fatal() {
                        true => error!("Can't conclude the giveaway `{}`: {}", id, err.to_string()),
                        false => warn!("Can't conclude the giveaway `{}`: {}", id, err.to_string()),
                    }
                }
                Err(err) => {
                    failed += 1;
                    error!("The conclude task has crashed: {}", err.to_string());
                }
            }
        }

        SweepReport {
            scanned,
            concluded,
            failed,
        }
    }
}
