use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::giveaway::models::UserId;
use crate::giveaway::strategies::base::{DrawOptions, DrawStrategy};

/// Every candidate has the same chance, and nobody wins twice in one draw.
#[derive(Debug, Default)]
pub struct UniformDrawStrategy {
    // Falls back to the thread-local generator when not seeded.
    rng: Option<Mutex<StdRng>>,
}

impl UniformDrawStrategy {
    pub fn new() -> Self {
        UniformDrawStrategy { rng: None }
    }

    // A reproducible sequence of draws, for replays and tests.
    pub fn seeded(seed: u64) -> Self {
        UniformDrawStrategy {
            rng: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, options: &DrawOptions) -> Vec<UserId> {
    options
        .candidates()
        .choose_multiple(rng, options.effective_count())
        .copied()
        .collect()
}

impl DrawStrategy for UniformDrawStrategy {
    fn draw(&self, options: &DrawOptions) -> Vec<UserId> {
        match &self.rng {
            Some(rng) => {
                let mut guard = rng.lock().unwrap_or_else(PoisonError::into_inner);
                sample(&mut *guard, options)
            }
            None => sample(&mut rand::thread_rng(), options),
        }
    }
}
