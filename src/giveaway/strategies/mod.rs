pub mod base;
pub mod uniform;

pub use crate::giveaway::strategies::base::{DrawOptions, DrawStrategy};
pub use crate::giveaway::strategies::uniform::UniformDrawStrategy;
