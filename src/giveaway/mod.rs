pub mod formatters;
pub mod handlers;
pub mod manager;
pub mod models;
pub mod parser;
pub mod strategies;

pub use crate::giveaway::handlers::{ConcludeHandler, LoggingConcludeHandler};
pub use crate::giveaway::manager::{Conclusion, GiveawayEngine, JoinOutcome};
pub use crate::giveaway::models::{
    ChannelId, Giveaway, GiveawayField, GiveawayOptions, GiveawayStatus, UserId,
};
pub use crate::giveaway::parser::PanelAction;
