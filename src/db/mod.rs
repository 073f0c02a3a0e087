pub mod json;
pub mod models;

pub use crate::db::json::JsonStore;
pub use crate::db::models::GiveawayDocument;
