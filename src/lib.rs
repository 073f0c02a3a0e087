pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod giveaway;
pub mod scheduler;
pub mod storage;
