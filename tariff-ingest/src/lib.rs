pub mod comparison;
pub mod config;
pub mod database;
pub mod helpers;
pub mod integrations;
pub mod jobs;

pub use database::Database;
