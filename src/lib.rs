pub mod classify;
pub mod config;
pub mod db;
pub mod fetch;
pub mod models;
pub mod sources;
pub mod sync;
pub mod units;
