// src/models/mod.rs

//! Data structures shared across the application.

pub mod config;
pub mod status;
pub mod user;

pub use config::{Config, LogConfig, StreamNames};
pub use status::{Channel, ErrorEvent, FetchStatus, LogEvent};
pub use user::{Address, Coordinates, UserRecord};
