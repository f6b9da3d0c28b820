// src/utils/mod.rs

//! Small shared utilities.

pub mod rate;
pub mod time;

pub use rate::RateLimiter;
pub use time::timestamp_millis;
