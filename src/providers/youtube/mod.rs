pub mod adapter;
pub mod api;
pub mod title;

/// YouTube rejects playlist inserts past roughly this many per day.
pub const DAILY_CREATE_CAP: u64 = 10;
