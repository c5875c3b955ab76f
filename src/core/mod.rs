pub mod debt;
pub mod error;
pub mod profile;
pub mod schedule;
