//! # debt-optimizer
//!
//! Debt repayment scheduling and interest optimization engine.
//!
//! Given a set of interest-bearing debts, this engine simulates an avalanche
//! payoff schedule, formulates the interest-minimizing allocation for a
//! remote optimizer, and estimates a synthetic credit score.
//!
//! ## Architecture
//!
//! - **core**: Debt records, schedules, credit profiles, validation errors
//! - **scheduling**: Avalanche (highest-rate-first) payoff simulation
//! - **scoring**: Additive credit score estimator
//! - **optimization**: Allocation program, optimizer wire format, client, reconciliation
//! - **simulation**: Random portfolios for benches and demos

pub mod core;
pub mod optimization;
pub mod scheduling;
pub mod scoring;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::debt::{Debt, DebtId, DebtSet};
    pub use crate::core::error::ValidationError;
    pub use crate::core::profile::{CreditProfile, CreditScore};
    pub use crate::core::schedule::{MonthSchedule, Schedule, ScheduleEntry};
    pub use crate::optimization::client::{OptimizerClient, OptimizerConfig};
    pub use crate::optimization::error::OptimizationError;
    pub use crate::optimization::reconcile::{OptimizedSchedule, ScheduleComparison};
    pub use crate::scheduling::avalanche::{AvalancheScheduler, ScheduleOptions};
    pub use crate::scoring::credit::{estimate, CreditRating};
}
