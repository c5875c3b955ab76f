use crate::core::error::ValidationError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures of an optimization request.
///
/// None of these touch local state: the avalanche baseline stays usable
/// whatever the optimizer does.
#[derive(Debug, Error)]
pub enum OptimizationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("monthly budget {budget} does not cover the required minimum payments of {required}")]
    InfeasibleAllocation { budget: Decimal, required: Decimal },
    #[error("optimizer unavailable: {0}")]
    CollaboratorUnavailable(String),
    #[error("malformed optimizer response: {0}")]
    MalformedResponse(String),
    #[error("an optimization request is already in flight")]
    RequestInFlight,
    #[error("invalid optimizer configuration: {0}")]
    Config(String),
}

impl OptimizationError {
    /// Transport and schema failures look the same to a user: try again later.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            OptimizationError::CollaboratorUnavailable(_) | OptimizationError::MalformedResponse(_)
        )
    }
}

impl From<reqwest::Error> for OptimizationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            OptimizationError::MalformedResponse(err.to_string())
        } else {
            OptimizationError::CollaboratorUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for OptimizationError {
    fn from(err: serde_json::Error) -> Self {
        OptimizationError::MalformedResponse(err.to_string())
    }
}
