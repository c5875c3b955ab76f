use crate::core::debt::DebtId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Rejection of malformed or out-of-range input, raised before any
/// computation runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("debt name must not be empty")]
    EmptyName,
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: Decimal },
    #[error("term must be at least one month")]
    ZeroTerm,
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },
    #[error("duplicate debt id {0}")]
    DuplicateId(DebtId),
    #[error("no debt with id {0}")]
    UnknownDebt(DebtId),
    #[error("{0} must be at least one month")]
    ZeroMonths(&'static str),
    /// Compounding or summing left the range `Decimal` can represent.
    #[error("amounts exceed the decimal range while {0}")]
    Overflow(&'static str),
}

/// Reject a negative amount for the named field.
pub(crate) fn ensure_non_negative(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}
