use crate::core::error::{ensure_non_negative, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest tier for the history and reliability buckets.
pub const MAX_BUCKET: u8 = 3;

/// Self-reported financial attributes used to estimate a credit score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditProfile {
    pub annual_income: Decimal,
    /// 0 to 100.
    pub credit_utilization_percent: Decimal,
    /// Years-of-history tier: 0 (<2y), 1 (2-5y), 2 (5-10y), 3 (10y+).
    pub credit_history_bucket: u8,
    /// Reliability tier: 0 (defaults) up to 3 (no late payments).
    pub payment_history_bucket: u8,
    pub hard_inquiry_count: u32,
}

impl CreditProfile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_non_negative("annual income", self.annual_income)?;
        if self.credit_utilization_percent < Decimal::ZERO
            || self.credit_utilization_percent > Decimal::ONE_HUNDRED
        {
            return Err(ValidationError::OutOfRange {
                field: "credit utilization",
                value: self.credit_utilization_percent,
                min: Decimal::ZERO,
                max: Decimal::ONE_HUNDRED,
            });
        }
        check_bucket("credit history", self.credit_history_bucket)?;
        check_bucket("payment history", self.payment_history_bucket)?;
        Ok(())
    }
}

fn check_bucket(field: &'static str, bucket: u8) -> Result<(), ValidationError> {
    if bucket > MAX_BUCKET {
        return Err(ValidationError::OutOfRange {
            field,
            value: Decimal::from(bucket),
            min: Decimal::ZERO,
            max: Decimal::from(MAX_BUCKET),
        });
    }
    Ok(())
}

/// An estimated score in [300, 850].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreditScore(u16);

impl CreditScore {
    pub const MIN: u16 = 300;
    pub const MAX: u16 = 850;

    /// Clamp a raw point total into the score range.
    pub fn from_points(points: u32) -> Self {
        let clamped = points.clamp(u32::from(Self::MIN), u32::from(Self::MAX));
        Self(clamped as u16)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for CreditScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn profile() -> CreditProfile {
        CreditProfile {
            annual_income: dec!(50000),
            credit_utilization_percent: dec!(30),
            credit_history_bucket: 1,
            payment_history_bucket: 2,
            hard_inquiry_count: 2,
        }
    }

    #[test]
    fn test_valid_profile() {
        assert!(profile().validate().is_ok());
    }

    #[test]
    fn test_utilization_out_of_range() {
        let mut p = profile();
        p.credit_utilization_percent = dec!(100.5);
        assert!(matches!(
            p.validate(),
            Err(ValidationError::OutOfRange {
                field: "credit utilization",
                ..
            })
        ));
    }

    #[test]
    fn test_bucket_out_of_range() {
        let mut p = profile();
        p.payment_history_bucket = 4;
        assert!(matches!(
            p.validate(),
            Err(ValidationError::OutOfRange {
                field: "payment history",
                ..
            })
        ));
    }

    #[test]
    fn test_negative_income() {
        let mut p = profile();
        p.annual_income = dec!(-1);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_score_clamps() {
        assert_eq!(CreditScore::from_points(900).value(), 850);
        assert_eq!(CreditScore::from_points(100).value(), 300);
        assert_eq!(CreditScore::from_points(612).value(), 612);
    }

    #[test]
    fn test_profile_wire_names() {
        let json = serde_json::to_value(profile()).unwrap();
        assert!(json.get("creditUtilizationPercent").is_some());
        assert!(json.get("hardInquiryCount").is_some());
        // Outside the optimizer wire format, amounts keep the string encoding.
        assert_eq!(json["annualIncome"], serde_json::json!("50000"));
    }
}
