use crate::core::error::ValidationError;
use crate::core::profile::{CreditProfile, CreditScore};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

const BASE_POINTS: u32 = 300;
const PAYMENT_HISTORY_POINTS: u32 = 65;
const HISTORY_LENGTH_POINTS: u32 = 30;

/// Estimate a credit score with an additive point model.
///
/// # Model
///
/// | Factor            | Points                                              |
/// |-------------------|-----------------------------------------------------|
/// | Base              | 300                                                 |
/// | Payment history   | bucket × 65                                         |
/// | Utilization       | <10%: 165, <30%: 135, <50%: 100, <70%: 50, else 0   |
/// | History length    | bucket × 30                                         |
/// | Hard inquiries    | 0: 55, 1–2: 30, 3–5: 10, else 0                     |
/// | Income            | >75k: 45, >40k: 25, else 0                          |
///
/// The total is capped at 850. Every term is non-negative, so 300 is the floor.
///
/// # Examples
///
/// ```
/// use debt_optimizer::core::profile::CreditProfile;
/// use debt_optimizer::scoring::credit::estimate;
/// use rust_decimal_macros::dec;
///
/// let profile = CreditProfile {
///     annual_income: dec!(80000),
///     credit_utilization_percent: dec!(5),
///     credit_history_bucket: 3,
///     payment_history_bucket: 3,
///     hard_inquiry_count: 0,
/// };
/// assert_eq!(estimate(&profile).unwrap().value(), 850);
/// ```
pub fn estimate(profile: &CreditProfile) -> Result<CreditScore, ValidationError> {
    profile.validate()?;

    let points = BASE_POINTS
        + u32::from(profile.payment_history_bucket) * PAYMENT_HISTORY_POINTS
        + utilization_points(profile.credit_utilization_percent)
        + u32::from(profile.credit_history_bucket) * HISTORY_LENGTH_POINTS
        + inquiry_points(profile.hard_inquiry_count)
        + income_points(profile.annual_income);

    log::debug!("credit profile scored {} raw points", points);
    Ok(CreditScore::from_points(points))
}

fn utilization_points(utilization: Decimal) -> u32 {
    if utilization < dec!(10) {
        165
    } else if utilization < dec!(30) {
        135
    } else if utilization < dec!(50) {
        100
    } else if utilization < dec!(70) {
        50
    } else {
        0
    }
}

fn inquiry_points(inquiries: u32) -> u32 {
    match inquiries {
        0 => 55,
        1..=2 => 30,
        3..=5 => 10,
        _ => 0,
    }
}

fn income_points(income: Decimal) -> u32 {
    if income > dec!(75000) {
        45
    } else if income > dec!(40000) {
        25
    } else {
        0
    }
}

/// Qualitative band for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditRating {
    Poor,
    Fair,
    Good,
    VeryGood,
    Excellent,
}

impl CreditRating {
    pub fn from_score(score: CreditScore) -> Self {
        match score.value() {
            800..=u16::MAX => CreditRating::Excellent,
            740..=799 => CreditRating::VeryGood,
            670..=739 => CreditRating::Good,
            580..=669 => CreditRating::Fair,
            _ => CreditRating::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CreditRating::Poor => "Poor",
            CreditRating::Fair => "Fair",
            CreditRating::Good => "Good",
            CreditRating::VeryGood => "Very Good",
            CreditRating::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for CreditRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label for a possibly not-yet-computed score.
pub fn rating_label(score: Option<CreditScore>) -> &'static str {
    score
        .map(|s| CreditRating::from_score(s).label())
        .unwrap_or("Not calculated")
}
