//! Wire format spoken with the remote optimizer.
//!
//! JSON, camelCase keys, amounts and rates as JSON numbers. Interest rates
//! travel as annual fractions (0.22), not percentages.

use crate::core::debt::Debt;
use crate::core::error::ValidationError;
use crate::optimization::formulation::{checked_sum, minimum_due};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_budget: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_income: Decimal,
    pub debts: Vec<DebtPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayload {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    /// Annual rate as a fraction.
    #[serde(with = "rust_decimal::serde::float")]
    pub interest_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub minimum_payment: Decimal,
}

impl From<&Debt> for DebtPayload {
    fn from(debt: &Debt) -> Self {
        Self {
            name: debt.name().to_string(),
            balance: debt.principal(),
            interest_rate: debt.annual_rate_fraction(),
            minimum_payment: debt.minimum_payment(),
        }
    }
}

impl OptimizationRequest {
    /// Build a request from debts in input order, converting rates to fractions.
    pub fn new(debts: &[Debt], monthly_budget: Decimal, monthly_income: Decimal) -> Self {
        Self {
            monthly_budget,
            monthly_income,
            debts: debts.iter().map(DebtPayload::from).collect(),
        }
    }

    /// Budget the first month needs: each open debt's minimum, capped at its
    /// payoff. Matches [`OptimizationProblem::required_monthly_minimum`] for
    /// the same debts.
    ///
    /// [`OptimizationProblem::required_monthly_minimum`]: crate::optimization::formulation::OptimizationProblem::required_monthly_minimum
    pub fn required_monthly_minimum(&self) -> Result<Decimal, ValidationError> {
        let dues = self
            .debts
            .iter()
            .map(|d| minimum_due(d.balance, d.interest_rate / Decimal::from(12), d.minimum_payment))
            .collect::<Result<Vec<_>, _>>()?;
        checked_sum(dues, "summing minimum payments")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_interest_paid: Decimal,
    pub payment_plans: Vec<PaymentPlanPayload>,
}

/// One debt's month-by-month plan, in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPlanPayload {
    pub name: String,
    pub monthly_payments: Vec<MonthlyPaymentPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPaymentPayload {
    /// 1-based month.
    pub payment_number: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub payment_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_balance: Decimal,
}
