use crate::core::debt::Debt;
use crate::core::schedule::{MonthSchedule, Schedule, ScheduleEntry};
use crate::optimization::error::OptimizationError;
use crate::optimization::formulation::{OptimizationProblem, PaymentPlan, PlanEvaluation};
use crate::optimization::protocol::OptimizationResponse;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The optimizer's plan, reshaped like an avalanche [`Schedule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizedSchedule {
    /// As reported by the optimizer.
    pub total_interest_paid: Decimal,
    /// Full horizon; use [`OptimizedSchedule::display_schedule`] for a window.
    pub schedule: Schedule,
    /// Local replay of the plan against the program's constraints.
    pub audit: PlanEvaluation,
}

impl OptimizedSchedule {
    pub fn display_schedule(&self, months: usize) -> Schedule {
        self.schedule.truncated(months)
    }
}

/// Convert an optimizer response into schedule form.
///
/// Plans must come back in request order with matching names. Payment
/// numbers must increase and stay within the program's horizon, and no amount
/// may exceed the largest balance its debt can reach. Entries after a debt
/// has closed are dropped, so a closed debt shows once with a zero balance,
/// the same as in the avalanche schedule.
pub fn reconcile(
    debts: &[Debt],
    problem: &OptimizationProblem,
    response: &OptimizationResponse,
) -> Result<OptimizedSchedule, OptimizationError> {
    if response.payment_plans.len() != debts.len() {
        return Err(OptimizationError::MalformedResponse(format!(
            "expected {} payment plans, got {}",
            debts.len(),
            response.payment_plans.len()
        )));
    }
    if response.total_interest_paid < Decimal::ZERO {
        return Err(OptimizationError::MalformedResponse(format!(
            "negative total interest {}",
            response.total_interest_paid
        )));
    }

    let horizon = problem.horizon_months();
    let ceilings = problem.balance_ceilings();
    let mut months: BTreeMap<u32, MonthSchedule> = BTreeMap::new();
    for ((debt, plan), &ceiling) in debts.iter().zip(&response.payment_plans).zip(&ceilings) {
        if plan.name != debt.name() {
            return Err(OptimizationError::MalformedResponse(format!(
                "plan '{}' does not match debt '{}'",
                plan.name,
                debt.name()
            )));
        }

        let mut balance = debt.principal();
        let mut last_month = 0;
        for payment in &plan.monthly_payments {
            if payment.payment_number > horizon {
                return Err(OptimizationError::MalformedResponse(format!(
                    "payment number {} for '{}' is past the {}-month horizon",
                    payment.payment_number, plan.name, horizon
                )));
            }
            if payment.payment_number <= last_month {
                return Err(OptimizationError::MalformedResponse(format!(
                    "payment numbers for '{}' are not increasing at {}",
                    plan.name, payment.payment_number
                )));
            }
            if payment.payment_amount < Decimal::ZERO || payment.remaining_balance < Decimal::ZERO {
                return Err(OptimizationError::MalformedResponse(format!(
                    "negative amount in month {} for '{}'",
                    payment.payment_number, plan.name
                )));
            }
            if payment.payment_amount > ceiling || payment.remaining_balance > ceiling {
                return Err(OptimizationError::MalformedResponse(format!(
                    "amount in month {} for '{}' exceeds the largest reachable balance {}",
                    payment.payment_number,
                    plan.name,
                    ceiling.round_dp(2)
                )));
            }
            last_month = payment.payment_number;
            if balance <= Decimal::ZERO {
                continue;
            }

            let interest = balance.checked_mul(debt.monthly_rate()).ok_or_else(|| {
                OptimizationError::MalformedResponse(format!(
                    "interest on '{}' leaves the decimal range in month {}",
                    plan.name, payment.payment_number
                ))
            })?;
            balance = payment.remaining_balance;
            months
                .entry(payment.payment_number)
                .or_insert_with(|| MonthSchedule::new(payment.payment_number))
                .entries
                .push(ScheduleEntry {
                    month: payment.payment_number,
                    debt_id: debt.id(),
                    payment: payment.payment_amount,
                    interest,
                    remaining_balance: payment.remaining_balance,
                });
        }
    }

    let plan = PaymentPlan::from_response(response, horizon)?;
    let audit = problem
        .evaluate(&plan)
        .map_err(|e| OptimizationError::MalformedResponse(format!("plan cannot be audited: {}", e)))?;
    if !audit.is_feasible() {
        log::warn!(
            "optimizer plan breaks {} constraint(s), first: {:?}",
            audit.violations.len(),
            audit.violations[0]
        );
    }

    Ok(OptimizedSchedule {
        total_interest_paid: response.total_interest_paid,
        schedule: Schedule::from_months(months.into_values().collect()),
        audit,
    })
}

/// Baseline against optimized, side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleComparison {
    pub baseline_interest: Decimal,
    pub optimized_interest: Decimal,
    pub baseline_payoff_month: Option<u32>,
    pub optimized_payoff_month: Option<u32>,
}

impl ScheduleComparison {
    /// `baseline` should be the untruncated avalanche simulation.
    pub fn new(baseline: &Schedule, optimized: &OptimizedSchedule) -> Self {
        Self {
            baseline_interest: baseline.total_interest(),
            optimized_interest: optimized.total_interest_paid,
            baseline_payoff_month: baseline.payoff_month(),
            optimized_payoff_month: optimized.schedule.payoff_month(),
        }
    }

    /// Interest avoided by following the optimized plan. Negative if the
    /// baseline was cheaper, which can happen when the horizons differ.
    pub fn interest_saved(&self) -> Decimal {
        self.baseline_interest - self.optimized_interest
    }
}

impl std::fmt::Display for ScheduleComparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let month = |m: Option<u32>| m.map_or_else(|| "-".to_string(), |m| m.to_string());
        writeln!(f, "=== Avalanche vs Optimized ===")?;
        writeln!(f, "Baseline Interest:   {}", self.baseline_interest.round_dp(2))?;
        writeln!(f, "Optimized Interest:  {}", self.optimized_interest.round_dp(2))?;
        writeln!(f, "Interest Saved:      {}", self.interest_saved().round_dp(2))?;
        writeln!(f, "Baseline Payoff:     {}", month(self.baseline_payoff_month))?;
        writeln!(f, "Optimized Payoff:    {}", month(self.optimized_payoff_month))
    }
}
