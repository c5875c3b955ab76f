//! The interest-minimizing allocation program solved by the remote optimizer.
//!
//! For debts `d` and months `m = 1..=H`:
//!
//! ```text
//! minimize    Σ_d Σ_m balance[d, m-1] · r[d]
//! subject to  balance[d, 0] = balance0[d]
//!             balance[d, m] = balance[d, m-1] · (1 + r[d]) − payment[d, m]
//!             balance[d, m] ≥ 0
//!             payment[d, m] ≥ min(minPayment[d], balance[d, m-1] · (1 + r[d]))   while open
//!             payment[d, m] = 0                                                   once closed
//!             Σ_d payment[d, m] ≤ monthlyBudget
//! ```
//!
//! The program is held as data so that it can be exported, and so that a plan
//! coming back from the optimizer can be audited against it locally.

use crate::core::debt::Debt;
use crate::core::error::{ensure_non_negative, ValidationError};
use crate::optimization::error::OptimizationError;
use crate::optimization::protocol::{MonthlyPaymentPayload, OptimizationResponse, PaymentPlanPayload};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Months covered by the program unless configured otherwise.
pub const DEFAULT_HORIZON_MONTHS: u32 = 24;

/// Slack allowed when auditing plans computed in floating point.
pub const AUDIT_TOLERANCE: Decimal = dec!(0.01);

/// A decision or state variable of the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// `payment[debt, month]`, months 1..=H.
    Payment { debt: usize, month: u32 },
    /// `balance[debt, month]`, months 0..=H.
    Balance { debt: usize, month: u32 },
}

/// One row of the program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    InitialBalance { debt: usize, balance: Decimal },
    /// `balance[d, m] = balance[d, m-1] · growth − payment[d, m]`.
    BalanceRecurrence { debt: usize, month: u32, growth: Decimal },
    NonNegativeBalance { debt: usize, month: u32 },
    /// Indicator row: the minimum applies only while the debt is open.
    MinimumWhileOpen { debt: usize, month: u32, minimum: Decimal },
    MonthlyBudget { month: u32, budget: Decimal },
}

/// The per-debt parameters of the program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDebt {
    pub name: String,
    pub initial_balance: Decimal,
    /// Monthly rate as a fraction.
    pub monthly_rate: Decimal,
    pub minimum_payment: Decimal,
    /// Annual rate in percent, kept for priority ordering.
    pub annual_rate: Decimal,
}

impl ProgramDebt {
    /// Balance plus one month of interest.
    fn payoff(&self, balance: Decimal) -> Result<Decimal, ValidationError> {
        accrue(balance, self.monthly_rate)
    }
}

/// `balance · (1 + monthly_rate)`.
pub(crate) fn accrue(balance: Decimal, monthly_rate: Decimal) -> Result<Decimal, ValidationError> {
    balance
        .checked_mul(monthly_rate)
        .and_then(|interest| balance.checked_add(interest))
        .ok_or(ValidationError::Overflow("accruing interest"))
}

/// What an open debt owes this month: its minimum, or the payoff when that
/// is smaller. Closed debts owe nothing.
pub(crate) fn minimum_due(
    balance: Decimal,
    monthly_rate: Decimal,
    minimum_payment: Decimal,
) -> Result<Decimal, ValidationError> {
    if balance <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    Ok(minimum_payment.min(accrue(balance, monthly_rate)?))
}

pub(crate) fn checked_sum(
    amounts: impl IntoIterator<Item = Decimal>,
    context: &'static str,
) -> Result<Decimal, ValidationError> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
        .ok_or(ValidationError::Overflow(context))
}

/// A month-by-month allocation: `payments[d][m - 1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub payments: Vec<Vec<Decimal>>,
}

impl PaymentPlan {
    pub fn payment(&self, debt: usize, month: u32) -> Decimal {
        month
            .checked_sub(1)
            .and_then(|m| self.payments.get(debt)?.get(m as usize))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Rebuild a plan from optimizer output, in request order.
    ///
    /// Payment numbers must increase within each plan and stay inside
    /// `1..=horizon_months`.
    pub fn from_response(response: &OptimizationResponse, horizon_months: u32) -> Result<Self, OptimizationError> {
        let mut payments = Vec::with_capacity(response.payment_plans.len());
        for plan in &response.payment_plans {
            let mut row: Vec<Decimal> = Vec::new();
            for entry in &plan.monthly_payments {
                if entry.payment_number == 0 || entry.payment_number > horizon_months {
                    return Err(OptimizationError::MalformedResponse(format!(
                        "payment number {} outside months 1..={} in plan for '{}'",
                        entry.payment_number, horizon_months, plan.name
                    )));
                }
                let index = (entry.payment_number - 1) as usize;
                if index < row.len() {
                    return Err(OptimizationError::MalformedResponse(format!(
                        "payment number {} out of order in plan for '{}'",
                        entry.payment_number, plan.name
                    )));
                }
                row.resize(index + 1, Decimal::ZERO);
                row[index] = entry.payment_amount;
            }
            payments.push(row);
        }
        Ok(Self { payments })
    }
}

/// A constraint broken by a plan, as found by [`OptimizationProblem::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    NegativePayment { debt: usize, month: u32, payment: Decimal },
    BelowMinimum { debt: usize, month: u32, payment: Decimal, required: Decimal },
    /// Pays more than the balance plus interest, driving the balance negative.
    Overpayment { debt: usize, month: u32, payment: Decimal, payoff: Decimal },
    PaymentAfterPayoff { debt: usize, month: u32, payment: Decimal },
    BudgetExceeded { month: u32, total: Decimal, budget: Decimal },
    WrongDebtCount { expected: usize, actual: usize },
}

/// Objective value and feasibility audit of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEvaluation {
    pub total_interest: Decimal,
    pub total_paid: Decimal,
    /// `balance[d, H]` per debt.
    pub final_balances: Vec<Decimal>,
    pub violations: Vec<Violation>,
}

impl PlanEvaluation {
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn paid_off_by_horizon(&self) -> bool {
        self.final_balances.iter().all(|b| *b == Decimal::ZERO)
    }
}

/// The allocation program for one set of debts and one budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationProblem {
    debts: Vec<ProgramDebt>,
    monthly_budget: Decimal,
    horizon_months: u32,
}

impl OptimizationProblem {
    pub fn new(debts: &[Debt], monthly_budget: Decimal, horizon_months: u32) -> Result<Self, ValidationError> {
        ensure_non_negative("monthly budget", monthly_budget)?;
        if horizon_months == 0 {
            return Err(ValidationError::ZeroMonths("horizon"));
        }
        let mut program_debts = Vec::with_capacity(debts.len());
        for debt in debts {
            debt.validate()?;
            program_debts.push(ProgramDebt {
                name: debt.name().to_string(),
                initial_balance: debt.principal(),
                monthly_rate: debt.monthly_rate(),
                minimum_payment: debt.minimum_payment(),
                annual_rate: debt.annual_interest_rate(),
            });
        }
        Ok(Self {
            debts: program_debts,
            monthly_budget,
            horizon_months,
        })
    }

    pub fn debts(&self) -> &[ProgramDebt] {
        &self.debts
    }

    pub fn monthly_budget(&self) -> Decimal {
        self.monthly_budget
    }

    pub fn horizon_months(&self) -> u32 {
        self.horizon_months
    }

    /// Every variable, payments first, then balances.
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars = Vec::with_capacity(self.debts.len() * (2 * self.horizon_months as usize + 1));
        for debt in 0..self.debts.len() {
            for month in 1..=self.horizon_months {
                vars.push(Variable::Payment { debt, month });
            }
        }
        for debt in 0..self.debts.len() {
            for month in 0..=self.horizon_months {
                vars.push(Variable::Balance { debt, month });
            }
        }
        vars
    }

    pub fn constraints(&self) -> Vec<Constraint> {
        let mut rows = Vec::new();
        for (d, debt) in self.debts.iter().enumerate() {
            rows.push(Constraint::InitialBalance {
                debt: d,
                balance: debt.initial_balance,
            });
            for month in 1..=self.horizon_months {
                rows.push(Constraint::BalanceRecurrence {
                    debt: d,
                    month,
                    growth: Decimal::ONE + debt.monthly_rate,
                });
                rows.push(Constraint::NonNegativeBalance { debt: d, month });
                rows.push(Constraint::MinimumWhileOpen {
                    debt: d,
                    month,
                    minimum: debt.minimum_payment,
                });
            }
        }
        for month in 1..=self.horizon_months {
            rows.push(Constraint::MonthlyBudget {
                month,
                budget: self.monthly_budget,
            });
        }
        rows
    }

    /// Objective coefficients: interest accrues on each opening balance.
    pub fn objective(&self) -> Vec<(Variable, Decimal)> {
        let mut terms = Vec::with_capacity(self.debts.len() * self.horizon_months as usize);
        for (d, debt) in self.debts.iter().enumerate() {
            for month in 0..self.horizon_months {
                terms.push((Variable::Balance { debt: d, month }, debt.monthly_rate));
            }
        }
        terms
    }

    /// Budget needed to honour every month-1 minimum payment.
    ///
    /// Later months never need more: a debt whose minimum exceeds its payoff
    /// closes in month 1.
    pub fn required_monthly_minimum(&self) -> Result<Decimal, ValidationError> {
        let dues = self
            .debts
            .iter()
            .map(|d| minimum_due(d.initial_balance, d.monthly_rate, d.minimum_payment))
            .collect::<Result<Vec<_>, _>>()?;
        checked_sum(dues, "summing minimum payments")
    }

    /// Largest balance each debt can reach inside the horizon: the initial
    /// balance compounded with no payments, plus the audit tolerance.
    /// Saturates at `Decimal::MAX`.
    pub fn balance_ceilings(&self) -> Vec<Decimal> {
        self.debts
            .iter()
            .map(|debt| {
                let mut ceiling = debt.initial_balance;
                if debt.monthly_rate > Decimal::ZERO {
                    for _ in 0..self.horizon_months {
                        match debt.payoff(ceiling) {
                            Ok(next) => ceiling = next,
                            Err(_) => return Decimal::MAX,
                        }
                    }
                }
                ceiling.saturating_add(AUDIT_TOLERANCE)
            })
            .collect()
    }

    pub fn check_feasibility(&self) -> Result<(), OptimizationError> {
        let required = self.required_monthly_minimum()?;
        if self.monthly_budget < required {
            return Err(OptimizationError::InfeasibleAllocation {
                budget: self.monthly_budget,
                required,
            });
        }
        Ok(())
    }

    /// Replay a plan through the balance recurrence and audit it.
    ///
    /// Fails only when the replayed amounts leave the decimal range.
    pub fn evaluate(&self, plan: &PaymentPlan) -> Result<PlanEvaluation, ValidationError> {
        let overflow = || ValidationError::Overflow("auditing a payment plan");
        let mut violations = Vec::new();
        if plan.payments.len() != self.debts.len() {
            violations.push(Violation::WrongDebtCount {
                expected: self.debts.len(),
                actual: plan.payments.len(),
            });
        }

        let mut balances: Vec<Decimal> = self.debts.iter().map(|d| d.initial_balance).collect();
        let mut total_interest = Decimal::ZERO;
        let mut total_paid = Decimal::ZERO;

        for month in 1..=self.horizon_months {
            let mut month_total = Decimal::ZERO;
            for (d, debt) in self.debts.iter().enumerate() {
                let payment = plan.payment(d, month);
                month_total = month_total.checked_add(payment).ok_or_else(overflow)?;
                if payment < Decimal::ZERO {
                    violations.push(Violation::NegativePayment { debt: d, month, payment });
                }

                let balance = balances[d];
                if balance <= Decimal::ZERO {
                    if payment > AUDIT_TOLERANCE {
                        violations.push(Violation::PaymentAfterPayoff { debt: d, month, payment });
                    }
                    continue;
                }

                let interest = balance.checked_mul(debt.monthly_rate).ok_or_else(overflow)?;
                let payoff = balance.checked_add(interest).ok_or_else(overflow)?;
                let required = debt.minimum_payment.min(payoff);
                if required.checked_sub(payment).map_or(true, |short| short > AUDIT_TOLERANCE) {
                    violations.push(Violation::BelowMinimum {
                        debt: d,
                        month,
                        payment,
                        required,
                    });
                }
                if payment.checked_sub(payoff).map_or(false, |excess| excess > AUDIT_TOLERANCE) {
                    violations.push(Violation::Overpayment {
                        debt: d,
                        month,
                        payment,
                        payoff,
                    });
                }

                total_interest = total_interest.checked_add(interest).ok_or_else(overflow)?;
                total_paid = total_paid.checked_add(payment).ok_or_else(overflow)?;
                let next = payoff.checked_sub(payment).ok_or_else(overflow)?;
                balances[d] = if next <= AUDIT_TOLERANCE { Decimal::ZERO } else { next };
            }
            if month_total
                .checked_sub(self.monthly_budget)
                .map_or(false, |over| over > AUDIT_TOLERANCE)
            {
                violations.push(Violation::BudgetExceeded {
                    month,
                    total: month_total,
                    budget: self.monthly_budget,
                });
            }
        }

        Ok(PlanEvaluation {
            total_interest,
            total_paid,
            final_balances: balances,
            violations,
        })
    }

    /// A feasible point of the program: every open debt gets its minimum,
    /// the rest of the budget goes to debts in descending-rate order.
    ///
    /// Gives an upper bound on the optimal interest.
    pub fn avalanche_plan(&self) -> Result<PaymentPlan, OptimizationError> {
        self.check_feasibility()?;

        let mut order: Vec<usize> = (0..self.debts.len()).collect();
        order.sort_by(|&a, &b| self.debts[b].annual_rate.cmp(&self.debts[a].annual_rate));

        let mut balances: Vec<Decimal> = self.debts.iter().map(|d| d.initial_balance).collect();
        let mut payments = vec![Vec::with_capacity(self.horizon_months as usize); self.debts.len()];

        for _ in 1..=self.horizon_months {
            let payoffs = self
                .debts
                .iter()
                .zip(&balances)
                .map(|(debt, &b)| if b > Decimal::ZERO { debt.payoff(b) } else { Ok(Decimal::ZERO) })
                .collect::<Result<Vec<_>, _>>()?;

            let mut month: Vec<Decimal> = self
                .debts
                .iter()
                .zip(&payoffs)
                .map(|(debt, &payoff)| debt.minimum_payment.min(payoff))
                .collect();

            let mut spare = self.monthly_budget - checked_sum(month.iter().copied(), "planning a month")?;
            for &d in &order {
                if spare <= Decimal::ZERO {
                    break;
                }
                let extra = (payoffs[d] - month[d]).min(spare);
                if extra > Decimal::ZERO {
                    month[d] += extra;
                    spare -= extra;
                }
            }

            for (d, payment) in month.into_iter().enumerate() {
                // Same snapping as `evaluate`.
                let next = payoffs[d] - payment;
                balances[d] = if next <= AUDIT_TOLERANCE { Decimal::ZERO } else { next };
                payments[d].push(payment);
            }
        }

        Ok(PaymentPlan { payments })
    }

    /// Describe a plan in the optimizer's response format.
    ///
    /// Months after a debt has closed are left out of its plan.
    pub fn to_response(&self, plan: &PaymentPlan) -> Result<OptimizationResponse, ValidationError> {
        let evaluation = self.evaluate(plan)?;
        let mut payment_plans = Vec::with_capacity(self.debts.len());
        for (d, debt) in self.debts.iter().enumerate() {
            let mut balance = debt.initial_balance;
            let mut monthly_payments = Vec::new();
            for month in 1..=self.horizon_months {
                if balance <= Decimal::ZERO {
                    break;
                }
                let payment = plan.payment(d, month);
                let next = debt
                    .payoff(balance)?
                    .checked_sub(payment)
                    .ok_or(ValidationError::Overflow("describing a payment plan"))?;
                balance = if next <= AUDIT_TOLERANCE { Decimal::ZERO } else { next };
                monthly_payments.push(MonthlyPaymentPayload {
                    payment_number: month,
                    payment_amount: payment,
                    remaining_balance: balance,
                });
            }
            payment_plans.push(PaymentPlanPayload {
                name: debt.name.clone(),
                monthly_payments,
            });
        }
        Ok(OptimizationResponse {
            total_interest_paid: evaluation.total_interest,
            payment_plans,
        })
    }
}
