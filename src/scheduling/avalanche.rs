use crate::core::debt::Debt;
use crate::core::error::{ensure_non_negative, ValidationError};
use crate::core::schedule::{MonthSchedule, Schedule, ScheduleEntry};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Tuning for an avalanche run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOptions {
    /// Added on top of the minimum payment of the priority debt.
    pub extra_increment: Decimal,
    /// Hard stop for the simulation, whether or not balances reach zero.
    pub horizon_months: u32,
    /// How many months [`AvalancheScheduler::schedule`] returns.
    pub display_months: u32,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            extra_increment: dec!(50),
            horizon_months: 60,
            display_months: 12,
        }
    }
}

impl ScheduleOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_non_negative("extra increment", self.extra_increment)?;
        if self.horizon_months == 0 {
            return Err(ValidationError::ZeroMonths("horizon"));
        }
        if self.display_months == 0 {
            return Err(ValidationError::ZeroMonths("display window"));
        }
        Ok(())
    }
}

/// Month-by-month simulation of the avalanche payoff policy.
///
/// The priority list is fixed up front: debts sorted by descending annual
/// rate, ties kept in input order. Each month the first open debt in that
/// list receives `minimum + extra` (capped at what closes it), every other
/// open debt receives exactly its minimum.
///
/// This is a heuristic baseline, not an optimal allocation.
pub struct AvalancheScheduler;

impl AvalancheScheduler {
    /// Simulate and return the first `display_months` months.
    ///
    /// # Examples
    ///
    /// ```
    /// use debt_optimizer::core::debt::Debt;
    /// use debt_optimizer::scheduling::avalanche::{AvalancheScheduler, ScheduleOptions};
    /// use rust_decimal_macros::dec;
    ///
    /// let card = Debt::new("Card", dec!(1000), dec!(100), dec!(12), 12).unwrap();
    /// let schedule = AvalancheScheduler::schedule(&[card.clone()], &ScheduleOptions::default()).unwrap();
    ///
    /// let first = schedule.entry(1, card.id()).unwrap();
    /// assert_eq!(first.payment, dec!(150));
    /// assert_eq!(first.remaining_balance, dec!(860));
    /// ```
    pub fn schedule(debts: &[Debt], options: &ScheduleOptions) -> Result<Schedule, ValidationError> {
        let full = Self::simulate(debts, options)?;
        Ok(full.truncated(options.display_months as usize))
    }

    /// Simulate up to `horizon_months` without truncating for display.
    ///
    /// # Algorithm
    ///
    /// 1. Order debts by descending rate (stable).
    /// 2. Each month, accrue `rate / 1200 * balance` on every open debt.
    /// 3. The priority debt pays `min(balance + interest, minimum + extra)`;
    ///    the others pay their minimum, even when it does not cover interest.
    /// 4. `balance = max(0, balance - (payment - interest))`.
    ///
    /// Stops when every balance is zero or the horizon is reached. Fails with
    /// [`ValidationError::Overflow`] if a balance outgrows the decimal range.
    pub fn simulate(debts: &[Debt], options: &ScheduleOptions) -> Result<Schedule, ValidationError> {
        options.validate()?;
        for debt in debts {
            debt.validate()?;
        }

        let overflow = || ValidationError::Overflow("simulating the schedule");
        let order = Self::priority_order(debts);
        let mut balances: Vec<Decimal> = order.iter().map(|d| d.principal()).collect();
        let mut warned = vec![false; order.len()];
        let mut schedule = Schedule::new();

        // Debts only ever close, so the priority debt only moves forward.
        let mut cursor = 0;
        for month in 1..=options.horizon_months {
            while cursor < balances.len() && balances[cursor] <= Decimal::ZERO {
                cursor += 1;
            }
            if cursor == balances.len() {
                break;
            }

            let mut group = MonthSchedule::new(month);
            for pos in cursor..order.len() {
                let balance = balances[pos];
                if balance <= Decimal::ZERO {
                    continue;
                }
                let debt = order[pos];
                let interest = debt.monthly_rate().checked_mul(balance).ok_or_else(overflow)?;
                let payoff = balance.checked_add(interest).ok_or_else(overflow)?;
                let payment = if pos == cursor {
                    let boosted = debt
                        .minimum_payment()
                        .checked_add(options.extra_increment)
                        .ok_or_else(overflow)?;
                    payoff.min(boosted)
                } else {
                    debt.minimum_payment()
                };
                // A closing payment zeroes the balance exactly.
                let remaining = if payment >= payoff {
                    Decimal::ZERO
                } else {
                    balance.checked_sub(payment - interest).ok_or_else(overflow)?
                };
                if remaining > balance && !warned[pos] {
                    warned[pos] = true;
                    log::warn!(
                        "debt '{}' negatively amortizes in month {}: minimum {} < interest {}",
                        debt.name(),
                        month,
                        debt.minimum_payment(),
                        interest.round_dp(2)
                    );
                }
                balances[pos] = remaining;
                group.entries.push(ScheduleEntry {
                    month,
                    debt_id: debt.id(),
                    payment,
                    interest,
                    remaining_balance: remaining,
                });
            }
            schedule.push(group);
        }

        log::debug!(
            "avalanche simulated {} debts over {} months (payoff: {:?})",
            debts.len(),
            schedule.len(),
            schedule.payoff_month()
        );
        Ok(schedule)
    }

    /// Debts in avalanche priority: descending rate, stable on ties.
    pub fn priority_order(debts: &[Debt]) -> Vec<&Debt> {
        let mut ordered: Vec<&Debt> = debts.iter().collect();
        ordered.sort_by(|a, b| b.annual_interest_rate().cmp(&a.annual_interest_rate()));
        ordered
    }
}
