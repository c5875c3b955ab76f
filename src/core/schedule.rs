use crate::core::debt::DebtId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One (month, debt) payment event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// 1-based month number.
    pub month: u32,
    pub debt_id: DebtId,
    pub payment: Decimal,
    /// Interest accrued on the opening balance this month.
    pub interest: Decimal,
    pub remaining_balance: Decimal,
}

impl ScheduleEntry {
    /// Principal retired by this payment. Negative under negative amortization.
    pub fn principal_portion(&self) -> Decimal {
        self.payment - self.interest
    }

    pub fn closes_debt(&self) -> bool {
        self.remaining_balance == Decimal::ZERO
    }
}

/// All payments made in a single month, in priority order.
///
/// Debts closed in an earlier month do not appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSchedule {
    pub month: u32,
    pub entries: Vec<ScheduleEntry>,
}

impl MonthSchedule {
    pub fn new(month: u32) -> Self {
        Self {
            month,
            entries: Vec::new(),
        }
    }

    pub fn entry(&self, id: DebtId) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|e| e.debt_id == id)
    }

    pub fn total_paid(&self) -> Decimal {
        self.entries.iter().map(|e| e.payment).sum()
    }

    pub fn total_interest(&self) -> Decimal {
        self.entries.iter().map(|e| e.interest).sum()
    }

    pub fn total_remaining(&self) -> Decimal {
        self.entries.iter().map(|e| e.remaining_balance).sum()
    }
}

/// A month-by-month payment timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    months: Vec<MonthSchedule>,
}

impl Schedule {
    pub fn new() -> Self {
        Self { months: Vec::new() }
    }

    pub fn from_months(months: Vec<MonthSchedule>) -> Self {
        Self { months }
    }

    pub fn push(&mut self, month: MonthSchedule) {
        self.months.push(month);
    }

    pub fn months(&self) -> &[MonthSchedule] {
        &self.months
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// The first `n` months.
    pub fn truncated(&self, n: usize) -> Schedule {
        Schedule {
            months: self.months.iter().take(n).cloned().collect(),
        }
    }

    pub fn month(&self, month: u32) -> Option<&MonthSchedule> {
        self.months.iter().find(|m| m.month == month)
    }

    pub fn entry(&self, month: u32, id: DebtId) -> Option<&ScheduleEntry> {
        self.month(month).and_then(|m| m.entry(id))
    }

    /// Every entry for one debt, in month order.
    pub fn entries_for(&self, id: DebtId) -> Vec<&ScheduleEntry> {
        self.months.iter().filter_map(|m| m.entry(id)).collect()
    }

    pub fn total_paid(&self) -> Decimal {
        self.months.iter().map(|m| m.total_paid()).sum()
    }

    pub fn total_interest(&self) -> Decimal {
        self.months.iter().map(|m| m.total_interest()).sum()
    }

    /// Month in which the last open debt closed, if the timeline reaches it.
    pub fn payoff_month(&self) -> Option<u32> {
        let last = self.months.last()?;
        if last.entries.iter().all(|e| e.closes_debt()) {
            Some(last.month)
        } else {
            None
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Payment Schedule ===")?;
        for month in &self.months {
            writeln!(f, "Month {:>3}", month.month)?;
            for entry in &month.entries {
                writeln!(
                    f,
                    "  {}  pay {:>12}  interest {:>10}  balance {:>12}",
                    entry.debt_id,
                    entry.payment.round_dp(2),
                    entry.interest.round_dp(2),
                    entry.remaining_balance.round_dp(2)
                )?;
            }
        }
        writeln!(f, "Total Paid:     {}", self.total_paid().round_dp(2))?;
        writeln!(f, "Total Interest: {}", self.total_interest().round_dp(2))?;
        match self.payoff_month() {
            Some(m) => writeln!(f, "Payoff Month:   {}", m),
            None => writeln!(f, "Payoff Month:   not within schedule"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(month: u32, id: DebtId, payment: Decimal, interest: Decimal, balance: Decimal) -> ScheduleEntry {
        ScheduleEntry {
            month,
            debt_id: id,
            payment,
            interest,
            remaining_balance: balance,
        }
    }

    fn two_month_schedule(a: DebtId, b: DebtId) -> Schedule {
        let mut m1 = MonthSchedule::new(1);
        m1.entries.push(entry(1, a, dec!(150), dec!(10), dec!(860)));
        m1.entries.push(entry(1, b, dec!(50), dec!(5), dec!(455)));
        let mut m2 = MonthSchedule::new(2);
        m2.entries.push(entry(2, a, dec!(868.6), dec!(8.6), dec!(0)));
        m2.entries.push(entry(2, b, dec!(459.55), dec!(4.55), dec!(0)));
        Schedule::from_months(vec![m1, m2])
    }

    #[test]
    fn test_schedule_totals() {
        let (a, b) = (DebtId::new(), DebtId::new());
        let schedule = two_month_schedule(a, b);
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.total_paid(), dec!(1528.15));
        assert_eq!(schedule.total_interest(), dec!(28.15));
        assert_eq!(schedule.payoff_month(), Some(2));
    }

    #[test]
    fn test_schedule_lookup() {
        let (a, b) = (DebtId::new(), DebtId::new());
        let schedule = two_month_schedule(a, b);
        assert_eq!(schedule.entry(1, a).unwrap().payment, dec!(150));
        assert_eq!(schedule.entry(1, a).unwrap().principal_portion(), dec!(140));
        assert!(schedule.entry(3, a).is_none());
        assert_eq!(schedule.entries_for(b).len(), 2);
    }

    #[test]
    fn test_truncated_loses_payoff() {
        let (a, b) = (DebtId::new(), DebtId::new());
        let schedule = two_month_schedule(a, b).truncated(1);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.payoff_month(), None);
    }

    #[test]
    fn test_empty_schedule() {
        let schedule = Schedule::new();
        assert!(schedule.is_empty());
        assert_eq!(schedule.total_paid(), Decimal::ZERO);
        assert_eq!(schedule.payoff_month(), None);
    }
}
