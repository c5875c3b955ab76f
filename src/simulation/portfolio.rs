//! Random debt portfolios for benchmarks, demos and property checks.

use crate::core::debt::{Debt, DebtSet};
use crate::core::error::ValidationError;
use rand::Rng;
use rust_decimal::Decimal;

/// Ranges to draw a random portfolio from.
#[derive(Debug, Clone)]
pub struct PortfolioConfig {
    pub debt_count: usize,
    pub min_principal: Decimal,
    pub max_principal: Decimal,
    /// Annual rate range in percent.
    pub min_rate: Decimal,
    pub max_rate: Decimal,
    /// Minimum payment as a share of principal, e.g. 0.03 for 3%.
    pub minimum_payment_ratio: Decimal,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            debt_count: 5,
            min_principal: Decimal::from(500),
            max_principal: Decimal::from(25_000),
            min_rate: Decimal::from(3),
            max_rate: Decimal::from(29),
            minimum_payment_ratio: Decimal::new(3, 2),
        }
    }
}

fn random_between<R: Rng>(rng: &mut R, low: Decimal, high: Decimal, dp: u32) -> Decimal {
    if high <= low {
        return low;
    }
    // Draw in hundredths to stay in Decimal arithmetic.
    let span = ((high - low) * Decimal::ONE_HUNDRED).trunc();
    let steps: u64 = span.try_into().unwrap_or(0);
    let pick = rng.gen_range(0..=steps);
    (low + Decimal::from(pick) / Decimal::ONE_HUNDRED).round_dp(dp)
}

/// Generate a random portfolio of valid debts.
pub fn generate_random_portfolio(config: &PortfolioConfig) -> Result<DebtSet, ValidationError> {
    let mut rng = rand::thread_rng();
    let mut set = DebtSet::new();

    for i in 0..config.debt_count {
        let principal = random_between(&mut rng, config.min_principal, config.max_principal, 2);
        let rate = random_between(&mut rng, config.min_rate, config.max_rate, 2);
        let minimum = (principal * config.minimum_payment_ratio).round_dp(2);
        let term = rng.gen_range(12..=120);
        set.add(Debt::new(
            format!("DEBT-{:03}", i),
            principal,
            minimum,
            rate,
            term,
        )?)?;
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::avalanche::{AvalancheScheduler, ScheduleOptions};

    #[test]
    fn test_random_portfolio_generation() {
        let config = PortfolioConfig {
            debt_count: 8,
            ..Default::default()
        };
        let set = generate_random_portfolio(&config).unwrap();
        assert_eq!(set.len(), 8);
        for debt in set.debts() {
            assert!(debt.principal() >= config.min_principal);
            assert!(debt.principal() <= config.max_principal);
            assert!(debt.annual_interest_rate() >= config.min_rate);
            assert!(debt.annual_interest_rate() <= config.max_rate);
        }
    }

    #[test]
    fn test_random_portfolio_schedules() {
        let set = generate_random_portfolio(&PortfolioConfig::default()).unwrap();
        let options = ScheduleOptions::default();
        let schedule = AvalancheScheduler::schedule(set.debts(), &options).unwrap();
        assert!(!schedule.is_empty());
        assert!(schedule.len() <= options.display_months as usize);
    }

    #[test]
    fn test_degenerate_range() {
        let config = PortfolioConfig {
            debt_count: 1,
            min_principal: Decimal::from(1000),
            max_principal: Decimal::from(1000),
            ..Default::default()
        };
        let set = generate_random_portfolio(&config).unwrap();
        assert_eq!(set.total_principal(), Decimal::from(1000));
    }
}
