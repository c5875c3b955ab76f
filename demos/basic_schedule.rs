//! Avalanche schedule and credit score for a small household.
//!
//! Shows the priority order, the first months of the payoff schedule and
//! how changing the extra payment moves the payoff date.

use debt_optimizer::core::debt::{Debt, DebtSet};
use debt_optimizer::core::profile::CreditProfile;
use debt_optimizer::scheduling::avalanche::{AvalancheScheduler, ScheduleOptions};
use debt_optimizer::scoring::credit::{estimate, CreditRating};
use rust_decimal_macros::dec;

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║  debt-optimizer: Basic Schedule Example  ║");
    println!("╚══════════════════════════════════════════╝\n");

    let set = DebtSet::try_from_debts(vec![
        Debt::new("Car Loan", dec!(12_000), dec!(320), dec!(6.5), 48).unwrap(),
        Debt::new("Visa", dec!(2_500), dec!(100), dec!(22), 36).unwrap(),
        Debt::new("Student Loan", dec!(18_000), dec!(210), dec!(4.5), 120).unwrap(),
        Debt::new("Store Card", dec!(800), dec!(35), dec!(26.99), 24).unwrap(),
    ])
    .unwrap();

    // --- Scenario 1: Priority order ---
    println!("━━━ Scenario 1: Priority Order ━━━\n");
    println!("Total debt:       ${}", set.total_principal());
    println!("Average rate:     {}%", set.average_interest_rate().round_dp(2));
    println!("Minimums/month:   ${}\n", set.total_minimum_payment());
    for (i, debt) in set.priority_order().iter().enumerate() {
        println!("  {}. {:<14} {:>6}%  ${}", i + 1, debt.name(), debt.annual_interest_rate(), debt.principal());
    }
    println!();

    // --- Scenario 2: Default schedule ---
    println!("━━━ Scenario 2: Avalanche Schedule (first 12 months) ━━━\n");
    let options = ScheduleOptions::default();
    let schedule = AvalancheScheduler::schedule(set.debts(), &options).unwrap();
    println!("{}", schedule);

    // --- Scenario 3: Bigger extra payment ---
    println!("━━━ Scenario 3: Effect of the Extra Payment ━━━\n");
    for extra in [dec!(0), dec!(50), dec!(200), dec!(500)] {
        let options = ScheduleOptions {
            extra_increment: extra,
            horizon_months: 240,
            ..Default::default()
        };
        let full = AvalancheScheduler::simulate(set.debts(), &options).unwrap();
        let payoff = full
            .payoff_month()
            .map_or_else(|| "not within horizon".to_string(), |m| format!("{} months", m));
        println!(
            "  extra ${:<5} interest ${:>10}  payoff {}",
            extra,
            full.total_interest().round_dp(2),
            payoff
        );
    }
    println!();

    // --- Scenario 4: Credit score ---
    println!("━━━ Scenario 4: Credit Score ━━━\n");
    let profile = CreditProfile {
        annual_income: dec!(52_000),
        credit_utilization_percent: dec!(28),
        credit_history_bucket: 1,
        payment_history_bucket: 2,
        hard_inquiry_count: 1,
    };
    let score = estimate(&profile).unwrap();
    println!("  Estimated score: {} ({})", score, CreditRating::from_score(score));
}
