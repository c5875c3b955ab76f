//! Baseline avalanche against an optimized allocation.
//!
//! Plugs an in-process optimizer into the client through the transport
//! trait, so the demo runs without a server. Set `OPTIMIZER_ENDPOINT` to
//! query a real optimizer instead.

use debt_optimizer::core::debt::{Debt, DebtSet};
use debt_optimizer::optimization::client::{OptimizerClient, OptimizerTransport};
use debt_optimizer::optimization::error::OptimizationError;
use debt_optimizer::optimization::formulation::OptimizationProblem;
use debt_optimizer::optimization::protocol::{OptimizationRequest, OptimizationResponse};
use debt_optimizer::optimization::reconcile::{OptimizedSchedule, ScheduleComparison};
use debt_optimizer::scheduling::avalanche::{AvalancheScheduler, ScheduleOptions};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Allocates the whole budget highest-rate-first, every month.
struct GreedyOptimizer {
    horizon: u32,
}

impl OptimizerTransport for GreedyOptimizer {
    async fn submit(&self, request: &OptimizationRequest) -> Result<OptimizationResponse, OptimizationError> {
        let debts = request
            .debts
            .iter()
            .map(|d| {
                Debt::new(
                    d.name.clone(),
                    d.balance,
                    d.minimum_payment,
                    d.interest_rate * Decimal::ONE_HUNDRED,
                    12,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let problem = OptimizationProblem::new(&debts, request.monthly_budget, self.horizon)?;
        let plan = problem.avalanche_plan()?;
        Ok(problem.to_response(&plan)?)
    }
}

async fn optimize(set: &DebtSet, budget: Decimal) -> Result<OptimizedSchedule, OptimizationError> {
    if std::env::var("OPTIMIZER_ENDPOINT").is_ok() {
        OptimizerClient::from_env()?
            .request_optimized_schedule(set.debts(), budget, dec!(4_000))
            .await
    } else {
        OptimizerClient::with_transport(GreedyOptimizer { horizon: 60 }, 60)
            .request_optimized_schedule(set.debts(), budget, dec!(4_000))
            .await
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    println!("╔═══════════════════════════════════════════════╗");
    println!("║  debt-optimizer: Optimizer Comparison Example ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    let set = DebtSet::try_from_debts(vec![
        Debt::new("Visa", dec!(2_500), dec!(100), dec!(22), 36).unwrap(),
        Debt::new("Car Loan", dec!(8_000), dec!(250), dec!(9), 60).unwrap(),
        Debt::new("Student Loan", dec!(15_000), dec!(200), dec!(6), 120).unwrap(),
    ])
    .unwrap();

    let baseline = AvalancheScheduler::simulate(set.debts(), &ScheduleOptions::default()).unwrap();

    // --- Scenario 1: Budgets that cover the minimums ---
    for budget in [dec!(600), dec!(900), dec!(1_500)] {
        println!("━━━ Budget ${} ━━━\n", budget);
        match optimize(&set, budget).await {
            Ok(optimized) => {
                if !optimized.audit.is_feasible() {
                    println!("  audit: {} violation(s)", optimized.audit.violations.len());
                }
                println!("{}", ScheduleComparison::new(&baseline, &optimized));
            }
            Err(e) => println!("  optimization failed: {}\n", e),
        }
    }

    // --- Scenario 2: Budget below the minimums ---
    println!("━━━ Budget $500 (below minimums) ━━━\n");
    match optimize(&set, dec!(500)).await {
        Ok(_) => println!("  unexpected success"),
        Err(e) => println!("  {}", e),
    }
    println!("  baseline still available: {} months simulated", baseline.len());
}
