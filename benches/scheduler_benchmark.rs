use criterion::{black_box, criterion_group, criterion_main, Criterion};
use debt_optimizer::core::debt::DebtSet;
use debt_optimizer::optimization::formulation::OptimizationProblem;
use debt_optimizer::scheduling::avalanche::{AvalancheScheduler, ScheduleOptions};
use debt_optimizer::simulation::portfolio::{generate_random_portfolio, PortfolioConfig};
use rust_decimal::Decimal;

fn portfolio(debt_count: usize) -> DebtSet {
    let config = PortfolioConfig {
        debt_count,
        ..Default::default()
    };
    generate_random_portfolio(&config).unwrap()
}

fn bench_avalanche_5_debts(c: &mut Criterion) {
    let set = portfolio(5);
    let options = ScheduleOptions::default();

    c.bench_function("avalanche_5_debts", |b| {
        b.iter(|| AvalancheScheduler::simulate(black_box(set.debts()), &options))
    });
}

fn bench_avalanche_100_debts(c: &mut Criterion) {
    let set = portfolio(100);
    let options = ScheduleOptions {
        horizon_months: 360,
        ..Default::default()
    };

    c.bench_function("avalanche_100_debts_360_months", |b| {
        b.iter(|| AvalancheScheduler::simulate(black_box(set.debts()), &options))
    });
}

fn bench_plan_audit(c: &mut Criterion) {
    let set = portfolio(20);
    let unfunded = OptimizationProblem::new(set.debts(), Decimal::ZERO, 24).unwrap();
    let budget = unfunded.required_monthly_minimum().unwrap() * Decimal::TWO;
    let problem = OptimizationProblem::new(set.debts(), budget, 24).unwrap();
    let plan = problem.avalanche_plan().unwrap();

    c.bench_function("audit_20_debts_24_months", |b| {
        b.iter(|| problem.evaluate(black_box(&plan)))
    });
}

criterion_group!(
    benches,
    bench_avalanche_5_debts,
    bench_avalanche_100_debts,
    bench_plan_audit
);
criterion_main!(benches);
