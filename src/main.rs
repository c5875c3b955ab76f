//! debt-optimizer CLI
//!
//! Build payoff schedules, estimate credit scores and query the optimizer
//! from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Avalanche schedule for the debts in a JSON file
//! debt-optimizer schedule --input debts.json
//!
//! # Output as JSON, full five-year run
//! debt-optimizer schedule --input debts.json --display 60 --format json
//!
//! # Credit score estimate
//! debt-optimizer score --income 80000 --utilization 5 --history 3 --payment-history 3 --inquiries 0
//!
//! # Optimized plan from the remote optimizer
//! debt-optimizer optimize --input debts.json --budget 1500 --income 3000
//!
//! # Generate a random portfolio for testing
//! debt-optimizer generate --debts 5
//! ```

use debt_optimizer::core::debt::{Debt, DebtSet};
use debt_optimizer::core::profile::CreditProfile;
use debt_optimizer::core::schedule::Schedule;
use debt_optimizer::optimization::client::{OptimizerClient, OptimizerConfig};
use debt_optimizer::optimization::reconcile::ScheduleComparison;
use debt_optimizer::scheduling::avalanche::{AvalancheScheduler, ScheduleOptions};
use debt_optimizer::scoring::credit::{estimate, CreditRating};
use debt_optimizer::simulation::portfolio::{generate_random_portfolio, PortfolioConfig};
use rust_decimal::Decimal;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"debt-optimizer: debt payoff scheduling, optimization and credit scoring

USAGE:
    debt-optimizer <COMMAND> [OPTIONS]

COMMANDS:
    schedule    Avalanche payoff schedule for a set of debts
    score       Estimate a credit score from a financial profile
    optimize    Request an interest-minimizing plan from the optimizer
    generate    Generate a random debt portfolio (for testing)
    help        Show this message

OPTIONS (schedule):
    --input <FILE>      Path to JSON debts file
    --extra <AMOUNT>    Extra payment on the priority debt (default: 50)
    --horizon <N>       Months to simulate at most (default: 60)
    --display <N>       Months to show (default: 12)
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (score):
    --income <AMOUNT>        Annual income
    --utilization <PERCENT>  Credit utilization, 0-100
    --history <0-3>          Length of credit history tier
    --payment-history <0-3>  Payment reliability tier (3 = best)
    --inquiries <N>          Hard inquiries in the last 12 months
    --format <FORMAT>        Output format: text (default) or json

OPTIONS (optimize):
    --input <FILE>      Path to JSON debts file
    --budget <AMOUNT>   Monthly budget for debt payments
    --income <AMOUNT>   Monthly income
    --endpoint <URL>    Optimizer endpoint (default: $OPTIMIZER_ENDPOINT)

OPTIONS (generate):
    --debts <N>         Number of debts (default: 5)
    --output <FILE>     Write to file instead of stdout

EXAMPLES:
    debt-optimizer schedule --input debts.json
    debt-optimizer schedule --input debts.json --extra 100 --format json
    debt-optimizer score --income 52000 --utilization 28 --history 1 --payment-history 2 --inquiries 1
    debt-optimizer optimize --input debts.json --budget 1500 --income 3000
    debt-optimizer generate --debts 8 --output debts.json"#
    );
}

/// JSON schema for input debts.
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct DebtInput {
    name: String,
    principal: Decimal,
    minimum_payment: Decimal,
    annual_interest_rate: Decimal,
    #[serde(default = "default_term")]
    term_months: u32,
}

fn default_term() -> u32 {
    12
}

#[derive(serde::Deserialize, serde::Serialize)]
struct DebtsFile {
    debts: Vec<DebtInput>,
}

#[derive(serde::Serialize)]
struct ScoreOutput {
    score: u16,
    rating: String,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Pull `--flag value` pairs out of the argument list.
fn parse_flags(args: &[String], allowed: &[&str]) -> Vec<(String, String)> {
    let mut flags = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if !allowed.contains(&flag) {
            fail(format!("unknown option: {}", flag));
        }
        i += 1;
        let value = args
            .get(i)
            .cloned()
            .unwrap_or_else(|| fail(format!("{} requires a value", flag)));
        flags.push((flag.to_string(), value));
        i += 1;
    }
    flags
}

fn flag<'a>(flags: &'a [(String, String)], name: &str) -> Option<&'a str> {
    flags
        .iter()
        .rev()
        .find(|(f, _)| f == name)
        .map(|(_, v)| v.as_str())
}

fn parse_value<T: std::str::FromStr>(flags: &[(String, String)], name: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    flag(flags, name).map(|v| {
        v.parse()
            .unwrap_or_else(|e| fail(format!("invalid value '{}' for {}: {}", v, name, e)))
    })
}

fn require<T: std::str::FromStr>(flags: &[(String, String)], name: &str) -> T
where
    T::Err: std::fmt::Display,
{
    parse_value(flags, name).unwrap_or_else(|| fail(format!("{} is required", name)))
}

fn load_debts(path: &str) -> DebtSet {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading file '{}': {}", path, e)));

    let file: DebtsFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "debts": [
    {{ "name": "Visa", "principal": "2500", "minimumPayment": "100", "annualInterestRate": "22", "termMonths": 36 }}
  ]
}}"#
        );
        process::exit(1);
    });

    let mut set = DebtSet::new();
    for input in file.debts {
        let debt = Debt::new(
            input.name.clone(),
            input.principal,
            input.minimum_payment,
            input.annual_interest_rate,
            input.term_months,
        )
        .unwrap_or_else(|e| fail(format!("debt '{}': {}", input.name, e)));
        set.add(debt)
            .unwrap_or_else(|e| fail(format!("debt '{}': {}", input.name, e)));
    }
    set
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| fail(format!("encoding JSON: {}", e)))
}

/// Render a schedule with debt names instead of ids.
fn print_schedule(title: &str, set: &DebtSet, schedule: &Schedule) {
    println!("=== {} ===", title);
    for month in schedule.months() {
        println!("Month {}", month.month);
        for entry in &month.entries {
            let name = set.get(entry.debt_id).map(|d| d.name()).unwrap_or("?");
            println!(
                "  {:<20} pay {:>12}  balance {:>12}",
                name,
                entry.payment.round_dp(2),
                entry.remaining_balance.round_dp(2)
            );
        }
    }
    println!();
}

fn print_summary(set: &DebtSet, full: &Schedule) {
    println!("=== Portfolio ===");
    println!("Total Debt:      {}", set.total_principal().round_dp(2));
    println!("Avg. Interest:   {}%", set.average_interest_rate().round_dp(2));
    match full.payoff_month() {
        Some(m) => println!("Est. Payoff:     {} months", m),
        None => println!("Est. Payoff:     beyond {} months", full.len()),
    }
    println!("Priority Order:");
    for (i, debt) in set.priority_order().iter().enumerate() {
        println!(
            "  {}. {:<20} {:>12} @ {}% (min {})",
            i + 1,
            debt.name(),
            debt.principal().round_dp(2),
            debt.annual_interest_rate(),
            debt.minimum_payment().round_dp(2)
        );
    }
    println!();
}

fn cmd_schedule(args: &[String]) {
    let flags = parse_flags(
        args,
        &["--input", "--extra", "--horizon", "--display", "--format"],
    );
    let path: String = require(&flags, "--input");
    let defaults = ScheduleOptions::default();
    let options = ScheduleOptions {
        extra_increment: parse_value(&flags, "--extra").unwrap_or(defaults.extra_increment),
        horizon_months: parse_value(&flags, "--horizon").unwrap_or(defaults.horizon_months),
        display_months: parse_value(&flags, "--display").unwrap_or(defaults.display_months),
    };
    let format = flag(&flags, "--format").unwrap_or("text");

    let set = load_debts(&path);
    let full = AvalancheScheduler::simulate(set.debts(), &options).unwrap_or_else(|e| fail(e));
    let shown = full.truncated(options.display_months as usize);

    if format == "json" {
        println!("{}", to_json(&shown));
    } else {
        print_summary(&set, &full);
        print_schedule("Avalanche Schedule", &set, &shown);
        println!("Total Interest (full run): {}", full.total_interest().round_dp(2));
    }
}

fn cmd_score(args: &[String]) {
    let flags = parse_flags(
        args,
        &[
            "--income",
            "--utilization",
            "--history",
            "--payment-history",
            "--inquiries",
            "--format",
        ],
    );
    let profile = CreditProfile {
        annual_income: require(&flags, "--income"),
        credit_utilization_percent: require(&flags, "--utilization"),
        credit_history_bucket: require(&flags, "--history"),
        payment_history_bucket: require(&flags, "--payment-history"),
        hard_inquiry_count: require(&flags, "--inquiries"),
    };
    let score = estimate(&profile).unwrap_or_else(|e| fail(e));
    let rating = CreditRating::from_score(score);

    if flag(&flags, "--format") == Some("json") {
        println!(
            "{}",
            to_json(&ScoreOutput {
                score: score.value(),
                rating: rating.to_string(),
            })
        );
    } else {
        println!("Estimated Credit Score: {} ({})", score, rating);
    }
}

fn cmd_optimize(args: &[String]) {
    let flags = parse_flags(args, &["--input", "--budget", "--income", "--endpoint"]);
    let path: String = require(&flags, "--input");
    let budget: Decimal = require(&flags, "--budget");
    let income: Decimal = require(&flags, "--income");
    let config = match flag(&flags, "--endpoint") {
        Some(endpoint) => OptimizerConfig::with_endpoint(endpoint),
        None => OptimizerConfig::from_env(),
    };

    let set = load_debts(&path);

    // The baseline never depends on the optimizer.
    let options = ScheduleOptions::default();
    let baseline = AvalancheScheduler::simulate(set.debts(), &options).unwrap_or_else(|e| fail(e));
    print_summary(&set, &baseline);
    print_schedule(
        "Avalanche Schedule",
        &set,
        &baseline.truncated(options.display_months as usize),
    );

    let client = OptimizerClient::new(config).unwrap_or_else(|e| fail(e));
    let runtime = tokio::runtime::Runtime::new()
        .unwrap_or_else(|e| fail(format!("starting runtime: {}", e)));
    let result = runtime.block_on(client.request_optimized_schedule(set.debts(), budget, income));

    match result {
        Ok(optimized) => {
            print_schedule(
                "Optimized Schedule",
                &set,
                &optimized.display_schedule(options.display_months as usize),
            );
            if !optimized.audit.is_feasible() {
                println!(
                    "Warning: optimizer plan breaks {} constraint(s)\n",
                    optimized.audit.violations.len()
                );
            }
            println!("{}", ScheduleComparison::new(&baseline, &optimized));
        }
        Err(e) if e.is_transport_failure() => {
            fail(format!("{} (the avalanche schedule above is still valid)", e))
        }
        Err(e) => fail(e),
    }
}

fn cmd_generate(args: &[String]) {
    let flags = parse_flags(args, &["--debts", "--output"]);
    let config = PortfolioConfig {
        debt_count: parse_value(&flags, "--debts").unwrap_or(5),
        ..Default::default()
    };
    let set = generate_random_portfolio(&config).unwrap_or_else(|e| fail(e));

    let output = DebtsFile {
        debts: set
            .debts()
            .iter()
            .map(|d| DebtInput {
                name: d.name().to_string(),
                principal: d.principal(),
                minimum_payment: d.minimum_payment(),
                annual_interest_rate: d.annual_interest_rate(),
                term_months: d.term_months(),
            })
            .collect(),
    };
    let json = to_json(&output);

    if let Some(path) = flag(&flags, "--output") {
        fs::write(path, &json).unwrap_or_else(|e| fail(format!("writing to '{}': {}", path, e)));
        eprintln!("Generated {} debts → {}", set.len(), path);
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "schedule" => cmd_schedule(rest),
        "score" => cmd_score(rest),
        "optimize" => cmd_optimize(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
