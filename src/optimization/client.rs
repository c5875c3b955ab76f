//! Client for the remote allocation optimizer.
//!
//! # Configuration
//!
//! [`OptimizerConfig::default`] reads:
//! - `OPTIMIZER_ENDPOINT`: URL the request is POSTed to (default `http://127.0.0.1:5000/`)
//! - `OPTIMIZER_TIMEOUT_SECS`: whole-request timeout (default 30)
//! - `OPTIMIZER_HORIZON_MONTHS`: program horizon (default 24)
//!
//! # Behaviour
//!
//! One request in flight per client; a second call made while the first is
//! pending fails with [`OptimizationError::RequestInFlight`]. There are no
//! retries. Infeasible budgets are rejected locally before anything is sent.

use crate::core::debt::Debt;
use crate::core::error::ensure_non_negative;
use crate::core::schedule::Schedule;
use crate::optimization::error::OptimizationError;
use crate::optimization::formulation::{OptimizationProblem, PaymentPlan, DEFAULT_HORIZON_MONTHS};
use crate::optimization::protocol::{OptimizationRequest, OptimizationResponse};
use crate::optimization::reconcile::{reconcile, OptimizedSchedule};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Settings for talking to the optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OptimizerConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub horizon_months: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            endpoint: std::env::var("OPTIMIZER_ENDPOINT")
                .unwrap_or_else(|_| "http://127.0.0.1:5000/".to_string()),
            timeout_secs: std::env::var("OPTIMIZER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            horizon_months: std::env::var("OPTIMIZER_HORIZON_MONTHS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_HORIZON_MONTHS),
        }
    }
}

impl OptimizerConfig {
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), OptimizationError> {
        if self.endpoint.is_empty() {
            return Err(OptimizationError::Config("endpoint cannot be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(OptimizationError::Config("timeout must be > 0".to_string()));
        }
        if self.horizon_months == 0 {
            return Err(OptimizationError::Config("horizon must be > 0".to_string()));
        }
        Ok(())
    }
}

/// One request/response exchange with an optimizer.
pub trait OptimizerTransport {
    fn submit(
        &self,
        request: &OptimizationRequest,
    ) -> impl Future<Output = Result<OptimizationResponse, OptimizationError>> + Send;
}

/// JSON over HTTP POST.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: String,
    http: Client,
}

impl HttpTransport {
    pub fn new(config: &OptimizerConfig) -> Result<Self, OptimizationError> {
        config.validate()?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OptimizationError::Config(e.to_string()))?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl OptimizerTransport for HttpTransport {
    async fn submit(&self, request: &OptimizationRequest) -> Result<OptimizationResponse, OptimizationError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(OptimizationError::InfeasibleAllocation {
                budget: request.monthly_budget,
                required: request.required_monthly_minimum()?,
            });
        }
        if !status.is_success() {
            return Err(OptimizationError::CollaboratorUnavailable(format!(
                "optimizer returned {}",
                status
            )));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Clears the in-flight flag when the request finishes, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, OptimizationError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| OptimizationError::RequestInFlight)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Single-flight optimizer client.
pub struct OptimizerClient<T = HttpTransport> {
    transport: T,
    horizon_months: u32,
    in_flight: AtomicBool,
}

impl OptimizerClient<HttpTransport> {
    pub fn new(config: OptimizerConfig) -> Result<Self, OptimizationError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(transport, config.horizon_months))
    }

    pub fn from_env() -> Result<Self, OptimizationError> {
        Self::new(OptimizerConfig::from_env())
    }
}

impl<T: OptimizerTransport> OptimizerClient<T> {
    pub fn with_transport(transport: T, horizon_months: u32) -> Self {
        Self {
            transport,
            horizon_months,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn horizon_months(&self) -> u32 {
        self.horizon_months
    }

    /// Whether a request is currently pending. Callers disable resubmission
    /// while this is true.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Ask the optimizer for an interest-minimizing plan.
    ///
    /// Inputs are validated and feasibility is checked before the request
    /// goes out. The response is reconciled into schedule form and audited
    /// against the program.
    pub async fn request_optimized_schedule(
        &self,
        debts: &[Debt],
        monthly_budget: Decimal,
        monthly_income: Decimal,
    ) -> Result<OptimizedSchedule, OptimizationError> {
        ensure_non_negative("monthly income", monthly_income)?;
        let problem = OptimizationProblem::new(debts, monthly_budget, self.horizon_months)?;
        problem.check_feasibility()?;

        if debts.is_empty() {
            return Ok(OptimizedSchedule {
                total_interest_paid: Decimal::ZERO,
                schedule: Schedule::new(),
                audit: problem.evaluate(&PaymentPlan::default())?,
            });
        }

        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        let request = OptimizationRequest::new(debts, monthly_budget, monthly_income);
        log::info!(
            "requesting optimized plan for {} debts, budget {}, horizon {} months",
            debts.len(),
            monthly_budget,
            self.horizon_months
        );

        let response = match self.transport.submit(&request).await {
            Ok(response) => response,
            Err(err) => {
                log::warn!("optimization request failed: {}", err);
                return Err(err);
            }
        };
        let optimized = reconcile(debts, &problem, &response)?;
        log::info!(
            "optimizer reported total interest {} over {} months",
            optimized.total_interest_paid.round_dp(2),
            optimized.schedule.len()
        );
        Ok(optimized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Answers with the program's own avalanche plan.
    struct LocalTransport {
        calls: AtomicUsize,
        horizon: u32,
    }

    impl OptimizerTransport for LocalTransport {
        async fn submit(&self, request: &OptimizationRequest) -> Result<OptimizationResponse, OptimizationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let debts: Vec<Debt> = request
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
                .collect::<Result<_, _>>()?;
            let problem = OptimizationProblem::new(&debts, request.monthly_budget, self.horizon)?;
            let plan = problem.avalanche_plan()?;
            Ok(problem.to_response(&plan)?)
        }
    }

    /// Holds every request until released.
    struct GatedTransport {
        gate: Notify,
        inner: LocalTransport,
    }

    impl OptimizerTransport for GatedTransport {
        async fn submit(&self, request: &OptimizationRequest) -> Result<OptimizationResponse, OptimizationError> {
            self.gate.notified().await;
            self.inner.submit(request).await
        }
    }

    fn local(horizon: u32) -> LocalTransport {
        LocalTransport {
            calls: AtomicUsize::new(0),
            horizon,
        }
    }

    fn debts() -> Vec<Debt> {
        vec![
            Debt::new("Card", dec!(2500), dec!(100), dec!(22), 36).unwrap(),
            Debt::new("Car", dec!(8000), dec!(250), dec!(9), 60).unwrap(),
        ]
    }

    #[tokio::test]
    async fn test_request_reconciles_response() {
        let client = OptimizerClient::with_transport(local(24), 24);
        let debts = debts();
        let optimized = client
            .request_optimized_schedule(&debts, dec!(1000), dec!(3000))
            .await
            .unwrap();

        assert!(optimized.audit.is_feasible());
        assert!(optimized.total_interest_paid > Decimal::ZERO);
        assert_eq!(optimized.schedule.entry(1, debts[0].id()).unwrap().payment, dec!(750));
        assert!(!client.is_in_flight());
    }

    #[tokio::test]
    async fn test_infeasible_budget_never_sent() {
        let client = OptimizerClient::with_transport(local(24), 24);
        let err = client
            .request_optimized_schedule(&debts(), dec!(349), dec!(3000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OptimizationError::InfeasibleAllocation { required, .. } if required == dec!(350)
        ));
        assert_eq!(client.transport().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_debts_short_circuit() {
        let client = OptimizerClient::with_transport(local(24), 24);
        let optimized = client
            .request_optimized_schedule(&[], dec!(100), dec!(3000))
            .await
            .unwrap();
        assert!(optimized.schedule.is_empty());
        assert_eq!(client.transport().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_negative_income_rejected() {
        let client = OptimizerClient::with_transport(local(24), 24);
        let err = client
            .request_optimized_schedule(&debts(), dec!(1000), dec!(-1))
            .await
            .unwrap_err();
        assert!(matches!(err, OptimizationError::Validation(_)));
    }

    #[tokio::test]
    async fn test_single_flight() {
        let transport = GatedTransport {
            gate: Notify::new(),
            inner: local(24),
        };
        let client = OptimizerClient::with_transport(transport, 24);
        let debts = debts();

        let first = client.request_optimized_schedule(&debts, dec!(1000), dec!(3000));
        let second = async {
            let result = client
                .request_optimized_schedule(&debts, dec!(1000), dec!(3000))
                .await;
            assert!(client.is_in_flight());
            client.transport().gate.notify_one();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert!(matches!(second, Err(OptimizationError::RequestInFlight)));
        assert!(!client.is_in_flight());

        // A new submission is allowed once the previous one resolved.
        client.transport().gate.notify_one();
        assert!(client
            .request_optimized_schedule(&debts, dec!(1000), dec!(3000))
            .await
            .is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = OptimizerConfig::with_endpoint("http://localhost:5000/");
        assert!(config.validate().is_ok());
        config.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(OptimizationError::Config(_))));
        let config = OptimizerConfig::with_endpoint("");
        assert!(config.validate().is_err());
    }
}
