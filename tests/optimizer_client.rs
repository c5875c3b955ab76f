//! The HTTP transport against a canned local server.

use debt_optimizer::core::debt::Debt;
use debt_optimizer::optimization::client::{OptimizerClient, OptimizerConfig};
use debt_optimizer::optimization::error::OptimizationError;
use rust_decimal_macros::dec;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve a single request with `status` and `body`, optionally after a delay.
/// The handle yields the request body the client sent.
async fn serve_once(status: &'static str, body: String, delay: Duration) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            raw.extend_from_slice(&buf[..n]);
            if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&raw[..header_end]).to_lowercase();
        let length: usize = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or(0);
        while raw.len() < header_end + length {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
        }
        let request_body = String::from_utf8_lossy(&raw[header_end..]).to_string();

        tokio::time::sleep(delay).await;
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
        request_body
    });

    (endpoint, handle)
}

fn client(endpoint: &str, timeout_secs: u64) -> OptimizerClient {
    OptimizerClient::new(OptimizerConfig {
        endpoint: endpoint.to_string(),
        timeout_secs,
        horizon_months: 24,
    })
    .unwrap()
}

fn card() -> Debt {
    Debt::new("Card", dec!(1000), dec!(100), dec!(12), 12).unwrap()
}

const PLAN: &str = r#"{
    "totalInterestPaid": 10.0,
    "paymentPlans": [
        { "name": "Card", "monthlyPayments": [
            { "paymentNumber": 1, "paymentAmount": 500.0, "remainingBalance": 510.0 },
            { "paymentNumber": 2, "paymentAmount": 515.1, "remainingBalance": 0.0 }
        ] }
    ]
}"#;

#[tokio::test]
async fn posts_request_and_reconciles_plan() {
    let (endpoint, server) = serve_once("200 OK", PLAN.to_string(), Duration::ZERO).await;
    let card = card();

    let optimized = client(&endpoint, 5)
        .request_optimized_schedule(&[card.clone()], dec!(600), dec!(2500))
        .await
        .unwrap();

    assert_eq!(optimized.total_interest_paid, dec!(10));
    assert_eq!(optimized.schedule.len(), 2);
    assert_eq!(optimized.schedule.entry(1, card.id()).unwrap().payment, dec!(500));
    assert!(optimized.audit.is_feasible());

    let sent: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
    assert_eq!(sent["monthlyBudget"], serde_json::json!(600.0));
    assert_eq!(sent["monthlyIncome"], serde_json::json!(2500.0));
    assert_eq!(sent["debts"][0]["name"], "Card");
    assert_eq!(sent["debts"][0]["interestRate"], serde_json::json!(0.12));
    assert_eq!(sent["debts"][0]["minimumPayment"], serde_json::json!(100.0));
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let (endpoint, _server) =
        serve_once("500 Internal Server Error", "{}".to_string(), Duration::ZERO).await;
    let result = client(&endpoint, 5)
        .request_optimized_schedule(&[card()], dec!(600), dec!(2500))
        .await;
    assert!(matches!(result, Err(OptimizationError::CollaboratorUnavailable(_))));
}

#[tokio::test]
async fn unprocessable_is_infeasible() {
    let (endpoint, _server) = serve_once(
        "422 Unprocessable Entity",
        r#"{"error":"infeasible"}"#.to_string(),
        Duration::ZERO,
    )
    .await;
    let result = client(&endpoint, 5)
        .request_optimized_schedule(&[card()], dec!(600), dec!(2500))
        .await;
    assert!(matches!(result, Err(OptimizationError::InfeasibleAllocation { .. })));
}

#[tokio::test]
async fn garbage_body_is_malformed() {
    let (endpoint, _server) =
        serve_once("200 OK", "<html>oops</html>".to_string(), Duration::ZERO).await;
    let result = client(&endpoint, 5)
        .request_optimized_schedule(&[card()], dec!(600), dec!(2500))
        .await;
    let err = result.unwrap_err();
    assert!(matches!(err, OptimizationError::MalformedResponse(_)));
    assert!(err.is_transport_failure());
}

#[tokio::test]
async fn wrong_plan_shape_is_malformed() {
    let body = r#"{"totalInterestPaid": 1.0, "paymentPlans": []}"#.to_string();
    let (endpoint, _server) = serve_once("200 OK", body, Duration::ZERO).await;
    let result = client(&endpoint, 5)
        .request_optimized_schedule(&[card()], dec!(600), dec!(2500))
        .await;
    assert!(matches!(result, Err(OptimizationError::MalformedResponse(_))));
}

#[tokio::test]
async fn refused_connection_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let client = client(&endpoint, 5);
    let result = client
        .request_optimized_schedule(&[card()], dec!(600), dec!(2500))
        .await;
    assert!(matches!(result, Err(OptimizationError::CollaboratorUnavailable(_))));
    assert!(!client.is_in_flight());
}

#[tokio::test]
async fn slow_server_times_out() {
    let (endpoint, _server) =
        serve_once("200 OK", PLAN.to_string(), Duration::from_secs(3)).await;
    let result = client(&endpoint, 1)
        .request_optimized_schedule(&[card()], dec!(600), dec!(2500))
        .await;
    assert!(matches!(result, Err(OptimizationError::CollaboratorUnavailable(_))));
}

#[tokio::test]
async fn unprocessable_reports_local_required_minimum() {
    let (endpoint, _server) = serve_once(
        "422 Unprocessable Entity",
        r#"{"error":"infeasible"}"#.to_string(),
        Duration::ZERO,
    )
    .await;
    let tiny = Debt::new("Tiny", dec!(40), dec!(100), dec!(12), 12).unwrap();
    let result = client(&endpoint, 5)
        .request_optimized_schedule(&[tiny], dec!(50), dec!(2500))
        .await;
    match result {
        Err(OptimizationError::InfeasibleAllocation { budget, required }) => {
            assert_eq!(budget, dec!(50));
            assert_eq!(required, dec!(40.4));
        }
        other => panic!("expected InfeasibleAllocation, got {:?}", other),
    }
}

#[tokio::test]
async fn payment_number_past_horizon_is_malformed() {
    let body = r#"{
        "totalInterestPaid": 10.0,
        "paymentPlans": [
            { "name": "Card", "monthlyPayments": [
                { "paymentNumber": 4294967295, "paymentAmount": 100.0, "remainingBalance": 0.0 }
            ] }
        ]
    }"#;
    let (endpoint, _server) = serve_once("200 OK", body.to_string(), Duration::ZERO).await;
    let client = client(&endpoint, 5);
    let result = client
        .request_optimized_schedule(&[card()], dec!(600), dec!(2500))
        .await;
    assert!(matches!(result, Err(OptimizationError::MalformedResponse(_))));
    assert!(!client.is_in_flight());
}

#[tokio::test]
async fn oversized_amounts_are_malformed() {
    let body = r#"{
        "totalInterestPaid": 10.0,
        "paymentPlans": [
            { "name": "Card", "monthlyPayments": [
                { "paymentNumber": 1, "paymentAmount": 5e28, "remainingBalance": 0.0 }
            ] },
            { "name": "Loan", "monthlyPayments": [
                { "paymentNumber": 1, "paymentAmount": 5e28, "remainingBalance": 0.0 }
            ] }
        ]
    }"#;
    let (endpoint, _server) = serve_once("200 OK", body.to_string(), Duration::ZERO).await;
    let loan = Debt::new("Loan", dec!(300), dec!(50), dec!(6), 12).unwrap();
    let result = client(&endpoint, 5)
        .request_optimized_schedule(&[card(), loan], dec!(600), dec!(2500))
        .await;
    assert!(matches!(result, Err(OptimizationError::MalformedResponse(_))));
}
