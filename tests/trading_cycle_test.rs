use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use ethbot::api::CoincheckClient;
use ethbot::error::StrategyError;
use ethbot::execution::{PriceRecorder, StrategyRunner};
use ethbot::persistence::{TradeLog, TradeRecord};
use ethbot::risk::PositionSizer;
use ethbot::strategy::{BreakoutStrategy, RetryTradeStrategy, RsiStrategy, Strategy};

struct FailingStrategy;

#[async_trait]
impl Strategy for FailingStrategy {
    async fn execute(&mut self) -> Result<(), StrategyError> {
        Err(StrategyError::Recovery {
            order_id: 0,
            reason: "synthetic failure".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "FailingStrategy"
    }
}

fn client_for(server: &mockito::Server) -> CoincheckClient {
    CoincheckClient::new(
        server.url(),
        "test-key",
        "test-secret",
        Duration::from_secs(5),
    )
    .expect("client builds")
}

fn read_records(path: &std::path::Path) -> Vec<TradeRecord> {
    let mut reader = csv::Reader::from_path(path).expect("log readable");
    reader
        .deserialize()
        .map(|row| row.expect("row parses"))
        .collect()
}

#[tokio::test]
async fn test_cycle_records_price_and_survives_failing_strategy() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/ticker?pair=eth_jpy")
        .with_body(r#"{"last": 450000.0}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/exchange/orders/opens")
        .with_body(r#"{"success": true, "orders": []}"#)
        .create_async()
        .await;
    let orders = server
        .mock("POST", "/exchange/orders")
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("trades.csv");
    let trade_log = Arc::new(TradeLog::new(&log_path).unwrap());
    let sizer = PositionSizer::new(client.clone(), 5.0);

    let strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(BreakoutStrategy::new(client.clone(), trade_log.clone())),
        Box::new(FailingStrategy),
        Box::new(RsiStrategy::new(client.clone(), trade_log.clone(), 14)),
        Box::new(
            RetryTradeStrategy::new(client.clone(), sizer, trade_log.clone())
                .with_pacing(Duration::ZERO),
        ),
    ];
    let recorder = PriceRecorder::new(client, trade_log.clone());
    let mut runner = StrategyRunner::new(strategies, Duration::ZERO).with_recorder(recorder);

    runner.run_cycle().await;
    runner.run_cycle().await;

    // flat prices: the detectors stay silent, only the recorder writes
    let records = read_records(&log_path);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.tag == "PRICE"));
    assert!(records.iter().all(|r| r.price == 450000.0));
    orders.assert_async().await;
}

#[tokio::test]
async fn test_recovery_pass_resubmits_sell_order_within_cycle() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/ticker?pair=eth_jpy")
        .with_body(r#"{"last": 455000.0}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/exchange/orders/opens")
        .with_body(
            r#"{"success": true, "orders": [
                {"id": 42, "order_type": "sell", "rate": 460000.0,
                 "pending_amount": "0.3", "created_at": "2024-01-10T05:00:00.000Z"}
            ]}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/accounts/balance")
        .with_body(r#"{"success": true, "jpy": "1000", "eth": "0.3"}"#)
        .create_async()
        .await;
    let cancel = server
        .mock("DELETE", "/exchange/orders/42")
        .with_body(r#"{"success": true, "id": 42}"#)
        .create_async()
        .await;
    let resubmit = server
        .mock("POST", "/exchange/orders")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "order_type": "sell",
            "rate": 455000.0,
            "amount": 0.3
        })))
        .with_body(r#"{"success": true, "id": 43, "order_type": "sell"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("trades.csv");
    let trade_log = Arc::new(TradeLog::new(&log_path).unwrap());
    let sizer = PositionSizer::new(client.clone(), 5.0);

    let strategies: Vec<Box<dyn Strategy>> = vec![Box::new(
        RetryTradeStrategy::new(client, sizer, trade_log).with_pacing(Duration::ZERO),
    )];
    let mut runner = StrategyRunner::new(strategies, Duration::ZERO);

    runner.run_cycle().await;

    cancel.assert_async().await;
    resubmit.assert_async().await;

    let records = read_records(&log_path);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tag, "RETRY-SELL");
    assert_eq!(records[0].amount, Some(0.3));
    assert_eq!(records[0].price, 455000.0);
}
