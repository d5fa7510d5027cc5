use chrono::Utc;
use std::sync::Arc;

use crate::api::CoincheckClient;
use crate::persistence::{TradeLog, TradeRecord};

/// Appends the current price to the trade log at the start of each cycle,
/// building the price history the log keeps alongside the orders.
pub struct PriceRecorder {
    client: CoincheckClient,
    trade_log: Arc<TradeLog>,
}

impl PriceRecorder {
    pub fn new(client: CoincheckClient, trade_log: Arc<TradeLog>) -> Self {
        Self { client, trade_log }
    }

    pub async fn record(&self) -> anyhow::Result<f64> {
        let price = self.client.get_price().await?;
        self.trade_log
            .append(&TradeRecord::price(price, Utc::now()))?;
        tracing::info!(price, "recorded price sample");
        Ok(price)
    }
}
