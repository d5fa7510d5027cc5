use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use super::Strategy;
use crate::api::CoincheckClient;
use crate::error::StrategyError;
use crate::models::{OpenOrder, OrderRequest, OrderSide};
use crate::persistence::{TradeLog, TradeRecord};
use crate::risk::PositionSizer;

/// Recovery pass over unfilled orders: cancel each one and resubmit it at
/// the current price.
///
/// Failures are isolated per order. A stuck cancel or resubmit is logged
/// and the remaining orders are still processed; the skipped order is
/// picked up again on the next cycle.
pub struct RetryTradeStrategy {
    client: CoincheckClient,
    sizer: PositionSizer,
    trade_log: Arc<TradeLog>,
    pacing: Duration,
}

impl RetryTradeStrategy {
    pub fn new(client: CoincheckClient, sizer: PositionSizer, trade_log: Arc<TradeLog>) -> Self {
        Self {
            client,
            sizer,
            trade_log,
            pacing: Duration::from_secs(1),
        }
    }

    /// Pause between the cancel and the follow-up calls for one order.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    async fn resubmit(&self, order: &OpenOrder) -> Result<(), StrategyError> {
        let recovery = |reason: String| StrategyError::Recovery {
            order_id: order.id,
            reason,
        };

        let cancelled = self
            .client
            .cancel_order(order.id)
            .await
            .map_err(|e| recovery(e.to_string()))?;
        if !cancelled.success {
            return Err(recovery("exchange refused the cancellation".to_string()));
        }

        tokio::time::sleep(self.pacing).await;

        let price = self
            .client
            .get_price()
            .await
            .map_err(|e| recovery(e.to_string()))?;

        // a sell should move the whole current holding; a buy retries the
        // amount that was left unfilled
        let amount = match order.order_type {
            OrderSide::Sell => self
                .sizer
                .sell_amount()
                .await
                .map_err(|e| recovery(e.to_string()))?,
            OrderSide::Buy => order
                .pending_amount
                .ok_or_else(|| recovery("open order has no pending amount".to_string()))?,
        };

        let request = OrderRequest::new(order.order_type, price, amount);
        self.client
            .create_order(&request)
            .await
            .map_err(|e| recovery(e.to_string()))?;

        tracing::info!(
            strategy = self.name(),
            order_id = order.id,
            side = order.order_type.as_str(),
            price,
            amount,
            "resubmitted stuck order at the current price"
        );

        let record = TradeRecord::order("RETRY", order.order_type, amount, price, Utc::now());
        if let Err(e) = self.trade_log.append(&record) {
            tracing::warn!(error = %e, "trade log append failed");
        }

        Ok(())
    }
}

#[async_trait]
impl Strategy for RetryTradeStrategy {
    async fn execute(&mut self) -> Result<(), StrategyError> {
        let opens = self.client.open_orders().await?;
        if !opens.success {
            tracing::warn!(
                strategy = self.name(),
                "open orders listing reported failure, skipping recovery this cycle"
            );
            return Ok(());
        }
        if opens.orders.is_empty() {
            tracing::debug!(strategy = self.name(), "no open orders to recover");
            return Ok(());
        }

        for order in &opens.orders {
            if let Err(e) = self.resubmit(order).await {
                tracing::warn!(
                    strategy = self.name(),
                    order_id = order.id,
                    error = %e,
                    "leaving order for the next cycle"
                );
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "RetryTradeStrategy"
    }
}
