use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::Strategy;
use crate::api::CoincheckClient;
use crate::error::StrategyError;
use crate::indicators::PriceWindow;
use crate::models::{OrderRequest, OrderSide, PriceSample, MIN_ORDER_AMOUNT};
use crate::persistence::{TradeLog, TradeRecord};

/// Fraction beyond the tracked range that counts as a breakout.
const BREAKOUT_THRESHOLD: f64 = 0.01;

/// What the range detector concluded for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeVerdict {
    /// No prior history; this tick starts a new range.
    NewRange,
    /// Price stayed inside the tracked range.
    Inside { high: f64, low: f64 },
    /// Price broke above the range high.
    BrokeHigh { high: f64 },
    /// Price broke below the range low.
    BrokeLow { low: f64 },
}

/// Pure breakout state machine over a 24-hour price window.
#[derive(Debug)]
pub struct BreakoutDetector {
    window: PriceWindow,
    threshold: f64,
}

impl BreakoutDetector {
    pub fn new() -> Self {
        Self {
            window: PriceWindow::by_age(Duration::hours(24)),
            threshold: BREAKOUT_THRESHOLD,
        }
    }

    /// Feed one observation. The current price is judged against the range
    /// formed by the samples before it; a breakout clears the window, so
    /// the next tick starts a fresh range from a single sample.
    pub fn observe(&mut self, price: f64, now: DateTime<Utc>) -> RangeVerdict {
        self.window.evict_older_than(now);

        let verdict = match (self.window.high(), self.window.low()) {
            (Some(high), Some(low)) => {
                if price > high * (1.0 + self.threshold) {
                    RangeVerdict::BrokeHigh { high }
                } else if price < low * (1.0 - self.threshold) {
                    RangeVerdict::BrokeLow { low }
                } else {
                    RangeVerdict::Inside { high, low }
                }
            }
            _ => RangeVerdict::NewRange,
        };

        match verdict {
            RangeVerdict::BrokeHigh { .. } | RangeVerdict::BrokeLow { .. } => self.window.clear(),
            _ => self.window.push(PriceSample::new(price, now)),
        }

        verdict
    }
}

impl Default for BreakoutDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Buys a fixed minimum amount when the price escapes the 24-hour range
/// upward, sells it when the price escapes downward.
pub struct BreakoutStrategy {
    client: CoincheckClient,
    trade_log: Arc<TradeLog>,
    detector: BreakoutDetector,
}

impl BreakoutStrategy {
    pub fn new(client: CoincheckClient, trade_log: Arc<TradeLog>) -> Self {
        Self {
            client,
            trade_log,
            detector: BreakoutDetector::new(),
        }
    }

    async fn place_order(&self, side: OrderSide, price: f64) -> Result<(), StrategyError> {
        let order = OrderRequest::new(side, price, MIN_ORDER_AMOUNT);
        self.client.create_order(&order).await?;

        if let Err(e) = self.trade_log.append(&TradeRecord::order(
            "BO",
            side,
            MIN_ORDER_AMOUNT,
            price,
            Utc::now(),
        )) {
            tracing::warn!(error = %e, "trade log append failed");
        }
        Ok(())
    }
}

#[async_trait]
impl Strategy for BreakoutStrategy {
    async fn execute(&mut self) -> Result<(), StrategyError> {
        let price = self.client.get_price().await?;

        match self.detector.observe(price, Utc::now()) {
            RangeVerdict::BrokeHigh { high } => {
                tracing::info!(
                    strategy = self.name(),
                    price,
                    high,
                    amount = MIN_ORDER_AMOUNT,
                    "price broke above range high, buying"
                );
                self.place_order(OrderSide::Buy, price).await?;
            }
            RangeVerdict::BrokeLow { low } => {
                tracing::info!(
                    strategy = self.name(),
                    price,
                    low,
                    amount = MIN_ORDER_AMOUNT,
                    "price broke below range low, selling"
                );
                self.place_order(OrderSide::Sell, price).await?;
            }
            RangeVerdict::Inside { high, low } => {
                tracing::info!(strategy = self.name(), price, high, low, "price inside range");
            }
            RangeVerdict::NewRange => {
                tracing::debug!(strategy = self.name(), price, "starting a new range");
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "BreakoutStrategy"
    }
}
