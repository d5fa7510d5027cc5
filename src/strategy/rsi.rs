use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;

use super::Strategy;
use crate::api::CoincheckClient;
use crate::error::StrategyError;
use crate::indicators::rsi_from_averages;
use crate::models::{OrderRequest, OrderSide, MIN_ORDER_AMOUNT};
use crate::persistence::{TradeLog, TradeRecord};

const OVERSOLD: f64 = 30.0;
const OVERBOUGHT: f64 = 70.0;

/// What the RSI detector concluded for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RsiVerdict {
    Neutral { rsi: f64 },
    Oversold { rsi: f64 },
    Overbought { rsi: f64 },
}

/// Pure RSI state machine.
///
/// Changes are diffs of consecutive prices (the textbook definition),
/// split into gain/loss buffers of at most `period` entries. The first
/// tick seeds both buffers with a zero entry and records the reference
/// price; the seed rotates out exactly when the first full period is
/// available.
#[derive(Debug)]
pub struct RsiDetector {
    period: usize,
    gains: VecDeque<f64>,
    losses: VecDeque<f64>,
    last_price: Option<f64>,
}

impl RsiDetector {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            gains: VecDeque::with_capacity(period + 1),
            losses: VecDeque::with_capacity(period + 1),
            last_price: None,
        }
    }

    pub fn observe(&mut self, price: f64) -> Result<RsiVerdict, StrategyError> {
        let need = self.period + 1;

        let Some(previous) = self.last_price else {
            self.last_price = Some(price);
            self.gains.push_back(0.0);
            self.losses.push_back(0.0);
            return Err(StrategyError::InsufficientData { have: 1, need });
        };

        let change = price - previous;
        self.last_price = Some(price);
        self.gains.push_back(change.max(0.0));
        self.losses.push_back((-change).max(0.0));

        if self.gains.len() <= self.period {
            return Err(StrategyError::InsufficientData {
                have: self.gains.len(),
                need,
            });
        }
        self.gains.pop_front();
        self.losses.pop_front();

        let avg_gain = self.gains.iter().sum::<f64>() / self.period as f64;
        let avg_loss = self.losses.iter().sum::<f64>() / self.period as f64;
        let rsi = rsi_from_averages(avg_gain, avg_loss);

        Ok(if rsi < OVERSOLD {
            RsiVerdict::Oversold { rsi }
        } else if rsi > OVERBOUGHT {
            RsiVerdict::Overbought { rsi }
        } else {
            RsiVerdict::Neutral { rsi }
        })
    }
}

/// Buys a fixed minimum amount when the market is oversold, sells it when
/// overbought.
pub struct RsiStrategy {
    client: CoincheckClient,
    trade_log: Arc<TradeLog>,
    detector: RsiDetector,
}

impl RsiStrategy {
    pub fn new(client: CoincheckClient, trade_log: Arc<TradeLog>, period: usize) -> Self {
        Self {
            client,
            trade_log,
            detector: RsiDetector::new(period),
        }
    }

    async fn place_order(&self, side: OrderSide, price: f64, rsi: f64) -> Result<(), StrategyError> {
        let order = OrderRequest::new(side, price, MIN_ORDER_AMOUNT);
        self.client.create_order(&order).await?;

        let record =
            TradeRecord::order("RSI", side, MIN_ORDER_AMOUNT, price, Utc::now()).with_rsi(rsi);
        if let Err(e) = self.trade_log.append(&record) {
            tracing::warn!(error = %e, "trade log append failed");
        }
        Ok(())
    }
}

#[async_trait]
impl Strategy for RsiStrategy {
    async fn execute(&mut self) -> Result<(), StrategyError> {
        let price = self.client.get_price().await?;

        match self.detector.observe(price) {
            Err(StrategyError::InsufficientData { have, need }) => {
                tracing::debug!(
                    strategy = self.name(),
                    have,
                    need,
                    "collecting price changes"
                );
            }
            Err(e) => return Err(e),
            Ok(RsiVerdict::Oversold { rsi }) => {
                tracing::info!(
                    strategy = self.name(),
                    price,
                    rsi,
                    amount = MIN_ORDER_AMOUNT,
                    "oversold, buying"
                );
                self.place_order(OrderSide::Buy, price, rsi).await?;
            }
            Ok(RsiVerdict::Overbought { rsi }) => {
                tracing::info!(
                    strategy = self.name(),
                    price,
                    rsi,
                    amount = MIN_ORDER_AMOUNT,
                    "overbought, selling"
                );
                self.place_order(OrderSide::Sell, price, rsi).await?;
            }
            Ok(RsiVerdict::Neutral { rsi }) => {
                tracing::info!(strategy = self.name(), price, rsi, "momentum neutral");
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "RsiStrategy"
    }
}
