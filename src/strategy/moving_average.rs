use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::Strategy;
use crate::api::CoincheckClient;
use crate::error::StrategyError;
use crate::indicators::{calculate_sma, PriceWindow};
use crate::models::{OrderRequest, OrderSide, PriceSample};
use crate::persistence::{TradeLog, TradeRecord};
use crate::risk::PositionSizer;

/// Latched crossover state. A signal fires only on an actual transition,
/// never again while the short/long relationship stays the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossState {
    Neutral,
    Golden,
    Dead,
}

/// What the cross detector concluded for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrossVerdict {
    /// No crossover event (including exact equality of the averages).
    NoCross { short_ma: f64, long_ma: f64 },
    /// Short average crossed above the long average.
    Golden { short_ma: f64, long_ma: f64 },
    /// Short average crossed below the long average.
    Dead { short_ma: f64, long_ma: f64 },
}

/// Pure moving-average crossover state machine.
///
/// Holds the most recent `long_term` prices and the latched cross state.
#[derive(Debug)]
pub struct CrossDetector {
    window: PriceWindow,
    state: CrossState,
    short_term: usize,
    long_term: usize,
}

impl CrossDetector {
    pub fn new(short_term: usize, long_term: usize) -> Self {
        debug_assert!(short_term < long_term);
        Self {
            window: PriceWindow::by_count(long_term),
            state: CrossState::Neutral,
            short_term,
            long_term,
        }
    }

    pub fn state(&self) -> CrossState {
        self.state
    }

    /// Feed one observation. Needs `long_term + 1` samples before the first
    /// verdict: the window must be full and have rotated at least once.
    pub fn observe(
        &mut self,
        price: f64,
        now: DateTime<Utc>,
    ) -> Result<CrossVerdict, StrategyError> {
        self.window.push(PriceSample::new(price, now));

        let need = self.long_term + 1;
        if (self.window.samples_seen() as usize) < need {
            return Err(StrategyError::InsufficientData {
                have: self.window.samples_seen() as usize,
                need,
            });
        }

        let prices = self.window.prices();
        let (Some(short_ma), Some(long_ma)) = (
            calculate_sma(&prices, self.short_term),
            calculate_sma(&prices, self.long_term),
        ) else {
            return Err(StrategyError::InsufficientData {
                have: prices.len(),
                need,
            });
        };

        let verdict = if short_ma > long_ma && price > short_ma && self.state != CrossState::Golden
        {
            self.state = CrossState::Golden;
            CrossVerdict::Golden { short_ma, long_ma }
        } else if short_ma < long_ma && price < short_ma && self.state != CrossState::Dead {
            self.state = CrossState::Dead;
            CrossVerdict::Dead { short_ma, long_ma }
        } else {
            CrossVerdict::NoCross { short_ma, long_ma }
        };

        Ok(verdict)
    }
}

/// Buys on a golden cross, sells on a dead cross, sized from the current
/// account balances.
pub struct MovingAverageStrategy {
    client: CoincheckClient,
    sizer: PositionSizer,
    trade_log: Arc<TradeLog>,
    detector: CrossDetector,
}

impl MovingAverageStrategy {
    pub fn new(
        client: CoincheckClient,
        sizer: PositionSizer,
        trade_log: Arc<TradeLog>,
        short_term: usize,
        long_term: usize,
    ) -> Self {
        Self {
            client,
            sizer,
            trade_log,
            detector: CrossDetector::new(short_term, long_term),
        }
    }

    async fn place_order(
        &self,
        side: OrderSide,
        price: f64,
        amount: f64,
        short_ma: f64,
        long_ma: f64,
    ) -> Result<(), StrategyError> {
        let order = OrderRequest::new(side, price, amount);
        self.client.create_order(&order).await?;

        let record = TradeRecord::order("MA", side, amount, price, Utc::now())
            .with_moving_averages(short_ma, long_ma);
        if let Err(e) = self.trade_log.append(&record) {
            tracing::warn!(error = %e, "trade log append failed");
        }
        Ok(())
    }
}

#[async_trait]
impl Strategy for MovingAverageStrategy {
    async fn execute(&mut self) -> Result<(), StrategyError> {
        let price = self.client.get_price().await?;

        match self.detector.observe(price, Utc::now()) {
            Err(StrategyError::InsufficientData { have, need }) => {
                tracing::debug!(
                    strategy = self.name(),
                    have,
                    need,
                    "collecting samples for moving averages"
                );
            }
            Err(e) => return Err(e),
            Ok(CrossVerdict::Golden { short_ma, long_ma }) => {
                let amount = self.sizer.buy_amount(price).await?;
                tracing::info!(
                    strategy = self.name(),
                    price,
                    short_ma,
                    long_ma,
                    amount,
                    "golden cross, buying"
                );
                self.place_order(OrderSide::Buy, price, amount, short_ma, long_ma)
                    .await?;
            }
            Ok(CrossVerdict::Dead { short_ma, long_ma }) => {
                let amount = self.sizer.sell_amount().await?;
                tracing::info!(
                    strategy = self.name(),
                    price,
                    short_ma,
                    long_ma,
                    amount,
                    "dead cross, selling"
                );
                self.place_order(OrderSide::Sell, price, amount, short_ma, long_ma)
                    .await?;
            }
            Ok(CrossVerdict::NoCross { short_ma, long_ma }) => {
                tracing::info!(
                    strategy = self.name(),
                    price,
                    short_ma,
                    long_ma,
                    "no crossover"
                );
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "MovingAverageStrategy"
    }
}
