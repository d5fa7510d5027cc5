// Trading strategy module
pub mod breakout;
pub mod moving_average;
pub mod retry;
pub mod rsi;

pub use breakout::BreakoutStrategy;
pub use moving_average::MovingAverageStrategy;
pub use retry::RetryTradeStrategy;
pub use rsi::RsiStrategy;

use async_trait::async_trait;

use crate::error::StrategyError;

/// One trading strategy, evaluated once per cycle.
///
/// `execute` either completes silently (which includes "no signal this
/// tick") or fails; the runner logs the failure and moves on to the next
/// strategy, so one broken strategy never blocks the others.
#[async_trait]
pub trait Strategy: Send {
    async fn execute(&mut self) -> Result<(), StrategyError>;

    /// Strategy name, used in logs.
    fn name(&self) -> &'static str;
}
