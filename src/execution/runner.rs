use std::time::Duration;

use crate::execution::PriceRecorder;
use crate::strategy::Strategy;

/// Runs one evaluation cycle over an ordered list of strategies.
///
/// Strategies execute strictly in sequence with a fixed pacing sleep after
/// each one, keeping the request rate inside the exchange limits and the
/// nonces trivially ordered. A failing strategy is logged and the cycle
/// moves on; one failure never blocks the others.
pub struct StrategyRunner {
    recorder: Option<PriceRecorder>,
    strategies: Vec<Box<dyn Strategy>>,
    pacing: Duration,
}

impl StrategyRunner {
    pub fn new(strategies: Vec<Box<dyn Strategy>>, pacing: Duration) -> Self {
        Self {
            recorder: None,
            strategies,
            pacing,
        }
    }

    /// Record the price into the trade log at the start of every cycle.
    pub fn with_recorder(mut self, recorder: PriceRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub async fn run_cycle(&mut self) {
        tracing::info!("starting evaluation cycle");

        if let Some(recorder) = &self.recorder {
            if let Err(e) = recorder.record().await {
                tracing::warn!(error = %e, "price record failed, continuing the cycle");
            }
        }

        for strategy in &mut self.strategies {
            let name = strategy.name();
            match strategy.execute().await {
                Ok(()) => tracing::debug!(strategy = name, "strategy completed"),
                Err(e) => {
                    tracing::error!(strategy = name, error = %e, "strategy failed, continuing with the next");
                }
            }
            tokio::time::sleep(self.pacing).await;
        }
    }
}
