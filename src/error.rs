use thiserror::Error;

/// Failures talking to the exchange. The client never retries; callers
/// decide what a failure means for their strategy.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Transport-level failure, including request timeouts.
    #[error("exchange transport failure: {0}")]
    Network(#[from] reqwest::Error),

    /// The exchange answered with a non-success HTTP status.
    #[error("exchange returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// A request body could not be encoded.
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures surfaced by a strategy's `execute`.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// Not enough price history yet. Not a real failure: strategies treat
    /// it as "collect more samples and come back next cycle".
    #[error("not enough samples yet: have {have}, need {need}")]
    InsufficientData { have: usize, need: usize },

    /// Cancel or resubmit failed for one open order. Isolated per order so
    /// the remaining orders still get processed.
    #[error("could not recover open order {order_id}: {reason}")]
    Recovery { order_id: u64, reason: String },
}

/// Trade-log failures. Always best-effort: a failed append never aborts a
/// trading decision that was already made.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("trade log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("trade log format error: {0}")]
    Csv(#[from] csv::Error),
}
