use std::sync::Arc;
use std::time::Duration;

use ethbot::api::CoincheckClient;
use ethbot::config::Settings;
use ethbot::execution::{PriceRecorder, StrategyRunner};
use ethbot::models::PAIR;
use ethbot::persistence::TradeLog;
use ethbot::risk::PositionSizer;
use ethbot::strategy::{
    BreakoutStrategy, MovingAverageStrategy, RetryTradeStrategy, RsiStrategy, Strategy,
};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let settings = Settings::load()?;
    tracing::info!("🚀 ethbot starting (pair: {PAIR})");

    let client = CoincheckClient::new(
        &settings.base_url,
        &settings.access_key,
        settings.secret_key.expose(),
        Duration::from_secs(settings.request_timeout_seconds),
    )?;
    let trade_log = Arc::new(TradeLog::new(&settings.trade_log_path)?);
    let sizer = PositionSizer::new(client.clone(), settings.risk_percent);

    let strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(BreakoutStrategy::new(client.clone(), trade_log.clone())),
        Box::new(MovingAverageStrategy::new(
            client.clone(),
            sizer.clone(),
            trade_log.clone(),
            settings.short_ma_period,
            settings.long_ma_period,
        )),
        Box::new(RsiStrategy::new(
            client.clone(),
            trade_log.clone(),
            settings.rsi_period,
        )),
        Box::new(
            RetryTradeStrategy::new(client.clone(), sizer, trade_log.clone())
                .with_pacing(Duration::from_secs(settings.retry_pacing_seconds)),
        ),
    ];
    let recorder = PriceRecorder::new(client, trade_log);
    let mut runner = StrategyRunner::new(strategies, Duration::from_secs(settings.pacing_seconds))
        .with_recorder(recorder);

    tracing::info!("📊 Configuration:");
    tracing::info!("  Cycle: every {} min", settings.poll_interval_minutes);
    tracing::info!("  Pacing between strategies: {}s", settings.pacing_seconds);
    tracing::info!("  Risk per trade: {}%", settings.risk_percent);
    tracing::info!(
        "  Moving averages: {}/{}, RSI period: {}",
        settings.short_ma_period,
        settings.long_ma_period,
        settings.rsi_period
    );
    tracing::info!("  Trade log: {}", settings.trade_log_path);

    let period = Duration::from_secs(settings.poll_interval_minutes * 60);
    let start = next_cycle_boundary(settings.poll_interval_minutes);
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!("Press Ctrl+C to stop...");
    loop {
        tokio::select! {
            _ = ticker.tick() => runner.run_cycle().await,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("⚠️  Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    tracing::info!("👋 ethbot stopped");
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ethbot=info,ethbot::strategy=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Next wall-clock instant aligned to a multiple of the polling interval,
/// so cycles land on round minutes (XX:00, XX:05, ...).
fn next_cycle_boundary(interval_minutes: u64) -> Instant {
    let period = interval_minutes.max(1) * 60;
    let now = chrono::Utc::now().timestamp() as u64;
    let remainder = now % period;
    let wait = if remainder == 0 { 0 } else { period - remainder };
    Instant::now() + Duration::from_secs(wait)
}
