use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;

/// API secret wrapper. Debug and Display never show the value, so the
/// secret cannot leak through logs or error chains.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

/// Runtime settings, layered from defaults, an optional `ethbot.toml` and
/// `ETHBOT_*` environment variables (highest precedence). Credentials have
/// no default and must come from the environment or the file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub access_key: String,
    pub secret_key: SecretString,
    pub base_url: String,
    pub risk_percent: f64,
    pub poll_interval_minutes: u64,
    pub pacing_seconds: u64,
    pub retry_pacing_seconds: u64,
    pub request_timeout_seconds: u64,
    pub trade_log_path: String,
    pub short_ma_period: usize,
    pub long_ma_period: usize,
    pub rsi_period: usize,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("base_url", crate::api::DEFAULT_BASE_URL)?
            .set_default("risk_percent", 5.0)?
            .set_default("poll_interval_minutes", 5)?
            .set_default("pacing_seconds", 2)?
            .set_default("retry_pacing_seconds", 1)?
            .set_default("request_timeout_seconds", 10)?
            .set_default("trade_log_path", "trades.csv")?
            .set_default("short_ma_period", 10)?
            .set_default("long_ma_period", 50)?
            .set_default("rsi_period", 14)?
            .add_source(File::with_name("ethbot").required(false))
            .add_source(Environment::with_prefix("ETHBOT"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.short_ma_period == 0 || self.short_ma_period >= self.long_ma_period {
            return Err(ConfigError::Message(format!(
                "short_ma_period ({}) must be positive and smaller than long_ma_period ({})",
                self.short_ma_period, self.long_ma_period
            )));
        }
        if self.rsi_period == 0 {
            return Err(ConfigError::Message("rsi_period must be positive".into()));
        }
        if !(self.risk_percent > 0.0 && self.risk_percent <= 100.0) {
            return Err(ConfigError::Message(format!(
                "risk_percent ({}) must be within (0, 100]",
                self.risk_percent
            )));
        }
        if self.poll_interval_minutes == 0 {
            return Err(ConfigError::Message(
                "poll_interval_minutes must be positive".into(),
            ));
        }
        Ok(())
    }
}
