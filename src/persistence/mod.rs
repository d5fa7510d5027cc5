use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::PersistenceError;
use crate::models::OrderSide;

/// One row in the append-only trade log.
///
/// The tag says what kind of event the row records: `PRICE` for the
/// per-cycle price sample, `BO-*` / `MA-*` / `RSI-*` for detector orders,
/// `RETRY-*` for resubmitted open orders. Indicator columns are filled only
/// where the detector has them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub tag: String,
    pub timestamp: DateTime<Utc>,
    pub amount: Option<f64>,
    pub price: f64,
    pub short_ma: Option<f64>,
    pub long_ma: Option<f64>,
    pub rsi: Option<f64>,
}

impl TradeRecord {
    /// Per-cycle price observation.
    pub fn price(price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            tag: "PRICE".to_string(),
            timestamp,
            amount: None,
            price,
            short_ma: None,
            long_ma: None,
            rsi: None,
        }
    }

    /// An order placed by a detector or the recovery pass.
    pub fn order(
        tag_prefix: &str,
        side: OrderSide,
        amount: f64,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let suffix = match side {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        };
        Self {
            tag: format!("{tag_prefix}-{suffix}"),
            timestamp,
            amount: Some(amount),
            price,
            short_ma: None,
            long_ma: None,
            rsi: None,
        }
    }

    pub fn with_moving_averages(mut self, short_ma: f64, long_ma: f64) -> Self {
        self.short_ma = Some(short_ma);
        self.long_ma = Some(long_ma);
        self
    }

    pub fn with_rsi(mut self, rsi: f64) -> Self {
        self.rsi = Some(rsi);
        self
    }
}

/// Append-only CSV record of prices and placed orders.
///
/// Strictly best-effort: callers log and ignore failures, because a broken
/// trade log must never undo a trading decision that was already made.
pub struct TradeLog {
    path: PathBuf,
}

const HEADER: [&str; 7] = [
    "tag", "timestamp", "amount", "price", "short_ma", "long_ma", "rsi",
];

impl TradeLog {
    /// Open the log at `path`, creating it with a header row if missing.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(HEADER)?;
            writer.flush()?;
        }
        Ok(Self { path })
    }

    /// Append one record.
    pub fn append(&self, record: &TradeRecord) -> Result<(), PersistenceError> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// Number of data rows recorded so far (header excluded).
    pub fn last_recorded_row(&self) -> Result<usize, PersistenceError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        Ok(reader.records().filter(|r| r.is_ok()).count())
    }

    /// Prices recorded at or after `since`, oldest first. Only `PRICE`
    /// rows count; order rows are decisions, not observations.
    pub fn historical_prices(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<f64>, PersistenceError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut prices = Vec::new();
        for row in reader.deserialize::<TradeRecord>() {
            let record = row?;
            if record.tag == "PRICE" && record.timestamp >= since {
                prices.push(record.price);
            }
        }
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn temp_log(dir: &tempfile::TempDir) -> TradeLog {
        TradeLog::new(dir.path().join("trades.csv")).expect("log opens")
    }

    #[test]
    fn test_new_log_starts_empty() {
        let dir = tempdir().unwrap();
        let log = temp_log(&dir);
        assert_eq!(log.last_recorded_row().unwrap(), 0);
    }

    #[test]
    fn test_append_and_count() {
        let dir = tempdir().unwrap();
        let log = temp_log(&dir);

        log.append(&TradeRecord::price(450000.0, Utc::now())).unwrap();
        log.append(&TradeRecord::order("BO", OrderSide::Buy, 0.01, 455000.0, Utc::now()))
            .unwrap();

        assert_eq!(log.last_recorded_row().unwrap(), 2);
    }

    #[test]
    fn test_reopening_existing_log_preserves_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trades.csv");

        let log = TradeLog::new(&path).unwrap();
        log.append(&TradeRecord::price(450000.0, Utc::now())).unwrap();
        drop(log);

        let reopened = TradeLog::new(&path).unwrap();
        assert_eq!(reopened.last_recorded_row().unwrap(), 1);
    }

    #[test]
    fn test_historical_prices_filters_tag_and_age() {
        let dir = tempdir().unwrap();
        let log = temp_log(&dir);
        let now = Utc::now();

        log.append(&TradeRecord::price(100.0, now - Duration::hours(30))).unwrap();
        log.append(&TradeRecord::price(200.0, now - Duration::hours(2))).unwrap();
        log.append(&TradeRecord::order("MA", OrderSide::Sell, 0.5, 210.0, now)).unwrap();
        log.append(&TradeRecord::price(300.0, now)).unwrap();

        let prices = log.historical_prices(now - Duration::hours(24)).unwrap();
        assert_eq!(prices, vec![200.0, 300.0]);
    }

    #[test]
    fn test_round_trips_indicator_columns() {
        let dir = tempdir().unwrap();
        let log = temp_log(&dir);
        let now = Utc::now();

        let record = TradeRecord::order("MA", OrderSide::Buy, 0.02, 450000.0, now)
            .with_moving_averages(451000.0, 449000.0);
        log.append(&record).unwrap();
        log.append(&TradeRecord::order("RSI", OrderSide::Sell, 0.01, 452000.0, now).with_rsi(71.5))
            .unwrap();

        let mut reader = csv::Reader::from_path(dir.path().join("trades.csv")).unwrap();
        let rows: Vec<TradeRecord> = reader.deserialize().map(|r| r.unwrap()).collect();

        assert_eq!(rows[0].tag, "MA-BUY");
        assert_eq!(rows[0].short_ma, Some(451000.0));
        assert_eq!(rows[0].long_ma, Some(449000.0));
        assert_eq!(rows[0].rsi, None);
        assert_eq!(rows[1].tag, "RSI-SELL");
        assert_eq!(rows[1].rsi, Some(71.5));
        assert_eq!(rows[1].amount, Some(0.01));
    }
}
