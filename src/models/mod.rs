use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The only pair this bot trades.
pub const PAIR: &str = "eth_jpy";

/// Smallest order amount the exchange accepts, in ETH.
pub const MIN_ORDER_AMOUNT: f64 = 0.01;

/// A single observed price at a point in time. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceSample {
    pub fn new(price: f64, timestamp: DateTime<Utc>) -> Self {
        Self { price, timestamp }
    }
}

/// Order direction, wire form `"buy"` / `"sell"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

/// A limit order to submit to the exchange.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderRequest {
    pub rate: f64,
    pub amount: f64,
    pub order_type: OrderSide,
    pub pair: &'static str,
}

impl OrderRequest {
    pub fn new(order_type: OrderSide, rate: f64, amount: f64) -> Self {
        Self {
            rate,
            amount,
            order_type,
            pair: PAIR,
        }
    }

    pub fn buy(rate: f64, amount: f64) -> Self {
        Self::new(OrderSide::Buy, rate, amount)
    }

    pub fn sell(rate: f64, amount: f64) -> Self {
        Self::new(OrderSide::Sell, rate, amount)
    }
}

/// A submitted order the exchange has not fully filled yet. Sourced from
/// the exchange; never mutated locally except by cancelling it.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenOrder {
    pub id: u64,
    pub order_type: OrderSide,
    #[serde(default, deserialize_with = "crate::api::de_opt_f64")]
    pub rate: Option<f64>,
    #[serde(default, deserialize_with = "crate::api::de_opt_f64")]
    pub pending_amount: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Account balance snapshot, fetched fresh for every sizing decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountBalances {
    pub yen: f64,
    pub eth: f64,
}

impl AccountBalances {
    /// Total account value in yen, marking the ETH holding at `price`.
    pub fn total_value_at(&self, price: f64) -> f64 {
        self.yen + self.eth * price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_request_carries_fixed_pair() {
        let order = OrderRequest::buy(450000.0, 0.01);
        assert_eq!(order.pair, "eth_jpy");
        assert_eq!(order.order_type, OrderSide::Buy);
    }

    #[test]
    fn test_order_side_wire_form() {
        assert_eq!(serde_json::to_string(&OrderSide::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&OrderSide::Sell).unwrap(), "\"sell\"");
        let side: OrderSide = serde_json::from_str("\"sell\"").unwrap();
        assert_eq!(side, OrderSide::Sell);
    }

    #[test]
    fn test_total_value_marks_eth_at_price() {
        let balances = AccountBalances { yen: 1000.0, eth: 2.0 };
        assert_eq!(balances.total_value_at(450000.0), 901000.0);
    }
}
