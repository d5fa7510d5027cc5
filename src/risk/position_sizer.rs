use crate::api::CoincheckClient;
use crate::error::ExchangeError;
use crate::models::{AccountBalances, MIN_ORDER_AMOUNT};

/// Converts risk parameters and account balances into an order amount.
///
/// Every call reads a fresh balance snapshot: balances change after each
/// fill, so caching across ticks would size orders against stale capital.
#[derive(Clone)]
pub struct PositionSizer {
    client: CoincheckClient,
    risk_percent: f64,
}

impl PositionSizer {
    pub fn new(client: CoincheckClient, risk_percent: f64) -> Self {
        Self {
            client,
            risk_percent,
        }
    }

    /// ETH amount to buy at `price`, risking at most `risk_percent` of the
    /// total account value and never more yen than is actually held.
    pub async fn buy_amount(&self, price: f64) -> Result<f64, ExchangeError> {
        let balances = self.client.get_balances().await?;
        Ok(buy_amount_for(&balances, self.risk_percent, price))
    }

    /// ETH amount to sell: the full current ETH balance.
    pub async fn sell_amount(&self) -> Result<f64, ExchangeError> {
        let balances = self.client.get_balances().await?;
        Ok(sell_amount_for(&balances))
    }
}

/// Sizing arithmetic, separated from the balance fetch so it can be tested
/// against fixed snapshots.
pub fn buy_amount_for(balances: &AccountBalances, risk_percent: f64, price: f64) -> f64 {
    let total_value = balances.total_value_at(price);
    let risk_yen = balances.yen.min(total_value * risk_percent / 100.0);
    // truncate to the 4 decimal places the exchange accepts
    let amount = (risk_yen / price * 10_000.0).floor() / 10_000.0;
    amount.max(MIN_ORDER_AMOUNT)
}

pub fn sell_amount_for(balances: &AccountBalances) -> f64 {
    balances.eth.max(MIN_ORDER_AMOUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_amount_risks_capped_fraction_of_total() {
        // yen 1000, eth 4.95 @ 20000 -> total 100000; 50% risk caps at
        // 50000 but only 1000 yen is held -> 1000 / 20000 = 0.05 ETH
        let balances = AccountBalances { yen: 1000.0, eth: 4.95 };
        let amount = buy_amount_for(&balances, 50.0, 20000.0);
        assert_eq!(amount, 0.05);
    }

    #[test]
    fn test_buy_amount_uses_risk_fraction_when_smaller_than_yen() {
        // total 100000, 5% risk = 5000 yen even though 90000 yen is held
        let balances = AccountBalances { yen: 90000.0, eth: 0.5 };
        let amount = buy_amount_for(&balances, 5.0, 20000.0);
        assert_eq!(amount, 0.25);
    }

    #[test]
    fn test_buy_amount_truncates_to_four_decimals() {
        let balances = AccountBalances { yen: 10000.0, eth: 0.0 };
        // 10000 / 30000 = 0.33333... -> 0.3333
        let amount = buy_amount_for(&balances, 100.0, 30000.0);
        assert_eq!(amount, 0.3333);
    }

    #[test]
    fn test_buy_amount_clamps_to_exchange_minimum() {
        // 1000 yen at 200000 yen/ETH computes to 0.005, below the minimum
        let balances = AccountBalances { yen: 1000.0, eth: 0.0 };
        let amount = buy_amount_for(&balances, 50.0, 200000.0);
        assert_eq!(amount, 0.01);
    }

    #[test]
    fn test_sell_amount_is_full_eth_balance() {
        let balances = AccountBalances { yen: 0.0, eth: 1.75 };
        assert_eq!(sell_amount_for(&balances), 1.75);
    }

    #[test]
    fn test_sell_amount_clamps_to_exchange_minimum() {
        let balances = AccountBalances { yen: 0.0, eth: 0.004 };
        assert_eq!(sell_amount_for(&balances), 0.01);
    }
}
