use hmac::{Hmac, Mac};
use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ExchangeError;
use crate::models::{AccountBalances, OpenOrder, OrderRequest, OrderSide, PAIR};

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_BASE_URL: &str = "https://coincheck.com/api";

/// Process-wide nonce authority.
///
/// The exchange requires strictly increasing nonces per credential, so every
/// clone of the client draws from one shared counter: the conventional
/// value is the current time in milliseconds, bumped past the previous
/// nonce whenever the clock has not advanced.
#[derive(Debug, Default)]
pub struct NonceSource {
    last: AtomicU64,
}

impl NonceSource {
    pub fn next(&self) -> u64 {
        let now = chrono::Utc::now().timestamp_millis() as u64;
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }
}

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
struct TickerResponse {
    last: f64,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(deserialize_with = "super::de_f64")]
    jpy: f64,
    #[serde(deserialize_with = "super::de_f64")]
    eth: f64,
}

/// Open orders listing. `success == false` is a soft failure flag the
/// recovery strategy checks before touching any order.
#[derive(Debug, Deserialize)]
pub struct OpenOrdersResponse {
    pub success: bool,
    #[serde(default)]
    pub orders: Vec<OpenOrder>,
}

/// Acknowledgment for a submitted order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderAck {
    pub success: bool,
    pub id: u64,
    pub order_type: OrderSide,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelResponse {
    pub success: bool,
    pub id: u64,
}

// ============== Client ==============

/// Authenticated Coincheck REST client.
///
/// Performs no retries: retry policy belongs to the strategies. Every
/// request carries a bounded timeout; expiry surfaces as a transport error.
#[derive(Clone)]
pub struct CoincheckClient {
    client: Client,
    base_url: String,
    access_key: String,
    // Keyed MAC prototype. The raw secret is consumed at construction and
    // never stored, logged or exposed.
    mac: HmacSha256,
    nonce: Arc<NonceSource>,
}

impl CoincheckClient {
    pub fn new(
        base_url: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: &str,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let mac = HmacSha256::new_from_slice(secret_key.as_bytes())
            .expect("HMAC accepts keys of any length");
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            access_key: access_key.into(),
            mac,
            nonce: Arc::new(NonceSource::default()),
        })
    }

    /// HMAC-SHA256 over `nonce + base_url + path + body`, lower-case hex.
    fn sign(&self, nonce: u64, path: &str, body: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(nonce.to_string().as_bytes());
        mac.update(self.base_url.as_bytes());
        mac.update(path.as_bytes());
        mac.update(body.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<T, ExchangeError> {
        let nonce = self.nonce.next();
        let signature = self.sign(nonce, path, body.as_deref().unwrap_or(""));
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client
            .request(method, &url)
            .header("ACCESS-KEY", &self.access_key)
            .header("ACCESS-NONCE", nonce.to_string())
            .header("ACCESS-SIGNATURE", signature);
        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Last trade price for ETH/JPY.
    pub async fn get_price(&self) -> Result<f64, ExchangeError> {
        let ticker: TickerResponse = self
            .request(Method::GET, &format!("/ticker?pair={PAIR}"), None)
            .await?;
        Ok(ticker.last)
    }

    /// Fresh yen / ETH balance snapshot.
    pub async fn get_balances(&self) -> Result<AccountBalances, ExchangeError> {
        let balance: BalanceResponse = self
            .request(Method::GET, "/accounts/balance", None)
            .await?;
        Ok(AccountBalances {
            yen: balance.jpy,
            eth: balance.eth,
        })
    }

    /// Submit a limit order.
    pub async fn create_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        let body = serde_json::to_string(order)?;
        self.request(Method::POST, "/exchange/orders", Some(body))
            .await
    }

    /// Orders submitted but not fully filled yet.
    pub async fn open_orders(&self) -> Result<OpenOrdersResponse, ExchangeError> {
        self.request(Method::GET, "/exchange/orders/opens", None)
            .await
    }

    /// Cancel one open order by id.
    pub async fn cancel_order(&self, id: u64) -> Result<CancelResponse, ExchangeError> {
        self.request(Method::DELETE, &format!("/exchange/orders/{id}"), None)
            .await
    }
}
