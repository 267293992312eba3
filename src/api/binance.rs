use chrono::{TimeZone, Utc};
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::Deserialize;
use sha2::Sha256;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::time::Duration;

use crate::models::Candle;
use crate::Result;

const RATE_LIMIT_RPM: u32 = 60;
const MAX_RETRIES: u32 = 4;
const REQUEST_TIMEOUT_SECS: u64 = 10;

// Type alias for the rate limiter to simplify signatures
type BinanceRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Client for the Binance USDⓈ-M Futures REST API.
///
/// Market data needs no credentials; order placement requires an API
/// key/secret pair and signs the query string with HMAC-SHA256.
///
/// This struct is cloneable to allow sharing across async tasks.
/// All clones share the same rate limiter.
#[derive(Clone)]
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_secret: Option<String>,
    rate_limiter: Arc<BinanceRateLimiter>,
}

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
pub struct OrderAck {
    #[serde(rename = "orderId")]
    pub order_id: i64,
    pub status: String,
}

impl BinanceClient {
    pub fn new(base_url: String, api_key: Option<String>, api_secret: Option<String>) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(RATE_LIMIT_RPM).unwrap());

        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("reqwest client"),
            base_url,
            api_key,
            api_secret,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn from_config(config: &crate::Config) -> Self {
        Self::new(
            config.binance_base_url().to_string(),
            config.binance_api_key.clone(),
            config.binance_api_secret.clone(),
        )
    }

    /// Fetch OHLCV candles.
    /// Endpoint: GET /fapi/v1/klines?symbol={}&interval={}&limit={}
    ///
    /// Rows come back as JSON arrays with prices encoded as strings:
    /// [open_time_ms, open, high, low, close, volume, close_time_ms, ...]
    pub async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, limit
        );

        let response = self.request_with_retry(|| self.client.get(&url)).await?;
        let rows: Vec<Vec<serde_json::Value>> = response.json().await?;

        let mut candles = Vec::with_capacity(rows.len());
        for row in rows {
            candles.push(parse_kline_row(&row)?);
        }

        tracing::debug!("Fetched {} klines for {}", candles.len(), symbol);
        Ok(candles)
    }

    /// Place a market order.
    /// Endpoint: POST /fapi/v1/order (signed)
    pub async fn place_market_order(
        &self,
        symbol: &str,
        side: &str,
        quantity: f64,
    ) -> Result<OrderAck> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or("Binance API key not configured")?;

        let timestamp = Utc::now().timestamp_millis();
        let params = format!(
            "symbol={}&side={}&type=MARKET&quantity={}&timestamp={}",
            symbol, side, quantity, timestamp
        );
        let signature = self.sign(&params)?;
        let url = format!(
            "{}/fapi/v1/order?{}&signature={}",
            self.base_url, params, signature
        );

        let response = self
            .request_with_retry(|| self.client.post(&url).header("X-MBX-APIKEY", api_key))
            .await?;

        let ack: OrderAck = response.json().await?;
        Ok(ack)
    }

    /// Sign the query string for authenticated endpoints
    fn sign(&self, params: &str) -> Result<String> {
        let secret = self
            .api_secret
            .as_ref()
            .ok_or("Binance API secret not configured")?;

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|e| format!("HMAC init failed: {}", e))?;
        mac.update(params.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Make a rate-limited request with retry logic.
    ///
    /// 429 and 5xx responses and transport errors are retried with
    /// exponential backoff plus up to a second of jitter; other 4xx
    /// responses fail fast.
    async fn request_with_retry(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        for attempt in 1..=MAX_RETRIES {
            self.rate_limiter.until_ready().await;

            match build().send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let backoff = backoff_with_jitter(attempt);
                        tracing::warn!(
                            "Binance returned {}, retrying in {:?} (attempt {}/{})",
                            status,
                            backoff,
                            attempt,
                            MAX_RETRIES
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    // Other 4xx - don't retry
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(format!("Binance API error ({}): {}", status, error_text).into());
                }
                Err(e) if attempt < MAX_RETRIES => {
                    let backoff = backoff_with_jitter(attempt);
                    tracing::warn!(
                        "Network error: {}, retrying in {:?} (attempt {}/{})",
                        e,
                        backoff,
                        attempt,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    return Err(format!("Network error after {} retries: {}", MAX_RETRIES, e).into())
                }
            }
        }

        Err(format!("Failed after {} retries", MAX_RETRIES).into())
    }
}

/// Exponential backoff (1s, 2s, 4s, ...) plus 0-1s of random jitter
fn backoff_with_jitter(attempt: u32) -> Duration {
    let base_ms = 1000u64 * 2u64.pow(attempt.saturating_sub(1));
    let jitter_ms = rand::thread_rng().gen_range(0..1000);
    Duration::from_millis(base_ms + jitter_ms)
}

fn parse_kline_row(row: &[serde_json::Value]) -> Result<Candle> {
    if row.len() < 6 {
        return Err(format!("Malformed kline row: {} fields", row.len()).into());
    }

    let open_time = row[0]
        .as_i64()
        .ok_or("Kline open time is not an integer")?;
    let timestamp = Utc
        .timestamp_millis_opt(open_time)
        .single()
        .ok_or("Kline open time out of range")?;

    Ok(Candle {
        timestamp,
        open: parse_price(&row[1])?,
        high: parse_price(&row[2])?,
        low: parse_price(&row[3])?,
        close: parse_price(&row[4])?,
        volume: parse_price(&row[5])?,
    })
}

fn parse_price(value: &serde_json::Value) -> Result<f64> {
    value
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| value.as_f64())
        .ok_or_else(|| format!("Unparseable kline field: {}", value).into())
}
