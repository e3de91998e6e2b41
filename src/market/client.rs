//! HTTP client for the CLOB REST API.

use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::{MarketError, TradingError};
use crate::metrics::LatencyTimer;
use crate::orderbook::{OrderBook, PriceLevel};
use crate::signing;
use crate::trading::execution;
use crate::trading::order::{OrderParams, OrderState};

use super::exchange::Exchange;
use super::types::Market;

/// A raw price level from the API, both fields strings.
#[derive(Debug, Deserialize)]
struct RawLevel {
    price: String,
    size: String,
}

#[derive(Debug, Deserialize)]
struct RawBook {
    #[serde(default)]
    bids: Vec<RawLevel>,
}

#[derive(Debug, Deserialize)]
struct RawMarket {
    #[serde(alias = "condition_id", alias = "market_id", alias = "id")]
    id: String,
    #[serde(alias = "question", default)]
    title: String,
    #[serde(default)]
    tokens: Vec<RawToken>,
}

#[derive(Debug, Deserialize)]
struct RawToken {
    token_id: String,
    #[serde(default)]
    outcome: String,
}

/// Client for the CLOB API.
#[derive(Debug, Clone)]
pub struct ClobClient {
    http: Client,
    clob_url: String,
    private_key: String,
    signature_type: u8,
}

impl ClobClient {
    /// Build a client tuned for low-latency polling.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_millis(500))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            http,
            clob_url: config.clob_url.clone(),
            private_key: config.private_key.clone(),
            signature_type: config.signature_type,
        })
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// CLOB API base URL.
    pub fn clob_url(&self) -> &str {
        &self.clob_url
    }

    /// Wallet private key (hex).
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Signature type for order auth.
    pub fn signature_type(&self) -> u8 {
        self.signature_type
    }

    /// Wallet address derived from the private key.
    pub fn get_address(&self) -> Result<String, TradingError> {
        signing::address_from_private_key(&self.private_key)
    }

    /// Fetch the bid side of a token's book.
    ///
    /// Level sizes come back in shares; they are converted to USD notional
    /// (price times shares) here so every downstream depth figure is dollars.
    #[instrument(skip(self))]
    pub async fn get_order_book(&self, token_id: &str) -> Result<OrderBook, MarketError> {
        let _timer = LatencyTimer::new(crate::metrics::ORDERBOOK_FETCH_LATENCY_MS);

        let url = format!("{}/book?token_id={}", self.clob_url, token_id);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(MarketError::FetchFailed {
                token_id: token_id.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let raw: RawBook = response.json().await?;

        let mut bids = Vec::with_capacity(raw.bids.len());
        for level in raw.bids {
            let price: Decimal = level
                .price
                .parse()
                .map_err(|e| MarketError::ParseError(format!("bad price {:?}: {}", level.price, e)))?;
            let shares: Decimal = level
                .size
                .parse()
                .map_err(|e| MarketError::ParseError(format!("bad size {:?}: {}", level.size, e)))?;
            bids.push(PriceLevel::new(price, price * shares));
        }

        let book = OrderBook::new(token_id, bids);
        debug!(token_id, levels = book.bids.len(), "Fetched order book");
        Ok(book)
    }

    /// Resolve a market's metadata, including its YES token ID.
    #[instrument(skip(self))]
    pub async fn get_market(&self, market_id: &str) -> Result<Market, MarketError> {
        let url = format!("{}/markets/{}", self.clob_url, market_id);
        let response = self.http.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketError::MarketNotFound {
                market_id: market_id.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(MarketError::FetchFailed {
                token_id: market_id.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let raw: RawMarket = response.json().await?;

        let yes_token_id = raw
            .tokens
            .iter()
            .find(|t| t.outcome.eq_ignore_ascii_case("yes"))
            .map(|t| t.token_id.clone())
            .ok_or_else(|| {
                MarketError::ParseError(format!("market {} has no YES token", market_id))
            })?;

        Ok(Market {
            id: raw.id,
            title: raw.title,
            yes_token_id,
        })
    }

    /// Fetch the available USDC balance for the configured wallet.
    pub async fn get_balance(&self) -> Result<Decimal, MarketError> {
        let address = match self.get_address() {
            Ok(a) => a,
            Err(e) => return Err(MarketError::ParseError(e.to_string())),
        };

        let url = format!("{}/balance?address={}", self.clob_url, address);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(MarketError::FetchFailed {
                token_id: address,
                reason: format!("HTTP {}", response.status()),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MarketError::ParseError(e.to_string()))?;

        execution::parse_decimal_field(&json, &["balance", "available", "usdc_balance"])
            .ok_or_else(|| {
                warn!("balance response missing a recognizable amount field");
                MarketError::ParseError("no balance field in response".to_string())
            })
    }
}

#[async_trait::async_trait]
impl Exchange for ClobClient {
    async fn fetch_order_book(&self, token_id: &str) -> Result<OrderBook, MarketError> {
        self.get_order_book(token_id).await
    }

    async fn place_order(&self, params: &OrderParams) -> Result<String, TradingError> {
        let _timer = LatencyTimer::new(crate::metrics::ORDER_SUBMIT_LATENCY_MS);
        execution::submit_order(self, params).await
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), TradingError> {
        execution::cancel_order(self, order_id).await
    }

    async fn order_status(&self, order_id: &str) -> Result<OrderState, TradingError> {
        execution::get_order_status(self, order_id).await
    }
}
