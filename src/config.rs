//! Application configuration loaded from environment variables.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Exchange Credentials ===
    /// Wallet private key (hex, starts with 0x).
    pub private_key: String,

    /// Signature type: 0=EOA, 1=proxy wallet, 2=multi-sig.
    #[serde(default)]
    pub signature_type: u8,

    // === Market Selection ===
    /// Comma-separated list of market IDs to quote.
    pub market_ids: String,

    // === Quoting Parameters ===
    /// Minimum cumulative order size (USD) that must rest at better prices
    /// than our order.
    #[serde(default = "default_min_protection")]
    pub min_protection_amount: Decimal,

    /// Deepest bid rank the first placement (and the rank-exceeded rescan)
    /// may use. Documented as "check_bid_position" in the strategy config.
    #[serde(default = "default_check_bid_position")]
    pub check_bid_position: u32,

    /// Size of each resting order in USD.
    #[serde(default = "default_order_size")]
    pub order_size_usd: Decimal,

    /// Milliseconds between monitor ticks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    // === API Endpoints ===
    /// CLOB API base URL.
    #[serde(default = "default_clob_url")]
    pub clob_url: String,

    /// HTTP request timeout in milliseconds. A tick never hangs longer than
    /// this on any single network call.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    // === Alerts ===
    /// Telegram bot token for alerts (optional; alerts disabled when unset).
    #[serde(default)]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat ID for alerts.
    #[serde(default)]
    pub telegram_chat_id: Option<String>,

    // === Persistence ===
    /// Path of the append-only fill log.
    #[serde(default = "default_trade_log_path")]
    pub trade_log_path: String,

    // === Operation Modes ===
    /// Simulation mode (no real orders).
    #[serde(default)]
    pub dry_run: bool,

    // === Server Configuration ===
    /// HTTP server port for health/status endpoints.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Prometheus metrics exporter port.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_min_protection() -> Decimal {
    Decimal::new(500, 0) // $500
}

fn default_check_bid_position() -> u32 {
    10
}

fn default_order_size() -> Decimal {
    Decimal::new(50, 0) // $50
}

fn default_poll_interval() -> u64 {
    1_000
}

fn default_clob_url() -> String {
    "https://clob.polymarket.com".to_string()
}

fn default_http_timeout() -> u64 {
    5_000
}

fn default_trade_log_path() -> String {
    "trade_log.jsonl".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Parsed list of market IDs.
    pub fn market_id_list(&self) -> Vec<String> {
        self.market_ids
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.private_key.is_empty() {
            return Err("PRIVATE_KEY is required".to_string());
        }

        if !self.private_key.starts_with("0x") {
            return Err("PRIVATE_KEY must start with 0x".to_string());
        }

        if self.market_id_list().is_empty() {
            return Err("MARKET_IDS must name at least one market".to_string());
        }

        if self.min_protection_amount <= Decimal::ZERO {
            return Err("MIN_PROTECTION_AMOUNT must be positive".to_string());
        }

        if self.check_bid_position == 0 {
            return Err("CHECK_BID_POSITION must be at least 1".to_string());
        }

        if self.order_size_usd <= Decimal::ZERO {
            return Err("ORDER_SIZE_USD must be positive".to_string());
        }

        Ok(())
    }

    /// Whether the Telegram alert channel is configured.
    pub fn alerts_enabled(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }
}
