//! Append-only JSONL log of detected fills.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::Result;

/// One detected fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillRecord {
    /// When the fill was detected (RFC 3339).
    pub timestamp: String,
    /// Market the order was quoting.
    pub market_id: String,
    /// Exchange order ID.
    pub order_id: String,
    /// USD amount filled.
    pub filled_amount: Decimal,
    /// USD amount originally ordered.
    pub ordered_amount: Decimal,
    /// Resting price at fill time.
    pub price: Decimal,
    /// "partial" or "full".
    pub verdict: String,
}

impl FillRecord {
    /// Build a record stamped with the current time.
    pub fn now(
        market_id: &str,
        order_id: &str,
        filled_amount: Decimal,
        ordered_amount: Decimal,
        price: Decimal,
        verdict: &str,
    ) -> Self {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| String::new());
        Self {
            timestamp,
            market_id: market_id.to_string(),
            order_id: order_id.to_string(),
            filled_amount,
            ordered_amount,
            price,
            verdict: verdict.to_string(),
        }
    }
}

/// Serialized appender over a JSONL file. The mutex keeps concurrent workers
/// from interleaving partial lines.
#[derive(Debug)]
pub struct TradeLog {
    path: String,
    write_lock: Mutex<()>,
}

impl TradeLog {
    /// Log writing to `path`, created on first append.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Append one record as a single JSON line.
    pub async fn append(&self, record: &FillRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        info!(
            market_id = %record.market_id,
            order_id = %record.order_id,
            filled = %record.filled_amount,
            verdict = %record.verdict,
            "Fill recorded"
        );
        Ok(())
    }
}
