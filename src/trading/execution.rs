//! Order execution against the CLOB REST API.

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info, instrument};

use super::order::{OrderParams, OrderState, OrderStatus, Side};
use crate::error::TradingError;
use crate::market::client::ClobClient;
use crate::signing;

/// Order submission request body.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Token ID to trade.
    pub token_id: String,
    /// Order side (BUY/SELL).
    pub side: String,
    /// Limit price.
    pub price: String,
    /// Order size in USD.
    pub size: String,
    /// Nonce for order uniqueness.
    pub nonce: String,
    /// Maker address.
    pub maker: String,
    /// Signature type.
    pub signature_type: u8,
    /// Order signature.
    pub signature: String,
    /// Time in force; resting maker orders are always GTC.
    pub order_type: String,
}

/// Order submission result.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResult {
    /// Order ID (various field names).
    #[serde(alias = "orderID", alias = "orderId", alias = "order_id", alias = "id")]
    pub order_id: Option<String>,
    /// Error message if any.
    pub error: Option<String>,
}

fn map_http_failure(status: StatusCode, body: String, order_id: Option<&str>) -> TradingError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TradingError::AuthenticationFailed(format!("HTTP {} - {}", status, body))
        }
        StatusCode::TOO_MANY_REQUESTS => TradingError::RateLimited {
            retry_after_seconds: parse_retry_after(&body).unwrap_or(5),
        },
        _ => match order_id {
            Some(id) => TradingError::StatusFailed {
                order_id: id.to_string(),
                reason: format!("HTTP {} - {}", status, body),
            },
            None => TradingError::SubmissionFailed(format!("HTTP {} - {}", status, body)),
        },
    }
}

fn parse_retry_after(body: &str) -> Option<u64> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json.get("retry_after").and_then(|v| v.as_u64())
}

/// Submit a resting limit order.
#[instrument(skip(client, params), fields(token = %params.token_id, side = ?params.side))]
pub async fn submit_order(
    client: &ClobClient,
    params: &OrderParams,
) -> Result<String, TradingError> {
    params.validate().map_err(TradingError::InvalidParams)?;

    debug!(price = %params.price, size = %params.size_usd, "Submitting order");

    let address = client.get_address()?;
    let auth_headers =
        signing::generate_auth_headers(client.private_key(), client.signature_type()).await?;

    let nonce = chrono::Utc::now().timestamp_millis().to_string();

    let side_str = match params.side {
        Side::Buy => "BUY",
        Side::Sell => "SELL",
    };

    // token_id + side + price + size + nonce
    let order_message = format!(
        "{}:{}:{}:{}:{}",
        params.token_id, side_str, params.price, params.size_usd, nonce
    );
    let signature_bytes =
        signing::sign_message(client.private_key(), order_message.as_bytes()).await?;
    let signature = format!("0x{}", hex::encode(&signature_bytes));

    let order_request = OrderRequest {
        token_id: params.token_id.clone(),
        side: side_str.to_string(),
        price: params.price.to_string(),
        size: params.size_usd.to_string(),
        nonce,
        maker: address,
        signature_type: client.signature_type(),
        signature,
        order_type: "GTC".to_string(),
    };

    let url = format!("{}/order", client.clob_url());

    let mut request = client.http().post(&url).json(&order_request);
    for (key, value) in &auth_headers {
        request = request.header(key.as_str(), value.as_str());
    }

    let response = request
        .send()
        .await
        .map_err(|e| TradingError::Network(format!("order submission: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(map_http_failure(status, body, None));
    }

    let result: SubmitResult = response
        .json()
        .await
        .map_err(|e| TradingError::SubmissionFailed(format!("failed to parse response: {}", e)))?;

    if let Some(error) = result.error {
        return Err(TradingError::SubmissionFailed(error));
    }

    let order_id = result
        .order_id
        .ok_or_else(|| TradingError::SubmissionFailed("no order ID in response".to_string()))?;

    info!(
        order_id = %order_id,
        token_id = %params.token_id,
        price = %params.price,
        size = %params.size_usd,
        "Order submitted"
    );

    Ok(order_id)
}

/// Cancel a resting order.
#[instrument(skip(client))]
pub async fn cancel_order(client: &ClobClient, order_id: &str) -> Result<(), TradingError> {
    let auth_headers =
        signing::generate_auth_headers(client.private_key(), client.signature_type()).await?;

    let url = format!("{}/order/{}", client.clob_url(), order_id);

    let mut request = client.http().delete(&url);
    for (key, value) in &auth_headers {
        request = request.header(key.as_str(), value.as_str());
    }

    let response = request
        .send()
        .await
        .map_err(|e| TradingError::Network(format!("cancel: {}", e)))?;

    let status = response.status();
    if status.is_success() {
        info!(order_id = %order_id, "Order cancelled");
        return Ok(());
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let body = response.text().await.unwrap_or_default();
        return Err(TradingError::AuthenticationFailed(format!(
            "HTTP {} - {}",
            status, body
        )));
    }

    Err(TradingError::CancelFailed {
        order_id: order_id.to_string(),
        reason: format!("HTTP {}", status),
    })
}

/// Get current order status from the API.
#[instrument(skip(client))]
pub async fn get_order_status(
    client: &ClobClient,
    order_id: &str,
) -> Result<OrderState, TradingError> {
    let auth_headers =
        signing::generate_auth_headers(client.private_key(), client.signature_type()).await?;

    let url = format!("{}/order/{}", client.clob_url(), order_id);

    let mut request = client.http().get(&url);
    for (key, value) in &auth_headers {
        request = request.header(key.as_str(), value.as_str());
    }

    let response = request
        .send()
        .await
        .map_err(|e| TradingError::Network(format!("order status: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(map_http_failure(status, body, Some(order_id)));
    }

    let json: serde_json::Value = response.json().await.map_err(|e| TradingError::StatusFailed {
        order_id: order_id.to_string(),
        reason: format!("failed to parse response: {}", e),
    })?;

    Ok(parse_order_state(order_id, &json))
}

/// Parse an order-state payload, tolerating the API's inconsistent field
/// names and nesting.
pub fn parse_order_state(order_id: &str, json: &serde_json::Value) -> OrderState {
    // Some deployments nest the payload under order_data/order/data.
    let data = ["order_data", "order", "data"]
        .iter()
        .find_map(|k| json.get(*k))
        .unwrap_or(json);

    let status = data
        .get("status")
        .or_else(|| data.get("orderStatus"))
        .or_else(|| data.get("order_status"))
        .and_then(raw_to_string)
        .and_then(|s| OrderStatus::from_str(&s).ok());

    let filled_amount = parse_decimal_field(
        data,
        &["filled_amount", "filledAmount", "executed_amount", "filled"],
    )
    .unwrap_or(Decimal::ZERO);

    let ordered_amount = parse_decimal_field(data, &["amount", "size", "original_size"]);

    OrderState {
        order_id: order_id.to_string(),
        status,
        filled_amount,
        ordered_amount,
    }
}

fn raw_to_string(value: &serde_json::Value) -> Option<String> {
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    value.as_i64().map(|n| n.to_string())
}

/// Parse a decimal field from JSON, trying multiple field names.
pub fn parse_decimal_field(json: &serde_json::Value, keys: &[&str]) -> Option<Decimal> {
    for key in keys {
        if let Some(value) = json.get(*key) {
            if let Some(s) = value.as_str() {
                if let Ok(d) = s.parse::<Decimal>() {
                    return Some(d);
                }
            }
            if let Some(n) = value.as_f64() {
                if let Ok(d) = Decimal::try_from(n) {
                    return Some(d);
                }
            }
        }
    }
    None
}
