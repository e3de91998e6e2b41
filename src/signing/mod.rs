//! Wallet signing for API authentication.
//!
//! Signer construction parses the hex key and derives the curve point, which
//! is not free; signers are cached per key since the bot signs on every
//! placement and cancel.

use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::error::TradingError;

static SIGNER_CACHE: Lazy<DashMap<String, PrivateKeySigner>> = Lazy::new(DashMap::new);

fn get_signer(private_key: &str) -> Result<PrivateKeySigner, TradingError> {
    if let Some(signer) = SIGNER_CACHE.get(private_key) {
        return Ok(signer.clone());
    }

    let trimmed = private_key.trim_start_matches("0x");
    let signer: PrivateKeySigner = trimmed
        .parse()
        .map_err(|e| TradingError::SigningError(format!("invalid private key: {}", e)))?;

    SIGNER_CACHE.insert(private_key.to_string(), signer.clone());
    Ok(signer)
}

/// Derive the wallet address from a private key.
pub fn address_from_private_key(private_key: &str) -> Result<String, TradingError> {
    let signer = get_signer(private_key)?;
    Ok(signer.address().to_string())
}

/// Sign an arbitrary message, returning the raw signature bytes.
pub async fn sign_message(private_key: &str, message: &[u8]) -> Result<Vec<u8>, TradingError> {
    let signer = get_signer(private_key)?;
    let signature = signer
        .sign_message(message)
        .await
        .map_err(|e| TradingError::SigningError(format!("signing failed: {}", e)))?;
    Ok(signature.as_bytes().to_vec())
}

/// Build the POLY_* authentication headers for an API request.
pub async fn generate_auth_headers(
    private_key: &str,
    signature_type: u8,
) -> Result<Vec<(String, String)>, TradingError> {
    let signer = get_signer(private_key)?;
    let address = signer.address().to_string();
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let nonce = "0";

    // address:timestamp:nonce, signed with the wallet key.
    let message = format!("{}:{}:{}", address, timestamp, nonce);
    let signature = signer
        .sign_message(message.as_bytes())
        .await
        .map_err(|e| TradingError::SigningError(format!("signing failed: {}", e)))?;

    Ok(vec![
        ("POLY_ADDRESS".to_string(), address),
        (
            "POLY_SIGNATURE".to_string(),
            format!("0x{}", hex::encode(signature.as_bytes())),
        ),
        ("POLY_TIMESTAMP".to_string(), timestamp),
        ("POLY_NONCE".to_string(), nonce.to_string()),
        (
            "POLY_SIGNATURE_TYPE".to_string(),
            signature_type.to_string(),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0x0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn address_derivation_is_deterministic_and_cached() {
        let first = address_from_private_key(TEST_KEY).unwrap();
        let second = address_from_private_key(TEST_KEY).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("0x"));
        assert_eq!(first.len(), 42);
    }

    #[test]
    fn invalid_key_is_rejected() {
        assert!(address_from_private_key("not-a-key").is_err());
    }

    #[tokio::test]
    async fn auth_headers_carry_all_fields() {
        let headers = generate_auth_headers(TEST_KEY, 1).await.unwrap();
        let names: Vec<&str> = headers.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "POLY_ADDRESS",
                "POLY_SIGNATURE",
                "POLY_TIMESTAMP",
                "POLY_NONCE",
                "POLY_SIGNATURE_TYPE"
            ]
        );
        let sig_type = &headers[4].1;
        assert_eq!(sig_type, "1");
    }

    #[tokio::test]
    async fn signatures_are_65_bytes() {
        let bytes = sign_message(TEST_KEY, b"hello").await.unwrap();
        assert_eq!(bytes.len(), 65);
    }
}
