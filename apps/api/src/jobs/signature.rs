//! Request signing for runner callbacks.
//!
//! The runner signs every call with `X-Inngest-Signature: t=<unix>&s=<hex>`,
//! where `s` is HMAC-SHA256 over the raw body followed by `t`, keyed with the
//! signing key minus its `signkey-<env>-` prefix.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-inngest-signature";

/// Signatures older (or newer) than this are rejected as replays.
const MAX_SKEW_SECS: i64 = 300;

/// The runner's signing key, prepared for computing request signatures.
#[derive(Clone)]
pub struct SigningKey {
    mac: HmacSha256,
}

impl SigningKey {
    pub fn new(raw: &str) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(strip_env_prefix(raw).as_bytes())
            .map_err(|_| anyhow::anyhow!("Invalid runner signing key"))?;
        Ok(Self { mac })
    }

    /// Checks a signature header against `body` at time `now`.
    pub fn verify(&self, header: &str, body: &[u8], now: i64) -> bool {
        let mut timestamp = None;
        let mut signature = None;
        for (key, value) in header.split('&').filter_map(|part| part.split_once('=')) {
            match key {
                "t" => timestamp = value.parse::<i64>().ok(),
                "s" => signature = hex::decode(value).ok(),
                _ => {}
            }
        }

        let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
            return false;
        };
        if (now - timestamp).abs() > MAX_SKEW_SECS {
            return false;
        }

        self.mac(body, timestamp).verify_slice(&signature).is_ok()
    }

    fn mac(&self, body: &[u8], timestamp: i64) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(body);
        mac.update(timestamp.to_string().as_bytes());
        mac
    }
}

#[cfg(test)]
impl SigningKey {
    /// Hex HMAC of `body` followed by the decimal `timestamp`.
    pub fn sign(&self, body: &[u8], timestamp: i64) -> String {
        hex::encode(self.mac(body, timestamp).finalize().into_bytes())
    }

    /// Header value a runner would send for `body` at `timestamp`.
    pub fn header_value(&self, body: &[u8], timestamp: i64) -> String {
        format!("t={timestamp}&s={}", self.sign(body, timestamp))
    }
}

fn strip_env_prefix(raw: &str) -> &str {
    raw.strip_prefix("signkey-")
        .and_then(|rest| rest.split_once('-'))
        .map(|(_, key)| key)
        .unwrap_or(raw)
}

/// A JSON body whose runner signature has been verified.
#[derive(Debug)]
pub struct SignedJson(pub Value);

#[async_trait]
impl FromRequest<AppState> for SignedJson {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = req
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let verified = header
            .as_deref()
            .is_some_and(|h| state.signing_key.verify(h, &body, Utc::now().timestamp()));
        if !verified {
            warn!("Rejected runner callback with missing or invalid signature");
            return Err(AppError::Unauthorized);
        }

        let data = serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid event body: {e}")))?;
        Ok(SignedJson(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000;

    fn key() -> SigningKey {
        SigningKey::new("signkey-test-0123abcd").unwrap()
    }

    #[test]
    fn test_env_prefix_is_stripped() {
        assert_eq!(strip_env_prefix("signkey-prod-0123abcd"), "0123abcd");
        assert_eq!(strip_env_prefix("0123abcd"), "0123abcd");
        assert_eq!(
            SigningKey::new("signkey-prod-0123abcd").unwrap().sign(b"{}", NOW),
            SigningKey::new("0123abcd").unwrap().sign(b"{}", NOW)
        );
    }

    #[test]
    fn test_own_signature_verifies() {
        let header = key().header_value(br#"{"a":1}"#, NOW);
        assert!(key().verify(&header, br#"{"a":1}"#, NOW + 10));
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let header = key().header_value(br#"{"userEmail":"ada@example.com"}"#, NOW);
        assert!(!key().verify(&header, br#"{"userEmail":"eve@example.com"}"#, NOW));
    }

    #[test]
    fn test_other_key_is_rejected() {
        let header = SigningKey::new("signkey-test-ffff")
            .unwrap()
            .header_value(b"{}", NOW);
        assert!(!key().verify(&header, b"{}", NOW));
    }

    #[test]
    fn test_stale_signature_is_rejected() {
        let header = key().header_value(b"{}", NOW);
        assert!(!key().verify(&header, b"{}", NOW + MAX_SKEW_SECS + 1));
    }

    #[test]
    fn test_malformed_header_is_rejected() {
        assert!(!key().verify("", b"{}", NOW));
        assert!(!key().verify("t=abc&s=00", b"{}", NOW));
        assert!(!key().verify(&format!("t={NOW}&s=not-hex"), b"{}", NOW));
    }
}
