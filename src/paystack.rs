//! Paystack REST client.
//!
//! Covers the two calls checkout and wallet top-up need
//! (`/transaction/initialize` and `/transaction/verify/{reference}`) plus
//! verification of the `x-paystack-signature` webhook header, which is the
//! hex HMAC-SHA512 of the raw request body keyed with the secret key.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use thiserror::Error;

use crate::config::PaystackConfig;

type HmacSha512 = Hmac<Sha512>;

#[derive(Debug, Error)]
pub enum PaystackError {
    #[error("PAYSTACK_SECRET_KEY is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid secret key format")]
    InvalidKey,
}

/// Envelope every Paystack endpoint answers with.
#[derive(Debug, Deserialize)]
pub struct PaystackEnvelope<T> {
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
pub struct InitializeTransaction<'a> {
    pub email: &'a str,
    /// Minor units (kobo).
    pub amount: i64,
    pub reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<&'a str>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransactionData {
    pub reference: String,
    pub status: String,
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub gateway_response: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

impl TransactionData {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: TransactionData,
}

#[derive(Clone)]
pub struct PaystackClient {
    inner: Arc<PaystackClientInner>,
}

struct PaystackClientInner {
    client: reqwest::Client,
    base_url: String,
    secret_key: Option<String>,
    callback_url: Option<String>,
}

impl PaystackClient {
    /// Build the client. A missing secret key is allowed so the API can boot
    /// without payments; calls then fail with [`PaystackError::NotConfigured`].
    pub fn new(config: &PaystackConfig) -> Result<Self, PaystackError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.secret_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| PaystackError::InvalidKey)?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(20))
            .build()?;

        Ok(Self {
            inner: Arc::new(PaystackClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                secret_key: config.secret_key.clone(),
                callback_url: config.callback_url.clone(),
            }),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.inner.secret_key.is_some()
    }

    pub fn callback_url(&self) -> Option<&str> {
        self.inner.callback_url.as_deref()
    }

    pub async fn initialize(
        &self,
        request: &InitializeTransaction<'_>,
    ) -> Result<InitializedTransaction, PaystackError> {
        self.ensure_configured()?;
        let url = format!("{}/transaction/initialize", self.inner.base_url);
        let response = self.inner.client.post(&url).json(request).send().await?;
        self.handle_response(response).await
    }

    pub async fn verify(&self, reference: &str) -> Result<TransactionData, PaystackError> {
        self.ensure_configured()?;
        let url = format!("{}/transaction/verify/{}", self.inner.base_url, reference);
        let response = self.inner.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// Check a webhook body against its `x-paystack-signature` header.
    pub fn verify_signature(&self, body: &[u8], signature: &str) -> bool {
        match &self.inner.secret_key {
            Some(key) => verify_signature(key, body, signature),
            None => false,
        }
    }

    fn ensure_configured(&self) -> Result<(), PaystackError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(PaystackError::NotConfigured)
        }
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, PaystackError> {
        let status = response.status();
        let envelope: PaystackEnvelope<T> = match response.json().await {
            Ok(envelope) => envelope,
            Err(err) if status.is_success() => return Err(err.into()),
            Err(_) => {
                return Err(PaystackError::Api {
                    status: status.as_u16(),
                    message: status.canonical_reason().unwrap_or("unknown").to_string(),
                });
            }
        };

        match envelope.data {
            Some(data) if status.is_success() && envelope.status => Ok(data),
            _ => Err(PaystackError::Api {
                status: status.as_u16(),
                message: envelope.message,
            }),
        }
    }
}

pub fn sign(secret_key: &str, body: &[u8]) -> String {
    let Ok(mut mac) = HmacSha512::new_from_slice(secret_key.as_bytes()) else {
        return String::new();
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

pub fn verify_signature(secret_key: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret_key.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Whether a key looks like a Paystack secret key.
pub fn key_mode(secret_key: &str) -> Option<&'static str> {
    if secret_key.starts_with("sk_test_") {
        Some("test")
    } else if secret_key.starts_with("sk_live_") {
        Some("live")
    } else {
        None
    }
}

pub fn new_reference() -> String {
    format!("PSK-{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trip_and_tamper() {
        let body = br#"{"event":"charge.success","data":{"reference":"PSK-1","status":"success","amount":5000}}"#;
        let signature = sign("sk_test_secret", body);
        assert!(verify_signature("sk_test_secret", body, &signature));
        assert!(!verify_signature("sk_test_other", body, &signature));
        assert!(!verify_signature("sk_test_secret", b"{}", &signature));
        assert!(!verify_signature("sk_test_secret", body, "not-hex"));
    }

    #[test]
    fn key_modes() {
        assert_eq!(key_mode("sk_test_abc"), Some("test"));
        assert_eq!(key_mode("sk_live_abc"), Some("live"));
        assert_eq!(key_mode("pk_test_abc"), None);
    }

    #[test]
    fn webhook_event_parses_gateway_payload() {
        let raw = r#"{
            "event": "charge.success",
            "data": {
                "id": 302961,
                "reference": "PSK-abc",
                "status": "success",
                "amount": 1500000,
                "currency": "NGN",
                "channel": "card",
                "gateway_response": "Approved"
            }
        }"#;
        let event: WebhookEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.event, "charge.success");
        assert!(event.data.is_success());
        assert_eq!(event.data.amount, 1_500_000);
    }

    #[test]
    fn references_are_prefixed_and_unique() {
        let a = new_reference();
        let b = new_reference();
        assert!(a.starts_with("PSK-"));
        assert_ne!(a, b);
    }

    #[test]
    fn unconfigured_client_rejects_signatures() {
        let client = PaystackClient::new(&PaystackConfig {
            secret_key: None,
            base_url: "http://localhost".into(),
            callback_url: None,
        })
        .unwrap();
        assert!(!client.is_configured());
        assert!(!client.verify_signature(b"{}", &sign("x", b"{}")));
    }
}
