//! Webhook receipt
//!
//! LiveKit signs each webhook with a JWT in the `Authorization` header. The
//! token is issued by the API key, signed with the API secret, and its
//! `sha256` claim holds the base64 SHA-256 digest of the raw body.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::WebhookError;
use crate::token::AccessTokenIssuer;

/// Decoded webhook event
///
/// Nested objects stay opaque; fields this struct does not name are kept
/// in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Event name, e.g. `room_started` or `participant_joined`
    #[serde(default)]
    pub event: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egress_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_info: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Verifies signed webhook deliveries
#[derive(Debug, Clone)]
pub struct WebhookReceiver {
    verifier: Arc<AccessTokenIssuer>,
}

impl WebhookReceiver {
    pub fn new(verifier: Arc<AccessTokenIssuer>) -> Self {
        Self { verifier }
    }

    /// Verify a delivery and decode its event
    ///
    /// `authorization` is the raw header value; both `<jwt>` and
    /// `Bearer <jwt>` are accepted.
    pub fn receive(
        &self,
        body: &[u8],
        authorization: Option<&str>,
    ) -> Result<WebhookEvent, WebhookError> {
        let header = authorization
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(WebhookError::MissingAuthorization)?;
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();

        let claims = self.verifier.verify(token)?;
        let signed_digest = claims.sha256.as_deref().ok_or(WebhookError::MissingDigest)?;

        if body_digest(body) != signed_digest {
            return Err(WebhookError::DigestMismatch);
        }

        Ok(serde_json::from_slice(body)?)
    }
}

/// Base64 SHA-256 of a webhook body, as carried in the `sha256` claim
pub fn body_digest(body: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(body))
}
