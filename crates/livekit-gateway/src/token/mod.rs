//! Access token issuance and verification
//!
//! LiveKit credentials are HS256 JWTs signed with the API secret. The issuer
//! (`iss`) is the API key and permissions travel in the `video` claim.

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;
use crate::error::TokenError;

/// Default lifetime of join tokens
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Lifetime of the credentials attached to control-plane calls
pub const SERVICE_TOKEN_TTL: Duration = Duration::from_secs(10 * 60);

/// Room permissions carried in the `video` claim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrants {
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_create: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_list: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_record: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_admin: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_join: bool,
    /// Room the grant is scoped to
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub room: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ingress_admin: bool,

    // Left unset, the media server applies its defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_publish: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_subscribe: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_publish_data: Option<bool>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl VideoGrants {
    /// Permission to join one room, nothing else
    pub fn join(room: impl Into<String>) -> Self {
        Self {
            room_join: true,
            room: room.into(),
            ..Default::default()
        }
    }
}

/// JWT claims understood by LiveKit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub iss: String,
    /// Participant identity
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub: String,
    /// Display name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub nbf: u64,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jti: String,
    #[serde(default)]
    pub video: VideoGrants,
    /// Base64 SHA-256 of a signed body (webhooks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Signs and verifies access tokens with the shared API secret
pub struct AccessTokenIssuer {
    api_key: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    ttl: Duration,
}

impl AccessTokenIssuer {
    pub fn new(api_key: impl Into<String>, api_secret: &str, ttl: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            encoding_key: EncodingKey::from_secret(api_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(api_secret.as_bytes()),
            header: Header::new(Algorithm::HS256),
            ttl,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.livekit_api_key.clone(),
            &config.livekit_api_secret,
            config.token_ttl(),
        )
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Issue a token that lets `identity` join `room`
    ///
    /// Only `roomJoin` and `room` are granted; publish and subscribe
    /// permissions are left to the media server's defaults.
    pub fn issue_join_token(&self, room: &str, identity: &str) -> Result<String, TokenError> {
        if identity.is_empty() {
            return Err(TokenError::MissingIdentity);
        }
        self.sign(identity, VideoGrants::join(room), self.ttl)
    }

    /// Issue the short-lived credential for one control-plane call
    pub fn issue_service_token(&self, grants: VideoGrants) -> Result<String, TokenError> {
        self.sign("", grants, SERVICE_TOKEN_TTL)
    }

    /// Verify signature, issuer and validity window
    pub fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.api_key]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }

    fn sign(&self, identity: &str, grants: VideoGrants, ttl: Duration) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;

        let claims = AccessClaims {
            iss: self.api_key.clone(),
            sub: identity.to_string(),
            name: identity.to_string(),
            nbf: now,
            exp: now + ttl.as_secs(),
            jti: identity.to_string(),
            video: grants,
            sha256: None,
        };

        encode(&self.header, &claims, &self.encoding_key).map_err(TokenError::Signing)
    }
}

impl std::fmt::Debug for AccessTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenIssuer")
            .field("api_key", &self.api_key)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
