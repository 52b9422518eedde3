//! Error types for the gateway

use thiserror::Error;

/// Gateway errors raised outside of request handling (startup, wiring)
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration source errors
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    /// Token errors
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Control-plane errors
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new Config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Access token errors
#[derive(Error, Debug)]
pub enum TokenError {
    /// Signing failed
    #[error("Failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Signature, issuer or validity window rejected
    #[error("Invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    /// Join tokens must name a participant
    #[error("Participant identity is required")]
    MissingIdentity,
}

/// Webhook verification errors
#[derive(Error, Debug)]
pub enum WebhookError {
    /// No Authorization header on the request
    #[error("Authorization header is missing")]
    MissingAuthorization,

    /// The signed token did not verify
    #[error("Invalid webhook token: {0}")]
    Token(#[from] TokenError),

    /// The signed token carries no body digest
    #[error("Webhook token carries no body digest")]
    MissingDigest,

    /// The body does not match the signed digest
    #[error("Webhook body digest mismatch")]
    DigestMismatch,

    /// The body is not a webhook event
    #[error("Malformed webhook payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Errors from control-plane calls
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Connection or protocol failure
    #[error("Request to {method} failed: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// No answer within the configured timeout
    #[error("Request to {0} timed out")]
    Timeout(&'static str),

    /// Twirp error body returned by the media server
    #[error("{method} returned {status} ({code}): {msg}")]
    Twirp {
        method: &'static str,
        status: u16,
        code: String,
        msg: String,
    },

    /// Success status but the body could not be decoded
    #[error("Undecodable response from {method}: {detail}")]
    Decode { method: &'static str, detail: String },

    /// The service credential could not be created
    #[error("Failed to authorize upstream call: {0}")]
    Auth(#[from] TokenError),

    /// The request could not be encoded
    #[error("Failed to encode request for {method}: {detail}")]
    Encode { method: &'static str, detail: String },
}

impl UpstreamError {
    /// Classify a reqwest failure for the given method
    pub(crate) fn from_reqwest(method: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout(method)
        } else if source.is_decode() {
            Self::Decode {
                method,
                detail: source.to_string(),
            }
        } else {
            Self::Transport { method, source }
        }
    }
}
