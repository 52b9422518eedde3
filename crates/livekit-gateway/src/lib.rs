//! # LiveKit Gateway
//!
//! REST gateway in front of a LiveKit media server's control plane.
//!
//! This crate provides:
//! - Join token issuance for room participants
//! - Webhook receipt with shared-secret signature verification
//! - Room, participant, egress and ingress management over plain JSON/HTTP
//!
//! ## Architecture
//!
//! Every route follows the same path: the body is parsed and checked by the
//! [`api::ValidJson`] extractor, a control-plane request is built, one call is
//! made through an injected service client ([`upstream::RoomService`],
//! [`upstream::EgressService`], [`upstream::IngressService`]) and the result is
//! wrapped under a named JSON key. Upstream failures are logged in full and
//! answered with a generic per-operation message.
//!
//! The gateway owns no state. Rooms, participants and egress/ingress jobs live
//! entirely inside the media server.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod token;
pub mod upstream;
pub mod webhook;

pub use api::{AppState, build_router};
pub use config::{GatewayConfig, LogFormat};
pub use error::{Error, Result};
pub use token::{AccessClaims, AccessTokenIssuer, VideoGrants};
pub use upstream::{EgressService, IngressService, LiveKitServices, RoomService};
pub use webhook::{WebhookEvent, WebhookReceiver};

use std::sync::Arc;

/// Build the gateway router from a validated configuration.
///
/// Creates the token issuer and the control-plane clients once; every
/// request handler shares them through [`AppState`].
pub fn init(config: GatewayConfig) -> Result<axum::Router> {
    let tokens = Arc::new(AccessTokenIssuer::from_config(&config));
    let services = LiveKitServices::connect(&config, tokens.clone())?;
    let state = AppState::new(config, tokens, services);
    Ok(build_router(state))
}
