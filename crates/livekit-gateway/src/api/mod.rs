//! REST API
//!
//! Route handlers share one immutable [`AppState`]; request bodies go through
//! the [`ValidJson`] extractor and failures through [`ApiError`].

pub mod egresses;
pub mod error;
pub mod extract;
pub mod ingresses;
pub mod rooms;
pub mod routes;
pub mod tokens;
pub mod webhooks;

use std::sync::Arc;

pub use error::ApiError;
pub use extract::{QueryParams, RequiredFields, ValidJson};
pub use routes::build_router;

use crate::config::GatewayConfig;
use crate::token::AccessTokenIssuer;
use crate::upstream::{EgressService, IngressService, LiveKitServices, RoomService};
use crate::webhook::WebhookReceiver;

/// State injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub tokens: Arc<AccessTokenIssuer>,
    pub webhooks: Arc<WebhookReceiver>,
    pub rooms: Arc<dyn RoomService>,
    pub egress: Arc<dyn EgressService>,
    pub ingress: Arc<dyn IngressService>,
}

impl AppState {
    pub fn new(
        config: GatewayConfig,
        tokens: Arc<AccessTokenIssuer>,
        services: LiveKitServices,
    ) -> Self {
        Self {
            config: Arc::new(config),
            webhooks: Arc::new(WebhookReceiver::new(tokens.clone())),
            tokens,
            rooms: services.rooms,
            egress: services.egress,
            ingress: services.ingress,
        }
    }
}
