//! Control-plane clients
//!
//! One trait per LiveKit service. Handlers only see the traits, so tests and
//! alternative transports can stand in for the Twirp clients.

pub mod egress;
pub mod ingress;
pub mod room;
pub mod twirp;

use std::sync::Arc;

use serde::{Deserialize, Deserializer};

pub use egress::{EgressService, TwirpEgressService};
pub use ingress::{IngressService, TwirpIngressService};
pub use room::{RoomService, TwirpRoomService};
pub use twirp::TwirpClient;

use crate::Result;
use crate::config::GatewayConfig;
use crate::token::AccessTokenIssuer;

/// Room as reported by the media server
pub type Room = serde_json::Value;

/// Participant as reported by the media server
pub type Participant = serde_json::Value;

/// Published track as reported by the media server
pub type Track = serde_json::Value;

/// Egress job as reported by the media server
pub type EgressInfo = serde_json::Value;

/// Ingress endpoint as reported by the media server
pub type IngressInfo = serde_json::Value;

/// Service clients shared by all request handlers
#[derive(Clone)]
pub struct LiveKitServices {
    pub rooms: Arc<dyn RoomService>,
    pub egress: Arc<dyn EgressService>,
    pub ingress: Arc<dyn IngressService>,
}

impl LiveKitServices {
    /// Build Twirp clients for the configured media server
    pub fn connect(config: &GatewayConfig, issuer: Arc<AccessTokenIssuer>) -> Result<Self> {
        let client = Arc::new(TwirpClient::new(
            &config.control_plane_url(),
            issuer,
            config.request_timeout(),
        )?);

        Ok(Self {
            rooms: Arc::new(TwirpRoomService::new(client.clone())),
            egress: Arc::new(TwirpEgressService::new(client.clone())),
            ingress: Arc::new(TwirpIngressService::new(client)),
        })
    }
}

/// Repeated fields may be omitted or null on the wire; both mean empty
pub(crate) fn empty_if_null<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
