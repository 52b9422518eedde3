//! Media ingestion endpoints (`livekit.Ingress`)

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::twirp::TwirpClient;
use super::{IngressInfo, empty_if_null};
use crate::error::UpstreamError;
use crate::token::VideoGrants;

const SERVICE: &str = "Ingress";

/// Name given to ingresses renamed through the update route
pub const UPDATED_INGRESS_NAME: &str = "updated-ingress";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngressInput {
    RtmpInput,
    WhipInput,
    UrlInput,
}

impl IngressInput {
    /// Name given to ingresses created with this input type
    pub fn default_name(self) -> &'static str {
        match self {
            Self::RtmpInput => "rtmp-ingress",
            Self::WhipInput => "whip-ingress",
            Self::UrlInput => "url-ingress",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIngressRequest {
    pub input_type: IngressInput,
    pub name: String,
    pub room_name: String,
    pub participant_identity: String,
    /// Source to pull from, URL input only
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
}

impl CreateIngressRequest {
    /// Push endpoint (RTMP or WHIP) publishing into a room
    pub fn push(
        input_type: IngressInput,
        room_name: impl Into<String>,
        participant_identity: impl Into<String>,
    ) -> Self {
        Self {
            input_type,
            name: input_type.default_name().to_string(),
            room_name: room_name.into(),
            participant_identity: participant_identity.into(),
            url: String::new(),
        }
    }

    /// Pull ingress fetching media from `url`
    pub fn pull(
        room_name: impl Into<String>,
        participant_identity: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            ..Self::push(IngressInput::UrlInput, room_name, participant_identity)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListIngressRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub room_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ingress_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateIngressRequest {
    pub ingress_id: String,
    pub name: String,
    pub room_name: String,
}

impl UpdateIngressRequest {
    /// Move an ingress to another room
    pub fn retarget(ingress_id: impl Into<String>, room_name: impl Into<String>) -> Self {
        Self {
            ingress_id: ingress_id.into(),
            name: UPDATED_INGRESS_NAME.to_string(),
            room_name: room_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteIngressRequest {
    pub ingress_id: String,
}

#[derive(Debug, Deserialize)]
struct ListIngressResponse {
    #[serde(default, deserialize_with = "empty_if_null")]
    items: Vec<IngressInfo>,
}

/// Ingress operations of the control plane
#[async_trait]
pub trait IngressService: Send + Sync {
    async fn create_ingress(
        &self,
        request: CreateIngressRequest,
    ) -> Result<IngressInfo, UpstreamError>;

    async fn list_ingress(
        &self,
        request: ListIngressRequest,
    ) -> Result<Vec<IngressInfo>, UpstreamError>;

    async fn update_ingress(
        &self,
        request: UpdateIngressRequest,
    ) -> Result<IngressInfo, UpstreamError>;

    async fn delete_ingress(
        &self,
        request: DeleteIngressRequest,
    ) -> Result<IngressInfo, UpstreamError>;
}

/// [`IngressService`] backed by the Twirp API
#[derive(Debug, Clone)]
pub struct TwirpIngressService {
    client: Arc<TwirpClient>,
}

impl TwirpIngressService {
    pub fn new(client: Arc<TwirpClient>) -> Self {
        Self { client }
    }
}

fn ingress_admin() -> VideoGrants {
    VideoGrants {
        ingress_admin: true,
        ..Default::default()
    }
}

#[async_trait]
impl IngressService for TwirpIngressService {
    async fn create_ingress(
        &self,
        request: CreateIngressRequest,
    ) -> Result<IngressInfo, UpstreamError> {
        self.client
            .call(SERVICE, "CreateIngress", &request, ingress_admin())
            .await
    }

    async fn list_ingress(
        &self,
        request: ListIngressRequest,
    ) -> Result<Vec<IngressInfo>, UpstreamError> {
        let response: ListIngressResponse = self
            .client
            .call(SERVICE, "ListIngress", &request, ingress_admin())
            .await?;
        Ok(response.items)
    }

    async fn update_ingress(
        &self,
        request: UpdateIngressRequest,
    ) -> Result<IngressInfo, UpstreamError> {
        self.client
            .call(SERVICE, "UpdateIngress", &request, ingress_admin())
            .await
    }

    async fn delete_ingress(
        &self,
        request: DeleteIngressRequest,
    ) -> Result<IngressInfo, UpstreamError> {
        self.client
            .call(SERVICE, "DeleteIngress", &request, ingress_admin())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_ingress_names() {
        let rtmp = CreateIngressRequest::push(IngressInput::RtmpInput, "r1", "cam");
        let wire = serde_json::to_value(&rtmp).unwrap();
        assert_eq!(
            wire,
            json!({
                "input_type": "RTMP_INPUT",
                "name": "rtmp-ingress",
                "room_name": "r1",
                "participant_identity": "cam"
            })
        );

        let whip = CreateIngressRequest::push(IngressInput::WhipInput, "r1", "cam");
        assert_eq!(whip.name, "whip-ingress");
    }

    #[test]
    fn test_pull_ingress_carries_url() {
        let request = CreateIngressRequest::pull("r1", "cam", "https://example.com/v.mp4");
        assert_eq!(request.input_type, IngressInput::UrlInput);
        assert_eq!(request.name, "url-ingress");
        assert_eq!(request.url, "https://example.com/v.mp4");
    }
}
