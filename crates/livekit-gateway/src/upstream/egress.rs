//! Recording and stream-out jobs (`livekit.Egress`)

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::twirp::TwirpClient;
use super::{EgressInfo, empty_if_null};
use crate::error::UpstreamError;
use crate::token::VideoGrants;

const SERVICE: &str = "Egress";

/// Layout used for composite recordings and streams
pub const DEFAULT_LAYOUT: &str = "grid";

/// Output file patterns, expanded by the egress service
pub const ROOM_COMPOSITE_FILEPATH: &str = "{room_name}-{room_id}-{time}";
pub const PARTICIPANT_FILEPATH: &str = "{room_name}-{room_id}-{publisher_identity}-{time}";
pub const TRACK_FILEPATH: &str =
    "{room_name}-{room_id}-{publisher_identity}-{track_source}-{track_id}-{time}";
pub const WEB_FILEPATH: &str = "{time}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncodedFileType {
    Mp4,
    Ogg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamProtocol {
    Rtmp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedFileOutput {
    pub file_type: EncodedFileType,
    pub filepath: String,
}

impl EncodedFileOutput {
    pub fn mp4(filepath: &str) -> Self {
        Self {
            file_type: EncodedFileType::Mp4,
            filepath: filepath.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamOutput {
    pub protocol: StreamProtocol,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectFileOutput {
    pub filepath: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomCompositeEgressRequest {
    pub room_name: String,
    pub layout: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_outputs: Vec<EncodedFileOutput>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stream_outputs: Vec<StreamOutput>,
}

impl RoomCompositeEgressRequest {
    /// Grid composite of the whole room recorded to MP4
    pub fn recording(room_name: impl Into<String>) -> Self {
        Self {
            room_name: room_name.into(),
            layout: DEFAULT_LAYOUT.to_string(),
            file_outputs: vec![EncodedFileOutput::mp4(ROOM_COMPOSITE_FILEPATH)],
            stream_outputs: Vec::new(),
        }
    }

    /// Grid composite of the whole room pushed to an RTMP endpoint
    pub fn rtmp_stream(room_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            room_name: room_name.into(),
            layout: DEFAULT_LAYOUT.to_string(),
            file_outputs: Vec::new(),
            stream_outputs: vec![StreamOutput {
                protocol: StreamProtocol::Rtmp,
                urls: vec![url.into()],
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantEgressRequest {
    pub room_name: String,
    pub identity: String,
    pub file_outputs: Vec<EncodedFileOutput>,
}

impl ParticipantEgressRequest {
    pub fn recording(room_name: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            room_name: room_name.into(),
            identity: identity.into(),
            file_outputs: vec![EncodedFileOutput::mp4(PARTICIPANT_FILEPATH)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackCompositeEgressRequest {
    pub room_name: String,
    pub video_track_id: String,
    pub audio_track_id: String,
    pub file_outputs: Vec<EncodedFileOutput>,
}

impl TrackCompositeEgressRequest {
    pub fn recording(
        room_name: impl Into<String>,
        video_track_id: impl Into<String>,
        audio_track_id: impl Into<String>,
    ) -> Self {
        Self {
            room_name: room_name.into(),
            video_track_id: video_track_id.into(),
            audio_track_id: audio_track_id.into(),
            file_outputs: vec![EncodedFileOutput::mp4(PARTICIPANT_FILEPATH)],
        }
    }
}

/// Single track written as-is, without transcoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEgressRequest {
    pub room_name: String,
    pub track_id: String,
    pub file: DirectFileOutput,
}

impl TrackEgressRequest {
    pub fn direct_file(room_name: impl Into<String>, track_id: impl Into<String>) -> Self {
        Self {
            room_name: room_name.into(),
            track_id: track_id.into(),
            file: DirectFileOutput {
                filepath: TRACK_FILEPATH.to_string(),
            },
        }
    }
}

/// Headless-browser capture of an arbitrary page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebEgressRequest {
    pub url: String,
    pub file_outputs: Vec<EncodedFileOutput>,
}

impl WebEgressRequest {
    pub fn recording(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_outputs: vec![EncodedFileOutput::mp4(WEB_FILEPATH)],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListEgressRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub room_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub egress_id: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateLayoutRequest {
    pub egress_id: String,
    pub layout: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStreamRequest {
    pub egress_id: String,
    #[serde(default)]
    pub add_output_urls: Vec<String>,
    #[serde(default)]
    pub remove_output_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopEgressRequest {
    pub egress_id: String,
}

#[derive(Debug, Deserialize)]
struct ListEgressResponse {
    #[serde(default, deserialize_with = "empty_if_null")]
    items: Vec<EgressInfo>,
}

/// Egress operations of the control plane
#[async_trait]
pub trait EgressService: Send + Sync {
    async fn start_room_composite_egress(
        &self,
        request: RoomCompositeEgressRequest,
    ) -> Result<EgressInfo, UpstreamError>;

    async fn start_participant_egress(
        &self,
        request: ParticipantEgressRequest,
    ) -> Result<EgressInfo, UpstreamError>;

    async fn start_track_composite_egress(
        &self,
        request: TrackCompositeEgressRequest,
    ) -> Result<EgressInfo, UpstreamError>;

    async fn start_track_egress(
        &self,
        request: TrackEgressRequest,
    ) -> Result<EgressInfo, UpstreamError>;

    async fn start_web_egress(&self, request: WebEgressRequest)
    -> Result<EgressInfo, UpstreamError>;

    async fn list_egress(&self, request: ListEgressRequest)
    -> Result<Vec<EgressInfo>, UpstreamError>;

    async fn update_layout(&self, request: UpdateLayoutRequest)
    -> Result<EgressInfo, UpstreamError>;

    async fn update_stream(&self, request: UpdateStreamRequest)
    -> Result<EgressInfo, UpstreamError>;

    async fn stop_egress(&self, request: StopEgressRequest) -> Result<EgressInfo, UpstreamError>;
}

/// [`EgressService`] backed by the Twirp API
#[derive(Debug, Clone)]
pub struct TwirpEgressService {
    client: Arc<TwirpClient>,
}

impl TwirpEgressService {
    pub fn new(client: Arc<TwirpClient>) -> Self {
        Self { client }
    }
}

fn room_record() -> VideoGrants {
    VideoGrants {
        room_record: true,
        ..Default::default()
    }
}

#[async_trait]
impl EgressService for TwirpEgressService {
    async fn start_room_composite_egress(
        &self,
        request: RoomCompositeEgressRequest,
    ) -> Result<EgressInfo, UpstreamError> {
        self.client
            .call(SERVICE, "StartRoomCompositeEgress", &request, room_record())
            .await
    }

    async fn start_participant_egress(
        &self,
        request: ParticipantEgressRequest,
    ) -> Result<EgressInfo, UpstreamError> {
        self.client
            .call(SERVICE, "StartParticipantEgress", &request, room_record())
            .await
    }

    async fn start_track_composite_egress(
        &self,
        request: TrackCompositeEgressRequest,
    ) -> Result<EgressInfo, UpstreamError> {
        self.client
            .call(SERVICE, "StartTrackCompositeEgress", &request, room_record())
            .await
    }

    async fn start_track_egress(
        &self,
        request: TrackEgressRequest,
    ) -> Result<EgressInfo, UpstreamError> {
        self.client
            .call(SERVICE, "StartTrackEgress", &request, room_record())
            .await
    }

    async fn start_web_egress(
        &self,
        request: WebEgressRequest,
    ) -> Result<EgressInfo, UpstreamError> {
        self.client
            .call(SERVICE, "StartWebEgress", &request, room_record())
            .await
    }

    async fn list_egress(
        &self,
        request: ListEgressRequest,
    ) -> Result<Vec<EgressInfo>, UpstreamError> {
        let response: ListEgressResponse = self
            .client
            .call(SERVICE, "ListEgress", &request, room_record())
            .await?;
        Ok(response.items)
    }

    async fn update_layout(
        &self,
        request: UpdateLayoutRequest,
    ) -> Result<EgressInfo, UpstreamError> {
        self.client
            .call(SERVICE, "UpdateLayout", &request, room_record())
            .await
    }

    async fn update_stream(
        &self,
        request: UpdateStreamRequest,
    ) -> Result<EgressInfo, UpstreamError> {
        self.client
            .call(SERVICE, "UpdateStream", &request, room_record())
            .await
    }

    async fn stop_egress(&self, request: StopEgressRequest) -> Result<EgressInfo, UpstreamError> {
        self.client
            .call(SERVICE, "StopEgress", &request, room_record())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_room_composite_recording_wire_format() {
        let wire = serde_json::to_value(RoomCompositeEgressRequest::recording("r1")).unwrap();
        assert_eq!(
            wire,
            json!({
                "room_name": "r1",
                "layout": "grid",
                "file_outputs": [{ "file_type": "MP4", "filepath": "{room_name}-{room_id}-{time}" }]
            })
        );
    }

    #[test]
    fn test_stream_egress_targets_rtmp() {
        let wire =
            serde_json::to_value(RoomCompositeEgressRequest::rtmp_stream("r1", "rtmp://x/live"))
                .unwrap();
        assert_eq!(wire["stream_outputs"][0]["protocol"], "RTMP");
        assert_eq!(wire["stream_outputs"][0]["urls"], json!(["rtmp://x/live"]));
        assert!(wire.get("file_outputs").is_none());
    }

    #[test]
    fn test_track_egress_uses_direct_file() {
        let wire = serde_json::to_value(TrackEgressRequest::direct_file("r1", "TR_1")).unwrap();
        assert_eq!(wire["file"]["filepath"], TRACK_FILEPATH);
    }

    #[test]
    fn test_list_filter_omits_unset_fields() {
        assert_eq!(serde_json::to_value(ListEgressRequest::default()).unwrap(), json!({}));
        let active = ListEgressRequest {
            active: true,
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(active).unwrap(), json!({ "active": true }));
    }
}
