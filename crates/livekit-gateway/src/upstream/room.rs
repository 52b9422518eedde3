//! Room and participant management (`livekit.RoomService`)

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::twirp::TwirpClient;
use super::{Participant, Room, Track, empty_if_null};
use crate::error::UpstreamError;
use crate::token::VideoGrants;

const SERVICE: &str = "RoomService";

/// Topic attached to data messages broadcast through the gateway
pub const CHAT_TOPIC: &str = "chat";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
}

/// Empty `names` lists every room
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListRoomsRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

impl ListRoomsRequest {
    /// Filter on a single room; an empty name means no filter
    pub fn named(name: Option<&str>) -> Self {
        Self {
            names: name
                .filter(|name| !name.is_empty())
                .map(|name| vec![name.to_string()])
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRoomMetadataRequest {
    pub room: String,
    pub metadata: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataPacketKind {
    Reliable,
    Lossy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendDataRequest {
    pub room: String,
    /// Base64 payload
    pub data: String,
    pub kind: DataPacketKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Empty means every participant
    #[serde(default)]
    pub destination_identities: Vec<String>,
}

impl SendDataRequest {
    /// Reliable broadcast of a JSON payload on the chat topic
    pub fn reliable_chat(room: impl Into<String>, payload: &Value) -> Result<Self, UpstreamError> {
        let encoded = serde_json::to_vec(payload).map_err(|e| UpstreamError::Encode {
            method: "SendData",
            detail: e.to_string(),
        })?;

        Ok(Self {
            room: room.into(),
            data: STANDARD.encode(encoded),
            kind: DataPacketKind::Reliable,
            topic: Some(CHAT_TOPIC.to_string()),
            destination_identities: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRoomRequest {
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListParticipantsRequest {
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomParticipantIdentity {
    pub room: String,
    pub identity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantPermission {
    pub can_subscribe: bool,
    pub can_publish: bool,
    pub can_publish_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateParticipantRequest {
    pub room: String,
    pub identity: String,
    pub metadata: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<ParticipantPermission>,
}

impl UpdateParticipantRequest {
    /// Metadata update that also pins the participant to subscribe-only
    pub fn subscribe_only(
        room: impl Into<String>,
        identity: impl Into<String>,
        metadata: impl Into<String>,
    ) -> Self {
        Self {
            room: room.into(),
            identity: identity.into(),
            metadata: metadata.into(),
            permission: Some(ParticipantPermission {
                can_subscribe: true,
                can_publish: false,
                can_publish_data: false,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuteRoomTrackRequest {
    pub room: String,
    pub identity: String,
    pub track_sid: String,
    pub muted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSubscriptionsRequest {
    pub room: String,
    pub identity: String,
    pub track_sids: Vec<String>,
    pub subscribe: bool,
}

#[derive(Debug, Deserialize)]
struct ListRoomsResponse {
    #[serde(default, deserialize_with = "empty_if_null")]
    rooms: Vec<Room>,
}

#[derive(Debug, Deserialize)]
struct ListParticipantsResponse {
    #[serde(default, deserialize_with = "empty_if_null")]
    participants: Vec<Participant>,
}

#[derive(Debug, Deserialize)]
struct MuteRoomTrackResponse {
    #[serde(default)]
    track: Track,
}

/// Room and participant operations of the control plane
#[async_trait]
pub trait RoomService: Send + Sync {
    async fn create_room(&self, request: CreateRoomRequest) -> Result<Room, UpstreamError>;

    async fn list_rooms(&self, request: ListRoomsRequest) -> Result<Vec<Room>, UpstreamError>;

    async fn update_room_metadata(
        &self,
        request: UpdateRoomMetadataRequest,
    ) -> Result<Room, UpstreamError>;

    async fn send_data(&self, request: SendDataRequest) -> Result<(), UpstreamError>;

    async fn delete_room(&self, request: DeleteRoomRequest) -> Result<(), UpstreamError>;

    async fn list_participants(
        &self,
        request: ListParticipantsRequest,
    ) -> Result<Vec<Participant>, UpstreamError>;

    async fn get_participant(
        &self,
        request: RoomParticipantIdentity,
    ) -> Result<Participant, UpstreamError>;

    async fn update_participant(
        &self,
        request: UpdateParticipantRequest,
    ) -> Result<Participant, UpstreamError>;

    async fn remove_participant(
        &self,
        request: RoomParticipantIdentity,
    ) -> Result<(), UpstreamError>;

    async fn mute_published_track(
        &self,
        request: MuteRoomTrackRequest,
    ) -> Result<Track, UpstreamError>;

    async fn update_subscriptions(
        &self,
        request: UpdateSubscriptionsRequest,
    ) -> Result<(), UpstreamError>;
}

/// [`RoomService`] backed by the Twirp API
#[derive(Debug, Clone)]
pub struct TwirpRoomService {
    client: Arc<TwirpClient>,
}

impl TwirpRoomService {
    pub fn new(client: Arc<TwirpClient>) -> Self {
        Self { client }
    }
}

fn room_admin(room: &str) -> VideoGrants {
    VideoGrants {
        room_admin: true,
        room: room.to_string(),
        ..Default::default()
    }
}

fn room_create() -> VideoGrants {
    VideoGrants {
        room_create: true,
        ..Default::default()
    }
}

#[async_trait]
impl RoomService for TwirpRoomService {
    async fn create_room(&self, request: CreateRoomRequest) -> Result<Room, UpstreamError> {
        self.client
            .call(SERVICE, "CreateRoom", &request, room_create())
            .await
    }

    async fn list_rooms(&self, request: ListRoomsRequest) -> Result<Vec<Room>, UpstreamError> {
        let grants = VideoGrants {
            room_list: true,
            ..Default::default()
        };
        let response: ListRoomsResponse =
            self.client.call(SERVICE, "ListRooms", &request, grants).await?;
        Ok(response.rooms)
    }

    async fn update_room_metadata(
        &self,
        request: UpdateRoomMetadataRequest,
    ) -> Result<Room, UpstreamError> {
        let grants = room_admin(&request.room);
        self.client
            .call(SERVICE, "UpdateRoomMetadata", &request, grants)
            .await
    }

    async fn send_data(&self, request: SendDataRequest) -> Result<(), UpstreamError> {
        let grants = room_admin(&request.room);
        let _: Value = self.client.call(SERVICE, "SendData", &request, grants).await?;
        Ok(())
    }

    async fn delete_room(&self, request: DeleteRoomRequest) -> Result<(), UpstreamError> {
        let _: Value = self
            .client
            .call(SERVICE, "DeleteRoom", &request, room_create())
            .await?;
        Ok(())
    }

    async fn list_participants(
        &self,
        request: ListParticipantsRequest,
    ) -> Result<Vec<Participant>, UpstreamError> {
        let grants = room_admin(&request.room);
        let response: ListParticipantsResponse = self
            .client
            .call(SERVICE, "ListParticipants", &request, grants)
            .await?;
        Ok(response.participants)
    }

    async fn get_participant(
        &self,
        request: RoomParticipantIdentity,
    ) -> Result<Participant, UpstreamError> {
        let grants = room_admin(&request.room);
        self.client
            .call(SERVICE, "GetParticipant", &request, grants)
            .await
    }

    async fn update_participant(
        &self,
        request: UpdateParticipantRequest,
    ) -> Result<Participant, UpstreamError> {
        let grants = room_admin(&request.room);
        self.client
            .call(SERVICE, "UpdateParticipant", &request, grants)
            .await
    }

    async fn remove_participant(
        &self,
        request: RoomParticipantIdentity,
    ) -> Result<(), UpstreamError> {
        let grants = room_admin(&request.room);
        let _: Value = self
            .client
            .call(SERVICE, "RemoveParticipant", &request, grants)
            .await?;
        Ok(())
    }

    async fn mute_published_track(
        &self,
        request: MuteRoomTrackRequest,
    ) -> Result<Track, UpstreamError> {
        let grants = room_admin(&request.room);
        let response: MuteRoomTrackResponse = self
            .client
            .call(SERVICE, "MutePublishedTrack", &request, grants)
            .await?;
        Ok(response.track)
    }

    async fn update_subscriptions(
        &self,
        request: UpdateSubscriptionsRequest,
    ) -> Result<(), UpstreamError> {
        let grants = room_admin(&request.room);
        let _: Value = self
            .client
            .call(SERVICE, "UpdateSubscriptions", &request, grants)
            .await?;
        Ok(())
    }
}
