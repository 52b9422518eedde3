//! Room and participant routes

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use validator::Validate;

use super::{ApiError, AppState, QueryParams, RequiredFields, ValidJson};
use crate::upstream::room::{
    CreateRoomRequest, DeleteRoomRequest, ListParticipantsRequest, ListRoomsRequest,
    MuteRoomTrackRequest, RoomParticipantIdentity, SendDataRequest, UpdateParticipantRequest,
    UpdateRoomMetadataRequest, UpdateSubscriptionsRequest,
};

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomBody {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub room_name: String,
}

impl RequiredFields for CreateRoomBody {
    const MESSAGE: &'static str = "'roomName' is required";
}

#[derive(Debug, Deserialize, Validate)]
pub struct MetadataBody {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub metadata: String,
}

impl RequiredFields for MetadataBody {
    const MESSAGE: &'static str = "'metadata' is required";
}

/// Arbitrary JSON payload; only an absent `data` is missing, a `null`
/// literal is sent as is
#[derive(Debug, Deserialize, Validate)]
pub struct SendDataBody {
    #[serde(default, deserialize_with = "present")]
    #[validate(required)]
    pub data: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl RequiredFields for SendDataBody {
    const MESSAGE: &'static str = "'data' is required";
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MuteTrackBody {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub track_id: String,
}

impl RequiredFields for MuteTrackBody {
    const MESSAGE: &'static str = "'trackId' is required";
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrackIdsBody {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub track_ids: Vec<String>,
}

impl RequiredFields for TrackIdsBody {
    const MESSAGE: &'static str = "'trackIds' is required and must be an array";
}

/// `POST /rooms`
pub async fn create_room(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CreateRoomBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let room = state
        .rooms
        .create_room(CreateRoomRequest {
            name: body.room_name,
        })
        .await
        .map_err(ApiError::upstream("Error creating room"))?;

    Ok((StatusCode::CREATED, Json(json!({ "room": room }))))
}

/// `GET /rooms`
pub async fn list_rooms(
    State(state): State<AppState>,
    params: QueryParams,
) -> ApiResult<Json<Value>> {
    let rooms = state
        .rooms
        .list_rooms(ListRoomsRequest::named(params.get("roomName")))
        .await
        .map_err(ApiError::upstream("Error listing rooms"))?;

    Ok(Json(json!({ "rooms": rooms })))
}

/// `POST /rooms/{room_name}/metadata`
pub async fn update_room_metadata(
    State(state): State<AppState>,
    Path(room_name): Path<String>,
    ValidJson(body): ValidJson<MetadataBody>,
) -> ApiResult<Json<Value>> {
    let room = state
        .rooms
        .update_room_metadata(UpdateRoomMetadataRequest {
            room: room_name,
            metadata: body.metadata,
        })
        .await
        .map_err(ApiError::upstream("Error updating room metadata"))?;

    Ok(Json(json!({ "room": room })))
}

/// `POST /rooms/{room_name}/send-data`
pub async fn send_data(
    State(state): State<AppState>,
    Path(room_name): Path<String>,
    ValidJson(body): ValidJson<SendDataBody>,
) -> ApiResult<Json<Value>> {
    let payload = body.data.unwrap_or_default();
    let request =
        SendDataRequest::reliable_chat(room_name, &payload).map_err(|e| ApiError::Internal {
            message: "Error encoding data message",
            detail: e.to_string(),
        })?;

    state
        .rooms
        .send_data(request)
        .await
        .map_err(ApiError::upstream("Error sending data message"))?;

    Ok(Json(json!({ "message": "Data message sent" })))
}

/// `DELETE /rooms/{room_name}`
pub async fn delete_room(
    State(state): State<AppState>,
    Path(room_name): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .rooms
        .delete_room(DeleteRoomRequest { room: room_name })
        .await
        .map_err(ApiError::upstream("Error deleting room"))?;

    Ok(Json(json!({ "message": "Room deleted" })))
}

/// `GET /rooms/{room_name}/participants`
pub async fn list_participants(
    State(state): State<AppState>,
    Path(room_name): Path<String>,
) -> ApiResult<Json<Value>> {
    let participants = state
        .rooms
        .list_participants(ListParticipantsRequest { room: room_name })
        .await
        .map_err(ApiError::upstream("Error listing participants"))?;

    Ok(Json(json!({ "participants": participants })))
}

pub async fn get_participant(
    State(state): State<AppState>,
    Path((room, identity)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let participant = state
        .rooms
        .get_participant(RoomParticipantIdentity { room, identity })
        .await
        .map_err(ApiError::upstream("Error getting participant"))?;

    Ok(Json(json!({ "participant": participant })))
}

/// Metadata update; the participant is also demoted to subscribe-only
pub async fn update_participant(
    State(state): State<AppState>,
    Path((room, identity)): Path<(String, String)>,
    ValidJson(body): ValidJson<MetadataBody>,
) -> ApiResult<Json<Value>> {
    let participant = state
        .rooms
        .update_participant(UpdateParticipantRequest::subscribe_only(
            room,
            identity,
            body.metadata,
        ))
        .await
        .map_err(ApiError::upstream("Error updating participant"))?;

    Ok(Json(json!({ "participant": participant })))
}

pub async fn remove_participant(
    State(state): State<AppState>,
    Path((room, identity)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    state
        .rooms
        .remove_participant(RoomParticipantIdentity { room, identity })
        .await
        .map_err(ApiError::upstream("Error removing participant"))?;

    Ok(Json(json!({ "message": "Participant removed" })))
}

pub async fn mute_track(
    State(state): State<AppState>,
    Path((room, identity)): Path<(String, String)>,
    ValidJson(body): ValidJson<MuteTrackBody>,
) -> ApiResult<Json<Value>> {
    let track = state
        .rooms
        .mute_published_track(MuteRoomTrackRequest {
            room,
            identity,
            track_sid: body.track_id,
            muted: true,
        })
        .await
        .map_err(ApiError::upstream("Error muting track"))?;

    Ok(Json(json!({ "track": track })))
}

pub async fn subscribe(
    State(state): State<AppState>,
    Path((room, identity)): Path<(String, String)>,
    ValidJson(body): ValidJson<TrackIdsBody>,
) -> ApiResult<Json<Value>> {
    update_subscriptions(&state, room, identity, body.track_ids, true)
        .await
        .map_err(ApiError::upstream("Error subscribing participant to tracks"))?;

    Ok(Json(json!({ "message": "Participant subscribed to tracks" })))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    Path((room, identity)): Path<(String, String)>,
    ValidJson(body): ValidJson<TrackIdsBody>,
) -> ApiResult<Json<Value>> {
    update_subscriptions(&state, room, identity, body.track_ids, false)
        .await
        .map_err(ApiError::upstream("Error unsubscribing participant from tracks"))?;

    Ok(Json(json!({ "message": "Participant unsubscribed from tracks" })))
}

async fn update_subscriptions(
    state: &AppState,
    room: String,
    identity: String,
    track_sids: Vec<String>,
    subscribe: bool,
) -> Result<(), crate::error::UpstreamError> {
    state
        .rooms
        .update_subscriptions(UpdateSubscriptionsRequest {
            room,
            identity,
            track_sids,
            subscribe,
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_track_ids_fail_validation() {
        let body: TrackIdsBody = serde_json::from_str(r#"{"trackIds": []}"#).unwrap();
        assert!(body.validate().is_err());

        let body: TrackIdsBody = serde_json::from_str("{}").unwrap();
        assert!(body.validate().is_err());

        let body: TrackIdsBody = serde_json::from_str(r#"{"trackIds": ["TR_1"]}"#).unwrap();
        assert!(body.validate().is_ok());
    }

    #[test]
    fn test_only_absent_data_is_missing() {
        let body: SendDataBody = serde_json::from_str("{}").unwrap();
        assert!(body.validate().is_err());

        let body: SendDataBody = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(body.validate().is_ok());
        assert_eq!(body.data, Some(Value::Null));

        let body: SendDataBody = serde_json::from_str(r#"{"data": {"text": "hi"}}"#).unwrap();
        assert!(body.validate().is_ok());
    }
}
