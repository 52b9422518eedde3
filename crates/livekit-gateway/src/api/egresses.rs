//! Recording and stream-out routes

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use super::{ApiError, AppState, QueryParams, RequiredFields, ValidJson};
use crate::upstream::egress::{
    ListEgressRequest, ParticipantEgressRequest, RoomCompositeEgressRequest, StopEgressRequest,
    TrackCompositeEgressRequest, TrackEgressRequest, UpdateLayoutRequest, UpdateStreamRequest,
    WebEgressRequest,
};
use crate::upstream::empty_if_null;

type Created = Result<(StatusCode, Json<Value>), ApiError>;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomCompositeBody {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub room_name: String,
}

impl RequiredFields for RoomCompositeBody {
    const MESSAGE: &'static str = "'roomName' is required";
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StreamBody {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub room_name: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub stream_url: String,
}

impl RequiredFields for StreamBody {
    const MESSAGE: &'static str = "'roomName' and 'streamUrl' are required";
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantBody {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub room_name: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub participant_identity: String,
}

impl RequiredFields for ParticipantBody {
    const MESSAGE: &'static str = "'roomName' and 'participantIdentity' are required";
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrackCompositeBody {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub room_name: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub video_track_id: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub audio_track_id: String,
}

impl RequiredFields for TrackCompositeBody {
    const MESSAGE: &'static str = "'roomName', 'videoTrackId' and 'audioTrackId' are required";
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrackBody {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub room_name: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub track_id: String,
}

impl RequiredFields for TrackBody {
    const MESSAGE: &'static str = "'roomName' and 'trackId' are required";
}

#[derive(Debug, Deserialize, Validate)]
pub struct WebBody {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub url: String,
}

impl RequiredFields for WebBody {
    const MESSAGE: &'static str = "'url' is required";
}

#[derive(Debug, Deserialize, Validate)]
pub struct LayoutBody {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub layout: String,
}

impl RequiredFields for LayoutBody {
    const MESSAGE: &'static str = "'layout' is required";
}

/// Both lists may be empty, null or absent; only their type is checked
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StreamsBody {
    #[serde(default, deserialize_with = "empty_if_null")]
    pub stream_urls_to_add: Vec<String>,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub stream_urls_to_remove: Vec<String>,
}

impl RequiredFields for StreamsBody {
    const MESSAGE: &'static str =
        "'streamUrlsToAdd' and 'streamUrlsToRemove' are required and must be arrays";
}

/// `active` filters only on the literal `true`
fn list_filter(params: &QueryParams) -> ListEgressRequest {
    ListEgressRequest {
        room_name: params.get_or_empty("roomName"),
        egress_id: params.get_or_empty("egressId"),
        active: params.get("active") == Some("true"),
    }
}

fn created(egress: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(json!({ "egress": egress })))
}

/// `POST /egresses/room-composite`
pub async fn start_room_composite(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<RoomCompositeBody>,
) -> Created {
    let egress = state
        .egress
        .start_room_composite_egress(RoomCompositeEgressRequest::recording(body.room_name))
        .await
        .map_err(ApiError::upstream("Error creating RoomComposite egress"))?;

    Ok(created(egress))
}

/// `POST /egresses/stream`
pub async fn start_stream(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<StreamBody>,
) -> Created {
    let egress = state
        .egress
        .start_room_composite_egress(RoomCompositeEgressRequest::rtmp_stream(
            body.room_name,
            body.stream_url,
        ))
        .await
        .map_err(ApiError::upstream("Error creating RoomComposite egress"))?;

    Ok(created(egress))
}

/// `POST /egresses/participant`
pub async fn start_participant(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<ParticipantBody>,
) -> Created {
    let egress = state
        .egress
        .start_participant_egress(ParticipantEgressRequest::recording(
            body.room_name,
            body.participant_identity,
        ))
        .await
        .map_err(ApiError::upstream("Error creating Participant egress"))?;

    Ok(created(egress))
}

/// `POST /egresses/track-composite`
pub async fn start_track_composite(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<TrackCompositeBody>,
) -> Created {
    let egress = state
        .egress
        .start_track_composite_egress(TrackCompositeEgressRequest::recording(
            body.room_name,
            body.video_track_id,
            body.audio_track_id,
        ))
        .await
        .map_err(ApiError::upstream("Error creating TrackComposite egress"))?;

    Ok(created(egress))
}

/// `POST /egresses/track`
pub async fn start_track(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<TrackBody>,
) -> Created {
    let egress = state
        .egress
        .start_track_egress(TrackEgressRequest::direct_file(body.room_name, body.track_id))
        .await
        .map_err(ApiError::upstream("Error creating Track egress"))?;

    Ok(created(egress))
}

/// `POST /egresses/web`
pub async fn start_web(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<WebBody>,
) -> Created {
    let egress = state
        .egress
        .start_web_egress(WebEgressRequest::recording(body.url))
        .await
        .map_err(ApiError::upstream("Error creating Web egress"))?;

    Ok(created(egress))
}

/// `GET /egresses`
pub async fn list_egresses(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<Json<Value>, ApiError> {
    let egresses = state
        .egress
        .list_egress(list_filter(&params))
        .await
        .map_err(ApiError::upstream("Error listing egresses"))?;

    Ok(Json(json!({ "egresses": egresses })))
}

pub async fn update_layout(
    State(state): State<AppState>,
    Path(egress_id): Path<String>,
    ValidJson(body): ValidJson<LayoutBody>,
) -> Result<Json<Value>, ApiError> {
    let egress = state
        .egress
        .update_layout(UpdateLayoutRequest {
            egress_id,
            layout: body.layout,
        })
        .await
        .map_err(ApiError::upstream("Error updating egress layout"))?;

    Ok(Json(json!({ "egress": egress })))
}

pub async fn update_streams(
    State(state): State<AppState>,
    Path(egress_id): Path<String>,
    ValidJson(body): ValidJson<StreamsBody>,
) -> Result<Json<Value>, ApiError> {
    let egress = state
        .egress
        .update_stream(UpdateStreamRequest {
            egress_id,
            add_output_urls: body.stream_urls_to_add,
            remove_output_urls: body.stream_urls_to_remove,
        })
        .await
        .map_err(ApiError::upstream("Error updating egress streams"))?;

    Ok(Json(json!({ "egress": egress })))
}

pub async fn stop_egress(
    State(state): State<AppState>,
    Path(egress_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .egress
        .stop_egress(StopEgressRequest { egress_id })
        .await
        .map_err(ApiError::upstream("Error stopping egress"))?;

    Ok(Json(json!({ "message": "Egress stopped" })))
}
