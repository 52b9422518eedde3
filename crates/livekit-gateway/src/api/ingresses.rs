//! Media ingestion routes

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use super::egresses::ParticipantBody;
use super::{ApiError, AppState, QueryParams, RequiredFields, ValidJson};
use crate::upstream::ingress::{
    CreateIngressRequest, DeleteIngressRequest, IngressInput, ListIngressRequest,
    UpdateIngressRequest,
};

type Created = Result<(StatusCode, Json<Value>), ApiError>;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UrlIngressBody {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub room_name: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub participant_identity: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub url: String,
}

impl RequiredFields for UrlIngressBody {
    const MESSAGE: &'static str = "'roomName', 'participantIdentity' and 'url' are required";
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIngressBody {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub room_name: String,
}

impl RequiredFields for UpdateIngressBody {
    const MESSAGE: &'static str = "'roomName' is required";
}

async fn create(state: &AppState, request: CreateIngressRequest, message: &'static str) -> Created {
    let ingress = state
        .ingress
        .create_ingress(request)
        .await
        .map_err(ApiError::upstream(message))?;

    Ok((StatusCode::CREATED, Json(json!({ "ingress": ingress }))))
}

/// `POST /ingresses/rtmp`
pub async fn create_rtmp(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<ParticipantBody>,
) -> Created {
    let request = CreateIngressRequest::push(
        IngressInput::RtmpInput,
        body.room_name,
        body.participant_identity,
    );
    create(&state, request, "Error creating RTMP ingress").await
}

/// `POST /ingresses/whip`
pub async fn create_whip(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<ParticipantBody>,
) -> Created {
    let request = CreateIngressRequest::push(
        IngressInput::WhipInput,
        body.room_name,
        body.participant_identity,
    );
    create(&state, request, "Error creating WHIP ingress").await
}

/// `POST /ingresses/url`
pub async fn create_url(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<UrlIngressBody>,
) -> Created {
    let request = CreateIngressRequest::pull(body.room_name, body.participant_identity, body.url);
    create(&state, request, "Error creating URL ingress").await
}

/// `GET /ingresses`
pub async fn list_ingresses(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<Json<Value>, ApiError> {
    let ingresses = state
        .ingress
        .list_ingress(ListIngressRequest {
            room_name: params.get_or_empty("roomName"),
            ingress_id: params.get_or_empty("ingressId"),
        })
        .await
        .map_err(ApiError::upstream("Error listing ingresses"))?;

    Ok(Json(json!({ "ingresses": ingresses })))
}

pub async fn update_ingress(
    State(state): State<AppState>,
    Path(ingress_id): Path<String>,
    ValidJson(body): ValidJson<UpdateIngressBody>,
) -> Result<Json<Value>, ApiError> {
    let ingress = state
        .ingress
        .update_ingress(UpdateIngressRequest::retarget(ingress_id, body.room_name))
        .await
        .map_err(ApiError::upstream("Error updating ingress"))?;

    Ok(Json(json!({ "ingress": ingress })))
}

pub async fn delete_ingress(
    State(state): State<AppState>,
    Path(ingress_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .ingress
        .delete_ingress(DeleteIngressRequest { ingress_id })
        .await
        .map_err(ApiError::upstream("Error deleting ingress"))?;

    Ok(Json(json!({ "message": "Ingress deleted" })))
}
