//! Participant join tokens

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use super::{ApiError, AppState, RequiredFields, ValidJson};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TokenBody {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub room_name: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub participant_name: String,
}

impl RequiredFields for TokenBody {
    const MESSAGE: &'static str = "'roomName' and 'participantName' are required";
}

/// `POST /token`
pub async fn create_token(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<TokenBody>,
) -> Result<Json<Value>, ApiError> {
    let token = state
        .tokens
        .issue_join_token(&body.room_name, &body.participant_name)
        .map_err(|e| ApiError::Internal {
            message: "Error creating token",
            detail: e.to_string(),
        })?;

    Ok(Json(json!({ "token": token })))
}
