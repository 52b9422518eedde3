//! Webhook sink

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
};
use tracing::{info, warn};

use super::{ApiError, AppState};

/// `POST /livekit/webhook`
///
/// Verified events are logged and acknowledged with an empty 200. Deliveries
/// that fail verification get an empty 401.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.webhooks.receive(&body, authorization) {
        Ok(event) => {
            let pretty = serde_json::to_string_pretty(&event).unwrap_or_default();
            info!(event = %event.event, "LiveKit webhook received:\n{}", pretty);
            Ok(StatusCode::OK)
        }
        Err(e) => {
            warn!(error = %e, "Rejected webhook delivery");
            Err(ApiError::Unauthorized)
        }
    }
}
