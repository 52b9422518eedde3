//! Route table

use std::time::Duration;

use axum::{
    Json, Router,
    routing::{delete, get, patch, post},
};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{AppState, egresses, ingresses, rooms, tokens, webhooks};

/// Headroom on top of the upstream timeout before a request is abandoned
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Build the gateway router
pub fn build_router(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout() + REQUEST_TIMEOUT_SLACK;

    Router::new()
        .route("/health", get(health))
        .route("/token", post(tokens::create_token))
        .route("/livekit/webhook", post(webhooks::receive_webhook))
        .merge(room_routes())
        .merge(egress_routes())
        .merge(ingress_routes())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn room_routes() -> Router<AppState> {
    const PARTICIPANT: &str = "/rooms/{room_name}/participants/{identity}";

    Router::new()
        .route("/rooms", post(rooms::create_room).get(rooms::list_rooms))
        .route("/rooms/{room_name}", delete(rooms::delete_room))
        .route("/rooms/{room_name}/metadata", post(rooms::update_room_metadata))
        .route("/rooms/{room_name}/send-data", post(rooms::send_data))
        .route("/rooms/{room_name}/participants", get(rooms::list_participants))
        .route(
            PARTICIPANT,
            get(rooms::get_participant)
                .patch(rooms::update_participant)
                .delete(rooms::remove_participant),
        )
        .route(&format!("{PARTICIPANT}/mute"), post(rooms::mute_track))
        .route(&format!("{PARTICIPANT}/subscribe"), post(rooms::subscribe))
        .route(&format!("{PARTICIPANT}/unsubscribe"), post(rooms::unsubscribe))
}

fn egress_routes() -> Router<AppState> {
    Router::new()
        .route("/egresses", get(egresses::list_egresses))
        .route("/egresses/", get(egresses::list_egresses))
        .route("/egresses/room-composite", post(egresses::start_room_composite))
        .route("/egresses/stream", post(egresses::start_stream))
        .route("/egresses/participant", post(egresses::start_participant))
        .route("/egresses/track-composite", post(egresses::start_track_composite))
        .route("/egresses/track", post(egresses::start_track))
        .route("/egresses/web", post(egresses::start_web))
        .route(
            "/egresses/{egress_id}",
            delete(egresses::stop_egress),
        )
        .route("/egresses/{egress_id}/layout", post(egresses::update_layout))
        .route("/egresses/{egress_id}/streams", post(egresses::update_streams))
}

fn ingress_routes() -> Router<AppState> {
    Router::new()
        .route("/ingresses", get(ingresses::list_ingresses))
        .route("/ingresses/", get(ingresses::list_ingresses))
        .route("/ingresses/rtmp", post(ingresses::create_rtmp))
        .route("/ingresses/whip", post(ingresses::create_whip))
        .route("/ingresses/url", post(ingresses::create_url))
        .route(
            "/ingresses/{ingress_id}",
            patch(ingresses::update_ingress).delete(ingresses::delete_ingress),
        )
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
