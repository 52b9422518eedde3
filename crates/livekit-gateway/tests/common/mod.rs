//! Shared fixtures: an in-process gateway wired to a fake control plane

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use livekit_gateway::error::UpstreamError;
use livekit_gateway::upstream::egress::*;
use livekit_gateway::upstream::ingress::*;
use livekit_gateway::upstream::room::*;
use livekit_gateway::upstream::{EgressInfo, IngressInfo, Participant, Room, Track};
use livekit_gateway::{
    AccessTokenIssuer, AppState, EgressService, GatewayConfig, IngressService, LiveKitServices,
    RoomService, build_router,
};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const API_KEY: &str = "test-key";
pub const API_SECRET: &str = "test-secret-that-is-long-enough";

/// Detail carried by simulated failures; must never reach a client
pub const UPSTREAM_DETAIL: &str = "twirp internal: db password=hunter2";

/// Control plane stand-in recording every call it receives
#[derive(Default)]
pub struct FakeControlPlane {
    calls: Mutex<Vec<(&'static str, Value)>>,
    fail: AtomicBool,
    empty_lists: AtomicBool,
}

impl FakeControlPlane {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every following call fail
    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Make list calls report zero items
    pub fn report_empty_lists(&self) {
        self.empty_lists.store(true, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn methods(&self) -> Vec<&'static str> {
        self.calls.lock().iter().map(|(method, _)| *method).collect()
    }

    /// Method name and wire form of the most recent call
    pub fn last_call(&self) -> Option<(&'static str, Value)> {
        self.calls.lock().last().cloned()
    }

    fn record<T: Serialize>(&self, method: &'static str, request: &T) -> Result<(), UpstreamError> {
        let wire = serde_json::to_value(request).unwrap_or(Value::Null);
        self.calls.lock().push((method, wire));

        if self.fail.load(Ordering::SeqCst) {
            return Err(UpstreamError::Twirp {
                method,
                status: 500,
                code: "internal".to_string(),
                msg: UPSTREAM_DETAIL.to_string(),
            });
        }
        Ok(())
    }

    fn items(&self, item: Value) -> Vec<Value> {
        if self.empty_lists.load(Ordering::SeqCst) {
            Vec::new()
        } else {
            vec![item]
        }
    }
}

#[async_trait]
impl RoomService for FakeControlPlane {
    async fn create_room(&self, request: CreateRoomRequest) -> Result<Room, UpstreamError> {
        self.record("CreateRoom", &request)?;
        Ok(json!({ "sid": "RM_1", "name": request.name }))
    }

    async fn list_rooms(&self, request: ListRoomsRequest) -> Result<Vec<Room>, UpstreamError> {
        self.record("ListRooms", &request)?;
        Ok(self.items(json!({ "sid": "RM_1", "name": "r1" })))
    }

    async fn update_room_metadata(
        &self,
        request: UpdateRoomMetadataRequest,
    ) -> Result<Room, UpstreamError> {
        self.record("UpdateRoomMetadata", &request)?;
        Ok(json!({ "name": request.room, "metadata": request.metadata }))
    }

    async fn send_data(&self, request: SendDataRequest) -> Result<(), UpstreamError> {
        self.record("SendData", &request)
    }

    async fn delete_room(&self, request: DeleteRoomRequest) -> Result<(), UpstreamError> {
        self.record("DeleteRoom", &request)
    }

    async fn list_participants(
        &self,
        request: ListParticipantsRequest,
    ) -> Result<Vec<Participant>, UpstreamError> {
        self.record("ListParticipants", &request)?;
        Ok(self.items(json!({ "identity": "alice" })))
    }

    async fn get_participant(
        &self,
        request: RoomParticipantIdentity,
    ) -> Result<Participant, UpstreamError> {
        self.record("GetParticipant", &request)?;
        Ok(json!({ "identity": request.identity }))
    }

    async fn update_participant(
        &self,
        request: UpdateParticipantRequest,
    ) -> Result<Participant, UpstreamError> {
        self.record("UpdateParticipant", &request)?;
        Ok(json!({ "identity": request.identity, "metadata": request.metadata }))
    }

    async fn remove_participant(
        &self,
        request: RoomParticipantIdentity,
    ) -> Result<(), UpstreamError> {
        self.record("RemoveParticipant", &request)
    }

    async fn mute_published_track(
        &self,
        request: MuteRoomTrackRequest,
    ) -> Result<Track, UpstreamError> {
        self.record("MutePublishedTrack", &request)?;
        Ok(json!({ "sid": request.track_sid, "muted": request.muted }))
    }

    async fn update_subscriptions(
        &self,
        request: UpdateSubscriptionsRequest,
    ) -> Result<(), UpstreamError> {
        self.record("UpdateSubscriptions", &request)
    }
}

fn egress_info(room_name: &str) -> EgressInfo {
    json!({ "egress_id": "EG_1", "room_name": room_name, "status": "EGRESS_STARTING" })
}

#[async_trait]
impl EgressService for FakeControlPlane {
    async fn start_room_composite_egress(
        &self,
        request: RoomCompositeEgressRequest,
    ) -> Result<EgressInfo, UpstreamError> {
        self.record("StartRoomCompositeEgress", &request)?;
        Ok(egress_info(&request.room_name))
    }

    async fn start_participant_egress(
        &self,
        request: ParticipantEgressRequest,
    ) -> Result<EgressInfo, UpstreamError> {
        self.record("StartParticipantEgress", &request)?;
        Ok(egress_info(&request.room_name))
    }

    async fn start_track_composite_egress(
        &self,
        request: TrackCompositeEgressRequest,
    ) -> Result<EgressInfo, UpstreamError> {
        self.record("StartTrackCompositeEgress", &request)?;
        Ok(egress_info(&request.room_name))
    }

    async fn start_track_egress(
        &self,
        request: TrackEgressRequest,
    ) -> Result<EgressInfo, UpstreamError> {
        self.record("StartTrackEgress", &request)?;
        Ok(egress_info(&request.room_name))
    }

    async fn start_web_egress(
        &self,
        request: WebEgressRequest,
    ) -> Result<EgressInfo, UpstreamError> {
        self.record("StartWebEgress", &request)?;
        Ok(json!({ "egress_id": "EG_WEB" }))
    }

    async fn list_egress(
        &self,
        request: ListEgressRequest,
    ) -> Result<Vec<EgressInfo>, UpstreamError> {
        self.record("ListEgress", &request)?;
        Ok(self.items(egress_info("r1")))
    }

    async fn update_layout(
        &self,
        request: UpdateLayoutRequest,
    ) -> Result<EgressInfo, UpstreamError> {
        self.record("UpdateLayout", &request)?;
        Ok(json!({ "egress_id": request.egress_id }))
    }

    async fn update_stream(
        &self,
        request: UpdateStreamRequest,
    ) -> Result<EgressInfo, UpstreamError> {
        self.record("UpdateStream", &request)?;
        Ok(json!({ "egress_id": request.egress_id }))
    }

    async fn stop_egress(&self, request: StopEgressRequest) -> Result<EgressInfo, UpstreamError> {
        self.record("StopEgress", &request)?;
        Ok(json!({ "egress_id": request.egress_id, "status": "EGRESS_ENDING" }))
    }
}

#[async_trait]
impl IngressService for FakeControlPlane {
    async fn create_ingress(
        &self,
        request: CreateIngressRequest,
    ) -> Result<IngressInfo, UpstreamError> {
        self.record("CreateIngress", &request)?;
        Ok(json!({ "ingress_id": "IN_1", "name": request.name, "room_name": request.room_name }))
    }

    async fn list_ingress(
        &self,
        request: ListIngressRequest,
    ) -> Result<Vec<IngressInfo>, UpstreamError> {
        self.record("ListIngress", &request)?;
        Ok(self.items(json!({ "ingress_id": "IN_1" })))
    }

    async fn update_ingress(
        &self,
        request: UpdateIngressRequest,
    ) -> Result<IngressInfo, UpstreamError> {
        self.record("UpdateIngress", &request)?;
        Ok(json!({ "ingress_id": request.ingress_id, "room_name": request.room_name }))
    }

    async fn delete_ingress(
        &self,
        request: DeleteIngressRequest,
    ) -> Result<IngressInfo, UpstreamError> {
        self.record("DeleteIngress", &request)?;
        Ok(json!({ "ingress_id": request.ingress_id }))
    }
}

pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        livekit_api_key: API_KEY.to_string(),
        livekit_api_secret: API_SECRET.to_string(),
        ..GatewayConfig::default()
    }
}

pub fn issuer() -> Arc<AccessTokenIssuer> {
    Arc::new(AccessTokenIssuer::from_config(&test_config()))
}

/// Gateway router whose three service clients are all `fake`
pub fn app(fake: &Arc<FakeControlPlane>) -> Router {
    let services = LiveKitServices {
        rooms: fake.clone(),
        egress: fake.clone(),
        ingress: fake.clone(),
    };
    build_router(AppState::new(test_config(), issuer(), services))
}

/// Send one request and decode the JSON reply (`Null` for an empty body)
pub async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = body.map(|value| value.to_string()).unwrap_or_default();
    send_raw(app, method, uri, body, None).await
}

pub async fn send_raw(
    app: Router,
    method: Method,
    uri: &str,
    body: impl Into<Body>,
    authorization: Option<&str>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(value) = authorization {
        request = request.header("authorization", value);
    }

    let response = app
        .oneshot(request.body(body.into()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Assert a 400 with `message` and that the control plane was never called
pub async fn assert_rejected(
    fake: &Arc<FakeControlPlane>,
    method: Method,
    uri: &str,
    body: Value,
    message: &str,
) {
    let (status, reply) = send(app(fake), method, uri, Some(body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", uri, body);
    assert_eq!(reply, json!({ "errorMessage": message }), "{} {}", uri, body);
    assert_eq!(fake.call_count(), 0, "{} reached the control plane", uri);
}

/// Assert a 500 with the generic `message` and no upstream detail
pub async fn assert_upstream_failure(
    fake: &Arc<FakeControlPlane>,
    method: Method,
    uri: &str,
    body: Option<Value>,
    message: &str,
) {
    fake.fail();
    let (status, reply) = send(app(fake), method, uri, body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
    assert_eq!(reply, json!({ "errorMessage": message }), "{}", uri);
    assert!(!reply.to_string().contains("hunter2"));
}
