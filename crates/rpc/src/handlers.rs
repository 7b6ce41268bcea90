//! HTTP request handlers for the control API.

use super::types::StateResponse;
use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use benor_consensus::EngineHandle;
use benor_types::ConsensusMessage;
use tracing::warn;

/// Handler for `GET /status` - liveness probe.
///
/// A faulty node's server stays up, so the fault is reported in-band as
/// a 500 rather than by the connection failing.
pub async fn status_handler(State(handle): State<EngineHandle>) -> impl IntoResponse {
    if handle.is_faulty() {
        (StatusCode::INTERNAL_SERVER_ERROR, "faulty")
    } else {
        (StatusCode::OK, "live")
    }
}

/// Handler for `GET /start`.
///
/// Starting an already-running node is a harmless no-op; starting a
/// faulty or stopped one is an error.
pub async fn start_handler(State(handle): State<EngineHandle>) -> impl IntoResponse {
    if handle.is_faulty() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "faulty");
    }
    if handle.is_stopped() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "stopped");
    }
    if handle.start() {
        (StatusCode::OK, "started")
    } else {
        (StatusCode::OK, "already started")
    }
}

/// Handler for `GET /stop`. Idempotent.
pub async fn stop_handler(State(handle): State<EngineHandle>) -> impl IntoResponse {
    handle.stop();
    (StatusCode::OK, "stopped")
}

/// Handler for `GET /state` - full node snapshot.
pub async fn state_handler(State(handle): State<EngineHandle>) -> impl IntoResponse {
    Json(StateResponse::from_handle(&handle))
}

/// Handler for `POST /message` - inbound consensus message.
///
/// Any well-formed message is accepted regardless of its round number;
/// the round buffer stores early and late rounds alike. A message
/// carrying no value is malformed (no live node ever sends one) and is
/// rejected before it can inflate quorum counts. A stopped or faulty
/// node refuses delivery with a 503.
pub async fn message_handler(
    State(handle): State<EngineHandle>,
    payload: Result<Json<ConsensusMessage>, JsonRejection>,
) -> impl IntoResponse {
    let Json(message) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            warn!(node = %handle.id(), error = %rejection.body_text(), "malformed message");
            return (StatusCode::BAD_REQUEST, "malformed message");
        }
    };
    if !message.value.is_known() {
        warn!(node = %handle.id(), from = %message.sender, "message without a value");
        return (StatusCode::BAD_REQUEST, "malformed message");
    }
    if handle.deliver(&message) {
        (StatusCode::OK, "recorded")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "node unavailable")
    }
}
