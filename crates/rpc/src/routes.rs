//! Route configuration for the control API.

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use benor_consensus::EngineHandle;

/// Create the per-node router. The handle is the entire server state.
pub fn create_router(handle: EngineHandle) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/start", get(start_handler))
        .route("/stop", get(stop_handler))
        .route("/state", get(state_handler))
        .route("/message", post(message_handler))
        .with_state(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use benor_consensus::{ConsensusEngine, EngineConfig, Transport};
    use benor_types::{ConsensusMessage, NetworkConfig, NodeId, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct NoopTransport;

    impl Transport for NoopTransport {
        fn send(&self, _to: NodeId, _message: ConsensusMessage) {}
    }

    fn live_handle() -> EngineHandle {
        // N large enough that the engine sits waiting for quorum
        // instead of racing to a decision mid-test.
        let network = NetworkConfig::new(5, 0).expect("valid network");
        ConsensusEngine::spawn(
            NodeId(0),
            Value::Zero,
            network,
            EngineConfig::default(),
            Arc::new(NoopTransport),
            1,
        )
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request")
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request")
    }

    #[tokio::test]
    async fn status_reports_live() {
        let app = create_router(live_handle());
        let response = app.oneshot(get("/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn status_reports_faulty_with_500() {
        let app = create_router(EngineHandle::inert(NodeId(2)));
        let response = app.oneshot(get("/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn start_then_start_again_is_ok() {
        let handle = live_handle();
        let app = create_router(handle);
        let response = app.clone().oneshot(get("/start")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let response = app.oneshot(get("/start")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn start_after_stop_is_an_error() {
        let app = create_router(live_handle());
        let response = app.clone().oneshot(get("/stop")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let response = app.oneshot(get("/start")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn state_returns_a_json_snapshot() {
        let app = create_router(live_handle());
        let response = app.oneshot(get("/state")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["id"], 0);
        assert_eq!(json["killed"], false);
        assert_eq!(json["estimate"], 0);
        assert_eq!(json["round"], 1);
        assert_eq!(json["decided"], false);
    }

    #[tokio::test]
    async fn message_is_recorded_whatever_its_round() {
        let app = create_router(live_handle());
        let body = r#"{"round":9000,"phase":"vote","value":1,"sender":3}"#;
        let response = app.oneshot(post_json("/message", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_message_is_a_400() {
        let app = create_router(live_handle());
        for body in [
            "not json at all",
            r#"{"round":1}"#,
            r#"{"round":1,"phase":"propose","value":7,"sender":0}"#,
            // A null value parses but no live node ever sends one; it
            // must not reach the buffer and pad quorum counts.
            r#"{"round":1,"phase":"propose","value":null,"sender":0}"#,
        ] {
            let response = app
                .clone()
                .oneshot(post_json("/message", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        }
    }

    #[tokio::test]
    async fn stopped_node_refuses_messages_with_503() {
        let app = create_router(live_handle());
        let response = app.clone().oneshot(get("/stop")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = r#"{"round":1,"phase":"propose","value":0,"sender":1}"#;
        let response = app.oneshot(post_json("/message", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn faulty_node_refuses_messages_with_503() {
        let app = create_router(EngineHandle::inert(NodeId(1)));
        let body = r#"{"round":1,"phase":"propose","value":0,"sender":0}"#;
        let response = app.oneshot(post_json("/message", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
