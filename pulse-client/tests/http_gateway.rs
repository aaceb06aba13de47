//! Tests for the HTTP gateways and SSE transport against an in-process
//! axum server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use futures::{Stream, StreamExt, stream};
use pulse_core::{
    ActivityGateway, ActivityRecord, ActivityWrite, ActorKind, EventTransport, GatewayError,
    IdentityGateway, SharedTokenSource, TransportError,
};
use pulse_client::{HttpGateway, SseTransport};
use serde_json::{Value, json};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct TestState {
    activity_writes: Mutex<Vec<Value>>,
}

async fn me(headers: HeaderMap) -> Response {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    match authorization {
        Some("Bearer good-token") => Json(json!({
            "owner_type": "user",
            "owner_id": "u-1",
            "name": "Avery",
            "role": "ceo",
        }))
        .into_response(),
        _ => (StatusCode::UNAUTHORIZED, "unauthorized").into_response(),
    }
}

async fn activities(
    State(state): State<Arc<TestState>>,
    Json(body): Json<Value>,
) -> StatusCode {
    state.activity_writes.lock().unwrap().push(body);
    StatusCode::CREATED
}

async fn events() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let frames = stream::iter(vec![
        // Unnamed keep-alive frame, must be skipped by the transport
        Ok(Event::default().data("keep-alive")),
        Ok(Event::default().event("init").data("{}")),
        Ok(Event::default().event("task:created").data(r#"{"id":"t-1"}"#)),
    ]);
    Sse::new(frames)
}

async fn spawn_server(state: Arc<TestState>) -> String {
    let app = Router::new()
        .route("/auth/me", get(me))
        .route("/activities", post(activities))
        .route("/events", get(events))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn identity_resolves_auth_context() {
    let base = spawn_server(Arc::new(TestState::default())).await;
    let tokens = SharedTokenSource::with_token("good-token");
    let gateway = HttpGateway::new(&base, Arc::new(tokens)).expect("build gateway");

    let context = gateway.resolve("good-token").await.expect("resolve");
    assert_eq!(context.owner_type.as_deref(), Some("user"));
    assert_eq!(context.owner_id.as_deref(), Some("u-1"));
    assert_eq!(context.name.as_deref(), Some("Avery"));
    assert_eq!(context.role.as_deref(), Some("ceo"));
}

#[tokio::test]
async fn identity_auth_failure_maps_to_unauthorized() {
    let base = spawn_server(Arc::new(TestState::default())).await;
    let tokens = SharedTokenSource::new();
    let gateway = HttpGateway::new(&base, Arc::new(tokens)).expect("build gateway");

    let error = gateway.resolve("bad-token").await.expect_err("should fail");
    assert_eq!(error, GatewayError::Unauthorized);
}

#[tokio::test]
async fn activity_write_posts_actor_tagged_body() {
    let state = Arc::new(TestState::default());
    let base = spawn_server(state.clone()).await;
    let tokens = SharedTokenSource::with_token("good-token");
    let gateway = HttpGateway::new(&base, Arc::new(tokens)).expect("build gateway");

    let write = ActivityWrite {
        actor_type: ActorKind::Agent,
        actor_id: "agent-7".to_string(),
        actor_name: "Scout".to_string(),
        record: ActivityRecord {
            event_type: "task_completed".to_string(),
            title: "Task done".to_string(),
            description: "finished".to_string(),
            project_id: Some("p-1".to_string()),
            task_id: None,
            metadata: Some(json!({"duration_ms": 1200})),
        },
    };
    gateway.record(&write).await.expect("record");

    let writes = state.activity_writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0]["actor_type"], "agent");
    assert_eq!(writes[0]["actor_id"], "agent-7");
    assert_eq!(writes[0]["actor_name"], "Scout");
    assert_eq!(writes[0]["event_type"], "task_completed");
    assert_eq!(writes[0]["project_id"], "p-1");
    assert_eq!(writes[0]["metadata"]["duration_ms"], 1200);
    assert!(writes[0].get("task_id").is_none());
}

#[tokio::test]
async fn sse_transport_yields_named_events_and_skips_keepalives() {
    let base = spawn_server(Arc::new(TestState::default())).await;
    let tokens = SharedTokenSource::with_token("good-token");
    let transport =
        SseTransport::new(format!("{base}/events"), Arc::new(tokens)).expect("build transport");

    let stream = transport.open().await.expect("open");
    let events: Vec<_> = stream.collect().await;

    let names: Vec<_> = events
        .iter()
        .map(|event| event.as_ref().expect("event").name.clone())
        .collect();
    assert_eq!(names, vec!["init", "task:created"]);
    assert_eq!(
        events[1].as_ref().expect("event").data.as_deref(),
        Some(r#"{"id":"t-1"}"#)
    );
}

#[tokio::test]
async fn sse_transport_reports_connect_failure() {
    // Grab a port, then close the listener so nothing is serving it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let tokens = SharedTokenSource::new();
    let transport =
        SseTransport::new(format!("http://{addr}/events"), Arc::new(tokens)).expect("build");

    let error = match transport.open().await {
        Ok(_) => panic!("should fail"),
        Err(error) => error,
    };
    assert!(matches!(error, TransportError::Connect { .. }));
}
