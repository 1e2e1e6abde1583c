mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use callprobe::http::{create_router, AppState};
use callprobe::session::SessionConfig;
use callprobe::transcript::{Speaker, TranscriptRecorder};
use common::Harness;
use tower::ServiceExt;

fn app(h: &Harness) -> Router {
    create_router(AppState::new(h.services.clone(), "probe.example.com"))
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let h = Harness::new(SessionConfig::default());
    let response = app(&h)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn test_twiml_points_at_media_stream() {
    let h = Harness::new(SessionConfig::default());
    let response = app(&h)
        .oneshot(
            Request::get("/twiml?scenario=reschedule")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/xml");

    let xml = body_text(response).await;
    assert!(xml.contains("wss://probe.example.com/media-stream"));
    assert!(xml.contains(r#"value="reschedule""#));
}

#[tokio::test]
async fn test_twiml_post_uses_default_scenario() {
    let h = Harness::new(SessionConfig::default());
    let response = app(&h)
        .oneshot(Request::post("/twiml").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(r#"value="simple_scheduling""#));
}

fn status_callback(call_sid: &str, status: &str) -> Request<Body> {
    Request::post("/call-status")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "CallSid={}&CallStatus={}&AccountSid=AC1",
            call_sid, status
        )))
        .unwrap()
}

#[tokio::test]
async fn test_completed_status_raises_the_signal() {
    let h = Harness::new(SessionConfig::default());
    let signal = h.registry.register("CA1").await;

    let response = app(&h)
        .oneshot(status_callback("CA1", "ringing"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!signal.is_raised());

    let response = app(&h)
        .oneshot(status_callback("CA1", "completed"))
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "OK");
    assert!(signal.is_raised());
}

#[tokio::test]
async fn test_call_queries() {
    let h = Harness::new(SessionConfig::default());

    let response = app(&h)
        .oneshot(Request::get("/calls/CA1/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    h.registry.register("CA1").await;
    let recorder = TranscriptRecorder::start("reschedule");
    recorder.append(Speaker::Agent, "Hello").await;
    h.registry.attach_transcript("CA1", recorder).await;

    let response = app(&h)
        .oneshot(Request::get("/calls/CA1/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(status["completed"], false);
    assert_eq!(status["turns"], 1);

    let response = app(&h)
        .oneshot(
            Request::get("/calls/CA1/transcript")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let turns: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(turns[0]["speaker"], "agent");
    assert_eq!(turns[0]["text"], "Hello");
}

#[tokio::test]
async fn test_media_stream_requires_upgrade() {
    let h = Harness::new(SessionConfig::default());
    let response = app(&h)
        .oneshot(Request::get("/media-stream").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
