mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{signup, test_server};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "lingua-test-boundary";

fn multipart_request(token: Option<&str>, parts: &[(&str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}.webm\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/transcribe")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).expect("failed to build request")
}

#[tokio::test]
async fn zero_audio_parts_rejected() {
    let server = test_server();
    let app = server.app();
    let (_, token) = signup(&app, "alice", "pw1").await;

    // A multipart body whose parts don't carry the audio fragment prefix.
    let request = multipart_request(Some(&token), &[("metadata", b"not-audio")]);
    let response = app.clone().oneshot(request).await.expect("request failed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let json: Value = serde_json::from_slice(&bytes).expect("body should be json");
    assert_eq!(json["message"], "No audio data provided");

    // An entirely empty multipart body is rejected the same way.
    let request = multipart_request(Some(&token), &[]);
    let response = app.clone().oneshot(request).await.expect("request failed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn transcription_requires_bearer_token() {
    let server = test_server();
    let app = server.app();

    let request = multipart_request(None, &[("chunk_0", b"fake-audio-bytes")]);
    let response = app.clone().oneshot(request).await.expect("request failed");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
