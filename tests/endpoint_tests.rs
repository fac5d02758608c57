//! HTTP-level tests for the mocked endpoint surface.
//!
//! Each test drives the real router through `tower::ServiceExt::oneshot`,
//! so routing, extractors, and serialization are all exercised exactly as
//! a live server would.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::Engine;
use serde_json::{json, Value};
use tower::ServiceExt;

use dummyai::catalog::ModelCatalog;
use dummyai::config::Config;
use dummyai::server::api::{build_router, AppState};

const CATALOG: &str = r#"[
    {"id": "dummy-model", "object": "model", "created": 1686935002, "owned_by": "dummyai"},
    {"id": "dummy-embedding-model", "object": "model", "created": 1686935002, "owned_by": "dummyai"}
]"#;

fn test_app() -> Router {
    let mut config = Config::default();
    // Keep streaming tests fast.
    config.stream.chunk_delay_ms = 1;

    let state = Arc::new(AppState {
        catalog: ModelCatalog::from_json(CATALOG).unwrap(),
        config: Arc::new(config),
        start_time: Instant::now(),
    });
    build_router(state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn json_request(method: &str, path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, path: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

fn multipart_request(path: &str, filename: &str) -> Request<Body> {
    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n\
         not a real payload\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

// ─── Models ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_models() {
    let (status, body) = send(test_app(), empty_request("GET", "/v1/models")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["object"], "list");
    assert_eq!(body["data"][0]["id"], "dummy-model");
    assert_eq!(body["data"][1]["id"], "dummy-embedding-model");
}

#[tokio::test]
async fn test_list_models_trailing_slash() {
    let (status, body) = send(test_app(), empty_request("GET", "/v1/models/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["object"], "list");
}

#[tokio::test]
async fn test_retrieve_model() {
    let (status, body) = send(test_app(), empty_request("GET", "/v1/models/dummy-model")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "dummy-model");
    assert_eq!(body["object"], "model");
    assert_eq!(body["owned_by"], "dummyai");
}

#[tokio::test]
async fn test_retrieve_unknown_model_is_404() {
    let (status, body) = send(test_app(), empty_request("GET", "/v1/models/gpt-nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Model not found");
}

// ─── Chat Completions ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_chat_usage_counts() {
    let request = json_request(
        "POST",
        "/v1/chat/completions",
        json!({"model": "dummy-model", "messages": [{"role": "user", "content": "Hello world"}]}),
    );
    let (status, body) = send(test_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "chatcmpl-dummy");
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["model"], "dummy-model");
    assert_eq!(
        body["choices"][0]["message"]["content"],
        "Hello this is a dummy response."
    );
    assert_eq!(body["choices"][0]["finish_reason"], "stop");
    assert_eq!(
        body["usage"],
        json!({"prompt_tokens": 2, "completion_tokens": 6, "total_tokens": 8})
    );
}

#[tokio::test]
async fn test_chat_defaults_tolerate_empty_body() {
    let (status, body) = send(
        test_app(),
        json_request("POST", "/v1/chat/completions", json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "dummy-model");
    assert_eq!(body["usage"]["prompt_tokens"], 0);
    assert_eq!(body["usage"]["total_tokens"], 6);
}

#[tokio::test]
async fn test_chat_malformed_json_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(test_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_streaming_event_sequence() {
    let request = json_request(
        "POST",
        "/v1/chat/completions",
        json!({
            "model": "dummy-model",
            "messages": [{"role": "user", "content": "Hello world"}],
            "stream": true
        }),
    );
    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    let events: Vec<&str> = body
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .collect();

    // 6 reply tokens, one terminal chunk, then the sentinel.
    assert_eq!(events.len(), 8);

    let reply_tokens = ["Hello", "this", "is", "a", "dummy", "response."];
    for (event, token) in events.iter().zip(reply_tokens) {
        let chunk: Value = serde_json::from_str(event).unwrap();
        assert_eq!(chunk["object"], "chat.completion.chunk");
        assert_eq!(chunk["choices"][0]["delta"]["content"], format!("{token} "));
        assert_eq!(chunk["choices"][0]["finish_reason"], Value::Null);
        assert!(chunk.get("usage").is_none());
    }

    let terminal: Value = serde_json::from_str(events[6]).unwrap();
    assert_eq!(terminal["choices"][0]["delta"], json!({}));
    assert_eq!(terminal["choices"][0]["finish_reason"], "stop");
    assert_eq!(
        terminal["usage"],
        json!({"prompt_tokens": 2, "completion_tokens": 6, "total_tokens": 8})
    );

    assert_eq!(events[7], "[DONE]");
}

#[tokio::test]
async fn test_chat_numeric_stream_flag_streams() {
    // Dynamic-language clients send `"stream": 1`; truthiness applies.
    let request = json_request(
        "POST",
        "/v1/chat/completions",
        json!({"messages": [{"role": "user", "content": "Hello world"}], "stream": 1}),
    );
    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.contains("data: [DONE]"));
}

#[tokio::test]
async fn test_chat_falsy_stream_flag_does_not_stream() {
    let request = json_request(
        "POST",
        "/v1/chat/completions",
        json!({"messages": [], "stream": 0}),
    );
    let (status, body) = send(test_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["object"], "chat.completion");
}

#[tokio::test]
async fn test_chat_wrong_typed_fields_default() {
    let request = json_request(
        "POST",
        "/v1/chat/completions",
        json!({"model": 42, "messages": [{"role": 7, "content": "Hello world"}]}),
    );
    let (status, body) = send(test_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "dummy-model");
    assert_eq!(body["usage"]["prompt_tokens"], 2);
}

// ─── Completions & Embeddings ──────────────────────────────────────────────

#[tokio::test]
async fn test_completion_usage_counts() {
    let request = json_request("POST", "/v1/completions", json!({"prompt": "Hi there"}));
    let (status, body) = send(test_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "cmpl-dummy");
    assert_eq!(body["object"], "text_completion");
    assert_eq!(body["choices"][0]["text"], "dummy completion");
    assert_eq!(
        body["usage"],
        json!({"prompt_tokens": 2, "completion_tokens": 2, "total_tokens": 4})
    );
}

#[tokio::test]
async fn test_completion_prompt_list_drops_non_strings() {
    let request = json_request(
        "POST",
        "/v1/completions",
        json!({"prompt": ["Hi", "there", 5, null]}),
    );
    let (status, body) = send(test_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage"]["prompt_tokens"], 2);
}

#[tokio::test]
async fn test_embedding_usage_counts() {
    let request = json_request("POST", "/v1/embeddings", json!({"input": "hi"}));
    let (status, body) = send(test_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "dummy-embedding-model");
    assert_eq!(body["data"][0]["object"], "embedding");
    assert_eq!(body["data"][0]["embedding"].as_array().unwrap().len(), 3);
    assert_eq!(
        body["usage"],
        json!({"prompt_tokens": 1, "total_tokens": 1})
    );
    assert!(body["usage"].get("completion_tokens").is_none());
}

// ─── Images ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_image_endpoints_return_decodable_base64() {
    for path in [
        "/v1/images/generations",
        "/v1/images/edits",
        "/v1/images/variations",
    ] {
        let (status, body) = send(test_app(), empty_request("POST", path)).await;
        assert_eq!(status, StatusCode::OK, "{path}");

        let b64 = body["data"][0]["b64_json"].as_str().unwrap();
        let image = base64::engine::general_purpose::STANDARD.decode(b64).unwrap();
        assert!(!image.is_empty());
        assert!(body["created"].as_u64().unwrap() > 0);
    }
}

// ─── Audio & Files ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_audio_endpoints_ignore_upload_content() {
    let (status, body) = send(
        test_app(),
        multipart_request("/v1/audio/transcriptions", "speech.wav"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"text": "dummy transcription"}));

    let (status, body) = send(
        test_app(),
        multipart_request("/v1/audio/translations", "speech.wav"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"text": "dummy translation"}));
}

#[tokio::test]
async fn test_create_file_echoes_filename() {
    let (status, body) = send(test_app(), multipart_request("/v1/files", "notes.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "file-dummy");
    assert_eq!(body["object"], "file");
    assert_eq!(body["filename"], "notes.txt");
}

#[tokio::test]
async fn test_file_list_retrieve_delete() {
    let (status, body) = send(test_app(), empty_request("GET", "/v1/files")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], "file-dummy");

    // Any id retrieves and deletes; no existence check.
    let (status, body) =
        send(test_app(), empty_request("GET", "/v1/files/file-anything")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "file-anything");
    assert_eq!(body["filename"], "dummy.txt");

    let (status, body) =
        send(test_app(), empty_request("DELETE", "/v1/files/file-anything")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);
}

// ─── Fine-tuning, Moderations, Edits ───────────────────────────────────────

#[tokio::test]
async fn test_fine_tuning_jobs() {
    let (status, body) = send(test_app(), empty_request("POST", "/v1/fine_tuning/jobs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "ft-job-dummy");
    assert_eq!(body["object"], "fine_tuning.job");

    let (status, body) = send(test_app(), empty_request("GET", "/v1/fine_tuning/jobs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], "ft-job-dummy");

    let (status, body) = send(
        test_app(),
        empty_request("GET", "/v1/fine_tuning/jobs/ft-whatever"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "ft-whatever");
    assert_eq!(body["status"], "succeeded");
}

#[tokio::test]
async fn test_moderations_and_edits() {
    let (status, body) = send(test_app(), empty_request("POST", "/v1/moderations")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "dummy-moderation");
    assert_eq!(body["results"][0]["flagged"], false);

    let (status, body) = send(test_app(), empty_request("POST", "/v1/edits")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["object"], "edit");
    assert_eq!(body["choices"][0]["text"], "dummy edit");
}

// ─── Health ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let (status, body) = send(test_app(), empty_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["models"], 2);
}
