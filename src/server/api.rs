//! OpenAI-compatible HTTP API with canned responses.
//!
//! Implements the mocked surface of the OpenAI API:
//! - POST /v1/chat/completions (streaming and non-streaming)
//! - POST /v1/completions
//! - POST /v1/embeddings
//! - GET /v1/models, /v1/models/{id}
//! - POST /v1/images/*, /v1/moderations, /v1/edits
//! - /v1/files, /v1/audio/* (multipart, see [`super::uploads`])
//! - /v1/fine_tuning/jobs
//! - GET /health
//!
//! Every handler is a pure function of its input plus the current time;
//! nothing persists between requests except the read-only model catalog.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::catalog::{ModelCatalog, ModelDescriptor};
use crate::config::Config;
use crate::server::streaming::{chunk_stream, sse_events};
use crate::server::{epoch_secs, uploads};
use crate::usage::{FlagField, TextField, Usage};

// ─── Canned Content ────────────────────────────────────────────────────────

/// Fixed id on chat completion responses and stream chunks.
pub const CHAT_COMPLETION_ID: &str = "chatcmpl-dummy";

/// The assistant reply for every chat completion.
pub const CHAT_REPLY: &str = "Hello this is a dummy response.";

/// The reply for every text completion.
pub const COMPLETION_REPLY: &str = "dummy completion";

/// Model id reported when the request omits one.
pub const DEFAULT_MODEL: &str = "dummy-model";

/// base64-encoded 1x1 PNG returned by all image endpoints.
pub const SAMPLE_IMAGE_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR4nGNgYAAAAAMAAWgmWQ0AAAAASUVORK5CYII=";

const EMBEDDING_VECTOR: [f64; 3] = [0.0, 0.0, 0.0];

// ─── State & Errors ────────────────────────────────────────────────────────

/// Application state shared across handlers.
pub struct AppState {
    pub catalog: ModelCatalog,
    pub config: Arc<Config>,
    pub start_time: Instant,
}

/// The one explicit error path: everything else is tolerated by defaulting.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Model not found")]
    ModelNotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::ModelNotFound => StatusCode::NOT_FOUND,
        };
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/completions", post(completions))
        .route("/v1/embeddings", post(embeddings))
        .route("/v1/models", get(list_models))
        .route("/v1/models/", get(list_models))
        .route("/v1/models/{model_id}", get(retrieve_model))
        .route("/v1/images/generations", post(generate_image))
        .route("/v1/images/edits", post(generate_image))
        .route("/v1/images/variations", post(generate_image))
        .route("/v1/audio/transcriptions", post(uploads::transcribe_audio))
        .route("/v1/audio/translations", post(uploads::translate_audio))
        .route(
            "/v1/files",
            post(uploads::create_file).get(uploads::list_files),
        )
        .route(
            "/v1/files/{file_id}",
            get(uploads::retrieve_file).delete(uploads::delete_file),
        )
        .route(
            "/v1/fine_tuning/jobs",
            post(create_fine_tuning_job).get(list_fine_tuning_jobs),
        )
        .route("/v1/fine_tuning/jobs/{job_id}", get(retrieve_fine_tuning_job))
        .route("/v1/moderations", post(moderations))
        .route("/v1/edits", post(edits))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

/// Chat completion request. Missing or wrong-typed fields default rather
/// than reject: the mock should never block a client test over request
/// shape. `stream` follows truthiness, so `"stream": 1` streams.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default = "default_model")]
    pub model: TextField,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: FlagField,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: TextField,
    #[serde(default)]
    pub content: TextField,
}

fn default_model() -> TextField {
    TextField::Text(DEFAULT_MODEL.to_string())
}

/// Chat completion response (non-streaming).
#[derive(Debug, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
}

#[derive(Debug, Serialize)]
pub struct ChatChoice {
    pub index: usize,
    pub message: AssistantMessage,
    pub finish_reason: String,
}

#[derive(Debug, Serialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

/// Completion request. `prompt` accepts a string or a list of strings.
#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    #[serde(default)]
    pub prompt: TextField,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<CompletionChoice>,
    pub usage: Usage,
}

#[derive(Debug, Serialize)]
pub struct CompletionChoice {
    pub index: usize,
    pub text: String,
    pub finish_reason: String,
}

/// Embedding request. `input` accepts a string or a list of any JSON values.
#[derive(Debug, Deserialize)]
pub struct EmbeddingRequest {
    #[serde(default)]
    pub input: TextField,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingResponse {
    pub object: String,
    pub data: Vec<EmbeddingObject>,
    pub model: String,
    pub usage: Usage,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingObject {
    pub object: String,
    pub index: usize,
    pub embedding: Vec<f64>,
}

/// Model listing response.
#[derive(Debug, Serialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub created: u64,
    pub data: Vec<ImageData>,
}

#[derive(Debug, Serialize)]
pub struct ImageData {
    pub b64_json: String,
}

#[derive(Debug, Serialize)]
pub struct FineTuningJob {
    pub id: String,
    pub object: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FineTuningJobList {
    pub object: String,
    pub data: Vec<FineTuningJob>,
}

#[derive(Debug, Serialize)]
pub struct ModerationResponse {
    pub id: String,
    pub model: String,
    pub results: Vec<ModerationResult>,
}

#[derive(Debug, Serialize)]
pub struct ModerationResult {
    pub flagged: bool,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub object: String,
    pub choices: Vec<EditChoice>,
}

#[derive(Debug, Serialize)]
pub struct EditChoice {
    pub text: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub models: usize,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatCompletionRequest>,
) -> Response {
    let request_id = Uuid::new_v4();
    let model = req.model.text_or(DEFAULT_MODEL);
    let stream = req.stream.is_set();

    info!(
        %request_id,
        model,
        messages = req.messages.len(),
        stream,
        "Chat completion request"
    );

    // The prompt for accounting purposes is the message contents joined
    // with single spaces; roles are not counted.
    let prompt = req
        .messages
        .iter()
        .map(|m| m.content.joined_strings())
        .collect::<Vec<_>>()
        .join(" ");
    let usage = Usage::compute(&prompt, CHAT_REPLY);

    if stream {
        let chunks = chunk_stream(
            model,
            CHAT_REPLY,
            usage,
            state.config.stream.chunk_delay(),
        );
        Sse::new(sse_events(chunks))
            .keep_alive(KeepAlive::default())
            .into_response()
    } else {
        Json(ChatCompletionResponse {
            id: CHAT_COMPLETION_ID.to_string(),
            object: "chat.completion".to_string(),
            created: epoch_secs(),
            model,
            choices: vec![ChatChoice {
                index: 0,
                message: AssistantMessage {
                    role: "assistant".to_string(),
                    content: CHAT_REPLY.to_string(),
                },
                finish_reason: "stop".to_string(),
            }],
            usage,
        })
        .into_response()
    }
}

async fn completions(Json(req): Json<CompletionRequest>) -> Json<CompletionResponse> {
    let prompt = req.prompt.joined_strings();
    let usage = Usage::compute(&prompt, COMPLETION_REPLY);

    info!(
        prompt_tokens = usage.prompt_tokens,
        "Text completion request"
    );

    Json(CompletionResponse {
        id: "cmpl-dummy".to_string(),
        object: "text_completion".to_string(),
        created: epoch_secs(),
        model: DEFAULT_MODEL.to_string(),
        choices: vec![CompletionChoice {
            index: 0,
            text: COMPLETION_REPLY.to_string(),
            finish_reason: "stop".to_string(),
        }],
        usage,
    })
}

async fn embeddings(Json(req): Json<EmbeddingRequest>) -> Json<EmbeddingResponse> {
    let input = req.input.joined_lossy();

    Json(EmbeddingResponse {
        object: "list".to_string(),
        data: vec![EmbeddingObject {
            object: "embedding".to_string(),
            index: 0,
            embedding: EMBEDDING_VECTOR.to_vec(),
        }],
        model: "dummy-embedding-model".to_string(),
        usage: Usage::prompt_only(&input),
    })
}

async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelList> {
    Json(ModelList {
        object: "list".to_string(),
        data: state.catalog.models().to_vec(),
    })
}

async fn retrieve_model(
    State(state): State<Arc<AppState>>,
    Path(model_id): Path<String>,
) -> Result<Json<ModelDescriptor>, ApiError> {
    state
        .catalog
        .get(&model_id)
        .cloned()
        .map(Json)
        .ok_or(ApiError::ModelNotFound)
}

/// Serves generations, edits, and variations alike: the request body is
/// ignored and the same 1x1 PNG comes back.
async fn generate_image() -> Json<ImageResponse> {
    Json(ImageResponse {
        created: epoch_secs(),
        data: vec![ImageData {
            b64_json: SAMPLE_IMAGE_B64.to_string(),
        }],
    })
}

async fn create_fine_tuning_job() -> Json<FineTuningJob> {
    Json(FineTuningJob {
        id: "ft-job-dummy".to_string(),
        object: "fine_tuning.job".to_string(),
        status: None,
    })
}

async fn list_fine_tuning_jobs() -> Json<FineTuningJobList> {
    Json(FineTuningJobList {
        object: "list".to_string(),
        data: vec![FineTuningJob {
            id: "ft-job-dummy".to_string(),
            object: "fine_tuning.job".to_string(),
            status: None,
        }],
    })
}

/// Any job id retrieves successfully; the mock keeps no job registry.
async fn retrieve_fine_tuning_job(Path(job_id): Path<String>) -> Json<FineTuningJob> {
    Json(FineTuningJob {
        id: job_id,
        object: "fine_tuning.job".to_string(),
        status: Some("succeeded".to_string()),
    })
}

async fn moderations() -> Json<ModerationResponse> {
    Json(ModerationResponse {
        id: "modr-dummy".to_string(),
        model: "dummy-moderation".to_string(),
        results: vec![ModerationResult { flagged: false }],
    })
}

async fn edits() -> Json<EditResponse> {
    Json(EditResponse {
        object: "edit".to_string(),
        choices: vec![EditChoice {
            text: "dummy edit".to_string(),
        }],
    })
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        models: state.catalog.len(),
    })
}
