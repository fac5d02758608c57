//! SSE (Server-Sent Events) streaming for token-by-token responses.
//!
//! A streamed chat completion replays the canned reply one whitespace token
//! at a time in the OpenAI chunk format: one delta chunk per token, a
//! terminal chunk carrying the usage summary, then the `[DONE]` sentinel.
//!
//! The emitter is an explicit state machine (`Delta(i)` → `Terminal` →
//! `Done`) driven by the transport polling the stream. Pacing between
//! chunks is an awaited `tokio::time::sleep`, so a slow stream never
//! blocks other in-flight requests.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::Event;
use futures::stream::{Stream, StreamExt};
use serde::Serialize;

use crate::server::epoch_secs;
use crate::usage::Usage;

/// Sentinel event terminating every SSE stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Streaming chat completion chunk (OpenAI-compatible).
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkChoice {
    pub index: usize,
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

/// Partial message content. Serializes as `{}` when empty (terminal chunk).
#[derive(Debug, Clone, Serialize)]
pub struct ChunkDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Emitter states, advanced once per polled chunk.
enum EmitState {
    /// Emitting the token at this index of the reply.
    Delta(usize),
    /// All tokens sent; the usage-bearing terminal chunk is next.
    Terminal,
    /// Terminal chunk sent, stream exhausted.
    Done,
}

/// Stream the canned `reply` as one chunk per whitespace token, followed by
/// a terminal chunk with `finish_reason: "stop"` and the usage summary.
///
/// Every chunk after the first is preceded by `delay`. If the client
/// disconnects, the stream simply stops being polled; nothing is held.
pub fn chunk_stream(
    model: String,
    reply: &str,
    usage: Usage,
    delay: Duration,
) -> impl Stream<Item = ChatCompletionChunk> {
    let tokens: Arc<[String]> = reply
        .split_whitespace()
        .map(str::to_string)
        .collect::<Vec<_>>()
        .into();
    let model: Arc<str> = model.into();

    let start = if tokens.is_empty() {
        EmitState::Terminal
    } else {
        EmitState::Delta(0)
    };

    futures::stream::unfold(start, move |state| {
        let tokens = tokens.clone();
        let model = model.clone();
        let usage = usage.clone();

        async move {
            match state {
                EmitState::Delta(i) => {
                    if i > 0 {
                        tokio::time::sleep(delay).await;
                    }
                    let next = if i + 1 < tokens.len() {
                        EmitState::Delta(i + 1)
                    } else {
                        EmitState::Terminal
                    };
                    Some((delta_chunk(&model, &tokens[i]), next))
                }
                EmitState::Terminal => {
                    if !tokens.is_empty() {
                        tokio::time::sleep(delay).await;
                    }
                    Some((terminal_chunk(&model, usage), EmitState::Done))
                }
                EmitState::Done => None,
            }
        }
    })
}

/// JSON-encode each chunk into an SSE event and append the `[DONE]` sentinel.
pub fn sse_events(
    chunks: impl Stream<Item = ChatCompletionChunk>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    chunks
        .map(|chunk| {
            let data = serde_json::to_string(&chunk).unwrap_or_default();
            Ok(Event::default().data(data))
        })
        .chain(tokio_stream::once(Ok(Event::default().data(DONE_SENTINEL))))
}

fn delta_chunk(model: &str, token: &str) -> ChatCompletionChunk {
    ChatCompletionChunk {
        id: super::api::CHAT_COMPLETION_ID.to_string(),
        object: "chat.completion.chunk".to_string(),
        created: epoch_secs(),
        model: model.to_string(),
        choices: vec![ChunkChoice {
            index: 0,
            delta: ChunkDelta {
                content: Some(format!("{token} ")),
            },
            finish_reason: None,
        }],
        usage: None,
    }
}

fn terminal_chunk(model: &str, usage: Usage) -> ChatCompletionChunk {
    ChatCompletionChunk {
        id: super::api::CHAT_COMPLETION_ID.to_string(),
        object: "chat.completion.chunk".to_string(),
        created: epoch_secs(),
        model: model.to_string(),
        choices: vec![ChunkChoice {
            index: 0,
            delta: ChunkDelta { content: None },
            finish_reason: Some("stop".to_string()),
        }],
        usage: Some(usage),
    }
}
