//! dummyai: a deterministic mock of the OpenAI HTTP API.
//!
//! Serves the `/v1` endpoint surface with canned responses so clients can be
//! developed and tested against a stable, fast, offline stand-in for the
//! real service: request/response shapes, SSE streaming semantics, and
//! token-usage accounting all behave, but no inference ever runs.
//!
//! Token counts are whitespace word counts; model metadata comes from a JSON
//! catalog loaded once at startup.

pub mod catalog;
pub mod config;
pub mod server;
pub mod usage;
