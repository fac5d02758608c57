//! Multipart endpoints: audio transcription/translation and file storage.
//!
//! Uploaded bytes are never stored. Audio endpoints discard the payload and
//! return a fixed transcript; file endpoints echo identifiers back. Retrieve
//! and delete accept any id without an existence check, which is intentional
//! mock permissiveness.

use axum::extract::{Multipart, Path};
use axum::Json;
use serde::Serialize;
use tracing::info;

/// Transcript returned for every transcription upload.
pub const TRANSCRIPTION_TEXT: &str = "dummy transcription";

/// Transcript returned for every translation upload.
pub const TRANSLATION_TEXT: &str = "dummy translation";

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct FileObject {
    pub id: String,
    pub object: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct FileList {
    pub object: String,
    pub data: Vec<FileObject>,
}

/// Accepts (and discards) a multipart audio upload.
pub(crate) async fn transcribe_audio(multipart: Multipart) -> Json<TranscriptResponse> {
    drain(multipart).await;
    Json(TranscriptResponse {
        text: TRANSCRIPTION_TEXT.to_string(),
    })
}

pub(crate) async fn translate_audio(multipart: Multipart) -> Json<TranscriptResponse> {
    drain(multipart).await;
    Json(TranscriptResponse {
        text: TRANSLATION_TEXT.to_string(),
    })
}

/// "Uploads" a file: the only thing kept from the request is the filename,
/// echoed back in the synthetic descriptor.
pub(crate) async fn create_file(mut multipart: Multipart) -> Json<FileObject> {
    let mut filename = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            filename = field.file_name().map(str::to_string);
            break;
        }
    }

    info!(filename = filename.as_deref().unwrap_or(""), "File upload");

    Json(FileObject {
        id: "file-dummy".to_string(),
        object: "file".to_string(),
        filename,
        deleted: None,
    })
}

pub(crate) async fn list_files() -> Json<FileList> {
    Json(FileList {
        object: "list".to_string(),
        data: vec![FileObject {
            id: "file-dummy".to_string(),
            object: "file".to_string(),
            filename: None,
            deleted: None,
        }],
    })
}

pub(crate) async fn retrieve_file(Path(file_id): Path<String>) -> Json<FileObject> {
    Json(FileObject {
        id: file_id,
        object: "file".to_string(),
        filename: Some("dummy.txt".to_string()),
        deleted: None,
    })
}

pub(crate) async fn delete_file(Path(file_id): Path<String>) -> Json<FileObject> {
    Json(FileObject {
        id: file_id,
        object: "file".to_string(),
        filename: None,
        deleted: Some(true),
    })
}

/// Consume and discard every multipart field.
async fn drain(mut multipart: Multipart) {
    while let Ok(Some(field)) = multipart.next_field().await {
        let _ = field.bytes().await;
    }
}
