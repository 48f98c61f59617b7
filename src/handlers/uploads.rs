use axum::{
    body::Bytes,
    extract::{
        multipart::{Multipart, MultipartRejection},
        State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::error::Result;
use crate::uploads::{UploadStore, ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES};

#[derive(Clone)]
pub struct UploadsState {
    pub uploads: UploadStore,
}

/// Find the `file` part of a multipart body and read it fully.
/// Returns the client's filename (if any) with the bytes.
pub async fn read_file_field(
    multipart: &mut Multipart,
) -> Result<Option<(Option<String>, Bytes)>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok(Some((filename, bytes)));
    }
    Ok(None)
}

pub async fn upload_page(State(state): State<UploadsState>) -> Result<Json<Value>> {
    let files = state.uploads.list().await?;
    Ok(Json(json!({
        "allowed_extensions": ALLOWED_EXTENSIONS,
        "max_bytes": MAX_UPLOAD_BYTES,
        "files": files,
    })))
}

pub async fn upload_file(
    State(state): State<UploadsState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let mut multipart = multipart?;
    let stored = match read_file_field(&mut multipart).await? {
        Some((filename, bytes)) => {
            // A file input left empty still sends a part with an empty name
            let filename = filename.unwrap_or_default();
            state.uploads.save(Some(&filename), &bytes).await?
        }
        None => state.uploads.save(None, &[]).await?,
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "File successfully uploaded",
            "filename": stored.filename,
            "url": stored.url,
        })),
    ))
}
