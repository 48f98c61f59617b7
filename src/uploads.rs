//! Media uploads: extension allow-list, filename sanitizing, and storage
//! under the configured upload directory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, Result};

pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "mp4", "avi"];

/// 16 MiB
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Public URL prefix the upload directory is served under.
pub const UPLOAD_URL_PREFIX: &str = "/static/uploads";

/// True iff `filename` has a `.` and the text after the last one is an
/// allowed extension, ignoring case.
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reduce a client-supplied filename to something safe to join onto the
/// upload directory. May return an empty string.
pub fn secure_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            _ => None,
        })
        .collect();

    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Decide whether an upload is acceptable and return the name to store it
/// under. `None` means the request carried no file part at all.
pub fn validate_upload(filename: Option<&str>, size: usize) -> Result<String> {
    let filename = filename.ok_or_else(|| AppError::Validation("No file part".to_string()))?;
    if filename.is_empty() {
        return Err(AppError::Validation("No selected file".to_string()));
    }
    if !allowed_file(filename) {
        return Err(AppError::Validation(format!(
            "File type not allowed; allowed types: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds the {} byte limit",
            MAX_UPLOAD_BYTES
        )));
    }

    let safe = secure_filename(filename);
    if safe.is_empty() || !allowed_file(&safe) {
        return Err(AppError::Validation("Invalid file name".to_string()));
    }
    Ok(safe)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub filename: String,
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<()> {
        if !tokio::fs::try_exists(&self.dir).await.unwrap_or(false) {
            tokio::fs::create_dir_all(&self.dir).await?;
            info!("Created upload directory {}", self.dir.display());
        }
        Ok(())
    }

    /// Validate and write an upload. The bytes land in a hidden temp file
    /// first, so a failed write never leaves a half-written upload behind.
    pub async fn save(&self, filename: Option<&str>, bytes: &[u8]) -> Result<StoredFile> {
        let name = validate_upload(filename, bytes.len())?;
        let path = self.dir.join(&name);
        let partial = self.dir.join(format!(".{}.part", name));

        if let Err(e) = tokio::fs::write(&partial, bytes).await {
            warn!("Error saving file {}: {}", partial.display(), e);
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        tokio::fs::rename(&partial, &path).await?;

        info!(file = %name, bytes = bytes.len(), "Stored upload");
        Ok(StoredFile {
            url: format!("{}/{}", UPLOAD_URL_PREFIX, name),
            filename: name,
        })
    }

    /// Names of stored uploads, sorted. A missing directory lists as empty.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') {
                files.push(name);
            }
        }
        files.sort();
        Ok(files)
    }
}
