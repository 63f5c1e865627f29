//! Storage of uploaded microscopy images

use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// URL prefix the upload directory is served under
pub const UPLOADS_URL_PREFIX: &str = "/static/uploads";

/// A file written to the upload directory
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub path: PathBuf,
    pub file_name: String,
}

/// Reduce a client-supplied file name to a safe single path component
pub fn sanitize_file_name(original: &str) -> String {
    // Drop any directory part a client may have sent
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let name: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let name = name.trim_start_matches('.');
    if name.is_empty() {
        "upload".to_string()
    } else {
        name.to_string()
    }
}

/// Timestamp-prefixed name. Unique only with high probability.
pub fn stored_file_name(original: &str) -> String {
    let now = Utc::now();
    format!(
        "{}.{:06}_{}",
        now.timestamp(),
        now.timestamp_subsec_micros(),
        sanitize_file_name(original)
    )
}

/// Write upload bytes under `dir`, creating it if needed
pub async fn save_upload(dir: &Path, original_name: &str, bytes: &[u8]) -> Result<StoredUpload> {
    tokio::fs::create_dir_all(dir).await?;

    let file_name = stored_file_name(original_name);
    let path = dir.join(&file_name);
    tokio::fs::write(&path, bytes).await?;

    tracing::debug!("Stored upload {} ({} bytes)", path.display(), bytes.len());
    Ok(StoredUpload { path, file_name })
}

/// Remove a stored upload that no record will reference. Failures are logged.
pub async fn discard_upload(stored: &StoredUpload) {
    match tokio::fs::remove_file(&stored.path).await {
        Ok(()) => tracing::debug!("Discarded upload {}", stored.path.display()),
        Err(e) => tracing::warn!(
            "Could not remove orphaned upload {}: {}",
            stored.path.display(),
            e
        ),
    }
}

/// Public URL of a stored image path
pub fn image_url(image_path: &str) -> String {
    let file_name = Path::new(image_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}/{}", UPLOADS_URL_PREFIX, file_name)
}
