// ABOUTME: Disk handling for uploaded media: naming, filtering, size caps
// ABOUTME: Stored paths are /uploads/<kind>/<name> resolved by the static layer

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy)]
pub enum UploadKind {
    VehicleImage,
    Manual,
    Video,
    Thumbnail,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "wmv", "flv", "mkv", "webm"];

impl UploadKind {
    pub fn subdir(&self) -> &'static str {
        match self {
            UploadKind::VehicleImage => "vehicles",
            UploadKind::Manual => "manuals",
            UploadKind::Video => "videos",
            UploadKind::Thumbnail => "thumbnails",
        }
    }

    pub fn max_bytes(&self) -> usize {
        match self {
            UploadKind::VehicleImage => 5 * 1024 * 1024,
            UploadKind::Manual => 50 * 1024 * 1024,
            UploadKind::Video => 500 * 1024 * 1024,
            UploadKind::Thumbnail => 2 * 1024 * 1024,
        }
    }

    fn accepts(&self, extension: &str) -> bool {
        match self {
            UploadKind::VehicleImage | UploadKind::Thumbnail => {
                IMAGE_EXTENSIONS.contains(&extension)
            }
            UploadKind::Manual => extension == "pdf",
            UploadKind::Video => VIDEO_EXTENSIONS.contains(&extension),
        }
    }

    fn rejection(&self) -> &'static str {
        match self {
            UploadKind::VehicleImage | UploadKind::Thumbnail => "Only image files are allowed",
            UploadKind::Manual => "Only PDF files are allowed",
            UploadKind::Video => "Only video files are allowed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SavedUpload {
    /// URL-ish path stored in the database, e.g. /uploads/manuals/x.pdf
    pub url_path: String,
    pub disk_path: PathBuf,
}

pub fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

fn extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn sanitize(stem: &str) -> String {
    let safe: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if safe.is_empty() { "file".to_string() } else { safe }
}

pub async fn ensure_upload_dirs(root: &Path) -> Result<()> {
    for kind in [
        UploadKind::VehicleImage,
        UploadKind::Manual,
        UploadKind::Video,
        UploadKind::Thumbnail,
    ] {
        tokio::fs::create_dir_all(root.join(kind.subdir())).await?;
    }
    Ok(())
}

/// Validates and writes an uploaded file under the kind's directory
/// with a sanitized, uuid-suffixed name. The caller is responsible for
/// discarding the file if the matching database insert fails.
pub async fn save_upload(
    root: &Path,
    kind: UploadKind,
    original_name: &str,
    data: &[u8],
) -> Result<SavedUpload> {
    let ext = extension(original_name);
    if !kind.accepts(&ext) {
        return Err(AppError::Validation(kind.rejection().to_string()));
    }
    if data.len() > kind.max_bytes() {
        return Err(AppError::Validation("File too large".to_string()));
    }

    let name = format!(
        "{}-{}.{}",
        sanitize(&file_stem(original_name)),
        Uuid::new_v4().simple(),
        ext
    );
    let disk_path = root.join(kind.subdir()).join(&name);
    tokio::fs::write(&disk_path, data).await?;

    Ok(SavedUpload {
        url_path: format!("/uploads/{}/{}", kind.subdir(), name),
        disk_path,
    })
}

/// Best-effort cleanup when a write that referenced the file fails.
pub async fn discard(saved: &SavedUpload) {
    if let Err(err) = tokio::fs::remove_file(&saved.disk_path).await {
        tracing::warn!("failed to remove {}: {}", saved.disk_path.display(), err);
    }
}

/// Unlinks a stored /uploads/... path after its row is gone. Paths
/// outside the uploads tree (YouTube thumbnails) are left alone.
pub async fn remove_stored(root: &Path, url_path: &str) {
    let Some(relative) = url_path.strip_prefix("/uploads/") else {
        return;
    };
    if relative.contains("..") {
        return;
    }
    let disk_path = root.join(relative);
    if let Err(err) = tokio::fs::remove_file(&disk_path).await {
        tracing::debug!("failed to remove {}: {}", disk_path.display(), err);
    }
}
