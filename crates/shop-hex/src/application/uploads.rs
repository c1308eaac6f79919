use crate::errors::AppError;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Maximum accepted image size (5MB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

pub const MSG_NO_FILE: &str = "No file uploaded";
pub const MSG_IMAGES_ONLY: &str = "Images only! (jpeg, jpg, png)";

/// Product images written to a local directory and served under `/uploads`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Both the file extension and the declared content type must name an
    /// accepted image format.
    pub fn validate(
        original_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<String, AppError> {
        if data.is_empty() {
            return Err(AppError::BadRequest(MSG_NO_FILE.into()));
        }
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {}MB",
                MAX_UPLOAD_BYTES / 1024 / 1024
            )));
        }
        let ext = extension_of(original_name)
            .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
            .ok_or_else(|| AppError::BadRequest(MSG_IMAGES_ONLY.into()))?;
        let mime_ok = content_type
            .map(|m| m.trim().to_ascii_lowercase())
            .is_some_and(|m| ALLOWED_MIME_TYPES.contains(&m.as_str()));
        if !mime_ok {
            return Err(AppError::BadRequest(MSG_IMAGES_ONLY.into()));
        }
        Ok(ext)
    }

    /// Stores the image under a fresh name and returns its public URL.
    pub async fn save_image(
        &self,
        original_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<String, AppError> {
        let ext = Self::validate(original_name, content_type, data)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| anyhow::anyhow!("create upload dir {}: {e}", self.dir.display()))?;

        let name = format!(
            "{}-{}.{ext}",
            chrono::Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        );
        let path = self.dir.join(&name);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| anyhow::anyhow!("write {}: {e}", path.display()))?;

        tracing::info!(file = %name, bytes = data.len(), "image uploaded");
        Ok(format!("/uploads/{name}"))
    }
}
