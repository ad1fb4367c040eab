//! Event image uploads.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{EventError, EventResult};

pub const MAX_IMAGES: usize = 5;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// URL prefix the local store's directory is served under
pub const UPLOADS_PATH: &str = "/uploads";

/// An uploaded image whose content type has been checked.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Bytes,
}

impl ImageUpload {
    pub fn new(
        file_name: Option<String>,
        content_type: Option<&str>,
        data: Bytes,
    ) -> EventResult<Self> {
        let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
        if image_extension(&content_type).is_none() {
            return Err(EventError::Upload("Only image files are allowed".to_string()));
        }
        if data.is_empty() {
            return Err(EventError::Upload("Image file is empty".to_string()));
        }
        if data.len() > MAX_IMAGE_BYTES {
            return Err(EventError::Upload("Image exceeds the 5 MB limit".to_string()));
        }
        Ok(Self {
            file_name,
            content_type,
            data,
        })
    }

    pub fn extension(&self) -> &'static str {
        image_extension(&self.content_type).unwrap_or("bin")
    }
}

fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist the image and return the URL it is served from.
    async fn store(&self, upload: ImageUpload) -> EventResult<String>;
}

/// Writes images into a directory that the API serves statically.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    public_path: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_path: UPLOADS_PATH.to_string(),
        }
    }

    pub fn with_public_path(mut self, public_path: impl Into<String>) -> Self {
        self.public_path = public_path.into().trim_end_matches('/').to_string();
        self
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    #[instrument(skip(self, upload), fields(content_type = %upload.content_type, bytes = upload.data.len()))]
    async fn store(&self, upload: ImageUpload) -> EventResult<String> {
        tokio::fs::create_dir_all(&self.root).await?;

        let file_name = format!("{}.{}", Uuid::now_v7(), upload.extension());
        tokio::fs::write(self.root.join(&file_name), &upload.data).await?;

        tracing::debug!(file = %file_name, original = ?upload.file_name, "image stored");
        Ok(format!("{}/{}", self.public_path, file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_images() {
        let err = ImageUpload::new(None, Some("application/pdf"), Bytes::from_static(b"%PDF"))
            .unwrap_err();
        assert!(matches!(err, EventError::Upload(m) if m == "Only image files are allowed"));
        assert!(ImageUpload::new(None, None, Bytes::from_static(b"x")).is_err());
    }

    #[test]
    fn test_accepts_known_image_types() {
        let upload =
            ImageUpload::new(Some("a.PNG".into()), Some("Image/PNG"), Bytes::from_static(b"png"))
                .unwrap();
        assert_eq!(upload.extension(), "png");
    }

    #[tokio::test]
    async fn test_local_store_writes_file() {
        let dir = std::env::temp_dir().join(format!("event-images-{}", Uuid::now_v7()));
        let store = LocalImageStore::new(&dir);
        let upload =
            ImageUpload::new(None, Some("image/jpeg"), Bytes::from_static(b"\xff\xd8\xff")).unwrap();

        let url = store.store(upload).await.unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".jpg"));

        let name = url.trim_start_matches("/uploads/");
        let written = tokio::fs::read(dir.join(name)).await.unwrap();
        assert_eq!(written, b"\xff\xd8\xff");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
