//! Blob storage for file attachments.
//!
//! The upload layer sees blob storage as an opaque collaborator: put
//! bytes under a room-scoped key, get back a download URL.  The default
//! implementation keeps blobs on the local filesystem under
//! `{base}/{room_id}/{file_name}`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info};

use tandem_shared::constants::MAX_FILE_SIZE;
use tandem_shared::RoomId;

use crate::error::{Result, StoreError};

/// Opaque put-bytes / get-download-url storage for attachments.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload bytes under the room-scoped key and return a download URL.
    async fn put(&self, room_id: &RoomId, file_name: &str, data: Bytes) -> Result<String>;

    /// Download URL of an already-stored blob.
    async fn download_url(&self, room_id: &RoomId, file_name: &str) -> Result<String>;

    /// Read a stored blob back.
    async fn get(&self, room_id: &RoomId, file_name: &str) -> Result<Bytes>;
}

/// Filesystem-backed [`BlobStore`].
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    base_path: PathBuf,
    max_size: usize,
}

impl FsBlobStore {
    /// Create the store rooted at `base_path`, creating the directory if
    /// needed.
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            StoreError::Blob(format!(
                "Failed to create blob directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Blob store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Create the store with the default attachment size cap.
    pub async fn open(base_path: PathBuf) -> Result<Self> {
        Self::new(base_path, MAX_FILE_SIZE).await
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Build the on-disk path for a key, rejecting separators and
    /// traversal components in either part.
    fn safe_path(&self, room_id: &RoomId, file_name: &str) -> Result<PathBuf> {
        for part in [room_id.as_str(), file_name] {
            if part.is_empty()
                || part.contains('/')
                || part.contains('\\')
                || part.contains("..")
            {
                return Err(StoreError::BadBlobKey(format!("{room_id}/{file_name}")));
            }
        }
        Ok(self.base_path.join(room_id.as_str()).join(file_name))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, room_id: &RoomId, file_name: &str, data: Bytes) -> Result<String> {
        if data.is_empty() {
            return Err(StoreError::Blob("Empty blob".to_string()));
        }
        if data.len() > self.max_size {
            return Err(StoreError::BlobTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let path = self.safe_path(room_id, file_name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Blob(format!("Failed to create room directory: {e}"))
            })?;
        }

        let hash = blake3::hash(&data);
        fs::write(&path, &data).await.map_err(|e| {
            StoreError::Blob(format!("Failed to write blob {room_id}/{file_name}: {e}"))
        })?;

        debug!(
            room = %room_id,
            file = file_name,
            size = data.len(),
            hash = %hash.to_hex(),
            "Stored blob"
        );

        Ok(format!("file://{}", path.display()))
    }

    async fn download_url(&self, room_id: &RoomId, file_name: &str) -> Result<String> {
        let path = self.safe_path(room_id, file_name)?;
        if !path.exists() {
            return Err(StoreError::BlobNotFound(format!("{room_id}/{file_name}")));
        }
        Ok(format!("file://{}", path.display()))
    }

    async fn get(&self, room_id: &RoomId, file_name: &str) -> Result<Bytes> {
        let path = self.safe_path(room_id, file_name)?;
        if !path.exists() {
            return Err(StoreError::BlobNotFound(format!("{room_id}/{file_name}")));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StoreError::Blob(format!("Failed to read blob {room_id}/{file_name}: {e}"))
        })?;

        debug!(room = %room_id, file = file_name, size = data.len(), "Retrieved blob");
        Ok(Bytes::from(data))
    }
}
