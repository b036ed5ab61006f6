//! Filesystem photo storage.
//!
//! Evidence photos live on disk under one uploads root; the rest of the
//! system only ever sees the opaque `/uploads/<name>` reference recorded
//! in the ledger. The bytes are served back by the static file route.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::ApiError;

/// Largest accepted photo, decoded size.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Route prefix stored photos are served under.
pub const PHOTO_ROUTE_PREFIX: &str = "/uploads";

/// Photo formats accepted as violation evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoFormat {
    Png,
    Jpeg,
}

impl PhotoFormat {
    /// Decide the format from magic bytes. Anything else is rejected;
    /// client-supplied content types are not trusted.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

        if bytes.starts_with(&PNG_MAGIC) {
            Some(Self::Png)
        } else if bytes.starts_with(&JPEG_MAGIC) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Blob store for violation photos.
#[derive(Debug, Clone)]
pub struct FsPhotoStore {
    root: PathBuf,
}

impl FsPhotoStore {
    /// Open the uploads root, creating it if needed.
    pub async fn new(root: &Path) -> io::Result<Self> {
        tokio::fs::create_dir_all(root).await?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist photo bytes under a fresh name and return the reference
    /// the ledger records.
    pub async fn store(&self, bytes: &[u8], format: PhotoFormat) -> Result<String, ApiError> {
        let name = format!("violation-{}.{}", Uuid::new_v4(), format.extension());

        tokio::fs::write(self.root.join(&name), bytes)
            .await
            .map_err(ApiError::PhotoStorage)?;

        Ok(format!("{}/{}", PHOTO_ROUTE_PREFIX, name))
    }

    /// Remove a stored photo by its reference. Callers use this to back
    /// out a photo whose report never committed, and to clean up after
    /// a delete.
    pub async fn remove(&self, reference: &str) -> io::Result<()> {
        let name = reference.rsplit('/').next().unwrap_or(reference);
        tokio::fs::remove_file(self.root.join(name)).await
    }
}
