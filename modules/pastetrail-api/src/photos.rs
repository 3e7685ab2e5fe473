//! Directory-backed photo store.
//!
//! Keys are `{millis}-{suffix}.{ext}`; the bytes are never inspected.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::Rng;

use pastetrail_common::{Error, Result};
use pastetrail_domains::photos::PhotoStore;

pub struct FsPhotoStore {
    dir: PathBuf,
}

impl FsPhotoStore {
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Io(format!("photo dir {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn generate_key(content_type: &str) -> String {
        let ext = match content_type {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        };
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: String = rand::rng()
            .sample_iter(rand::distr::Alphanumeric)
            .take(6)
            .map(|b| (b as char).to_ascii_lowercase())
            .collect();
        format!("{millis}-{suffix}.{ext}")
    }

    fn resolve(&self, reference: &str) -> Result<PathBuf> {
        // Keys never contain path separators; reject anything that does.
        if reference.contains('/') || reference.contains('\\') || reference.contains("..") {
            return Err(Error::NotFound(format!("photo {reference} not found")));
        }
        Ok(self.dir.join(reference))
    }
}

#[async_trait]
impl PhotoStore for FsPhotoStore {
    async fn put(&self, bytes: &[u8], content_type: &str) -> Result<String> {
        let key = Self::generate_key(content_type);
        let path = self.dir.join(&key);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Error::Io(format!("photo write failed: {e}")))?;
        Ok(key)
    }

    async fn get(&self, reference: &str) -> Result<Vec<u8>> {
        let path = self.resolve(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("photo {reference} not found")))
            }
            Err(e) => Err(Error::Io(format!("photo read failed: {e}"))),
        }
    }
}

/// MIME type for a stored key, from its extension.
pub fn content_type_for(reference: &str) -> &'static str {
    match reference.rsplit('.').next() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
