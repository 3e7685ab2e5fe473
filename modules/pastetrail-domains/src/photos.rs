use async_trait::async_trait;

use pastetrail_common::Result;

/// Collaborator contract for photo persistence. The core never inspects
/// photo bytes; it only threads the opaque reference through.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Persist `bytes` and return a stable opaque reference.
    async fn put(&self, bytes: &[u8], content_type: &str) -> Result<String>;

    /// Fetch previously stored bytes by reference.
    async fn get(&self, reference: &str) -> Result<Vec<u8>>;
}
