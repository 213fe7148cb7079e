// Binary storage for uploaded files

use async_trait::async_trait;
use std::path::Path;
use uuid::Uuid;

pub mod local;

pub use local::*;

const MAX_EXTENSION_LEN: usize = 10;

/// Stores uploaded bytes under generated keys.
///
/// The path returned by `save` is what gets persisted on the document record
/// and handed back to `read` and `delete`.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn save(&self, key: &str, data: &[u8]) -> std::io::Result<String>;

    /// Returns `false` if the file was already absent.
    async fn delete(&self, path: &str) -> std::io::Result<bool>;

    async fn read(&self, path: &str) -> std::io::Result<Vec<u8>>;
}

/// Random storage key that keeps the original (sanitized) extension.
///
/// `report.PDF` becomes something like `3f0c...e1.pdf`; names without a
/// usable extension get a bare UUID.
pub fn generate_key(original_name: &str) -> String {
    let id = Uuid::new_v4();
    match file_extension(original_name) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// Lowercased extension of `name`, if it is short and alphanumeric.
pub fn file_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
