//! Blob-store boundary. The core keeps only opaque file references on
//! submission records; byte limits and content-type checks live here with the
//! collaborator, never in the review engine.

pub mod drive;

use mime::Mime;
use serde::{Deserialize, Serialize};

pub use drive::GoogleDriveFileStore;

/// Uploads above this size are refused before touching any backend.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Opaque reference to stored bytes (a backend id or path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileReference(pub String);

/// Inbound file handed over by the presentation layer.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("upload '{name}' is {size} bytes, above the {limit} byte limit")]
    TooLarge {
        name: String,
        size: usize,
        limit: usize,
    },
    #[error("unsupported content type '{content_type}' for '{name}'")]
    UnsupportedType { name: String, content_type: String },
    #[error("stored file {0} not found")]
    NotFound(String),
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("storage runtime unavailable: {0}")]
    Runtime(String),
}

/// Operations the enrollment portal requires from any blob backend.
pub trait FileStore: Send + Sync {
    fn save(&self, upload: FileUpload) -> Result<FileReference, StorageError>;

    fn resolve_url(&self, reference: &FileReference) -> Result<String, StorageError>;

    /// Returns whether the reference pointed at stored bytes.
    fn delete(&self, reference: &FileReference) -> Result<bool, StorageError>;
}

fn allowed_content_type(content_type: &Mime) -> bool {
    (content_type.type_() == mime::APPLICATION && content_type.subtype() == mime::PDF)
        || (content_type.type_() == mime::IMAGE
            && (content_type.subtype() == mime::JPEG || content_type.subtype() == mime::PNG))
}

/// Shared gate applied by every backend before persisting bytes.
pub fn validate_upload(upload: &FileUpload) -> Result<(), StorageError> {
    if upload.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(StorageError::TooLarge {
            name: upload.name.clone(),
            size: upload.bytes.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }

    if !allowed_content_type(&upload.content_type) {
        return Err(StorageError::UnsupportedType {
            name: upload.name.clone(),
            content_type: upload.content_type.to_string(),
        });
    }

    Ok(())
}
