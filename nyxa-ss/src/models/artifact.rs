//! Uploaded screenshot artifacts

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Attributes the input validator looks at
///
/// The declared MIME type is trusted as-is; the bytes are never sniffed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    pub declared_mime: String,
    pub size_bytes: u64,
}

/// Screenshot accepted from the file input boundary
///
/// Bytes are shared so the background classification task can hold a
/// handle while the session keeps its own.
#[derive(Clone)]
pub struct UploadedArtifact {
    file_name: Option<String>,
    declared_mime: String,
    bytes: Arc<[u8]>,
    uploaded_at: DateTime<Utc>,
}

/// Byte-free view of an artifact for API responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSummary {
    pub file_name: Option<String>,
    pub declared_mime: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedArtifact {
    pub fn new(file_name: Option<String>, declared_mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name,
            declared_mime: declared_mime.into(),
            bytes: Arc::from(bytes),
            uploaded_at: Utc::now(),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn declared_mime(&self) -> &str {
        &self.declared_mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn descriptor(&self) -> FileDescriptor {
        FileDescriptor {
            declared_mime: self.declared_mime.clone(),
            size_bytes: self.size_bytes(),
        }
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            file_name: self.file_name.clone(),
            declared_mime: self.declared_mime.clone(),
            size_bytes: self.size_bytes(),
            uploaded_at: self.uploaded_at,
        }
    }
}

impl std::fmt::Debug for UploadedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedArtifact")
            .field("file_name", &self.file_name)
            .field("declared_mime", &self.declared_mime)
            .field("size_bytes", &self.bytes.len())
            .field("uploaded_at", &self.uploaded_at)
            .finish()
    }
}
