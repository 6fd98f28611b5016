//! Concurrent upload of report source files to object storage.

use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;

use super::{BackendError, ServiceError};

/// A file to store, keyed by its original name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    /// Object key; the original file name.
    pub name: String,
    /// MIME type recorded with the object.
    pub content_type: String,
    /// File bytes.
    pub bytes: Vec<u8>,
}

/// Object storage client.
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `key`.
    fn put_object(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), BackendError>;
}

/// Result state of a single upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UploadStatus {
    Uploaded,
    Failed,
}

/// Per-file upload result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    /// Name of the uploaded file.
    pub file_name: String,
    /// Whether the upload succeeded.
    pub status: UploadStatus,
    /// Error message for failed uploads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn upload_each<'f>(
    store: &dyn ObjectStore,
    files: &'f [UploadFile],
) -> Vec<(&'f UploadFile, Result<(), BackendError>)> {
    files
        .par_iter()
        .map(|file| {
            let result = store.put_object(&file.name, &file.bytes, &file.content_type);
            (file, result)
        })
        .collect()
}

/// Uploads every file concurrently. A failed upload does not affect its siblings.
pub fn upload_all(store: &dyn ObjectStore, files: &[UploadFile]) -> Vec<UploadOutcome> {
    upload_each(store, files)
        .into_iter()
        .map(|(file, result)| match result {
            Ok(()) => {
                debug!("Uploaded {} ({} bytes)", file.name, file.bytes.len());
                UploadOutcome {
                    file_name: file.name.clone(),
                    status: UploadStatus::Uploaded,
                    error: None,
                }
            }
            Err(err) => {
                warn!("Upload of {} failed: {}", file.name, err);
                UploadOutcome {
                    file_name: file.name.clone(),
                    status: UploadStatus::Failed,
                    error: Some(err.to_string()),
                }
            }
        })
        .collect()
}

/// Uploads every file concurrently and fails with the first failed file, in input order.
pub fn upload_all_or_nothing(
    store: &dyn ObjectStore,
    files: &[UploadFile],
) -> Result<Vec<String>, ServiceError> {
    upload_each(store, files)
        .into_iter()
        .map(|(file, result)| {
            result
                .map(|()| file.name.clone())
                .map_err(|source| ServiceError::UploadFailed {
                    file_name: file.name.clone(),
                    source,
                })
        })
        .collect()
}
