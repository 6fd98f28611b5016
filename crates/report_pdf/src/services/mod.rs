//! Seams for the external services that produce report text.
//!
//! The renderer never talks to these services itself. They are modelled as traits so callers can
//! construct one client per process and pass it in by reference.

pub mod content;
pub mod knowledge;
pub mod summarize;
pub mod upload;

use thiserror::Error;

/// Error type returned by service client implementations.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of one unit of collaborator work, tagged with the unit it belongs to.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storing a file failed.
    #[error("upload of `{file_name}` failed: {source}")]
    UploadFailed {
        /// Name of the file that could not be stored.
        file_name: String,
        /// Error reported by the storage client.
        #[source]
        source: BackendError,
    },

    /// A summarization request failed.
    #[error("summarization of {source_id} failed: {source}")]
    SummarizationFailed {
        /// Identity of the summarized input, such as a file name or chunk index.
        source_id: String,
        /// Error reported by the model client.
        #[source]
        source: BackendError,
    },

    /// A knowledge-base query failed.
    #[error("knowledge base query failed: {0}")]
    Retrieval(#[source] BackendError),
}

pub use content::{ContentPart, DocumentFormat, FileContent, ImageFormat};
pub use knowledge::{
    ingest, ingest_blocking, wait_for_ingestion, IngestionError, IngestionStatus, JobId,
    KnowledgeBase, RetryPolicy,
};
pub use summarize::{summarize, summarize_chunks, SummaryRequest, Summarizer};
pub use upload::{upload_all, ObjectStore, UploadFile, UploadOutcome, UploadStatus};
