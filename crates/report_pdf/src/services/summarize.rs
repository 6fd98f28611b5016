//! Summarization of uploaded files and text chunks through a conversational model.

use log::{debug, warn};
use rayon::prelude::*;

use super::content::{self, ContentPart, FileContent};
use super::{BackendError, ServiceError};

/// Text used when the model answers without any text content.
pub const NO_RESPONSE: &str = "No response generated.";

/// One conversation turn sent to the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryRequest {
    /// Ordered request parts; instruction text comes first.
    pub parts: Vec<ContentPart>,
}

impl SummaryRequest {
    /// Builds a request from instruction text followed by one part per file.
    pub fn from_files(instructions: &str, files: &[FileContent]) -> Self {
        let mut parts = Vec::with_capacity(files.len() + 1);
        parts.push(ContentPart::Text(instructions.to_owned()));
        parts.extend(files.iter().map(content::classify));
        Self { parts }
    }

    /// Builds a request that asks for a summary of a single block of text.
    pub fn from_text(instructions: &str, text: &str) -> Self {
        Self {
            parts: vec![
                ContentPart::Text(instructions.to_owned()),
                ContentPart::Text(text.to_owned()),
            ],
        }
    }
}

/// Conversational model client.
pub trait Summarizer: Send + Sync {
    /// Sends one request. `Ok(None)` means the model returned no text.
    fn converse(&self, request: &SummaryRequest) -> Result<Option<String>, BackendError>;
}

/// Summarizes one request, tagging any failure with `source_id`.
pub fn summarize(
    summarizer: &dyn Summarizer,
    source_id: &str,
    request: &SummaryRequest,
) -> Result<String, ServiceError> {
    match summarizer.converse(request) {
        Ok(Some(text)) => {
            debug!("Summary for {} is {} chars", source_id, text.len());
            Ok(text)
        }
        Ok(None) => Ok(NO_RESPONSE.to_owned()),
        Err(source) => {
            warn!("Summarization of {} failed: {}", source_id, source);
            Err(ServiceError::SummarizationFailed {
                source_id: source_id.to_owned(),
                source,
            })
        }
    }
}

/// Summarizes a set of uploaded files in a single request.
pub fn summarize_files(
    summarizer: &dyn Summarizer,
    instructions: &str,
    files: &[FileContent],
) -> Result<String, ServiceError> {
    let source_id = files
        .iter()
        .map(|file| file.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    summarize(
        summarizer,
        &source_id,
        &SummaryRequest::from_files(instructions, files),
    )
}

/// Summarizes chunks concurrently. Results keep the input order and fail independently.
pub fn summarize_chunks(
    summarizer: &dyn Summarizer,
    instructions: &str,
    chunks: &[String],
) -> Vec<Result<String, ServiceError>> {
    chunks
        .par_iter()
        .enumerate()
        .map(|(index, chunk)| {
            summarize(
                summarizer,
                &format!("chunk {index}"),
                &SummaryRequest::from_text(instructions, chunk),
            )
        })
        .collect()
}
