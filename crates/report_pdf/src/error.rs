//! Error types shared by the renderer, the logo pipeline and the layout configuration.

use std::io;

use thiserror::Error;

/// Fatal failures of a single render call.
///
/// No partial document is ever returned when one of these is raised.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Neither the bundled fonts nor any fallback family could be loaded.
    #[error("font set unavailable: {0}")]
    FontUnavailable(#[source] genpdf::error::Error),

    /// The fonts were loaded but could not be embedded into the PDF document.
    #[error("failed to embed font set into the document: {0}")]
    FontEmbedding(#[source] genpdf::error::Error),

    /// The PDF backend rejected a drawing or serialization step.
    #[error("failed to produce PDF output: {0}")]
    Pdf(#[source] genpdf::error::Error),

    /// A planned text run fell outside the drawable page area.
    #[error("text run on page {page} does not fit on the page: {text:?}")]
    OutOfBounds {
        /// 1-based page number of the offending run.
        page: usize,
        /// The text that could not be placed.
        text: String,
    },

    /// The layout configuration leaves no room for content.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Recoverable logo problems. The renderer substitutes the default logo for all of them.
#[derive(Debug, Error)]
pub enum LogoError {
    /// The declared MIME type is neither PNG nor JPEG.
    #[error("unsupported logo format `{0}`")]
    UnsupportedLogoFormat(String),

    /// The bytes did not decode as the declared format.
    #[error("failed to decode logo image: {0}")]
    Decode(#[from] image::ImageError),

    /// The image decoded to a zero-sized bitmap.
    #[error("logo image has no pixels")]
    Empty,
}

/// Problems loading or validating a [`crate::config::ReportLayout`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The layout file could not be read.
    #[error("failed to read layout file: {0}")]
    Io(#[from] io::Error),

    /// The layout file is not valid TOML for the layout schema.
    #[error("failed to parse layout file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The geometry leaves no drawable area.
    #[error("invalid layout: {0}")]
    Invalid(String),
}
