//! Classification of uploaded files into model request parts.

use serde::Deserialize;

const IMAGE_EXTENSIONS: &[&str] = &["gif", "jpeg", "png", "webp", "jpg"];

/// A file as posted by the frontend: name, declared MIME type and raw bytes.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FileContent {
    /// Original file name including its extension.
    pub name: String,
    /// Declared MIME type.
    #[serde(rename = "type")]
    pub mime_type: String,
    /// File bytes.
    pub content: Vec<u8>,
}

/// Document formats understood by the summarization model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Txt,
    Html,
    Docx,
    Xlsx,
    Csv,
    Xls,
    Doc,
}

impl DocumentFormat {
    /// Maps a MIME type by its subtype; unknown subtypes are treated as plain text.
    pub fn from_mime(mime: &str) -> Self {
        match mime_subtype(mime).as_str() {
            "pdf" => Self::Pdf,
            "txt" => Self::Txt,
            "html" => Self::Html,
            "docx" => Self::Docx,
            "xlsx" => Self::Xlsx,
            "csv" => Self::Csv,
            "xls" => Self::Xls,
            "doc" => Self::Doc,
            _ => Self::Txt,
        }
    }
}

/// Image formats understood by the summarization model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageFormat {
    /// Maps a MIME type by its subtype; unknown subtypes are treated as JPEG.
    pub fn from_mime(mime: &str) -> Self {
        match mime_subtype(mime).as_str() {
            "png" => Self::Png,
            "webp" => Self::Webp,
            "gif" => Self::Gif,
            _ => Self::Jpeg,
        }
    }
}

/// One element of a summarization request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentPart {
    /// Instruction text.
    Text(String),
    /// An image attachment.
    Image {
        /// Image format.
        format: ImageFormat,
        /// Encoded image bytes.
        bytes: Vec<u8>,
    },
    /// A document attachment.
    Document {
        /// Document format.
        format: DocumentFormat,
        /// File name without its extension.
        name: String,
        /// Document bytes.
        bytes: Vec<u8>,
    },
}

fn mime_subtype(mime: &str) -> String {
    mime.split('/')
        .nth(1)
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Removes the last extension of a file name: `lease.final.pdf` becomes `lease.final`.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(index) if index + 1 < name.len() && !name[index + 1..].contains('/') => {
            &name[..index]
        }
        _ => name,
    }
}

/// Returns whether the file name carries an image extension.
pub fn is_image_name(name: &str) -> bool {
    name.rsplit('.')
        .next()
        .map(|extension| IMAGE_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Turns an uploaded file into an image or document part.
pub fn classify(file: &FileContent) -> ContentPart {
    if is_image_name(&file.name) {
        ContentPart::Image {
            format: ImageFormat::from_mime(&file.mime_type),
            bytes: file.content.clone(),
        }
    } else {
        ContentPart::Document {
            format: DocumentFormat::from_mime(&file.mime_type),
            name: strip_extension(&file.name).to_owned(),
            bytes: file.content.clone(),
        }
    }
}
