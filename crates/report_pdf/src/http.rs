//! Request and response mapping for the report endpoints.
//!
//! Handlers take the raw request body and return a transport-neutral [`HttpResponse`], so they can
//! sit behind any server framework.

use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::builder::ReportBuilder;
use crate::config::ReportLayout;
use crate::logo::LogoInput;
use crate::services::content::FileContent;
use crate::services::knowledge::{self, KnowledgeBase};
use crate::services::summarize::{self, Summarizer};

/// Title used when the request does not name one.
pub const DEFAULT_REPORT_TITLE: &str = "Investment Report";

/// Prompt used by the summarize endpoint when the request carries none.
pub const DEFAULT_SUMMARY_PROMPT: &str = "Summarize the attached documents for a real-estate investment report. \
Start each section with an uppercase heading line and list key figures as bullet points starting with '-'.";

const PDF_FILE_NAME: &str = "report.pdf";

const SERIALIZATION_FAILURE_BODY: &[u8] = br#"{"error":"Internal server error"}"#;

/// Body of a report download request.
#[derive(Clone, Debug, Deserialize)]
pub struct ReportRequest {
    /// Report body text, segmented into headings, paragraphs and bullets.
    pub summary: String,
    /// Raw logo bytes, sent as a JSON array of numbers.
    #[serde(default)]
    pub logo: Option<Vec<u8>>,
    /// MIME type of `logo`, such as `image/png`.
    #[serde(default, rename = "logoType")]
    pub logo_type: Option<String>,
    /// Title drawn on page 1.
    #[serde(default)]
    pub title: Option<String>,
}

impl ReportRequest {
    /// Title to draw, falling back to [`DEFAULT_REPORT_TITLE`].
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_REPORT_TITLE)
    }

    /// Logo to use. Bytes without a declared type resolve to the default logo at render time.
    pub fn logo_input(&self) -> Option<LogoInput> {
        self.logo.as_ref().map(|bytes| {
            LogoInput::new(bytes.clone(), self.logo_type.as_deref().unwrap_or_default())
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
struct SummarizeRequest {
    files: Vec<FileContent>,
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct AskRequest {
    prompt: String,
}

#[derive(Serialize)]
struct SummaryBody<'a> {
    summary: &'a str,
}

/// JSON error payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable failure description.
    pub error: String,
}

/// A status code, headers and body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Header names and values in insertion order.
    pub headers: Vec<(String, String)>,
    /// Response payload: JSON for every status except a successful PDF download.
    pub body: Vec<u8>,
}

impl HttpResponse {
    fn json<T: Serialize>(status: u16, payload: &T) -> Self {
        let (status, body) = match serde_json::to_vec(payload) {
            Ok(body) => (status, body),
            Err(err) => {
                error!("Failed to serialize response body: {}", err);
                (500, SERIALIZATION_FAILURE_BODY.to_vec())
            }
        };
        Self {
            status,
            headers: vec![("Content-Type".to_owned(), "application/json".to_owned())],
            body,
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(
            status,
            &ErrorBody {
                error: message.to_owned(),
            },
        )
    }

    fn pdf(bytes: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: vec![
                ("Content-Type".to_owned(), "application/pdf".to_owned()),
                (
                    "Content-Disposition".to_owned(),
                    format!("attachment; filename={PDF_FILE_NAME}"),
                ),
            ],
            body: bytes,
        }
    }

    /// Returns the first header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn parse<'de, T: Deserialize<'de>>(body: &'de [u8]) -> Result<T, HttpResponse> {
    serde_json::from_slice(body).map_err(|err| {
        warn!("Rejected malformed request body: {}", err);
        HttpResponse::error(400, &format!("Invalid request body: {err}"))
    })
}

/// Renders the report described by a JSON body.
pub fn handle_pdf_request(body: &[u8], layout: &ReportLayout) -> HttpResponse {
    let request: ReportRequest = match parse(body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let rendered = ReportBuilder::new()
        .with_title(request.title())
        .with_body(request.summary.as_str())
        .with_logo(request.logo_input())
        .with_layout(layout.clone())
        .render();

    match rendered {
        Ok(report) => HttpResponse::pdf(report.bytes),
        Err(err) => {
            error!("Failed to generate PDF: {}", err);
            HttpResponse::error(500, "Failed to generate PDF")
        }
    }
}

/// Summarizes the posted files.
pub fn handle_summarize_request(body: &[u8], summarizer: &dyn Summarizer) -> HttpResponse {
    let request: SummarizeRequest = match parse(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let prompt = request.prompt.as_deref().unwrap_or(DEFAULT_SUMMARY_PROMPT);

    match summarize::summarize_files(summarizer, prompt, &request.files) {
        Ok(summary) => HttpResponse::json(200, &SummaryBody { summary: &summary }),
        Err(err) => {
            error!("{}", err);
            HttpResponse::error(500, "Failed to generate summary")
        }
    }
}

/// Answers a question from the knowledge base, with citations.
pub fn handle_ask_request(body: &[u8], knowledge_base: &dyn KnowledgeBase) -> HttpResponse {
    let request: AskRequest = match parse(body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match knowledge::ask(knowledge_base, &request.prompt) {
        Ok(answer) => HttpResponse::json(200, &answer),
        Err(err) => {
            error!("{}", err);
            HttpResponse::error(500, "Failed to query knowledge base")
        }
    }
}
