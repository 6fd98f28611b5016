//! Paginated PDF rendering for property investment reports.
//!
//! A report is a title, a logo and free-form body text. The body is segmented into headings,
//! paragraphs and bullet lists, wrapped greedily against real font metrics and flowed onto A4
//! pages with the logo on top and a `Page N` footer at the bottom of every page.
//!
//! ```no_run
//! use report_pdf::{LogoInput, ReportBuilder};
//!
//! let logo = std::fs::read("logo.png")?;
//! let report = ReportBuilder::new()
//!     .with_title("Investment Report")
//!     .with_body("OVERVIEW\nA quiet duplex near the park.\n\n- Price: $450,000\n- Cap rate: 6.1%")
//!     .with_logo(LogoInput::new(logo, "image/png"))
//!     .render()?;
//! std::fs::write("report.pdf", &report.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod fonts;
pub mod http;
pub mod layout;
pub mod logo;
pub mod metrics;
pub mod pdf;
pub mod segment;
pub mod services;
pub mod wrap;

pub use builder::{render, RenderedReport, ReportBuilder};
pub use config::{BlockStyle, ReportLayout};
pub use error::{ConfigError, LogoError, RenderError};
pub use logo::LogoInput;
