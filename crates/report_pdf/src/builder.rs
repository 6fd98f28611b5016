//! Report construction entry point.

use genpdf::error::ErrorKind;
use genpdf::fonts::{FontCache, FontData, FontFamily};
use log::{debug, warn};

use crate::config::ReportLayout;
use crate::error::RenderError;
use crate::fonts;
use crate::layout::{self, LayoutPlan};
use crate::logo::{Logo, LogoInput};
use crate::metrics::GenpdfMeasure;
use crate::pdf;

/// A finished report.
#[derive(Clone, Debug)]
pub struct RenderedReport {
    /// Serialized PDF document.
    pub bytes: Vec<u8>,
    /// Number of pages in the document.
    pub page_count: usize,
}

/// Builder for a single report render.
#[derive(Default)]
pub struct ReportBuilder {
    title: String,
    body: String,
    logo: Option<LogoInput>,
    layout: Option<ReportLayout>,
    font_family: Option<FontFamily<FontData>>,
}

impl ReportBuilder {
    /// Creates a builder with an empty title and body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title drawn on page 1.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the free-form body text.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the caller-supplied logo. Unsupported or broken logos fall back to the default.
    pub fn with_logo(mut self, logo: impl Into<Option<LogoInput>>) -> Self {
        self.logo = logo.into();
        self
    }

    /// Overrides the page geometry and styles.
    pub fn with_layout(mut self, layout: ReportLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Uses the given font family instead of searching for the bundled fonts.
    pub fn with_font_family(mut self, family: FontFamily<FontData>) -> Self {
        self.font_family = Some(family);
        self
    }

    /// Lays the report out without producing PDF output.
    pub fn plan(self) -> Result<LayoutPlan, RenderError> {
        let prepared = self.prepare()?;
        Ok(prepared.plan())
    }

    /// Lays the report out and serializes it to PDF.
    ///
    /// Text outside Windows-1252 cannot be drawn with the built-in Helvetica faces. When that
    /// happens with the default font search, the render is repeated with embedded fonts.
    pub fn render(self) -> Result<RenderedReport, RenderError> {
        let mut prepared = self.prepare()?;
        let mut plan = prepared.plan();
        let bytes = match prepared.emit(&plan) {
            Err(RenderError::Pdf(err))
                if prepared.can_embed() && matches!(err.kind(), ErrorKind::UnsupportedEncoding) =>
            {
                warn!("Report text needs embedded fonts: {}", err);
                let family =
                    fonts::default_font_family(true).map_err(RenderError::FontUnavailable)?;
                prepared.font_cache = FontCache::new(family);
                plan = prepared.plan();
                prepared.emit(&plan)?
            }
            result => result?,
        };

        debug!(
            "Rendered report '{}' with {} page(s), {} bytes",
            prepared.title,
            plan.page_count(),
            bytes.len()
        );

        Ok(RenderedReport {
            bytes,
            page_count: plan.page_count(),
        })
    }

    fn prepare(self) -> Result<Prepared, RenderError> {
        let layout = self.layout.unwrap_or_default();
        layout.validate()?;

        let custom_family = self.font_family.is_some();
        let family = match self.font_family {
            Some(family) => family,
            None => fonts::default_font_family(layout.embed_fonts)
                .map_err(RenderError::FontUnavailable)?,
        };

        Ok(Prepared {
            logo: Logo::resolve(self.logo.as_ref()),
            font_cache: FontCache::new(family),
            title: self.title,
            body: self.body,
            layout,
            custom_family,
        })
    }
}

struct Prepared {
    title: String,
    body: String,
    logo: Logo,
    layout: ReportLayout,
    font_cache: FontCache,
    custom_family: bool,
}

impl Prepared {
    fn plan(&self) -> LayoutPlan {
        let measure = GenpdfMeasure::new(&self.font_cache);
        let logo_height = self.logo.display_height(self.layout.logo_width);
        layout::plan_report(&self.layout, &measure, &self.title, &self.body, logo_height)
    }

    fn emit(&mut self, plan: &LayoutPlan) -> Result<Vec<u8>, RenderError> {
        pdf::emit_plan(plan, &self.title, &self.logo, &mut self.font_cache)
    }

    // Caller-supplied families are used as given.
    fn can_embed(&self) -> bool {
        !self.layout.embed_fonts && !self.custom_family
    }
}

/// Renders a report with the default layout.
pub fn render(
    title: &str,
    body: &str,
    logo: Option<LogoInput>,
) -> Result<RenderedReport, RenderError> {
    ReportBuilder::new()
        .with_title(title)
        .with_body(body)
        .with_logo(logo)
        .render()
}
