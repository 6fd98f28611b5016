//! Page geometry and typographic settings for rendered reports.
//!
//! All lengths are PDF points. [`ReportLayout::default`] reproduces the A4 report used by the
//! web frontend; a TOML file can override any subset of the fields.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::metrics::FontWeight;
use crate::segment::BlockKind;

/// A4 page width in points.
pub const A4_WIDTH_PT: f64 = 595.28;
/// A4 page height in points.
pub const A4_HEIGHT_PT: f64 = 841.89;

/// Font, size, line height and indentation for one kind of text.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BlockStyle {
    /// Face used for the text.
    pub weight: FontWeight,
    /// Font size in points.
    pub size: u8,
    /// Vertical advance after each line.
    pub line_height: f64,
    /// Left indentation relative to the margin.
    pub indent: f64,
}

impl BlockStyle {
    /// Creates a style with a 1.5× line height and no indentation.
    pub fn new(weight: FontWeight, size: u8) -> Self {
        Self {
            weight,
            size,
            line_height: f64::from(size) * 1.5,
            indent: 0.0,
        }
    }

    /// Sets the indentation and returns the updated style.
    pub fn with_indent(mut self, indent: f64) -> Self {
        self.indent = indent;
        self
    }
}

impl Default for BlockStyle {
    fn default() -> Self {
        Self::new(FontWeight::Regular, 12)
    }
}

/// Complete layout description consumed by [`crate::layout::PageFlow`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportLayout {
    /// Page width.
    pub page_width: f64,
    /// Page height.
    pub page_height: f64,
    /// Margin applied on all four sides.
    pub margin: f64,
    /// Display width of the logo; the height follows the image aspect ratio.
    pub logo_width: f64,
    /// Gap between the bottom of the logo and the first line below it.
    pub header_gap: f64,
    /// Style of the page-1 title.
    pub title: BlockStyle,
    /// Extra space between the title line and the body.
    pub title_gap: f64,
    /// Style of section headings.
    pub heading: BlockStyle,
    /// Style of paragraphs.
    pub paragraph: BlockStyle,
    /// Style of bullet items.
    pub bullet: BlockStyle,
    /// Style of the `Page N` footer.
    pub footer: BlockStyle,
    /// Space added after a block that requests it.
    pub paragraph_spacing: f64,
    /// Embed the TrueType fonts instead of referencing the built-in Helvetica faces.
    pub embed_fonts: bool,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            page_width: A4_WIDTH_PT,
            page_height: A4_HEIGHT_PT,
            margin: 50.0,
            logo_width: 120.0,
            header_gap: 24.0,
            title: BlockStyle::new(FontWeight::Bold, 24),
            title_gap: 10.0,
            heading: BlockStyle::new(FontWeight::Bold, 16),
            paragraph: BlockStyle::new(FontWeight::Regular, 12),
            bullet: BlockStyle::new(FontWeight::Regular, 12).with_indent(20.0),
            footer: BlockStyle::new(FontWeight::Regular, 10),
            paragraph_spacing: 10.0,
            embed_fonts: false,
        }
    }
}

impl ReportLayout {
    /// Loads a layout from a TOML file. Missing keys keep their default values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses a layout from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let layout: ReportLayout = toml::from_str(content)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Returns the style used for a content block kind.
    pub fn style_for(&self, kind: BlockKind) -> &BlockStyle {
        match kind {
            BlockKind::Heading => &self.heading,
            BlockKind::Paragraph => &self.paragraph,
            BlockKind::BulletItem => &self.bullet,
        }
    }

    /// Width available to a line with the given indentation.
    pub fn available_width(&self, indent: f64) -> f64 {
        self.page_width - 2.0 * self.margin - indent
    }

    /// Vertical space taken on page 1 by the title line and its gap.
    pub fn title_block(&self) -> f64 {
        self.title.line_height + self.title_gap
    }

    /// Baseline of the first body line on the given 1-based page.
    pub fn content_top(&self, page_number: usize, logo_height: f64) -> f64 {
        let below_logo = self.page_height - self.margin - logo_height - self.header_gap;
        if page_number == 1 {
            below_logo - self.title_block()
        } else {
            below_logo
        }
    }

    /// Tallest display height a logo may take while page 1 still fits one line of every body style.
    pub fn max_logo_height(&self) -> f64 {
        let tallest_line = [self.heading, self.paragraph, self.bullet]
            .iter()
            .map(|style| style.line_height)
            .fold(0.0, f64::max);
        self.page_height
            - 2.0 * self.margin
            - self.header_gap
            - self.title_block()
            - tallest_line
    }

    /// Rejects geometries that leave no room for body text.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.page_width > 0.0 && self.page_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "page size must be positive, got {}x{}",
                self.page_width, self.page_height
            )));
        }
        if self.margin < 0.0 || self.logo_width <= 0.0 {
            return Err(ConfigError::Invalid(
                "margin must be non-negative and logo width positive".to_owned(),
            ));
        }

        for (name, style) in [
            ("title", &self.title),
            ("heading", &self.heading),
            ("paragraph", &self.paragraph),
            ("bullet", &self.bullet),
            ("footer", &self.footer),
        ] {
            if style.size == 0 || style.line_height <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} style needs a positive size and line height"
                )));
            }
            if self.available_width(style.indent) <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} style leaves no horizontal space inside the margins"
                )));
            }
        }

        if self.logo_width > self.page_width - 2.0 * self.margin {
            return Err(ConfigError::Invalid(
                "logo is wider than the space between the margins".to_owned(),
            ));
        }

        if self.max_logo_height() <= 0.0 {
            return Err(ConfigError::Invalid(
                "page is too short for the logo, the title and a line of body text".to_owned(),
            ));
        }

        Ok(())
    }
}
