//! Font-metrics abstraction used by the line wrapper and the page flow.
//!
//! Layout is computed in PDF points with a bottom-left origin. The genpdf backend works in
//! millimetres, so the conversion helpers live here next to the measurer that needs them.

use genpdf::fonts::FontCache;
use genpdf::style::{Style, StyledString};
use genpdf::Mm;
use serde::Deserialize;

/// Number of PDF points in one millimetre.
pub const PT_PER_MM: f64 = 72.0 / 25.4;

/// The two faces of the report font set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    /// Body text face.
    #[default]
    Regular,
    /// Title and heading face.
    Bold,
}

/// Measures the advance width of a run of text.
pub trait TextMeasure {
    /// Returns the width of `text` in points when set in `weight` at `size` points.
    fn measure(&self, weight: FontWeight, text: &str, size: u8) -> f64;
}

/// Converts a length in points into a genpdf [`Mm`].
pub fn mm_from_pt(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value / PT_PER_MM))
}

/// Converts a genpdf [`Mm`] into points.
pub fn mm_to_pt(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0 * PT_PER_MM
}

/// Builds the genpdf style matching a weight and size.
pub fn text_style(weight: FontWeight, size: u8) -> Style {
    let mut style = Style::new().with_font_size(size);
    if weight == FontWeight::Bold {
        style.set_bold();
    }
    style
}

/// Measures text with the fonts loaded into a genpdf [`FontCache`].
pub struct GenpdfMeasure<'a> {
    cache: &'a FontCache,
}

impl<'a> GenpdfMeasure<'a> {
    /// Wraps the given font cache.
    pub fn new(cache: &'a FontCache) -> Self {
        Self { cache }
    }
}

impl TextMeasure for GenpdfMeasure<'_> {
    fn measure(&self, weight: FontWeight, text: &str, size: u8) -> f64 {
        let string = StyledString::new(text.to_owned(), text_style(weight, size));
        mm_to_pt(string.width(self.cache))
    }
}

/// Fixed-advance measure where every character is `advance * size` points wide.
///
/// Layout results computed with it do not depend on any font file, which makes it handy for
/// previews and for exercising pagination deterministically.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvance {
    /// Advance width as a fraction of the font size.
    pub advance: f64,
    /// Extra widening applied to bold text, as a fraction of the regular advance.
    pub bold_extra: f64,
}

impl FixedAdvance {
    /// Creates a measure with the given advance and no bold widening.
    pub fn new(advance: f64) -> Self {
        Self {
            advance,
            bold_extra: 0.0,
        }
    }
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl TextMeasure for FixedAdvance {
    fn measure(&self, weight: FontWeight, text: &str, size: u8) -> f64 {
        let per_char = match weight {
            FontWeight::Regular => self.advance,
            FontWeight::Bold => self.advance * (1.0 + self.bold_extra),
        };
        text.chars().count() as f64 * per_char * f64::from(size)
    }
}
