//! Page flow: turns segmented report text into positioned runs on fixed-size pages.
//!
//! Coordinates use a bottom-left origin with Y growing upwards, in points. The flow keeps a single
//! cursor on the active page. Before a line is drawn the cursor is checked against
//! `margin + line_height`; when the line would not fit, the current page receives its footer and
//! a new page is started below its logo. The final footer is drawn by [`PageFlow::finish`].

use log::debug;

use crate::config::{BlockStyle, ReportLayout};
use crate::metrics::{FontWeight, TextMeasure};
use crate::segment::{self, BlockKind, ContentBlock};
use crate::wrap;

// Absorbs rounding drift from repeatedly subtracting line heights.
const CURSOR_EPSILON: f64 = 1e-6;

/// What a text run represents on the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunRole {
    /// The page-1 report title.
    Title,
    /// A section heading line.
    Heading,
    /// A paragraph line.
    Paragraph,
    /// A bullet item line.
    Bullet,
    /// The `Page N` label.
    Footer,
}

impl From<BlockKind> for RunRole {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Heading => Self::Heading,
            BlockKind::Paragraph => Self::Paragraph,
            BlockKind::BulletItem => Self::Bullet,
        }
    }
}

/// A rectangle in page coordinates; `(x, y)` is its bottom-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Left edge.
    pub x: f64,
    /// Bottom edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// A single line of text at a fixed baseline position.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    /// What the run represents.
    pub role: RunRole,
    /// The text, already wrapped.
    pub text: String,
    /// Left edge of the run.
    pub x: f64,
    /// Baseline.
    pub y: f64,
    /// Face used.
    pub weight: FontWeight,
    /// Font size in points.
    pub size: u8,
    /// Measured width of the text.
    pub width: f64,
}

/// Everything drawn on one page.
#[derive(Clone, Debug, PartialEq)]
pub struct PagePlan {
    /// 1-based page number.
    pub number: usize,
    /// Where the logo is drawn.
    pub logo: Placement,
    /// Text runs in drawing order. The footer is always the last run of a finished page.
    pub runs: Vec<TextRun>,
}

impl PagePlan {
    /// Returns the footer run.
    pub fn footer(&self) -> Option<&TextRun> {
        self.runs.iter().find(|run| run.role == RunRole::Footer)
    }

    /// Returns the runs that come from the report body.
    pub fn body_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.runs
            .iter()
            .filter(|run| !matches!(run.role, RunRole::Title | RunRole::Footer))
    }
}

/// The positioned content of a whole report.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutPlan {
    /// Page width in points.
    pub page_width: f64,
    /// Page height in points.
    pub page_height: f64,
    /// Pages in creation order.
    pub pages: Vec<PagePlan>,
}

impl LayoutPlan {
    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Footer labels of all pages in order.
    pub fn footer_labels(&self) -> Vec<&str> {
        self.pages
            .iter()
            .filter_map(|page| page.footer().map(|run| run.text.as_str()))
            .collect()
    }

    /// All body runs across pages in reading order.
    pub fn body_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.pages.iter().flat_map(PagePlan::body_runs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FlowState {
    FirstPageBody,
    ContinuationBody,
}

/// Mutable layout state for one render call.
pub struct PageFlow<'a> {
    layout: &'a ReportLayout,
    measure: &'a dyn TextMeasure,
    logo_width: f64,
    logo_height: f64,
    pages: Vec<PagePlan>,
    cursor_y: f64,
    state: FlowState,
}

impl<'a> PageFlow<'a> {
    /// Starts page 1 with its logo and centred title.
    ///
    /// `logo_height` is the display height of the logo at `layout.logo_width`. A logo taller than
    /// [`ReportLayout::max_logo_height`] is scaled down, keeping its aspect ratio.
    pub fn begin(
        layout: &'a ReportLayout,
        measure: &'a dyn TextMeasure,
        title: &str,
        logo_height: f64,
    ) -> Self {
        let max_height = layout.max_logo_height();
        let (logo_width, logo_height) = if logo_height > max_height {
            debug!("Logo height {logo_height:.2} exceeds {max_height:.2}, scaling it down");
            (layout.logo_width * max_height / logo_height, max_height)
        } else {
            (layout.logo_width, logo_height)
        };

        let mut flow = Self {
            layout,
            measure,
            logo_width,
            logo_height,
            pages: Vec::new(),
            cursor_y: 0.0,
            state: FlowState::FirstPageBody,
        };
        flow.open_page();

        let title_style = layout.title;
        let baseline = layout.page_height
            - layout.margin
            - flow.logo_height
            - layout.header_gap
            - f64::from(title_style.size);
        let run = flow.centered_run(RunRole::Title, title, &title_style, baseline);
        flow.current_page().runs.push(run);

        flow
    }

    /// Number of the page currently being filled.
    pub fn page_number(&self) -> usize {
        self.pages.len()
    }

    /// Wraps and draws a content block, then applies its trailing spacing.
    pub fn push_block(&mut self, block: &ContentBlock) {
        let style = *self.layout.style_for(block.kind);
        let width = self.layout.available_width(style.indent);
        let role = RunRole::from(block.kind);

        for line in wrap::wrap_text(&block.text, width, self.measure, style.weight, style.size) {
            self.emit_line(role, &line, &style);
        }

        if block.spacing_after {
            self.cursor_y -= self.layout.paragraph_spacing;
        }
    }

    /// Draws one pre-wrapped line at the cursor, breaking the page first if it would not fit.
    pub fn emit_line(&mut self, role: RunRole, text: &str, style: &BlockStyle) {
        if self.cursor_y < self.layout.margin + style.line_height - CURSOR_EPSILON {
            self.break_page();
        }

        let run = TextRun {
            role,
            text: text.to_owned(),
            x: self.layout.margin + style.indent,
            y: self.cursor_y,
            weight: style.weight,
            size: style.size,
            width: self.measure.measure(style.weight, text, style.size),
        };
        self.current_page().runs.push(run);
        self.cursor_y -= style.line_height;
    }

    /// Closes the flow, drawing the footer of the last page.
    pub fn finish(mut self) -> LayoutPlan {
        self.close_page();
        LayoutPlan {
            page_width: self.layout.page_width,
            page_height: self.layout.page_height,
            pages: self.pages,
        }
    }

    fn break_page(&mut self) {
        self.close_page();
        self.state = FlowState::ContinuationBody;
        self.open_page();
        debug!(
            "Page break: continuing on page {} at y={:.2}",
            self.page_number(),
            self.cursor_y
        );
    }

    fn open_page(&mut self) {
        let number = self.pages.len() + 1;
        let layout = self.layout;
        let logo = Placement {
            x: (layout.page_width - self.logo_width) / 2.0,
            y: layout.page_height - layout.margin - self.logo_height,
            width: self.logo_width,
            height: self.logo_height,
        };
        self.pages.push(PagePlan {
            number,
            logo,
            runs: Vec::new(),
        });

        let page_for_top = match self.state {
            FlowState::FirstPageBody => 1,
            FlowState::ContinuationBody => number,
        };
        self.cursor_y = layout.content_top(page_for_top, self.logo_height);
    }

    fn close_page(&mut self) {
        let number = self.page_number();
        let footer_style = self.layout.footer;
        let run = self.centered_run(
            RunRole::Footer,
            &format!("Page {number}"),
            &footer_style,
            self.layout.margin,
        );
        self.current_page().runs.push(run);
    }

    // Text wider than the page starts at the left margin.
    fn centered_run(&self, role: RunRole, text: &str, style: &BlockStyle, y: f64) -> TextRun {
        let width = self.measure.measure(style.weight, text, style.size);
        TextRun {
            role,
            text: text.to_owned(),
            x: ((self.layout.page_width - width) / 2.0).max(self.layout.margin),
            y,
            weight: style.weight,
            size: style.size,
            width,
        }
    }

    fn current_page(&mut self) -> &mut PagePlan {
        let index = self.pages.len() - 1;
        &mut self.pages[index]
    }
}

/// Lays out a complete report: title, segmented body and footers.
pub fn plan_report(
    layout: &ReportLayout,
    measure: &dyn TextMeasure,
    title: &str,
    body: &str,
    logo_height: f64,
) -> LayoutPlan {
    let mut flow = PageFlow::begin(layout, measure, title, logo_height);
    for block in segment::segment(body) {
        flow.push_block(&block);
    }
    flow.finish()
}
