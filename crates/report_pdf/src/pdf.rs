//! Draws a [`LayoutPlan`] onto genpdf pages and serializes the document.
//!
//! genpdf areas use a top-left origin measured in millimetres, so every Y coordinate from the plan
//! is flipped against the page height here and nowhere else.

use genpdf::fonts::FontCache;
use genpdf::render::{Area, Renderer};
use genpdf::{Position, Rotation, Scale, Size};

use crate::error::RenderError;
use crate::layout::{LayoutPlan, PagePlan, TextRun};
use crate::logo::Logo;
use crate::metrics::{mm_from_pt, text_style};

// At 72 dpi one image pixel is one point before scaling.
const LOGO_DPI: f64 = 72.0;

/// Renders the plan into PDF bytes using the fonts in `font_cache`.
pub fn emit_plan(
    plan: &LayoutPlan,
    document_title: &str,
    logo: &Logo,
    font_cache: &mut FontCache,
) -> Result<Vec<u8>, RenderError> {
    let page_size = Size::new(mm_from_pt(plan.page_width), mm_from_pt(plan.page_height));
    let mut renderer = Renderer::new(page_size, document_title).map_err(RenderError::Pdf)?;
    for _ in 1..plan.page_count() {
        renderer.add_page(page_size);
    }

    font_cache
        .load_pdf_fonts(&renderer)
        .map_err(RenderError::FontEmbedding)?;

    for (index, page_plan) in plan.pages.iter().enumerate() {
        let page = renderer.get_page(index).ok_or_else(|| RenderError::OutOfBounds {
            page: page_plan.number,
            text: String::from("<page missing from renderer>"),
        })?;
        let area = page.first_layer().area();
        draw_logo(&area, plan.page_height, page_plan, logo);
        for run in &page_plan.runs {
            draw_run(&area, plan.page_height, page_plan.number, run, font_cache)?;
        }
    }

    let mut bytes = Vec::new();
    renderer.write(&mut bytes).map_err(RenderError::Pdf)?;
    Ok(bytes)
}

fn draw_logo(area: &Area<'_>, page_height: f64, page_plan: &PagePlan, logo: &Logo) {
    let placement = page_plan.logo;
    let (pixel_width, _) = logo.pixel_size();
    let scale = placement.width / f64::from(pixel_width);
    // Images are anchored at their bottom-left corner.
    let position = Position::new(
        mm_from_pt(placement.x),
        mm_from_pt(page_height - placement.y),
    );
    area.add_image(
        logo.image(),
        position,
        Scale::new(scale, scale),
        Rotation::from_degrees(0.0),
        Some(LOGO_DPI),
    );
}

fn draw_run(
    area: &Area<'_>,
    page_height: f64,
    page_number: usize,
    run: &TextRun,
    font_cache: &FontCache,
) -> Result<(), RenderError> {
    let style = text_style(run.weight, run.size);
    // genpdf puts the baseline one glyph height below the given position.
    let glyph_height = style.font(font_cache).glyph_height(run.size);
    let position = Position::new(
        mm_from_pt(run.x),
        mm_from_pt(page_height - run.y) - glyph_height,
    );

    let printed = area
        .print_str(font_cache, position, style, &run.text)
        .map_err(RenderError::Pdf)?;
    if printed {
        Ok(())
    } else {
        Err(RenderError::OutOfBounds {
            page: page_number,
            text: run.text.clone(),
        })
    }
}
