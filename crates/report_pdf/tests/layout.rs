use report_pdf::layout::{plan_report, LayoutPlan, RunRole};
use report_pdf::logo::Logo;
use report_pdf::metrics::{FixedAdvance, FontWeight, TextMeasure};
use report_pdf::ReportLayout;

const LOGO_HEIGHT: f64 = 30.0;

/// A page whose first body baseline sits at 650 on page 1 and 700 on later pages, with paragraph
/// lines 18pt apart and a bottom limit of 68.
fn grid_layout() -> ReportLayout {
    ReportLayout {
        page_width: 600.0,
        page_height: 800.0,
        margin: 50.0,
        header_gap: 20.0,
        title_gap: 14.0,
        ..ReportLayout::default()
    }
}

fn numbered_lines(count: usize) -> String {
    (1..=count)
        .map(|index| format!("line {index}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn plan(layout: &ReportLayout, body: &str) -> LayoutPlan {
    plan_report(layout, &FixedAdvance::default(), "Investment Report", body, LOGO_HEIGHT)
}

fn lines_that_fit(top: f64, layout: &ReportLayout, line_height: f64) -> usize {
    ((top - layout.margin - line_height) / line_height + 1e-9).floor() as usize + 1
}

#[test]
fn grid_geometry_matches_expectations() {
    let layout = grid_layout();
    assert_eq!(layout.content_top(1, LOGO_HEIGHT), 650.0);
    assert_eq!(layout.content_top(2, LOGO_HEIGHT), 700.0);
    assert_eq!(layout.paragraph.line_height, 18.0);
    assert_eq!(lines_that_fit(650.0, &layout, 18.0), 33);
    assert_eq!(lines_that_fit(700.0, &layout, 18.0), 36);
}

#[test]
fn exactly_full_page_does_not_break() {
    let layout = grid_layout();
    let plan = plan(&layout, &numbered_lines(33));

    assert_eq!(plan.page_count(), 1);
    let last = plan.body_runs().last().expect("body lines");
    assert_eq!(last.text, "line 33");
    assert_eq!(last.y, 650.0 - 32.0 * 18.0);
    assert!(last.y >= layout.margin + layout.paragraph.line_height);
}

#[test]
fn one_more_line_moves_to_the_next_page() {
    let layout = grid_layout();
    let plan = plan(&layout, &numbered_lines(34));

    assert_eq!(plan.page_count(), 2);
    assert_eq!(plan.footer_labels(), ["Page 1", "Page 2"]);
    let runs: Vec<_> = plan.pages[1].body_runs().collect();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].text, "line 34");
    assert_eq!(runs[0].y, 700.0);
}

#[test]
fn footers_number_pages_contiguously() {
    let layout = grid_layout();
    let plan = plan(&layout, &numbered_lines(400));

    let expected: Vec<String> = (1..=plan.page_count())
        .map(|number| format!("Page {number}"))
        .collect();
    assert_eq!(plan.footer_labels(), expected);

    for (index, page) in plan.pages.iter().enumerate() {
        let footer = page.footer().expect("footer");
        assert_eq!(page.number, index + 1);
        assert_eq!(footer.y, layout.margin);
        assert_eq!(footer.size, 10);
    }
}

#[test]
fn no_body_line_drops_below_the_bottom_margin() {
    let layout = grid_layout();
    let body = format!(
        "SUMMARY\n{}\n\n- first\n- second\n\nCLOSING\n{}",
        numbered_lines(50),
        numbered_lines(50)
    );
    let plan = plan(&layout, &body);

    for page in &plan.pages {
        for run in page.body_runs() {
            let style = match run.role {
                RunRole::Heading => layout.heading,
                RunRole::Bullet => layout.bullet,
                _ => layout.paragraph,
            };
            assert!(
                run.y >= layout.margin + style.line_height - 1e-6,
                "{} at y={} on page {}",
                run.text,
                run.y,
                page.number
            );
        }
    }
}

#[test]
fn wrapped_lines_stay_inside_the_margins() {
    let layout = grid_layout();
    let measure = FixedAdvance::default();
    let prose = "The property sits on a corner lot with two street frontages and a detached \
        garage that was converted into a rentable studio in the last renovation cycle. ";
    let oversized = "x".repeat(120);
    let body = format!("{}{}\n\n- {}", prose.repeat(6), oversized, prose.repeat(3));
    let plan = plan_report(&layout, &measure, "Title", &body, LOGO_HEIGHT);

    let right_edge = layout.page_width - layout.margin;
    for run in plan.body_runs() {
        assert_eq!(run.width, measure.measure(run.weight, &run.text, run.size));
        if run.text.contains(' ') {
            assert!(run.x + run.width <= right_edge, "overflowing line: {}", run.text);
        }
        assert!(!run.text.is_empty());
    }

    // A word wider than the line is placed alone rather than split.
    assert!(plan.body_runs().any(|run| run.text == oversized));
}

#[test]
fn layout_is_idempotent() {
    let layout = grid_layout();
    let body = format!("OVERVIEW\n{}\n\n- a\n- b", numbered_lines(80));
    assert_eq!(plan(&layout, &body), plan(&layout, &body));
}

#[test]
fn short_report_fits_on_one_page() {
    let layout = ReportLayout::default();
    let logo_height = Logo::default_logo().display_height(layout.logo_width);
    let plan = plan_report(
        &layout,
        &FixedAdvance::default(),
        "Investment Report",
        "OVERVIEW\nShort text.",
        logo_height,
    );

    assert_eq!(plan.page_count(), 1);
    assert_eq!(plan.footer_labels(), ["Page 1"]);

    let page = &plan.pages[0];
    let title = &page.runs[0];
    assert_eq!(title.role, RunRole::Title);
    assert_eq!(title.weight, FontWeight::Bold);
    assert_eq!(title.size, 24);

    let body: Vec<_> = page.body_runs().collect();
    assert_eq!(body.len(), 2);
    assert_eq!(body[0].text, "OVERVIEW");
    assert_eq!(body[0].role, RunRole::Heading);
    assert_eq!((body[0].weight, body[0].size), (FontWeight::Bold, 16));
    assert_eq!(body[1].text, "Short text.");
    assert_eq!((body[1].weight, body[1].size), (FontWeight::Regular, 12));
    let gap = body[0].y - body[1].y;
    assert!((gap - (24.0 + layout.paragraph_spacing)).abs() < 1e-9);
}

#[test]
fn long_prose_spans_the_expected_number_of_pages() {
    let layout = ReportLayout::default();
    let measure = FixedAdvance::default();
    let logo_height = Logo::default_logo().display_height(layout.logo_width);
    let body = vec!["appreciation"; 300].join(" ");

    let available = layout.available_width(0.0);
    let words_per_line = (1..=300)
        .take_while(|&count| {
            let line = vec!["appreciation"; count].join(" ");
            measure.measure(FontWeight::Regular, &line, 12) <= available
        })
        .last()
        .expect("at least one word fits");
    let total_lines = (300 + words_per_line - 1) / words_per_line;

    let line_height = layout.paragraph.line_height;
    let first_page = lines_that_fit(layout.content_top(1, logo_height), &layout, line_height);
    let later_pages = lines_that_fit(layout.content_top(2, logo_height), &layout, line_height);
    let expected_pages = if total_lines <= first_page {
        1
    } else {
        1 + (total_lines - first_page + later_pages - 1) / later_pages
    };

    let plan = plan_report(&layout, &measure, "Investment Report", &body, logo_height);

    assert!(expected_pages > 1);
    assert_eq!(plan.body_runs().count(), total_lines);
    assert_eq!(plan.footer_labels().len(), expected_pages);
    assert_eq!(plan.pages[0].body_runs().count(), first_page);
}

#[test]
fn bullet_group_is_followed_by_a_single_gap() {
    let layout = grid_layout();
    let body = "KEY FIGURES\n- Price: $450,000\n- Units: 2\n- Rent: $3,200\n- Taxes: $5,100\n- Cap rate: 6.1%\n\nThe numbers support a hold.";
    let plan = plan(&layout, body);

    let runs: Vec<_> = plan.body_runs().collect();
    assert_eq!(runs.len(), 7);

    let bullets: Vec<_> = runs.iter().filter(|run| run.role == RunRole::Bullet).collect();
    assert_eq!(bullets.len(), 5);
    for bullet in &bullets {
        assert_eq!(bullet.x, layout.margin + layout.bullet.indent);
        assert!(bullet.text.starts_with('-'));
    }
    for pair in bullets.windows(2) {
        assert_eq!(pair[0].y - pair[1].y, layout.bullet.line_height);
    }

    let paragraph = runs.last().expect("paragraph line");
    assert_eq!(paragraph.role, RunRole::Paragraph);
    assert_eq!(paragraph.x, layout.margin);
    assert_eq!(
        bullets[4].y - paragraph.y,
        layout.bullet.line_height + layout.paragraph_spacing
    );
}
