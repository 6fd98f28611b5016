use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::info;
use report_pdf::http::{self, DEFAULT_REPORT_TITLE};
use report_pdf::{LogoInput, ReportBuilder, ReportLayout};

/// Renders property investment reports to PDF.
///
/// Fonts are looked up under `assets/fonts` next to the executable, in the `report_pdf` crate, or
/// in the directory named by `REPORT_PDF_FONTS_DIR`.
#[derive(Parser)]
#[command(author, version, about = "Render paginated investment report PDFs")]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML file overriding page geometry and text styles.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a report from a plain-text body.
    Render {
        /// Report title drawn on the first page.
        #[arg(short, long, default_value = DEFAULT_REPORT_TITLE)]
        title: String,

        /// Body text file, or `-` for standard input.
        #[arg(short, long)]
        body: PathBuf,

        /// PNG or JPEG logo placed at the top of every page.
        #[arg(short, long)]
        logo: Option<PathBuf>,

        /// MIME type of the logo; inferred from its extension when omitted.
        #[arg(long)]
        logo_type: Option<String>,

        /// Output PDF path.
        #[arg(short, long, default_value = "report.pdf")]
        output: PathBuf,
    },

    /// Render a report from a JSON request body as posted by the web frontend.
    Request {
        /// JSON file with `summary`, and optionally `title`, `logo` and `logoType`.
        input: PathBuf,

        /// Output PDF path.
        #[arg(short, long, default_value = "report.pdf")]
        output: PathBuf,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let layout = match &cli.config {
        Some(path) => ReportLayout::load(path)
            .with_context(|| format!("failed to load layout from {}", path.display()))?,
        None => ReportLayout::default(),
    };

    match cli.command {
        Commands::Render {
            title,
            body,
            logo,
            logo_type,
            output,
        } => render_command(&layout, title, &body, logo.as_deref(), logo_type, &output),
        Commands::Request { input, output } => request_command(&layout, &input, &output),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn render_command(
    layout: &ReportLayout,
    title: String,
    body: &Path,
    logo: Option<&Path>,
    logo_type: Option<String>,
    output: &Path,
) -> Result<()> {
    let body = read_body(body)?;
    let logo = match logo {
        Some(path) => {
            let bytes =
                fs::read(path).with_context(|| format!("failed to read logo {}", path.display()))?;
            let mime = logo_type.unwrap_or_else(|| mime_from_extension(path).to_owned());
            Some(LogoInput::new(bytes, &mime))
        }
        None => None,
    };

    let report = ReportBuilder::new()
        .with_title(title)
        .with_body(body)
        .with_logo(logo)
        .with_layout(layout.clone())
        .render()
        .context("failed to render report")?;

    write_pdf(output, &report.bytes)?;
    info!("Wrote {} page(s) to {}", report.page_count, output.display());
    Ok(())
}

fn request_command(layout: &ReportLayout, input: &Path, output: &Path) -> Result<()> {
    let body = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let response = http::handle_pdf_request(&body, layout);
    if response.status != 200 {
        bail!(
            "request failed with status {}: {}",
            response.status,
            String::from_utf8_lossy(&response.body)
        );
    }
    write_pdf(output, &response.body)
}

fn read_body(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut body = String::new();
        io::stdin()
            .read_to_string(&mut body)
            .context("failed to read body from stdin")?;
        Ok(body)
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read body {}", path.display()))
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn write_pdf(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}
