//! Font loading for the report renderer.
//!
//! Reports use a regular and a bold face. The bundled files are Liberation Sans, which shares
//! Helvetica's metrics; by default they only supply measurements and the PDF references the
//! built-in Helvetica faces. With `embed_fonts` the TrueType data is embedded instead.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{FontData, FontFamily};
use log::warn;
use printpdf::BuiltinFont;

/// Environment variable pointing at a directory with the bundled font files.
pub const FONTS_DIR_ENV: &str = "REPORT_PDF_FONTS_DIR";

/// Environment variable overriding the Windows fonts directory used as a fallback.
pub const WINDOWS_FONTS_DIR_ENV: &str = "REPORT_PDF_WINDOWS_FONTS_DIR";

const REGULAR_FILE: &str = "LiberationSans-Regular.ttf";
const BOLD_FILE: &str = "LiberationSans-Bold.ttf";
const FONT_FILES: &[&str] = &[REGULAR_FILE, BOLD_FILE];

const WINDOWS_FALLBACK_FAMILY_NAME: &str = "Arial";
const WINDOWS_REGULAR_FILE: &str = "arial.ttf";
const WINDOWS_BOLD_FILE: &str = "arialbd.ttf";

/// Returns the `assets/fonts` directory of this crate.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(path) = env::var(FONTS_DIR_ENV) {
        if !path.trim().is_empty() {
            candidates.push(PathBuf::from(path));
        }
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            let candidate = bin_dir.join("assets/fonts");
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    let manifest_candidate = bundled_fonts_source_dir();
    if !candidates.contains(&manifest_candidate) {
        candidates.push(manifest_candidate);
    }

    candidates
}

fn missing_font_files(path: &Path) -> Vec<&'static str> {
    FONT_FILES
        .iter()
        .copied()
        .filter(|name| !path.join(name).is_file())
        .collect()
}

fn resolve_font_directory() -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }

        let missing = missing_font_files(&candidate);
        if missing.is_empty() {
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }

    Err(Error::new(
        format!(
            "Unable to locate the report font directory. Checked: {}. See assets/fonts/README.md or set {}.",
            attempts.join(", "),
            FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "report fonts directory not found"),
    ))
}

fn load_face(path: &Path, builtin: Option<BuiltinFont>, face: &str) -> Result<FontData, Error> {
    FontData::load(path, builtin).map_err(|err| {
        let io_kind = if path.is_file() {
            io::ErrorKind::Other
        } else {
            io::ErrorKind::NotFound
        };
        Error::new(
            format!("Failed to load {} font at {}: {}", face, path.display(), err),
            io::Error::new(io_kind, err.to_string()),
        )
    })
}

/// Builds a genpdf family from a regular and a bold face.
///
/// genpdf families carry four faces; the italic slots reuse the upright ones because reports never
/// set italic text.
fn two_face_family(regular: FontData, bold: FontData) -> FontFamily<FontData> {
    FontFamily {
        italic: regular.clone(),
        bold_italic: bold.clone(),
        regular,
        bold,
    }
}

fn builtin_faces(embed: bool) -> (Option<BuiltinFont>, Option<BuiltinFont>) {
    if embed {
        (None, None)
    } else {
        (Some(BuiltinFont::Helvetica), Some(BuiltinFont::HelveticaBold))
    }
}

fn load_bundled_font_family(embed: bool) -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_font_directory()?;
    let (regular, bold) = builtin_faces(embed);

    Ok(two_face_family(
        load_face(&directory.join(REGULAR_FILE), regular, "regular")?,
        load_face(&directory.join(BOLD_FILE), bold, "bold")?,
    ))
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn windows_font_directory() -> Option<PathBuf> {
    if let Some(path) = env_path(WINDOWS_FONTS_DIR_ENV) {
        return Some(path);
    }

    #[cfg(windows)]
    {
        for var in ["WINDIR", "SystemRoot"] {
            if let Some(root) = env_path(var) {
                let candidate = root.join("Fonts");
                if candidate.is_dir() {
                    return Some(candidate);
                }
            }
        }
    }

    None
}

fn windows_fallback_font_family(embed: bool) -> Result<FontFamily<FontData>, Error> {
    let directory = windows_font_directory().ok_or_else(|| {
        Error::new(
            "Windows font directory not found for fallback",
            io::Error::new(io::ErrorKind::NotFound, "windows fonts directory not found"),
        )
    })?;
    let (regular, bold) = builtin_faces(embed);

    Ok(two_face_family(
        load_face(&directory.join(WINDOWS_REGULAR_FILE), regular, "Windows regular")?,
        load_face(&directory.join(WINDOWS_BOLD_FILE), bold, "Windows bold")?,
    ))
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Returns the report font family, falling back to Windows Arial when the bundled files are
/// missing.
pub fn default_font_family(embed: bool) -> Result<FontFamily<FontData>, Error> {
    match load_bundled_font_family(embed) {
        Ok(family) => Ok(family),
        Err(err) if fonts_missing(&err) => match windows_fallback_font_family(embed) {
            Ok(fallback) => {
                warn!(
                    "Report fonts unavailable ({}); falling back to Windows '{}' family.",
                    err, WINDOWS_FALLBACK_FAMILY_NAME
                );
                Ok(fallback)
            }
            Err(fallback_err) => {
                warn!(
                    "Report fonts unavailable ({}); Windows fallback failed: {}",
                    err, fallback_err
                );
                Err(Error::new(
                    format!(
                        "Report fonts unavailable and Windows fallback failed: {}",
                        fallback_err
                    ),
                    io::Error::new(io::ErrorKind::NotFound, "default fonts are not available"),
                ))
            }
        },
        Err(err) => Err(err),
    }
}

/// Indicates whether a usable font family can be loaded without embedding.
pub fn default_fonts_available() -> bool {
    default_font_family(false).is_ok()
}
