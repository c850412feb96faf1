//! Font discovery for report rendering.
//!
//! The bundled Roboto family is searched in `COSTDOC_FONTS_DIR`, next to the running
//! executable, and finally under the crate's `assets/fonts`.  When none of those hold a complete
//! family, a system sans family (Liberation Sans, Arial or DejaVu Sans) is tried instead.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Environment variable pointing at a directory with the bundled font files.
pub const FONTS_DIR_ENV: &str = "COSTDOC_FONTS_DIR";

/// Environment variable pointing at a system font directory used for the fallback families.
pub const SYSTEM_FONTS_DIR_ENV: &str = "COSTDOC_SYSTEM_FONTS_DIR";

const FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

/// File names making up one system fallback family.
struct SystemFamily {
    name: &'static str,
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
}

const SYSTEM_FAMILIES: &[SystemFamily] = &[
    SystemFamily {
        name: "Liberation Sans",
        regular: "LiberationSans-Regular.ttf",
        bold: "LiberationSans-Bold.ttf",
        italic: "LiberationSans-Italic.ttf",
        bold_italic: "LiberationSans-BoldItalic.ttf",
    },
    SystemFamily {
        name: "Arial",
        regular: "arial.ttf",
        bold: "arialbd.ttf",
        italic: "ariali.ttf",
        bold_italic: "arialbi.ttf",
    },
    SystemFamily {
        name: "DejaVu Sans",
        regular: "DejaVuSans.ttf",
        bold: "DejaVuSans-Bold.ttf",
        italic: "DejaVuSans-Oblique.ttf",
        bold_italic: "DejaVuSans-BoldOblique.ttf",
    },
];

const SYSTEM_FONT_DIRECTORIES: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/liberation-sans",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu",
];

/// Directory holding the fonts that ship with the crate sources.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    let mut push_unique = |candidate: PathBuf| {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        push_unique(path);
    }
    if let Some(bin_dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        push_unique(bin_dir.join("assets/fonts"));
    }
    push_unique(bundled_fonts_source_dir());

    candidates
}

fn missing_font_files(path: &Path) -> Vec<String> {
    FONT_FILES
        .iter()
        .filter(|name| !path.join(name).is_file())
        .map(|name| name.to_string())
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
            "Unable to locate the {} font family. Checked: {}. Set {} to a directory containing {}.",
            DEFAULT_FONT_FAMILY_NAME,
            attempts.join(", "),
            FONTS_DIR_ENV,
            FONT_FILES.join(", ")
        ),
        io::Error::new(io::ErrorKind::NotFound, "bundled fonts directory not found"),
    ))
}

fn load_bundled_font_family() -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_font_directory()?;
    debug!("loading {} from {}", DEFAULT_FONT_FAMILY_NAME, directory.display());

    fonts::from_files(&directory, DEFAULT_FONT_FAMILY_NAME, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                DEFAULT_FONT_FAMILY_NAME,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn system_font_directories() -> Vec<PathBuf> {
    let mut directories: Vec<PathBuf> = env_path(SYSTEM_FONTS_DIR_ENV).into_iter().collect();

    for var in ["WINDIR", "SystemRoot"] {
        if let Some(root) = env_path(var) {
            directories.push(root.join("Fonts"));
        }
    }
    directories.extend(SYSTEM_FONT_DIRECTORIES.iter().map(PathBuf::from));
    directories.retain(|directory| directory.is_dir());
    directories
}

fn load_system_font(directory: &Path, file: &str) -> Result<FontData, Error> {
    let path = directory.join(file);
    FontData::load(&path, None).map_err(|err| {
        Error::new(
            format!("Failed to load fallback font {}: {}", path.display(), err),
            io::Error::new(io::ErrorKind::NotFound, err.to_string()),
        )
    })
}

fn load_system_family(directory: &Path, family: &SystemFamily) -> Result<FontFamily<FontData>, Error> {
    Ok(FontFamily {
        regular: load_system_font(directory, family.regular)?,
        bold: load_system_font(directory, family.bold)?,
        italic: load_system_font(directory, family.italic)?,
        bold_italic: load_system_font(directory, family.bold_italic)?,
    })
}

fn system_fallback_font_family() -> Result<(FontFamily<FontData>, &'static str), Error> {
    for directory in system_font_directories() {
        for family in SYSTEM_FAMILIES {
            if !directory.join(family.regular).is_file() {
                continue;
            }
            match load_system_family(&directory, family) {
                Ok(loaded) => return Ok((loaded, family.name)),
                Err(err) => debug!("skipping {} in {}: {}", family.name, directory.display(), err),
            }
        }
    }

    Err(Error::new(
        "No system fallback font family found",
        io::Error::new(io::ErrorKind::NotFound, "system fonts not found"),
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

/// Returns the bundled Roboto family, or a system family when the bundled files are missing.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    match load_bundled_font_family() {
        Ok(family) => Ok(family),
        Err(err) if fonts_missing(&err) => match system_fallback_font_family() {
            Ok((family, name)) => {
                warn!("Bundled fonts unavailable ({}); falling back to '{}'.", err, name);
                Ok(family)
            }
            Err(fallback_err) => {
                warn!(
                    "Bundled fonts unavailable ({}); system fallback failed: {}",
                    err, fallback_err
                );
                Err(Error::new(
                    format!("No usable fonts: {}; {}", err, fallback_err),
                    io::Error::new(io::ErrorKind::NotFound, "default fonts are not available"),
                ))
            }
        },
        Err(err) => Err(err),
    }
}

/// Indicates whether any usable font family (bundled or system) can be loaded.
pub fn fonts_available() -> bool {
    resolve_font_directory().is_ok() || system_fallback_font_family().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_are_listed_by_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("Roboto-Regular.ttf"), b"").expect("write");
        let missing = missing_font_files(dir.path());
        assert_eq!(missing.len(), 3);
        assert!(missing.contains(&"Roboto-Bold.ttf".to_string()));
    }

    #[test]
    fn manifest_directory_is_always_a_candidate() {
        assert!(font_directory_candidates().contains(&bundled_fonts_source_dir()));
    }
}
