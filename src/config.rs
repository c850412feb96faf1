//! Report settings loaded from TOML and the environment.
//!
//! Every field has a default, so an empty file (or no file at all) yields a working
//! configuration.  Variables named `COSTDOC_<SECTION>__<FIELD>` override single fields, e.g.
//! `COSTDOC_LAYOUT__MARGIN_MM=20`.  `COSTDOC_STORAGE_ROOT` moves the storage root and the
//! records file together and wins over both.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};

use genpdf::{Margins, PaperSize, Size};
use serde::Deserialize;

use crate::error::{ReportError, ReportResult};
use crate::layout::{mm, mm_to_f64};
use crate::money::MoneyFormat;

/// Prefix of every settings variable.
pub const ENV_PREFIX: &str = "COSTDOC";

/// Environment variable overriding [`StorageSettings::root`] and the records file below it.
pub const STORAGE_ROOT_ENV: &str = "COSTDOC_STORAGE_ROOT";

/// Top-level settings.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Branding printed on covers and headers.
    pub company: CompanySettings,
    /// Page and table of contents layout.
    pub layout: LayoutSettings,
    /// Storage locations for published artifacts.
    pub storage: StorageSettings,
    /// Electrical limits used by the cable schedule.
    pub cable: CableSettings,
}

/// Company branding.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompanySettings {
    /// Name printed on the cover.
    pub name: String,
    /// Optional logo image drawn on the cover.
    pub logo: Option<PathBuf>,
    /// Logo width in millimetres.
    pub logo_width_mm: f64,
    /// Currency symbol used for amounts.
    pub currency_symbol: String,
    /// Thousands separator used for amounts.
    pub thousands_separator: char,
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            name: "Cost Management".to_string(),
            logo: None,
            logo_width_mm: 45.0,
            currency_symbol: "R".to_string(),
            thousands_separator: ' ',
        }
    }
}

impl CompanySettings {
    /// Money formatter configured from the branding settings.
    pub fn money_format(&self) -> MoneyFormat {
        MoneyFormat::new(self.currency_symbol.clone()).with_separator(self.thousands_separator)
    }
}

/// Page orientation.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Portrait pages.
    #[default]
    Portrait,
    /// Landscape pages.
    Landscape,
}

/// Supported paper sizes.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Paper {
    /// ISO A4.
    #[default]
    A4,
    /// US Letter.
    Letter,
    /// US Legal.
    Legal,
}

/// Page layout settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutSettings {
    /// Paper size.
    pub paper: Paper,
    /// Page orientation.
    pub orientation: Orientation,
    /// Uniform page margin in millimetres.
    pub margin_mm: f64,
    /// Height reserved for the page footer in millimetres.
    pub footer_height_mm: f64,
    /// Base font size in points.
    pub font_size: u8,
    /// Whether a table of contents is inserted after the cover.
    pub table_of_contents: bool,
    /// Title of the table of contents page.
    pub toc_title: String,
    /// Maximum table of contents entries printed on one page.
    ///
    /// Capped by [`LayoutSettings::toc_capacity`] so a contents page never overflows into the
    /// next page; landscape A4 holds fewer rows than the default of 30.
    pub toc_entries_per_page: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            paper: Paper::A4,
            orientation: Orientation::Portrait,
            margin_mm: 15.0,
            footer_height_mm: 10.0,
            font_size: 10,
            table_of_contents: true,
            toc_title: "Contents".to_string(),
            toc_entries_per_page: 30,
        }
    }
}

impl LayoutSettings {
    /// Page size in millimetres after applying the orientation.
    pub fn page_size(&self) -> Size {
        let paper = match self.paper {
            Paper::A4 => PaperSize::A4,
            Paper::Letter => PaperSize::Letter,
            Paper::Legal => PaperSize::Legal,
        };
        let size: Size = paper.into();
        match self.orientation {
            Orientation::Portrait => size,
            Orientation::Landscape => Size::new(size.height, size.width),
        }
    }

    /// Page margins applied by the decorator.
    pub fn margins(&self) -> Margins {
        Margins::all(mm(self.margin_mm))
    }

    /// Contents rows that fit on one page between the margins, the footer and the page title.
    pub fn toc_capacity(&self) -> usize {
        let printable = mm_to_f64(self.page_size().height)
            - 2.0 * self.margin_mm
            - self.footer_height_mm
            - TOC_TITLE_HEIGHT_MM;
        if printable.is_finite() && printable > TOC_ROW_HEIGHT_MM {
            (printable / TOC_ROW_HEIGHT_MM) as usize
        } else {
            1
        }
    }

    /// Contents entries planned per page: the configured value capped by
    /// [`toc_capacity`](Self::toc_capacity).
    pub fn effective_toc_entries_per_page(&self) -> usize {
        self.toc_entries_per_page.clamp(1, self.toc_capacity())
    }
}

/// Height of the contents title, its spacing and the column header row, in millimetres.
const TOC_TITLE_HEIGHT_MM: f64 = 35.0;

/// Upper bound for one contents table row in millimetres.
const TOC_ROW_HEIGHT_MM: f64 = 7.0;

/// Storage locations.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding one sub-directory per bucket.
    pub root: PathBuf,
    /// File recording artifact metadata.
    pub records_file: PathBuf,
    /// Bucket for cost report PDFs.
    pub cost_report_bucket: String,
    /// Bucket for cable schedule PDFs.
    pub cable_schedule_bucket: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("storage"),
            records_file: PathBuf::from("storage/artifacts.json"),
            cost_report_bucket: "cost-report-pdfs".to_string(),
            cable_schedule_bucket: "cable-schedule-reports".to_string(),
        }
    }
}

/// Electrical limits for cable sizing.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CableSettings {
    /// Maximum permissible voltage drop in percent.
    pub max_voltage_drop_percent: f64,
}

impl Default for CableSettings {
    fn default() -> Self {
        Self {
            max_voltage_drop_percent: 5.0,
        }
    }
}

impl Settings {
    /// Parses settings from TOML text.
    pub fn from_toml_str(text: &str) -> ReportResult<Self> {
        let builder = Config::builder().add_source(File::from_str(text, FileFormat::Toml));
        Self::build(builder)
    }

    /// Loads settings from `path`, or defaults when no path is given, then applies environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> ReportResult<Self> {
        let vars = env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect();
        Self::load_with_env(path, vars)
    }

    /// Like [`load`](Self::load) but reads overrides from `vars` instead of the process
    /// environment.
    pub fn load_with_env(path: Option<&Path>, vars: HashMap<String, String>) -> ReportResult<Self> {
        let storage_root = vars
            .get(STORAGE_ROOT_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.into_iter().collect())),
        );

        if let Some(root) = storage_root {
            log::debug!("storage root overridden to {}", root.display());
            let records = root.join("artifacts.json");
            builder = builder
                .set_override("storage.root", root.display().to_string())
                .and_then(|builder| {
                    builder.set_override("storage.records_file", records.display().to_string())
                })
                .map_err(config_error)?;
        }
        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> ReportResult<Self> {
        builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error)
    }
}

fn config_error(err: ConfigError) -> ReportError {
    ReportError::Config(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let settings = Settings::from_toml_str("").expect("parse");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.storage.cost_report_bucket, "cost-report-pdfs");
        assert!(settings.layout.table_of_contents);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [company]
            name = "Watson Consulting"
            currency_symbol = "$"

            [layout]
            orientation = "landscape"
            table_of_contents = false
            "#,
        )
        .expect("parse");

        assert_eq!(settings.company.name, "Watson Consulting");
        assert_eq!(settings.company.logo_width_mm, 45.0);
        assert_eq!(settings.company.money_format().symbol(), "$");
        assert!(!settings.layout.table_of_contents);

        let size = settings.layout.page_size();
        assert!(size.width > size.height);
    }

    #[test]
    fn contents_rows_are_capped_by_the_page_height() {
        let portrait = LayoutSettings::default();
        assert_eq!(portrait.effective_toc_entries_per_page(), 30);

        let landscape = LayoutSettings {
            orientation: Orientation::Landscape,
            ..LayoutSettings::default()
        };
        assert!(landscape.toc_capacity() < 30);
        assert_eq!(
            landscape.effective_toc_entries_per_page(),
            landscape.toc_capacity()
        );

        let sparse = LayoutSettings {
            toc_entries_per_page: 2,
            ..landscape
        };
        assert_eq!(sparse.effective_toc_entries_per_page(), 2);

        let cramped = LayoutSettings {
            margin_mm: 200.0,
            ..LayoutSettings::default()
        };
        assert_eq!(cramped.effective_toc_entries_per_page(), 1);
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn environment_overrides_single_fields() {
        let settings = Settings::load_with_env(
            None,
            vars(&[
                ("COSTDOC_LAYOUT__MARGIN_MM", "20"),
                ("COSTDOC_LAYOUT__ORIENTATION", "landscape"),
                ("COSTDOC_COMPANY__NAME", "Watson Consulting"),
                ("COSTDOC_CABLE__MAX_VOLTAGE_DROP_PERCENT", "2.5"),
                ("COSTDOC_FONTS_DIR", "/opt/fonts"),
                ("OTHER_LAYOUT__MARGIN_MM", "99"),
            ]),
        )
        .expect("load");

        assert_eq!(settings.layout.margin_mm, 20.0);
        assert_eq!(settings.layout.orientation, Orientation::Landscape);
        assert_eq!(settings.company.name, "Watson Consulting");
        assert_eq!(settings.cable.max_voltage_drop_percent, 2.5);
        assert_eq!(settings.storage, StorageSettings::default());
    }

    #[test]
    fn environment_wins_over_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("costdoc.toml");
        std::fs::write(&path, "[layout]\nmargin_mm = 12\nfont_size = 9\n").unwrap();

        let settings =
            Settings::load_with_env(Some(&path), vars(&[("COSTDOC_LAYOUT__MARGIN_MM", "18")]))
                .expect("load");
        assert_eq!(settings.layout.margin_mm, 18.0);
        assert_eq!(settings.layout.font_size, 9);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Settings::load_with_env(Some(&missing), HashMap::new()),
            Err(ReportError::Config(_))
        ));
    }

    #[test]
    fn storage_root_alias_moves_the_records_file() {
        let settings = Settings::load_with_env(
            None,
            vars(&[
                ("COSTDOC_STORAGE__ROOT", "/ignored"),
                (STORAGE_ROOT_ENV, "/srv/costdoc"),
                ("COSTDOC_STORAGE__COST_REPORT_BUCKET", "reports"),
            ]),
        )
        .expect("load");

        assert_eq!(settings.storage.root, PathBuf::from("/srv/costdoc"));
        assert_eq!(
            settings.storage.records_file,
            PathBuf::from("/srv/costdoc/artifacts.json")
        );
        assert_eq!(settings.storage.cost_report_bucket, "reports");

        let untouched = Settings::load_with_env(None, vars(&[(STORAGE_ROOT_ENV, "")])).expect("load");
        assert_eq!(untouched.storage, StorageSettings::default());
    }

    #[test]
    fn unknown_paper_is_rejected() {
        let err = Settings::from_toml_str("[layout]\npaper = \"a0\"").unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }
}
