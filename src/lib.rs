//! PDF report generation for construction cost management.
//!
//! A report flows through five stages: the [`model`] is aggregated into figures
//! ([`aggregate`]), laid out from reusable primitives ([`layout`]) into logical sections
//! ([`compose`]), rendered in two passes so the table of contents can be back-patched
//! ([`toc`], [`render`]) and finally published to a bucket together with a metadata row
//! ([`storage`]).

pub mod aggregate;
pub mod builder;
pub mod cable;
pub mod compose;
pub mod config;
pub mod cost_report;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod model;
pub mod money;
pub mod render;
pub mod storage;
pub mod toc;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use aggregate::{CategoryTotals, ReportSummary, Totals, VariationSummary};
pub use cable::{CableEntry, CableSchedule, CableScheduleDocument, ScheduleSummary};
pub use compose::{DocumentSource, SectionSpec};
pub use config::Settings;
pub use cost_report::CostReportDocument;
pub use error::{ReportError, ReportResult};
pub use model::{Category, CostReport, LineItem, ProjectInfo, Variation, VariationKind, VariationLine};
pub use money::MoneyFormat;
pub use render::{RenderedReport, ReportRenderer};
pub use storage::{
    artifact_file_name, ArtifactRecords, ArtifactSink, GeneratedReportArtifact, ObjectStore,
    PublishRequest, ReportKind, StorageError,
};
pub use toc::{ResolvedTocEntry, TocEntry, TocPlan};
