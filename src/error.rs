//! Error types shared across the report pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::StorageError;

/// Result alias used throughout the crate.
pub type ReportResult<T> = Result<T, ReportError>;

/// Failures raised while loading inputs, laying out, rendering or publishing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// No usable font family could be located.
    #[error("failed to load fonts: {0}")]
    FontLoad(#[source] genpdf::error::Error),

    /// `genpdf` failed while rendering the document.
    #[error("failed to render document: {0}")]
    Render(#[source] genpdf::error::Error),

    /// A layout primitive was given inconsistent input.
    #[error("layout error: {0}")]
    Layout(String),

    /// Pass 2 placed a section on a different page than the table of contents promised.
    #[error("section '{title}' was printed on page {actual} but the contents list page {expected}")]
    LayoutDrift {
        /// Title of the drifting section.
        title: String,
        /// Page number printed in the table of contents.
        expected: usize,
        /// Page number the section actually started on.
        actual: usize,
    },

    /// The report input could not be read or parsed.
    #[error("invalid report input {path}: {message}")]
    Input {
        /// File the input was read from.
        path: PathBuf,
        /// Parser or I/O message.
        message: String,
    },

    /// A money figure does not fit in a `Decimal`.
    #[error("amount out of range in {0}")]
    Amount(String),

    /// The settings file could not be read or parsed.
    #[error("invalid settings: {0}")]
    Config(String),

    /// Publishing or deleting an artifact failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Generic I/O failure while writing output.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Embedding the PDF outline failed.
    #[cfg(feature = "bookmarks")]
    #[error(transparent)]
    Bookmarks(#[from] crate::bookmarks::BookmarkError),
}

impl ReportError {
    /// Classifies a `genpdf` error raised while setting up fonts.
    pub(crate) fn font(err: genpdf::error::Error) -> Self {
        Self::FontLoad(err)
    }

    pub(crate) fn render(err: genpdf::error::Error) -> Self {
        Self::Render(err)
    }

    pub(crate) fn amount(context: impl Into<String>) -> Self {
        Self::Amount(context.into())
    }

    pub(crate) fn layout(message: impl Into<String>) -> Self {
        Self::Layout(message.into())
    }
}

impl From<genpdf::error::Error> for ReportError {
    fn from(err: genpdf::error::Error) -> Self {
        Self::Render(err)
    }
}
