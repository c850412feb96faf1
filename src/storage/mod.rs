//! Output sink: uploads rendered PDFs to a bucket and records their metadata.
//!
//! Storage objects are addressed by `(bucket, path)` where `path` is `{project_id}/{file_name}`.
//! Every published object has exactly one [`GeneratedReportArtifact`] row; [`ArtifactSink`]
//! keeps the two in step when publishing and deleting.

pub mod fs;
pub mod memory;

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::StorageSettings;

pub use fs::{FsObjectStore, JsonArtifactRecords};
pub use memory::{MemoryArtifactRecords, MemoryObjectStore};

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failures raised by object stores and metadata backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object exists at the requested location.
    #[error("object {bucket}/{path} does not exist")]
    NotFound {
        /// Bucket name.
        bucket: String,
        /// Object path within the bucket.
        path: String,
    },

    /// An object already occupies the location; uploads never replace one another.
    #[error("object {bucket}/{path} already exists")]
    AlreadyExists {
        /// Bucket name.
        bucket: String,
        /// Object path within the bucket.
        path: String,
    },

    /// No metadata row exists for the artifact.
    #[error("artifact {0} is not recorded")]
    UnknownArtifact(Uuid),

    /// A metadata row with the same id already exists.
    #[error("artifact {0} is already recorded")]
    DuplicateArtifact(Uuid),

    /// A bucket name or object path would escape its bucket.
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    /// Filesystem failure.
    #[error("storage i/o error at {}: {source}", path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The metadata file could not be encoded or decoded.
    #[error("artifact records are malformed: {0}")]
    Records(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn already_exists(bucket: &str, path: &str) -> Self {
        Self::AlreadyExists {
            bucket: bucket.to_string(),
            path: path.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Kind of document an artifact holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Project cost report.
    CostReport,
    /// Cable schedule report.
    CableSchedule,
}

impl ReportKind {
    /// Human readable name.
    pub fn label(self) -> &'static str {
        match self {
            Self::CostReport => "Cost Report",
            Self::CableSchedule => "Cable Schedule",
        }
    }

    fn file_stem(self) -> &'static str {
        match self {
            Self::CostReport => "Cost_Report",
            Self::CableSchedule => "Cable_Schedule",
        }
    }
}

/// Metadata row describing one published PDF.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedReportArtifact {
    /// Unique artifact id.
    pub id: Uuid,
    /// Id of the report the PDF was rendered from.
    pub report_id: String,
    /// Id of the owning project.
    pub project_id: String,
    /// Kind of document.
    pub kind: ReportKind,
    /// Revision label at publish time.
    pub revision: String,
    /// Bucket holding the object.
    pub bucket: String,
    /// Object path within the bucket.
    pub file_path: String,
    /// Size of the uploaded PDF in bytes.
    pub file_size: u64,
    /// Publish time.
    pub generated_at: DateTime<Utc>,
}

/// Blob storage addressed by bucket and path.
pub trait ObjectStore {
    /// Stores `bytes` at a free location.
    ///
    /// Fails with [`StorageError::AlreadyExists`] when an object is already there, so one
    /// artifact can never overwrite the object another artifact row points at.
    fn put(&self, bucket: &str, path: &str, bytes: &[u8]) -> StorageResult<()>;

    /// Reads an object.
    fn get(&self, bucket: &str, path: &str) -> StorageResult<Vec<u8>>;

    /// Removes an object, returning whether it existed.
    fn remove(&self, bucket: &str, path: &str) -> StorageResult<bool>;

    /// Whether an object exists.
    fn exists(&self, bucket: &str, path: &str) -> StorageResult<bool>;
}

/// Metadata table for published artifacts.
pub trait ArtifactRecords {
    /// Inserts a new row; ids must be unique.
    fn insert(&self, artifact: &GeneratedReportArtifact) -> StorageResult<()>;

    /// Looks a row up by id.
    fn get(&self, id: Uuid) -> StorageResult<Option<GeneratedReportArtifact>>;

    /// Rows belonging to `report_id`, newest first.
    fn list_for_report(&self, report_id: &str) -> StorageResult<Vec<GeneratedReportArtifact>>;

    /// Removes and returns a row.
    fn remove(&self, id: Uuid) -> StorageResult<GeneratedReportArtifact>;
}

/// Identifies the report a PDF belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishRequest {
    /// Kind of document.
    pub kind: ReportKind,
    /// Id of the source report.
    pub report_id: String,
    /// Id of the owning project; used as the object folder.
    pub project_id: String,
    /// Revision label.
    pub revision: String,
    /// File name inside the project folder.
    pub file_name: String,
}

/// Bucket names per report kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Buckets {
    /// Bucket for cost reports.
    pub cost_report: String,
    /// Bucket for cable schedules.
    pub cable_schedule: String,
}

impl Buckets {
    /// Bucket receiving documents of `kind`.
    pub fn for_kind(&self, kind: ReportKind) -> &str {
        match kind {
            ReportKind::CostReport => &self.cost_report,
            ReportKind::CableSchedule => &self.cable_schedule,
        }
    }
}

impl Default for Buckets {
    fn default() -> Self {
        Self::from(&StorageSettings::default())
    }
}

impl From<&StorageSettings> for Buckets {
    fn from(settings: &StorageSettings) -> Self {
        Self {
            cost_report: settings.cost_report_bucket.clone(),
            cable_schedule: settings.cable_schedule_bucket.clone(),
        }
    }
}

/// Couples an [`ObjectStore`] with its [`ArtifactRecords`].
#[derive(Debug)]
pub struct ArtifactSink<S, R> {
    store: S,
    records: R,
    buckets: Buckets,
}

impl<S: ObjectStore, R: ArtifactRecords> ArtifactSink<S, R> {
    /// Creates a sink over the given backends.
    pub fn new(store: S, records: R, buckets: Buckets) -> Self {
        Self {
            store,
            records,
            buckets,
        }
    }

    /// Object store backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Metadata backend.
    pub fn records(&self) -> &R {
        &self.records
    }

    /// Uploads `bytes` and records the artifact.
    ///
    /// When the metadata insert fails the uploaded object is removed again, so a failed publish
    /// leaves nothing behind. Publishing to a path that is already taken fails with
    /// [`StorageError::AlreadyExists`] and leaves the existing object and its row untouched.
    pub fn publish(
        &self,
        request: &PublishRequest,
        bytes: &[u8],
    ) -> StorageResult<GeneratedReportArtifact> {
        let bucket = self.buckets.for_kind(request.kind).to_string();
        let file_path = object_path(&request.project_id, &request.file_name)?;

        self.store.put(&bucket, &file_path, bytes)?;
        debug!("uploaded {} bytes to {bucket}/{file_path}", bytes.len());

        let artifact = GeneratedReportArtifact {
            id: Uuid::new_v4(),
            report_id: request.report_id.clone(),
            project_id: request.project_id.clone(),
            kind: request.kind,
            revision: request.revision.clone(),
            bucket,
            file_path,
            file_size: bytes.len() as u64,
            generated_at: Utc::now(),
        };

        if let Err(err) = self.records.insert(&artifact) {
            warn!(
                "recording {} failed, removing {}/{}",
                artifact.id, artifact.bucket, artifact.file_path
            );
            if let Err(cleanup) = self.store.remove(&artifact.bucket, &artifact.file_path) {
                warn!("could not remove orphaned upload: {cleanup}");
            }
            return Err(err);
        }

        info!("published {} as {}", artifact.file_path, artifact.id);
        Ok(artifact)
    }

    /// Removes the stored object and then its metadata row.
    ///
    /// A storage object that is already gone is tolerated; the row is still removed.
    pub fn delete(&self, id: Uuid) -> StorageResult<GeneratedReportArtifact> {
        let artifact = self
            .records
            .get(id)?
            .ok_or(StorageError::UnknownArtifact(id))?;

        if !self.store.remove(&artifact.bucket, &artifact.file_path)? {
            warn!(
                "object {}/{} was already missing",
                artifact.bucket, artifact.file_path
            );
        }
        let removed = self.records.remove(id)?;
        info!("deleted artifact {id}");
        Ok(removed)
    }

    /// Reads the PDF stored for an artifact.
    pub fn download(&self, artifact: &GeneratedReportArtifact) -> StorageResult<Vec<u8>> {
        self.store.get(&artifact.bucket, &artifact.file_path)
    }

    /// Artifacts for a report, newest first.
    pub fn list_for_report(&self, report_id: &str) -> StorageResult<Vec<GeneratedReportArtifact>> {
        self.records.list_for_report(report_id)
    }
}

/// Builds `{project_id}/{file_name}`, rejecting segments that would escape the bucket.
pub fn object_path(project_id: &str, file_name: &str) -> StorageResult<String> {
    validate_segment(project_id)?;
    validate_segment(file_name)?;
    Ok(format!("{project_id}/{file_name}"))
}

pub(crate) fn validate_segment(segment: &str) -> StorageResult<()> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
        || segment.chars().any(char::is_control);
    if invalid {
        Err(StorageError::InvalidKey(segment.to_string()))
    } else {
        Ok(())
    }
}

/// File name for a published PDF, e.g. `Cost_Report_12_RevB_20261017-101500.pdf`.
pub fn artifact_file_name(
    kind: ReportKind,
    report_number: u32,
    revision: &str,
    timestamp: DateTime<Utc>,
) -> String {
    let revision = sanitize(revision);
    let stamp = timestamp.format("%Y%m%d-%H%M%S");
    if revision.is_empty() {
        format!("{}_{report_number}_{stamp}.pdf", kind.file_stem())
    } else {
        format!("{}_{report_number}_Rev{revision}_{stamp}.pdf", kind.file_stem())
    }
}

fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}
