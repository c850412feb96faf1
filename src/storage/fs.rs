//! Filesystem backends: one directory per bucket and a JSON file of artifact rows.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{
    validate_segment, ArtifactRecords, ArtifactSink, Buckets, GeneratedReportArtifact, ObjectStore,
    StorageError, StorageResult,
};
use crate::config::StorageSettings;

/// Object store keeping every bucket as a sub-directory of `root`.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Creates a store rooted at `root`; directories are created on first upload.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, bucket: &str, path: &str) -> StorageResult<PathBuf> {
        validate_segment(bucket)?;
        let mut location = self.root.join(bucket);
        for segment in path.split('/') {
            validate_segment(segment)?;
            location.push(segment);
        }
        Ok(location)
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, bucket: &str, path: &str, bytes: &[u8]) -> StorageResult<()> {
        let location = self.locate(bucket, path)?;
        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent).map_err(|err| StorageError::io(parent, err))?;
        }
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&location) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::already_exists(bucket, path));
            }
            Err(err) => return Err(StorageError::io(&location, err)),
        };
        if let Err(err) = file.write_all(bytes).and_then(|()| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(&location);
            return Err(StorageError::io(&location, err));
        }
        Ok(())
    }

    fn get(&self, bucket: &str, path: &str) -> StorageResult<Vec<u8>> {
        let location = self.locate(bucket, path)?;
        fs::read(&location).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StorageError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            },
            _ => StorageError::io(&location, err),
        })
    }

    fn remove(&self, bucket: &str, path: &str) -> StorageResult<bool> {
        let location = self.locate(bucket, path)?;
        match fs::remove_file(&location) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::io(&location, err)),
        }
    }

    fn exists(&self, bucket: &str, path: &str) -> StorageResult<bool> {
        Ok(self.locate(bucket, path)?.is_file())
    }
}

/// Artifact rows stored as a pretty-printed JSON array.
///
/// Single writer only. `insert` and `remove` rewrite the whole file without a lock, so two
/// processes publishing into the same records file at once can lose a row and leave its object
/// orphaned. Readers always see a complete file because saves go through a rename.
#[derive(Clone, Debug)]
pub struct JsonArtifactRecords {
    path: PathBuf,
}

impl JsonArtifactRecords {
    /// Uses `path` as the records file; a missing file reads as an empty table.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the records file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StorageResult<Vec<GeneratedReportArtifact>> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Vec::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(StorageError::io(&self.path, err)),
        }
    }

    fn save(&self, rows: &[GeneratedReportArtifact]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StorageError::io(parent, err))?;
        }
        let text = serde_json::to_string_pretty(rows)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, text).map_err(|err| StorageError::io(&staging, err))?;
        fs::rename(&staging, &self.path).map_err(|err| StorageError::io(&self.path, err))
    }
}

impl ArtifactRecords for JsonArtifactRecords {
    fn insert(&self, artifact: &GeneratedReportArtifact) -> StorageResult<()> {
        let mut rows = self.load()?;
        if rows.iter().any(|row| row.id == artifact.id) {
            return Err(StorageError::DuplicateArtifact(artifact.id));
        }
        rows.push(artifact.clone());
        self.save(&rows)
    }

    fn get(&self, id: Uuid) -> StorageResult<Option<GeneratedReportArtifact>> {
        Ok(self.load()?.into_iter().find(|row| row.id == id))
    }

    fn list_for_report(&self, report_id: &str) -> StorageResult<Vec<GeneratedReportArtifact>> {
        let mut rows: Vec<_> = self
            .load()?
            .into_iter()
            .filter(|row| row.report_id == report_id)
            .collect();
        rows.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        Ok(rows)
    }

    fn remove(&self, id: Uuid) -> StorageResult<GeneratedReportArtifact> {
        let mut rows = self.load()?;
        let index = rows
            .iter()
            .position(|row| row.id == id)
            .ok_or(StorageError::UnknownArtifact(id))?;
        let removed = rows.remove(index);
        self.save(&rows)?;
        Ok(removed)
    }
}

/// Filesystem-backed sink configured from settings.
pub fn sink_from_settings(
    settings: &StorageSettings,
) -> ArtifactSink<FsObjectStore, JsonArtifactRecords> {
    ArtifactSink::new(
        FsObjectStore::new(&settings.root),
        JsonArtifactRecords::new(&settings.records_file),
        Buckets::from(settings),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ReportKind;
    use chrono::Utc;

    fn artifact(report_id: &str) -> GeneratedReportArtifact {
        GeneratedReportArtifact {
            id: Uuid::new_v4(),
            report_id: report_id.into(),
            project_id: "p".into(),
            kind: ReportKind::CostReport,
            revision: "A".into(),
            bucket: "cost-report-pdfs".into(),
            file_path: "p/a.pdf".into(),
            file_size: 3,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn objects_live_under_bucket_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        store.put("bucket", "project/file.pdf", b"abc").unwrap();
        assert!(dir.path().join("bucket/project/file.pdf").is_file());
        assert_eq!(store.get("bucket", "project/file.pdf").unwrap(), b"abc");

        assert!(store.remove("bucket", "project/file.pdf").unwrap());
        assert!(!store.remove("bucket", "project/file.pdf").unwrap());
        assert!(matches!(
            store.get("bucket", "project/file.pdf"),
            Err(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn existing_objects_are_never_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        store.put("bucket", "project/file.pdf", b"first").unwrap();
        assert!(matches!(
            store.put("bucket", "project/file.pdf", b"second"),
            Err(StorageError::AlreadyExists { .. })
        ));
        assert_eq!(store.get("bucket", "project/file.pdf").unwrap(), b"first");
    }

    #[test]
    fn traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        assert!(matches!(
            store.put("bucket", "../escape.pdf", b"x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(store.put("..", "file.pdf", b"x").is_err());
    }

    #[test]
    fn records_persist_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/artifacts.json");
        let first = artifact("r1");
        let other = artifact("r2");

        let records = JsonArtifactRecords::new(&path);
        assert!(records.list_for_report("r1").unwrap().is_empty());
        records.insert(&first).unwrap();
        records.insert(&other).unwrap();
        assert!(matches!(
            records.insert(&first),
            Err(StorageError::DuplicateArtifact(_))
        ));

        let reopened = JsonArtifactRecords::new(&path);
        assert_eq!(reopened.get(first.id).unwrap(), Some(first.clone()));
        assert_eq!(reopened.list_for_report("r1").unwrap(), vec![first.clone()]);

        reopened.remove(first.id).unwrap();
        assert!(records.get(first.id).unwrap().is_none());
        assert!(records.get(other.id).unwrap().is_some());
    }

    #[test]
    fn malformed_records_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifacts.json");
        fs::write(&path, "{not json").unwrap();
        let records = JsonArtifactRecords::new(&path);
        assert!(matches!(records.get(Uuid::nil()), Err(StorageError::Records(_))));
    }
}
