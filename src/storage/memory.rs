//! In-memory backends for previews and tests.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use super::{ArtifactRecords, GeneratedReportArtifact, ObjectStore, StorageError, StorageResult};

type ObjectKey = (String, String);

/// Object store holding every object in a map.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<ObjectKey, Vec<u8>>>,
}

impl MemoryObjectStore {
    fn objects(&self) -> MutexGuard<'_, BTreeMap<ObjectKey, Vec<u8>>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects().is_empty()
    }
}

fn key(bucket: &str, path: &str) -> ObjectKey {
    (bucket.to_string(), path.to_string())
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, bucket: &str, path: &str, bytes: &[u8]) -> StorageResult<()> {
        match self.objects().entry(key(bucket, path)) {
            Entry::Occupied(_) => Err(StorageError::already_exists(bucket, path)),
            Entry::Vacant(slot) => {
                slot.insert(bytes.to_vec());
                Ok(())
            }
        }
    }

    fn get(&self, bucket: &str, path: &str) -> StorageResult<Vec<u8>> {
        self.objects()
            .get(&key(bucket, path))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            })
    }

    fn remove(&self, bucket: &str, path: &str) -> StorageResult<bool> {
        Ok(self.objects().remove(&key(bucket, path)).is_some())
    }

    fn exists(&self, bucket: &str, path: &str) -> StorageResult<bool> {
        Ok(self.objects().contains_key(&key(bucket, path)))
    }
}

/// Artifact rows kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryArtifactRecords {
    rows: Mutex<Vec<GeneratedReportArtifact>>,
}

impl MemoryArtifactRecords {
    fn rows(&self) -> MutexGuard<'_, Vec<GeneratedReportArtifact>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }
}

impl ArtifactRecords for MemoryArtifactRecords {
    fn insert(&self, artifact: &GeneratedReportArtifact) -> StorageResult<()> {
        let mut rows = self.rows();
        if rows.iter().any(|row| row.id == artifact.id) {
            return Err(StorageError::DuplicateArtifact(artifact.id));
        }
        rows.push(artifact.clone());
        Ok(())
    }

    fn get(&self, id: Uuid) -> StorageResult<Option<GeneratedReportArtifact>> {
        Ok(self.rows().iter().find(|row| row.id == id).cloned())
    }

    fn list_for_report(&self, report_id: &str) -> StorageResult<Vec<GeneratedReportArtifact>> {
        let mut rows: Vec<_> = self
            .rows()
            .iter()
            .filter(|row| row.report_id == report_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        Ok(rows)
    }

    fn remove(&self, id: Uuid) -> StorageResult<GeneratedReportArtifact> {
        let mut rows = self.rows();
        let index = rows
            .iter()
            .position(|row| row.id == id)
            .ok_or(StorageError::UnknownArtifact(id))?;
        Ok(rows.remove(index))
    }
}
