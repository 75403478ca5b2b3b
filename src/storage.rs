//! Object-storage seam and the deterministic key scheme.
//!
//! The pipeline never talks to a concrete storage backend directly; it goes
//! through the narrow [`ObjectStore`] trait so the same code runs against
//! an in-memory map in tests, a local directory tree, or a remote bucket
//! store behind an adapter.
//!
//! All object keys are pure functions of the tracking id and page index
//! (see [`source_key`], [`page_key`], [`manifest_key`], [`entities_key`]),
//! so re-invoking a document overwrites its previous artifacts instead of
//! duplicating them.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from an object-storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },
    #[error("bucket not found: {0}")]
    BucketNotFound(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Narrow interface over an object store.
///
/// Buckets are flat namespaces of `/`-separated keys. Implementations must
/// be safe to share across concurrent pipeline invocations.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>>;
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> StorageResult<()>;
    async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> StorageResult<()>;
    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()>;
    async fn list(&self, bucket: &str) -> StorageResult<Vec<String>>;
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool>;
}

// ── Key scheme ───────────────────────────────────────────────────────────

/// Derive the stable tracking id for a source filename: the filename with
/// its final extension removed.
pub fn tracking_id_for(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => filename.to_string(),
    }
}

/// Key of the relocated source document: `{tracking_id}/{filename}`.
pub fn source_key(tracking_id: &str, filename: &str) -> String {
    format!("{tracking_id}/{filename}")
}

/// Key of one split page artifact:
/// `{tracking_id}/{stem}_page_{NNN}.pdf` with a 1-based, zero-padded page
/// number.
pub fn page_key(tracking_id: &str, filename: &str, page_num: u32) -> String {
    let stem = tracking_id_for(filename);
    format!("{tracking_id}/{stem}_page_{page_num:03}.pdf")
}

/// Key of the persisted job manifest.
pub fn manifest_key(tracking_id: &str) -> String {
    format!("{tracking_id}/jobs.json")
}

/// Key of the persisted result record.
pub fn entities_key(tracking_id: &str) -> String {
    format!("{tracking_id}/entities.json")
}

// ── In-memory backend ────────────────────────────────────────────────────

/// In-memory [`ObjectStore`] backed by a mutex-guarded map.
///
/// Intended for tests and embedded use; buckets must be created explicitly
/// with [`MemoryStore::create_bucket`], matching remote stores where a
/// `put` to a missing bucket is an error rather than an implicit create.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: Mutex<HashMap<String, HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bucket (idempotent).
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(bucket.to_string())
            .or_default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, HashMap<String, Vec<u8>>>> {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        let buckets = self.lock();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        objects.get(key).cloned().ok_or_else(|| StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> StorageResult<()> {
        let mut buckets = self.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        objects.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> StorageResult<()> {
        let bytes = self.get(src_bucket, src_key).await?;
        self.put(dst_bucket, dst_key, bytes).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let mut buckets = self.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        objects.remove(key).ok_or_else(|| StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;
        Ok(())
    }

    async fn list(&self, bucket: &str) -> StorageResult<Vec<String>> {
        let buckets = self.lock();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        let mut keys: Vec<String> = objects.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        Ok(self.lock().contains_key(bucket))
    }
}

// ── Filesystem backend ───────────────────────────────────────────────────

/// [`ObjectStore`] over a local directory tree: each bucket is a directory
/// under the root, each key a relative file path beneath it.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a bucket directory (idempotent).
    pub async fn create_bucket(&self, bucket: &str) -> StorageResult<()> {
        tokio::fs::create_dir_all(self.root.join(bucket))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        let mut path = self.root.join(bucket);
        for part in key.split('/') {
            path.push(part);
        }
        path
    }

    async fn require_bucket(&self, bucket: &str) -> StorageResult<PathBuf> {
        let dir = self.root.join(bucket);
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(dir),
            Ok(_) => Err(StorageError::BucketNotFound(bucket.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::BucketNotFound(bucket.to_string()))
            }
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        self.require_bucket(bucket).await?;
        match tokio::fs::read(self.object_path(bucket, key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }

    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> StorageResult<()> {
        self.require_bucket(bucket).await?;
        let path = self.object_path(bucket, key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))
    }

    async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> StorageResult<()> {
        let bytes = self.get(src_bucket, src_key).await?;
        self.put(dst_bucket, dst_key, bytes).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.require_bucket(bucket).await?;
        match tokio::fs::remove_file(self.object_path(bucket, key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }

    async fn list(&self, bucket: &str) -> StorageResult<Vec<String>> {
        let dir = self.require_bucket(bucket).await?;
        let mut keys = Vec::new();
        let mut pending: Vec<PathBuf> = vec![dir.clone()];
        while let Some(current) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&current)
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StorageError::Backend(e.to_string()))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if let Some(key) = relative_key(&dir, &path) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        match tokio::fs::metadata(self.root.join(bucket)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }
}

/// Render a file path under `base` as a `/`-separated object key.
fn relative_key(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
