//! Content stores with BLAKE3 integrity hashes and quota enforcement.
//!
//! Raw document bytes never live on entity records; they are stored here
//! behind opaque [`ContentRef`]s. Two implementations:
//! - [`FilesystemContentStore`]: sharded blob paths, atomic writes,
//!   read-back integrity verification
//! - [`MemoryContentStore`]: heap-backed store for tests and embedders
//!   that do not need persistence
//!
//! Each store instance enforces its own quota; tenants get separate
//! instances so usage never interacts across tenants.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use scriven_core::{ContentRef, ContentStore, Error, Result};

/// Compute BLAKE3 hash of data with "blake3:" prefix.
///
/// Returns a string in the format: `blake3:{64-char-hex}`
pub fn compute_content_hash(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    format!("blake3:{}", hash.to_hex())
}

/// Generate storage path from a content reference.
///
/// Path format: `blobs/{first-2-hex}/{next-2-hex}/{uuid}.bin`
pub fn generate_storage_path(content_ref: ContentRef) -> String {
    let hex = content_ref.0.as_hyphenated().to_string().replace('-', "");
    format!(
        "blobs/{}/{}/{}.bin",
        &hex[0..2],
        &hex[2..4],
        content_ref.0.as_hyphenated()
    )
}

#[derive(Debug, Clone)]
struct BlobEntry {
    path: String,
    size: i64,
    hash: String,
}

#[derive(Default)]
struct BlobIndex {
    entries: HashMap<Uuid, BlobEntry>,
    used_bytes: i64,
}

impl BlobIndex {
    /// Fails without reserving when the write would cross the quota.
    fn reserve(&mut self, size: i64, quota: i64) -> Result<()> {
        if self.used_bytes + size > quota {
            return Err(Error::QuotaExceeded {
                used_bytes: self.used_bytes,
                limit_bytes: quota,
            });
        }
        self.used_bytes += size;
        Ok(())
    }

    fn release(&mut self, size: i64) {
        self.used_bytes -= size;
    }
}

// =============================================================================
// FILESYSTEM STORE
// =============================================================================

/// Filesystem content store.
///
/// Stores blobs in a directory hierarchy keyed by UUIDv7 references.
/// Writes are atomic (temp file + rename) and reads verify the BLAKE3
/// hash recorded at write time. [`Self::open`] rebuilds the in-memory
/// index from disk, so a store reopened over the same directory serves
/// previously stored references with accurate quota usage.
pub struct FilesystemContentStore {
    base_path: PathBuf,
    quota_bytes: i64,
    index: Arc<Mutex<BlobIndex>>,
}

impl FilesystemContentStore {
    /// Create a store rooted at `base_path` with the given quota,
    /// starting from an empty index. Use [`Self::open`] for a directory
    /// that may already hold blobs from a previous run.
    pub fn new(base_path: impl Into<PathBuf>, quota_bytes: i64) -> Self {
        Self {
            base_path: base_path.into(),
            quota_bytes,
            index: Arc::new(Mutex::new(BlobIndex::default())),
        }
    }

    /// Open a store over an existing directory, rebuilding the blob
    /// index from the files on disk so references resolve across
    /// restarts and quota accounting picks up where it left off.
    pub async fn open(base_path: impl Into<PathBuf>, quota_bytes: i64) -> Result<Self> {
        let store = Self::new(base_path, quota_bytes);
        store.rebuild_index().await?;
        Ok(store)
    }

    /// Scan `blobs/xx/yy/*.bin` and repopulate the index. Leftover
    /// `.tmp` files from interrupted writes are ignored.
    async fn rebuild_index(&self) -> Result<()> {
        let blobs_root = self.base_path.join("blobs");
        if !fs::try_exists(&blobs_root).await? {
            return Ok(());
        }

        let mut rebuilt = BlobIndex::default();
        let mut shards = fs::read_dir(&blobs_root).await?;
        while let Some(shard) = shards.next_entry().await? {
            if !shard.file_type().await?.is_dir() {
                continue;
            }
            let mut subshards = fs::read_dir(shard.path()).await?;
            while let Some(subshard) = subshards.next_entry().await? {
                if !subshard.file_type().await?.is_dir() {
                    continue;
                }
                let mut blobs = fs::read_dir(subshard.path()).await?;
                while let Some(blob) = blobs.next_entry().await? {
                    let path = blob.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("bin") {
                        continue;
                    }
                    let id = match path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .and_then(|s| Uuid::parse_str(s).ok())
                    {
                        Some(id) => id,
                        None => {
                            warn!(path = %path.display(), "content_store: skipping unrecognized file");
                            continue;
                        }
                    };
                    let data = fs::read(&path).await?;
                    let size = data.len() as i64;
                    rebuilt.used_bytes += size;
                    rebuilt.entries.insert(
                        id,
                        BlobEntry {
                            path: generate_storage_path(ContentRef(id)),
                            size,
                            hash: compute_content_hash(&data),
                        },
                    );
                }
            }
        }

        debug!(
            blobs = rebuilt.entries.len(),
            used_bytes = rebuilt.used_bytes,
            "content_store: index rebuilt from disk"
        );
        *self.index.lock().await = rebuilt;
        Ok(())
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    /// Validate that the store can write, read, and delete files.
    ///
    /// Performs a full round-trip test at startup to catch filesystem
    /// issues (permission errors, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join("blobs/.health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }

    async fn write_atomic(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);
        debug!(storage_path = %path, size = data.len(), "content_store: write");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "content_store: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "content_store: File::create failed");
            e
        })?;
        file.write_all(data).await.map_err(|e| {
            warn!(error = %e, "content_store: write_all failed");
            e
        })?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "content_store: rename failed");
            e
        })?;

        // 0644, no execute
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl ContentStore for FilesystemContentStore {
    async fn put(&self, data: &[u8]) -> Result<ContentRef> {
        let content_ref = ContentRef::generate();
        let path = generate_storage_path(content_ref);
        let size = data.len() as i64;
        let hash = compute_content_hash(data);

        // Reserve quota before touching the filesystem; a failed write
        // releases the reservation so usage stays accurate.
        {
            let mut index = self.index.lock().await;
            index.reserve(size, self.quota_bytes)?;
        }

        if let Err(e) = self.write_atomic(&path, data).await {
            let mut index = self.index.lock().await;
            index.release(size);
            return Err(e);
        }

        let mut index = self.index.lock().await;
        index
            .entries
            .insert(content_ref.0, BlobEntry { path, size, hash });
        Ok(content_ref)
    }

    async fn get(&self, content_ref: ContentRef) -> Result<Vec<u8>> {
        let entry = {
            let index = self.index.lock().await;
            index
                .entries
                .get(&content_ref.0)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("content {}", content_ref)))?
        };

        let data = fs::read(self.full_path(&entry.path)).await?;
        if compute_content_hash(&data) != entry.hash {
            return Err(Error::Internal(format!(
                "content hash mismatch for {}",
                content_ref
            )));
        }
        Ok(data)
    }

    async fn delete(&self, content_ref: ContentRef) -> Result<()> {
        let entry = {
            let mut index = self.index.lock().await;
            match index.entries.remove(&content_ref.0) {
                Some(entry) => {
                    index.release(entry.size);
                    entry
                }
                // Unknown reference: nothing to do.
                None => return Ok(()),
            }
        };

        let full_path = self.full_path(&entry.path);
        if fs::try_exists(&full_path).await? {
            fs::remove_file(full_path).await?;
        }
        Ok(())
    }

    async fn usage_bytes(&self) -> Result<i64> {
        Ok(self.index.lock().await.used_bytes)
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Heap-backed content store with the same quota semantics as the
/// filesystem store.
pub struct MemoryContentStore {
    quota_bytes: i64,
    blobs: Arc<Mutex<(HashMap<Uuid, Vec<u8>>, i64)>>,
}

impl MemoryContentStore {
    pub fn new(quota_bytes: i64) -> Self {
        Self {
            quota_bytes,
            blobs: Arc::new(Mutex::new((HashMap::new(), 0))),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, data: &[u8]) -> Result<ContentRef> {
        let size = data.len() as i64;
        let mut guard = self.blobs.lock().await;
        let (blobs, used) = &mut *guard;
        if *used + size > self.quota_bytes {
            return Err(Error::QuotaExceeded {
                used_bytes: *used,
                limit_bytes: self.quota_bytes,
            });
        }
        let content_ref = ContentRef::generate();
        blobs.insert(content_ref.0, data.to_vec());
        *used += size;
        Ok(content_ref)
    }

    async fn get(&self, content_ref: ContentRef) -> Result<Vec<u8>> {
        let guard = self.blobs.lock().await;
        guard
            .0
            .get(&content_ref.0)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("content {}", content_ref)))
    }

    async fn delete(&self, content_ref: ContentRef) -> Result<()> {
        let mut guard = self.blobs.lock().await;
        if let Some(data) = guard.0.remove(&content_ref.0) {
            guard.1 -= data.len() as i64;
        }
        Ok(())
    }

    async fn usage_bytes(&self) -> Result<i64> {
        Ok(self.blobs.lock().await.1)
    }
}
