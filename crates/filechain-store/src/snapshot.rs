//! File-backed chain-state snapshot.
//!
//! The snapshot is the whole chain encoded as CBOR. Writes go to a sibling
//! temp file which is fsynced and then renamed over the target, so a reader
//! sees either the old snapshot or the new one, never a torn write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use filechain_core::{ChainSnapshot, SnapshotRef};

use crate::error::{Result, SnapshotError, StoreError};
use crate::traits::SnapshotStore;

/// Encode a chain view into snapshot bytes.
pub fn encode_snapshot(snapshot: SnapshotRef<'_>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(&snapshot, &mut buf)
        .map_err(|e| SnapshotError::Write(e.to_string()))?;
    Ok(buf)
}

/// Decode snapshot bytes.
///
/// Only the encoding is checked here; [`Chain::from_snapshot`] verifies the
/// chain itself.
pub fn decode_snapshot(bytes: &[u8]) -> Result<ChainSnapshot> {
    ciborium::from_reader(bytes)
        .map_err(|e| SnapshotError::Corrupt(e.to_string()).into())
}

/// Snapshot stored in a single file.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_atomic(path: &Path, tmp: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(tmp, path)?;

    // The rename is only durable once the directory entry is.
    sync_dir(parent.unwrap_or_else(|| Path::new(".")))
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load_snapshot(&self) -> Result<Option<ChainSnapshot>> {
        let path = self.path.clone();

        let bytes = tokio::task::spawn_blocking(move || match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnapshotError::Unreadable(format!("{}: {}", path.display(), e))),
        })
        .await
        .map_err(StoreError::task_failed)??;

        match bytes {
            Some(bytes) => decode_snapshot(&bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn save_snapshot(&self, snapshot: SnapshotRef<'_>) -> Result<()> {
        let bytes = encode_snapshot(snapshot)?;
        let path = self.path.clone();
        let tmp = self.tmp_path();

        tokio::task::spawn_blocking(move || {
            write_atomic(&path, &tmp, &bytes)
                .map_err(|e| SnapshotError::Write(format!("{}: {}", path.display(), e)))
        })
        .await
        .map_err(StoreError::task_failed)??;

        tracing::trace!(path = %self.path.display(), blocks = snapshot.len(), "snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filechain_core::{Chain, FileSize, Timestamp, TransferRecord};

    fn sample_chain(len: usize) -> Chain {
        let mut chain = Chain::new(
            TransferRecord::new("rishabh_bhatnagar", "rishabh", "bhatnagar", FileSize::ZERO),
            Timestamp::from_micros(1_736_870_400_000_000),
        );
        for i in 1..len as u64 {
            let block = chain.candidate(
                TransferRecord::new("report.pdf", "alice", "bob", FileSize::new(2048)),
                Timestamp::from_micros(1_736_870_400_000_000 + i * 1_000_000),
            );
            chain.push(block).unwrap();
        }
        chain
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("chain.snapshot"));
        assert!(store.load_snapshot().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("state").join("chain.snapshot"));
        let chain = sample_chain(3);

        store.save_snapshot(chain.as_snapshot()).await.unwrap();
        let loaded = store.load_snapshot().await.unwrap().unwrap();
        assert_eq!(Chain::from_snapshot(loaded).unwrap(), chain);
        assert!(!store.tmp_path().exists());
    }

    #[tokio::test]
    async fn test_save_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("chain.snapshot"));

        store.save_snapshot(sample_chain(2).as_snapshot()).await.unwrap();
        store.save_snapshot(sample_chain(4).as_snapshot()).await.unwrap();

        let loaded = store.load_snapshot().await.unwrap().unwrap();
        assert_eq!(loaded.blocks.len(), 4);
    }

    #[tokio::test]
    async fn test_garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.snapshot");
        fs::write(&path, b"definitely not cbor").unwrap();

        let store = FileSnapshotStore::new(&path);
        assert!(matches!(
            store.load_snapshot().await,
            Err(StoreError::Snapshot(SnapshotError::Corrupt(_)))
        ));
    }

    #[tokio::test]
    async fn test_directory_in_place_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        assert!(matches!(
            store.load_snapshot().await,
            Err(StoreError::Snapshot(SnapshotError::Unreadable(_)))
        ));
    }

    #[test]
    fn test_write_atomic_syncs_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh").join("chain.snapshot");
        let tmp = dir.path().join("fresh").join("chain.snapshot.tmp");

        write_atomic(&path, &tmp, b"v1").unwrap();
        write_atomic(&path, &tmp, b"v2").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"v2");
        assert!(!tmp.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_sync_dir_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        sync_dir(dir.path()).unwrap();
        assert!(sync_dir(&dir.path().join("gone")).is_err());
    }

    #[test]
    fn test_tmp_path_is_sibling() {
        let store = FileSnapshotStore::new("/var/lib/filechain/chain.snapshot");
        assert_eq!(
            store.tmp_path(),
            PathBuf::from("/var/lib/filechain/chain.snapshot.tmp")
        );
    }
}
