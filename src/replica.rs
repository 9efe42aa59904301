//! The extension-side replica: the last successfully pulled bundle, kept in
//! local storage so pages can theme themselves without waiting on the
//! bridge.
//!
//! The replica is eventually consistent by construction. It only ever moves
//! forward to whatever the replication loop pulled last; it never edits
//! theme data itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::types::{REPLICA_KEY, ReplicaRecord, ThemeBundle};
use crate::util;

#[derive(Debug, Error)]
pub enum ReplicaError {
    #[error("replica io: {0}")]
    Io(#[from] std::io::Error),
    #[error("replica encode: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Shared handle to the replica. Clones observe the same cell.
#[derive(Debug, Clone)]
pub struct ExtensionReplica {
    inner: Arc<ReplicaInner>,
}

#[derive(Debug)]
struct ReplicaInner {
    path: Option<PathBuf>,
    counter: AtomicU64,
    cell: watch::Sender<Option<ReplicaRecord>>,
}

impl ExtensionReplica {
    /// Open a replica backed by a local storage file.
    ///
    /// A missing file is first launch; an unreadable or corrupt one is
    /// logged and treated as absent. Either way the replica starts serving
    /// and the next successful pull overwrites the file.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let loaded = load_record(&path).await;
        Self::build(Some(path), loaded)
    }

    /// Replica with no persistence, for tests and ephemeral runs.
    pub fn in_memory() -> Self {
        Self::build(None, None)
    }

    fn build(path: Option<PathBuf>, loaded: Option<ReplicaRecord>) -> Self {
        let counter = AtomicU64::new(loaded.as_ref().map_or(0, |record| record.sync_count));
        let (cell, _) = watch::channel(loaded);
        Self {
            inner: Arc::new(ReplicaInner {
                path,
                counter,
                cell,
            }),
        }
    }

    /// Stamp and store a freshly pulled bundle, then wake subscribers.
    ///
    /// The stamp is always new: the counter increases and the nonce is
    /// regenerated even when `bundle` equals the previous one, so observers
    /// can tell "synced again, nothing changed" from "not syncing".
    /// Persistence happens before notification; subscribers only ever see
    /// states that made it to disk. A failed persist hands the reserved
    /// count back unless a concurrent publish already claimed a later one.
    pub async fn publish(&self, bundle: ThemeBundle) -> Result<ReplicaRecord, ReplicaError> {
        let count = self.inner.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let record = ReplicaRecord::stamp(bundle, count);

        if let Some(path) = &self.inner.path
            && let Err(err) = self.persist(path, &record).await
        {
            let _ = self.inner.counter.compare_exchange(
                count,
                count - 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            );
            return Err(err);
        }

        self.inner.cell.send_replace(Some(record.clone()));
        Ok(record)
    }

    async fn persist(&self, path: &Path, record: &ReplicaRecord) -> Result<(), ReplicaError> {
        let mut doc = serde_json::Map::new();
        doc.insert(REPLICA_KEY.to_owned(), serde_json::to_value(record)?);
        let bytes = serde_json::to_vec_pretty(&doc)?;
        util::write_atomic(path, &bytes).await?;
        Ok(())
    }

    /// Latest record, if any pull ever succeeded (now or in a past run).
    pub fn current(&self) -> Option<ReplicaRecord> {
        self.inner.cell.borrow().clone()
    }

    /// Watch for new records. The receiver also yields the current value.
    pub fn subscribe(&self) -> watch::Receiver<Option<ReplicaRecord>> {
        self.inner.cell.subscribe()
    }

    pub fn sync_count(&self) -> u64 {
        self.inner.counter.load(Ordering::Relaxed)
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }
}

async fn load_record(path: &Path) -> Option<ReplicaRecord> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no replica cache yet");
            return None;
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "replica cache unreadable, starting empty");
            return None;
        }
    };

    let parsed = serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|mut doc| doc.get_mut(REPLICA_KEY).map(serde_json::Value::take))
        .and_then(|value| serde_json::from_value::<ReplicaRecord>(value).ok());
    if parsed.is_none() {
        warn!(path = %path.display(), "replica cache corrupt, starting empty");
    }
    parsed
}
