//! The canonical theme store: one JSON document in a namespace every
//! process of the app can reach.
//!
//! Writers replace the whole document. Two processes writing concurrently
//! race on the final rename and the later writer wins; fields are never
//! merged. That is the contract editors rely on: read, mutate your section,
//! write the whole bundle back.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::ThemeBundle;
use crate::util;

/// Namespace shared by the host app, its extensions and the keyboard.
pub const SHARED_NAMESPACE: &str = "group.app.tint.shared";

/// Document name inside the namespace directory.
const BUNDLE_FILE: &str = "themeData.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] io::Error),
    #[error("store document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read and replace the shared theme document.
///
/// `read` distinguishes "no document yet" (`Ok(None)`) from a failing or
/// corrupt store, so callers can treat first launch differently from an
/// outage.
pub trait ConfigStore: Send + Sync + 'static {
    fn read(&self) -> impl Future<Output = Result<Option<ThemeBundle>, StoreError>> + Send;

    fn write(&self, bundle: &ThemeBundle) -> impl Future<Output = Result<(), StoreError>> + Send;
}

// ----------------------------------------------------------------------------
// File-backed store

/// Store backed by `<root>/<namespace>/themeData.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store rooted at the app-group container directory, using the shared
    /// namespace.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_namespace(root, SHARED_NAMESPACE)
    }

    pub fn with_namespace(root: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            path: root.as_ref().join(namespace).join(BUNDLE_FILE),
        }
    }

    /// Absolute path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileStore {
    async fn read(&self) -> Result<Option<ThemeBundle>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store document absent");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let bundle = serde_json::from_slice(&bytes)?;
        Ok(Some(bundle))
    }

    async fn write(&self, bundle: &ThemeBundle) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(bundle)?;
        util::write_atomic(&self.path, &bytes).await?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "store document written");
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// In-memory store

/// In-memory store for tests and ephemeral runs.
///
/// Reads can be made to fail on demand, which is how tests exercise the
/// degraded paths without touching a filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    bundle: Option<ThemeBundle>,
    fail_reads: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(bundle: ThemeBundle) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryInner {
                bundle: Some(bundle),
                fail_reads: false,
            })),
        }
    }

    /// Make subsequent reads fail with [`StoreError::Unavailable`].
    pub async fn set_fail_reads(&self, fail: bool) {
        self.inner.write().await.fail_reads = fail;
    }

    /// Current document, bypassing the failure switch.
    pub async fn snapshot(&self) -> Option<ThemeBundle> {
        self.inner.read().await.bundle.clone()
    }
}

impl ConfigStore for MemoryStore {
    async fn read(&self) -> Result<Option<ThemeBundle>, StoreError> {
        let inner = self.inner.read().await;
        if inner.fail_reads {
            return Err(StoreError::Unavailable("injected read failure".to_owned()));
        }
        Ok(inner.bundle.clone())
    }

    async fn write(&self, bundle: &ThemeBundle) -> Result<(), StoreError> {
        self.inner.write().await.bundle = Some(bundle.clone());
        Ok(())
    }
}
