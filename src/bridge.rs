//! The native bridge: stateless request/response between the extension
//! side and the host app.
//!
//! The host side serves each request from the canonical store and replies
//! exactly once; it keeps no session state between calls. The extension
//! side holds a [`BridgeHandle`] (or none, when the platform denies the
//! capability) and treats every failure as "no data this time".

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::store::ConfigStore;
use crate::types::ThemeBundle;

// ----------------------------------------------------------------------------
// Wire types

/// Requests the extension side may send. The `kind` spelling is part of the
/// wire contract with already-shipped extension builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BridgeRequest {
    /// Fetch the current theme bundle.
    SyncTheme,
}

/// Reply to [`BridgeRequest::SyncTheme`].
///
/// Exactly one of three shapes goes over the wire: `{"themeData": …}` when
/// the store has a document, `{}` when it has none, `{"error": …}` when the
/// host could not read it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_data: Option<ThemeBundle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResponse {
    pub fn data(bundle: ThemeBundle) -> Self {
        Self {
            theme_data: Some(bundle),
            error: None,
        }
    }

    /// The store had no document. Not an error; first launch looks like this.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            theme_data: None,
            error: Some(error.into()),
        }
    }

    /// Fold the wire shape back into a result for the caller.
    pub fn into_result(self) -> Result<Option<ThemeBundle>, BridgeError> {
        match self.error {
            Some(error) => Err(BridgeError::Host(error)),
            None => Ok(self.theme_data),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The host side is gone; no reply will ever come.
    #[error("bridge closed")]
    Closed,
    #[error("bridge request timed out after {0:?}")]
    TimedOut(Duration),
    /// The host answered with its error shape.
    #[error("host error: {0}")]
    Host(String),
}

// ----------------------------------------------------------------------------
// Host side

#[derive(Debug)]
enum Call {
    SyncTheme {
        reply_tx: oneshot::Sender<BridgeResponse>,
    },
}

/// Host side of the bridge.
pub struct BridgeServer;

impl BridgeServer {
    /// Start serving requests from `store`. The server runs until every
    /// [`BridgeHandle`] is dropped.
    ///
    /// Each call is served on its own task; a slow store read never stalls
    /// requests queued behind it.
    pub fn spawn<S: ConfigStore>(store: Arc<S>) -> BridgeHandle {
        let (call_tx, mut call_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(call) = call_rx.recv().await {
                match call {
                    Call::SyncTheme { reply_tx } => {
                        let store = store.clone();
                        tokio::spawn(async move {
                            let response = serve_sync_theme(store.as_ref()).await;
                            // Receiver may have timed out and gone away.
                            let _ = reply_tx.send(response);
                        });
                    }
                }
            }
            debug!("bridge server stopped: all handles dropped");
        });
        BridgeHandle { call_tx }
    }
}

async fn serve_sync_theme<S: ConfigStore>(store: &S) -> BridgeResponse {
    match store.read().await {
        Ok(Some(bundle)) => BridgeResponse::data(bundle),
        Ok(None) => BridgeResponse::empty(),
        Err(err) => {
            warn!(error = %err, "sync request could not read the store");
            BridgeResponse::failure(err.to_string())
        }
    }
}

// ----------------------------------------------------------------------------
// Extension side

/// Extension side of the bridge. Cheap to clone; all clones talk to the
/// same server.
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    call_tx: mpsc::UnboundedSender<Call>,
}

impl BridgeHandle {
    /// Send one `syncTheme` request and wait for its single reply.
    pub async fn sync_theme(&self) -> Result<BridgeResponse, BridgeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.call_tx
            .send(Call::SyncTheme { reply_tx })
            .map_err(|_| BridgeError::Closed)?;
        reply_rx.await.map_err(|_| BridgeError::Closed)
    }

    /// Fetch the bundle, folding the host's error shape into [`BridgeError`].
    pub async fn fetch_bundle(&self) -> Result<Option<ThemeBundle>, BridgeError> {
        self.sync_theme().await?.into_result()
    }
}
