use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};

/// Timing knobs of the replication loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    /// How often the loop polls the bridge on its own.
    pub poll_interval: Duration,
    /// How long a single bridge request may take before it counts as failed.
    pub bridge_timeout: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            bridge_timeout: Duration::from_secs(5),
        }
    }
}

impl SyncPolicy {
    /// Oldest a replica record can get while the loop and the bridge are
    /// both healthy: one missed poll plus one full bridge wait.
    pub fn staleness_bound(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.poll_interval + self.bridge_timeout)
            .unwrap_or(chrono::Duration::MAX)
    }
}

/// Handle to the replication loop held by everything that wants a pull now.
///
/// Cheaply cloneable. When the last handle is dropped the request channel
/// closes, signalling the loop to shut down.
#[derive(Debug, Clone)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<Request>,
    notices: broadcast::Sender<Notice>,
}

impl SyncHandle {
    pub(super) fn new(tx: mpsc::UnboundedSender<Request>, notices: broadcast::Sender<Notice>) -> Self {
        Self { tx, notices }
    }

    /// Send a request to the loop. Non-blocking; returns immediately.
    pub fn send(&self, req: Request) {
        // Ignore errors: if the receiver is gone the loop has already shut down.
        let _ = self.tx.send(req);
    }

    /// Ask for an immediate pull and wait for its reply.
    ///
    /// This is the handler behind the wire `checkThemeUpdate` message; the
    /// reply is that message's `{"success": …}` response body.
    pub async fn resync(&self) -> ResyncReply {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Request::Resync { reply_tx });
        reply_rx
            .await
            .unwrap_or_else(|_| ResyncReply::failure("replication loop is gone"))
    }

    /// Subscribe to update notices. Slow subscribers lose old notices
    /// rather than stalling the loop.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn shutdown(&self) {
        self.send(Request::Shutdown);
    }
}

/// All operations callers can send to the replication loop.
#[derive(Debug)]
pub enum Request {
    /// Pull from the bridge now and reply once with the outcome.
    Resync {
        reply_tx: oneshot::Sender<ResyncReply>,
    },
    Shutdown,
}

/// Wire reply to an on-demand pull: `{"success": true}` or
/// `{"success": false, "error": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResyncReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResyncReply {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Runtime messages addressed to the replication loop from the host side.
/// `{"type": "checkThemeUpdate"}` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RunnerMessage {
    CheckThemeUpdate,
}

/// Broadcast to open pages whenever a pull published fresh data.
/// `{"type": "THEME_UPDATED"}` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notice {
    #[serde(rename = "THEME_UPDATED")]
    ThemeUpdated,
}
