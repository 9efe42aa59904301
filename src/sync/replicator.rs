use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::bridge::{BridgeError, BridgeHandle};
use crate::replica::{ExtensionReplica, ReplicaError};
use crate::types::{ReplicaRecord, ThemeBundle};

use super::interface::{Notice, Request, ResyncReply, SyncHandle, SyncPolicy};

/// The replication loop: keeps the extension replica caught up with the
/// host's canonical store.
///
/// Pulls happen at three moments: once at startup, whenever a resync
/// request arrives, and on a steady poll timer. Every successful pull
/// overwrites the replica unconditionally; the loop never diffs against
/// what the replica already holds to decide whether to publish.
pub struct Replicator {
    bridge: Option<BridgeHandle>,
    replica: ExtensionReplica,
    policy: SyncPolicy,
}

impl Replicator {
    /// `bridge` is `None` when the platform denied the native messaging
    /// capability; the loop then serves whatever the replica already has.
    pub fn new(bridge: Option<BridgeHandle>, replica: ExtensionReplica) -> Self {
        Self::with_policy(bridge, replica, SyncPolicy::default())
    }

    pub fn with_policy(
        bridge: Option<BridgeHandle>,
        replica: ExtensionReplica,
        policy: SyncPolicy,
    ) -> Self {
        Self {
            bridge,
            replica,
            policy,
        }
    }

    /// Start the loop on the current runtime.
    pub fn spawn(self) -> SyncHandle {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Request>();
        let (notice_tx, _) = broadcast::channel(16);
        let handle = SyncHandle::new(tx, notice_tx.clone());
        tokio::spawn(self.run_loop(rx, notice_tx));
        handle
    }

    async fn run_loop(self, mut rx: UnboundedReceiver<Request>, notices: broadcast::Sender<Notice>) {
        tracing::info!(
            "replicator: starting, poll {:?}, bridge timeout {:?}, staleness bound {:?}",
            self.policy.poll_interval,
            self.policy.bridge_timeout,
            self.policy.staleness_bound()
        );

        // Startup pull, before any request can arrive.
        let _ = self.pull_and_notify("startup", &notices).await;

        let mut poll_tick = tokio::time::interval(self.policy.poll_interval);
        // A stalled pull must not burst-fire the polls it missed.
        poll_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // Consume the first immediate tick; the startup pull just happened.
        poll_tick.tick().await;

        loop {
            tokio::select! {
                biased;
                maybe_req = rx.recv() => {
                    match maybe_req {
                        None | Some(Request::Shutdown) => {
                            tracing::debug!("replicator: shutting down");
                            break;
                        }
                        Some(Request::Resync { reply_tx }) => {
                            let reply = match self.pull_and_notify("resync", &notices).await {
                                Ok(_) => ResyncReply::ok(),
                                Err(e) => ResyncReply::failure(e.to_string()),
                            };
                            // The sender is consumed here; this reply happens
                            // at most once no matter how the pull went.
                            let _ = reply_tx.send(reply);
                        }
                    }
                }
                _ = poll_tick.tick() => {
                    let _ = self.pull_and_notify("poll", &notices).await;
                }
            }
        }
    }

    /// One pull, plus the update notice when it published something.
    async fn pull_and_notify(
        &self,
        trigger: &str,
        notices: &broadcast::Sender<Notice>,
    ) -> Result<PullOutcome, PullFailure> {
        let outcome = self.pull_once(trigger).await;
        if matches!(outcome, Ok(PullOutcome::Published(_))) {
            // Receiver count may be zero when no page listens; fine.
            let _ = notices.send(Notice::ThemeUpdated);
        }
        outcome
    }

    /// One pull: bridge request under the policy timeout, then publish.
    async fn pull_once(&self, trigger: &str) -> Result<PullOutcome, PullFailure> {
        let Some(bridge) = &self.bridge else {
            tracing::debug!("replicator: {trigger} pull skipped, no bridge capability");
            return Err(PullFailure::NoCapability);
        };

        let fetched = match tokio::time::timeout(self.policy.bridge_timeout, bridge.fetch_bundle())
            .await
        {
            Ok(result) => result,
            Err(_) => Err(BridgeError::TimedOut(self.policy.bridge_timeout)),
        };

        match fetched {
            Ok(Some(bundle)) => {
                let visibly_changed = self.globally_visible_change(&bundle);
                match self.replica.publish(bundle).await {
                    Ok(record) => {
                        if visibly_changed {
                            tracing::info!(
                                "replicator: {trigger} pull published record #{} (global colors changed)",
                                record.sync_count
                            );
                        } else {
                            tracing::debug!(
                                "replicator: {trigger} pull published record #{} (no visible change)",
                                record.sync_count
                            );
                        }
                        Ok(PullOutcome::Published(record))
                    }
                    Err(e) => {
                        tracing::warn!("replicator: {trigger} pull could not persist: {e}");
                        Err(e.into())
                    }
                }
            }
            Ok(None) => {
                tracing::debug!("replicator: {trigger} pull found an empty store");
                Ok(PullOutcome::Empty)
            }
            Err(e) => {
                tracing::warn!("replicator: {trigger} pull failed: {e}");
                Err(e.into())
            }
        }
    }

    /// Whether the pulled bundle differs from the replica in the fields a
    /// page would notice globally. Log flavor only; the publish decision
    /// never depends on this.
    fn globally_visible_change(&self, pulled: &ThemeBundle) -> bool {
        self.replica.current().is_none_or(|previous| {
            let old = &previous.bundle.global_theme;
            let new = &pulled.global_theme;
            old.enabled != new.enabled
                || old.background != new.background
                || old.text != new.text
                || old.link != new.link
        })
    }
}

#[derive(Debug)]
pub(super) enum PullOutcome {
    /// Fresh data went into the replica.
    Published(ReplicaRecord),
    /// The host store had no document; the replica keeps what it has.
    Empty,
}

#[derive(Debug, Error)]
pub(super) enum PullFailure {
    /// This deployment never got a bridge; an expected mode, not a fault.
    #[error("no bridge capability")]
    NoCapability,
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("replica rejected the pull: {0}")]
    Replica(#[from] ReplicaError),
}
