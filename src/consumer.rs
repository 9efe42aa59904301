//! Page-side consumption: pick the freshest reachable theme source at
//! startup, render styles, follow later updates from the replica.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::bridge::BridgeHandle;
use crate::replica::ExtensionReplica;
use crate::sync::{Notice, SyncPolicy};
use crate::theme::{self, BackgroundPaint};
use crate::types::{PageTheme, ReplicaRecord, ThemeBundle};

/// Where the bundle a page is themed with came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeSource {
    /// Fresh from the host over the bridge.
    Bridge,
    /// The replica's last pulled record; the host was not reachable in time.
    Replica {
        synced_at: DateTime<Utc>,
        sync_count: u64,
    },
    /// Compiled-in defaults; no theme data reachable anywhere.
    Default,
}

/// The bundle a page is currently themed with, and its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub bundle: ThemeBundle,
    pub source: ThemeSource,
}

impl PageState {
    /// Styles for `page_url`, or `None` when the winning theme is disabled.
    /// `None` means remove previously injected rules, not "apply nothing".
    pub fn stylesheet(&self, page_url: &str) -> Option<StyleSheet> {
        let (theme, _) = theme::active_page_theme(&self.bundle, page_url)?;
        Some(render_page_styles(theme))
    }
}

/// One page's view of the theme system.
///
/// Lives as long as the page does; there is no teardown. `initialize` runs
/// the startup source chain once, `run_once_update` follows one subsequent
/// change.
pub struct PageConsumer {
    page_url: String,
    bridge: Option<BridgeHandle>,
    replica: ExtensionReplica,
    policy: SyncPolicy,
    notices: Option<broadcast::Receiver<Notice>>,
    updates: watch::Receiver<Option<ReplicaRecord>>,
    state: Option<PageState>,
}

impl PageConsumer {
    pub fn new(
        page_url: impl Into<String>,
        bridge: Option<BridgeHandle>,
        replica: ExtensionReplica,
        policy: SyncPolicy,
        notices: Option<broadcast::Receiver<Notice>>,
    ) -> Self {
        let updates = replica.subscribe();
        Self {
            page_url: page_url.into(),
            bridge,
            replica,
            policy,
            notices,
            updates,
            state: None,
        }
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    /// Whether `initialize` has run. The consumer is always ready after it,
    /// whatever source it ended up on.
    pub fn ready(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&PageState> {
        self.state.as_ref()
    }

    /// Styles for this page under the current state. `None` before
    /// `initialize` or when theming is disabled for the page.
    pub fn stylesheet(&self) -> Option<StyleSheet> {
        self.state.as_ref()?.stylesheet(&self.page_url)
    }

    /// Startup source chain: the bridge within the policy timeout, else the
    /// replica, else compiled defaults. Never fails; every page gets a
    /// state.
    pub async fn initialize(&mut self) -> &PageState {
        let direct = self.fetch_direct().await;
        let mut warm_nonce = None;
        if let Some(bundle) = &direct {
            // Warm the replica so pages opening later skip the bridge
            // wait. Failure degrades persistence, not this page.
            match self.replica.publish(bundle.clone()).await {
                Ok(record) => warm_nonce = Some(record.sync_nonce),
                Err(e) => warn!("page consumer could not warm the replica: {e}"),
            }
        }

        // Sync with the watch exactly once, building the state from the
        // record this marks as seen. The warm publish just above is not an
        // update to react to; a record some other page published during
        // startup carries a later stamp than the warm and wins.
        let latest = self.updates.borrow_and_update().clone();
        let superseded = match (&warm_nonce, &latest) {
            (Some(warm), Some(record)) => record.sync_nonce != *warm,
            _ => false,
        };
        let state = match direct {
            Some(_) if superseded => Self::cached_state(latest),
            Some(bundle) => PageState {
                bundle,
                source: ThemeSource::Bridge,
            },
            None => Self::cached_state(latest),
        };
        &*self.state.insert(state)
    }

    /// Wait for the next replica publish or update notice, then swap the
    /// page state. One wake drains all queued signals; the new state is
    /// built from the newest record the watch holds at that point.
    pub async fn run_once_update(&mut self) -> &PageState {
        self.await_signal().await;
        let latest = self.updates.borrow_and_update().clone();
        if let Some(notices) = self.notices.as_mut() {
            while matches!(notices.try_recv(), Ok(_) | Err(TryRecvError::Lagged(_))) {}
        }
        let state = Self::cached_state(latest);
        &*self.state.insert(state)
    }

    async fn await_signal(&mut self) {
        match self.notices.as_mut() {
            Some(notices) => {
                tokio::select! {
                    result = self.updates.changed() => { let _ = result; }
                    result = notices.recv() => {
                        if matches!(result, Err(RecvError::Closed)) {
                            // Replication loop is gone; only direct replica
                            // publishes can still wake this page.
                            self.notices = None;
                            let _ = self.updates.changed().await;
                        }
                    }
                }
            }
            None => {
                let _ = self.updates.changed().await;
            }
        }
    }

    async fn fetch_direct(&self) -> Option<ThemeBundle> {
        let bridge = self.bridge.as_ref()?;
        match tokio::time::timeout(self.policy.bridge_timeout, bridge.fetch_bundle()).await {
            Ok(Ok(Some(bundle))) => Some(bundle),
            Ok(Ok(None)) => {
                debug!("host has no theme document yet");
                None
            }
            Ok(Err(e)) => {
                debug!("direct fetch failed: {e}");
                None
            }
            Err(_) => {
                debug!(
                    "direct fetch timed out after {:?}",
                    self.policy.bridge_timeout
                );
                None
            }
        }
    }

    /// Page state for a cached record, or compiled defaults when the
    /// replica holds nothing.
    fn cached_state(latest: Option<ReplicaRecord>) -> PageState {
        match latest {
            Some(record) => PageState {
                source: ThemeSource::Replica {
                    synced_at: record.synced_at,
                    sync_count: record.sync_count,
                },
                bundle: record.bundle,
            },
            None => PageState {
                bundle: ThemeBundle::default(),
                source: ThemeSource::Default,
            },
        }
    }
}

// ----------------------------------------------------------------------------
// Style rendering

/// The two rules a themed page injects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
    pub page_rule: String,
    pub link_rule: String,
}

impl StyleSheet {
    /// Both rules as one `<style>` body.
    pub fn css(&self) -> String {
        format!("{}\n{}", self.page_rule, self.link_rule)
    }
}

/// Render an enabled theme into injectable rules. High specificity plus
/// `!important` so page-author styles lose.
pub fn render_page_styles(theme: &PageTheme) -> StyleSheet {
    let background = match theme::page_background(theme) {
        BackgroundPaint::Solid(color) => format!("background: {color} !important;"),
        BackgroundPaint::Gradient(gradient) => format!(
            "background: linear-gradient({}deg, {}, {}) !important;",
            gradient.angle_degrees, gradient.from, gradient.to
        ),
    };
    StyleSheet {
        page_rule: format!(
            "html, body, body * {{ {background} color: {} !important; }}",
            theme.text
        ),
        link_rule: format!("a, a * {{ color: {} !important; }}", theme.link),
    }
}
