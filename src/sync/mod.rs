//! Keeps sidebar visibility in step with the host DOM and the folder store.
//!
//! Two independent sources produce [`SyncMessage`]s: mutations under the
//! observed conversation list, and storage changes to the folder keys. Both
//! are handled the same way, by a full filter pass that re-indexes the
//! sidebar and recomputes every row's visibility. Because a pass never
//! depends on an earlier one, messages may arrive in any order or be
//! repeated and still converge.

pub mod discovery;

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::dom::{Document, ObserveOptions};
use crate::folders::{FolderStore, ACTIVE_FOLDER_KEY, FOLDERS_KEY};
use crate::inject::menu::MenuChecks;
use crate::inject::RowAffordance;
use crate::sidebar::identity::ConversationId;
use crate::sidebar::{self, filter};
use crate::storage::StorageChange;

pub use discovery::{Discovery, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    /// Something changed under the observed container
    DomMutated,
    /// Persisted keys changed
    StoreChanged(StorageChange),
}

/// Result of one filter pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub container_found: bool,
    pub indexed: usize,
    pub visible: usize,
    pub hidden: usize,
}

/// What handling a message did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Reaction {
    /// The filter pass, if one ran
    pub pass: Option<PassReport>,
    /// The folder list UI should be redrawn from the store
    pub folders_changed: bool,
}

pub struct Propagator {
    discovery: Discovery,
    policy: RetryPolicy,
    affordance: Box<dyn RowAffordance>,
    menu_checks: MenuChecks,
}

impl Propagator {
    pub fn new(
        policy: RetryPolicy,
        affordance: Box<dyn RowAffordance>,
        menu_check_delay: Duration,
        now: Instant,
    ) -> Self {
        Self {
            discovery: Discovery::searching(now),
            policy,
            affordance,
            menu_checks: MenuChecks::new(menu_check_delay),
        }
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// Advance discovery, run a due menu check and collect DOM mutations.
    ///
    /// Returns [`SyncMessage::DomMutated`] when the observed container changed
    /// or was just found.
    pub fn poll(&mut self, doc: &mut Document, now: Instant) -> Option<SyncMessage> {
        self.menu_checks.run_due(doc, now);

        if let Discovery::Observing {
            container,
            observer,
        } = self.discovery
        {
            if doc.is_attached(container) {
                let records = doc.take_records(observer);
                if records.is_empty() {
                    return None;
                }
                debug!(records = records.len(), "sidebar mutated");
                return Some(SyncMessage::DomMutated);
            }
            info!("conversation list detached, searching again");
            doc.disconnect(observer);
            self.discovery = Discovery::searching(now);
        }

        match self.discovery {
            Discovery::Searching {
                failed,
                next_attempt,
            } if now >= next_attempt => self.try_discover(doc, failed, now),
            _ => None,
        }
    }

    fn try_discover(&mut self, doc: &mut Document, failed: u32, now: Instant) -> Option<SyncMessage> {
        if let Some(container) = sidebar::find_container(doc) {
            let observer = doc.observe(container, ObserveOptions::child_list_subtree());
            info!(attempts = failed + 1, "conversation list found");
            self.discovery = Discovery::Observing {
                container,
                observer,
            };
            // The list may have rendered before we started observing it
            return Some(SyncMessage::DomMutated);
        }

        let failed = failed + 1;
        self.discovery = if self.policy.allows(failed) {
            Discovery::Searching {
                failed,
                next_attempt: now + self.policy.delay_after(failed),
            }
        } else {
            warn!(attempts = failed, "conversation list not found, giving up");
            Discovery::GaveUp { failed }
        };
        None
    }

    /// Handle one message from either source.
    pub fn dispatch(
        &mut self,
        message: &SyncMessage,
        doc: &mut Document,
        store: &FolderStore,
    ) -> Result<Reaction> {
        match message {
            SyncMessage::DomMutated => Ok(Reaction {
                pass: Some(self.refilter(doc, store)?),
                folders_changed: false,
            }),
            SyncMessage::StoreChanged(change)
                if change.touches(FOLDERS_KEY) || change.touches(ACTIVE_FOLDER_KEY) =>
            {
                Ok(Reaction {
                    pass: Some(self.refilter(doc, store)?),
                    folders_changed: true,
                })
            }
            SyncMessage::StoreChanged(_) => Ok(Reaction::default()),
        }
    }

    /// Full pass: find the list, rebuild the index, apply the filter.
    ///
    /// Runs even while discovery is still searching, so an explicit refresh
    /// works as soon as the list exists.
    pub fn refilter(&self, doc: &mut Document, store: &FolderStore) -> Result<PassReport> {
        let snapshot = store.read()?;
        let Some(container) = sidebar::find_container(doc) else {
            debug!("no conversation list yet");
            return Ok(PassReport::default());
        };
        let index = sidebar::index(doc, container, self.affordance.as_ref());
        let outcome = filter::apply(doc, &index, &snapshot);
        debug!(
            indexed = index.len(),
            visible = outcome.visible,
            hidden = outcome.hidden,
            active = %snapshot.active_folder,
            "filter pass"
        );
        Ok(PassReport {
            container_found: true,
            indexed: index.len(),
            visible: outcome.visible,
            hidden: outcome.hidden,
        })
    }

    /// A bound host menu trigger was clicked.
    pub fn menu_trigger_activated(&mut self, id: ConversationId, now: Instant) {
        self.menu_checks.schedule(id, now);
    }
}
