//! The host page: a sidebar document loaded from a saved snapshot.
//!
//! The host owns its DOM. It re-renders the conversation list wholesale when
//! the snapshot changes and renders its row context menu a moment after a
//! trigger is clicked, just like the live page does.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::dom::{markup, Document, NodeId};
use crate::inject::menu::{find_open_menu, MENU_TRIGGER_ID_PREFIX};
use crate::sidebar;

/// Entries of the host's own row menu.
const HOST_MENU_ITEMS: [&str; 3] = ["Share", "Rename", "Delete"];

pub struct HostPage {
    document: Document,
    snapshot: Option<PathBuf>,
    menu_delay: Duration,
    /// When the requested menu should appear
    pending_menu: Option<Instant>,
}

impl HostPage {
    pub fn from_markup(markup: &str, menu_delay: Duration) -> Result<Self> {
        Ok(Self {
            document: markup::load(markup)?,
            snapshot: None,
            menu_delay,
            pending_menu: None,
        })
    }

    /// Load the snapshot file at `path`.
    pub fn load(path: &Path, menu_delay: Duration) -> Result<Self> {
        let markup = fs::read_to_string(path)
            .with_context(|| format!("Failed to read host snapshot: {}", path.display()))?;
        let mut page = Self::from_markup(&markup, menu_delay)
            .with_context(|| format!("Failed to parse host snapshot: {}", path.display()))?;
        page.snapshot = Some(path.to_path_buf());
        Ok(page)
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Re-read the snapshot file and re-render from it.
    pub fn reload(&mut self) -> Result<()> {
        let Some(path) = self.snapshot.clone() else {
            return Ok(());
        };
        let markup = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read host snapshot: {}", path.display()))?;
        self.rerender(&markup)
    }

    /// Re-render from `markup`. If both the live page and the new markup have
    /// a conversation list, only the list's children are replaced (the list
    /// element itself survives); otherwise the whole body is replaced.
    pub fn rerender(&mut self, markup: &str) -> Result<()> {
        self.close_menu();
        let doc = &mut self.document;
        let fresh = markup::parse_fragment(doc, markup)?;
        let live = sidebar::find_container(doc);
        let incoming = sidebar::find_container_among(doc, &fresh);

        match (live, incoming) {
            (Some(live), Some(incoming)) => {
                let rows = doc.children(incoming).to_vec();
                doc.replace_children(live, &rows)
                    .context("Failed to replace conversation list")?;
                for node in fresh {
                    doc.remove(node).context("Failed to discard parsed markup")?;
                }
                debug!(rows = rows.len(), "host list re-rendered");
            }
            _ => {
                let root = doc.root();
                doc.replace_children(root, &fresh)
                    .context("Failed to replace page body")?;
                info!("host page re-rendered");
            }
        }
        Ok(())
    }

    /// Host behavior for a click on `node`: a menu trigger closes any open
    /// menu and opens a new one after the host's render delay.
    pub fn click(&mut self, node: NodeId, now: Instant) -> bool {
        let is_trigger = self.document.get(node).is_some_and(|el| {
            el.tag() == "button"
                && el
                    .attribute("id")
                    .is_some_and(|id| id.starts_with(MENU_TRIGGER_ID_PREFIX))
        });
        if !is_trigger {
            return false;
        }
        self.close_menu();
        self.pending_menu = Some(now + self.menu_delay);
        true
    }

    /// Render the pending menu if its time has come. Returns true if a menu
    /// was rendered.
    pub fn tick(&mut self, now: Instant) -> Result<bool> {
        match self.pending_menu {
            Some(at) if at <= now => {
                self.pending_menu = None;
                self.render_menu()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn render_menu(&mut self) -> Result<()> {
        let doc = &mut self.document;
        let menu = doc.create_element("div");
        doc.set_attribute(menu, "role", "menu")?;
        for label in HOST_MENU_ITEMS {
            let item = doc.create_element("div");
            doc.set_attribute(item, "role", "menuitem")?;
            doc.set_text(item, label)?;
            doc.append_child(menu, item)?;
        }
        let root = doc.root();
        doc.append_child(root, menu)?;
        Ok(())
    }

    pub fn open_menu(&self) -> Option<NodeId> {
        find_open_menu(&self.document)
    }

    pub fn is_menu_pending(&self) -> bool {
        self.pending_menu.is_some()
    }

    /// Close the open menu, if any, and cancel a pending one.
    pub fn close_menu(&mut self) {
        self.pending_menu = None;
        if let Some(menu) = self.open_menu() {
            let _ = self.document.remove(menu);
        }
    }
}
