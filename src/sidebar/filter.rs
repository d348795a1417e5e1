//! Folder filter applied to indexed rows.
//!
//! Visibility is recomputed from scratch on every pass from the current index
//! and folder snapshot. Nothing from earlier passes is consulted.

use std::collections::BTreeSet;

use tracing::warn;

use super::identity::ConversationId;
use super::ChatIndex;
use crate::dom::Document;
use crate::folders::FolderSnapshot;

/// Class marking a row as hidden by the folder filter.
pub const HIDE_CLASS: &str = "cgpf-hidden";

/// Counts from one application of the filter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterOutcome {
    pub visible: usize,
    pub hidden: usize,
    /// Rows whose marker actually flipped
    pub changed: usize,
}

/// Whether conversation `id` passes the active folder.
///
/// "All" shows everything. Any other name shows only its members; a name
/// with no folder behind it shows nothing.
pub fn is_visible(snapshot: &FolderSnapshot, id: &ConversationId) -> bool {
    snapshot.is_unfiltered() || snapshot.contains(&snapshot.active_folder, id)
}

/// Ids in `index` that pass the active folder.
pub fn visible_ids(index: &ChatIndex, snapshot: &FolderSnapshot) -> BTreeSet<ConversationId> {
    index
        .iter()
        .filter(|(id, _)| is_visible(snapshot, id))
        .map(|(id, _)| id.clone())
        .collect()
}

/// Toggle [`HIDE_CLASS`] on every indexed row. Rows that went stale since
/// indexing are skipped; the next pass will not see them.
pub fn apply(doc: &mut Document, index: &ChatIndex, snapshot: &FolderSnapshot) -> FilterOutcome {
    let shown = visible_ids(index, snapshot);
    let mut outcome = FilterOutcome::default();
    for (id, row) in index.iter() {
        let show = shown.contains(id);
        match doc.toggle_class(row.node, HIDE_CLASS, !show) {
            Ok(changed) => {
                if changed {
                    outcome.changed += 1;
                }
                if show {
                    outcome.visible += 1;
                } else {
                    outcome.hidden += 1;
                }
            }
            Err(e) => warn!(conversation = %id, error = %e, "skipping row"),
        }
    }
    outcome
}
