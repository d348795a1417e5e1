//! chatfolders library crate.
//!
//! Adds user-defined folders to a chat application's conversation sidebar:
//! - Host page model (arena DOM, markup loading, mutation observation)
//! - Sidebar indexing and visibility filtering
//! - Persistent folder store with change notifications
//! - Assign controls injected into the host and the assignment flow
//! - Terminal UI around all of the above

pub mod app;
pub mod config;
pub mod dom;
pub mod event;
pub mod event_loop;
pub mod folders;
mod handlers;
pub mod host;
pub mod inject;
pub mod sidebar;
pub mod storage;
pub mod sync;
pub mod ui;
pub mod watcher;
