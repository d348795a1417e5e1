//! Input handling: maps key events onto App actions.

pub(crate) mod keyboard;
pub(crate) mod modal;
