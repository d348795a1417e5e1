//! Conversation identity extracted from sidebar links.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Path prefix every conversation link starts with.
pub const CONVERSATION_PATH_PREFIX: &str = "/c/";

/// Stable identifier of one conversation, taken from its `/c/<id>` path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Extract the id from a navigational reference such as
    /// `/c/6650f1e2-aa31` or `https://host/c/abc?model=x`.
    ///
    /// Returns `None` for references without a `/c/<id>` segment.
    pub fn from_href(href: &str) -> Option<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN
            .get_or_init(|| Regex::new(r"(?i)/c/([a-z0-9-]+)").expect("conversation id pattern"));
        pattern
            .captures(href)
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
