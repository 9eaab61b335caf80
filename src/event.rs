//! Tagged event model.
//!
//! Defines the three event shapes the adapter emits: plain text, tag open,
//! and tag close. Every event carries the schema path it belongs to.
//!
//! Für `Close` ist der Pfad explizit der Pfad des *verlassenen* Knotens,
//! nicht der des Eltern-Knotens nach dem Übergang.

use indexmap::IndexMap;

/// One emitted event of the adapter's output stream.
///
/// Events preserve input order; `Text` content is never empty, and the
/// original chunk boundaries of the input are preserved wherever no
/// recognized pattern crosses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaggedEvent {
    /// Plain text content at the current schema path.
    Text {
        /// Schema path the text belongs to (e.g. `/` or `/cite`).
        path: String,
        /// The text itself, non-empty.
        content: String,
    },
    /// A schema-accepted open tag; the path is the entered node's path.
    Open {
        /// Schema path of the node just entered.
        path: String,
        /// Attributes surviving the per-path whitelist, in source order.
        attributes: IndexMap<String, String>,
    },
    /// A schema-accepted close tag; the path is the *closed* node's path.
    Close {
        /// Schema path of the node just exited.
        path: String,
    },
}

impl TaggedEvent {
    /// Creates a `Text` event.
    pub fn text(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Text { path: path.into(), content: content.into() }
    }

    /// Creates an `Open` event.
    pub fn open(path: impl Into<String>, attributes: IndexMap<String, String>) -> Self {
        Self::Open { path: path.into(), attributes }
    }

    /// Creates a `Close` event.
    pub fn close(path: impl Into<String>) -> Self {
        Self::Close { path: path.into() }
    }

    /// The schema path this event is associated with.
    pub fn path(&self) -> &str {
        match self {
            Self::Text { path, .. } | Self::Open { path, .. } | Self::Close { path } => path,
        }
    }

    /// The text content, if this is a `Text` event.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    /// The attribute map, if this is an `Open` event.
    pub fn attributes(&self) -> Option<&IndexMap<String, String>> {
        match self {
            Self::Open { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    /// True for `Text` events.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    /// True for `Open` events.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// True for `Close` events.
    pub fn is_close(&self) -> bool {
        matches!(self, Self::Close { .. })
    }
}
