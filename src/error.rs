//! Central error types for the tagstrom library.
//!
//! Alle Varianten sind Konfigurationsfehler: sie entstehen beim Aufbau von
//! Schema, Trie oder Adapter und niemals beim Verarbeiten von Stream-Inhalt.
//! Fehlgeformter Inhalt wird grundsätzlich als Text-Event weitergereicht.

use core::fmt;

/// All error conditions raised by schema, trie, and adapter construction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A tag name passed to the schema builder is empty.
    EmptyTagName,
    /// An alias name passed to the schema builder is empty.
    EmptyAlias,
    /// `alias()` was called before any `tag()`.
    AliasBeforeTag,
    /// An attribute name passed to the schema builder is empty.
    EmptyAttribute,
    /// `attr()` was called before any `tag()`.
    AttributeBeforeTag,
    /// The pattern set handed to the trie is empty.
    ///
    /// Tritt auch auf wenn ein Schema ohne Tags an den Adapter übergeben
    /// wird: ohne Tag-Namen gibt es keine ableitbaren Patterns.
    EmptyPatternSet,
    /// A pattern handed to the trie is the empty string.
    EmptyPattern,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTagName => write!(f, "tag name must not be empty"),
            Self::EmptyAlias => write!(f, "alias name must not be empty"),
            Self::AliasBeforeTag => write!(f, "alias() requires a preceding tag()"),
            Self::EmptyAttribute => write!(f, "attribute name must not be empty"),
            Self::AttributeBeforeTag => write!(f, "attr() requires a preceding tag()"),
            Self::EmptyPatternSet => write!(f, "pattern set must contain at least one pattern"),
            Self::EmptyPattern => write!(f, "pattern must not be an empty string"),
        }
    }
}

impl std::error::Error for Error {}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
