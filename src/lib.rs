//! tagstrom – streaming tagged-event parser for chunked LLM output
//!
//! Clients declare a hierarchical schema of XML-like tags; the adapter then
//! turns arbitrarily segmented text chunks into an ordered stream of
//! path-tagged events. Schema-defined open/close tags are recognized no
//! matter how they are split across chunks; everything the schema does not
//! permit passes through verbatim as text.
//!
//! # Beispiel
//!
//! ```
//! use tagstrom::{StreamAdapter, TagSchema, TaggedEvent};
//!
//! let schema = TagSchema::root()
//!     .tag("thinking")
//!     .tag("cite").alias("rag").attr("id");
//!
//! let mut adapter = StreamAdapter::new(&schema).unwrap();
//! let mut events = Vec::new();
//! for chunk in ["<thi", "nking>Moment…</thinking>", "<cite id=\"r1\">x</cite>"] {
//!     events.extend(adapter.feed(chunk));
//! }
//! events.extend(adapter.flush());
//!
//! assert_eq!(events[0], TaggedEvent::open("/thinking", Default::default()));
//! assert_eq!(events[1], TaggedEvent::text("/thinking", "Moment…"));
//! assert_eq!(events[2], TaggedEvent::close("/thinking"));
//! assert!(matches!(&events[3], TaggedEvent::Open { path, attributes }
//!     if path == "/cite" && attributes.get("id").map(String::as_str) == Some("r1")));
//! ```
//!
//! Kern des Ganzen sind drei eng verzahnte Teile: der Aho-Corasick-Matcher
//! ([`StreamMatcher`]) mit Greedy-Longest-Disambiguierung über
//! Chunk-Grenzen, der grenzenerhaltende [`TokenBuffer`] mit O(1)
//! Front-Extraktion, und der Open-Tag-Parser ([`OpenTagParser`]) der ein
//! `<tagname`-Präfix über beliebig viele Chunks bis zum `>` verfolgt.

pub mod adapter;
pub mod error;
pub mod event;
pub mod matcher;
pub mod open_tag;
pub mod schema;
pub mod token_buffer;
pub mod transition;
pub mod trie;

pub use error::{Error, Result};

/// Interne Lookup-Tabelle: hashbrown mit ahash-Hasher. Die Schlüssel kommen
/// nie von außen, DoS-Resistenz spielt hier keine Rolle.
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// Set-Gegenstück zu [`FastHashMap`].
pub(crate) type FastHashSet<K> = hashbrown::HashSet<K, ahash::RandomState>;

/// Map deren Einträge ihre Einfügereihenfolge behalten; Schema-Pfade und
/// Attribute iterieren damit reproduzierbar.
pub(crate) type FastIndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;

/// Set-Gegenstück zu [`FastIndexMap`].
pub(crate) type FastIndexSet<K> = indexmap::IndexSet<K, ahash::RandomState>;

// Public API: Events
pub use event::TaggedEvent;

// Public API: Schema & Adapter
pub use adapter::StreamAdapter;
pub use schema::TagSchema;
pub use transition::{StateId, TransitionTable};

// Public API: Matcher-Ebene
pub use matcher::{MatchResult, StreamMatcher};
pub use open_tag::{OpenTagParser, ParsedTag};
pub use token_buffer::TokenBuffer;
pub use trie::PatternTrie;
