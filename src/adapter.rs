//! Orchestrator: turns a chunked text stream into tagged events.
//!
//! Besitzt den Matcher, die Übergangstabelle, den (bei Bedarf aktiven)
//! Open-Tag-Parser und den aktuellen Zustandsknoten. Chunks laufen zuerst
//! durch einen aktiven Open-Tag-Parser, danach durch den Matcher; Treffer
//! werden gegen das Schema geprüft und als `Open`/`Close`/`Text` emittiert.
//!
//! Content never fails: unknown tags, disallowed transitions, and
//! mismatched close tags are re-emitted verbatim as `Text` events without
//! touching the current path.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::event::TaggedEvent;
use crate::matcher::{MatchResult, StreamMatcher};
use crate::open_tag::{OpenTagParser, ParsedTag};
use crate::schema::TagSchema;
use crate::transition::{StateId, TransitionTable};
use crate::trie::PatternTrie;
use crate::{FastHashSet, Result};

/// Streaming adapter: `feed(chunk) → events`, terminated by `flush()`.
///
/// Eine Instanz ist ein veränderlicher Cursor über genau einen Stream und
/// nicht reentrant. Trie und Tabelle sind unveränderlich und können über
/// [`with_shared`](Self::with_shared) von vielen Adaptern geteilt werden.
///
/// # Beispiel
///
/// ```
/// use tagstrom::{StreamAdapter, TagSchema, TaggedEvent};
///
/// let schema = TagSchema::root().tag("cite").alias("rag").attr("id");
/// let mut adapter = StreamAdapter::new(&schema).unwrap();
///
/// let mut events = adapter.feed("<rag id=\"r1\">Quelle</cite>");
/// events.extend(adapter.flush());
///
/// assert!(matches!(&events[0], TaggedEvent::Open { path, .. } if path == "/cite"));
/// assert_eq!(events[1], TaggedEvent::text("/cite", "Quelle"));
/// assert_eq!(events[2], TaggedEvent::close("/cite"));
/// ```
#[derive(Debug)]
pub struct StreamAdapter {
    matcher: StreamMatcher,
    table: Arc<TransitionTable>,
    open_parser: Option<OpenTagParser>,
    current: StateId,
    /// Append-only Roheingabe, unverändert, für Debugging und Replay.
    raw: String,
}

impl StreamAdapter {
    /// Builds an adapter from a schema.
    ///
    /// Die Patterns sind genau `{"<"+t, "</"+t+">"}` für jeden Namen `t`
    /// des Tag-Universums (Aliasse eingeschlossen).
    pub fn new(schema: &TagSchema) -> Result<Self> {
        let table = Arc::new(TransitionTable::new(schema)?);
        let patterns: Vec<String> = table
            .tag_names()
            .flat_map(|t| [format!("<{t}"), format!("</{t}>")])
            .collect();
        let trie = Arc::new(PatternTrie::new(patterns)?);
        Ok(Self::with_shared(trie, table))
    }

    /// Builds an adapter from pre-built shared parts.
    pub fn with_shared(trie: Arc<PatternTrie>, table: Arc<TransitionTable>) -> Self {
        let current = table.root();
        Self {
            matcher: StreamMatcher::new(trie),
            table,
            open_parser: None,
            current,
            raw: String::new(),
        }
    }

    /// Processes one chunk and returns the events it produced.
    ///
    /// Never fails on content; an empty chunk yields no events.
    pub fn feed(&mut self, chunk: &str) -> Vec<TaggedEvent> {
        if chunk.is_empty() {
            return Vec::new();
        }
        self.raw.push_str(chunk);

        let mut events = Vec::new();

        // Ein aktiver Open-Tag-Parser bekommt den Chunk zuerst
        let rest;
        let chunk = if self.open_parser.is_some() {
            rest = self.feed_open_parser(chunk, &mut events);
            if rest.is_empty() {
                return events;
            }
            rest.as_str()
        } else {
            chunk
        };

        for result in self.matcher.feed(chunk) {
            self.dispatch(result, &mut events);
        }
        events
    }

    /// Finalizes the stream: force-completes a half-open tag and drains the
    /// matcher buffer as text.
    ///
    /// Ein zweiter `flush()` direkt danach liefert nichts mehr.
    pub fn flush(&mut self) -> Vec<TaggedEvent> {
        let mut events = Vec::new();

        if let Some(mut parser) = self.open_parser.take() {
            let parsed = parser.force_complete();
            self.emit_open_tag(parsed, &mut events);
        }

        for frag in self.matcher.flush_remaining() {
            if !frag.is_empty() {
                events.push(TaggedEvent::text(self.current_path(), frag));
            }
        }
        events
    }

    /// The current schema path (`/` at the root).
    pub fn current_path(&self) -> &str {
        self.table.path(self.current)
    }

    /// The verbatim input received so far.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Routet Eingabe durch den aktiven Open-Tag-Parser. Liefert bei
    /// Abschluss die Restzeichen hinter dem `>`, sonst einen leeren String.
    fn feed_open_parser(&mut self, input: &str, events: &mut Vec<TaggedEvent>) -> String {
        let Some(parser) = self.open_parser.as_mut() else {
            return input.to_string();
        };

        match parser.feed(input) {
            Some(parsed) => {
                let rest = parser.remaining().unwrap_or("").to_string();
                self.open_parser = None;
                self.emit_open_tag(parsed, events);
                rest
            }
            None => String::new(),
        }
    }

    fn dispatch(&mut self, result: MatchResult, events: &mut Vec<TaggedEvent>) {
        match result {
            MatchResult::TextRun(frags) => {
                if self.open_parser.is_some() {
                    // Mitten im Drain geöffneter Tag: Text gehört dem Parser
                    let combined = frags.concat();
                    let rest = self.feed_open_parser(&combined, events);
                    if !rest.is_empty() {
                        events.push(TaggedEvent::text(self.current_path(), rest));
                    }
                } else {
                    for frag in frags {
                        if !frag.is_empty() {
                            events.push(TaggedEvent::text(self.current_path(), frag));
                        }
                    }
                }
            }

            MatchResult::PatternHit { text_before, pattern } => {
                if self.open_parser.is_some() {
                    let combined = text_before.concat();
                    if !combined.is_empty() {
                        let rest = self.feed_open_parser(&combined, events);
                        if !rest.is_empty() {
                            events.push(TaggedEvent::text(self.current_path(), rest));
                        }
                    }
                } else {
                    for frag in text_before {
                        if !frag.is_empty() {
                            events.push(TaggedEvent::text(self.current_path(), frag));
                        }
                    }
                }

                if pattern.ends_with('>') {
                    self.emit_close_tag(&pattern, events);
                } else {
                    // Offener Tag-Präfix `<tagname`: Parser übernimmt
                    self.open_parser = Some(OpenTagParser::new(&pattern));
                }
            }

            MatchResult::NoMatch => {}
        }
    }

    /// Versucht den Übergang für einen fertig geparsten Open-Tag. Ohne
    /// gültigen Übergang wird der Roh-Tag unverändert als Text emittiert.
    fn emit_open_tag(&mut self, parsed: ParsedTag, events: &mut Vec<TaggedEvent>) {
        match self.table.try_open(self.current, &parsed.tag_name) {
            Some(next) => {
                self.current = next;
                let path = self.table.path(next);
                let attributes =
                    filter_attributes(parsed.attributes, self.table.allowed_attributes(path));
                events.push(TaggedEvent::open(path, attributes));
            }
            None => {
                events.push(TaggedEvent::text(self.current_path(), parsed.raw_tag));
            }
        }
    }

    /// Versucht den Übergang für einen Close-Tag (`</name>`). Der Pfad des
    /// Events ist der des geschlossenen Knotens, nicht der des Eltern.
    fn emit_close_tag(&mut self, pattern: &str, events: &mut Vec<TaggedEvent>) {
        let tag_name = &pattern[2..pattern.len() - 1];
        match self.table.try_close(self.current, tag_name) {
            Some(parent) => {
                let closed_path = self.current_path().to_string();
                self.current = parent;
                events.push(TaggedEvent::close(closed_path));
            }
            None => {
                events.push(TaggedEvent::text(self.current_path(), pattern));
            }
        }
    }
}

/// Behält nur Attribute deren Name auf der Whitelist steht. Ohne Whitelist
/// (oder ohne Überschneidung) bleibt die Map leer.
fn filter_attributes(
    attributes: IndexMap<String, String>,
    allowed: Option<&FastHashSet<String>>,
) -> IndexMap<String, String> {
    match allowed {
        Some(allowed) => attributes
            .into_iter()
            .filter(|(name, _)| allowed.contains(name))
            .collect(),
        None => IndexMap::new(),
    }
}
