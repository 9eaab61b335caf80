//! Aho-Corasick-basierter Streaming-Matcher.
//!
//! Treibt den [`PatternTrie`] über den [`TokenBuffer`] und liefert pro
//! Verarbeitungsschritt entweder sicher pattern-freien Text (mit erhaltenen
//! Chunk-Grenzen) oder einen Pattern-Treffer. Matching ist greedy-longest:
//! ein bereits vollständiges Pattern wird zurückgehalten solange ein
//! längeres Pattern noch erreichbar ist, und erst beim ersten
//! widerlegenden Zeichen (oder bei Pufferüberlauf) bestätigt.
//!
//! The matcher never emits text that could still be the prefix of a
//! pattern: the safe-flush window ends at the longest live prefix at the
//! buffer tail.

use std::sync::Arc;

use crate::token_buffer::TokenBuffer;
use crate::trie::PatternTrie;

/// Result of one internal processing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// Text fragments that are safely outside the active prefix window,
    /// original chunk boundaries preserved.
    TextRun(Vec<String>),
    /// A recognized pattern, preceded by the boundary-preserving text
    /// fragments in front of it.
    PatternHit {
        /// Fragments before the pattern start.
        text_before: Vec<String>,
        /// The matched pattern literal, merged into one string.
        pattern: String,
    },
    /// More input is needed; internally used to terminate the drain loop
    /// and never returned from [`StreamMatcher::feed`].
    NoMatch,
}

/// Greedy-Kandidat: ein bereits gematchtes Pattern, zurückgehalten weil ein
/// längeres Pattern noch möglich ist.
#[derive(Debug, Clone, Copy)]
struct Pending {
    /// Byte length of the withheld pattern.
    pattern_len: usize,
    /// Byte-Startposition des Patterns im Puffer.
    start: usize,
}

/// Streaming multi-pattern matcher over a shared immutable trie.
#[derive(Debug)]
pub struct StreamMatcher {
    trie: Arc<PatternTrie>,
    buffer: TokenBuffer,
    /// Ab dieser Pufferlänge wird ein Pending-Kandidat zwangsbestätigt.
    buffer_cap: usize,
    pending: Option<Pending>,
}

impl StreamMatcher {
    /// Creates a matcher with the default buffer cap of
    /// `2 × max_pattern_len`.
    pub fn new(trie: Arc<PatternTrie>) -> Self {
        let buffer_cap = trie.max_pattern_len() * 2;
        Self::with_buffer_cap(trie, buffer_cap)
    }

    /// Creates a matcher with an explicit buffer cap.
    pub fn with_buffer_cap(trie: Arc<PatternTrie>, buffer_cap: usize) -> Self {
        Self { trie, buffer: TokenBuffer::new(), buffer_cap, pending: None }
    }

    /// Feeds one chunk and drains all currently decidable results.
    ///
    /// Die Ergebnisse erscheinen in Eingabereihenfolge. Ein leerer Chunk
    /// fügt nichts hinzu, kann aber liegengebliebene Ergebnisse austreiben.
    pub fn feed(&mut self, chunk: &str) -> Vec<MatchResult> {
        self.buffer.push(chunk);

        let mut results = Vec::new();
        while !self.buffer.is_empty() {
            match self.process_buffer() {
                MatchResult::NoMatch => break,
                result => results.push(result),
            }
        }
        results
    }

    /// Ein Verarbeitungsschritt über den gesamten Pufferinhalt.
    fn process_buffer(&mut self) -> MatchResult {
        if self.buffer.is_empty() {
            return MatchResult::NoMatch;
        }

        let text = self.buffer.content_as_string();
        let root = self.trie.root();
        let mut state = root;
        let mut live_prefix = 0usize;

        for (i, c) in text.char_indices() {
            // Failure-Kette bis ein Übergang möglich ist
            while state != root && self.trie.child(state, c).is_none() {
                state = self.trie.fail(state);
            }

            if let Some(next) = self.trie.child(state, c) {
                state = next;
            } else if let Some(pending) = self.pending.take() {
                // Kein längeres Pattern mehr möglich: Kandidat bestätigen
                return self.commit(pending);
            }

            // Greedy: längstes an diesem Knoten endendes Pattern
            let longest = self
                .trie
                .outputs(state)
                .iter()
                .map(|&idx| self.trie.pattern_len(idx))
                .max();
            if let Some(pattern_len) = longest {
                let end = i + c.len_utf8();
                let start = end - pattern_len;
                if self.trie.has_children(state) {
                    // Ein längeres Pattern könnte dieses noch verlängern
                    self.pending = Some(Pending { pattern_len, start });
                } else {
                    self.pending = None;
                    let text_before = self.buffer.extract_up_to(start);
                    let pattern = self.buffer.extract_as_string(pattern_len);
                    return MatchResult::PatternHit { text_before, pattern };
                }
            }

            // Am Pufferende: längster lebender Pattern-Präfix
            if i + c.len_utf8() == text.len() {
                live_prefix = self.trie.depth(state);
                let mut fail = state;
                while fail != root {
                    fail = self.trie.fail(fail);
                    live_prefix = live_prefix.max(self.trie.depth(fail));
                }
            }
        }

        // Überlauf: Pending-Kandidat zwangsbestätigen
        if self.buffer.total_length() > self.buffer_cap {
            if let Some(pending) = self.pending.take() {
                return self.commit(pending);
            }
        }

        // Safe-Flush-Fenster berechnen
        let total = self.buffer.total_length();
        let mut safe = total - live_prefix;
        if let Some(pending) = &self.pending {
            safe = safe.min(pending.start);
        }
        if total > self.buffer_cap {
            // Fortschrittsgarantie bei pathologischen Eingaben; an dieser
            // Stelle ist kein Pending mehr aktiv (oben bestätigt)
            let forced = total.saturating_sub(self.trie.max_pattern_len());
            safe = safe.max(floor_char_boundary(&text, forced));
        }

        if safe > 0 {
            if let Some(pending) = &mut self.pending {
                pending.start -= safe;
            }
            return MatchResult::TextRun(self.buffer.extract_up_to(safe));
        }

        MatchResult::NoMatch
    }

    fn commit(&mut self, pending: Pending) -> MatchResult {
        let text_before = self.buffer.extract_up_to(pending.start);
        let pattern = self.buffer.extract_as_string(pending.pattern_len);
        MatchResult::PatternHit { text_before, pattern }
    }

    /// Discards any live pending candidate and returns all buffered
    /// fragments. Must be called when the stream ends.
    pub fn flush_remaining(&mut self) -> Vec<String> {
        self.pending = None;
        self.buffer.flush_all()
    }

    /// Clears buffer and pending state, keeping the trie.
    pub fn reset(&mut self) {
        self.pending = None;
        self.buffer.flush_all();
    }

    /// Current buffer contents (debugging aid).
    pub fn buffer_content(&self) -> String {
        self.buffer.content_as_string()
    }

    /// Current buffer length in bytes.
    pub fn buffer_len(&self) -> usize {
        self.buffer.total_length()
    }

    /// The shared trie driving this matcher.
    pub fn trie(&self) -> &Arc<PatternTrie> {
        &self.trie
    }
}

/// Rundet `i` auf die nächste Zeichengrenze ab.
fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
