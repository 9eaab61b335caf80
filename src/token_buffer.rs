//! Token buffer preserving the chunk boundaries of the input stream.
//!
//! LLM-Streaming liefert Text in willkürlich zerteilten Chunks. Dieser
//! Puffer hält die Original-Fragmente und erlaubt Extraktion bis zu einer
//! Byte-Position, wobei die ursprünglichen Grenzen erhalten bleiben und ein
//! Fragment bei Bedarf gesplittet wird.
//!
//! Die Vorderseite wird nicht physisch entfernt: `start_index` und
//! `split_offset` markieren den logischen Anfang, konsumierte Slots bleiben
//! als leere Platzhalter stehen. Erst ab [`COMPACT_THRESHOLD`] konsumierten
//! Fragmenten wird das Präfix tatsächlich aus dem Vec entfernt. Damit ist
//! die Front-Extraktion amortisiert O(1).
//!
//! All positions are byte offsets into UTF-8 text and must lie on character
//! boundaries; every position the matcher derives from a trie walk does.

use log::warn;

/// Anzahl konsumierter Fragmente, ab der das Vec-Präfix physisch entfernt wird.
const COMPACT_THRESHOLD: usize = 50;

/// Ordered sequence of non-empty text fragments with O(1) front-truncation.
#[derive(Debug, Default)]
pub struct TokenBuffer {
    /// Fragments; slots before `start_index` are consumed placeholders.
    frags: Vec<String>,
    /// Index of the first live fragment.
    start_index: usize,
    /// Byte offset of the live prefix inside `frags[start_index]`.
    split_offset: usize,
    /// Sum of live fragment lengths (bytes), `split_offset` applied.
    total_length: usize,
    /// Leere Chunks werden nur einmal pro Puffer-Instanz gemeldet.
    warned_empty: bool,
}

impl TokenBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk to the back of the buffer.
    ///
    /// Empty chunks are skipped with a one-time warning; some LLM providers
    /// emit spurious empty deltas during initial streaming.
    pub fn push(&mut self, chunk: impl Into<String>) {
        let chunk = chunk.into();
        if chunk.is_empty() {
            if !self.warned_empty {
                warn!("empty chunk received and ignored (some providers emit empty deltas)");
                self.warned_empty = true;
            }
            return;
        }

        self.total_length += chunk.len();
        self.frags.push(chunk);
    }

    /// Extracts the earliest `n` bytes, preserving fragment boundaries.
    ///
    /// A fragment straddling `n` is split: the prefix is returned and
    /// `split_offset` advances instead of mutating the fragment (O(1)).
    /// `n` larger than the buffer behaves as "extract everything";
    /// `n == 0` returns an empty list.
    pub fn extract_up_to(&mut self, n: usize) -> Vec<String> {
        let mut remaining = n.min(self.total_length);
        if remaining == 0 {
            return Vec::new();
        }

        let mut extracted = Vec::new();
        while remaining > 0 {
            let available = self.frags[self.start_index].len() - self.split_offset;

            if available <= remaining {
                // Fragment-Rest vollständig konsumiert
                let frag = std::mem::take(&mut self.frags[self.start_index]);
                if self.split_offset == 0 {
                    extracted.push(frag);
                } else {
                    extracted.push(frag[self.split_offset..].to_string());
                }
                self.start_index += 1;
                self.split_offset = 0;
                self.total_length -= available;
                remaining -= available;
            } else {
                // Fragment überspannt die Grenze: Präfix kopieren, Offset vorschieben
                let end = self.split_offset + remaining;
                extracted.push(self.frags[self.start_index][self.split_offset..end].to_string());
                self.split_offset = end;
                self.total_length -= remaining;
                remaining = 0;
            }
        }

        self.maybe_compact();
        extracted
    }

    /// Like [`extract_up_to`](Self::extract_up_to) but merges the extracted
    /// fragments into one string. Used for pattern payloads where the
    /// original boundaries carry no information.
    pub fn extract_as_string(&mut self, n: usize) -> String {
        self.extract_up_to(n).concat()
    }

    /// Extracts all remaining fragments and clears the buffer.
    pub fn flush_all(&mut self) -> Vec<String> {
        let extracted = self.extract_up_to(self.total_length);
        self.frags.clear();
        self.start_index = 0;
        self.split_offset = 0;
        extracted
    }

    /// The current buffer contents merged into one string.
    pub fn content_as_string(&self) -> String {
        let mut out = String::with_capacity(self.total_length);
        for (i, frag) in self.frags.iter().enumerate().skip(self.start_index) {
            if i == self.start_index {
                out.push_str(&frag[self.split_offset..]);
            } else {
                out.push_str(frag);
            }
        }
        out
    }

    /// Number of live bytes in the buffer.
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// True if no live bytes remain.
    pub fn is_empty(&self) -> bool {
        self.total_length == 0
    }

    /// Number of live fragments (the logical, not physical count).
    pub fn token_count(&self) -> usize {
        self.frags.len() - self.start_index
    }

    fn maybe_compact(&mut self) {
        if self.start_index >= COMPACT_THRESHOLD {
            self.frags.drain(..self.start_index);
            self.start_index = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(chunks: &[&str]) -> TokenBuffer {
        let mut buffer = TokenBuffer::new();
        for chunk in chunks {
            buffer.push(*chunk);
        }
        buffer
    }

    // ==================== push ====================

    #[test]
    fn push_accumulates_length() {
        let buffer = buffer_with(&["Hello ", "world"]);
        assert_eq!(buffer.total_length(), 11);
        assert_eq!(buffer.token_count(), 2);
        assert!(!buffer.is_empty());
    }

    /// Leere Chunks werden ignoriert, der Pufferzustand bleibt unverändert.
    #[test]
    fn push_empty_chunk_is_ignored() {
        let mut buffer = buffer_with(&["abc"]);
        buffer.push("");
        buffer.push("");
        assert_eq!(buffer.total_length(), 3);
        assert_eq!(buffer.token_count(), 1);
    }

    #[test]
    fn new_buffer_is_empty() {
        let buffer = TokenBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.total_length(), 0);
        assert_eq!(buffer.token_count(), 0);
        assert_eq!(buffer.content_as_string(), "");
    }

    // ==================== extract_up_to ====================

    #[test]
    fn extract_whole_fragment() {
        let mut buffer = buffer_with(&["Hello ", "world"]);
        let extracted = buffer.extract_up_to(6);
        assert_eq!(extracted, ["Hello "]);
        assert_eq!(buffer.content_as_string(), "world");
        assert_eq!(buffer.total_length(), 5);
    }

    #[test]
    fn extract_splits_straddling_fragment() {
        let mut buffer = buffer_with(&["Hello ", "world"]);
        let extracted = buffer.extract_up_to(8);
        assert_eq!(extracted, ["Hello ", "wo"]);
        assert_eq!(buffer.content_as_string(), "rld");
        assert_eq!(buffer.total_length(), 3);
        assert_eq!(buffer.token_count(), 1);
    }

    /// Nach einem Split ist der Rest des Fragments weiterhin ein eigenes
    /// Fragment und wird bei der nächsten Extraktion als Ganzes geliefert.
    #[test]
    fn extract_after_split_returns_suffix_whole() {
        let mut buffer = buffer_with(&["abcdef"]);
        assert_eq!(buffer.extract_up_to(2), ["ab"]);
        assert_eq!(buffer.extract_up_to(4), ["cdef"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn extract_zero_returns_empty() {
        let mut buffer = buffer_with(&["abc"]);
        assert!(buffer.extract_up_to(0).is_empty());
        assert_eq!(buffer.total_length(), 3);
    }

    #[test]
    fn extract_beyond_length_clamps() {
        let mut buffer = buffer_with(&["ab", "cd"]);
        let extracted = buffer.extract_up_to(100);
        assert_eq!(extracted, ["ab", "cd"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn extract_from_empty_buffer() {
        let mut buffer = TokenBuffer::new();
        assert!(buffer.extract_up_to(5).is_empty());
    }

    #[test]
    fn extract_exactly_everything() {
        let mut buffer = buffer_with(&["ab", "cd", "ef"]);
        assert_eq!(buffer.extract_up_to(6), ["ab", "cd", "ef"]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.token_count(), 0);
    }

    /// Mehrfache Splits innerhalb desselben Fragments.
    #[test]
    fn repeated_splits_within_one_fragment() {
        let mut buffer = buffer_with(&["abcdefgh"]);
        assert_eq!(buffer.extract_up_to(3), ["abc"]);
        assert_eq!(buffer.extract_up_to(2), ["de"]);
        assert_eq!(buffer.content_as_string(), "fgh");
        assert_eq!(buffer.total_length(), 3);
    }

    #[test]
    fn extract_multibyte_on_char_boundary() {
        let mut buffer = buffer_with(&["größer", " werden"]);
        // 'ö' und 'ß' sind je 2 Bytes: "größ" = 6 Bytes
        let extracted = buffer.extract_up_to(6);
        assert_eq!(extracted, ["größ"]);
        assert_eq!(buffer.content_as_string(), "er werden");
    }

    // ==================== extract_as_string ====================

    #[test]
    fn extract_as_string_merges_fragments() {
        let mut buffer = buffer_with(&["Hel", "lo w", "orld"]);
        assert_eq!(buffer.extract_as_string(7), "Hello w");
        assert_eq!(buffer.content_as_string(), "orld");
    }

    #[test]
    fn extract_as_string_zero() {
        let mut buffer = buffer_with(&["abc"]);
        assert_eq!(buffer.extract_as_string(0), "");
    }

    // ==================== flush_all ====================

    #[test]
    fn flush_all_returns_everything_and_clears() {
        let mut buffer = buffer_with(&["a", "bc", "def"]);
        assert_eq!(buffer.flush_all(), ["a", "bc", "def"]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.token_count(), 0);
        assert!(buffer.flush_all().is_empty());
    }

    /// Der erste Flush-Eintrag respektiert einen vorangegangenen Split.
    #[test]
    fn flush_all_respects_split_offset() {
        let mut buffer = buffer_with(&["abcdef", "gh"]);
        buffer.extract_up_to(2);
        assert_eq!(buffer.flush_all(), ["cdef", "gh"]);
        assert!(buffer.is_empty());
    }

    // ==================== content_as_string / Zähler ====================

    #[test]
    fn content_as_string_reflects_splits() {
        let mut buffer = buffer_with(&["Hello ", "world"]);
        buffer.extract_up_to(3);
        assert_eq!(buffer.content_as_string(), "lo world");
        assert_eq!(buffer.total_length(), 8);
        assert_eq!(buffer.token_count(), 2);
    }

    /// `total_length` entspricht nach jeder Operation der Summe der
    /// effektiven Fragmentlängen.
    #[test]
    fn total_length_invariant_holds() {
        let mut buffer = buffer_with(&["abc", "defg", "hij"]);
        for n in [1, 3, 2, 4] {
            buffer.extract_up_to(n);
            assert_eq!(buffer.total_length(), buffer.content_as_string().len());
        }
        assert!(buffer.is_empty());
    }

    // ==================== Kompaktierung ====================

    /// Viele kleine Extraktionen: die logische Sicht bleibt korrekt, auch
    /// wenn intern kompaktiert wird.
    #[test]
    fn compaction_preserves_logical_state() {
        let mut buffer = TokenBuffer::new();
        for i in 0..200 {
            buffer.push(format!("frag{i:03} "));
        }
        let mut collected = String::new();
        while !buffer.is_empty() {
            collected.push_str(&buffer.extract_as_string(8));
        }

        let expected: String = (0..200).map(|i| format!("frag{i:03} ")).collect();
        assert_eq!(collected, expected);
        assert_eq!(buffer.token_count(), 0);
    }

    #[test]
    fn interleaved_push_and_extract() {
        let mut buffer = TokenBuffer::new();
        let mut collected = String::new();
        for i in 0..120 {
            buffer.push(format!("{i},"));
            if i % 2 == 1 {
                collected.push_str(&buffer.extract_as_string(3));
            }
        }
        collected.push_str(&buffer.flush_all().concat());

        let expected: String = (0..120).map(|i| format!("{i},")).collect();
        assert_eq!(collected, expected);
    }

    // ==================== Gemischte Abläufe ====================

    /// Extraktion über viele Fragmente hinweg: ganze und angeschnittene
    /// Fragmente in einem Aufruf.
    #[test]
    fn extract_spans_whole_and_split_fragments() {
        let mut buffer = buffer_with(&["ab", "cd", "ef", "gh"]);
        let extracted = buffer.extract_up_to(5);
        assert_eq!(extracted, ["ab", "cd", "e"]);
        assert_eq!(buffer.content_as_string(), "fgh");
        assert_eq!(buffer.token_count(), 2);
    }

    #[test]
    fn extract_as_string_spans_split_fragment() {
        let mut buffer = buffer_with(&["abcdef"]);
        buffer.extract_up_to(2);
        assert_eq!(buffer.extract_as_string(3), "cde");
        assert_eq!(buffer.content_as_string(), "f");
    }

    /// Push nach Extraktion hängt hinten an, der Split vorne bleibt gültig.
    #[test]
    fn push_after_extraction_appends() {
        let mut buffer = buffer_with(&["Hello ", "world"]);
        buffer.extract_up_to(8);
        buffer.push("!");
        assert_eq!(buffer.content_as_string(), "rld!");
        assert_eq!(buffer.total_length(), 4);
        assert_eq!(buffer.token_count(), 2);
    }

    #[test]
    fn drain_then_reuse() {
        let mut buffer = buffer_with(&["abc"]);
        buffer.extract_up_to(3);
        assert!(buffer.is_empty());
        assert_eq!(buffer.content_as_string(), "");

        buffer.push("neu");
        assert_eq!(buffer.content_as_string(), "neu");
        assert_eq!(buffer.total_length(), 3);
    }

    /// Viele kleine Extraktionen aus einem großen Fragment: nur der Offset
    /// wandert, das Ergebnis bleibt korrekt.
    #[test]
    fn small_extracts_from_one_large_fragment() {
        let big: String = "x".repeat(1000);
        let mut buffer = TokenBuffer::new();
        buffer.push(big.clone());

        let mut collected = String::new();
        while !buffer.is_empty() {
            collected.push_str(&buffer.extract_as_string(7));
        }
        assert_eq!(collected, big);
    }

    #[test]
    fn multibyte_repeated_extraction() {
        let mut buffer = buffer_with(&["äöüß", "αβγ"]);
        // je 2 Bytes
        assert_eq!(buffer.extract_as_string(4), "äö");
        assert_eq!(buffer.extract_as_string(4), "üß");
        assert_eq!(buffer.extract_as_string(6), "αβγ");
        assert!(buffer.is_empty());
    }

    #[test]
    fn flush_all_after_partial_extract_of_single_fragment() {
        let mut buffer = buffer_with(&["abcdef"]);
        buffer.extract_up_to(5);
        assert_eq!(buffer.flush_all(), ["f"]);
    }

    /// `extract_up_to(0)` mitten in einer Split-Situation ist ein No-Op.
    #[test]
    fn zero_extract_with_active_split() {
        let mut buffer = buffer_with(&["abcdef"]);
        buffer.extract_up_to(2);
        assert!(buffer.extract_up_to(0).is_empty());
        assert_eq!(buffer.content_as_string(), "cdef");
    }

    #[test]
    fn token_count_tracks_logical_fragments() {
        let mut buffer = buffer_with(&["aa", "bb", "cc"]);
        assert_eq!(buffer.token_count(), 3);
        buffer.extract_up_to(2);
        assert_eq!(buffer.token_count(), 2);
        buffer.extract_up_to(1);
        assert_eq!(buffer.token_count(), 2);
        buffer.extract_up_to(3);
        assert_eq!(buffer.token_count(), 0);
    }
}
