//! Aho-Corasick pattern trie.
//!
//! Immutable nach dem Aufbau: Goto-Kanten, Failure-Links und aggregierte
//! Output-Listen werden einmal berechnet, danach können beliebig viele
//! Matcher dieselbe Instanz teilen (über `Arc`).
//!
//! Die Knoten liegen in einer Arena (`Vec<TrieNode>`), Verweise sind
//! u32-Indizes. Tiefen sind Byte-Tiefen (UTF-8), damit der Matcher direkt
//! mit Byte-Positionen im Puffer rechnen kann.

use crate::{Error, FastHashMap, FastHashSet, Result};

/// Index eines Trie-Knotens in der Arena. Wurzel ist `TrieState(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TrieState(u32);

#[derive(Debug)]
struct TrieNode {
    children: FastHashMap<char, u32>,
    /// Failure-Link; die Wurzel zeigt auf sich selbst.
    fail: u32,
    /// Pattern-Indizes die an diesem Knoten enden, inklusive der über
    /// Failure-Links erreichbaren.
    out: Vec<u32>,
    /// Byte length of the path from the root to this node.
    depth: usize,
}

impl TrieNode {
    fn new(depth: usize) -> Self {
        Self { children: FastHashMap::default(), fail: 0, out: Vec::new(), depth }
    }
}

/// Multi-pattern trie with failure links and aggregated outputs.
///
/// # Beispiel
///
/// ```
/// use tagstrom::PatternTrie;
///
/// let trie = PatternTrie::new(["<cite", "</cite>"]).unwrap();
/// assert_eq!(trie.pattern_count(), 2);
/// assert_eq!(trie.max_pattern_len(), 7);
/// ```
#[derive(Debug)]
pub struct PatternTrie {
    nodes: Vec<TrieNode>,
    patterns: Vec<String>,
    max_pattern_len: usize,
}

impl PatternTrie {
    /// Builds a trie from the given patterns.
    ///
    /// Duplicates are collapsed. Fails with [`Error::EmptyPatternSet`] when
    /// no pattern is given and with [`Error::EmptyPattern`] when a pattern
    /// is the empty string.
    pub fn new(patterns: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        let mut unique: Vec<String> = Vec::new();
        let mut seen: FastHashSet<String> = FastHashSet::default();
        for pattern in patterns {
            let pattern = pattern.into();
            if pattern.is_empty() {
                return Err(Error::EmptyPattern);
            }
            if seen.insert(pattern.clone()) {
                unique.push(pattern);
            }
        }
        if unique.is_empty() {
            return Err(Error::EmptyPatternSet);
        }

        let max_pattern_len = unique.iter().map(String::len).max().unwrap_or(0);
        let mut trie = Self {
            nodes: vec![TrieNode::new(0)],
            patterns: unique,
            max_pattern_len,
        };
        trie.build_goto();
        trie.build_failure_links();
        Ok(trie)
    }

    /// Builder-Einstieg, siehe [`Builder`].
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// [1. Phase] Goto-Kanten anlegen.
    fn build_goto(&mut self) {
        for idx in 0..self.patterns.len() {
            let mut node = 0usize;
            let pattern = self.patterns[idx].clone();
            for c in pattern.chars() {
                node = match self.nodes[node].children.get(&c) {
                    Some(&child) => child as usize,
                    None => {
                        let depth = self.nodes[node].depth + c.len_utf8();
                        let child = self.nodes.len();
                        self.nodes.push(TrieNode::new(depth));
                        self.nodes[node].children.insert(c, child as u32);
                        child
                    }
                };
            }
            self.nodes[node].out.push(idx as u32);
        }
    }

    /// [2. Phase] Failure-Links per Breitensuche, Outputs aggregieren.
    fn build_failure_links(&mut self) {
        let mut queue: std::collections::VecDeque<u32> = std::collections::VecDeque::new();

        let root_children: Vec<u32> = self.nodes[0].children.values().copied().collect();
        for child in root_children {
            self.nodes[child as usize].fail = 0;
            queue.push_back(child);
        }

        while let Some(current) = queue.pop_front() {
            let children: Vec<(char, u32)> = self.nodes[current as usize]
                .children
                .iter()
                .map(|(&c, &n)| (c, n))
                .collect();

            for (c, child) in children {
                queue.push_back(child);

                let mut fail = self.nodes[current as usize].fail;
                let target = loop {
                    if let Some(&next) = self.nodes[fail as usize].children.get(&c) {
                        break next;
                    }
                    if fail == 0 {
                        break 0;
                    }
                    fail = self.nodes[fail as usize].fail;
                };

                self.nodes[child as usize].fail = target;

                let inherited = self.nodes[target as usize].out.clone();
                self.nodes[child as usize].out.extend(inherited);
            }
        }
    }

    // --- Navigation (vom Matcher benutzt) ---

    pub(crate) fn root(&self) -> TrieState {
        TrieState(0)
    }

    pub(crate) fn child(&self, state: TrieState, c: char) -> Option<TrieState> {
        self.nodes[state.0 as usize].children.get(&c).map(|&n| TrieState(n))
    }

    pub(crate) fn fail(&self, state: TrieState) -> TrieState {
        TrieState(self.nodes[state.0 as usize].fail)
    }

    pub(crate) fn outputs(&self, state: TrieState) -> &[u32] {
        &self.nodes[state.0 as usize].out
    }

    pub(crate) fn has_children(&self, state: TrieState) -> bool {
        !self.nodes[state.0 as usize].children.is_empty()
    }

    pub(crate) fn depth(&self, state: TrieState) -> usize {
        self.nodes[state.0 as usize].depth
    }

    pub(crate) fn pattern_len(&self, idx: u32) -> usize {
        self.patterns[idx as usize].len()
    }

    // --- Accessors ---

    /// The registered patterns, in insertion order (duplicates collapsed).
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    /// Number of distinct patterns.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Byte length of the longest pattern.
    pub fn max_pattern_len(&self) -> usize {
        self.max_pattern_len
    }
}

/// Fluent builder collecting patterns before trie construction.
///
/// Validierung passiert in [`build`](Builder::build), nicht beim Sammeln.
#[derive(Debug, Default)]
pub struct Builder {
    patterns: Vec<String>,
}

impl Builder {
    /// Adds one pattern.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Adds several patterns.
    pub fn patterns(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Builds the trie, validating the collected pattern set.
    pub fn build(self) -> Result<PatternTrie> {
        PatternTrie::new(self.patterns)
    }
}
