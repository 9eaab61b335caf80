//! Streaming parser for open tags.
//!
//! Wird aktiv sobald der Matcher ein `<tagname`-Präfix geliefert hat und
//! konsumiert anschließend Zeichen für Zeichen bis zum `>`, über beliebig
//! viele Chunks hinweg. Ein `>` innerhalb von Anführungszeichen beendet den
//! Tag nicht.
//!
//! The six attribute states mirror the usual tokenizer shape: after the tag
//! name, attribute name, after the name, before the value, quoted value,
//! unquoted value. Bare attributes (no `=`) get the empty string as value.

use indexmap::IndexMap;

/// A completed open tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag {
    /// The tag name as matched (alias names stay aliases here).
    pub tag_name: String,
    /// Attributes in source order. Duplicate names: last write wins, the
    /// first occurrence keeps its position.
    pub attributes: IndexMap<String, String>,
    /// The literal characters consumed, including `<tagname` and the
    /// closing `>` when one was seen.
    pub raw_tag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrState {
    AfterTagName,
    AttrName,
    AfterAttrName,
    BeforeAttrValue,
    AttrValueQuoted,
    AttrValueUnquoted,
}

/// Incremental open-tag parser, seeded with the matched `<tagname` prefix.
#[derive(Debug)]
pub struct OpenTagParser {
    tag_name: String,
    attributes: IndexMap<String, String>,
    raw: String,
    current_tok: String,
    state: AttrState,
    current_attr_name: Option<String>,
    quote_char: Option<char>,
    remaining: Option<String>,
}

impl OpenTagParser {
    /// Starts parsing from the pattern the matcher surfaced (e.g. `"<cite"`).
    pub fn new(start_pattern: &str) -> Self {
        Self {
            tag_name: start_pattern[1..].to_string(),
            attributes: IndexMap::new(),
            raw: start_pattern.to_string(),
            current_tok: String::new(),
            state: AttrState::AfterTagName,
            current_attr_name: None,
            quote_char: None,
            remaining: None,
        }
    }

    /// Consumes one chunk. Returns the completed tag once `>` is seen
    /// (outside quotes); `None` means more input is needed.
    ///
    /// Nach Abschluss hält [`remaining`](Self::remaining) die restlichen
    /// Zeichen des Chunks hinter dem `>`.
    pub fn feed(&mut self, chunk: &str) -> Option<ParsedTag> {
        for (i, c) in chunk.char_indices() {
            self.raw.push(c);

            match self.state {
                AttrState::AfterTagName => {
                    if c == '>' {
                        return Some(self.complete(&chunk[i + 1..]));
                    } else if !c.is_whitespace() {
                        self.state = AttrState::AttrName;
                        self.current_tok.push(c);
                    }
                }

                AttrState::AttrName => {
                    if c == '=' {
                        self.current_attr_name = Some(std::mem::take(&mut self.current_tok));
                        self.state = AttrState::BeforeAttrValue;
                    } else if c == '>' {
                        if !self.current_tok.is_empty() {
                            let name = std::mem::take(&mut self.current_tok);
                            self.attributes.insert(name, String::new());
                        }
                        return Some(self.complete(&chunk[i + 1..]));
                    } else if c.is_whitespace() {
                        self.current_attr_name = Some(std::mem::take(&mut self.current_tok));
                        self.state = AttrState::AfterAttrName;
                    } else {
                        self.current_tok.push(c);
                    }
                }

                AttrState::AfterAttrName => {
                    if c == '=' {
                        self.state = AttrState::BeforeAttrValue;
                    } else if c == '>' {
                        self.flush_bare_attr();
                        return Some(self.complete(&chunk[i + 1..]));
                    } else if !c.is_whitespace() {
                        // Vorheriger Name war ein nacktes Attribut
                        self.flush_bare_attr();
                        self.state = AttrState::AttrName;
                        self.current_tok.push(c);
                    }
                }

                AttrState::BeforeAttrValue => {
                    if c == '"' || c == '\'' {
                        self.quote_char = Some(c);
                        self.state = AttrState::AttrValueQuoted;
                    } else if c == '>' {
                        if let Some(name) = self.current_attr_name.take() {
                            self.attributes.insert(name, String::new());
                        }
                        return Some(self.complete(&chunk[i + 1..]));
                    } else if !c.is_whitespace() {
                        self.state = AttrState::AttrValueUnquoted;
                        self.current_tok.push(c);
                    }
                }

                AttrState::AttrValueQuoted => {
                    if Some(c) == self.quote_char {
                        self.flush_valued_attr();
                        self.quote_char = None;
                        self.state = AttrState::AfterTagName;
                    } else {
                        // `>` und Whitespace gehören innerhalb der Quotes zum Wert
                        self.current_tok.push(c);
                    }
                }

                AttrState::AttrValueUnquoted => {
                    if c == '>' {
                        self.flush_valued_attr();
                        return Some(self.complete(&chunk[i + 1..]));
                    } else if c.is_whitespace() {
                        self.flush_valued_attr();
                        self.state = AttrState::AfterTagName;
                    } else {
                        self.current_tok.push(c);
                    }
                }
            }
        }

        None
    }

    /// Closes the tag with everything gathered so far. A half-parsed
    /// attribute (unclosed quote, name with pending `=`) is discarded.
    /// Used on the flush path when the stream ends before `>`.
    pub fn force_complete(&mut self) -> ParsedTag {
        self.complete("")
    }

    /// Trailing characters of the completing chunk after `>`.
    pub fn remaining(&self) -> Option<&str> {
        self.remaining.as_deref()
    }

    /// The raw characters consumed so far.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    fn flush_bare_attr(&mut self) {
        if let Some(name) = self.current_attr_name.take() {
            if !name.is_empty() {
                self.attributes.insert(name, String::new());
            }
        }
    }

    fn flush_valued_attr(&mut self) {
        let value = std::mem::take(&mut self.current_tok);
        if let Some(name) = self.current_attr_name.take() {
            self.attributes.insert(name, value);
        }
    }

    fn complete(&mut self, rest: &str) -> ParsedTag {
        self.remaining = Some(rest.to_string());
        ParsedTag {
            tag_name: std::mem::take(&mut self.tag_name),
            attributes: std::mem::take(&mut self.attributes),
            raw_tag: std::mem::take(&mut self.raw),
        }
    }
}
