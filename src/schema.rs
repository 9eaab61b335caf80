//! Hierarchical tag schema builder.
//!
//! Fluent API zum Deklarieren der Tag-Struktur, der Aliasse und der pro Pfad
//! erlaubten Attribute. Der Builder sammelt nur Daten ein; den eigentlichen
//! Zustandsbaum baut [`TransitionTable`](crate::TransitionTable).
//!
//! Konfigurationsfehler (leere Namen, `alias()`/`attr()` ohne
//! vorangehendes `tag()`) werden im Builder vermerkt und beim Bau von
//! Adapter oder Tabelle als `Err` gemeldet; der erste Fehler gewinnt.
//!
//! # Beispiel
//!
//! ```
//! use tagstrom::TagSchema;
//!
//! let schema = TagSchema::root()
//!     .tag_with("section", |s| s
//!         .tag_with("subsection", |s| s.tag("content"))
//!         .tag("metadata"))
//!     .tag("cite").alias("rag").attr("id");
//!
//! let paths: Vec<&str> = schema.paths().collect();
//! assert!(paths.contains(&"/section/subsection/content"));
//! assert!(paths.contains(&"/cite"));
//! ```

use crate::{Error, FastIndexMap, FastIndexSet, Result};

/// Builder for the schema's path set, aliases, and attribute whitelists.
#[derive(Debug, Clone, Default)]
pub struct TagSchema {
    /// Pfad der aktuellen Verschachtelungsebene (`/` an der Wurzel).
    current_path: String,
    /// Pfad → [kanonischer Name, Aliasse…].
    path_to_tags: FastIndexMap<String, Vec<String>>,
    /// Pfad → erlaubte Attributnamen.
    path_to_attrs: FastIndexMap<String, FastIndexSet<String>>,
    /// Pfad des zuletzt hinzugefügten Tags, Ziel für `alias()`/`attr()`.
    last_added: Option<String>,
    /// Erster aufgezeichneter Konfigurationsfehler.
    error: Option<Error>,
}

impl TagSchema {
    /// Starts an empty schema at the root path `/`.
    pub fn root() -> Self {
        Self { current_path: "/".to_string(), ..Self::default() }
    }

    /// Declares a tag at the current level.
    pub fn tag(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if name.is_empty() {
            return self.record(Error::EmptyTagName);
        }

        let child_path = self.child_path(&name);
        self.path_to_tags.insert(child_path.clone(), vec![name]);
        self.last_added = Some(child_path);
        self
    }

    /// Declares a tag with nested children, built inside the closure.
    ///
    /// `alias()` und `attr()` nach dem Closure beziehen sich auf das hier
    /// deklarierte Tag, nicht auf dessen Kinder.
    pub fn tag_with(
        mut self,
        name: impl Into<String>,
        build: impl FnOnce(TagSchema) -> TagSchema,
    ) -> Self {
        let name = name.into();
        if name.is_empty() {
            return self.record(Error::EmptyTagName);
        }

        let child_path = self.child_path(&name);
        self.path_to_tags.insert(child_path.clone(), vec![name]);

        // Kind-Kontext teilt sich die Maps, nur der Pfad wechselt
        let child_context = TagSchema {
            current_path: child_path.clone(),
            path_to_tags: std::mem::take(&mut self.path_to_tags),
            path_to_attrs: std::mem::take(&mut self.path_to_attrs),
            last_added: None,
            error: self.error.take(),
        };
        let child_context = build(child_context);

        self.path_to_tags = child_context.path_to_tags;
        self.path_to_attrs = child_context.path_to_attrs;
        self.error = child_context.error;
        self.last_added = Some(child_path);
        self
    }

    /// Adds an alias to the most recently declared tag.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        let Some(path) = self.last_added.clone() else {
            return self.record(Error::AliasBeforeTag);
        };
        let name = name.into();
        if name.is_empty() {
            return self.record(Error::EmptyAlias);
        }

        if let Some(tags) = self.path_to_tags.get_mut(&path) {
            tags.push(name);
        }
        self
    }

    /// Whitelists an attribute on the most recently declared tag.
    pub fn attr(mut self, name: impl Into<String>) -> Self {
        let Some(path) = self.last_added.clone() else {
            return self.record(Error::AttributeBeforeTag);
        };
        let name = name.into();
        if name.is_empty() {
            return self.record(Error::EmptyAttribute);
        }

        self.path_to_attrs.entry(path).or_default().insert(name);
        self
    }

    /// Returns the first recorded configuration error, if any.
    pub fn validate(&self) -> Result<()> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// All declared paths, in declaration order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.path_to_tags.keys().map(String::as_str)
    }

    /// Das Tag-Namen-Universum: kanonische Namen plus Aliasse,
    /// dedupliziert, in Deklarationsreihenfolge.
    pub fn tag_names(&self) -> Vec<&str> {
        let mut seen: FastIndexSet<&str> = FastIndexSet::default();
        for names in self.path_to_tags.values() {
            for name in names {
                seen.insert(name.as_str());
            }
        }
        seen.into_iter().collect()
    }

    /// Path → `[canonical name, aliases…]` pairs, in declaration order.
    pub fn path_to_tags(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.path_to_tags.iter().map(|(path, names)| (path.as_str(), names.as_slice()))
    }

    /// Whitelisted attribute names of a path.
    pub fn allowed_attributes(&self, path: &str) -> impl Iterator<Item = &str> {
        self.path_to_attrs
            .get(path)
            .into_iter()
            .flat_map(|attrs| attrs.iter().map(String::as_str))
    }

    pub(crate) fn path_to_attrs(&self) -> impl Iterator<Item = (&str, &FastIndexSet<String>)> {
        self.path_to_attrs.iter().map(|(path, attrs)| (path.as_str(), attrs))
    }

    fn child_path(&self, name: &str) -> String {
        if self.current_path == "/" {
            format!("/{name}")
        } else {
            format!("{}/{name}", self.current_path)
        }
    }

    fn record(mut self, error: Error) -> Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }
}
