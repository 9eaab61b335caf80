//! State transition table over the schema tree.
//!
//! Die Baumknoten liegen in einer Arena (`Vec<StateNode>`), Eltern- und
//! Kindverweise sind Indizes. Das vermeidet zyklische Ownership komplett;
//! die Wurzel ist `StateId(0)`.
//!
//! Aliases: every alias of a tag is inserted as an additional key in the
//! parent's child map, all resolving to the same canonical node. Opening by
//! any alias enters that node, and closing by any alias passes the
//! `parent.children[name] == current` check symmetrically.

use crate::schema::TagSchema;
use crate::{FastHashMap, FastHashSet, Result};

/// Index eines Zustandsknotens in der Arena. Wurzel ist `StateId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateId(u32);

#[derive(Debug)]
struct StateNode {
    /// Full path, e.g. `/section/subsection`. Root is `/`.
    path: String,
    /// Display tag name, the path's last segment. Absent at the root.
    tag_name: Option<String>,
    parent: Option<StateId>,
    /// Child lookup by tag name, alias keys included.
    children: FastHashMap<String, StateId>,
}

/// Immutable transition table with O(1) child lookup and alias-aware close.
#[derive(Debug)]
pub struct TransitionTable {
    nodes: Vec<StateNode>,
    /// Pfad → erlaubte Attributnamen.
    allowed_attrs: FastHashMap<String, FastHashSet<String>>,
    /// Tag-Namen-Universum: kanonische Namen plus Aliasse, dedupliziert,
    /// in Schema-Reihenfolge.
    tag_names: Vec<String>,
}

impl TransitionTable {
    /// Builds the table from a schema.
    ///
    /// Surfaces any configuration error the schema builder recorded.
    pub fn new(schema: &TagSchema) -> Result<Self> {
        schema.validate()?;

        let mut table = Self {
            nodes: vec![StateNode {
                path: "/".to_string(),
                tag_name: None,
                parent: None,
                children: FastHashMap::default(),
            }],
            allowed_attrs: FastHashMap::default(),
            tag_names: Vec::new(),
        };

        // Knoten in Tiefenreihenfolge anlegen, damit Eltern immer existieren
        let mut paths: Vec<&str> = schema.paths().collect();
        paths.sort_by_key(|p| p.matches('/').count());
        for path in paths {
            table.create_node(path);
        }

        // Alias-Schlüssel einhängen und Universum einsammeln
        let mut seen: FastHashSet<String> = FastHashSet::default();
        for (path, names) in schema.path_to_tags() {
            let Some(target) = table.find_by_path(path) else { continue };
            let Some(parent) = table.nodes[target.0 as usize].parent else { continue };
            for name in names {
                table.nodes[parent.0 as usize].children.insert(name.clone(), target);
                if seen.insert(name.clone()) {
                    table.tag_names.push(name.clone());
                }
            }
        }

        for (path, attrs) in schema.path_to_attrs() {
            table
                .allowed_attrs
                .insert(path.to_string(), attrs.iter().cloned().collect());
        }

        Ok(table)
    }

    fn create_node(&mut self, path: &str) {
        let mut current = StateId(0);
        let mut current_path = String::new();

        for segment in path.trim_start_matches('/').split('/') {
            current_path.push('/');
            current_path.push_str(segment);

            current = match self.nodes[current.0 as usize].children.get(segment) {
                Some(&child) => child,
                None => {
                    let child = StateId(self.nodes.len() as u32);
                    self.nodes.push(StateNode {
                        path: current_path.clone(),
                        tag_name: Some(segment.to_string()),
                        parent: Some(current),
                        children: FastHashMap::default(),
                    });
                    self.nodes[current.0 as usize]
                        .children
                        .insert(segment.to_string(), child);
                    child
                }
            };
        }
    }

    fn find_by_path(&self, path: &str) -> Option<StateId> {
        if path == "/" {
            return Some(StateId(0));
        }
        let mut current = StateId(0);
        for segment in path.trim_start_matches('/').split('/') {
            current = *self.nodes[current.0 as usize].children.get(segment)?;
        }
        Some(current)
    }

    /// The root state (`/`).
    pub fn root(&self) -> StateId {
        StateId(0)
    }

    /// Attempts to descend into a child by tag name (or alias).
    pub fn try_open(&self, current: StateId, tag_name: &str) -> Option<StateId> {
        self.nodes[current.0 as usize].children.get(tag_name).copied()
    }

    /// Attempts to close the current node by tag name (or alias).
    ///
    /// Liefert den Elternknoten wenn der Name (inklusive Aliasse) auf den
    /// aktuellen Knoten zeigt, sonst nichts. Die Wurzel kann nicht
    /// geschlossen werden.
    pub fn try_close(&self, current: StateId, tag_name: &str) -> Option<StateId> {
        let parent = self.nodes[current.0 as usize].parent?;
        if self.nodes[parent.0 as usize].children.get(tag_name) == Some(&current) {
            Some(parent)
        } else {
            None
        }
    }

    /// The path string of a state.
    pub fn path(&self, state: StateId) -> &str {
        &self.nodes[state.0 as usize].path
    }

    /// The display tag name of a state (absent at the root).
    pub fn tag_name(&self, state: StateId) -> Option<&str> {
        self.nodes[state.0 as usize].tag_name.as_deref()
    }

    /// True for the root state.
    pub fn is_root(&self, state: StateId) -> bool {
        state == StateId(0)
    }

    /// The tag name universe (canonical names plus aliases).
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tag_names.iter().map(String::as_str)
    }

    /// Attribut-Whitelist eines Pfades, sofern vorhanden.
    pub(crate) fn allowed_attributes(&self, path: &str) -> Option<&FastHashSet<String>> {
        self.allowed_attrs.get(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(build: impl FnOnce(TagSchema) -> TagSchema) -> TransitionTable {
        TransitionTable::new(&build(TagSchema::root())).unwrap()
    }

    // ==================== Baumaufbau ====================

    #[test]
    fn root_has_slash_path() {
        let t = table(|s| s.tag("a"));
        assert_eq!(t.path(t.root()), "/");
        assert!(t.is_root(t.root()));
        assert_eq!(t.tag_name(t.root()), None);
    }

    #[test]
    fn nested_paths_build_a_tree() {
        let t = table(|s| {
            s.tag_with("section", |s| {
                s.tag_with("subsection", |s| s.tag("content")).tag("metadata")
            })
        });

        let section = t.try_open(t.root(), "section").unwrap();
        let subsection = t.try_open(section, "subsection").unwrap();
        let content = t.try_open(subsection, "content").unwrap();
        let metadata = t.try_open(section, "metadata").unwrap();

        assert_eq!(t.path(section), "/section");
        assert_eq!(t.path(subsection), "/section/subsection");
        assert_eq!(t.path(content), "/section/subsection/content");
        assert_eq!(t.path(metadata), "/section/metadata");
        assert_eq!(t.tag_name(content), Some("content"));
    }

    #[test]
    fn tag_universe_contains_aliases() {
        let t = table(|s| s.tag("cite").alias("rag").alias("ref").tag("think"));
        let names: Vec<&str> = t.tag_names().collect();
        assert_eq!(names, ["cite", "rag", "ref", "think"]);
    }

    // ==================== try_open ====================

    #[test]
    fn try_open_descends_on_valid_child() {
        let t = table(|s| s.tag("answer"));
        let answer = t.try_open(t.root(), "answer").unwrap();
        assert_eq!(t.path(answer), "/answer");
    }

    #[test]
    fn try_open_rejects_unknown_tag() {
        let t = table(|s| s.tag("answer"));
        assert!(t.try_open(t.root(), "invalid").is_none());
    }

    /// Übergänge gelten nur zwischen Eltern und Kind, nicht quer durch den
    /// Baum.
    #[test]
    fn try_open_rejects_cross_tree_transition() {
        let t = table(|s| s.tag_with("a", |s| s.tag("inner")).tag("b"));
        let b = t.try_open(t.root(), "b").unwrap();
        assert!(t.try_open(b, "inner").is_none());
    }

    #[test]
    fn try_open_by_alias_enters_canonical_node() {
        let t = table(|s| s.tag("cite").alias("rag"));
        let via_alias = t.try_open(t.root(), "rag").unwrap();
        let via_name = t.try_open(t.root(), "cite").unwrap();
        assert_eq!(via_alias, via_name);
        assert_eq!(t.path(via_alias), "/cite");
    }

    // ==================== try_close ====================

    #[test]
    fn try_close_returns_parent() {
        let t = table(|s| s.tag_with("a", |s| s.tag("b")));
        let a = t.try_open(t.root(), "a").unwrap();
        let b = t.try_open(a, "b").unwrap();
        assert_eq!(t.try_close(b, "b"), Some(a));
        assert_eq!(t.try_close(a, "a"), Some(t.root()));
    }

    #[test]
    fn try_close_on_root_is_rejected() {
        let t = table(|s| s.tag("a"));
        assert!(t.try_close(t.root(), "a").is_none());
    }

    #[test]
    fn try_close_with_wrong_name_is_rejected() {
        let t = table(|s| s.tag("a").tag("b"));
        let a = t.try_open(t.root(), "a").unwrap();
        assert!(t.try_close(a, "b").is_none());
    }

    /// Öffnen per Alias, Schließen per kanonischem Namen (und umgekehrt).
    #[test]
    fn close_accepts_any_alias() {
        let t = table(|s| s.tag("cite").alias("rag"));
        let node = t.try_open(t.root(), "rag").unwrap();
        assert_eq!(t.try_close(node, "cite"), Some(t.root()));
        assert_eq!(t.try_close(node, "rag"), Some(t.root()));
        assert!(t.try_close(node, "other").is_none());
    }

    /// Geschwisterknoten mit gleichem Tag-Namen unter verschiedenen Eltern.
    #[test]
    fn same_tag_name_under_different_parents() {
        let t = table(|s| {
            s.tag_with("a", |s| s.tag("x")).tag_with("b", |s| s.tag("x"))
        });
        let a = t.try_open(t.root(), "a").unwrap();
        let b = t.try_open(t.root(), "b").unwrap();
        let ax = t.try_open(a, "x").unwrap();
        let bx = t.try_open(b, "x").unwrap();
        assert_ne!(ax, bx);
        assert_eq!(t.path(ax), "/a/x");
        assert_eq!(t.path(bx), "/b/x");
    }

    // ==================== Attribute ====================

    #[test]
    fn allowed_attributes_by_path() {
        let t = table(|s| s.tag("cite").attr("id").attr("source"));
        let allowed = t.allowed_attributes("/cite").unwrap();
        assert!(allowed.contains("id"));
        assert!(allowed.contains("source"));
        assert!(!allowed.contains("page"));
        assert!(t.allowed_attributes("/other").is_none());
    }

    /// Drei Aliasse, alle führen in denselben Knoten und schließen ihn.
    #[test]
    fn multiple_aliases_are_symmetric() {
        let t = table(|s| s.tag("cite").alias("rag").alias("ref").alias("quelle"));
        let canonical = t.try_open(t.root(), "cite").unwrap();

        for name in ["cite", "rag", "ref", "quelle"] {
            let entered = t.try_open(t.root(), name).unwrap();
            assert_eq!(entered, canonical, "{name}");
            assert_eq!(t.try_close(entered, name), Some(t.root()), "{name}");
        }
    }

    /// Aliasse auf verschachtelten Tags wirken nur unter deren Eltern.
    #[test]
    fn alias_on_nested_tag() {
        let t = table(|s| s.tag_with("cite", |s| s.tag("id").alias("ref")));
        let cite = t.try_open(t.root(), "cite").unwrap();
        let id = t.try_open(cite, "ref").unwrap();
        assert_eq!(t.path(id), "/cite/id");
        assert!(t.try_open(t.root(), "ref").is_none());
    }

    #[test]
    fn deep_path_string() {
        let t = table(|s| s.tag_with("a", |s| s.tag_with("b", |s| s.tag("c"))));
        let a = t.try_open(t.root(), "a").unwrap();
        let b = t.try_open(a, "b").unwrap();
        let c = t.try_open(b, "c").unwrap();
        assert_eq!(t.path(c), "/a/b/c");
        assert_eq!(t.tag_name(c), Some("c"));
        assert!(!t.is_root(c));
    }

    /// Aus der Tiefe führt kein Übergang zu einem Geschwister der Wurzel.
    #[test]
    fn no_transition_from_depth_to_root_sibling() {
        let t = table(|s| s.tag_with("a", |s| s.tag("inner")).tag("b"));
        let a = t.try_open(t.root(), "a").unwrap();
        let inner = t.try_open(a, "inner").unwrap();
        assert!(t.try_open(inner, "b").is_none());
        assert!(t.try_open(a, "b").is_none());
    }

    /// `tag_names` dedupliziert, auch wenn ein Alias anderswo als
    /// kanonischer Name vorkommt.
    #[test]
    fn tag_universe_deduplicates_cross_use() {
        let t = table(|s| s.tag("cite").alias("x").tag_with("a", |s| s.tag("x")));
        let names: Vec<&str> = t.tag_names().collect();
        assert_eq!(names, ["cite", "x", "a"]);
    }

    // ==================== Fehler ====================

    #[test]
    fn builder_errors_surface_here() {
        let schema = TagSchema::root().tag("");
        assert!(TransitionTable::new(&schema).is_err());
    }

    /// Ein leeres Schema ergibt eine reine Wurzel-Tabelle.
    #[test]
    fn empty_schema_is_root_only() {
        let t = TransitionTable::new(&TagSchema::root()).unwrap();
        assert_eq!(t.path(t.root()), "/");
        assert_eq!(t.tag_names().count(), 0);
        assert!(t.try_open(t.root(), "anything").is_none());
    }
}
