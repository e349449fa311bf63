//! The in-memory RST document and its loading/saving.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Group, Relation, SecondaryEdge, Segment, Signal};

/// Errors raised while loading or saving a document model.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read document {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse document: {message}")]
    Parse { message: String },

    #[error("failed to serialize document {id}: {message}")]
    Serialize { id: String, message: String },
}

/// A complete discourse-annotated document.
///
/// Collections keep document order. Segments in particular are concatenated
/// into the primary text in the order they appear here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RstDocument {
    /// Document identity, used when reporting mapping failures.
    pub id: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub secondary_edges: Vec<SecondaryEdge>,
    #[serde(default)]
    pub signals: Vec<Signal>,
    /// Header vocabulary: relation name -> relation type (`rst`, `multinuc`).
    #[serde(default)]
    pub relation_types: BTreeMap<String, String>,
    /// Header vocabulary: signal type -> allowed subtypes.
    #[serde(default)]
    pub signal_types: BTreeMap<String, BTreeSet<String>>,
}

impl RstDocument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Parse a document from its RON representation.
    pub fn from_ron_str(input: &str) -> Result<Self, DocumentError> {
        ron::from_str(input).map_err(|e| DocumentError::Parse {
            message: e.to_string(),
        })
    }

    /// Serialize to pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, DocumentError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).map_err(|e| {
            DocumentError::Serialize {
                id: self.id.clone(),
                message: e.to_string(),
            }
        })
    }

    /// Load a document from a `.ron` file.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = fs::read_to_string(path).map_err(|e| DocumentError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_ron_str(&content)
    }

    pub fn add_segment(&mut self, id: impl Into<String>, text: impl Into<String>) -> &mut Segment {
        let idx = self.segments.len();
        self.segments.push(Segment::new(id, text));
        &mut self.segments[idx]
    }

    pub fn add_group(&mut self, id: impl Into<String>) -> &mut Group {
        let idx = self.groups.len();
        self.groups.push(Group::new(id));
        &mut self.groups[idx]
    }

    pub fn add_relation(&mut self, parent: impl Into<String>, child: impl Into<String>) -> &mut Relation {
        let idx = self.relations.len();
        self.relations.push(Relation::new(parent, child));
        &mut self.relations[idx]
    }

    /// Create a relation, filling a missing type from the header vocabulary.
    pub fn create_relation(
        &mut self,
        parent: impl Into<String>,
        child: impl Into<String>,
        name: Option<&str>,
        relation_type: Option<&str>,
    ) -> &mut Relation {
        let mut relation = Relation::new(parent, child);
        relation.name = name.map(str::to_string);
        relation.relation_type = relation_type.map(str::to_string);
        relation.relation_type = self.relation_type_of(&relation).map(str::to_string);
        let idx = self.relations.len();
        self.relations.push(relation);
        &mut self.relations[idx]
    }

    /// Type of `relation`: its own, or the header type declared for its name.
    pub fn relation_type_of<'a>(&'a self, relation: &'a Relation) -> Option<&'a str> {
        relation.relation_type.as_deref().or_else(|| {
            relation
                .name
                .as_deref()
                .and_then(|name| self.relation_types.get(name))
                .map(String::as_str)
        })
    }

    pub fn add_secondary_edge(
        &mut self,
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        relation_name: impl Into<String>,
    ) -> &mut SecondaryEdge {
        let idx = self.secondary_edges.len();
        self.secondary_edges
            .push(SecondaryEdge::new(id, source, target, relation_name));
        &mut self.secondary_edges[idx]
    }

    pub fn add_signal(
        &mut self,
        signal_type: impl Into<String>,
        subtype: impl Into<String>,
        source: impl Into<String>,
        tokens: Vec<usize>,
    ) -> &mut Signal {
        let idx = self.signals.len();
        self.signals.push(Signal::new(
            signal_type,
            subtype,
            Some(source.into()),
            tokens,
        ));
        &mut self.signals[idx]
    }

    pub fn segment(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// All relations whose child is `id`.
    pub fn incoming_relations<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Relation> + 'a {
        self.relations.iter().filter(move |r| r.child == id)
    }

    /// All relations whose parent is `id`.
    pub fn outgoing_relations<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Relation> + 'a {
        self.relations.iter().filter(move |r| r.parent == id)
    }

    /// First relation whose parent is `id`.
    pub fn outgoing_relation<'a>(&'a self, id: &'a str) -> Option<&'a Relation> {
        self.outgoing_relations(id).next()
    }

    /// Signals whose type or subtype is missing from the header vocabulary.
    ///
    /// Returns nothing when the document declares no signal vocabulary.
    pub fn undeclared_signals(&self) -> impl Iterator<Item = (usize, &Signal)> + '_ {
        self.signals.iter().enumerate().filter(move |(_, signal)| {
            !self.signal_types.is_empty()
                && !self
                    .signal_types
                    .get(&signal.signal_type)
                    .map_or(false, |subtypes| subtypes.contains(&signal.subtype))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample() -> RstDocument {
        let mut doc = RstDocument::new("sample");
        doc.relation_types
            .insert("conjunction".to_string(), "multinuc".to_string());
        doc.add_group("grp1").set_type("multinuc");
        doc.add_segment("seg1", "Jim went to Harvard,");
        doc.add_segment("seg2", "and John went to Yale.");
        doc.create_relation("grp1", "seg1", Some("conjunction"), None);
        doc.create_relation("grp1", "seg2", Some("conjunction"), None);
        doc
    }

    #[test]
    fn test_create_relation_fills_type_from_header() {
        let doc = sample();
        assert_eq!(doc.relations.len(), 2);
        assert_eq!(doc.relations[0].relation_type.as_deref(), Some("multinuc"));

        let mut doc = doc;
        let explicit = doc.create_relation("grp1", "seg3", Some("conjunction"), Some("rst"));
        assert_eq!(explicit.relation_type.as_deref(), Some("rst"));
        let unknown = doc.create_relation("grp1", "seg4", Some("elaboration"), None);
        assert_eq!(unknown.relation_type, None);
    }

    #[test]
    fn test_relation_type_from_header_after_add_relation() {
        let mut doc = sample();
        doc.add_relation("grp1", "seg3").set_name("conjunction");
        doc.add_relation("grp1", "seg4").set_name("conjunction").set_type("rst");
        doc.add_relation("grp1", "seg5");

        assert_eq!(doc.relations[2].relation_type, None);
        assert_eq!(doc.relation_type_of(&doc.relations[2]), Some("multinuc"));
        assert_eq!(doc.relation_type_of(&doc.relations[3]), Some("rst"));
        assert_eq!(doc.relation_type_of(&doc.relations[4]), None);
    }

    #[test]
    fn test_relation_queries() {
        let doc = sample();
        assert_eq!(doc.outgoing_relations("grp1").count(), 2);
        assert_eq!(doc.incoming_relations("seg2").count(), 1);
        assert_eq!(doc.incoming_relations("grp1").count(), 0);
        assert_eq!(doc.outgoing_relation("grp1").map(|r| r.child.as_str()), Some("seg1"));
        assert!(doc.outgoing_relation("seg1").is_none());
        assert_eq!(doc.segment("seg2").map(|s| s.text.as_str()), Some("and John went to Yale."));
        assert!(doc.group("grp9").is_none());
    }

    #[test]
    fn test_undeclared_signals() {
        let mut doc = sample();
        doc.add_signal("dm", "and", "seg2", vec![6]);
        // No vocabulary declared: nothing is reported.
        assert_eq!(doc.undeclared_signals().count(), 0);

        doc.signal_types
            .insert("dm".to_string(), ["and".to_string()].into_iter().collect());
        doc.add_signal("dm", "but", "seg2", vec![6]);
        doc.add_signal("lexical", "synonymy", "seg1", vec![1]);

        let undeclared: Vec<usize> = doc.undeclared_signals().map(|(i, _)| i).collect();
        assert_eq!(undeclared, vec![1, 2]);
    }

    #[test]
    fn test_ron_roundtrip_preserves_order() {
        let doc = sample();
        let text = doc.to_ron_string().unwrap();
        let parsed = RstDocument::from_ron_str(&text).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_parse_minimal_ron() {
        let doc = RstDocument::from_ron_str(
            r#"(
                id: "minimal",
                segments: [(id: "1", text: "Hello there.")],
                signals: [(type: "dm", subtype: "and", source: Some("1"), tokens: [1])],
            )"#,
        )
        .unwrap();
        assert_eq!(doc.id, "minimal");
        assert_eq!(doc.segments[0].segment_type, None);
        assert!(doc.groups.is_empty());
        assert_eq!(doc.signals[0].source.as_deref(), Some("1"));
    }

    #[test]
    fn test_parse_error() {
        let err = RstDocument::from_ron_str("(id: ").unwrap_err();
        assert!(matches!(err, DocumentError::Parse { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", sample().to_ron_string().unwrap()).unwrap();
        let loaded = RstDocument::load(file.path()).unwrap();
        assert_eq!(loaded.id, "sample");
        assert_eq!(loaded.segments.len(), 2);

        let missing = RstDocument::load(Path::new("/nonexistent/doc.ron")).unwrap_err();
        assert!(matches!(missing, DocumentError::Read { .. }));
    }
}
