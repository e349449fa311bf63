//! Discourse units, relations and signals as read from an RST document.
//!
//! These are plain data types. Referential integrity between them is not
//! guaranteed here; the mapper validates every id when it consumes them.

use serde::{Deserialize, Serialize};

/// Leaf discourse unit carrying its own text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub text: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub segment_type: Option<String>,
}

impl Segment {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            segment_type: None,
        }
    }

    /// Set the node type (e.g. `multinuc`, `rst`).
    pub fn set_type(&mut self, segment_type: impl Into<String>) -> &mut Self {
        self.segment_type = Some(segment_type.into());
        self
    }
}

/// Internal discourse unit; spans whatever its children span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub group_type: Option<String>,
}

impl Group {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group_type: None,
        }
    }

    pub fn set_type(&mut self, group_type: impl Into<String>) -> &mut Self {
        self.group_type = Some(group_type.into());
        self
    }
}

/// Directed edge of the discourse tree, from `parent` down to `child`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub parent: String,
    pub child: String,
    /// Relation class from the header, usually `rst`, `multinuc` or `span`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub relation_type: Option<String>,
    /// Relation name, e.g. `elaboration` or `conjunction`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Relation {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
            relation_type: None,
            name: None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_type(&mut self, relation_type: impl Into<String>) -> &mut Self {
        self.relation_type = Some(relation_type.into());
        self
    }
}

/// Non-tree edge between two discourse units or other secondary edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relation_name: String,
}

impl SecondaryEdge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        relation_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            relation_name: relation_name.into(),
        }
    }
}

/// Evidence for a relation: a typed signal anchored to document tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "type")]
    pub signal_type: String,
    pub subtype: String,
    /// Id of the discourse unit or secondary edge this signal evidences.
    ///
    /// `None` when the reader could not attach the signal to anything.
    #[serde(default)]
    pub source: Option<String>,
    /// 1-based indices into the document-wide token sequence.
    #[serde(default)]
    pub tokens: Vec<usize>,
}

impl Signal {
    pub fn new(
        signal_type: impl Into<String>,
        subtype: impl Into<String>,
        source: Option<String>,
        tokens: Vec<usize>,
    ) -> Self {
        Self {
            signal_type: signal_type.into(),
            subtype: subtype.into(),
            source,
            tokens,
        }
    }

    /// Smallest evidencing token index, if the signal has any tokens.
    pub fn min_token(&self) -> Option<usize> {
        self.tokens.iter().copied().min()
    }
}
