//! Output annotation graph.
//!
//! The mapper writes through the [`GraphSink`] trait and never removes what
//! it added. [`AnnotationGraph`] is the in-memory sink; hosts with their own
//! graph store implement [`GraphSink`] for it instead.

use std::ops::Range;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

pub type NodeId = NodeIndex;
pub type EdgeId = EdgeIndex;

/// What a node in the output graph stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A token anchored to `span` of the primary text.
    Token { span: Range<usize> },
    /// A segment or group.
    Structure,
    /// A secondary (non-tree) edge, reified as a node.
    SecondaryEdge,
    /// A discourse signal.
    Signal,
}

/// Which mapping step created a dominance edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeLayer {
    /// Segment to one of its tokens.
    Token,
    /// Discourse tree relation, parent to child.
    Primary,
    /// Secondary-edge node to one of its endpoints.
    SecondaryEnd,
    /// Signal to an evidencing token.
    SignalToken,
    /// Signal to the unit (or secondary-edge endpoint) it signals.
    SignalTarget,
    /// Secondary-edge node to its representative signal.
    Representative,
}

/// A `namespace::key = value` annotation on a node or edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub namespace: Option<String>,
    pub key: String,
    pub value: String,
}

impl Annotation {
    pub fn new(namespace: Option<&str>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Upsert by `(namespace, key)`.
fn upsert(annotations: &mut Vec<Annotation>, annotation: Annotation) {
    match annotations
        .iter_mut()
        .find(|a| a.namespace == annotation.namespace && a.key == annotation.key)
    {
        Some(existing) => existing.value = annotation.value,
        None => annotations.push(annotation),
    }
}

fn lookup<'a>(annotations: &'a [Annotation], key: &str) -> Option<&'a str> {
    annotations
        .iter()
        .find(|a| a.key == key)
        .map(|a| a.value.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Source-document id for structures and secondary edges.
    pub name: Option<String>,
    annotations: Vec<Annotation>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            name: None,
            annotations: Vec::new(),
        }
    }

    pub fn named(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            annotations: Vec::new(),
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Value of the first annotation with `key`, in any namespace.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        lookup(&self.annotations, key)
    }

    pub fn set_annotation(&mut self, annotation: Annotation) {
        upsert(&mut self.annotations, annotation);
    }
}

/// A dominance edge. All edges the mapper creates are dominance edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub layer: EdgeLayer,
    /// Relation class (`rst`, `multinuc`, ...) for primary edges.
    pub edge_type: Option<String>,
    annotations: Vec<Annotation>,
}

impl Edge {
    pub fn new(layer: EdgeLayer) -> Self {
        Self {
            layer,
            edge_type: None,
            annotations: Vec::new(),
        }
    }

    pub fn with_type(mut self, edge_type: Option<String>) -> Self {
        self.edge_type = edge_type;
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        upsert(&mut self.annotations, annotation);
        self
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        lookup(&self.annotations, key)
    }

    pub fn set_annotation(&mut self, annotation: Annotation) {
        upsert(&mut self.annotations, annotation);
    }
}

/// A node or an edge, as the target of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Node(NodeId),
    Edge(EdgeId),
}

/// Write-only store the mapper builds the output graph in.
pub trait GraphSink {
    /// Replace the primary text the token spans point into.
    fn set_primary_text(&mut self, text: String);

    fn add_node(&mut self, node: Node) -> NodeId;

    fn add_edge(&mut self, source: NodeId, target: NodeId, edge: Edge) -> EdgeId;

    /// Add an annotation, replacing one with the same namespace and key.
    fn annotate(&mut self, element: ElementId, annotation: Annotation);
}

/// In-memory annotation graph backed by a petgraph `DiGraph`.
#[derive(Debug, Clone, Default)]
pub struct AnnotationGraph {
    graph: DiGraph<Node, Edge>,
    text: String,
    tokens: Vec<NodeId>,
}

impl GraphSink for AnnotationGraph {
    fn set_primary_text(&mut self, text: String) {
        self.text = text;
    }

    fn add_node(&mut self, node: Node) -> NodeId {
        let is_token = matches!(node.kind, NodeKind::Token { .. });
        let id = self.graph.add_node(node);
        if is_token {
            self.tokens.push(id);
        }
        id
    }

    fn add_edge(&mut self, source: NodeId, target: NodeId, edge: Edge) -> EdgeId {
        self.graph.add_edge(source, target, edge)
    }

    fn annotate(&mut self, element: ElementId, annotation: Annotation) {
        match element {
            ElementId::Node(id) => {
                if let Some(node) = self.graph.node_weight_mut(id) {
                    node.set_annotation(annotation);
                }
            }
            ElementId::Edge(id) => {
                if let Some(edge) = self.graph.edge_weight_mut(id) {
                    edge.set_annotation(annotation);
                }
            }
        }
    }
}

impl AnnotationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The primary text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.node_weight(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.graph.edge_weight(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Token nodes in text order.
    pub fn tokens(&self) -> &[NodeId] {
        &self.tokens
    }

    /// Text covered by a token node.
    pub fn token_text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Token { span } => self.text.get(span.clone()),
            _ => None,
        }
    }

    /// Nodes matching `predicate`, in creation order.
    pub fn nodes_where<'a>(&'a self, predicate: impl Fn(&Node) -> bool + 'a) -> impl Iterator<Item = NodeId> + 'a {
        self.graph
            .node_indices()
            .filter(move |&id| predicate(&self.graph[id]))
    }

    pub fn structures(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes_where(|n| n.kind == NodeKind::Structure)
    }

    pub fn signals(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes_where(|n| n.kind == NodeKind::Signal)
    }

    /// Structural node created for source id `name`.
    pub fn structure(&self, name: &str) -> Option<NodeId> {
        self.find_named(NodeKind::Structure, name)
    }

    /// Node reifying the secondary edge with source id `name`.
    pub fn secondary_edge(&self, name: &str) -> Option<NodeId> {
        self.find_named(NodeKind::SecondaryEdge, name)
    }

    fn find_named(&self, kind: NodeKind, name: &str) -> Option<NodeId> {
        self.graph.node_indices().find(|&id| {
            let node = &self.graph[id];
            node.kind == kind && node.name.as_deref() == Some(name)
        })
    }

    pub fn edge_endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.graph.edge_endpoints(id)
    }

    /// Edges from `source` to `target`, in creation order.
    pub fn edges_between(&self, source: NodeId, target: NodeId) -> Vec<EdgeId> {
        let mut edges: Vec<EdgeId> = self
            .graph
            .edges_connecting(source, target)
            .map(|e| e.id())
            .collect();
        edges.sort();
        edges
    }

    /// Outgoing `(edge, target)` pairs of `node`, in creation order.
    pub fn out_edges(&self, node: NodeId) -> Vec<(EdgeId, NodeId)> {
        let mut edges: Vec<(EdgeId, NodeId)> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        edges.sort();
        edges
    }

    /// Incoming `(edge, source)` pairs of `node`, in creation order.
    pub fn in_edges(&self, node: NodeId) -> Vec<(EdgeId, NodeId)> {
        let mut edges: Vec<(EdgeId, NodeId)> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.id(), e.source()))
            .collect();
        edges.sort();
        edges
    }

    /// All edges created by one mapping step, in creation order.
    pub fn edges_in_layer(&self, layer: EdgeLayer) -> impl Iterator<Item = EdgeId> + '_ {
        self.graph
            .edge_indices()
            .filter(move |&id| self.graph[id].layer == layer)
    }

    pub fn node_annotation(&self, id: NodeId, key: &str) -> Option<&str> {
        self.node(id)?.annotation(key)
    }

    pub fn edge_annotation(&self, id: EdgeId, key: &str) -> Option<&str> {
        self.edge(id)?.annotation(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_tracked_in_order() {
        let mut graph = AnnotationGraph::new();
        graph.set_primary_text("ab cd".to_string());
        let seg = graph.add_node(Node::named(NodeKind::Structure, "seg1"));
        let t1 = graph.add_node(Node::new(NodeKind::Token { span: 0..2 }));
        let t2 = graph.add_node(Node::new(NodeKind::Token { span: 3..5 }));
        graph.add_edge(seg, t1, Edge::new(EdgeLayer::Token));
        graph.add_edge(seg, t2, Edge::new(EdgeLayer::Token));

        assert_eq!(graph.tokens(), &[t1, t2]);
        assert_eq!(graph.token_text(t2), Some("cd"));
        assert_eq!(graph.token_text(seg), None);
        assert_eq!(graph.structure("seg1"), Some(seg));
        assert_eq!(graph.structure("seg2"), None);
        assert_eq!(
            graph.out_edges(seg).into_iter().map(|(_, t)| t).collect::<Vec<_>>(),
            vec![t1, t2]
        );
        assert_eq!(graph.edges_in_layer(EdgeLayer::Token).count(), 2);
    }

    #[test]
    fn test_annotations_upsert_per_namespace() {
        let mut graph = AnnotationGraph::new();
        let node = graph.add_node(Node::named(NodeKind::Structure, "grp1"));
        graph.annotate(ElementId::Node(node), Annotation::new(None, "kind", "group"));
        graph.annotate(ElementId::Node(node), Annotation::new(None, "kind", "segment"));
        graph.annotate(ElementId::Node(node), Annotation::new(Some("rst"), "kind", "other"));

        let annotations = graph.node(node).unwrap().annotations();
        assert_eq!(annotations.len(), 2);
        assert_eq!(graph.node_annotation(node, "kind"), Some("segment"));
    }

    #[test]
    fn test_edge_annotations_and_type() {
        let mut graph = AnnotationGraph::new();
        let a = graph.add_node(Node::named(NodeKind::Structure, "a"));
        let b = graph.add_node(Node::named(NodeKind::Structure, "b"));
        let edge = graph.add_edge(
            a,
            b,
            Edge::new(EdgeLayer::Primary)
                .with_type(Some("rst".to_string()))
                .with_annotation(Annotation::new(None, "relname", "elaboration")),
        );
        graph.annotate(ElementId::Edge(edge), Annotation::new(None, "is_signaled", "false"));

        assert_eq!(graph.edges_between(a, b), vec![edge]);
        assert!(graph.edges_between(b, a).is_empty());
        assert_eq!(graph.edge(edge).unwrap().edge_type.as_deref(), Some("rst"));
        assert_eq!(graph.edge_annotation(edge, "relname"), Some("elaboration"));
        assert_eq!(graph.edge_annotation(edge, "is_signaled"), Some("false"));
        assert_eq!(graph.edge_endpoints(edge), Some((a, b)));
        assert_eq!(graph.in_edges(b), vec![(edge, a)]);
    }
}
