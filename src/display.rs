use std::collections::HashMap;
use std::fmt::{self, Write};

use unicode_width::UnicodeWidthStr;

use crate::graph::{AnnotationGraph, EdgeLayer, NodeId, NodeKind};
use crate::mapper::{IS_SIGNALED_KEY, SIGNAL_INDICES_KEY, SIGNAL_SUBTYPE_KEY, SIGNAL_TEXT_KEY, SIGNAL_TYPE_KEY};

/// Plain-text rendering of a mapped graph.
//
// Is  this  example  more  complicated  ...  ?
// ╰──────────────╯seg1
//                    ╰─────────────────────╯seg2
// grp1 ─span─> seg1
// sec1: seg1 ═cause═> seg2
// signal dm/and [4] "more" ─> seg1, seg2 (represents sec1)
pub struct GraphDisplay<'a> {
    graph: &'a AnnotationGraph,
    relation_name_key: String,
    show_annotations: bool,
}

impl<'a> GraphDisplay<'a> {
    pub fn new(graph: &'a AnnotationGraph) -> Self {
        GraphDisplay {
            graph,
            relation_name_key: "relname".to_string(),
            show_annotations: false,
        }
    }

    /// Read relation names from `key` instead of `relname`.
    pub fn with_relation_name_key(mut self, key: impl Into<String>) -> Self {
        self.relation_name_key = key.into();
        self
    }

    /// Append each segment's annotations after its label.
    pub fn with_annotations(mut self) -> Self {
        self.show_annotations = true;
        self
    }

    fn name(&self, node: NodeId) -> &str {
        self.graph
            .node(node)
            .and_then(|n| n.name.as_deref())
            .unwrap_or("?")
    }

    fn arrow(relation_name: Option<&str>) -> String {
        match relation_name {
            Some(name) => format!("─{}─>", name),
            None => "──>".to_string(),
        }
    }

    fn write_underline(&self, f: &mut fmt::Formatter<'_>, start: usize, end: usize) -> fmt::Result {
        for _ in 0..start {
            f.write_char(' ')?;
        }
        f.write_char('╰')?;
        for _ in (start + 1)..end.saturating_sub(1) {
            f.write_char('─')?;
        }
        if end - start > 1 {
            f.write_char('╯')?;
        }
        Ok(())
    }
}

impl<'a> fmt::Display for GraphDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SPACE_PADDING: usize = 2;
        let graph = self.graph;

        let mut token_columns = Vec::new();
        let mut token_index = HashMap::new();
        let mut opening_line = String::new();
        for (idx, &token) in graph.tokens().iter().enumerate() {
            if idx > 0 {
                opening_line.extend(std::iter::repeat(' ').take(SPACE_PADDING));
            }
            let start = UnicodeWidthStr::width(&*opening_line);
            opening_line.push_str(graph.token_text(token).unwrap_or(""));
            token_columns.push((start, UnicodeWidthStr::width(&*opening_line)));
            token_index.insert(token, idx);
        }
        f.write_str(&opening_line)?;

        for unit in graph.structures() {
            let covered: Vec<usize> = graph
                .out_edges(unit)
                .into_iter()
                .filter(|(edge, _)| graph.edge(*edge).map(|e| e.layer) == Some(EdgeLayer::Token))
                .filter_map(|(_, token)| token_index.get(&token).copied())
                .collect();
            let (Some(&first), Some(&last)) = (covered.first(), covered.last()) else {
                continue;
            };

            f.write_char('\n')?;
            self.write_underline(f, token_columns[first].0, token_columns[last].1)?;
            f.write_str(self.name(unit))?;
            if self.show_annotations {
                if let Some(node) = graph.node(unit) {
                    let pairs: Vec<String> = node
                        .annotations()
                        .iter()
                        .map(|a| format!("{}={}", a.key, a.value))
                        .collect();
                    write!(f, " {{{}}}", pairs.join(", "))?;
                }
            }
        }

        for edge in graph.edges_in_layer(EdgeLayer::Primary) {
            let Some((parent, child)) = graph.edge_endpoints(edge) else {
                continue;
            };
            let arrow = Self::arrow(graph.edge_annotation(edge, &self.relation_name_key));
            write!(f, "\n{} {} {}", self.name(parent), arrow, self.name(child))?;
            if graph.edge_annotation(edge, IS_SIGNALED_KEY) == Some("true") {
                f.write_str(" (signaled)")?;
            }
        }

        for node in graph.nodes_where(|n| n.kind == NodeKind::SecondaryEdge) {
            let ends: Vec<NodeId> = graph
                .out_edges(node)
                .into_iter()
                .filter(|(edge, _)| graph.edge(*edge).map(|e| e.layer) == Some(EdgeLayer::SecondaryEnd))
                .map(|(_, end)| end)
                .collect();
            if let [source, target] = ends[..] {
                let relname = graph.node_annotation(node, &self.relation_name_key).unwrap_or("?");
                write!(
                    f,
                    "\n{}: {} ═{}═> {}",
                    self.name(node),
                    self.name(source),
                    relname,
                    self.name(target)
                )?;
            }
        }

        for signal in graph.signals() {
            let annotation = |key: &str| graph.node_annotation(signal, key).unwrap_or("");
            let targets: Vec<&str> = graph
                .out_edges(signal)
                .into_iter()
                .filter(|(edge, _)| graph.edge(*edge).map(|e| e.layer) == Some(EdgeLayer::SignalTarget))
                .map(|(_, target)| self.name(target))
                .collect();
            write!(
                f,
                "\nsignal {}/{} [{}] {:?} ─> {}",
                annotation(SIGNAL_TYPE_KEY),
                annotation(SIGNAL_SUBTYPE_KEY),
                annotation(SIGNAL_INDICES_KEY),
                annotation(SIGNAL_TEXT_KEY),
                targets.join(", ")
            )?;
            for (edge, owner) in graph.in_edges(signal) {
                if graph.edge(edge).map(|e| e.layer) == Some(EdgeLayer::Representative) {
                    write!(f, " (represents {})", self.name(owner))?;
                }
            }
        }

        Ok(())
    }
}
