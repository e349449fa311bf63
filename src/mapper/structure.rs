//! Segment and group nodes.

use std::ops::Range;

use layered_rst_document::RstDocument;
use tracing::debug;

use super::{MappingContext, GROUP_KIND, SEGMENT_KIND};
use crate::errors::{MappingError, MappingResult};
use crate::graph::{Edge, EdgeLayer, GraphSink, Node, NodeId, NodeKind};
use crate::resolver::BindingKind;

/// Create every segment (with its tokens) and then every group.
pub(crate) fn map_structures<G: GraphSink>(
    ctx: &mut MappingContext<'_, G>,
    document: &RstDocument,
) -> MappingResult<()> {
    for (index, segment) in document.segments.iter().enumerate() {
        let node = create_unit(ctx, &segment.id, SEGMENT_KIND, segment.segment_type.as_deref())?;
        let spans: Vec<Range<usize>> = match ctx.text.segments.get(index) {
            Some(span) => ctx.text.tokens[span.tokens.clone()].to_vec(),
            None => Vec::new(),
        };
        for span in spans {
            let token_node = ctx.graph.add_node(Node::new(NodeKind::Token { span }));
            ctx.graph.add_edge(node, token_node, Edge::new(EdgeLayer::Token));
            ctx.tokens.push(token_node);
        }
    }

    for group in &document.groups {
        create_unit(ctx, &group.id, GROUP_KIND, group.group_type.as_deref())?;
    }

    ctx.stats.tokens = ctx.tokens.len();
    debug!(
        segments = document.segments.len(),
        groups = document.groups.len(),
        tokens = ctx.tokens.len(),
        "mapped structural nodes"
    );
    Ok(())
}

fn create_unit<G: GraphSink>(
    ctx: &mut MappingContext<'_, G>,
    id: &str,
    kind: &str,
    unit_type: Option<&str>,
) -> MappingResult<NodeId> {
    if ctx.resolver.is_bound(id) {
        return Err(MappingError::DuplicateStructuralId { id: id.to_string() });
    }

    let node = ctx.graph.add_node(Node::named(NodeKind::Structure, id));
    let kind_key = ctx.config.node_kind_annotation_name.clone();
    ctx.annotate_node(node, &kind_key, kind);
    if let Some(unit_type) = unit_type {
        let type_key = ctx.config.node_type_annotation_name.clone();
        ctx.annotate_node(node, &type_key, unit_type);
    }

    ctx.resolver
        .register(id, node, BindingKind::Structure)
        .map_err(|_| MappingError::DuplicateStructuralId { id: id.to_string() })?;
    ctx.stats.structures += 1;
    Ok(node)
}
