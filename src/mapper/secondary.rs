//! Secondary edges, reified as nodes pointing at both endpoints.
//!
//! Each edge registers its own id before the next one is mapped, so an edge
//! may use an earlier secondary edge as an endpoint.

use layered_rst_document::{RstDocument, SecondaryEdge};
use tracing::debug;

use super::{MappingContext, SecondaryEnds, END_KEY};
use crate::errors::{Endpoint, MappingError, MappingResult};
use crate::graph::{Edge, EdgeLayer, GraphSink, Node, NodeId, NodeKind};
use crate::resolver::BindingKind;

pub(crate) fn map_secondary_edges<G: GraphSink>(
    ctx: &mut MappingContext<'_, G>,
    document: &RstDocument,
) -> MappingResult<()> {
    for edge in &document.secondary_edges {
        map_secondary_edge(ctx, edge)?;
    }
    ctx.stats.secondary_edges = ctx.secondary.len();
    debug!(secondary_edges = ctx.secondary.len(), "mapped secondary edges");
    Ok(())
}

fn map_secondary_edge<G: GraphSink>(ctx: &mut MappingContext<'_, G>, edge: &SecondaryEdge) -> MappingResult<()> {
    let source = resolve_endpoint(ctx, edge, Endpoint::Source)?;
    let target = resolve_endpoint(ctx, edge, Endpoint::Target)?;
    if ctx.resolver.is_bound(&edge.id) {
        return Err(MappingError::DuplicateStructuralId { id: edge.id.clone() });
    }

    let node = ctx.graph.add_node(Node::named(NodeKind::SecondaryEdge, edge.id.as_str()));
    let relname_key = ctx.config.relation_name_annotation_name.clone();
    ctx.annotate_node(node, &relname_key, edge.relation_name.as_str());

    for (endpoint, end) in [(source, "source"), (target, "target")] {
        let end_edge = Edge::new(EdgeLayer::SecondaryEnd).with_annotation(ctx.annotation(END_KEY, end));
        ctx.graph.add_edge(node, endpoint, end_edge);
    }

    let slot = ctx.secondary.len();
    ctx.resolver
        .register(&edge.id, node, BindingKind::SecondaryEdge(slot))
        .map_err(|_| MappingError::DuplicateStructuralId { id: edge.id.clone() })?;
    ctx.secondary.push(SecondaryEnds {
        id: edge.id.clone(),
        node,
        source,
        target,
        relation_name: edge.relation_name.clone(),
    });
    Ok(())
}

fn resolve_endpoint<G: GraphSink>(
    ctx: &MappingContext<'_, G>,
    edge: &SecondaryEdge,
    endpoint: Endpoint,
) -> MappingResult<NodeId> {
    let id = match endpoint {
        Endpoint::Source => &edge.source,
        _ => &edge.target,
    };
    ctx.resolver
        .resolve(id, || format!("secondary edge {}", edge.id))
        .map(|binding| binding.node)
        .map_err(|reference| MappingError::DanglingSecondaryEdgeEndpoint {
            edge: edge.id.clone(),
            endpoint,
            reference,
        })
}
