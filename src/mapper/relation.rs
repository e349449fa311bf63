//! Primary relations: the discourse tree.

use layered_rst_document::{Relation, RstDocument};
use tracing::debug;

use super::{GoverningEdge, MappingContext};
use crate::errors::{Endpoint, MappingError, MappingResult};
use crate::graph::{Edge, EdgeLayer, GraphSink, NodeId};

pub(crate) fn map_relations<G: GraphSink>(
    ctx: &mut MappingContext<'_, G>,
    document: &RstDocument,
) -> MappingResult<()> {
    for relation in &document.relations {
        map_relation(ctx, document, relation)?;
    }
    ctx.stats.relations = ctx.primary_edges.len();
    debug!(relations = ctx.primary_edges.len(), "mapped primary relations");
    Ok(())
}

fn map_relation<G: GraphSink>(
    ctx: &mut MappingContext<'_, G>,
    document: &RstDocument,
    relation: &Relation,
) -> MappingResult<()> {
    let parent = resolve_endpoint(ctx, relation, Endpoint::Parent)?;
    let child = resolve_endpoint(ctx, relation, Endpoint::Child)?;

    if let Some(existing) = ctx.governing.get(&relation.child) {
        return Err(MappingError::MultipleGoverningRelations {
            child: relation.child.clone(),
            first_parent: existing.parent.clone(),
            second_parent: relation.parent.clone(),
        });
    }

    let relation_type = document.relation_type_of(relation).map(str::to_string);
    let mut edge = Edge::new(EdgeLayer::Primary).with_type(relation_type);
    if let Some(name) = &relation.name {
        edge = edge.with_annotation(ctx.annotation(&ctx.config.relation_name_annotation_name, name.as_str()));
    }
    let edge = ctx.graph.add_edge(parent, child, edge);

    ctx.primary_edges.push(edge);
    ctx.governing.insert(
        relation.child.clone(),
        GoverningEdge {
            edge,
            parent: relation.parent.clone(),
            name: relation.name.clone(),
        },
    );
    Ok(())
}

fn resolve_endpoint<G: GraphSink>(
    ctx: &MappingContext<'_, G>,
    relation: &Relation,
    endpoint: Endpoint,
) -> MappingResult<NodeId> {
    let id = match endpoint {
        Endpoint::Parent => &relation.parent,
        _ => &relation.child,
    };
    ctx.resolver
        .resolve(id, || format!("relation {} -> {}", relation.parent, relation.child))
        .map(|binding| binding.node)
        .map_err(|reference| MappingError::DanglingRelationEndpoint {
            parent: relation.parent.clone(),
            child: relation.child.clone(),
            endpoint,
            reference,
        })
}

#[cfg(test)]
mod tests {
    use crate::errors::{Endpoint, UnresolvedReference};
    use crate::graph::EdgeLayer;
    use crate::{DocumentMapper, MappingError};
    use layered_rst_document::RstDocument;

    fn two_segments() -> RstDocument {
        let mut doc = RstDocument::new("rel");
        doc.add_segment("seg1", "First part.");
        doc.add_segment("seg2", "Second part.");
        doc
    }

    #[test]
    fn test_relation_type_and_name() {
        let mut doc = two_segments();
        doc.add_relation("seg1", "seg2").set_name("elaboration").set_type("rst");

        let mapped = DocumentMapper::default().map(&doc).unwrap();
        let graph = &mapped.graph;
        let seg1 = graph.structure("seg1").unwrap();
        let seg2 = graph.structure("seg2").unwrap();
        let edges = graph.edges_between(seg1, seg2);

        assert_eq!(edges.len(), 1);
        let edge = graph.edge(edges[0]).unwrap();
        assert_eq!(edge.layer, EdgeLayer::Primary);
        assert_eq!(edge.edge_type.as_deref(), Some("rst"));
        assert_eq!(edge.annotation("relname"), Some("elaboration"));
        assert_eq!(mapped.stats.relations, 1);
    }

    #[test]
    fn test_missing_type_comes_from_header() {
        let mut doc = two_segments();
        doc.relation_types
            .insert("elaboration".to_string(), "rst".to_string());
        doc.add_group("grp1");
        doc.add_relation("seg1", "seg2").set_name("elaboration");
        doc.add_relation("grp1", "seg1").set_name("elaboration").set_type("multinuc");

        let mapped = DocumentMapper::default().map(&doc).unwrap();
        let types: Vec<Option<&str>> = mapped
            .graph
            .edges_in_layer(EdgeLayer::Primary)
            .map(|edge| mapped.graph.edge(edge).unwrap().edge_type.as_deref())
            .collect();
        assert_eq!(types, vec![Some("rst"), Some("multinuc")]);
    }

    #[test]
    fn test_relation_without_name_has_no_relname() {
        let mut doc = two_segments();
        doc.add_relation("seg1", "seg2");

        let mapped = DocumentMapper::default().map(&doc).unwrap();
        let edge = mapped.graph.edges_in_layer(EdgeLayer::Primary).next().unwrap();
        assert_eq!(mapped.graph.edge_annotation(edge, "relname"), None);
        assert_eq!(mapped.graph.edge(edge).unwrap().edge_type, None);
    }

    #[test]
    fn test_dangling_parent_and_child() {
        let mut doc = two_segments();
        doc.add_relation("grp9", "seg2");
        let err = DocumentMapper::default().map(&doc).unwrap_err();
        assert_eq!(
            err.error,
            MappingError::DanglingRelationEndpoint {
                parent: "grp9".into(),
                child: "seg2".into(),
                endpoint: Endpoint::Parent,
                reference: UnresolvedReference {
                    id: "grp9".into(),
                    context: "relation grp9 -> seg2".into(),
                },
            }
        );

        let mut doc = two_segments();
        doc.add_relation("seg1", "seg7");
        let err = DocumentMapper::default().map(&doc).unwrap_err();
        assert!(matches!(
            err.error,
            MappingError::DanglingRelationEndpoint { endpoint: Endpoint::Child, ref reference, .. } if reference.id == "seg7"
        ));
    }

    #[test]
    fn test_second_parent_is_rejected() {
        let mut doc = two_segments();
        doc.add_group("grp1");
        doc.add_relation("grp1", "seg2");
        doc.add_relation("seg1", "seg2");

        let err = DocumentMapper::default().map(&doc).unwrap_err();
        assert_eq!(
            err.error,
            MappingError::MultipleGoverningRelations {
                child: "seg2".into(),
                first_parent: "grp1".into(),
                second_parent: "seg1".into(),
            }
        );
    }
}
