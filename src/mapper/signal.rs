//! Discourse signals and representative-signal selection.

use std::collections::HashSet;

use layered_rst_document::{RstDocument, Signal};
use tracing::{debug, trace};

use super::{
    Candidate, MappingContext, MappingWarning, IS_SIGNALED_KEY, SIGNAL_INDICES_KEY, SIGNAL_SUBTYPE_KEY,
    SIGNAL_TEXT_KEY, SIGNAL_TYPE_KEY,
};
use crate::errors::{MappingError, MappingResult};
use crate::graph::{Edge, EdgeLayer, GraphSink, Node, NodeId, NodeKind};
use crate::resolver::{Binding, BindingKind};

pub(crate) fn map_signals<G: GraphSink>(ctx: &mut MappingContext<'_, G>, document: &RstDocument) -> MappingResult<()> {
    for (index, signal) in document.signals.iter().enumerate() {
        map_signal(ctx, index, signal)?;
    }

    for (index, signal) in document.undeclared_signals() {
        ctx.warn(MappingWarning::UndeclaredSignalType {
            signal: index,
            signal_type: signal.signal_type.clone(),
            subtype: signal.subtype.clone(),
        });
    }

    ctx.stats.signals = document.signals.len();
    debug!(
        signals = document.signals.len(),
        signaled_edges = ctx.signaled_edges.len(),
        "mapped signals"
    );
    Ok(())
}

fn map_signal<G: GraphSink>(ctx: &mut MappingContext<'_, G>, index: usize, signal: &Signal) -> MappingResult<()> {
    let source_id = signal
        .source
        .as_deref()
        .ok_or(MappingError::MissingSignalSource { signal: index })?;
    let binding = ctx
        .resolver
        .resolve(source_id, || format!("signal #{}", index))
        .map_err(|reference| MappingError::UnresolvedSignalSource {
            signal: index,
            reference,
        })?;
    let tokens = resolve_tokens(ctx, index, signal)?;

    let node = ctx.graph.add_node(Node::new(NodeKind::Signal));
    ctx.annotate_node(node, SIGNAL_TYPE_KEY, signal.signal_type.as_str());
    ctx.annotate_node(node, SIGNAL_SUBTYPE_KEY, signal.subtype.as_str());
    let text = evidence_text(ctx, &tokens);
    ctx.annotate_node(node, SIGNAL_TEXT_KEY, text);
    let indices = signal
        .tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(",");
    ctx.annotate_node(node, SIGNAL_INDICES_KEY, indices);

    let mut seen = HashSet::new();
    for token in tokens {
        if seen.insert(token) {
            let token_node = ctx.tokens[token];
            ctx.graph.add_edge(node, token_node, Edge::new(EdgeLayer::SignalToken));
        }
    }

    match binding {
        Binding {
            node: unit,
            kind: BindingKind::Structure,
        } => attach_to_unit(ctx, node, unit, source_id),
        Binding {
            kind: BindingKind::SecondaryEdge(slot),
            ..
        } => attach_to_secondary_edge(ctx, node, slot, signal),
    }
    Ok(())
}

/// Map 1-based token indices to 0-based ones, in listed order.
fn resolve_tokens<G: GraphSink>(
    ctx: &MappingContext<'_, G>,
    index: usize,
    signal: &Signal,
) -> MappingResult<Vec<usize>> {
    let token_count = ctx.tokens.len();
    signal
        .tokens
        .iter()
        .map(|&token| {
            token
                .checked_sub(1)
                .filter(|&i| i < token_count)
                .ok_or(MappingError::SignalTokenOutOfRange {
                    signal: index,
                    token,
                    token_count,
                })
        })
        .collect()
}

fn evidence_text<G: GraphSink>(ctx: &MappingContext<'_, G>, tokens: &[usize]) -> String {
    tokens
        .iter()
        .filter_map(|&i| ctx.text.token_text(i))
        .collect::<Vec<_>>()
        .join(" ")
}

fn attach_to_unit<G: GraphSink>(ctx: &mut MappingContext<'_, G>, signal: NodeId, unit: NodeId, unit_id: &str) {
    ctx.graph.add_edge(signal, unit, Edge::new(EdgeLayer::SignalTarget));

    let Some(governing) = ctx.governing.get(unit_id).cloned() else {
        return;
    };
    if let Some(name) = governing.name {
        let relname_key = ctx.config.relation_name_annotation_name.clone();
        ctx.annotate_edge(governing.edge, &relname_key, name.as_str());
        ctx.annotate_node(signal, &relname_key, name);
    }
    ctx.signaled_edges.insert(governing.edge);
}

fn attach_to_secondary_edge<G: GraphSink>(
    ctx: &mut MappingContext<'_, G>,
    signal: NodeId,
    slot: usize,
    source: &Signal,
) {
    let ends = ctx.secondary[slot].clone();

    ctx.graph.add_edge(signal, ends.source, Edge::new(EdgeLayer::SignalTarget));
    ctx.graph.add_edge(signal, ends.target, Edge::new(EdgeLayer::SignalTarget));

    let relname_key = ctx.config.relation_name_annotation_name.clone();
    ctx.annotate_node(ends.node, &relname_key, ends.relation_name.as_str());
    ctx.annotate_node(signal, &relname_key, ends.relation_name);

    ctx.candidates.entry(slot).or_default().push(Candidate {
        signal,
        min_token: source.min_token(),
    });
}

/// Lowest minimum token index wins; on a tie the first registered wins.
/// Candidates without tokens lose to any candidate with tokens.
fn pick_representative(candidates: &[Candidate]) -> Option<Candidate> {
    let rank = |c: &Candidate| match c.min_token {
        Some(min) => (0, min),
        None => (1, 0),
    };
    candidates.iter().copied().fold(None, |best, candidate| match best {
        Some(best) if rank(&best) <= rank(&candidate) => Some(best),
        _ => Some(candidate),
    })
}

/// Point every signaled secondary edge at its representative signal.
pub(crate) fn select_representatives<G: GraphSink>(ctx: &mut MappingContext<'_, G>) {
    for slot in 0..ctx.secondary.len() {
        let edge_node = ctx.secondary[slot].node;
        let winner = ctx
            .candidates
            .get(&slot)
            .and_then(|candidates| pick_representative(candidates));

        match winner {
            Some(winner) => {
                trace!(
                    edge = %ctx.secondary[slot].id,
                    candidates = ctx.candidates.get(&slot).map_or(0, Vec::len),
                    min_token = ?winner.min_token,
                    "selected representative signal"
                );
                ctx.graph
                    .add_edge(edge_node, winner.signal, Edge::new(EdgeLayer::Representative));
                ctx.stats.representatives += 1;
            }
            None => {
                let edge = ctx.secondary[slot].id.clone();
                ctx.warn(MappingWarning::UnsignaledSecondaryEdge { edge });
            }
        }
    }
}

/// Tag every primary edge with whether any signal evidences it.
pub(crate) fn mark_signaled_edges<G: GraphSink>(ctx: &mut MappingContext<'_, G>) {
    for edge in ctx.primary_edges.clone() {
        let signaled = ctx.signaled_edges.contains(&edge);
        ctx.annotate_edge(edge, IS_SIGNALED_KEY, signaled.to_string());
    }
}
