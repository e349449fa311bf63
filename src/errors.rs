//! Error types for the mapping engine.
//!
//! Every mapping failure is fatal for the document being mapped. The
//! orchestrator wraps the phase error in a [`DocumentMappingError`] so the
//! host knows which document failed.

use std::fmt;

use thiserror::Error;

/// Which end of a relation or secondary edge failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Parent,
    Child,
    Source,
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Endpoint::Parent => "parent",
            Endpoint::Child => "child",
            Endpoint::Source => "source",
            Endpoint::Target => "target",
        })
    }
}

/// Mapping phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Text,
    Structure,
    Relations,
    SecondaryEdges,
    Signals,
    PostPass,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Text => "text",
            Phase::Structure => "structure",
            Phase::Relations => "relations",
            Phase::SecondaryEdges => "secondary edges",
            Phase::Signals => "signals",
            Phase::PostPass => "post-pass",
        })
    }
}

/// Failure of a tokenizer call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenizeError {
    /// The tokenizer returned a span that violates the token contract.
    #[error("invalid token span {start}..{end} in segment span {span_start}..{span_end}: {reason}")]
    InvalidSpan {
        start: usize,
        end: usize,
        span_start: usize,
        span_end: usize,
        reason: &'static str,
    },

    /// The requested span is not a valid slice of the text.
    #[error("span {start}..{end} is not a char-aligned slice of a {len}-byte text")]
    OutOfBounds { start: usize, end: usize, len: usize },

    /// Failure reported by a tokenizer backend.
    #[error("tokenizer backend failed: {0}")]
    Backend(String),
}

/// Failure of an Identifier Resolver lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unresolved reference '{id}' ({context})")]
pub struct UnresolvedReference {
    pub id: String,
    /// What referenced the id, e.g. `relation grp1 -> seg3`.
    pub context: String,
}

/// Fatal mapping errors, one per failure kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("duplicate structural id '{id}'")]
    DuplicateStructuralId { id: String },

    #[error("relation {parent} -> {child}: {endpoint} '{}' does not exist", .reference.id)]
    DanglingRelationEndpoint {
        parent: String,
        child: String,
        endpoint: Endpoint,
        #[source]
        reference: UnresolvedReference,
    },

    #[error("secondary edge '{edge}': {endpoint} '{}' does not exist", .reference.id)]
    DanglingSecondaryEdgeEndpoint {
        edge: String,
        endpoint: Endpoint,
        #[source]
        reference: UnresolvedReference,
    },

    #[error("signal #{signal} has no source")]
    MissingSignalSource { signal: usize },

    #[error(
        "signal #{signal}: source '{}' is neither a discourse unit nor a secondary edge",
        .reference.id
    )]
    UnresolvedSignalSource {
        signal: usize,
        #[source]
        reference: UnresolvedReference,
    },

    #[error("signal #{signal}: token {token} is out of range (document has {token_count} tokens)")]
    SignalTokenOutOfRange {
        signal: usize,
        token: usize,
        token_count: usize,
    },

    #[error("tokenization of segment '{segment}' failed")]
    TokenizationFailed {
        segment: String,
        #[source]
        cause: TokenizeError,
    },

    #[error("'{child}' is governed by both '{first_parent}' and '{second_parent}'")]
    MultipleGoverningRelations {
        child: String,
        first_parent: String,
        second_parent: String,
    },

    #[error("mapping cancelled before the {phase} phase")]
    Cancelled { phase: Phase },
}

/// A [`MappingError`] together with the document it aborted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to map document '{document}': {error}")]
pub struct DocumentMappingError {
    pub document: String,
    #[source]
    pub error: MappingError,
}

/// Result type for phase operations.
pub type MappingResult<T> = Result<T, MappingError>;
