//! Document mapping: from an [`RstDocument`] to an annotation graph.
//!
//! Phases run in a fixed order, each reading only what earlier phases
//! wrote:
//!
//! 1. text: primary text and token spans
//! 2. structure: segment and group nodes, segment-to-token edges
//! 3. relations: primary tree edges
//! 4. secondary edges
//! 5. signals, then the representative signal of each secondary edge
//! 6. post-pass: `is_signaled` on primary edges
//!
//! The graph is built in a sink owned by the pass and handed out only when
//! every phase succeeded.

mod relation;
mod secondary;
mod signal;
mod structure;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use layered_rst_document::RstDocument;
use tracing::{debug, warn};

use crate::config::MapperConfig;
use crate::errors::{DocumentMappingError, MappingError, MappingResult, Phase};
use crate::graph::{Annotation, AnnotationGraph, EdgeId, ElementId, GraphSink, NodeId};
use crate::resolver::IdResolver;
use crate::text::{PrimaryText, TextBuilder};
use crate::tokenizer::{SeparatorTokenizer, Tokenizer, UnicodeWordTokenizer};

/// Value of the node-kind annotation on segments.
pub const SEGMENT_KIND: &str = "segment";
/// Value of the node-kind annotation on groups.
pub const GROUP_KIND: &str = "group";

/// Annotation on secondary-edge endpoint edges: `source` or `target`.
pub const END_KEY: &str = "end";
pub const SIGNAL_TYPE_KEY: &str = "signal_type";
pub const SIGNAL_SUBTYPE_KEY: &str = "signal_subtype";
/// Space-joined text of the evidencing tokens.
pub const SIGNAL_TEXT_KEY: &str = "signal_text";
/// Comma-joined 1-based evidencing token indices.
pub const SIGNAL_INDICES_KEY: &str = "signal_indices";
/// `true` or `false` on primary edges after the post-pass.
pub const IS_SIGNALED_KEY: &str = "is_signaled";

/// Non-fatal findings of a mapping pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingWarning {
    /// A secondary edge no signal points at; it gets no representative.
    UnsignaledSecondaryEdge { edge: String },
    /// A signal whose type or subtype is missing from the document's
    /// declared signal vocabulary.
    UndeclaredSignalType {
        signal: usize,
        signal_type: String,
        subtype: String,
    },
}

impl fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingWarning::UnsignaledSecondaryEdge { edge } => {
                write!(f, "secondary edge '{}' has no signal", edge)
            }
            MappingWarning::UndeclaredSignalType {
                signal,
                signal_type,
                subtype,
            } => write!(
                f,
                "signal #{} uses undeclared type {}/{}",
                signal, signal_type, subtype
            ),
        }
    }
}

/// Counts of what a pass created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingStats {
    pub tokens: usize,
    pub structures: usize,
    pub relations: usize,
    pub secondary_edges: usize,
    pub signals: usize,
    /// Secondary edges that received a representative signal.
    pub representatives: usize,
}

/// Result of a successful pass.
#[derive(Debug)]
pub struct MappedDocument<G = AnnotationGraph> {
    pub document: String,
    pub graph: G,
    pub warnings: Vec<MappingWarning>,
    pub stats: MappingStats,
}

/// The primary edge governing a discourse unit.
#[derive(Debug, Clone)]
pub(crate) struct GoverningEdge {
    pub edge: EdgeId,
    pub parent: String,
    pub name: Option<String>,
}

/// Endpoints of a reified secondary edge.
#[derive(Debug, Clone)]
pub(crate) struct SecondaryEnds {
    pub id: String,
    pub node: NodeId,
    pub source: NodeId,
    pub target: NodeId,
    pub relation_name: String,
}

/// A signal competing to represent a secondary edge.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub signal: NodeId,
    /// Smallest 1-based evidencing token index. `None` sorts last.
    pub min_token: Option<usize>,
}

/// Document-scoped state shared by the phases.
///
/// Nothing here outlives one pass, so concurrent passes share no mutable
/// state.
pub(crate) struct MappingContext<'a, G> {
    pub config: &'a MapperConfig,
    pub graph: G,
    pub resolver: IdResolver,
    /// Primary text and token spans, filled by the text phase.
    pub text: PrimaryText,
    /// Token nodes by 0-based token index.
    pub tokens: Vec<NodeId>,
    /// Child id to the primary edge that governs it.
    pub governing: HashMap<String, GoverningEdge>,
    /// Primary edges in creation order.
    pub primary_edges: Vec<EdgeId>,
    /// Secondary-edge nodes in creation order.
    pub secondary: Vec<SecondaryEnds>,
    /// Candidates per entry of `secondary`, in registration order.
    pub candidates: HashMap<usize, Vec<Candidate>>,
    pub signaled_edges: HashSet<EdgeId>,
    pub warnings: Vec<MappingWarning>,
    pub stats: MappingStats,
    cancel: Option<&'a AtomicBool>,
}

impl<'a, G: GraphSink> MappingContext<'a, G> {
    fn new(config: &'a MapperConfig, graph: G, cancel: Option<&'a AtomicBool>) -> Self {
        Self {
            config,
            graph,
            resolver: IdResolver::new(),
            text: PrimaryText::default(),
            tokens: Vec::new(),
            governing: HashMap::new(),
            primary_edges: Vec::new(),
            secondary: Vec::new(),
            candidates: HashMap::new(),
            signaled_edges: HashSet::new(),
            warnings: Vec::new(),
            stats: MappingStats::default(),
            cancel,
        }
    }

    /// Build an annotation in the configured namespace.
    pub fn annotation(&self, key: &str, value: impl Into<String>) -> Annotation {
        Annotation::new(self.config.annotation_namespace.as_deref(), key, value)
    }

    pub fn annotate_node(&mut self, node: NodeId, key: &str, value: impl Into<String>) {
        let annotation = self.annotation(key, value);
        self.graph.annotate(ElementId::Node(node), annotation);
    }

    pub fn annotate_edge(&mut self, edge: EdgeId, key: &str, value: impl Into<String>) {
        let annotation = self.annotation(key, value);
        self.graph.annotate(ElementId::Edge(edge), annotation);
    }

    pub fn warn(&mut self, warning: MappingWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn checkpoint(&self, phase: Phase) -> MappingResult<()> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(MappingError::Cancelled { phase }),
            _ => Ok(()),
        }
    }
}

/// Maps documents with one configuration and tokenizer.
///
/// The mapper is `Send + Sync` and can be shared by worker threads mapping
/// different documents.
#[derive(Clone)]
pub struct DocumentMapper {
    config: MapperConfig,
    tokenizer: Arc<dyn Tokenizer>,
    cancel: Option<Arc<AtomicBool>>,
}

impl fmt::Debug for DocumentMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentMapper")
            .field("config", &self.config)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

impl Default for DocumentMapper {
    fn default() -> Self {
        Self::new(MapperConfig::default())
    }
}

impl DocumentMapper {
    /// Create a mapper. The tokenizer splits on
    /// `simple_tokenizer_separators` when set, on word boundaries otherwise.
    pub fn new(config: MapperConfig) -> Self {
        let tokenizer: Arc<dyn Tokenizer> = match &config.simple_tokenizer_separators {
            Some(separators) => Arc::new(SeparatorTokenizer::new(separators.clone())),
            None => Arc::new(UnicodeWordTokenizer::new()),
        };
        Self {
            config,
            tokenizer,
            cancel: None,
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Abort between phases once `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Map `document` into a fresh [`AnnotationGraph`].
    pub fn map(&self, document: &RstDocument) -> Result<MappedDocument, DocumentMappingError> {
        self.map_into(document)
    }

    /// Map `document` into a fresh sink of type `G`.
    pub fn map_into<G: GraphSink + Default>(
        &self,
        document: &RstDocument,
    ) -> Result<MappedDocument<G>, DocumentMappingError> {
        debug!(document = %document.id, "mapping document");
        self.run(document).map_err(|error| DocumentMappingError {
            document: document.id.clone(),
            error,
        })
    }

    fn run<G: GraphSink + Default>(&self, document: &RstDocument) -> MappingResult<MappedDocument<G>> {
        let mut ctx = MappingContext::new(&self.config, G::default(), self.cancel.as_deref());

        ctx.checkpoint(Phase::Text)?;
        let text = self.build_text(document)?;
        debug!(
            bytes = text.text.len(),
            tokens = text.tokens.len(),
            "built primary text"
        );
        ctx.graph.set_primary_text(text.text.clone());
        ctx.text = text;

        ctx.checkpoint(Phase::Structure)?;
        structure::map_structures(&mut ctx, document)?;

        ctx.checkpoint(Phase::Relations)?;
        relation::map_relations(&mut ctx, document)?;

        ctx.checkpoint(Phase::SecondaryEdges)?;
        secondary::map_secondary_edges(&mut ctx, document)?;

        ctx.checkpoint(Phase::Signals)?;
        signal::map_signals(&mut ctx, document)?;
        signal::select_representatives(&mut ctx);

        ctx.checkpoint(Phase::PostPass)?;
        if self.config.annotate_signaled_edges {
            signal::mark_signaled_edges(&mut ctx);
        }

        Ok(MappedDocument {
            document: document.id.clone(),
            graph: ctx.graph,
            warnings: ctx.warnings,
            stats: ctx.stats,
        })
    }

    fn build_text(&self, document: &RstDocument) -> MappingResult<PrimaryText> {
        let tokenizer: Option<&dyn Tokenizer> = if self.config.tokenize {
            Some(self.tokenizer.as_ref())
        } else {
            None
        };
        let mut builder = TextBuilder::new(&self.config.segment_separator, tokenizer);
        for segment in &document.segments {
            builder
                .push_segment(&segment.text)
                .map_err(|cause| MappingError::TokenizationFailed {
                    segment: segment.id.clone(),
                    cause,
                })?;
        }
        Ok(builder.finish())
    }
}
