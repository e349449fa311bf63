#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Maps RST discourse annotations onto a token-anchored annotation graph.
//!
//! A [`RstDocument`](layered_rst_document::RstDocument) (segments, groups,
//! relations, secondary edges and signals addressed by string ids) is turned
//! into an [`AnnotationGraph`]: one primary text, token nodes anchored to
//! byte spans of it, structural nodes for every discourse unit, and dominance
//! edges for the tree, the secondary edges and the signals.
//!
//! ## Modules
//!
//! - [`DocumentMapper`] - runs the mapping phases for one document
//! - [`MapperConfig`] - separator, tokenization and annotation-key options
//! - [`Tokenizer`] - word-boundary and separator tokenizers
//! - [`GraphSink`] / [`AnnotationGraph`] - output graph
//! - [`GraphDisplay`] - text rendering for debugging and snapshots
//!
//! ## Example
//!
//! ```
//! use layered_rst::{DocumentMapper, MapperConfig};
//! use layered_rst_document::RstDocument;
//!
//! let mut doc = RstDocument::new("example");
//! doc.add_segment("seg1", "It rained,");
//! doc.add_segment("seg2", "so we stayed home.");
//! doc.add_relation("seg2", "seg1").set_name("cause").set_type("rst");
//!
//! let mapped = DocumentMapper::new(MapperConfig::default()).map(&doc).unwrap();
//! assert_eq!(mapped.graph.text(), "It rained, so we stayed home.");
//! assert_eq!(mapped.stats.tokens, 8);
//! ```

mod config;
mod display;
mod errors;
mod graph;
mod mapper;
mod resolver;
mod text;
mod tokenizer;

pub use config::{parse_separator_list, ConfigError, MapperConfig};
pub use display::GraphDisplay;
pub use errors::{
    DocumentMappingError, Endpoint, MappingError, MappingResult, Phase, TokenizeError,
    UnresolvedReference,
};
pub use graph::{
    Annotation, AnnotationGraph, Edge, EdgeId, EdgeLayer, ElementId, GraphSink, Node, NodeId,
    NodeKind,
};
pub use mapper::{
    DocumentMapper, MappedDocument, MappingStats, MappingWarning, END_KEY, GROUP_KIND,
    IS_SIGNALED_KEY, SEGMENT_KIND, SIGNAL_INDICES_KEY, SIGNAL_SUBTYPE_KEY, SIGNAL_TEXT_KEY,
    SIGNAL_TYPE_KEY,
};
pub use resolver::{Binding, BindingKind, IdResolver};
pub use text::{PrimaryText, SegmentSpan, TextBuilder};
pub use tokenizer::{validate_tokens, SeparatorTokenizer, Tokenizer, UnicodeWordTokenizer};
