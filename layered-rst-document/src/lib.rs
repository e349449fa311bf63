//! Source document model for layered-rst.
//!
//! An [`RstDocument`] holds the segments, groups, relations, secondary edges
//! and signals of one RST discourse annotation, each addressed by a
//! document-local string id. Readers produce it; the `layered-rst` mapper
//! consumes it.
//!
//! ## Example
//!
//! ```
//! use layered_rst_document::RstDocument;
//!
//! let mut doc = RstDocument::new("example");
//! doc.add_segment("seg1", "Is this example");
//! doc.add_segment("seg2", "more complicated than it is supposed to be?");
//! doc.add_group("grp1").set_type("span");
//! doc.add_relation("grp1", "seg1").set_name("span");
//!
//! assert_eq!(doc.outgoing_relations("grp1").count(), 1);
//! ```

mod document;
mod model;

pub use document::{DocumentError, RstDocument};
pub use model::{Group, Relation, SecondaryEdge, Segment, Signal};
