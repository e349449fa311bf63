//! Document-scoped lookup from source ids to output-graph nodes.

use std::collections::HashMap;

use crate::errors::UnresolvedReference;
use crate::graph::NodeId;

/// What kind of node an id is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// A segment or group.
    Structure,
    /// The node reifying a secondary edge, with its position among the
    /// document's mapped secondary edges.
    SecondaryEdge(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub node: NodeId,
    pub kind: BindingKind,
}

/// Append-only id table. Ids are never rebound and there is no
/// creation on a miss.
#[derive(Debug, Default)]
pub struct IdResolver {
    bindings: HashMap<String, Binding>,
}

impl IdResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `id`. Returns the existing binding if `id` is already taken,
    /// leaving the table unchanged.
    pub fn register(&mut self, id: &str, node: NodeId, kind: BindingKind) -> Result<(), Binding> {
        if let Some(existing) = self.bindings.get(id) {
            return Err(*existing);
        }
        self.bindings.insert(id.to_string(), Binding { node, kind });
        Ok(())
    }

    /// Look up `id`. `context` names the referrer in the error.
    pub fn resolve(&self, id: &str, context: impl FnOnce() -> String) -> Result<Binding, UnresolvedReference> {
        self.bindings.get(id).copied().ok_or_else(|| UnresolvedReference {
            id: id.to_string(),
            context: context(),
        })
    }

    pub fn is_bound(&self, id: &str) -> bool {
        self.bindings.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut resolver = IdResolver::new();
        let node = NodeId::new(3);
        resolver.register("seg1", node, BindingKind::Structure).unwrap();

        let binding = resolver.resolve("seg1", || unreachable!()).unwrap();
        assert_eq!(binding, Binding { node, kind: BindingKind::Structure });
        assert!(resolver.is_bound("seg1"));
        assert!(!resolver.is_bound("seg2"));
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut resolver = IdResolver::new();
        resolver.register("seg1", NodeId::new(0), BindingKind::Structure).unwrap();
        let existing = resolver
            .register("seg1", NodeId::new(1), BindingKind::SecondaryEdge(0))
            .unwrap_err();
        assert_eq!(existing.node, NodeId::new(0));
        assert_eq!(
            resolver.resolve("seg1", String::new).unwrap().kind,
            BindingKind::Structure
        );
    }

    #[test]
    fn test_unresolved_names_id_and_context() {
        let resolver = IdResolver::new();
        let err = resolver
            .resolve("grp7", || "relation grp7 -> seg1".to_string())
            .unwrap_err();
        assert_eq!(err.to_string(), "unresolved reference 'grp7' (relation grp7 -> seg1)");
    }
}
