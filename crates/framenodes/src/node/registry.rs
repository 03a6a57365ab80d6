//! Node registry and shelves.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{FrameError, Result};

use super::descriptor::NodeDescriptor;
use super::instance::NodeInstance;

/// A named, nestable collection of node descriptors for a host's palette.
#[derive(Debug, Clone, Default)]
pub struct Shelf {
    pub name: String,
    pub description: String,
    pub nodes: Vec<Arc<NodeDescriptor>>,
    pub subshelves: Vec<Shelf>,
}

impl Shelf {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn node(mut self, descriptor: NodeDescriptor) -> Self {
        self.nodes.push(Arc::new(descriptor));
        self
    }

    pub fn subshelf(mut self, shelf: Shelf) -> Self {
        self.subshelves.push(shelf);
        self
    }

    /// Every descriptor on this shelf and its sub-shelves, depth first.
    pub fn all_nodes(&self) -> Vec<Arc<NodeDescriptor>> {
        let mut nodes = self.nodes.clone();
        for shelf in &self.subshelves {
            nodes.extend(shelf.all_nodes());
        }
        nodes
    }

    /// Find a descriptor by id anywhere below this shelf.
    pub fn find(&self, id: &str) -> Option<Arc<NodeDescriptor>> {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .or_else(|| self.subshelves.iter().find_map(|s| s.find(id)))
    }
}

/// Descriptors by id, in registration order.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: IndexMap<String, Arc<NodeDescriptor>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every node of a shelf tree.
    pub fn from_shelf(shelf: &Shelf) -> Result<Self> {
        let mut registry = Self::new();
        for node in shelf.all_nodes() {
            registry.register_shared(node)?;
        }
        Ok(registry)
    }

    /// Validate and register a descriptor. Duplicate ids are rejected.
    pub fn register(&mut self, descriptor: NodeDescriptor) -> Result<Arc<NodeDescriptor>> {
        let shared = Arc::new(descriptor);
        self.register_shared(Arc::clone(&shared))?;
        Ok(shared)
    }

    fn register_shared(&mut self, descriptor: Arc<NodeDescriptor>) -> Result<()> {
        descriptor.validate()?;
        if self.nodes.contains_key(&descriptor.id) {
            return Err(FrameError::Registration(format!(
                "node id '{}' is already registered",
                descriptor.id
            )));
        }
        tracing::trace!(node = %descriptor.id, "registered");
        self.nodes.insert(descriptor.id.clone(), descriptor);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<NodeDescriptor>> {
        self.nodes.get(id)
    }

    /// A fresh instance of a registered node.
    pub fn instantiate(&self, id: &str) -> Result<NodeInstance> {
        self.nodes
            .get(id)
            .map(|d| NodeInstance::new(Arc::clone(d)))
            .ok_or_else(|| FrameError::Registration(format!("unknown node id '{}'", id)))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::port::{PortSpec, PortType};
    use crate::node::value::Value;

    fn constant(id: &str) -> NodeDescriptor {
        NodeDescriptor::new(id, "Constant", |_| Ok(Value::from(1i64)))
            .output(PortSpec::output("out", PortType::Integer))
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = NodeRegistry::new();
        registry.register(constant("a")).unwrap();
        let err = registry.register(constant("a")).unwrap_err();
        assert!(matches!(err, FrameError::Registration(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_shelf_tree_registration() {
        let shelf = Shelf::new("root")
            .node(constant("a"))
            .subshelf(Shelf::new("child").node(constant("b")));
        assert!(shelf.find("b").is_some());
        let registry = NodeRegistry::from_shelf(&shelf).unwrap();
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(registry.instantiate("b").is_ok());
        assert!(registry.instantiate("c").is_err());
    }
}
