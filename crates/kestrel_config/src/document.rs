//! The parsed configuration tree.

use std::collections::BTreeMap;

/// One `<module>` of a configuration document.
///
/// Property values are already placeholder-expanded. The root node is always
/// named `Checker`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigNode {
    name: String,
    properties: BTreeMap<String, String>,
    children: Vec<ConfigNode>,
}

impl ConfigNode {
    /// Creates a node with no properties or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style [`set_property`](Self::set_property).
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_property(name, value);
        self
    }

    /// Builder-style [`add_child`](Self::add_child).
    pub fn with_child(mut self, child: ConfigNode) -> Self {
        self.add_child(child);
        self
    }

    /// Returns the module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns one property value.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Returns all properties.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Adds or replaces a property.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Appends a child module.
    pub fn add_child(&mut self, child: ConfigNode) {
        self.children.push(child);
    }

    /// Returns child modules in document order.
    pub fn children(&self) -> &[ConfigNode] {
        &self.children
    }

    /// Returns the first node named `name` in depth-first order, including `self`.
    pub fn find(&self, name: &str) -> Option<&ConfigNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Visits this node and every descendant depth-first, allowing mutation.
    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut ConfigNode)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    /// Counts this node and all descendants.
    pub fn module_count(&self) -> usize {
        1 + self.children.iter().map(ConfigNode::module_count).sum::<usize>()
    }
}
