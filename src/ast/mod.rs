//! AST module for the Trellis markup language
//!
//! This module provides the node tree produced by the external line parser.
//! The validator and the runtime only ever read this tree; neither mutates it.

// ============================================================================
// IMPORTS
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// The five node categories. The category decides which prefix a line
/// carries in source and the general placement rules for the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Declaration,
    Block,
    Property,
    Conditional,
    Action,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Declaration => "declaration",
            Category::Block => "block",
            Category::Property => "property",
            Category::Conditional => "conditional",
            Category::Action => "action",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a node names itself.
///
/// `Typed` nodes name a registered schema (`box`, `if`, `set`). `Keyed` nodes
/// carry a user-chosen name (a state variable, a record field, a CSS property)
/// and take their schema from the parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Typed(String),
    Keyed(String),
}

/// One parsed line of source and everything indented beneath it.
///
/// # Examples
///
/// ```rust
/// use trellis::ast::{Category, Node};
/// let node = Node::typed(Category::Block, "text", "Hello $name", 4);
/// assert_eq!(node.type_name(), "text");
/// assert!(node.has_data());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub category: Category,
    pub kind: NodeKind,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub line: usize,
}

/// Shape of a state variable's initial value.
///
/// Classified once here so the validator and the store builder agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Scalar,
    Array,
    Object,
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Node {
    /// Creates a node naming a registered schema.
    pub fn typed(
        category: Category,
        name: impl Into<String>,
        data: impl Into<String>,
        line: usize,
    ) -> Self {
        Self {
            category,
            kind: NodeKind::Typed(name.into()),
            data: data.into(),
            children: Vec::new(),
            line,
        }
    }

    /// Creates an open-vocabulary property node (`color: red`, `count: 0`).
    pub fn keyed(key: impl Into<String>, data: impl Into<String>, line: usize) -> Self {
        Self {
            category: Category::Property,
            kind: NodeKind::Keyed(key.into()),
            data: data.into(),
            children: Vec::new(),
            line,
        }
    }

    /// The node's type name, or its key for keyed nodes.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            NodeKind::Typed(name) | NodeKind::Keyed(name) => name,
        }
    }

    pub fn is_keyed(&self) -> bool {
        matches!(self.kind, NodeKind::Keyed(_))
    }

    /// True when the data payload carries anything besides whitespace.
    pub fn has_data(&self) -> bool {
        !self.data.trim().is_empty()
    }

    /// The first child of the given type, if any.
    pub fn child(&self, type_name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|c| !c.is_keyed() && c.type_name() == type_name)
    }

    /// Classifies a keyed state child by what it carries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trellis::ast::{Category, Node, ValueShape};
    /// let scalar = Node::keyed("count", "0", 2);
    /// assert_eq!(scalar.value_shape(), ValueShape::Scalar);
    ///
    /// let mut tags = Node::keyed("tags", "", 3);
    /// tags.children.push(Node::typed(Category::Property, "item", "a", 4));
    /// assert_eq!(tags.value_shape(), ValueShape::Array);
    /// ```
    pub fn value_shape(&self) -> ValueShape {
        if self.has_data() || self.children.is_empty() {
            return ValueShape::Scalar;
        }
        let all_items = self
            .children
            .iter()
            .all(|c| !c.is_keyed() && c.type_name() == "item");
        if all_items {
            ValueShape::Array
        } else {
            ValueShape::Object
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }
}

// ============================================================================
// MODULE EXPORTS
// ============================================================================

pub mod builder;
