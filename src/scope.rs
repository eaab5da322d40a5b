//! Scope frame kinds shared by the validator and the runtime.
//!
//! Both walk the tree in the same order and push a frame for the same
//! nodes; the validator's frames hold declared names, the runtime's hold
//! live values. The kind decides how lookups treat a frame.

use crate::ast::Node;
use crate::schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Any other node; carries sibling bindings only.
    Plain,
    /// `each` and `range`.
    Loop,
    /// `function` body; parameters are visible.
    Function,
    /// `template` body; parameters are visible.
    Template,
}

impl FrameKind {
    /// The frame kind a node opens.
    pub fn for_node(node: &Node) -> Self {
        if node.is_keyed() {
            return FrameKind::Plain;
        }
        match node.type_name() {
            "function" => FrameKind::Function,
            "template" => FrameKind::Template,
            name if schema::get(name).is_some_and(|s| s.flags.manages_loop_variables) => {
                FrameKind::Loop
            }
            _ => FrameKind::Plain,
        }
    }
}
