//! # Node Builders
//!
//! Terse constructors for assembling node trees by hand, used by hosts that
//! build trees without the line parser and throughout the tests.
//!
//! Nodes built here start at line 0; [`number_lines`] assigns 1-based line
//! numbers in document order, which matches what the line parser produces for
//! a source file with one node per line.

use crate::ast::{Category, Node};

pub fn declaration(name: &str, data: &str) -> Node {
    Node::typed(Category::Declaration, name, data, 0)
}

pub fn block(name: &str, data: &str) -> Node {
    Node::typed(Category::Block, name, data, 0)
}

pub fn property(name: &str, data: &str) -> Node {
    Node::typed(Category::Property, name, data, 0)
}

pub fn conditional(name: &str, data: &str) -> Node {
    Node::typed(Category::Conditional, name, data, 0)
}

pub fn action(name: &str, data: &str) -> Node {
    Node::typed(Category::Action, name, data, 0)
}

pub fn keyed(key: &str, data: &str) -> Node {
    Node::keyed(key, data, 0)
}

/// Numbers every node in document order, starting at 1.
///
/// # Examples
///
/// ```rust
/// use trellis::ast::builder::{block, declaration, number_lines};
/// let mut doc = vec![declaration("page", "").with_children(vec![block("divider", "")])];
/// number_lines(&mut doc);
/// assert_eq!(doc[0].line, 1);
/// assert_eq!(doc[0].children[0].line, 2);
/// ```
pub fn number_lines(nodes: &mut [Node]) {
    let mut next = 1;
    for node in nodes {
        number_from(node, &mut next);
    }
}

fn number_from(node: &mut Node, next: &mut usize) {
    node.line = *next;
    *next += 1;
    for child in &mut node.children {
        number_from(child, next);
    }
}
