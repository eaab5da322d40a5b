//! # Trellis Runtime
//!
//! Executes a validated document: builds the live store from its
//! declarations, runs `init` blocks, and runs event handlers on request.
//! Rendering and browser effects belong to the host and are reached through
//! [`RenderSink`] and [`WindowHost`].
//!
//! ## Module Structure
//!
//! - **`value`**: live values and records
//! - **`store`**: state variables, lists, functions and templates
//! - **`scope`**: loop, sibling and parameter bindings
//! - **`operators`**: pipe operators
//! - **`eval`**: expressions, pipes, conditions and interpolation
//! - **`actions`**: action execution
//! - **`session`**: the host-facing entry point

use std::fmt;
use std::str::FromStr;

use crate::ast::Node;
use crate::schema;

pub mod actions;
pub mod eval;
pub mod operators;
pub mod scope;
pub mod session;
pub mod store;
pub mod value;

pub use scope::Scope;
pub use session::Session;
pub use store::Store;
pub use value::{Record, Value};

// ============================================================================
// HOST BOUNDARIES
// ============================================================================

/// Receives a render request after every batch of actions.
pub trait RenderSink {
    fn request_render(&mut self, store: &Store);
}

/// A render sink that ignores requests, for headless runs and tests.
pub struct NullRender;
impl RenderSink for NullRender {
    fn request_render(&mut self, _store: &Store) {}
}

/// The closed set of operations the `window` action may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOperation {
    ScrollTop,
    ScrollBottom,
    Back,
    Reload,
    Print,
}

impl WindowOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowOperation::ScrollTop => "scrollTop",
            WindowOperation::ScrollBottom => "scrollBottom",
            WindowOperation::Back => "back",
            WindowOperation::Reload => "reload",
            WindowOperation::Print => "print",
        }
    }
}

impl FromStr for WindowOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "scrollTop" => Ok(WindowOperation::ScrollTop),
            "scrollBottom" => Ok(WindowOperation::ScrollBottom),
            "back" => Ok(WindowOperation::Back),
            "reload" => Ok(WindowOperation::Reload),
            "print" => Ok(WindowOperation::Print),
            other => Err(format!("unknown window operation '{other}'")),
        }
    }
}

impl fmt::Display for WindowOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Performs `window` actions. The store is never touched.
pub trait WindowHost {
    fn perform(&mut self, operation: WindowOperation);
}

/// A window host that drops every request.
pub struct NullWindow;
impl WindowHost for NullWindow {
    fn perform(&mut self, operation: WindowOperation) {
        log::debug!("window operation '{operation}' ignored by the null host");
    }
}

/// Records every requested operation, in order.
#[derive(Debug, Default)]
pub struct RecordingWindow {
    pub performed: Vec<WindowOperation>,
}

impl WindowHost for RecordingWindow {
    fn perform(&mut self, operation: WindowOperation) {
        self.performed.push(operation);
    }
}

// ============================================================================
// RENDER SUPPORT
// ============================================================================

/// Children the renderer should visit. Inside a loop body, children whose
/// schema skips rendering in loops (event handlers) are left out.
///
/// # Examples
///
/// ```rust
/// use trellis::ast::builder::{block, action};
/// use trellis::runtime::renderable_children;
///
/// let button = block("button", "Add").with_children(vec![
///     block("onClick", "").with_children(vec![action("clear", "$draft")]),
/// ]);
/// assert_eq!(renderable_children(&button, false).count(), 1);
/// assert_eq!(renderable_children(&button, true).count(), 0);
/// ```
pub fn renderable_children(node: &Node, in_loop: bool) -> impl Iterator<Item = &Node> {
    let parent = schema::for_node(node, None);
    node.children.iter().filter(move |child| {
        !in_loop
            || !schema::for_node(child, parent)
                .is_some_and(|s| s.flags.skips_rendering_in_loops)
    })
}
