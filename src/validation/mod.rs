//! # Trellis Validation
//!
//! Decides whether a node tree is a well-formed program. Validation stops at
//! the first violated rule and returns it as a [`TrellisError`] naming the
//! node, its line and the rule.
//!
//! ## Module Structure
//!
//! - **`context`**: scope stack and declared-name tables
//! - **`data`**: data contracts (parts, counts, repeats, constraints)
//! - **`structure`**: the recursive walk and children rules
//! - **`special`**: roles, conditional hosts, breakpoint placement
//! - **`datatypes`**: the named per-part validators
//!
//! ## Example
//!
//! ```rust
//! use trellis::ast::builder::{block, conditional, declaration, number_lines};
//! use trellis::validation::validate_document;
//!
//! let mut doc = vec![declaration("page", "Home").with_children(vec![
//!     block("text", "Welcome"),
//!     conditional("else", ""),
//! ])];
//! number_lines(&mut doc);
//! let err = validate_document(&doc).unwrap_err();
//! assert_eq!(err.to_string(), "line 3: 'else' else without if");
//! ```

use crate::ast::Node;
use crate::errors::TrellisError;

pub mod context;
pub mod data;
pub mod datatypes;
pub mod special;
pub mod structure;

pub use context::{Frame, ValidationContext};

/// Validates a whole document with names collected from the document.
pub fn validate_document(nodes: &[Node]) -> Result<(), TrellisError> {
    validate_document_with(nodes, ValidationContext::new())
}

/// Validates a whole document on top of a host-supplied context, e.g. one
/// seeded with imported templates and styles.
pub fn validate_document_with(nodes: &[Node], mut ctx: ValidationContext) -> Result<(), TrellisError> {
    log::debug!("validating document with {} root nodes", nodes.len());
    ctx.collect_declarations(nodes);
    ctx.stack.clear();
    let result = ctx.validate_roots(nodes);
    match &result {
        Ok(()) => log::debug!("document is valid"),
        Err(e) => log::debug!("document rejected: {e}"),
    }
    result
}
