//! Closed-set validators.

use crate::ast::Node;
use crate::errors::TrellisError;
use crate::validation::datatypes::invalid;
use crate::validation::ValidationContext;

pub const BOX_ROLES: &[&str] = &["main", "header", "footer", "article", "section", "nav", "aside"];
pub const ROW_ROLES: &[&str] = &["header", "body", "footer"];
pub const HEADING_LEVELS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
pub const WINDOW_OPERATIONS: &[&str] = &["scrollTop", "scrollBottom", "back", "reload", "print"];
pub const BREAKPOINTS: &[&str] = &["mobile", "tablet", "laptop", "desktop"];
pub const INPUT_TYPES: &[&str] = &[
    "text", "email", "password", "number", "tel", "url", "search", "date", "checkbox", "textarea",
];

fn one_of(validator: &str, allowed: &[&str], value: &str, node: &Node) -> Result<(), TrellisError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        let reason = format!("expected one of {}", allowed.join(", "));
        Err(invalid(node, validator, value, &reason))
    }
}

pub fn box_role(value: &str, node: &Node, _: Option<&ValidationContext>) -> Result<(), TrellisError> {
    one_of("boxRole", BOX_ROLES, value, node)
}

pub fn row_role(value: &str, node: &Node, _: Option<&ValidationContext>) -> Result<(), TrellisError> {
    one_of("rowRole", ROW_ROLES, value, node)
}

pub fn heading_level(value: &str, node: &Node, _: Option<&ValidationContext>) -> Result<(), TrellisError> {
    one_of("headingLevel", HEADING_LEVELS, value, node)
}

pub fn window_operation(value: &str, node: &Node, _: Option<&ValidationContext>) -> Result<(), TrellisError> {
    one_of("windowOperation", WINDOW_OPERATIONS, value, node)
}

pub fn input_type(value: &str, node: &Node, _: Option<&ValidationContext>) -> Result<(), TrellisError> {
    one_of("inputType", INPUT_TYPES, value, node)
}
