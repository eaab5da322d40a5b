//! # Data-Type Validators
//!
//! Small checks bound by name to the parts of a node's data. Each takes the
//! raw part, the owning node and, when validating a whole document, the
//! validation context. Without a context only the shape is checked.
//!
//! ## Module Structure
//!
//! - **`identifiers`**: names and references (`listName`, `variableName`, ...)
//! - **`enums`**: closed sets (`boxRole`, `headingLevel`, ...)
//! - **`grammar`**: payloads with a sub-grammar (conditions, bindings, ...)
//! - **`scoped`**: expressions and text whose names must resolve

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::ast::Node;
use crate::errors::{ErrorKind, ErrorReporting, Phase, TrellisError};
use crate::runtime::operators;
use crate::syntax::{walk_operand, Operand, VarRef};
use crate::validation::ValidationContext;

pub mod enums;
pub mod grammar;
pub mod identifiers;
pub mod scoped;

pub type ValidatorFn = fn(&str, &Node, Option<&ValidationContext>) -> Result<(), TrellisError>;

#[derive(Debug, Clone, Copy)]
pub struct DataTypeValidator {
    pub name: &'static str,
    /// Receives every remaining part joined back together instead of one
    /// call per part.
    pub multi_part: bool,
    pub check: ValidatorFn,
}

const fn single(name: &'static str, check: ValidatorFn) -> DataTypeValidator {
    DataTypeValidator {
        name,
        multi_part: false,
        check,
    }
}

const fn multi(name: &'static str, check: ValidatorFn) -> DataTypeValidator {
    DataTypeValidator {
        name,
        multi_part: true,
        check,
    }
}

static VALIDATORS: Lazy<HashMap<&'static str, DataTypeValidator>> = Lazy::new(|| {
    let all = [
        single("identifier", identifiers::identifier),
        single("listName", identifiers::list_name),
        single("styleName", identifiers::style_name),
        single("functionName", identifiers::function_name),
        single("functionReference", identifiers::function_reference),
        single("templateName", identifiers::template_name),
        single("templateReference", identifiers::template_reference),
        single("parameterName", identifiers::parameter_name),
        single("variableName", identifiers::variable_name),
        single("variableReference", identifiers::variable_reference),
        single("boxRole", enums::box_role),
        single("rowRole", enums::row_role),
        single("headingLevel", enums::heading_level),
        single("windowOperation", enums::window_operation),
        single("inputType", enums::input_type),
        multi("breakpointReference", grammar::breakpoint_reference),
        multi("loopBinding", grammar::loop_binding),
        multi("rangeBinding", grammar::range_binding),
        multi("indexBinding", grammar::index_binding),
        single("indexExpression", grammar::index_expression),
        multi("ifCondition", grammar::if_condition),
        multi("whereCondition", grammar::where_condition),
        multi("valueExpression", scoped::value_expression),
        multi("text", scoped::text),
        single("number", grammar::number),
        single("url", grammar::url),
    ];
    all.into_iter().map(|v| (v.name, v)).collect()
});

pub fn get(name: &str) -> Option<&'static DataTypeValidator> {
    VALIDATORS.get(name)
}

pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = VALIDATORS.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Runs the named validator outside of a document walk.
///
/// # Examples
///
/// ```rust
/// use trellis::ast::builder::block;
/// use trellis::validation::datatypes::validate_value;
/// let node = block("heading", "h7 Title");
/// assert!(validate_value("headingLevel", "h2", &node).is_ok());
/// assert!(validate_value("headingLevel", "h7", &node).is_err());
/// ```
pub fn validate_value(validator: &str, value: &str, node: &Node) -> Result<(), TrellisError> {
    match get(validator) {
        Some(v) => (v.check)(value, node, None),
        None => Err(Shape.internal_error(node, &format!("no data-type validator named '{validator}'"))),
    }
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Reporter for checks that run without a context.
pub(crate) struct Shape;

impl ErrorReporting for Shape {
    fn phase(&self) -> Phase {
        Phase::Validation
    }
}

pub(crate) fn invalid(node: &Node, validator: &str, value: &str, reason: &str) -> TrellisError {
    Shape.invalid_value(node, validator, value, reason)
}

/// Checks every variable and operator an operand mentions.
pub(crate) fn check_operand(
    operand: &Operand,
    node: &Node,
    ctx: Option<&ValidationContext>,
) -> Result<(), TrellisError> {
    let mut vars: Vec<&VarRef> = Vec::new();
    let mut ops: Vec<&str> = Vec::new();
    walk_operand(operand, &mut |v| vars.push(v), &mut |o| ops.push(o));

    if let Some(op) = ops.into_iter().find(|op| operators::get(op).is_none()) {
        return Err(Shape.report(
            ErrorKind::UnknownOperator {
                operator: op.to_string(),
            },
            node,
        ));
    }
    check_variables(vars, node, ctx)
}

pub(crate) fn check_variables<'a>(
    vars: impl IntoIterator<Item = &'a VarRef>,
    node: &Node,
    ctx: Option<&ValidationContext>,
) -> Result<(), TrellisError> {
    let Some(ctx) = ctx else {
        return Ok(());
    };
    for var in vars {
        if !ctx.resolves(&var.root) {
            return Err(ctx.undeclared_variable(node, &var.root));
        }
    }
    Ok(())
}
