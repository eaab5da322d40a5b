//! Name-shaped validators and the references that must point at a
//! declared name.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::Node;
use crate::errors::{ErrorReporting, TrellisError};
use crate::validation::datatypes::invalid;
use crate::validation::ValidationContext;

static IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("identifier pattern"));
static SIGIL_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$[A-Za-z][A-Za-z0-9_-]*$").expect("parameter pattern"));
static VARIABLE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$[A-Za-z][A-Za-z0-9_-]*(\.[A-Za-z][A-Za-z0-9_-]*)*$").expect("variable pattern")
});

const IDENT_REASON: &str = "must start with a letter and contain only letters, digits, '_' or '-'";

pub fn is_identifier(value: &str) -> bool {
    IDENT.is_match(value)
}

fn shaped(validator: &str, value: &str, node: &Node) -> Result<(), TrellisError> {
    if is_identifier(value) {
        Ok(())
    } else {
        Err(invalid(node, validator, value, IDENT_REASON))
    }
}

fn variable_root(value: &str) -> &str {
    value
        .trim_start_matches('$')
        .split('.')
        .next()
        .unwrap_or_default()
}

pub fn identifier(value: &str, node: &Node, _: Option<&ValidationContext>) -> Result<(), TrellisError> {
    shaped("identifier", value, node)
}

/// A list name; outside a `list` declaration it must be declared.
pub fn list_name(value: &str, node: &Node, ctx: Option<&ValidationContext>) -> Result<(), TrellisError> {
    shaped("listName", value, node)?;
    match ctx {
        Some(ctx) if node.type_name() != "list" && !ctx.knows_list(value) => {
            Err(ctx.invalid_value(node, "listName", value, "no list with this name is declared"))
        }
        _ => Ok(()),
    }
}

/// A style name; `apply` may only name declared styles.
pub fn style_name(value: &str, node: &Node, ctx: Option<&ValidationContext>) -> Result<(), TrellisError> {
    shaped("styleName", value, node)?;
    match ctx {
        Some(ctx) if node.type_name() != "style" && !ctx.knows_style(value) => {
            Err(ctx.invalid_value(node, "styleName", value, "no style with this name is declared"))
        }
        _ => Ok(()),
    }
}

pub fn function_name(value: &str, node: &Node, _: Option<&ValidationContext>) -> Result<(), TrellisError> {
    shaped("functionName", value, node)
}

/// A declared function, or a `$variable` holding a function's name.
pub fn function_reference(
    value: &str,
    node: &Node,
    ctx: Option<&ValidationContext>,
) -> Result<(), TrellisError> {
    if value.starts_with('$') {
        return variable_reference(value, node, ctx);
    }
    shaped("functionReference", value, node)?;
    match ctx {
        Some(ctx) if !ctx.knows_function(value) => Err(ctx.invalid_value(
            node,
            "functionReference",
            value,
            "no function with this name is declared",
        )),
        _ => Ok(()),
    }
}

pub fn template_name(value: &str, node: &Node, _: Option<&ValidationContext>) -> Result<(), TrellisError> {
    shaped("templateName", value, node)
}

pub fn template_reference(
    value: &str,
    node: &Node,
    ctx: Option<&ValidationContext>,
) -> Result<(), TrellisError> {
    shaped("templateReference", value, node)?;
    match ctx {
        Some(ctx) if !ctx.knows_template(value) => Err(ctx.invalid_value(
            node,
            "templateReference",
            value,
            "no template with this name is declared",
        )),
        _ => Ok(()),
    }
}

pub fn parameter_name(value: &str, node: &Node, _: Option<&ValidationContext>) -> Result<(), TrellisError> {
    if SIGIL_IDENT.is_match(value) {
        Ok(())
    } else {
        Err(invalid(node, "parameterName", value, "parameters are written as $name"))
    }
}

/// An assignment target: a declared state variable (optionally with a
/// field path), or `$form.field` inside a form or function.
pub fn variable_name(value: &str, node: &Node, ctx: Option<&ValidationContext>) -> Result<(), TrellisError> {
    if !VARIABLE_PATH.is_match(value) {
        return Err(invalid(node, "variableName", value, "expected $name or $name.field"));
    }
    let Some(ctx) = ctx else {
        return Ok(());
    };
    let root = variable_root(value);
    if root == "form" {
        if value.contains('.') && ctx.in_form_scope() {
            return Ok(());
        }
        return Err(ctx.invalid_value(
            node,
            "variableName",
            value,
            "form fields are only assignable inside a form or function, as $form.field",
        ));
    }
    if ctx.state.is_none() || ctx.declares_state(root) {
        Ok(())
    } else {
        Err(ctx.undeclared_variable(node, root))
    }
}

/// Any `$reference` visible from the current scope.
pub fn variable_reference(
    value: &str,
    node: &Node,
    ctx: Option<&ValidationContext>,
) -> Result<(), TrellisError> {
    if !VARIABLE_PATH.is_match(value) {
        return Err(invalid(node, "variableReference", value, "expected $name or $name.field"));
    }
    match ctx {
        Some(ctx) if !ctx.resolves(variable_root(value)) => {
            Err(ctx.undeclared_variable(node, variable_root(value)))
        }
        _ => Ok(()),
    }
}
