//! Validators for payloads with their own small grammar.

use crate::ast::Node;
use crate::errors::{ErrorReporting, TrellisError};
use crate::syntax::{self, LoopSource, Operand, VarRef};
use crate::validation::datatypes::enums::BREAKPOINTS;
use crate::validation::datatypes::{check_operand, check_variables, invalid};
use crate::validation::ValidationContext;

pub fn breakpoint_reference(
    value: &str,
    node: &Node,
    _: Option<&ValidationContext>,
) -> Result<(), TrellisError> {
    let parsed = syntax::parse_breakpoint(value)
        .map_err(|e| invalid(node, "breakpointReference", value, &e.message))?;
    if BREAKPOINTS.contains(&parsed.label.as_str()) {
        Ok(())
    } else {
        let reason = format!("unknown breakpoint, expected one of {}", BREAKPOINTS.join(", "));
        Err(invalid(node, "breakpointReference", value, &reason))
    }
}

/// `list as $item[, $index]`; the source must be a declared list or a
/// visible variable.
pub fn loop_binding(value: &str, node: &Node, ctx: Option<&ValidationContext>) -> Result<(), TrellisError> {
    let binding =
        syntax::parse_loop_binding(value).map_err(|e| invalid(node, "loopBinding", value, &e.message))?;
    if binding.index.as_deref() == Some(binding.item.as_str()) {
        return Err(invalid(node, "loopBinding", value, "item and index must have different names"));
    }
    let Some(ctx) = ctx else {
        return Ok(());
    };
    match &binding.source {
        LoopSource::List(name) if !ctx.knows_list(name) => Err(ctx.invalid_value(
            node,
            "loopBinding",
            value,
            &format!("no list named '{name}' is declared"),
        )),
        LoopSource::Variable(var) => check_variables([var], node, Some(ctx)),
        LoopSource::List(_) => Ok(()),
    }
}

pub fn range_binding(value: &str, node: &Node, ctx: Option<&ValidationContext>) -> Result<(), TrellisError> {
    let binding =
        syntax::parse_range_binding(value).map_err(|e| invalid(node, "rangeBinding", value, &e.message))?;
    if let Some(Operand::Literal(syntax::Literal::Number(step))) = &binding.step {
        if *step == 0.0 {
            return Err(invalid(node, "rangeBinding", value, "step must not be zero"));
        }
    }
    for bound in [Some(&binding.start), Some(&binding.end), binding.step.as_ref()]
        .into_iter()
        .flatten()
    {
        check_operand(bound, node, ctx)?;
    }
    Ok(())
}

pub fn index_binding(value: &str, node: &Node, ctx: Option<&ValidationContext>) -> Result<(), TrellisError> {
    let binding =
        syntax::parse_index_binding(value).map_err(|e| invalid(node, "indexBinding", value, &e.message))?;
    check_index(&binding.index, value, node, ctx)
}

/// A non-negative integer or a variable holding one.
pub fn index_expression(
    value: &str,
    node: &Node,
    ctx: Option<&ValidationContext>,
) -> Result<(), TrellisError> {
    if value.starts_with('$') {
        return check_variables([&VarRef::parse(value)], node, ctx);
    }
    let operand = Operand::Literal(syntax::Literal::Number(
        value
            .parse::<f64>()
            .map_err(|_| invalid(node, "indexExpression", value, "expected a number or a variable"))?,
    ));
    check_index(&operand, value, node, ctx)
}

fn check_index(
    index: &Operand,
    value: &str,
    node: &Node,
    ctx: Option<&ValidationContext>,
) -> Result<(), TrellisError> {
    match index {
        Operand::Literal(syntax::Literal::Number(n)) if *n < 0.0 || n.fract() != 0.0 => Err(invalid(
            node,
            "indexExpression",
            value,
            "index must be a whole number, 0 or more",
        )),
        other => check_operand(other, node, ctx),
    }
}

pub fn if_condition(value: &str, node: &Node, ctx: Option<&ValidationContext>) -> Result<(), TrellisError> {
    let condition =
        syntax::parse_condition(value).map_err(|e| invalid(node, "ifCondition", value, &e.message))?;
    check_operand(&condition.left, node, ctx)?;
    if let Some((_, right)) = &condition.test {
        check_operand(right, node, ctx)?;
    }
    Ok(())
}

pub fn where_condition(value: &str, node: &Node, ctx: Option<&ValidationContext>) -> Result<(), TrellisError> {
    let clause =
        syntax::parse_where(value).map_err(|e| invalid(node, "whereCondition", value, &e.message))?;
    check_operand(&clause.value, node, ctx)
}

pub fn number(value: &str, node: &Node, _: Option<&ValidationContext>) -> Result<(), TrellisError> {
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(()),
        _ => Err(invalid(node, "number", value, "expected a number")),
    }
}

const URL_PREFIXES: &[&str] = &["http://", "https://", "mailto:", "tel:", "/", "./", "../", "#"];

pub fn url(value: &str, node: &Node, ctx: Option<&ValidationContext>) -> Result<(), TrellisError> {
    if value.starts_with('$') {
        return check_variables([&VarRef::parse(value)], node, ctx);
    }
    if URL_PREFIXES.iter().any(|p| value.starts_with(p)) {
        Ok(())
    } else {
        Err(invalid(
            node,
            "url",
            value,
            "expected an absolute URL, a path, an anchor or a variable",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::{action, block, conditional};
    use crate::errors::ErrorKind;

    #[test]
    fn breakpoint_labels_are_closed() {
        let node = conditional("breakpoint", "");
        assert!(breakpoint_reference("mobile or less", &node, None).is_ok());
        assert!(breakpoint_reference("watch", &node, None).is_err());
    }

    #[test]
    fn unknown_pipe_operator_is_rejected() {
        let node = conditional("if", "");
        let err = if_condition("($a | explode) is 1", &node, None).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnknownOperator { ref operator } if operator == "explode"));
    }

    #[test]
    fn loop_item_and_index_differ() {
        let node = block("each", "");
        assert!(loop_binding("todos as $t, $t", &node, None).is_err());
        assert!(loop_binding("todos as $t, $i", &node, None).is_ok());
    }

    #[test]
    fn index_must_be_whole() {
        let node = action("setValue", "");
        assert!(index_expression("2", &node, None).is_ok());
        assert!(index_expression("-1", &node, None).is_err());
        assert!(index_expression("1.5", &node, None).is_err());
        assert!(index_expression("$pos", &node, None).is_ok());
    }

    #[test]
    fn urls() {
        let node = block("link", "");
        assert!(url("https://example.com", &node, None).is_ok());
        assert!(url("/about", &node, None).is_ok());
        assert!(url("example", &node, None).is_err());
    }
}
