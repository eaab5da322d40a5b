//! Expressions and interpolated text. Every `$name` must resolve against
//! the scope stack and every pipe operator must exist.

use crate::ast::Node;
use crate::errors::TrellisError;
use crate::syntax::{self, Operand, Segment};
use crate::validation::datatypes::{check_operand, invalid};
use crate::validation::ValidationContext;

pub fn value_expression(
    value: &str,
    node: &Node,
    ctx: Option<&ValidationContext>,
) -> Result<(), TrellisError> {
    let expr = syntax::parse_expression(value)
        .map_err(|e| invalid(node, "valueExpression", value, &e.message))?;
    for operand in &expr.operands {
        check_operand(operand, node, ctx)?;
    }
    Ok(())
}

pub fn text(value: &str, node: &Node, ctx: Option<&ValidationContext>) -> Result<(), TrellisError> {
    let segments = syntax::parse_text(value).map_err(|e| invalid(node, "text", value, &e.message))?;
    for segment in segments {
        let operand = match segment {
            Segment::Literal(_) => continue,
            Segment::Variable(var) => Operand::Variable(var),
            Segment::Pipe(pipe) => Operand::Pipe(pipe),
        };
        check_operand(&operand, node, ctx)?;
    }
    Ok(())
}
