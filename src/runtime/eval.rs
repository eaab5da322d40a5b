//! This module resolves the expressions embedded in node data against the
//! live store and a scope.
//!
//! ## Core Responsibility: Payload → Value Translation
//!
//! Value expressions, pipes, conditions, where clauses and interpolated text
//! are parsed from the node's data and reduced to [`Value`]s. Evaluation is
//! read-only: nothing here mutates the store.
//!
//! ## Name Resolution
//!
//! `$name` resolves innermost first: loop, sibling and parameter bindings in
//! the scope, then `$form` fields, then state variables, then lists. A path
//! step that finds nothing yields [`Value::Empty`], which renders as empty
//! text. A root that names nothing at all is an error; the validator should
//! have ruled it out.

use crate::ast::Node;
use crate::errors::{ErrorKind, ErrorReporting, Phase, TrellisError};
use crate::runtime::operators;
use crate::runtime::scope::Scope;
use crate::runtime::store::Store;
use crate::runtime::value::Value;
use crate::syntax::{
    self, Comparator, Condition, Expression, Literal, Operand, Pipe, Segment, SyntaxError,
    VarRef, WhereClause,
};

// ============================================================================
// EVALUATOR
// ============================================================================

/// Read-only view used to evaluate expressions on behalf of a node.
pub struct Evaluator<'a> {
    pub store: &'a Store,
    pub scope: &'a Scope,
}

impl ErrorReporting for Evaluator<'_> {
    fn phase(&self) -> Phase {
        Phase::Runtime
    }
}

impl<'a> Evaluator<'a> {
    pub fn new(store: &'a Store, scope: &'a Scope) -> Self {
        Self { store, scope }
    }

    /// A payload that failed to parse after validation accepted it.
    pub fn unparsable(&self, node: &Node, error: SyntaxError) -> TrellisError {
        self.internal_error(node, &format!("'{}' did not parse: {error}", node.data))
    }

    // ------------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------------

    pub fn resolve(&self, var: &VarRef, node: &Node) -> Result<Value, TrellisError> {
        let root = self.resolve_root(&var.root).ok_or_else(|| {
            self.report(
                ErrorKind::UndefinedName {
                    name: format!("${}", var.root),
                },
                node,
            )
        })?;
        Ok(root.get_path(&var.path).cloned().unwrap_or_default())
    }

    fn resolve_root(&self, root: &str) -> Option<Value> {
        if let Some(value) = self.scope.lookup(root) {
            return Some(value.clone());
        }
        if root == "form" && self.scope.form().is_some() {
            return Some(self.scope.form_value());
        }
        if let Some(value) = self.store.get_state(root) {
            return Some(value.clone());
        }
        if let Some(items) = self.store.list(root) {
            return Some(Value::List(items.clone()));
        }
        // `$form` inside a function called from outside any form.
        (root == "form").then_some(Value::Empty)
    }

    // ------------------------------------------------------------------------
    // Expressions and pipes
    // ------------------------------------------------------------------------

    pub fn operand(&self, operand: &Operand, node: &Node) -> Result<Value, TrellisError> {
        match operand {
            Operand::Literal(Literal::Number(n)) => Ok(Value::Number(*n)),
            Operand::Literal(Literal::Text(s)) => Ok(Value::Text(s.clone())),
            Operand::Literal(Literal::Bool(b)) => Ok(Value::Bool(*b)),
            Operand::Variable(var) => self.resolve(var, node),
            Operand::Pipe(pipe) => self.pipe(pipe, node),
        }
    }

    /// Runs a pipe left to right. The first stage receives the pipe's own
    /// operands followed by its arguments; each later stage receives the
    /// previous result followed by its arguments. A pipe without stages
    /// joins its operands as text.
    pub fn pipe(&self, pipe: &Pipe, node: &Node) -> Result<Value, TrellisError> {
        let mut values = self.operands(&pipe.operands, node)?;
        if pipe.stages.is_empty() {
            return match values.len() {
                1 => Ok(values.remove(0)),
                _ => operators::OP_CONCAT(&values).map_err(|kind| self.report(kind, node)),
            };
        }

        for stage in &pipe.stages {
            let op = operators::get(&stage.operator).ok_or_else(|| {
                self.report(
                    ErrorKind::UnknownOperator {
                        operator: stage.operator.clone(),
                    },
                    node,
                )
            })?;
            values.extend(self.operands(&stage.args, node)?);
            log::trace!("line {}: {} over {} operands", node.line, stage.operator, values.len());
            let result = op(&values).map_err(|kind| self.report(kind, node))?;
            values = vec![result];
        }
        Ok(values.pop().unwrap_or_default())
    }

    pub fn operands(&self, operands: &[Operand], node: &Node) -> Result<Vec<Value>, TrellisError> {
        operands.iter().map(|o| self.operand(o, node)).collect()
    }

    /// One operand yields its value; several render and join with spaces.
    pub fn expression(&self, expr: &Expression, node: &Node) -> Result<Value, TrellisError> {
        let mut values = self.operands(&expr.operands, node)?;
        Ok(match values.len() {
            0 => Value::Empty,
            1 => values.remove(0),
            _ => Value::Text(
                values
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
        })
    }

    /// Parses and evaluates `text` as a value expression.
    pub fn expression_text(&self, text: &str, node: &Node) -> Result<Value, TrellisError> {
        let expr = syntax::parse_expression(text).map_err(|e| self.unparsable(node, e))?;
        self.expression(&expr, node)
    }

    /// Parses `text` as a value expression and evaluates each operand
    /// separately, as positional arguments.
    pub fn arguments(&self, text: &str, node: &Node) -> Result<Vec<Value>, TrellisError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let expr = syntax::parse_expression(text).map_err(|e| self.unparsable(node, e))?;
        self.operands(&expr.operands, node)
    }

    // ------------------------------------------------------------------------
    // Conditions
    // ------------------------------------------------------------------------

    pub fn condition(&self, condition: &Condition, node: &Node) -> Result<bool, TrellisError> {
        let left = self.operand(&condition.left, node)?;
        let outcome = match &condition.test {
            None => left.is_truthy(),
            Some((comparator, right)) => {
                let right = self.operand(right, node)?;
                compare(&left, *comparator, &right)
            }
        };
        Ok(outcome != condition.negated)
    }

    pub fn condition_text(&self, text: &str, node: &Node) -> Result<bool, TrellisError> {
        let condition = syntax::parse_condition(text).map_err(|e| self.unparsable(node, e))?;
        self.condition(&condition, node)
    }

    /// Whether a list entry satisfies a where clause. The clause's field is
    /// read from the entry; non-record entries never match.
    pub fn matches_where(&self, clause: &WhereClause, entry: &Value, node: &Node) -> Result<bool, TrellisError> {
        if !matches!(entry, Value::Record(_) | Value::Map(_)) {
            return Ok(false);
        }
        let path: Vec<String> = clause.field.split('.').map(str::to_string).collect();
        let field = entry.get_path(&path).cloned().unwrap_or_default();
        let expected = self.operand(&clause.value, node)?;
        Ok(compare(&field, clause.comparator, &expected))
    }

    // ------------------------------------------------------------------------
    // Text interpolation
    // ------------------------------------------------------------------------

    /// Substitutes `$var` references and `( … | op )` pipes in `text`.
    pub fn interpolate(&self, text: &str, node: &Node, trim: bool) -> Result<String, TrellisError> {
        let segments = syntax::parse_text(text).map_err(|e| self.unparsable(node, e))?;
        let mut out = String::with_capacity(text.len());
        for segment in &segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Variable(var) => out.push_str(&self.resolve(var, node)?.to_string()),
                Segment::Pipe(pipe) => out.push_str(&self.pipe(pipe, node)?.to_string()),
            }
        }
        Ok(if trim { out.trim().to_string() } else { out })
    }
}

// ============================================================================
// COMPARISON
// ============================================================================

/// Applies a comparator. Ordering compares numerically when both sides read
/// as numbers and falls back to comparing the rendered text.
///
/// ```rust
/// use trellis::runtime::{eval::compare, Value};
/// use trellis::syntax::Comparator;
/// assert!(compare(&Value::text("10"), Comparator::Greater, &Value::Number(9.0)));
/// assert!(compare(&Value::text("banana"), Comparator::Contains, &Value::text("nan")));
/// ```
pub fn compare(left: &Value, comparator: Comparator, right: &Value) -> bool {
    match comparator {
        Comparator::Is => left.loosely_equals(right),
        Comparator::IsNot => !left.loosely_equals(right),
        Comparator::Contains => match left {
            Value::List(items) => items.iter().any(|item| item.loosely_equals(right)),
            Value::Map(map) => map.contains_key(right.to_string().as_str()),
            Value::Record(record) => record.fields.contains_key(&right.to_string()),
            _ => left.to_string().contains(&right.to_string()),
        },
        Comparator::Greater => ordering(left, right).is_gt(),
        Comparator::Less => ordering(left, right).is_lt(),
        Comparator::GreaterOrEqual => ordering(left, right).is_ge(),
        Comparator::LessOrEqual => ordering(left, right).is_le(),
    }
}

fn ordering(left: &Value, right: &Value) -> std::cmp::Ordering {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal),
        _ => left.to_string().cmp(&right.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::block;
    use crate::scope::FrameKind;

    fn store() -> Store {
        let mut store = Store::new();
        store.state.insert("count".into(), Value::Number(2.0));
        store.state.insert("name".into(), Value::text("Ada"));
        store
            .lists
            .insert("tags".into(), vec![Value::text("red"), Value::text("blue")]);
        store
    }

    #[test]
    fn pipes_feed_left_to_right() {
        let store = store();
        let scope = Scope::new();
        let eval = Evaluator::new(&store, &scope);
        let node = block("text", "");
        let value = eval.expression_text("($count 3 | add | multiply 10)", &node).unwrap();
        assert_eq!(value, Value::Number(50.0));
    }

    #[test]
    fn scope_shadows_state() {
        let store = store();
        let mut scope = Scope::new();
        scope.push(FrameKind::Loop, im::HashMap::unit("name".into(), Value::text("Grace")));
        let eval = Evaluator::new(&store, &scope);
        let node = block("text", "");
        assert_eq!(eval.interpolate("Hi $name", &node, false).unwrap(), "Hi Grace");
    }

    #[test]
    fn missing_path_is_empty_but_missing_root_is_an_error() {
        let store = store();
        let scope = Scope::new();
        let eval = Evaluator::new(&store, &scope);
        let node = block("text", "");
        assert_eq!(eval.interpolate("[$name.middle]", &node, false).unwrap(), "[]");
        let err = eval.interpolate("$ghost", &node, false).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UndefinedName { .. }));
    }

    #[test]
    fn conditions_compare_and_negate() {
        let store = store();
        let scope = Scope::new();
        let eval = Evaluator::new(&store, &scope);
        let node = block("text", "");
        assert!(eval.condition_text("$count >= 2", &node).unwrap());
        assert!(eval.condition_text("$tags contains red", &node).unwrap());
        assert!(eval.condition_text("not $count is 3", &node).unwrap());
    }

    #[test]
    fn operator_failures_carry_the_node() {
        let store = store();
        let scope = Scope::new();
        let eval = Evaluator::new(&store, &scope);
        let mut node = block("text", "");
        node.line = 7;
        let err = eval.expression_text("(1 0 | divide)", &node).unwrap_err();
        assert_eq!(err.to_string(), "line 7: 'text' division by zero");
    }
}
