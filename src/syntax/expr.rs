//! Parsed forms of node data payloads.
//!
//! These are short-lived: the validator parses a payload to prove it is
//! well formed and every name in it resolves, the runtime parses it again
//! when it needs the value. Nothing here borrows from the source string.

use std::fmt;

// ============================================================================
// OPERANDS AND PIPES
// ============================================================================

/// A `$root.path.to.field` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef {
    pub root: String,
    pub path: Vec<String>,
}

impl VarRef {
    /// Splits `$user.name` into root `user` and path `[name]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trellis::syntax::VarRef;
    /// let var = VarRef::parse("$user.address.city");
    /// assert_eq!(var.root, "user");
    /// assert_eq!(var.path, vec!["address", "city"]);
    /// ```
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix('$').unwrap_or(text);
        let mut segments = text.split('.').map(str::to_string);
        let root = segments.next().unwrap_or_default();
        Self {
            root,
            path: segments.collect(),
        }
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.root)?;
        for segment in &self.path {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Literal),
    Variable(VarRef),
    Pipe(Pipe),
}

/// `( operand* (| operator operand*)* )`
#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    pub operands: Vec<Operand>,
    pub stages: Vec<Stage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub operator: String,
    pub args: Vec<Operand>,
}

/// A value expression: a sequence of top-level operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub operands: Vec<Operand>,
}

// ============================================================================
// CONDITIONS AND BINDINGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Is,
    IsNot,
    Contains,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
}

/// `not? operand (comparator operand)?`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub negated: bool,
    pub left: Operand,
    pub test: Option<(Comparator, Operand)>,
}

/// `field comparator operand`, evaluated against each record of a list.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub field: String,
    pub comparator: Comparator,
    pub value: Operand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopSource {
    List(String),
    Variable(VarRef),
}

/// `items as $item` or `items as $item, $index`
#[derive(Debug, Clone, PartialEq)]
pub struct LoopBinding {
    pub source: LoopSource,
    pub item: String,
    pub index: Option<String>,
}

/// `1 10 as $n` or `0 100 5 as $n`
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBinding {
    pub start: Operand,
    pub end: Operand,
    pub step: Option<Operand>,
    pub name: String,
}

/// `0 as $first`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBinding {
    pub index: Operand,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    OrMore,
    OrLess,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointRef {
    pub label: String,
    pub bound: Bound,
}

/// A piece of interpolated text.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Variable(VarRef),
    Pipe(Pipe),
}

// ============================================================================
// TRAVERSAL
// ============================================================================

/// Calls `on_var` for every variable and `on_op` for every pipe operator
/// reachable from `operand`, in source order.
pub fn walk_operand<'a>(
    operand: &'a Operand,
    on_var: &mut dyn FnMut(&'a VarRef),
    on_op: &mut dyn FnMut(&'a str),
) {
    match operand {
        Operand::Literal(_) => {}
        Operand::Variable(var) => on_var(var),
        Operand::Pipe(pipe) => walk_pipe(pipe, on_var, on_op),
    }
}

pub fn walk_pipe<'a>(
    pipe: &'a Pipe,
    on_var: &mut dyn FnMut(&'a VarRef),
    on_op: &mut dyn FnMut(&'a str),
) {
    for operand in &pipe.operands {
        walk_operand(operand, on_var, on_op);
    }
    for stage in &pipe.stages {
        on_op(&stage.operator);
        for arg in &stage.args {
            walk_operand(arg, on_var, on_op);
        }
    }
}
