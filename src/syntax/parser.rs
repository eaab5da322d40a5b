//! Trellis payload parser.
//!
//! Turns a node's raw data string into the structures in [`super::expr`].
//! Purely syntactic: names are not resolved here.

use pest::{iterators::Pair, Parser};
use pest_derive::Parser;
use thiserror::Error;

use crate::syntax::expr::*;

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct PayloadParser;

/// Why a payload did not parse. Callers attach node and line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
}

impl SyntaxError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<pest::error::Error<Rule>> for SyntaxError {
    fn from(error: pest::error::Error<Rule>) -> Self {
        let column = match error.line_col {
            pest::error::LineColLocation::Pos((_, col))
            | pest::error::LineColLocation::Span((_, col), _) => col,
        };
        Self::new(format!("{} at column {}", error.variant.message(), column))
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses a value expression such as `$count`, `"hi" $name` or `($a 1 | add)`.
pub fn parse_expression(text: &str) -> Result<Expression, SyntaxError> {
    let root = parse_rule(Rule::expression, text)?;
    let operands = root
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(build_operand)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Expression { operands })
}

/// Parses a condition such as `$done`, `not $done` or `$count >= 3`.
pub fn parse_condition(text: &str) -> Result<Condition, SyntaxError> {
    let root = parse_rule(Rule::condition, text)?;
    let mut negated = false;
    let mut left = None;
    let mut comparator = None;
    let mut right = None;

    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::negate => negated = true,
            Rule::comparator => comparator = Some(build_comparator(pair)?),
            Rule::EOI => {}
            _ if left.is_none() => left = Some(build_operand(pair)?),
            _ => right = Some(build_operand(pair)?),
        }
    }

    let left = left.ok_or_else(|| SyntaxError::new("condition has no operand"))?;
    let test = match (comparator, right) {
        (Some(c), Some(r)) => Some((c, r)),
        (None, None) => None,
        _ => return Err(SyntaxError::new("comparison is missing an operand")),
    };
    Ok(Condition { negated, left, test })
}

/// Parses a where clause such as `id is 1` or `name contains $query`.
pub fn parse_where(text: &str) -> Result<WhereClause, SyntaxError> {
    let root = parse_rule(Rule::where_clause, text)?;
    let mut inner = root.into_inner();
    let field = next_pair(&mut inner, "field name")?.as_str().to_string();
    let comparator = build_comparator(next_pair(&mut inner, "comparator")?)?;
    let value = build_operand(next_pair(&mut inner, "value")?)?;
    Ok(WhereClause {
        field,
        comparator,
        value,
    })
}

/// Parses `items as $item` or `$user.tags as $tag, $i`.
pub fn parse_loop_binding(text: &str) -> Result<LoopBinding, SyntaxError> {
    let root = parse_rule(Rule::loop_binding, text)?;
    let mut source = None;
    let mut names = Vec::new();

    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::loop_source => {
                let inner = next_pair(&mut pair.into_inner(), "loop source")?;
                source = Some(match inner.as_rule() {
                    Rule::variable => LoopSource::Variable(VarRef::parse(inner.as_str())),
                    _ => LoopSource::List(inner.as_str().to_string()),
                });
            }
            Rule::variable => names.push(VarRef::parse(pair.as_str()).root),
            _ => {}
        }
    }

    let source = source.ok_or_else(|| SyntaxError::new("loop binding has no source"))?;
    let mut names = names.into_iter();
    let item = names
        .next()
        .ok_or_else(|| SyntaxError::new("loop binding has no variable"))?;
    Ok(LoopBinding {
        source,
        item,
        index: names.next(),
    })
}

/// Parses `start end [step] as $name`.
pub fn parse_range_binding(text: &str) -> Result<RangeBinding, SyntaxError> {
    let root = parse_rule(Rule::range_binding, text)?;
    let mut bounds = Vec::new();
    let mut name = None;

    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::bound => bounds.push(build_bound(pair)?),
            Rule::variable => name = Some(VarRef::parse(pair.as_str()).root),
            _ => {}
        }
    }

    let name = name.ok_or_else(|| SyntaxError::new("range binding has no variable"))?;
    let mut bounds = bounds.into_iter();
    let start = bounds
        .next()
        .ok_or_else(|| SyntaxError::new("range binding has no start"))?;
    let end = bounds
        .next()
        .ok_or_else(|| SyntaxError::new("range binding has no end"))?;
    Ok(RangeBinding {
        start,
        end,
        step: bounds.next(),
        name,
    })
}

/// Parses `index as $name`.
pub fn parse_index_binding(text: &str) -> Result<IndexBinding, SyntaxError> {
    let root = parse_rule(Rule::index_binding, text)?;
    let mut index = None;
    let mut name = None;

    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::bound => index = Some(build_bound(pair)?),
            Rule::variable => name = Some(VarRef::parse(pair.as_str()).root),
            _ => {}
        }
    }

    match (index, name) {
        (Some(index), Some(name)) => Ok(IndexBinding { index, name }),
        _ => Err(SyntaxError::new("expected '<index> as $name'")),
    }
}

/// Parses `mobile`, `tablet or more`, `desktop or less`.
pub fn parse_breakpoint(text: &str) -> Result<BreakpointRef, SyntaxError> {
    let root = parse_rule(Rule::breakpoint_ref, text)?;
    let mut label = String::new();
    let mut bound = Bound::Exact;

    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::ident => label = pair.as_str().to_string(),
            Rule::or_more => bound = Bound::OrMore,
            Rule::or_less => bound = Bound::OrLess,
            _ => {}
        }
    }
    Ok(BreakpointRef { label, bound })
}

/// Splits text into literal runs, `$var` references and `( … | op )` pipes.
///
/// Parenthesized groups without an operator stage stay literal, so prose
/// such as "(optional)" is left alone. `\$` and `\(` escape.
///
/// # Examples
///
/// ```rust
/// use trellis::syntax::{parse_text, Segment};
/// let segments = parse_text("Hi $name (see notes)").unwrap();
/// assert_eq!(segments.len(), 3);
/// assert!(matches!(segments[1], Segment::Variable(_)));
/// assert_eq!(segments[2], Segment::Literal(" (see notes)".into()));
/// ```
pub fn parse_text(text: &str) -> Result<Vec<Segment>, SyntaxError> {
    // Not trimmed: leading and trailing spaces are part of the text.
    let root = PayloadParser::parse(Rule::text, text)?
        .next()
        .ok_or_else(|| SyntaxError::new("empty parse result"))?;
    let mut segments = Vec::new();
    let mut literal = String::new();

    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::literal_run | Rule::open_paren => literal.push_str(pair.as_str()),
            Rule::escape => literal.push_str(&pair.as_str()[1..]),
            Rule::variable => {
                flush(&mut literal, &mut segments);
                segments.push(Segment::Variable(VarRef::parse(pair.as_str())));
            }
            Rule::text_pipe => {
                flush(&mut literal, &mut segments);
                segments.push(Segment::Pipe(build_pipe(pair)?));
            }
            Rule::broken_pipe => {
                let column = pair.as_span().start() + 1;
                return Err(SyntaxError::new(format!(
                    "malformed pipe expression at column {column}"
                )));
            }
            _ => {}
        }
    }
    flush(&mut literal, &mut segments);
    Ok(segments)
}

// ============================================================================
// PAIR BUILDERS
// ============================================================================

fn parse_rule(rule: Rule, text: &str) -> Result<Pair<'_, Rule>, SyntaxError> {
    let mut pairs = PayloadParser::parse(rule, text.trim())?;
    pairs
        .next()
        .ok_or_else(|| SyntaxError::new("empty parse result"))
}

fn next_pair<'i>(
    pairs: &mut pest::iterators::Pairs<'i, Rule>,
    what: &str,
) -> Result<Pair<'i, Rule>, SyntaxError> {
    pairs
        .next()
        .ok_or_else(|| SyntaxError::new(format!("missing {what}")))
}

fn build_operand(pair: Pair<Rule>) -> Result<Operand, SyntaxError> {
    match pair.as_rule() {
        Rule::pipe => Ok(Operand::Pipe(build_pipe(pair)?)),
        Rule::string => {
            let raw = pair
                .into_inner()
                .next()
                .map(|p| p.as_str())
                .unwrap_or_default();
            Ok(Operand::Literal(Literal::Text(unescape(raw))))
        }
        Rule::number => {
            let text = pair.as_str();
            text.parse::<f64>()
                .map(|n| Operand::Literal(Literal::Number(n)))
                .map_err(|_| SyntaxError::new(format!("invalid number '{text}'")))
        }
        Rule::variable => Ok(Operand::Variable(VarRef::parse(pair.as_str()))),
        Rule::word => Ok(Operand::Literal(match pair.as_str() {
            "true" => Literal::Bool(true),
            "false" => Literal::Bool(false),
            other => Literal::Text(other.to_string()),
        })),
        rule => Err(SyntaxError::new(format!("unexpected {rule:?}"))),
    }
}

fn build_pipe(pair: Pair<Rule>) -> Result<Pipe, SyntaxError> {
    let mut operands = Vec::new();
    let mut stages = Vec::new();
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::stage {
            let mut parts = inner.into_inner();
            let operator = next_pair(&mut parts, "operator")?.as_str().to_string();
            let args = parts.map(build_operand).collect::<Result<Vec<_>, _>>()?;
            stages.push(Stage { operator, args });
        } else {
            operands.push(build_operand(inner)?);
        }
    }
    Ok(Pipe { operands, stages })
}

fn build_comparator(pair: Pair<Rule>) -> Result<Comparator, SyntaxError> {
    let inner = next_pair(&mut pair.into_inner(), "comparator")?;
    Ok(match inner.as_rule() {
        Rule::op_is => Comparator::Is,
        Rule::op_is_not => Comparator::IsNot,
        Rule::op_contains => Comparator::Contains,
        Rule::op_ge => Comparator::GreaterOrEqual,
        Rule::op_le => Comparator::LessOrEqual,
        Rule::op_gt => Comparator::Greater,
        Rule::op_lt => Comparator::Less,
        rule => return Err(SyntaxError::new(format!("unexpected {rule:?}"))),
    })
}

fn build_bound(pair: Pair<Rule>) -> Result<Operand, SyntaxError> {
    build_operand(next_pair(&mut pair.into_inner(), "bound")?)
}

// ============================================================================
// TEXT HELPERS
// ============================================================================

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn flush(literal: &mut String, segments: &mut Vec<Segment>) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}
