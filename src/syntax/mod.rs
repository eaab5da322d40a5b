//! Sub-grammars for node data: value expressions, pipes, conditions,
//! where clauses, loop/range/index bindings, breakpoint references and
//! text interpolation.

pub mod expr;
pub mod parser;

pub use expr::*;
pub use parser::{
    parse_breakpoint, parse_condition, parse_expression, parse_index_binding,
    parse_loop_binding, parse_range_binding, parse_text, parse_where, SyntaxError,
};
