//! # Pipe Operators
//!
//! The operations a pipe stage may name. All are pure functions over
//! values; the evaluator attaches node and line to any failure.
//!
//! ## Operators Provided
//!
//! - **Arithmetic**: `add`, `subtract`, `multiply`, `divide`, `modulo`, `round`, `min`, `max`
//! - **Text**: `concat`, `uppercase`, `lowercase`, `length`

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::errors::ErrorKind;
use crate::runtime::value::Value;

pub type OperatorFn = fn(args: &[Value]) -> Result<Value, ErrorKind>;

// ============================================================================
// HELPERS
// ============================================================================

fn extract_number(value: &Value) -> Result<f64, ErrorKind> {
    value.as_number().ok_or_else(|| ErrorKind::TypeMismatch {
        expected: "a number".into(),
        actual: format!("{} '{}'", value.type_name(), value),
    })
}

fn numbers(args: &[Value]) -> Result<Vec<f64>, ErrorKind> {
    args.iter().map(extract_number).collect()
}

fn at_least(args: &[Value], count: usize, operator: &str) -> Result<(), ErrorKind> {
    if args.len() < count {
        return Err(ErrorKind::TypeMismatch {
            expected: format!("at least {count} operands for '{operator}'"),
            actual: args.len().to_string(),
        });
    }
    Ok(())
}

fn fold(args: &[Value], operator: &str, step: fn(f64, f64) -> Result<f64, ErrorKind>) -> Result<Value, ErrorKind> {
    at_least(args, 1, operator)?;
    let nums = numbers(args)?;
    let mut result = nums[0];
    for n in &nums[1..] {
        result = step(result, *n)?;
    }
    Ok(Value::Number(result))
}

// ============================================================================
// ARITHMETIC
// ============================================================================

/// Sums numbers; joins the operands as text if any is not a number.
///
/// Usage: `(2 3 | add)` => 5, `("a" 1 | add)` => "a1"
pub const OP_ADD: OperatorFn = |args| {
    if !args.is_empty() && args.iter().all(|a| a.as_number().is_some()) {
        Ok(Value::Number(numbers(args)?.iter().sum()))
    } else {
        OP_CONCAT(args)
    }
};

/// Usage: `(10 3 | subtract)` => 7
pub const OP_SUBTRACT: OperatorFn = |args| fold(args, "subtract", |a, b| Ok(a - b));

/// Usage: `($price $qty | multiply)`
pub const OP_MULTIPLY: OperatorFn = |args| fold(args, "multiply", |a, b| Ok(a * b));

/// Usage: `(10 4 | divide)` => 2.5; dividing by zero is an error.
pub const OP_DIVIDE: OperatorFn = |args| {
    fold(args, "divide", |a, b| {
        if b == 0.0 {
            Err(ErrorKind::DivisionByZero)
        } else {
            Ok(a / b)
        }
    })
};

/// Usage: `(10 3 | modulo)` => 1
pub const OP_MODULO: OperatorFn = |args| {
    fold(args, "modulo", |a, b| {
        if b == 0.0 {
            Err(ErrorKind::DivisionByZero)
        } else {
            Ok(a % b)
        }
    })
};

/// Rounds to a whole number, or to the given number of decimals.
///
/// Usage: `(2.345 | round 2)` => 2.35
pub const OP_ROUND: OperatorFn = |args| {
    at_least(args, 1, "round")?;
    let value = extract_number(&args[0])?;
    let digits = match args.get(1) {
        Some(d) => extract_number(d)?.max(0.0) as i32,
        None => 0,
    };
    let factor = 10f64.powi(digits);
    Ok(Value::Number((value * factor).round() / factor))
};

pub const OP_MIN: OperatorFn = |args| fold(args, "min", |a, b| Ok(a.min(b)));

pub const OP_MAX: OperatorFn = |args| fold(args, "max", |a, b| Ok(a.max(b)));

// ============================================================================
// TEXT
// ============================================================================

/// Joins the rendering of every operand.
///
/// Usage: `("Hello, " $name | concat)`
pub const OP_CONCAT: OperatorFn = |args| Ok(Value::Text(args.iter().map(|a| a.to_string()).collect()));

pub const OP_UPPERCASE: OperatorFn = |args| {
    let text: String = OP_CONCAT(args)?.to_string();
    Ok(Value::Text(text.to_uppercase()))
};

pub const OP_LOWERCASE: OperatorFn = |args| {
    let text: String = OP_CONCAT(args)?.to_string();
    Ok(Value::Text(text.to_lowercase()))
};

/// Items in a list, or characters in text.
///
/// Usage: `($todos | length)`
pub const OP_LENGTH: OperatorFn = |args| {
    let count = match args {
        [Value::List(items)] => items.len(),
        [Value::Empty] => 0,
        _ => OP_CONCAT(args)?.to_string().chars().count(),
    };
    Ok(Value::Number(count as f64))
};

// ============================================================================
// REGISTRY
// ============================================================================

static OPERATORS: Lazy<HashMap<&'static str, OperatorFn>> = Lazy::new(|| {
    HashMap::from([
        ("add", OP_ADD),
        ("subtract", OP_SUBTRACT),
        ("multiply", OP_MULTIPLY),
        ("divide", OP_DIVIDE),
        ("modulo", OP_MODULO),
        ("round", OP_ROUND),
        ("min", OP_MIN),
        ("max", OP_MAX),
        ("concat", OP_CONCAT),
        ("uppercase", OP_UPPERCASE),
        ("lowercase", OP_LOWERCASE),
        ("length", OP_LENGTH),
    ])
});

pub fn get(name: &str) -> Option<OperatorFn> {
    OPERATORS.get(name).copied()
}

pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = OPERATORS.keys().copied().collect();
    names.sort_unstable();
    names
}
