//! Trellis Error Handling - one error type for validation and evaluation
//!
//! Every failure carries the offending node's type, its 1-based source line,
//! and the violated rule. The rendered message is a public contract: hosts and
//! tests match on it, so variant wording changes are breaking changes.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::{Category, Node};

// ============================================================================
// ERROR KINDS
// ============================================================================

/// All violated rules, validation and runtime alike.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    // Type and category errors
    #[error("unknown node type '{name}'")]
    UnknownType { name: String },
    #[error("is a {expected} node but was used as a {found} node")]
    CategoryMismatch { expected: Category, found: Category },
    #[error("only declarations may appear at the top level, found a {category} node")]
    InvalidRoot { category: Category },
    #[error("declarations are only allowed at the top level")]
    DeclarationNotRoot,

    // Data format errors
    #[error("does not accept data, found '{data}'")]
    DataNotAllowed { data: String },
    #[error("missing required {part}")]
    MissingRequiredPart { part: String },
    #[error("accepts at most {max} parts, found {actual}")]
    TooManyParts { max: usize, actual: usize },
    #[error("duplicate value '{value}'")]
    DuplicateParts { value: String },
    #[error("{description}")]
    ConstraintViolation { description: String },
    #[error("invalid {validator} '{value}': {reason}")]
    InvalidValue {
        validator: String,
        value: String,
        reason: String,
    },

    // Children errors
    #[error("requires children but has none")]
    MissingChildren,
    #[error("requires a '{child}' child")]
    MissingRequiredChild { child: String },
    #[error("child type name is blank")]
    BlankChildType,
    #[error("'{child}' is not allowed here (allowed: {})", .allowed.join(", "))]
    WrongChildType { child: String, allowed: Vec<String> },
    #[error("tooManyChildren: at most {max} '{child}' allowed, found {actual}")]
    TooManyChildren {
        child: String,
        max: usize,
        actual: usize,
    },
    #[error("duplicate child '{child}'")]
    DuplicateChild { child: String },
    #[error("{node} without {required}")]
    SiblingRequired { node: String, required: String },
    #[error("breakpoints are only allowed directly under a container or a style declaration, not under '{parent}'")]
    MisplacedBreakpoint { parent: String },

    // Scope errors
    #[error("'{action}' used outside a functional context")]
    ActionOutsideFunctionalContext { action: String },
    #[error("loop variable '${name}' conflicts with state variable '${name}'")]
    LoopVariableConflict { name: String },
    #[error("undeclared variable '${name}'")]
    UndeclaredVariable { name: String },
    #[error("unknown operator '{operator}'")]
    UnknownOperator { operator: String },

    // Runtime errors
    #[error("undefined name '{name}'")]
    UndefinedName { name: String },
    #[error("expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("index {index} out of range for '{list}' (length {len})")]
    IndexOutOfRange { list: String, index: usize, len: usize },
    #[error("'{function}' expects at most {expected} arguments, got {actual}")]
    ArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },
    #[error("call depth exceeded {limit}")]
    RecursionLimit { limit: usize },
    #[error("range exceeds {limit} iterations")]
    IterationLimit { limit: usize },
    #[error("internal error: {message}")]
    Internal { message: String },

    // Configuration
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

/// Coarse grouping used by hosts that only care which family failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Structure,
    Data,
    Children,
    Scope,
    Runtime,
}

impl ErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownType { .. }
            | Self::CategoryMismatch { .. }
            | Self::InvalidRoot { .. }
            | Self::DeclarationNotRoot => ErrorCategory::Structure,

            Self::DataNotAllowed { .. }
            | Self::MissingRequiredPart { .. }
            | Self::TooManyParts { .. }
            | Self::DuplicateParts { .. }
            | Self::ConstraintViolation { .. }
            | Self::InvalidValue { .. } => ErrorCategory::Data,

            Self::MissingChildren
            | Self::MissingRequiredChild { .. }
            | Self::BlankChildType
            | Self::WrongChildType { .. }
            | Self::TooManyChildren { .. }
            | Self::DuplicateChild { .. }
            | Self::SiblingRequired { .. }
            | Self::MisplacedBreakpoint { .. } => ErrorCategory::Children,

            Self::ActionOutsideFunctionalContext { .. }
            | Self::LoopVariableConflict { .. }
            | Self::UndeclaredVariable { .. }
            | Self::UnknownOperator { .. } => ErrorCategory::Scope,

            Self::UndefinedName { .. }
            | Self::TypeMismatch { .. }
            | Self::DivisionByZero
            | Self::IndexOutOfRange { .. }
            | Self::ArityMismatch { .. }
            | Self::RecursionLimit { .. }
            | Self::IterationLimit { .. }
            | Self::Internal { .. }
            | Self::Config { .. } => ErrorCategory::Runtime,
        }
    }

    /// Suffix for diagnostic codes.
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::UnknownType { .. } => "unknown_type",
            Self::CategoryMismatch { .. } => "category_mismatch",
            Self::InvalidRoot { .. } => "invalid_root",
            Self::DeclarationNotRoot => "declaration_not_root",
            Self::DataNotAllowed { .. } => "data_not_allowed",
            Self::MissingRequiredPart { .. } => "missing_required_part",
            Self::TooManyParts { .. } => "too_many_parts",
            Self::DuplicateParts { .. } => "duplicate_parts",
            Self::ConstraintViolation { .. } => "constraint_violation",
            Self::InvalidValue { .. } => "invalid_value",
            Self::MissingChildren => "missing_children",
            Self::MissingRequiredChild { .. } => "missing_required_child",
            Self::BlankChildType => "blank_child_type",
            Self::WrongChildType { .. } => "wrong_child_type",
            Self::TooManyChildren { .. } => "too_many_children",
            Self::DuplicateChild { .. } => "duplicate_child",
            Self::SiblingRequired { .. } => "sibling_required",
            Self::MisplacedBreakpoint { .. } => "misplaced_breakpoint",
            Self::ActionOutsideFunctionalContext { .. } => "action_outside_functional_context",
            Self::LoopVariableConflict { .. } => "loop_variable_conflict",
            Self::UndeclaredVariable { .. } => "undeclared_variable",
            Self::UnknownOperator { .. } => "unknown_operator",
            Self::UndefinedName { .. } => "undefined_name",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::DivisionByZero => "division_by_zero",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::ArityMismatch { .. } => "arity_mismatch",
            Self::RecursionLimit { .. } => "recursion_limit",
            Self::IterationLimit { .. } => "iteration_limit",
            Self::Internal { .. } => "internal",
            Self::Config { .. } => "config",
        }
    }
}

// ============================================================================
// THE ERROR TYPE
// ============================================================================

/// Which stage raised the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validation,
    Runtime,
    Config,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Validation => "validation",
            Phase::Runtime => "runtime",
            Phase::Config => "config",
        }
    }
}

/// The single error type surfaced by validation and evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrellisError {
    pub kind: ErrorKind,
    /// Type name (or key) of the offending node.
    pub node: String,
    /// 1-based source line of the offending node.
    pub line: usize,
    pub phase: Phase,
    pub help: Option<String>,
}

impl TrellisError {
    pub fn new(kind: ErrorKind, node: impl Into<String>, line: usize, phase: Phase) -> Self {
        Self {
            kind,
            node: node.into(),
            line,
            phase,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Diagnostic code, e.g. `trellis::validation::unknown_type`.
    pub fn code(&self) -> String {
        format!("trellis::{}::{}", self.phase.as_str(), self.kind.code_suffix())
    }
}

impl std::error::Error for TrellisError {}

impl fmt::Display for TrellisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: '{}' {}", self.line, self.node, self.kind)
    }
}

impl Diagnostic for TrellisError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(TrellisError::code(self)))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }
}

// ============================================================================
// CONTEXT-AWARE CONSTRUCTION
// ============================================================================

/// Context-aware error creation; the validation context and the runtime each
/// know which phase they report for.
pub trait ErrorReporting {
    fn phase(&self) -> Phase;

    fn report(&self, kind: ErrorKind, node: &Node) -> TrellisError {
        TrellisError::new(kind, node.type_name(), node.line, self.phase())
    }

    fn invalid_value(&self, node: &Node, validator: &str, value: &str, reason: &str) -> TrellisError {
        self.report(
            ErrorKind::InvalidValue {
                validator: validator.into(),
                value: value.into(),
                reason: reason.into(),
            },
            node,
        )
    }

    fn undeclared_variable(&self, node: &Node, name: &str) -> TrellisError {
        self.report(ErrorKind::UndeclaredVariable { name: name.into() }, node)
    }

    fn type_mismatch(&self, node: &Node, expected: &str, actual: &str) -> TrellisError {
        self.report(
            ErrorKind::TypeMismatch {
                expected: expected.into(),
                actual: actual.into(),
            },
            node,
        )
    }

    /// A state the validator should have made impossible. Logged loudly and
    /// surfaced as an error rather than tolerated.
    fn internal_error(&self, node: &Node, message: &str) -> TrellisError {
        log::warn!(
            "internal invariant broken at line {} ('{}'): {}",
            node.line,
            node.type_name(),
            message
        );
        self.report(
            ErrorKind::Internal {
                message: message.into(),
            },
            node,
        )
        .with_help("validation should have rejected this document; please report it as a bug")
    }
}
