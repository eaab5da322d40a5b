//! # Trellis
//!
//! Schema-driven validator and runtime for a declarative markup language
//! that describes stateful, interactive user interfaces as trees of typed
//! nodes.
//!
//! An external line parser produces the [`ast::Node`] tree; an external
//! renderer draws it. Between the two, this crate decides whether a tree is
//! a well-formed program ([`validation`]) and gives it behavior
//! ([`runtime`]).
//!
//! ## Module Structure
//!
//! - **`ast`**: the node tree and hand builders
//! - **`schema`**: the per-node-type contracts
//! - **`syntax`**: sub-grammars for node data
//! - **`scope`**: frame kinds shared by validator and runtime
//! - **`validation`**: the structural and semantic validator
//! - **`runtime`**: store, evaluator, actions and the session
//! - **`errors`**, **`config`**, **`logging`**: ambient concerns

pub use crate::config::EngineOptions;
pub use crate::errors::{ErrorKind, ErrorReporting, Phase, TrellisError};
pub use crate::runtime::{RenderSink, Scope, Session, Value, WindowHost};
pub use crate::validation::{validate_document, validate_document_with, ValidationContext};

pub mod ast;
pub mod config;
pub mod errors;
pub mod logging;
pub mod runtime;
pub mod schema;
pub mod scope;
pub mod syntax;
pub mod validation;
