//! Rules that sit outside the generic contract: roles checked against the
//! parent's closed set, conditional children checked against their host,
//! and breakpoint placement.

use crate::ast::{Category, Node};
use crate::errors::{ErrorKind, ErrorReporting, TrellisError};
use crate::schema::NodeSchema;
use crate::validation::datatypes::enums;
use crate::validation::ValidationContext;

/// The schema whose contract a node's children are checked against.
///
/// Conditionals borrow their host's contract. Under a styling host
/// (`style`, `styles`) only properties and further conditionals may appear.
#[derive(Debug, Clone, Copy)]
pub enum Host {
    Block(&'static NodeSchema),
    Property(&'static NodeSchema),
}

impl Host {
    pub fn of(schema: &'static NodeSchema) -> Self {
        if schema.flags.styling {
            Host::Property(schema)
        } else {
            Host::Block(schema)
        }
    }

    pub fn schema(&self) -> &'static NodeSchema {
        match self {
            Host::Block(s) | Host::Property(s) => s,
        }
    }

    /// Every child type the host accepts, for error messages.
    pub fn allowed_children(&self) -> Vec<String> {
        let schema = self.schema();
        let mut allowed: Vec<String> = Vec::new();
        if let Host::Block(s) = self {
            allowed.extend(s.effective_blocks().into_iter().map(String::from));
        }
        allowed.extend(schema.allowed_properties().into_iter().map(String::from));
        if let Some(keyed) = schema.properties.keyed {
            allowed.push(format!("<{keyed}>"));
        }
        if schema.conditionals_allowed {
            allowed.extend(["if", "else", "breakpoint"].map(String::from));
        }
        if let Host::Block(s) = self {
            if s.actions.allow_any {
                allowed.push("<any action>".into());
            } else {
                allowed.extend(s.actions.list.iter().map(|a| a.to_string()));
            }
        }
        allowed
    }
}

impl ValidationContext {
    /// The host for `node`'s children: the node itself, or for a
    /// conditional the nearest non-conditional ancestor.
    pub fn host_for(&self, node: &Node, schema: &'static NodeSchema) -> Result<Host, TrellisError> {
        if node.category != Category::Conditional {
            return Ok(Host::of(schema));
        }
        self.ancestors()
            .map(|f| f.schema)
            .find(|s| s.category != Category::Conditional)
            .map(Host::of)
            .ok_or_else(|| self.internal_error(node, "conditional without a host"))
    }

    /// Breakpoints sit directly under a container or a `style` declaration.
    pub fn check_breakpoint(&self, parent: &Node, parent_schema: &NodeSchema, child: &Node) -> Result<(), TrellisError> {
        if parent_schema.blocks.container_parent || parent_schema.name == "style" {
            Ok(())
        } else {
            Err(self.report(
                ErrorKind::MisplacedBreakpoint {
                    parent: parent.type_name().into(),
                },
                child,
            ))
        }
    }

    /// `role` takes its allowed values from the block it describes.
    pub fn check_special(&self, host: &Host, child: &Node) -> Result<(), TrellisError> {
        if child.is_keyed() || child.type_name() != "role" || !child.has_data() {
            return Ok(());
        }
        let value = child.data.trim();
        match host.schema().name {
            "box" => enums::box_role(value, child, Some(self)),
            "row" => enums::row_role(value, child, Some(self)),
            _ => Ok(()),
        }
    }
}
