//! The recursive walk: schema lookup, children cardinality, placement by
//! category, sibling requirements and scope frames.

use std::collections::{HashMap, HashSet};

use crate::ast::{Category, Node};
use crate::errors::{ErrorKind, ErrorReporting, TrellisError};
use crate::schema::{self, NodeSchema};
use crate::validation::context::Frame;
use crate::validation::datatypes::identifiers::is_identifier;
use crate::validation::special::Host;
use crate::validation::ValidationContext;

impl ValidationContext {
    /// Validates every root of a document. Roots must be declarations.
    pub fn validate_roots(&mut self, nodes: &[Node]) -> Result<(), TrellisError> {
        for node in nodes {
            if node.category != Category::Declaration {
                return Err(self.report(
                    ErrorKind::InvalidRoot {
                        category: node.category,
                    },
                    node,
                ));
            }
            let schema = self.lookup(node, None)?;
            self.scoped(Frame::for_node(node, schema), |ctx| ctx.validate_node(node, schema))?;
        }
        Ok(())
    }

    /// Resolves a node's schema, checking it exists and agrees on category.
    pub fn lookup(&self, node: &Node, parent: Option<&NodeSchema>) -> Result<&'static NodeSchema, TrellisError> {
        if node.is_keyed() && !is_identifier(node.type_name()) {
            return Err(self.invalid_value(
                node,
                "key",
                node.type_name(),
                "keys must start with a letter and contain only letters, digits, '_' or '-'",
            ));
        }
        let schema = schema::for_node(node, parent).ok_or_else(|| {
            self.report(
                ErrorKind::UnknownType {
                    name: node.type_name().into(),
                },
                node,
            )
        })?;
        if schema.category != node.category {
            return Err(self.report(
                ErrorKind::CategoryMismatch {
                    expected: schema.category,
                    found: node.category,
                },
                node,
            ));
        }
        Ok(schema)
    }

    /// Validates one node whose frame is already on top of the stack.
    pub fn validate_node(&mut self, node: &Node, schema: &'static NodeSchema) -> Result<(), TrellisError> {
        log::trace!("validating '{}' at line {}", node.type_name(), node.line);
        self.validate_data(node, schema)?;
        if schema.flags.manages_loop_variables && schema.flags.check_variable_conflicts {
            let names = self.current().map(|f| f.names.clone()).unwrap_or_default();
            self.check_conflicts(node, &names)?;
        }
        self.validate_children(node, schema)
    }

    fn check_conflicts(&self, node: &Node, names: &[String]) -> Result<(), TrellisError> {
        match names.iter().find(|n| self.declares_state(n)) {
            Some(name) => Err(self.report(ErrorKind::LoopVariableConflict { name: name.clone() }, node)),
            None => Ok(()),
        }
    }

    fn validate_children(&mut self, node: &Node, schema: &'static NodeSchema) -> Result<(), TrellisError> {
        let host = self.host_for(node, schema)?;

        if node.category != Category::Conditional {
            self.check_required_children(node, schema)?;
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for (index, child) in node.children.iter().enumerate() {
            if child.type_name().trim().is_empty() {
                return Err(self.report(ErrorKind::BlankChildType, child));
            }
            let child_schema = self.lookup(child, Some(host.schema()))?;
            self.check_placement(node, schema, &host, child, child_schema)?;
            self.check_cardinality(node, &host, child, &mut counts, &mut seen)?;
            self.check_sibling(node, index, child, child_schema)?;
            self.check_special(&host, child)?;

            self.scoped(Frame::for_node(child, child_schema), |ctx| {
                ctx.validate_node(child, child_schema)
            })?;

            if child_schema.flags.updates_loop_variables {
                self.bind_sibling(child, child_schema)?;
            }
        }
        Ok(())
    }

    fn check_required_children(&self, node: &Node, schema: &NodeSchema) -> Result<(), TrellisError> {
        let mut required = schema.required_children().peekable();
        if required.peek().is_some() && node.children.is_empty() {
            return Err(self.report(ErrorKind::MissingChildren, node));
        }
        for name in required {
            if node.child(name).is_none() {
                return Err(self.report(ErrorKind::MissingRequiredChild { child: name.into() }, node));
            }
        }
        Ok(())
    }

    /// Whether `child` may sit under `node`, dispatched on its category.
    fn check_placement(
        &self,
        node: &Node,
        schema: &NodeSchema,
        host: &Host,
        child: &Node,
        child_schema: &NodeSchema,
    ) -> Result<(), TrellisError> {
        match child.category {
            Category::Declaration => Err(self.report(ErrorKind::DeclarationNotRoot, child)),
            Category::Conditional => {
                if child.type_name() == "breakpoint" {
                    self.check_breakpoint(node, schema, child)?;
                }
                let host_schema = host.schema();
                if host_schema.conditionals_allowed || host_schema.allows_block(child.type_name()) {
                    Ok(())
                } else {
                    Err(self.wrong_child(node, child, host.allowed_children()))
                }
            }
            Category::Block => match host {
                Host::Block(host_schema) if host_schema.allows_block(child.type_name()) => Ok(()),
                _ => Err(self.wrong_child(node, child, host.allowed_children())),
            },
            Category::Property => {
                let host_schema = host.schema();
                let allowed = if child.is_keyed() {
                    host_schema.properties.keyed.is_some()
                } else {
                    host_schema.properties.any || host_schema.property_rule(child.type_name()).is_some()
                };
                if allowed {
                    Ok(())
                } else {
                    Err(self.wrong_child(node, child, host.allowed_children()))
                }
            }
            Category::Action => self.check_action(node, host, child, child_schema),
        }
    }

    fn check_action(
        &self,
        node: &Node,
        host: &Host,
        child: &Node,
        child_schema: &NodeSchema,
    ) -> Result<(), TrellisError> {
        if child_schema.flags.requires_functional_context && !self.in_functional_context() {
            return Err(self.report(
                ErrorKind::ActionOutsideFunctionalContext {
                    action: child.type_name().into(),
                },
                child,
            ));
        }
        if let Host::Property(_) = host {
            return Err(self.wrong_child(node, child, host.allowed_children()));
        }
        let permitting = self
            .stack
            .iter()
            .rev()
            .map(|f| f.schema)
            .find(|s| s.actions.permits_actions());
        match permitting {
            Some(s) if s.actions.allows(child.type_name()) => Ok(()),
            Some(s) => Err(self.wrong_child(node, child, s.actions.list.iter().map(|a| a.to_string()).collect())),
            None => Err(self.report(
                ErrorKind::ActionOutsideFunctionalContext {
                    action: child.type_name().into(),
                },
                child,
            )),
        }
    }

    fn check_cardinality<'n>(
        &self,
        node: &Node,
        host: &Host,
        child: &'n Node,
        counts: &mut HashMap<&'n str, usize>,
        seen: &mut HashSet<&'n str>,
    ) -> Result<(), TrellisError> {
        let host_schema = host.schema();
        let name = child.type_name();
        let (rule, no_repeats) = match child.category {
            Category::Block => (host_schema.block_rule(name), host_schema.blocks.no_repeats),
            Category::Property => (
                host_schema.property_rule(name),
                host_schema.properties.no_repeats || child.is_keyed(),
            ),
            _ => (None, false),
        };

        if let Some(max) = rule.and_then(|r| r.max) {
            let count = counts.entry(name).or_insert(0);
            *count += 1;
            if *count > max {
                return Err(self.report(
                    ErrorKind::TooManyChildren {
                        child: name.into(),
                        max,
                        actual: *count,
                    },
                    node,
                ));
            }
        }
        if no_repeats && !seen.insert(name) {
            return Err(self.report(ErrorKind::DuplicateChild { child: name.into() }, node));
        }
        Ok(())
    }

    /// A `requiresSibling` node must directly follow a sibling of that type.
    fn check_sibling(
        &self,
        node: &Node,
        index: usize,
        child: &Node,
        child_schema: &NodeSchema,
    ) -> Result<(), TrellisError> {
        let Some(required) = child_schema.flags.requires_sibling else {
            return Ok(());
        };
        let previous = index.checked_sub(1).and_then(|i| node.children.get(i));
        let satisfied = previous.is_some_and(|p| !p.is_keyed() && p.type_name() == required);
        if satisfied {
            Ok(())
        } else {
            Err(self.report(
                ErrorKind::SiblingRequired {
                    node: child.type_name().into(),
                    required: required.into(),
                },
                child,
            ))
        }
    }

    /// Records a `getValue`/`getRecord` binding on the enclosing frame so
    /// later siblings can see it.
    fn bind_sibling(&mut self, child: &Node, child_schema: &NodeSchema) -> Result<(), TrellisError> {
        let binding = crate::syntax::parse_index_binding(&crate::schema::Separator::Space.tail(&child.data, 1))
            .map_err(|e| self.invalid_value(child, "indexBinding", &child.data, &e.message))?;
        if child_schema.flags.check_variable_conflicts {
            self.check_conflicts(child, std::slice::from_ref(&binding.name))?;
        }
        match self.current_mut() {
            Some(frame) => {
                frame.sibling_bindings.push(binding.name);
                Ok(())
            }
            None => Err(self.internal_error(child, "sibling binding without an enclosing frame")),
        }
    }

    fn wrong_child(&self, node: &Node, child: &Node, allowed: Vec<String>) -> TrellisError {
        let mut error = self.report(
            ErrorKind::WrongChildType {
                child: child.type_name().into(),
                allowed,
            },
            node,
        );
        error.line = child.line;
        error
    }
}
