//! Data-contract checks: presence, part counts, per-part validators,
//! repeats and custom constraints.

use std::collections::HashSet;

use crate::ast::Node;
use crate::errors::{ErrorKind, ErrorReporting, TrellisError};
use crate::schema::{DataContract, Format, NodeSchema, Part, Separator};
use crate::validation::datatypes;
use crate::validation::ValidationContext;

impl ValidationContext {
    pub fn validate_data(&self, node: &Node, schema: &NodeSchema) -> Result<(), TrellisError> {
        let contract = &schema.data;
        let raw = node.data.trim();

        if raw.is_empty() {
            if contract.required {
                return Err(self.report(
                    ErrorKind::MissingRequiredPart {
                        part: contract.part_name(0).into(),
                    },
                    node,
                ));
            }
        } else {
            if !contract.allowed {
                return Err(self.report(ErrorKind::DataNotAllowed { data: raw.into() }, node));
            }
            let parts = contract.separator.split(raw);
            self.check_counts(node, contract, &parts)?;
            if let Some(format) = &contract.format {
                self.check_format(node, contract, format, raw, &parts)?;
            }
            if contract.no_repeats {
                self.check_repeats(node, contract, &parts)?;
            }
        }

        for constraint in &contract.constraints {
            if !(constraint.check)(node) {
                return Err(self.report(
                    ErrorKind::ConstraintViolation {
                        description: constraint.description.into(),
                    },
                    node,
                ));
            }
        }
        Ok(())
    }

    fn check_counts(&self, node: &Node, contract: &DataContract, parts: &[&str]) -> Result<(), TrellisError> {
        if parts.len() < contract.min {
            return Err(self.report(
                ErrorKind::MissingRequiredPart {
                    part: contract.part_name(parts.len()).into(),
                },
                node,
            ));
        }
        match contract.max {
            Some(max) if parts.len() > max => Err(self.report(
                ErrorKind::TooManyParts {
                    max,
                    actual: parts.len(),
                },
                node,
            )),
            _ => Ok(()),
        }
    }

    fn check_format(
        &self,
        node: &Node,
        contract: &DataContract,
        format: &Format,
        raw: &str,
        parts: &[&str],
    ) -> Result<(), TrellisError> {
        match format {
            Format::Ordered(list) => {
                for (part, value) in list.iter().zip(parts) {
                    self.run_validator(node, part, value)?;
                }
            }
            Format::Positional {
                first,
                second,
                rest,
            } => {
                let mut index = 0;
                for slot in [first, second].into_iter().flatten() {
                    if let Some(value) = parts.get(index) {
                        self.run_validator(node, slot, value)?;
                    }
                    index += 1;
                }
                if let Some(rest) = rest {
                    self.check_rest(node, contract.separator, rest, raw, parts, index)?;
                }
            }
        }
        Ok(())
    }

    fn check_rest(
        &self,
        node: &Node,
        separator: Separator,
        rest: &Part,
        raw: &str,
        parts: &[&str],
        skip: usize,
    ) -> Result<(), TrellisError> {
        let remaining = parts.get(skip..).unwrap_or_default();
        if remaining.is_empty() {
            return Ok(());
        }
        let multi_part = rest
            .validator
            .and_then(datatypes::get)
            .is_some_and(|v| v.multi_part);
        if multi_part {
            let joined = separator.tail(raw, skip);
            self.run_validator(node, rest, &joined)
        } else {
            remaining
                .iter()
                .try_for_each(|value| self.run_validator(node, rest, value))
        }
    }

    fn run_validator(&self, node: &Node, part: &Part, value: &str) -> Result<(), TrellisError> {
        let Some(name) = part.validator else {
            return Ok(());
        };
        match datatypes::get(name) {
            Some(validator) => (validator.check)(value, node, Some(self)),
            None => Err(self.internal_error(node, &format!("no data-type validator named '{name}'"))),
        }
    }

    fn check_repeats(&self, node: &Node, contract: &DataContract, parts: &[&str]) -> Result<(), TrellisError> {
        let skip = match &contract.format {
            Some(Format::Positional { first, second, .. }) => {
                usize::from(first.is_some()) + usize::from(second.is_some())
            }
            _ => 0,
        };
        let mut seen = HashSet::new();
        for value in parts.iter().skip(skip) {
            if !seen.insert(*value) {
                return Err(self.report(
                    ErrorKind::DuplicateParts {
                        value: value.to_string(),
                    },
                    node,
                ));
            }
        }
        Ok(())
    }
}
