//! Conditionals. Their children are checked against the nearest
//! non-conditional ancestor, so these schemas carry no child lists.

use crate::ast::Category;
use crate::schema::{DataContract, NodeSchema, Part};

fn conditional(name: &'static str, description: &'static str) -> NodeSchema {
    NodeSchema::new(name, Category::Conditional, description).conditionals()
}

pub fn schemas() -> Vec<NodeSchema> {
    vec![
        conditional("if", "Keeps its children only while the condition holds.")
            .data(DataContract::rest(Part::new("condition", "ifCondition")).required()),
        conditional("else", "Keeps its children while the preceding if does not hold.")
            .flags(|f| f.requires_sibling = Some("if")),
        conditional("breakpoint", "Keeps its children at matching viewport widths.")
            .data(
                DataContract::rest(Part::new("breakpoint", "breakpointReference")).required(),
            ),
    ]
}
