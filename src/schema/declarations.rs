//! Top-level declarations. Only these may appear at the root of a document.

use crate::ast::Category;
use crate::schema::{one, opt, DataContract, NodeSchema, Part};

fn declaration(name: &'static str, description: &'static str) -> NodeSchema {
    NodeSchema::new(name, Category::Declaration, description)
}

pub fn schemas() -> Vec<NodeSchema> {
    vec![
        declaration("state", "Declares global state variables and their initial values.")
            .keyed("stateVariable")
            .flags(|f| f.initializes_state = true),
        declaration("list", "Declares a named list of values or records.")
            .data(
                DataContract::first(Part::new("list name", "listName"))
                    .required()
                    .max(1),
            )
            .properties([opt("item"), opt("record")])
            .flags(|f| f.initializes_lists = true),
        declaration("function", "Declares a reusable action sequence with parameters.")
            .data(
                DataContract::first(Part::new("function name", "functionName"))
                    .then_rest(Part::new("parameter", "parameterName"))
                    .required()
                    .no_repeats(),
            )
            .conditionals()
            .any_action()
            .flags(|f| f.provides_functional_context = true),
        declaration("template", "Declares a reusable block tree with parameters.")
            .data(
                DataContract::first(Part::new("template name", "templateName"))
                    .then_rest(Part::new("parameter", "parameterName"))
                    .required()
                    .no_repeats(),
            )
            .container()
            .properties([one("id"), one("apply"), one("styles")])
            .conditionals(),
        declaration("style", "Declares a named style that blocks can apply.")
            .data(
                DataContract::first(Part::new("style name", "styleName"))
                    .required()
                    .max(1),
            )
            .keyed("cssProperty")
            .conditionals()
            .flags(|f| f.styling = true),
        declaration("init", "Actions run once when a session starts.")
            .conditionals()
            .any_action()
            .flags(|f| f.provides_functional_context = true),
        declaration("page", "A routable page of blocks.")
            .data(DataContract::rest(Part::new("title", "text")))
            .container()
            .properties([one("id"), one("apply"), one("styles")])
            .conditionals(),
    ]
}
