//! Blocks: the UI tree and its event handlers.

use crate::ast::Category;
use crate::schema::{one, req, ChildRule, DataContract, NodeSchema, Part};

fn block(name: &'static str, description: &'static str) -> NodeSchema {
    NodeSchema::new(name, Category::Block, description)
}

fn presentation() -> [ChildRule; 3] {
    [one("id"), one("apply"), one("styles")]
}

fn container_child(name: &'static str, description: &'static str) -> NodeSchema {
    block(name, description).flags(|f| f.container_child = true)
}

fn handler(name: &'static str, description: &'static str) -> NodeSchema {
    block(name, description)
        .conditionals()
        .any_action()
        .flags(|f| {
            f.provides_functional_context = true;
            f.skips_rendering_in_loops = true;
        })
}

pub fn schemas() -> Vec<NodeSchema> {
    vec![
        container_child("box", "Generic layout container.")
            .container()
            .properties([one("role")])
            .properties(presentation())
            .conditionals(),
        container_child("text", "A run of text with interpolation.")
            .data(DataContract::rest(Part::new("text", "text")).required())
            .properties(presentation())
            .conditionals(),
        container_child("heading", "Heading with a level (h1-h6) and text.")
            .data(
                DataContract::first(Part::new("level", "headingLevel"))
                    .then_rest(Part::new("text", "text"))
                    .required()
                    .min(2),
            )
            .properties(presentation())
            .conditionals(),
        container_child("button", "A clickable button.")
            .data(DataContract::rest(Part::new("label", "text")).required())
            .blocks([one("onClick")])
            .properties(presentation())
            .conditionals(),
        container_child("link", "A hyperlink.")
            .data(
                DataContract::first(Part::new("url", "url"))
                    .then_rest(Part::new("text", "text"))
                    .required(),
            )
            .blocks([one("onClick")])
            .properties(presentation())
            .conditionals(),
        container_child("image", "An image.")
            .data(DataContract::first(Part::new("url", "url")).required().max(1))
            .properties([one("alt")])
            .properties(presentation()),
        container_child("input", "A form field bound by name.")
            .data(
                DataContract::first(Part::new("field name", "identifier"))
                    .required()
                    .max(1),
            )
            .blocks([one("onChange")])
            .properties([one("placeholder"), one("type")])
            .properties(presentation()),
        container_child("form", "Groups inputs; exposes their values as $form.")
            .data(
                DataContract::first(Part::new("form name", "identifier"))
                    .required()
                    .max(1),
            )
            .container()
            .blocks([one("onSubmit")])
            .properties(presentation())
            .conditionals(),
        container_child("each", "Repeats its children for every entry of a list.")
            .data(DataContract::rest(Part::new("binding", "loopBinding")).required())
            .container()
            .conditionals()
            .flags(|f| {
                f.manages_loop_variables = true;
                f.check_variable_conflicts = true;
            }),
        container_child("range", "Repeats its children over a numeric range.")
            .data(DataContract::rest(Part::new("binding", "rangeBinding")).required())
            .container()
            .conditionals()
            .flags(|f| {
                f.manages_loop_variables = true;
                f.check_variable_conflicts = true;
            }),
        container_child("use", "Instantiates a template with arguments.")
            .data(
                DataContract::first(Part::new("template", "templateReference"))
                    .then_rest(Part::new("argument", "valueExpression"))
                    .required(),
            ),
        container_child("table", "A table of rows.")
            .blocks([req("row")])
            .properties(presentation()),
        container_child("divider", "A horizontal rule."),
        container_child("spacer", "Blank space, optionally sized.")
            .data(DataContract::first(Part::new("size", "number")).max(1)),
        block("row", "A table row.")
            .blocks([req("cell")])
            .properties([one("role"), one("apply"), one("styles")]),
        block("cell", "A table cell.")
            .data(DataContract::rest(Part::new("text", "text")))
            .container()
            .properties(presentation())
            .conditionals(),
        handler("onClick", "Runs its actions when the parent is clicked."),
        handler("onSubmit", "Runs its actions when the parent form is submitted."),
        handler("onChange", "Runs its actions when the parent input changes."),
    ]
}
