//! Actions. Legal only beneath a node that provides a functional context.

use crate::ast::Category;
use crate::schema::{req, DataContract, NodeSchema, Part};

fn action(name: &'static str, description: &'static str) -> NodeSchema {
    NodeSchema::new(name, Category::Action, description)
        .flags(|f| f.requires_functional_context = true)
}

fn list_name() -> Part {
    Part::new("list name", "listName")
}

fn binds_name(schema: NodeSchema) -> NodeSchema {
    schema.flags(|f| {
        f.updates_loop_variables = true;
        f.check_variable_conflicts = true;
    })
}

pub fn schemas() -> Vec<NodeSchema> {
    vec![
        action("set", "Assigns the value of an expression to a state variable.").data(
            DataContract::first(Part::new("variable", "variableName"))
                .then_rest(Part::new("value", "valueExpression"))
                .required()
                .min(2),
        ),
        action("clear", "Resets a state variable or form field to empty.").data(
            DataContract::first(Part::new("variable", "variableName"))
                .required()
                .max(1),
        ),
        action("call", "Runs a function with positional arguments.").data(
            DataContract::first(Part::new("function", "functionReference"))
                .then_rest(Part::new("argument", "valueExpression"))
                .required(),
        ),
        action("addValue", "Appends a value to a list.").data(
            DataContract::first(list_name())
                .then_rest(Part::new("value", "valueExpression"))
                .required()
                .min(2),
        ),
        action("addRecord", "Appends a new record to a list.")
            .data(DataContract::first(list_name()).required().max(1))
            .properties([req("record").at_most(1)]),
        action("removeValue", "Removes every entry equal to a value.").data(
            DataContract::first(list_name())
                .then_rest(Part::new("value", "valueExpression"))
                .required()
                .min(2),
        ),
        action("removeRecord", "Removes the record bound to a variable.").data(
            DataContract::ordered(vec![
                list_name(),
                Part::new("record", "variableReference"),
            ])
            .required()
            .min(2),
        ),
        action("updateValue", "Replaces the first entry equal to a match value.").data(
            DataContract::first(list_name())
                .then(Part::new("match", "valueExpression"))
                .then_rest(Part::new("replacement", "valueExpression"))
                .required()
                .min(3)
                .max(3)
                .comma_separated(),
        ),
        action("updateRecord", "Merges fields into every record matching a where clause.")
            .data(DataContract::first(list_name()).required().max(1))
            .properties([req("where").at_most(1), req("record").at_most(1)]),
        action("setValue", "Overwrites the entry at an index.").data(
            DataContract::first(list_name())
                .then(Part::new("index", "indexExpression"))
                .then_rest(Part::new("value", "valueExpression"))
                .required()
                .min(3),
        ),
        action("setRecord", "Overwrites the record at an index.")
            .data(
                DataContract::first(list_name())
                    .then(Part::new("index", "indexExpression"))
                    .required()
                    .min(2)
                    .max(2),
            )
            .properties([req("record").at_most(1)]),
        binds_name(action("getValue", "Binds the entry at an index for later actions.")).data(
            DataContract::first(list_name())
                .then_rest(Part::new("binding", "indexBinding"))
                .required()
                .min(2),
        ),
        binds_name(action("getRecord", "Binds the record at an index for later actions.")).data(
            DataContract::first(list_name())
                .then_rest(Part::new("binding", "indexBinding"))
                .required()
                .min(2),
        ),
        action("window", "Asks the host to scroll, navigate or print.").data(
            DataContract::first(Part::new("operation", "windowOperation"))
                .required()
                .max(1),
        ),
    ]
}
