//! Properties: attributes of their parent, plus the schemas behind keyed
//! children (`count: 0`, `name: Ada`, `color: red`).

use crate::ast::{Category, Node, ValueShape};
use crate::schema::{opt, DataContract, NodeSchema, Part};

fn property(name: &'static str, description: &'static str) -> NodeSchema {
    NodeSchema::new(name, Category::Property, description)
}

fn keyed_child(name: &'static str, description: &'static str) -> NodeSchema {
    property(name, description).flags(|f| f.child_type = true)
}

fn not_both_data_and_children(node: &Node) -> bool {
    !(node.has_data() && !node.children.is_empty())
}

fn not_mixed_items_and_keys(node: &Node) -> bool {
    if node.value_shape() != ValueShape::Object {
        return true;
    }
    node.children.iter().all(|c| c.is_keyed())
}

pub fn schemas() -> Vec<NodeSchema> {
    vec![
        property("role", "Semantic role; the allowed values depend on the parent.")
            .data(DataContract::first(Part::unchecked("role")).required().max(1)),
        property("id", "Element identifier.")
            .data(DataContract::first(Part::new("id", "identifier")).required().max(1)),
        property("apply", "Applies named styles, in order.")
            .data(
                DataContract::rest(Part::new("style", "styleName"))
                    .required()
                    .no_repeats(),
            ),
        property("styles", "Inline CSS properties.")
            .keyed("cssProperty")
            .conditionals()
            .flags(|f| f.styling = true),
        property("alt", "Alternative text for an image.")
            .data(DataContract::rest(Part::new("text", "text")).required()),
        property("placeholder", "Placeholder text for an input.")
            .data(DataContract::rest(Part::new("text", "text")).required()),
        property("type", "Input type.")
            .data(
                DataContract::first(Part::new("input type", "inputType"))
                    .required()
                    .max(1),
            ),
        property("where", "Selects records by a field comparison.")
            .data(DataContract::rest(Part::new("condition", "whereCondition")).required()),
        property("record", "Field values of a record.").keyed("field"),
        property("item", "One entry of a list or a state array.")
            .data(DataContract::rest(Part::new("value", "valueExpression")).required()),
        keyed_child("stateVariable", "A state variable: scalar, array of items, or object.")
            .data(
                DataContract::rest(Part::new("value", "valueExpression"))
                    .constraint(
                        "a state value cannot have both an inline value and children",
                        not_both_data_and_children,
                    )
                    .constraint(
                        "a state value cannot mix items and named fields",
                        not_mixed_items_and_keys,
                    ),
            )
            .keyed("stateVariable")
            .properties([opt("item")]),
        keyed_child("field", "One field of a record.")
            .data(DataContract::rest(Part::new("value", "valueExpression"))),
        keyed_child("cssProperty", "One CSS declaration.")
            .data(DataContract::rest(Part::unchecked("value")).required()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::{keyed, property as prop};

    #[test]
    fn state_value_constraints() {
        let scalar = keyed("count", "0");
        assert!(not_both_data_and_children(&scalar));

        let both = keyed("count", "0").with_children(vec![prop("item", "1")]);
        assert!(!not_both_data_and_children(&both));

        let mixed = keyed("user", "").with_children(vec![keyed("name", "Ada"), prop("item", "x")]);
        assert!(!not_mixed_items_and_keys(&mixed));
    }
}
