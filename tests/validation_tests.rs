//! Validator behavior over whole documents.

mod common;

use common::{doc, minimal, node_at, node_at_mut, preamble, PAGE};
use trellis::ast::builder::{action, block, conditional, declaration, keyed, property};
use trellis::ast::{Category, Node};
use trellis::errors::ErrorKind;
use trellis::schema;
use trellis::validation::{validate_document, validate_document_with, ValidationContext};

fn page(children: Vec<Node>) -> Vec<Node> {
    doc(vec![
        declaration("state", "").with_children(vec![keyed("todo", "\"\""), keyed("count", "0")]),
        declaration("list", "todos"),
        declaration("page", "Home").with_children(children),
    ])
}

// ============================================================================
// SCHEMA SELF-CONSISTENCY
// ============================================================================

#[test]
fn every_schema_has_a_valid_minimal_example() {
    common::init_test_logging();
    for schema in schema::all() {
        let (nodes, path) = minimal(schema.name);
        let target = node_at(&nodes, &path);
        let declared = schema::get(target.type_name()).map(|s| s.name);
        // Keyed examples are found by the key, so check through the parent.
        if !target.is_keyed() {
            assert_eq!(declared, Some(schema.name), "example path for {} is wrong", schema.name);
        }
        if let Err(e) = validate_document(&nodes) {
            panic!("minimal example for '{}' failed: {e}", schema.name);
        }
    }
}

#[test]
fn data_on_a_data_free_type_is_rejected_at_its_line() {
    for schema in schema::all().into_iter().filter(|s| !s.data.allowed) {
        let (mut nodes, path) = minimal(schema.name);
        node_at_mut(&mut nodes, &path).data = "surplus".into();
        let target = node_at(&nodes, &path);

        let err = validate_document(&nodes).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::DataNotAllowed {
                data: "surplus".into()
            },
            "{}",
            schema.name
        );
        assert_eq!(err.line, target.line, "{}", schema.name);
        assert_eq!(err.node, target.type_name());
    }
}

// ============================================================================
// STRUCTURE
// ============================================================================

#[test]
fn roots_must_be_declarations() {
    let nodes = doc(vec![block("text", "stray")]);
    let err = validate_document(&nodes).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::InvalidRoot {
            category: Category::Block
        }
    );
}

#[test]
fn declarations_cannot_nest() {
    let nodes = page(vec![declaration("style", "inner")]);
    let err = validate_document(&nodes).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DeclarationNotRoot);
    assert_eq!(err.line, 6);
}

#[test]
fn unknown_types_and_wrong_categories() {
    let err = validate_document(&page(vec![block("carousel", "")])).unwrap_err();
    assert_eq!(err.to_string(), "line 6: 'carousel' unknown node type 'carousel'");

    let err = validate_document(&page(vec![property("text", "hi")])).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::CategoryMismatch {
            expected: Category::Block,
            found: Category::Property
        }
    );
}

#[test]
fn too_many_children_cites_max_and_actual() {
    let button = block("button", "Go").with_children(vec![block("onClick", ""), block("onClick", "")]);
    let err = validate_document(&page(vec![button])).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::TooManyChildren {
            child: "onClick".into(),
            max: 1,
            actual: 2
        }
    );
    assert_eq!(err.node, "button");
    assert!(err.to_string().contains("tooManyChildren"));
}

#[test]
fn keyed_children_may_not_repeat() {
    let nodes = doc(vec![declaration("style", "primary")
        .with_children(vec![keyed("color", "red"), keyed("color", "blue")])]);
    let err = validate_document(&nodes).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateChild { child: "color".into() });
}

#[test]
fn required_children_are_enforced() {
    let err = validate_document(&page(vec![block("table", "")])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingChildren);

    let table = block("table", "").with_children(vec![property("id", "grid")]);
    let err = validate_document(&page(vec![table])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingRequiredChild { child: "row".into() });
}

#[test]
fn wrong_child_lists_what_is_allowed() {
    let image = block("image", "/cat.png").with_children(vec![block("text", "caption")]);
    let err = validate_document(&page(vec![image])).unwrap_err();
    match err.kind {
        ErrorKind::WrongChildType { child, allowed } => {
            assert_eq!(child, "text");
            assert!(allowed.contains(&"alt".to_string()));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(err.node, "image");
    assert_eq!(err.line, 7);
}

// ============================================================================
// SIBLINGS AND CONDITIONALS
// ============================================================================

#[test]
fn else_needs_an_immediately_preceding_if() {
    let ok = page(vec![conditional("if", "$count > 0"), conditional("else", "")]);
    assert!(validate_document(&ok).is_ok());

    let first = page(vec![conditional("else", "")]);
    let err = validate_document(&first).unwrap_err();
    assert_eq!(err.to_string(), "line 6: 'else' else without if");

    let after_text = page(vec![
        conditional("if", "$count > 0"),
        block("text", "between"),
        conditional("else", ""),
    ]);
    let err = validate_document(&after_text).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::SiblingRequired {
            node: "else".into(),
            required: "if".into()
        }
    );
    assert_eq!(err.line, 8);
}

#[test]
fn breakpoints_sit_under_containers_only() {
    let ok = page(vec![conditional("breakpoint", "tablet or more")]);
    assert!(validate_document(&ok).is_ok());

    let misplaced = page(vec![block("button", "Go")
        .with_children(vec![conditional("breakpoint", "mobile")])]);
    let err = validate_document(&misplaced).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MisplacedBreakpoint { .. }));
}

// ============================================================================
// SCOPE
// ============================================================================

#[test]
fn loop_variable_colliding_with_state_is_rejected() {
    let each = block("each", "todos as $todo").with_children(vec![block("text", "$todo")]);
    let err = validate_document(&page(vec![each])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::LoopVariableConflict { name: "todo".into() });
    assert_eq!(err.line, 6);

    let range = block("range", "1 5 as $count");
    let err = validate_document(&page(vec![range])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::LoopVariableConflict { name: "count".into() });
}

#[test]
fn loop_variables_resolve_inside_the_body_only() {
    let each = block("each", "todos as $item, $i").with_children(vec![block("text", "$i: $item")]);
    assert!(validate_document(&page(vec![each])).is_ok());

    let leaked = vec![
        block("each", "todos as $item"),
        block("text", "$item"),
    ];
    let err = validate_document(&page(leaked)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UndeclaredVariable { name: "item".into() });
}

#[test]
fn actions_need_a_functional_context() {
    let err = validate_document(&page(vec![action("set", "$count 1")])).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::ActionOutsideFunctionalContext {
            action: "set".into()
        }
    );
}

#[test]
fn get_value_binds_for_later_siblings_only() {
    let handler = |actions: Vec<Node>| {
        page(vec![block("button", "Go").with_children(vec![block("onClick", "").with_children(actions)])])
    };

    let ordered = handler(vec![
        action("getValue", "todos 0 as $first"),
        action("set", "$count $first"),
    ]);
    assert!(validate_document(&ordered).is_ok());

    let reversed = handler(vec![
        action("set", "$count $first"),
        action("getValue", "todos 0 as $first"),
    ]);
    let err = validate_document(&reversed).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UndeclaredVariable { name: "first".into() });
}

#[test]
fn update_record_rejects_an_index() {
    let (mut nodes, path) = minimal("updateRecord");
    node_at_mut(&mut nodes, &path).data = "todos 0".into();
    let err = validate_document(&nodes).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TooManyParts { max: 1, actual: 2 });
}

#[test]
fn unknown_pipe_operators_are_rejected() {
    let err = validate_document(&page(vec![block("text", "(1 2 | explode)")])).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::UnknownOperator {
            operator: "explode".into()
        }
    );
}

#[test]
fn host_seeded_templates_are_visible() {
    let nodes = page(vec![block("use", "imported")]);
    assert!(validate_document(&nodes).is_err());
    let ctx = ValidationContext::new().with_templates(["imported"]);
    assert!(validate_document_with(&nodes, ctx).is_ok());
}

#[test]
fn first_error_wins() {
    let mut nodes = preamble();
    nodes.push(declaration("page", "").with_children(vec![
        block("image", ""),
        block("carousel", ""),
    ]));
    let nodes = doc(nodes);
    let err = validate_document(&nodes).unwrap_err();
    assert_eq!(err.node, "image");
    assert_eq!(err.line, node_at(&nodes, &[PAGE, 0]).line);
}
