//! Sessions driven end to end: start, dispatch, iterate, interpolate.

mod common;

use common::{doc, find, CountingRender, SharedWindow};
use im::HashMap;
use trellis::ast::builder::{action, block, conditional, declaration, keyed, property};
use trellis::ast::Node;
use trellis::config::EngineOptions;
use trellis::errors::ErrorKind;
use trellis::runtime::{NullRender, Scope, Session, Value, WindowOperation};

fn start(nodes: Vec<Node>) -> Session {
    common::init_test_logging();
    Session::start(doc(nodes), EngineOptions::default()).unwrap()
}

fn click(label: &str, actions: Vec<Node>) -> Node {
    block("button", label).with_children(vec![block("onClick", "").with_children(actions)])
}

/// The handler of the page's `n`th child button.
fn handler(session: &Session, n: usize) -> Node {
    let page = session
        .document()
        .iter()
        .find(|r| r.type_name() == "page")
        .expect("no page");
    page.children[n].children[0].clone()
}

fn record(fields: Vec<Node>) -> Node {
    property("record", "").with_children(fields)
}

fn titles(session: &Session, list: &str) -> Vec<String> {
    session
        .store()
        .list(list)
        .unwrap()
        .iter()
        .map(|entry| match entry {
            Value::Record(r) => r.fields["title"].to_string(),
            other => other.to_string(),
        })
        .collect()
}

// ============================================================================
// STATE AND EXPRESSIONS
// ============================================================================

#[test]
fn set_assigns_literals_and_pipes() {
    let mut session = start(vec![
        declaration("state", "").with_children(vec![keyed("x", "0")]),
        declaration("page", "").with_children(vec![
            click("Five", vec![action("set", "$x 5")]),
            click("Sum", vec![action("set", "$x (2 3 | add)")]),
        ]),
    ]);
    let scope = Scope::new();

    session.dispatch(&handler(&session, 0), &mut Scope::new(), &mut NullRender).unwrap();
    assert_eq!(session.interpolate("$x", &scope).unwrap(), "5");

    session.dispatch(&handler(&session, 1), &mut Scope::new(), &mut NullRender).unwrap();
    assert_eq!(session.store().get_state("x"), Some(&Value::Number(5.0)));
}

#[test]
fn text_interpolates_variables_and_pipes() {
    let session = start(vec![
        declaration("state", "").with_children(vec![keyed("count", "5"), keyed("name", "\"ada\"")]),
        declaration("page", "").with_children(vec![block("text", "$name has $count")]),
    ]);
    let scope = Scope::new();
    assert_eq!(session.interpolate("total: ($count 2 | add)", &scope).unwrap(), "total: 7");
    assert_eq!(session.interpolate("($name | uppercase)!", &scope).unwrap(), "ADA!");

    let text = find(session.document(), "text").unwrap().clone();
    assert_eq!(session.interpolate_node(&text, &scope).unwrap(), "ada has 5");
}

#[test]
fn use_binds_template_parameters() {
    let session = start(vec![
        declaration("list", "people").with_children(vec![property("item", "Grace")]),
        declaration("template", "card $title $note")
            .with_children(vec![block("text", "Hi $title$note")]),
        declaration("page", "").with_children(vec![
            block("use", "card \"Ada\""),
            block("each", "people as $person").with_children(vec![block("use", "card $person \"!\"")]),
        ]),
    ]);
    let body = find(session.document(), "template").unwrap().children[0].clone();
    let page = find(session.document(), "page").unwrap().clone();

    let scope = session.instantiate(&page.children[0], &Scope::new()).unwrap();
    assert_eq!(session.interpolate_node(&body, &scope).unwrap(), "Hi Ada");
    assert!(session.interpolate_node(&body, &Scope::new()).is_err());

    let each = &page.children[1];
    let rows: Vec<String> = session
        .iterate(each, &Scope::new())
        .unwrap()
        .iter()
        .map(|row| {
            let scope = session.instantiate(&each.children[0], row).unwrap();
            session.interpolate_node(&body, &scope).unwrap()
        })
        .collect();
    assert_eq!(rows, vec!["Hi Grace!"]);
    assert!(session.template("card").is_some());
}

#[test]
fn if_and_else_pick_a_branch() {
    let branch = || {
        vec![
            conditional("if", "$count > 3").with_children(vec![action("set", "$label big")]),
            conditional("else", "").with_children(vec![action("set", "$label small")]),
        ]
    };
    let mut session = start(vec![
        declaration("state", "").with_children(vec![keyed("count", "5"), keyed("label", "\"\"")]),
        declaration("page", "").with_children(vec![
            click("Check", branch()),
            click("Drop", vec![action("set", "$count 1")]),
        ]),
    ]);

    session.dispatch(&handler(&session, 0), &mut Scope::new(), &mut NullRender).unwrap();
    assert_eq!(session.store().get_state("label"), Some(&Value::text("big")));

    session.dispatch(&handler(&session, 1), &mut Scope::new(), &mut NullRender).unwrap();
    session.dispatch(&handler(&session, 0), &mut Scope::new(), &mut NullRender).unwrap();
    assert_eq!(session.store().get_state("label"), Some(&Value::text("small")));
}

// ============================================================================
// LISTS AND RECORDS
// ============================================================================

fn todo_app() -> Vec<Node> {
    vec![
        declaration("state", "").with_children(vec![keyed("first", "\"\"")]),
        declaration("list", "todos").with_children(vec![
            record(vec![keyed("title", "\"milk\""), keyed("done", "\"no\"")]),
            record(vec![keyed("title", "\"eggs\""), keyed("done", "\"no\"")]),
        ]),
        declaration("function", "save $title").with_children(vec![action("addRecord", "todos")
            .with_children(vec![record(vec![keyed("title", "$title"), keyed("done", "\"no\"")])])]),
        declaration("page", "").with_children(vec![
            click("Add", vec![action("call", "save \"bread\"")]),
            click(
                "Finish eggs",
                vec![action("updateRecord", "todos").with_children(vec![
                    property("where", "title is eggs"),
                    record(vec![keyed("done", "\"yes\"")]),
                ])],
            ),
            click(
                "Finish nothing",
                vec![action("updateRecord", "todos").with_children(vec![
                    property("where", "title is caviar"),
                    record(vec![keyed("done", "\"yes\"")]),
                ])],
            ),
            click(
                "First",
                vec![
                    action("getRecord", "todos 0 as $top"),
                    action("set", "$first $top.title"),
                ],
            ),
            block("each", "todos as $todo").with_children(vec![click(
                "Remove",
                vec![action("removeRecord", "todos $todo")],
            )]),
        ]),
    ]
}

#[test]
fn called_functions_add_records() {
    let mut session = start(todo_app());
    session.dispatch(&handler(&session, 0), &mut Scope::new(), &mut NullRender).unwrap();
    assert_eq!(titles(&session, "todos"), vec!["milk", "eggs", "bread"]);
}

#[test]
fn remove_record_uses_the_loop_binding() {
    let mut session = start(todo_app());
    let each = find(session.document(), "each").unwrap().clone();
    let scopes = session.iterate(&each, &Scope::new()).unwrap();
    assert_eq!(scopes.len(), 2);

    let remove = each.children[0].children[0].clone();
    let mut scope = scopes[0].clone();
    session.dispatch(&remove, &mut scope, &mut NullRender).unwrap();
    assert_eq!(titles(&session, "todos"), vec!["eggs"]);
}

#[test]
fn add_then_remove_through_iteration_keeps_the_length() {
    let mut session = start(vec![
        declaration("list", "items").with_children(vec![record(vec![keyed("title", "\"old\"")])]),
        declaration("page", "").with_children(vec![
            click(
                "Add",
                vec![action("addRecord", "items").with_children(vec![record(vec![keyed("title", "\"new\"")])])],
            ),
            block("each", "items as $boundItem").with_children(vec![click(
                "Remove",
                vec![action("removeRecord", "items $boundItem")],
            )]),
        ]),
    ]);
    let before = session.store().list("items").unwrap().len();

    session.dispatch(&handler(&session, 0), &mut Scope::new(), &mut NullRender).unwrap();
    let each = find(session.document(), "each").unwrap().clone();
    let mut added = session
        .iterate(&each, &Scope::new())
        .unwrap()
        .pop()
        .expect("the added record is iterated last");
    let remove = each.children[0].children[0].clone();
    session.dispatch(&remove, &mut added, &mut NullRender).unwrap();

    assert_eq!(session.store().list("items").unwrap().len(), before);
    assert_eq!(titles(&session, "items"), vec!["old"]);
}

#[test]
fn update_record_merges_into_matches_only() {
    let mut session = start(todo_app());
    session.dispatch(&handler(&session, 1), &mut Scope::new(), &mut NullRender).unwrap();

    let done: Vec<String> = session
        .store()
        .list("todos")
        .unwrap()
        .iter()
        .map(|entry| match entry {
            Value::Record(r) => r.fields["done"].to_string(),
            other => panic!("expected record, got {other:?}"),
        })
        .collect();
    assert_eq!(done, vec!["no", "yes"]);

    let before = session.store().snapshot();
    session.dispatch(&handler(&session, 2), &mut Scope::new(), &mut NullRender).unwrap();
    assert_eq!(session.store().snapshot(), before);
}

#[test]
fn update_record_by_a_user_id_field() {
    let contact = |id: &str, name: &str| record(vec![keyed("id", id), keyed("name", name)]);
    let update = |id: &str| {
        click(
            "Rename",
            vec![action("updateRecord", "contacts").with_children(vec![
                property("where", &format!("id is {id}")),
                record(vec![keyed("name", "\"Grace\"")]),
            ])],
        )
    };
    let mut session = start(vec![
        declaration("list", "contacts")
            .with_children(vec![contact("1", "\"Ada\""), contact("2", "\"Alan\"")]),
        declaration("page", "").with_children(vec![update("1"), update("99")]),
    ]);
    let names = |session: &Session| -> Vec<String> {
        session
            .store()
            .list("contacts")
            .unwrap()
            .iter()
            .map(|entry| match entry {
                Value::Record(r) => r.fields["name"].to_string(),
                other => panic!("expected record, got {other:?}"),
            })
            .collect()
    };

    session.dispatch(&handler(&session, 0), &mut Scope::new(), &mut NullRender).unwrap();
    assert_eq!(names(&session), vec!["Grace", "Alan"]);

    session.dispatch(&handler(&session, 1), &mut Scope::new(), &mut NullRender).unwrap();
    assert_eq!(names(&session), vec!["Grace", "Alan"]);
}

#[test]
fn get_record_binds_for_the_next_action() {
    let mut session = start(todo_app());
    session.dispatch(&handler(&session, 3), &mut Scope::new(), &mut NullRender).unwrap();
    assert_eq!(session.store().get_state("first"), Some(&Value::text("milk")));
}

#[test]
fn each_over_a_state_array() {
    let session = start(vec![
        declaration("state", "").with_children(vec![keyed("tags", "")
            .with_children(vec![property("item", "red"), property("item", "blue")])]),
        declaration("page", "").with_children(vec![
            block("each", "$tags as $tag, $i").with_children(vec![block("text", "$i $tag")]),
        ]),
    ]);
    let each = find(session.document(), "each").unwrap().clone();
    let seen: Vec<String> = session
        .iterate(&each, &Scope::new())
        .unwrap()
        .iter()
        .map(|scope| session.interpolate("$i $tag", scope).unwrap())
        .collect();
    assert_eq!(seen, vec!["0 red", "1 blue"]);
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn failed_actions_keep_earlier_changes_and_still_render() {
    let mut session = start(vec![
        declaration("state", "").with_children(vec![keyed("count", "0")]),
        declaration("list", "todos"),
        declaration("page", "").with_children(vec![click(
            "Go",
            vec![
                action("set", "$count 1"),
                action("setValue", "todos 0 x"),
                action("set", "$count 2"),
            ],
        )]),
    ]);
    let mut render = CountingRender::default();
    let err = session
        .dispatch(&handler(&session, 0), &mut Scope::new(), &mut render)
        .unwrap_err();

    assert_eq!(
        err.kind,
        ErrorKind::IndexOutOfRange {
            list: "todos".into(),
            index: 0,
            len: 0
        }
    );
    assert_eq!(session.store().get_state("count"), Some(&Value::Number(1.0)));
    assert_eq!(render.requests, 1);
}

fn calculator(options: EngineOptions) -> Session {
    let nodes = vec![
        declaration("state", "").with_children(vec![keyed("total", "0")]),
        declaration("function", "add $n").with_children(vec![action("set", "$total ($total $n | add)")]),
        declaration("function", "again").with_children(vec![action("call", "again")]),
        declaration("page", "").with_children(vec![
            click("One", vec![action("call", "add 5")]),
            click("Two", vec![action("call", "add 1 2")]),
            click("Loop", vec![action("call", "again")]),
        ]),
    ];
    Session::start(doc(nodes), options).unwrap()
}

#[test]
fn calls_bind_parameters_and_check_arity() {
    let mut session = calculator(EngineOptions::default());
    session.dispatch(&handler(&session, 0), &mut Scope::new(), &mut NullRender).unwrap();
    assert_eq!(session.store().get_state("total"), Some(&Value::Number(5.0)));

    let err = session
        .dispatch(&handler(&session, 1), &mut Scope::new(), &mut NullRender)
        .unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::ArityMismatch {
            function: "add".into(),
            expected: 1,
            actual: 2
        }
    );
}

#[test]
fn runaway_recursion_stops_at_the_configured_depth() {
    let options = EngineOptions::from_yaml_str("max_call_depth: 8").unwrap();
    let mut session = calculator(options);
    let err = session
        .dispatch(&handler(&session, 2), &mut Scope::new(), &mut NullRender)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecursionLimit { limit: 8 });
}

// ============================================================================
// FORMS AND THE HOST
// ============================================================================

#[test]
fn form_handlers_edit_the_callers_form() {
    let submit = block("onSubmit", "").with_children(vec![
        action("set", "$last $form.email"),
        action("set", "$form.email \"new@example.com\""),
        action("clear", "$form.name"),
    ]);
    let session_doc = vec![
        declaration("state", "").with_children(vec![keyed("last", "\"\"")]),
        declaration("page", "").with_children(vec![block("form", "signup").with_children(vec![submit])]),
    ];
    let mut session = start(session_doc);
    let submit = find(session.document(), "onSubmit").unwrap().clone();

    let fields = HashMap::unit("email".to_string(), Value::text("old@example.com"));
    let mut scope = Scope::new().with_form(fields);
    session.dispatch(&submit, &mut scope, &mut NullRender).unwrap();

    assert_eq!(session.store().get_state("last"), Some(&Value::text("old@example.com")));
    let form = scope.form().unwrap();
    assert_eq!(form.get("email"), Some(&Value::text("new@example.com")));
    assert_eq!(form.get("name"), Some(&Value::text("")));
}

#[test]
fn window_actions_reach_the_host() {
    let nodes = doc(vec![declaration("page", "").with_children(vec![click(
        "Bottom",
        vec![action("window", "scrollBottom")],
    )])]);
    let window = SharedWindow::default();
    let mut session =
        Session::start_with_host(nodes, EngineOptions::default(), Box::new(window.clone())).unwrap();
    session.dispatch(&handler(&session, 0), &mut Scope::new(), &mut NullRender).unwrap();
    assert_eq!(*window.0.borrow(), vec![WindowOperation::ScrollBottom]);
}

#[test]
fn invalid_documents_never_start() {
    let nodes = doc(vec![declaration("page", "").with_children(vec![block("text", "$missing")])]);
    let err = Session::start(nodes, EngineOptions::default()).err().unwrap();
    assert_eq!(err.kind, ErrorKind::UndeclaredVariable { name: "missing".into() });
}
