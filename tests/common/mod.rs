//! # Trellis Test Helpers
//!
//! Shared document builders for the integration tests. Every helper returns
//! line-numbered trees, as the line parser would produce them.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use trellis::ast::builder::{action, block, conditional, declaration, keyed, number_lines, property};
use trellis::ast::Node;
use trellis::logging::{init_logging, LoggingConfig};
use trellis::runtime::{RenderSink, Store, WindowHost, WindowOperation};

pub fn init_test_logging() {
    init_logging(LoggingConfig::for_tests());
}

/// Numbers `nodes` and returns them.
pub fn doc(mut nodes: Vec<Node>) -> Vec<Node> {
    number_lines(&mut nodes);
    nodes
}

pub fn node_at<'a>(nodes: &'a [Node], path: &[usize]) -> &'a Node {
    let (first, rest) = path.split_first().expect("empty path");
    rest.iter().fold(&nodes[*first], |node, i| &node.children[*i])
}

pub fn node_at_mut<'a>(nodes: &'a mut [Node], path: &[usize]) -> &'a mut Node {
    let (first, rest) = path.split_first().expect("empty path");
    rest.iter()
        .fold(&mut nodes[*first], |node, i| &mut node.children[*i])
}

/// First node of the given type, depth first.
pub fn find<'a>(nodes: &'a [Node], type_name: &str) -> Option<&'a Node> {
    nodes.iter().find_map(|n| {
        if n.type_name() == type_name {
            Some(n)
        } else {
            find(&n.children, type_name)
        }
    })
}

// ============================================================================
// MINIMAL EXAMPLES
// ============================================================================

/// Declarations every minimal example may refer to. The page holding the
/// example, when there is one, is root number `PAGE`.
pub fn preamble() -> Vec<Node> {
    vec![
        declaration("state", "").with_children(vec![keyed("count", "0"), keyed("draft", "\"\"")]),
        declaration("list", "todos").with_children(vec![
            property("item", "a"),
            property("record", "").with_children(vec![keyed("title", "\"x\"")]),
        ]),
        declaration("function", "save $title"),
        declaration("template", "card $title").with_children(vec![block("text", "$title")]),
        declaration("style", "primary").with_children(vec![keyed("color", "red")]),
    ]
}

pub const PAGE: usize = 5;

fn page_with(children: Vec<Node>) -> Vec<Node> {
    let mut nodes = preamble();
    nodes.push(declaration("page", "Home").with_children(children));
    nodes
}

/// Places an action where actions are legal: a click handler inside a loop
/// over `todos`, with the loop item bound to `$todo`.
fn in_handler(node: Node) -> (Vec<Node>, Vec<usize>) {
    let handler = block("onClick", "").with_children(vec![node]);
    let button = block("button", "Remove").with_children(vec![handler]);
    let each = block("each", "todos as $todo").with_children(vec![button]);
    (page_with(vec![each]), vec![PAGE, 0, 0, 0, 0])
}

fn record(field: &str, value: &str) -> Node {
    property("record", "").with_children(vec![keyed(field, value)])
}

/// The smallest valid document containing a node of type `name`, and the
/// path to that node.
pub fn minimal(name: &str) -> (Vec<Node>, Vec<usize>) {
    let in_page = |node: Node| (page_with(vec![node]), vec![PAGE, 0]);
    let under = |parent: Node, child: Node| (page_with(vec![parent.with_children(vec![child])]), vec![PAGE, 0, 0]);

    let (nodes, path) = match name {
        // Declarations
        "state" => (preamble(), vec![0]),
        "list" => (preamble(), vec![1]),
        "function" => (preamble(), vec![2]),
        "template" => (preamble(), vec![3]),
        "style" => (preamble(), vec![4]),
        "init" => {
            let mut nodes = preamble();
            nodes.push(declaration("init", ""));
            (nodes, vec![PAGE])
        }
        "page" => (page_with(vec![]), vec![PAGE]),

        // Blocks
        "box" => in_page(block("box", "")),
        "text" => in_page(block("text", "Hello")),
        "heading" => in_page(block("heading", "h1 Welcome")),
        "button" => in_page(block("button", "Save")),
        "link" => in_page(block("link", "https://example.com Docs")),
        "image" => in_page(block("image", "https://example.com/cat.png")),
        "input" => in_page(block("input", "email")),
        "form" => in_page(block("form", "signup")),
        "each" => in_page(block("each", "todos as $todo")),
        "range" => in_page(block("range", "1 3 as $n")),
        "use" => in_page(block("use", "card \"Hi\"")),
        "divider" => in_page(block("divider", "")),
        "spacer" => in_page(block("spacer", "8")),
        "table" | "row" | "cell" => {
            let table = block("table", "").with_children(vec![
                block("row", "").with_children(vec![block("cell", "Name")]),
            ]);
            let path = match name {
                "table" => vec![PAGE, 0],
                "row" => vec![PAGE, 0, 0],
                _ => vec![PAGE, 0, 0, 0],
            };
            (page_with(vec![table]), path)
        }
        "onClick" => under(block("button", "Go"), block("onClick", "")),
        "onSubmit" => under(block("form", "signup"), block("onSubmit", "")),
        "onChange" => under(block("input", "email"), block("onChange", "")),

        // Properties
        "role" => under(block("box", ""), property("role", "main")),
        "id" => under(block("box", ""), property("id", "hero")),
        "apply" => under(block("box", ""), property("apply", "primary")),
        "styles" => under(
            block("box", ""),
            property("styles", "").with_children(vec![keyed("margin", "0")]),
        ),
        "alt" => under(block("image", "https://example.com/cat.png"), property("alt", "A cat")),
        "placeholder" => under(block("input", "email"), property("placeholder", "you@example.com")),
        "type" => under(block("input", "email"), property("type", "email")),
        "item" => (preamble(), vec![1, 0]),
        "stateVariable" => (preamble(), vec![0, 0]),
        "field" => (preamble(), vec![1, 1, 0]),
        "cssProperty" => (preamble(), vec![4, 0]),
        "record" => {
            let (nodes, mut path) = in_handler(action("addRecord", "todos").with_children(vec![record("title", "\"y\"")]));
            path.push(0);
            (nodes, path)
        }
        "where" => {
            let (nodes, mut path) = in_handler(action("updateRecord", "todos").with_children(vec![
                property("where", "title is x"),
                record("title", "\"z\""),
            ]));
            path.push(0);
            (nodes, path)
        }

        // Conditionals
        "if" => in_page(conditional("if", "$count > 0")),
        "else" => (
            page_with(vec![conditional("if", "$count > 0"), conditional("else", "")]),
            vec![PAGE, 1],
        ),
        "breakpoint" => in_page(conditional("breakpoint", "mobile")),

        // Actions
        "set" => in_handler(action("set", "$count 1")),
        "clear" => in_handler(action("clear", "$draft")),
        "call" => in_handler(action("call", "save \"x\"")),
        "addValue" => in_handler(action("addValue", "todos b")),
        "addRecord" => in_handler(action("addRecord", "todos").with_children(vec![record("title", "\"y\"")])),
        "removeValue" => in_handler(action("removeValue", "todos a")),
        "removeRecord" => in_handler(action("removeRecord", "todos $todo")),
        "updateValue" => in_handler(action("updateValue", "todos, a, b")),
        "updateRecord" => in_handler(action("updateRecord", "todos").with_children(vec![
            property("where", "title is x"),
            record("title", "\"z\""),
        ])),
        "setValue" => in_handler(action("setValue", "todos 0 z")),
        "setRecord" => in_handler(action("setRecord", "todos 0").with_children(vec![record("title", "\"z\"")])),
        "getValue" => in_handler(action("getValue", "todos 0 as $first")),
        "getRecord" => in_handler(action("getRecord", "todos 1 as $first")),
        "window" => in_handler(action("window", "scrollTop")),

        other => panic!("no minimal example for '{other}'"),
    };
    (doc(nodes), path)
}

// ============================================================================
// HOST DOUBLES
// ============================================================================

/// Counts render requests.
#[derive(Debug, Default)]
pub struct CountingRender {
    pub requests: usize,
}

impl RenderSink for CountingRender {
    fn request_render(&mut self, _store: &Store) {
        self.requests += 1;
    }
}

/// A window host whose log stays readable after the session takes it.
#[derive(Debug, Clone, Default)]
pub struct SharedWindow(pub Rc<RefCell<Vec<WindowOperation>>>);

impl WindowHost for SharedWindow {
    fn perform(&mut self, operation: WindowOperation) {
        self.0.borrow_mut().push(operation);
    }
}
