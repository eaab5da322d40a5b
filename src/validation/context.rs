//! Validation context: the scope stack and the declared-name tables.
//!
//! The stack holds one frame per node currently being validated, the node
//! itself on top. Frames are pushed and popped through [`ValidationContext::scoped`]
//! only, so a failed subtree never leaves a frame behind.

use std::collections::HashSet;

use crate::ast::{Category, Node};
use crate::errors::{ErrorReporting, Phase};
use crate::schema::NodeSchema;
use crate::scope::FrameKind;
use crate::syntax;

// ============================================================================
// FRAMES
// ============================================================================

#[derive(Debug, Clone)]
pub struct Frame {
    pub node_type: String,
    pub kind: FrameKind,
    pub schema: &'static NodeSchema,
    /// Loop variables for loop frames, parameters for function and
    /// template frames. Stored without the `$` sigil.
    pub names: Vec<String>,
    /// Names bound by `getValue`/`getRecord` among this node's children.
    pub sibling_bindings: Vec<String>,
}

impl Frame {
    /// The frame a node opens, with the names it introduces.
    ///
    /// A payload that does not parse yields no names; data validation
    /// reports the malformed payload before anything could look them up.
    pub fn for_node(node: &Node, schema: &'static NodeSchema) -> Self {
        let kind = FrameKind::for_node(node);
        let names = match kind {
            FrameKind::Function | FrameKind::Template => node
                .data
                .split_whitespace()
                .skip(1)
                .map(|p| p.trim_start_matches('$').to_string())
                .collect(),
            FrameKind::Loop => loop_names(node),
            FrameKind::Plain => Vec::new(),
        };
        Self {
            node_type: node.type_name().to_string(),
            kind,
            schema,
            names,
            sibling_bindings: Vec::new(),
        }
    }

    fn binds(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name) || self.sibling_bindings.iter().any(|n| n == name)
    }
}

fn loop_names(node: &Node) -> Vec<String> {
    match node.type_name() {
        "each" => syntax::parse_loop_binding(&node.data)
            .map(|b| std::iter::once(b.item).chain(b.index).collect())
            .unwrap_or_default(),
        "range" => syntax::parse_range_binding(&node.data)
            .map(|b| vec![b.name])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Everything the validator knows while walking one document.
///
/// Name tables left as `None` are unknown; checks against them pass. A
/// context pre-seeded by the host (for imported templates or styles) has
/// the document's own names merged in by
/// [`validate_document_with`](crate::validation::validate_document_with).
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    pub stack: Vec<Frame>,
    pub state: Option<HashSet<String>>,
    pub lists: Option<HashSet<String>>,
    pub functions: Option<HashSet<String>>,
    pub templates: Option<HashSet<String>>,
    pub styles: Option<HashSet<String>>,
}

impl ErrorReporting for ValidationContext {
    fn phase(&self) -> Phase {
        Phase::Validation
    }
}

fn extend(set: &mut Option<HashSet<String>>, names: impl IntoIterator<Item = String>) {
    set.get_or_insert_with(HashSet::new).extend(names);
}

fn knows(set: &Option<HashSet<String>>, name: &str) -> bool {
    set.as_ref().map_or(true, |s| s.contains(name))
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        extend(&mut self.templates, names.into_iter().map(Into::into));
        self
    }

    pub fn with_styles<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        extend(&mut self.styles, names.into_iter().map(Into::into));
        self
    }

    pub fn with_state<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        extend(&mut self.state, names.into_iter().map(Into::into));
        self
    }

    pub fn with_lists<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        extend(&mut self.lists, names.into_iter().map(Into::into));
        self
    }

    pub fn with_functions<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        extend(&mut self.functions, names.into_iter().map(Into::into));
        self
    }

    /// Records every name the document declares, so references may point
    /// forward (a button may call a function declared further down).
    pub fn collect_declarations(&mut self, nodes: &[Node]) {
        for node in nodes.iter().filter(|n| n.category == Category::Declaration) {
            let first = || node.data.split_whitespace().next().map(str::to_string);
            match node.type_name() {
                "state" => extend(
                    &mut self.state,
                    node.children
                        .iter()
                        .filter(|c| c.is_keyed())
                        .map(|c| c.type_name().to_string()),
                ),
                "list" => extend(&mut self.lists, first()),
                "function" => extend(&mut self.functions, first()),
                "template" => extend(&mut self.templates, first()),
                "style" => extend(&mut self.styles, first()),
                _ => {}
            }
        }
        // Declaring an empty document still makes the tables known.
        for set in [
            &mut self.state,
            &mut self.lists,
            &mut self.functions,
            &mut self.templates,
            &mut self.styles,
        ] {
            set.get_or_insert_with(HashSet::new);
        }
    }

    // ------------------------------------------------------------------
    // Stack discipline
    // ------------------------------------------------------------------

    /// Runs `f` with `frame` pushed, popping it on every outcome.
    pub fn scoped<T, E>(
        &mut self,
        frame: Frame,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        let depth = self.stack.len();
        self.stack.push(frame);
        let result = f(self);
        self.stack.truncate(depth);
        result
    }

    pub fn current(&self) -> Option<&Frame> {
        self.stack.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut Frame> {
        self.stack.last_mut()
    }

    /// Frames below the current node, innermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = &Frame> {
        self.stack.iter().rev().skip(1)
    }

    /// Whether any open frame is a `form` or a function body, where
    /// `$form.*` is meaningful.
    pub fn in_form_scope(&self) -> bool {
        self.stack
            .iter()
            .any(|f| f.node_type == "form" || f.kind == FrameKind::Function)
    }

    /// Whether some open frame makes actions legal.
    pub fn in_functional_context(&self) -> bool {
        self.stack
            .iter()
            .any(|f| f.schema.flags.provides_functional_context)
    }

    // ------------------------------------------------------------------
    // Name lookup
    // ------------------------------------------------------------------

    pub fn knows_state(&self, name: &str) -> bool {
        knows(&self.state, name)
    }

    pub fn knows_list(&self, name: &str) -> bool {
        knows(&self.lists, name)
    }

    pub fn knows_function(&self, name: &str) -> bool {
        knows(&self.functions, name)
    }

    pub fn knows_template(&self, name: &str) -> bool {
        knows(&self.templates, name)
    }

    pub fn knows_style(&self, name: &str) -> bool {
        knows(&self.styles, name)
    }

    /// True when `$root` names a state variable that is actually declared
    /// (unknown tables do not count).
    pub fn declares_state(&self, name: &str) -> bool {
        self.state.as_ref().is_some_and(|s| s.contains(name))
    }

    /// Whether `$root` resolves: loop and sibling bindings, parameters,
    /// `$form` where a form is open, state, then lists.
    pub fn resolves(&self, root: &str) -> bool {
        if self.stack.iter().any(|f| f.binds(root)) {
            return true;
        }
        if root == "form" && self.in_form_scope() {
            return true;
        }
        if self.state.is_none() {
            return true;
        }
        self.declares_state(root) || self.lists.as_ref().is_some_and(|l| l.contains(root))
    }
}
