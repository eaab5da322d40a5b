//! The host-facing runtime entry point.
//!
//! A [`Session`] owns a validated document and its live store. Hosts start
//! one, dispatch event handlers into it, and ask it for loop scopes and
//! interpolated text while rendering.
//!
//! ```rust
//! use trellis::ast::builder::{action, block, declaration, keyed, number_lines};
//! use trellis::config::EngineOptions;
//! use trellis::runtime::{NullRender, Scope, Session};
//!
//! let mut doc = vec![
//!     declaration("state", "").with_children(vec![keyed("count", "0")]),
//!     declaration("page", "Counter").with_children(vec![
//!         block("button", "Add").with_children(vec![
//!             block("onClick", "").with_children(vec![action("set", "$count ($count 1 | add)")]),
//!         ]),
//!     ]),
//! ];
//! number_lines(&mut doc);
//! let mut session = Session::start(doc, EngineOptions::default()).unwrap();
//! let handler = session.document()[1].children[0].children[0].clone();
//! session.dispatch(&handler, &mut Scope::new(), &mut NullRender).unwrap();
//! assert_eq!(session.interpolate("count: $count", &Scope::new()).unwrap(), "count: 1");
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use im::HashMap;

use crate::ast::{Category, Node, ValueShape};
use crate::config::EngineOptions;
use crate::errors::{ErrorKind, ErrorReporting, Phase, TrellisError};
use crate::runtime::actions::Runtime;
use crate::runtime::eval::Evaluator;
use crate::runtime::scope::Scope;
use crate::runtime::store::Store;
use crate::runtime::value::Value;
use crate::runtime::{NullWindow, RenderSink, WindowHost};
use crate::schema::{self, Separator};
use crate::scope::FrameKind;
use crate::syntax::{self, LoopSource};
use crate::validation;

pub struct Session {
    document: Arc<Vec<Node>>,
    store: Store,
    options: EngineOptions,
    window: Box<dyn WindowHost>,
}

impl ErrorReporting for Session {
    fn phase(&self) -> Phase {
        Phase::Runtime
    }
}

impl Session {
    /// Validates `nodes`, builds the store and runs every `init` block.
    pub fn start(nodes: Vec<Node>, options: EngineOptions) -> Result<Self, TrellisError> {
        Self::start_with_host(nodes, options, Box::new(NullWindow))
    }

    pub fn start_with_host(
        nodes: Vec<Node>,
        options: EngineOptions,
        window: Box<dyn WindowHost>,
    ) -> Result<Self, TrellisError> {
        validation::validate_document(&nodes)?;
        let mut session = Self {
            document: Arc::new(nodes),
            store: Store::new(),
            options,
            window,
        };
        session.load_declarations()?;
        session.run_init()?;
        log::debug!(
            "session started: {} state variables, {} lists, {} functions",
            session.store.state.len(),
            session.store.lists.len(),
            session.store.functions.len()
        );
        Ok(session)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn document(&self) -> &Arc<Vec<Node>> {
        &self.document
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    // ========================================================================
    // STARTUP
    // ========================================================================

    fn load_declarations(&mut self) -> Result<(), TrellisError> {
        let document = Arc::clone(&self.document);
        for root in document.iter() {
            match root.type_name() {
                "state" => {
                    for variable in root.children.iter().filter(|c| c.is_keyed()) {
                        let value = self.initial_value(variable)?;
                        self.store.state.insert(variable.type_name().to_string(), value);
                    }
                }
                "list" => {
                    let name = root.data.trim().to_string();
                    let mut entries = Vec::with_capacity(root.children.len());
                    for child in &root.children {
                        match child.type_name() {
                            "item" => entries.push(self.constant(child)?),
                            "record" => {
                                let fields = self.constant_fields(child)?;
                                entries.push(Value::Record(self.store.new_record(fields)));
                            }
                            _ => {}
                        }
                    }
                    self.store.lists.insert(name, entries);
                }
                "function" | "template" => {
                    let name = Separator::Space
                        .split(&root.data)
                        .first()
                        .map(|n| n.to_string())
                        .ok_or_else(|| self.internal_error(root, "declaration has no name"))?;
                    let table = if root.type_name() == "function" {
                        &mut self.store.functions
                    } else {
                        &mut self.store.templates
                    };
                    table.insert(name, Arc::new(root.clone()));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// The starting value of a state variable, by shape.
    fn initial_value(&self, variable: &Node) -> Result<Value, TrellisError> {
        match variable.value_shape() {
            ValueShape::Scalar if variable.has_data() => self.constant(variable),
            ValueShape::Scalar => Ok(Value::Empty),
            ValueShape::Array => variable
                .children
                .iter()
                .map(|item| self.constant(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            ValueShape::Object => {
                let mut map = HashMap::new();
                for field in variable.children.iter().filter(|c| c.is_keyed()) {
                    map.insert(field.type_name().to_string(), self.initial_value(field)?);
                }
                Ok(Value::Map(map))
            }
        }
    }

    /// Evaluates a declaration-time expression. Earlier state is visible.
    fn constant(&self, node: &Node) -> Result<Value, TrellisError> {
        let scope = Scope::new();
        Evaluator::new(&self.store, &scope).expression_text(&node.data, node)
    }

    fn constant_fields(&self, record: &Node) -> Result<BTreeMap<String, Value>, TrellisError> {
        let mut fields = BTreeMap::new();
        for field in record.children.iter().filter(|c| c.is_keyed()) {
            fields.insert(field.type_name().to_string(), self.constant(field)?);
        }
        Ok(fields)
    }

    fn run_init(&mut self) -> Result<(), TrellisError> {
        let document = Arc::clone(&self.document);
        for init in document.iter().filter(|n| n.type_name() == "init") {
            log::debug!("running init block at line {}", init.line);
            let mut scope = Scope::new();
            scope.push(FrameKind::Plain, HashMap::new());
            Runtime::new(&mut self.store, &mut scope, self.window.as_mut(), &self.options)
                .run_actions(&init.children)?;
        }
        Ok(())
    }

    // ========================================================================
    // EVENTS
    // ========================================================================

    /// Runs an event handler's actions in `scope`, then requests one render.
    ///
    /// The render is requested even when an action fails, since the actions
    /// before it have already changed the store. Form fields the handler
    /// edits are written back into `scope`.
    pub fn dispatch(
        &mut self,
        handler: &Node,
        scope: &mut Scope,
        render: &mut dyn RenderSink,
    ) -> Result<(), TrellisError> {
        let provides = schema::get(handler.type_name())
            .is_some_and(|s| s.flags.provides_functional_context);
        if handler.is_keyed() || !provides {
            return Err(self.type_mismatch(handler, "an event handler", handler.type_name()));
        }

        log::debug!("dispatching '{}' at line {}", handler.type_name(), handler.line);
        scope.push(FrameKind::for_node(handler), HashMap::new());
        let result = Runtime::new(&mut self.store, scope, self.window.as_mut(), &self.options)
            .run_actions(&handler.children);
        scope.pop();

        if let Err(e) = &result {
            log::debug!("handler stopped: {e}");
        }
        render.request_render(&self.store);
        result
    }

    // ========================================================================
    // RENDER SUPPORT
    // ========================================================================

    /// One scope per iteration of an `each` or `range` node, each extending
    /// `scope` with the iteration's bindings.
    pub fn iterate(&self, node: &Node, scope: &Scope) -> Result<Vec<Scope>, TrellisError> {
        match node.type_name() {
            "each" => self.iterate_each(node, scope),
            "range" => self.iterate_range(node, scope),
            other => Err(self.type_mismatch(node, "an each or range node", other)),
        }
    }

    fn iterate_each(&self, node: &Node, scope: &Scope) -> Result<Vec<Scope>, TrellisError> {
        let eval = Evaluator::new(&self.store, scope);
        let binding = syntax::parse_loop_binding(&node.data).map_err(|e| eval.unparsable(node, e))?;
        let items = match &binding.source {
            LoopSource::List(name) => self
                .store
                .list(name)
                .cloned()
                .ok_or_else(|| self.report(ErrorKind::UndefinedName { name: name.clone() }, node))?,
            LoopSource::Variable(var) => match eval.resolve(var, node)? {
                Value::List(items) => items,
                Value::Empty => Vec::new(),
                other => return Err(self.type_mismatch(node, "a list", other.type_name())),
            },
        };

        Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let mut bindings = HashMap::unit(binding.item.clone(), item);
                if let Some(index) = &binding.index {
                    bindings.insert(index.clone(), Value::Number(i as f64));
                }
                scope.extended(FrameKind::Loop, bindings)
            })
            .collect())
    }

    /// Ranges include both ends. Without a step they count towards the end
    /// by one.
    fn iterate_range(&self, node: &Node, scope: &Scope) -> Result<Vec<Scope>, TrellisError> {
        let eval = Evaluator::new(&self.store, scope);
        let binding = syntax::parse_range_binding(&node.data).map_err(|e| eval.unparsable(node, e))?;
        let number = |operand: &syntax::Operand| -> Result<f64, TrellisError> {
            let value = eval.operand(operand, node)?;
            value
                .as_number()
                .ok_or_else(|| self.type_mismatch(node, "a number", &value.to_string()))
        };
        let start = number(&binding.start)?;
        let end = number(&binding.end)?;
        let step = match &binding.step {
            Some(step) => number(step)?,
            None if start <= end => 1.0,
            None => -1.0,
        };
        if step == 0.0 {
            return Err(self.type_mismatch(node, "a non-zero step", "0"));
        }

        let span = (end - start) / step;
        let count = if span < 0.0 { 0 } else { span.floor() as usize + 1 };
        let limit = self.options.max_range_iterations;
        if count > limit {
            return Err(self.report(ErrorKind::IterationLimit { limit }, node));
        }
        Ok((0..count)
            .map(|i| {
                let value = Value::Number(start + step * i as f64);
                scope.extended(FrameKind::Loop, HashMap::unit(binding.name.clone(), value))
            })
            .collect())
    }

    /// The scope a `use` node's template body renders in: `scope` plus a
    /// template frame binding each parameter to its argument. Parameters
    /// without an argument are empty.
    pub fn instantiate(&self, node: &Node, scope: &Scope) -> Result<Scope, TrellisError> {
        if node.type_name() != "use" {
            return Err(self.type_mismatch(node, "a use node", node.type_name()));
        }
        let name = Separator::Space
            .split(&node.data)
            .first()
            .map(|n| n.to_string())
            .ok_or_else(|| self.internal_error(node, "use names no template"))?;
        let template = self
            .store
            .templates
            .get(&name)
            .cloned()
            .ok_or_else(|| self.report(ErrorKind::UndefinedName { name: name.clone() }, node))?;

        let parameters = Separator::Space
            .split(&template.data)
            .into_iter()
            .skip(1)
            .map(|p| p.trim_start_matches('$').to_string())
            .collect::<Vec<_>>();
        let arguments = Evaluator::new(&self.store, scope)
            .arguments(&Separator::Space.tail(&node.data, 1), node)?;
        if arguments.len() > parameters.len() {
            return Err(self.report(
                ErrorKind::ArityMismatch {
                    function: name,
                    expected: parameters.len(),
                    actual: arguments.len(),
                },
                node,
            ));
        }

        let mut arguments = arguments.into_iter();
        let bindings: HashMap<String, Value> = parameters
            .into_iter()
            .map(|p| (p, arguments.next().unwrap_or_default()))
            .collect();
        log::trace!("line {}: instantiating template '{}'", node.line, name);
        Ok(scope.extended(FrameKind::Template, bindings))
    }

    /// The template declaration a `use` node refers to, for the renderer.
    pub fn template(&self, name: &str) -> Option<&Arc<Node>> {
        self.store.templates.get(name)
    }

    /// Interpolates free-standing text in `scope`.
    pub fn interpolate(&self, text: &str, scope: &Scope) -> Result<String, TrellisError> {
        let node = Node::typed(Category::Block, "text", text, 0);
        self.interpolate_node(&node, scope)
    }

    /// Interpolates a node's own data; failures name the node.
    pub fn interpolate_node(&self, node: &Node, scope: &Scope) -> Result<String, TrellisError> {
        Evaluator::new(&self.store, scope).interpolate(
            &node.data,
            node,
            self.options.trim_interpolated_text,
        )
    }

    /// Evaluates an `if` node's condition, for the renderer.
    pub fn evaluate_condition(&self, node: &Node, scope: &Scope) -> Result<bool, TrellisError> {
        Evaluator::new(&self.store, scope).condition_text(&node.data, node)
    }
}
