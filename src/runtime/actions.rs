//! Action execution.
//!
//! Actions run in source order against the store. The first failure stops
//! the list and is returned; whatever earlier actions changed stays changed.
//! `if`/`else` inside an action list pick which children run.

use std::collections::BTreeMap;
use std::sync::Arc;

use im::HashMap;

use crate::ast::{Category, Node};
use crate::config::EngineOptions;
use crate::errors::{ErrorKind, ErrorReporting, Phase, TrellisError};
use crate::runtime::eval::Evaluator;
use crate::runtime::scope::Scope;
use crate::runtime::store::Store;
use crate::runtime::value::{Record, Value};
use crate::runtime::{WindowHost, WindowOperation};
use crate::schema::Separator;
use crate::scope::FrameKind;
use crate::syntax::{self, VarRef};

/// Everything an action may touch.
pub struct Runtime<'a> {
    pub store: &'a mut Store,
    pub scope: &'a mut Scope,
    pub window: &'a mut dyn WindowHost,
    pub options: &'a EngineOptions,
    depth: usize,
}

impl ErrorReporting for Runtime<'_> {
    fn phase(&self) -> Phase {
        Phase::Runtime
    }
}

impl<'a> Runtime<'a> {
    pub fn new(
        store: &'a mut Store,
        scope: &'a mut Scope,
        window: &'a mut dyn WindowHost,
        options: &'a EngineOptions,
    ) -> Self {
        Self {
            store,
            scope,
            window,
            options,
            depth: 0,
        }
    }

    fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&*self.store, &*self.scope)
    }

    // ========================================================================
    // ACTION LISTS
    // ========================================================================

    /// Runs the actions and conditionals among `nodes`. Other children, such
    /// as an action's own `record` property, are not actions and are skipped.
    pub fn run_actions(&mut self, nodes: &[Node]) -> Result<(), TrellisError> {
        let mut previous_if: Option<bool> = None;
        for node in nodes {
            match (node.category, node.type_name()) {
                (Category::Conditional, "if") => {
                    let taken = self.evaluator().condition_text(&node.data, node)?;
                    log::trace!("line {}: if {} => {}", node.line, node.data, taken);
                    if taken {
                        self.run_nested(&node.children)?;
                    }
                    previous_if = Some(taken);
                    continue;
                }
                (Category::Conditional, "else") => {
                    if previous_if == Some(false) {
                        self.run_nested(&node.children)?;
                    }
                }
                (Category::Action, _) => self.execute(node)?,
                _ => {}
            }
            previous_if = None;
        }
        Ok(())
    }

    /// Runs a conditional's children in their own frame, so names they bind
    /// stay inside the branch.
    fn run_nested(&mut self, nodes: &[Node]) -> Result<(), TrellisError> {
        self.scope.push(FrameKind::Plain, HashMap::new());
        let result = self.run_actions(nodes);
        self.scope.pop();
        result
    }

    /// Executes one action node.
    pub fn execute(&mut self, node: &Node) -> Result<(), TrellisError> {
        log::trace!("line {}: {} {}", node.line, node.type_name(), node.data);
        match node.type_name() {
            "set" => self.set(node),
            "clear" => self.clear(node),
            "call" => self.call(node),
            "addValue" => self.add_value(node),
            "addRecord" => self.add_record(node),
            "removeValue" => self.remove_value(node),
            "removeRecord" => self.remove_record(node),
            "updateValue" => self.update_value(node),
            "updateRecord" => self.update_record(node),
            "setValue" => self.set_value(node),
            "setRecord" => self.set_record(node),
            "getValue" => self.get_entry(node, false),
            "getRecord" => self.get_entry(node, true),
            "window" => self.window(node),
            other => Err(self.internal_error(node, &format!("no runtime behavior for '{other}'"))),
        }
    }

    // ========================================================================
    // STATE
    // ========================================================================

    fn set(&mut self, node: &Node) -> Result<(), TrellisError> {
        let target = self.part(node, 0)?;
        let value = self
            .evaluator()
            .expression_text(&Separator::Space.tail(&node.data, 1), node)?;
        self.assign(node, &VarRef::parse(&target), value)
    }

    fn clear(&mut self, node: &Node) -> Result<(), TrellisError> {
        let target = self.part(node, 0)?;
        self.assign(node, &VarRef::parse(&target), Value::text(""))
    }

    fn assign(&mut self, node: &Node, var: &VarRef, value: Value) -> Result<(), TrellisError> {
        if var.root == "form" && !var.path.is_empty() {
            self.scope.set_form_field(&var.path, value);
            Ok(())
        } else if self.store.state.contains_key(&var.root) {
            self.store.set_state(&var.root, &var.path, value);
            Ok(())
        } else {
            Err(self.internal_error(node, &format!("'{var}' is not a state variable")))
        }
    }

    // ========================================================================
    // CALLS
    // ========================================================================

    fn call(&mut self, node: &Node) -> Result<(), TrellisError> {
        let reference = self.part(node, 0)?;
        let name = if reference.starts_with('$') {
            self.evaluator()
                .resolve(&VarRef::parse(&reference), node)?
                .to_string()
        } else {
            reference
        };
        let function: Arc<Node> = self.store.functions.get(&name).cloned().ok_or_else(|| {
            self.report(ErrorKind::UndefinedName { name: name.clone() }, node)
        })?;

        let parameters: Vec<String> = Separator::Space
            .split(&function.data)
            .into_iter()
            .skip(1)
            .map(|p| p.trim_start_matches('$').to_string())
            .collect();
        let arguments = self
            .evaluator()
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
        if self.depth + 1 > self.options.max_call_depth {
            return Err(self.report(
                ErrorKind::RecursionLimit {
                    limit: self.options.max_call_depth,
                },
                node,
            ));
        }

        let mut arguments = arguments.into_iter();
        let bindings: HashMap<String, Value> = parameters
            .into_iter()
            .map(|p| (p, arguments.next().unwrap_or_default()))
            .collect();
        log::debug!("calling '{}' at depth {}", name, self.depth + 1);

        let mut callee_scope = Scope::for_call(bindings, self.scope.form().cloned());
        let result = Runtime {
            store: &mut *self.store,
            scope: &mut callee_scope,
            window: &mut *self.window,
            options: self.options,
            depth: self.depth + 1,
        }
        .run_actions(&function.children);
        // Form edits made by the callee are visible to the caller.
        if self.scope.form().is_some() || callee_scope.form().is_some() {
            self.scope.restore_form(callee_scope.take_form());
        }
        result
    }

    // ========================================================================
    // LISTS
    // ========================================================================

    fn add_value(&mut self, node: &Node) -> Result<(), TrellisError> {
        let value = self
            .evaluator()
            .expression_text(&Separator::Space.tail(&node.data, 1), node)?;
        self.list_mut(node)?.push(value);
        Ok(())
    }

    fn add_record(&mut self, node: &Node) -> Result<(), TrellisError> {
        let fields = self.record_fields(node)?;
        let record = self.store.new_record(fields);
        self.list_mut(node)?.push(Value::Record(record));
        Ok(())
    }

    /// Removes every entry equal to the value.
    fn remove_value(&mut self, node: &Node) -> Result<(), TrellisError> {
        let value = self
            .evaluator()
            .expression_text(&Separator::Space.tail(&node.data, 1), node)?;
        let list = self.list_mut(node)?;
        let before = list.len();
        list.retain(|entry| !entry.loosely_equals(&value));
        log::trace!("line {}: removed {} entries", node.line, before - list.len());
        Ok(())
    }

    /// Removes the record bound to the variable, by identity.
    fn remove_record(&mut self, node: &Node) -> Result<(), TrellisError> {
        let reference = self.part(node, 1)?;
        let target = match self.evaluator().resolve(&VarRef::parse(&reference), node)? {
            Value::Record(record) => record,
            other => {
                return Err(self.type_mismatch(node, "a record", &format!("{} '{}'", other.type_name(), other)))
            }
        };
        self.list_mut(node)?
            .retain(|entry| !matches!(entry, Value::Record(r) if r.id == target.id));
        Ok(())
    }

    /// Replaces the first entry equal to the match value.
    fn update_value(&mut self, node: &Node) -> Result<(), TrellisError> {
        let parts = Separator::Comma.split(&node.data);
        let (Some(matching), Some(replacement)) = (parts.get(1), parts.get(2)) else {
            return Err(self.internal_error(node, "updateValue needs a match and a replacement"));
        };
        let matching = self.evaluator().expression_text(matching, node)?;
        let replacement = self.evaluator().expression_text(replacement, node)?;
        let list = self.list_mut(node)?;
        if let Some(entry) = list.iter_mut().find(|e| e.loosely_equals(&matching)) {
            *entry = replacement;
        }
        Ok(())
    }

    /// Merges the `record` fields into every record the `where` clause
    /// selects. Selecting nothing changes nothing.
    fn update_record(&mut self, node: &Node) -> Result<(), TrellisError> {
        let clause_node = self.child(node, "where")?;
        let clause = syntax::parse_where(&clause_node.data)
            .map_err(|e| self.evaluator().unparsable(clause_node, e))?;
        let fields = self.record_fields(node)?;

        let list = self
            .store
            .list(&self.list_name(node)?)
            .cloned()
            .ok_or_else(|| self.internal_error(node, "list is not declared"))?;
        let mut selected = Vec::with_capacity(list.len());
        {
            let eval = self.evaluator();
            for entry in &list {
                selected.push(eval.matches_where(&clause, entry, clause_node)?);
            }
        }

        let list = self.list_mut(node)?;
        let mut updated = 0;
        for (entry, hit) in list.iter_mut().zip(selected) {
            if let (Value::Record(record), true) = (entry, hit) {
                record.fields.extend(fields.clone());
                updated += 1;
            }
        }
        if updated == 0 {
            log::debug!("line {}: updateRecord matched no records", node.line);
        }
        Ok(())
    }

    fn set_value(&mut self, node: &Node) -> Result<(), TrellisError> {
        let index = self.index(node, 1)?;
        let value = self
            .evaluator()
            .expression_text(&Separator::Space.tail(&node.data, 2), node)?;
        *self.entry_mut(node, index)? = value;
        Ok(())
    }

    /// Replaces the record at an index; it keeps its identity.
    fn set_record(&mut self, node: &Node) -> Result<(), TrellisError> {
        let index = self.index(node, 1)?;
        let fields = self.record_fields(node)?;
        let existing = match self.entry_mut(node, index)? {
            Value::Record(record) => Some(record.id),
            _ => None,
        };
        let record = match existing {
            Some(id) => Record { id, fields },
            None => self.store.new_record(fields),
        };
        *self.entry_mut(node, index)? = Value::Record(record);
        Ok(())
    }

    /// Binds the entry at an index for the actions after this one.
    fn get_entry(&mut self, node: &Node, record_only: bool) -> Result<(), TrellisError> {
        let binding = syntax::parse_index_binding(&Separator::Space.tail(&node.data, 1))
            .map_err(|e| self.evaluator().unparsable(node, e))?;
        let index = self.evaluator().operand(&binding.index, node)?;
        let index = self.as_index(node, &index)?;
        let entry = self.entry_mut(node, index)?.clone();
        if record_only && !matches!(entry, Value::Record(_)) {
            return Err(self.type_mismatch(node, "a record", entry.type_name()));
        }
        self.scope.bind(binding.name, entry);
        Ok(())
    }

    fn window(&mut self, node: &Node) -> Result<(), TrellisError> {
        let operation: WindowOperation = node
            .data
            .parse()
            .map_err(|message: String| self.internal_error(node, &message))?;
        self.window.perform(operation);
        Ok(())
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn part(&self, node: &Node, index: usize) -> Result<String, TrellisError> {
        Separator::Space
            .split(&node.data)
            .get(index)
            .map(|p| p.to_string())
            .ok_or_else(|| self.internal_error(node, &format!("data part {} is missing", index + 1)))
    }

    fn list_name(&self, node: &Node) -> Result<String, TrellisError> {
        let first = self.part(node, 0)?;
        Ok(first.trim_end_matches(',').to_string())
    }

    fn list_mut(&mut self, node: &Node) -> Result<&mut Vec<Value>, TrellisError> {
        let name = self.list_name(node)?;
        if self.store.list(&name).is_none() {
            return Err(self.internal_error(node, &format!("list '{name}' is not declared")));
        }
        self.store.list_mut(&name).ok_or_else(|| {
            TrellisError::new(ErrorKind::UndefinedName { name }, node.type_name(), node.line, Phase::Runtime)
        })
    }

    fn entry_mut(&mut self, node: &Node, index: usize) -> Result<&mut Value, TrellisError> {
        let name = self.list_name(node)?;
        let list = self.list_mut(node)?;
        let len = list.len();
        list.get_mut(index).ok_or_else(|| {
            TrellisError::new(
                ErrorKind::IndexOutOfRange { list: name, index, len },
                node.type_name(),
                node.line,
                Phase::Runtime,
            )
        })
    }

    fn index(&self, node: &Node, part: usize) -> Result<usize, TrellisError> {
        let text = self.part(node, part)?;
        let value = self.evaluator().expression_text(&text, node)?;
        self.as_index(node, &value)
    }

    fn as_index(&self, node: &Node, value: &Value) -> Result<usize, TrellisError> {
        match value.as_number() {
            Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as usize),
            _ => Err(self.type_mismatch(node, "a whole number index", &value.to_string())),
        }
    }

    fn child<'n>(&self, node: &'n Node, type_name: &str) -> Result<&'n Node, TrellisError> {
        node.child(type_name)
            .ok_or_else(|| self.internal_error(node, &format!("missing '{type_name}' child")))
    }

    /// Evaluates the keyed fields of the node's `record` child.
    fn record_fields(&self, node: &Node) -> Result<BTreeMap<String, Value>, TrellisError> {
        let record = self.child(node, "record")?;
        let eval = self.evaluator();
        record
            .children
            .iter()
            .filter(|c| c.is_keyed())
            .map(|field| -> Result<(String, Value), TrellisError> {
                Ok((field.type_name().to_string(), eval.expression_text(&field.data, field)?))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::{action, keyed, property};
    use crate::runtime::{NullWindow, RecordingWindow};

    fn store() -> Store {
        let mut store = Store::new();
        store.state.insert("count".into(), Value::Number(0.0));
        store.lists.insert(
            "todos".into(),
            vec![Value::text("milk"), Value::text("eggs"), Value::text("milk")],
        );
        store.lists.insert("contacts".into(), Vec::new());
        store
    }

    fn run(store: &mut Store, scope: &mut Scope, nodes: &[Node]) -> Result<(), TrellisError> {
        let options = EngineOptions::default();
        let mut window = NullWindow;
        Runtime::new(store, scope, &mut window, &options).run_actions(nodes)
    }

    fn contact(name: &str) -> Node {
        action("addRecord", "contacts")
            .with_children(vec![property("record", "").with_children(vec![keyed("name", &format!("\"{name}\""))])])
    }

    #[test]
    fn set_evaluates_pipes() {
        let mut store = store();
        let mut scope = Scope::new();
        run(&mut store, &mut scope, &[action("set", "$count ($count 2 | add)")]).unwrap();
        assert_eq!(store.get_state("count"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn remove_value_removes_every_match() {
        let mut store = store();
        let mut scope = Scope::new();
        run(&mut store, &mut scope, &[action("removeValue", "todos milk")]).unwrap();
        assert_eq!(store.list("todos").unwrap(), &vec![Value::text("eggs")]);
    }

    #[test]
    fn remove_value_matches_float_words_as_text() {
        let mut store = store();
        store.lists.insert("words".into(), vec![Value::text("NaN"), Value::text("ok")]);
        let mut scope = Scope::new();
        run(&mut store, &mut scope, &[action("removeValue", "words NaN")]).unwrap();
        assert_eq!(store.list("words").unwrap(), &vec![Value::text("ok")]);
    }

    #[test]
    fn update_value_replaces_first_match_only() {
        let mut store = store();
        let mut scope = Scope::new();
        run(&mut store, &mut scope, &[action("updateValue", "todos, milk, oat milk")]).unwrap();
        let todos = store.list("todos").unwrap();
        assert_eq!(todos[0], Value::text("oat milk"));
        assert_eq!(todos[2], Value::text("milk"));
    }

    #[test]
    fn get_value_binds_for_later_siblings() {
        let mut store = store();
        let mut scope = Scope::new();
        let nodes = vec![
            action("getValue", "todos 1 as $second"),
            action("set", "$count $second"),
        ];
        run(&mut store, &mut scope, &nodes).unwrap();
        assert_eq!(store.get_state("count"), Some(&Value::text("eggs")));
    }

    #[test]
    fn set_record_keeps_identity() {
        let mut store = store();
        let mut scope = Scope::new();
        run(&mut store, &mut scope, &[contact("Ada")]).unwrap();
        let before = match &store.list("contacts").unwrap()[0] {
            Value::Record(r) => r.id,
            other => panic!("expected record, got {other:?}"),
        };
        let replace = action("setRecord", "contacts 0").with_children(vec![
            property("record", "").with_children(vec![keyed("name", "\"Grace\"")]),
        ]);
        run(&mut store, &mut scope, &[replace]).unwrap();
        match &store.list("contacts").unwrap()[0] {
            Value::Record(r) => {
                assert_eq!(r.id, before);
                assert_eq!(r.fields["name"], Value::text("Grace"));
            }
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn index_out_of_range() {
        let mut store = store();
        let mut scope = Scope::new();
        let err = run(&mut store, &mut scope, &[action("setValue", "todos 9 bread")]).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::IndexOutOfRange {
                list: "todos".into(),
                index: 9,
                len: 3
            }
        );
    }

    #[test]
    fn window_reaches_the_host_only() {
        let mut store = store();
        let mut scope = Scope::new();
        let options = EngineOptions::default();
        let mut window = RecordingWindow::default();
        Runtime::new(&mut store, &mut scope, &mut window, &options)
            .run_actions(&[action("window", "scrollTop")])
            .unwrap();
        assert_eq!(window.performed, vec![WindowOperation::ScrollTop]);
        assert_eq!(store.get_state("count"), Some(&Value::Number(0.0)));
    }
}
