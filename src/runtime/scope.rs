//! Runtime scopes: the live-value counterpart of the validator's frames.

use im::HashMap;

use crate::runtime::value::Value;
use crate::scope::FrameKind;

#[derive(Debug, Clone)]
pub struct RuntimeFrame {
    pub kind: FrameKind,
    pub bindings: HashMap<String, Value>,
}

/// Bindings visible to an expression: frames innermost last, plus the
/// values of the form being edited, if any.
///
/// Cloning is cheap; the renderer keeps one scope per loop iteration.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    frames: Vec<RuntimeFrame>,
    form: Option<HashMap<String, Value>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope for a form whose fields currently hold `fields`.
    pub fn with_form(mut self, fields: HashMap<String, Value>) -> Self {
        self.form = Some(fields);
        self
    }

    /// The scope a called function starts with: its parameters and the
    /// caller's form, nothing else.
    pub fn for_call(parameters: HashMap<String, Value>, form: Option<HashMap<String, Value>>) -> Self {
        Self {
            frames: vec![RuntimeFrame {
                kind: FrameKind::Function,
                bindings: parameters,
            }],
            form,
        }
    }

    pub fn push(&mut self, kind: FrameKind, bindings: HashMap<String, Value>) {
        self.frames.push(RuntimeFrame { kind, bindings });
    }

    pub fn pop(&mut self) -> Option<RuntimeFrame> {
        self.frames.pop()
    }

    /// A copy with one more frame, for per-iteration scopes.
    pub fn extended(&self, kind: FrameKind, bindings: HashMap<String, Value>) -> Self {
        let mut scope = self.clone();
        scope.push(kind, bindings);
        scope
    }

    /// Binds `name` in the innermost frame, for `getValue`/`getRecord`.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        if self.frames.is_empty() {
            self.push(FrameKind::Plain, HashMap::new());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.bindings.insert(name.into(), value);
        }
    }

    /// Loop, sibling and parameter bindings, innermost first.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|f| f.bindings.get(name))
    }

    pub fn form(&self) -> Option<&HashMap<String, Value>> {
        self.form.as_ref()
    }

    pub fn form_value(&self) -> Value {
        self.form.clone().map(Value::Map).unwrap_or_default()
    }

    pub fn set_form_field(&mut self, path: &[String], value: Value) {
        let Some((field, rest)) = path.split_first() else {
            return;
        };
        let form = self.form.get_or_insert_with(HashMap::new);
        let current = form.get(field.as_str()).cloned().unwrap_or_default();
        form.insert(field.clone(), current.with_path(rest, value));
    }

    pub(crate) fn take_form(&mut self) -> Option<HashMap<String, Value>> {
        self.form.take()
    }

    pub(crate) fn restore_form(&mut self, form: Option<HashMap<String, Value>>) {
        self.form = form;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innermost_binding_wins() {
        let mut scope = Scope::new();
        scope.push(FrameKind::Loop, HashMap::unit("x".into(), Value::Number(1.0)));
        scope.push(FrameKind::Loop, HashMap::unit("x".into(), Value::Number(2.0)));
        assert_eq!(scope.lookup("x"), Some(&Value::Number(2.0)));
        scope.pop();
        assert_eq!(scope.lookup("x"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn call_scope_hides_caller_loops() {
        let mut caller = Scope::new();
        caller.push(FrameKind::Loop, HashMap::unit("item".into(), Value::text("a")));
        let callee = Scope::for_call(HashMap::unit("title".into(), Value::text("t")), None);
        assert!(callee.lookup("item").is_none());
        assert!(callee.lookup("title").is_some());
    }

    #[test]
    fn form_fields() {
        let mut scope = Scope::new();
        scope.set_form_field(&["email".to_string()], Value::text("a@b.c"));
        assert_eq!(scope.form_value().get_path(&["email".to_string()]), Some(&Value::text("a@b.c")));
    }
}
