//! The live store: state variables, lists, and the declared functions and
//! templates. Maps are persistent (`im`) so the renderer can hold a cheap
//! snapshot while actions keep mutating.

use std::collections::BTreeMap;
use std::sync::Arc;

use im::HashMap;
use serde::Serialize;

use crate::ast::Node;
use crate::runtime::value::{Record, Value};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Store {
    pub state: HashMap<String, Value>,
    pub lists: HashMap<String, Vec<Value>>,
    #[serde(skip)]
    pub functions: HashMap<String, Arc<Node>>,
    #[serde(skip)]
    pub templates: HashMap<String, Arc<Node>>,
    next_record: u64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new record with a fresh identity.
    pub fn new_record(&mut self, fields: BTreeMap<String, Value>) -> Record {
        self.next_record += 1;
        Record {
            id: self.next_record,
            fields,
        }
    }

    pub fn get_state(&self, name: &str) -> Option<&Value> {
        self.state.get(name)
    }

    /// Sets `name`, or a field beneath it when `path` is non-empty.
    pub fn set_state(&mut self, name: &str, path: &[String], value: Value) {
        let updated = match self.state.get(name) {
            Some(current) => current.with_path(path, value),
            None => Value::Empty.with_path(path, value),
        };
        self.state.insert(name.to_string(), updated);
    }

    pub fn list(&self, name: &str) -> Option<&Vec<Value>> {
        self.lists.get(name)
    }

    pub fn list_mut(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        self.lists.get_mut(name)
    }

    /// JSON snapshot of state and lists, for hosts and debugging.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
