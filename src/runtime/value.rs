use std::collections::BTreeMap;
use std::fmt;

use im::HashMap;
use serde::{Deserialize, Serialize};

/// A live value in the store or a scope.
///
/// # Examples
///
/// ```rust
/// use trellis::runtime::Value;
/// let n = Value::Number(5.0);
/// assert_eq!(n.type_name(), "Number");
/// assert_eq!(n.to_string(), "5");
/// assert!(Value::default().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    List(Vec<Value>),
    Record(Record),
    /// Nested state object.
    Map(HashMap<String, Value>),
}

/// A list entry with fields and a store-assigned identity.
///
/// Two records with equal fields are still different records; removal and
/// equality go by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub fields: BTreeMap<String, Value>,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "Empty",
            Value::Number(_) => "Number",
            Value::Text(_) => "Text",
            Value::Bool(_) => "Bool",
            Value::List(_) => "List",
            Value::Record(_) => "Record",
            Value::Map(_) => "Map",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Numbers, and text that reads as a finite number. Words such as
    /// "NaN" or "inf" stay text.
    ///
    /// ```rust
    /// use trellis::runtime::Value;
    /// assert_eq!(Value::text(" 42 ").as_number(), Some(42.0));
    /// assert_eq!(Value::text("forty").as_number(), None);
    /// assert_eq!(Value::text("Infinity").as_number(), None);
    /// ```
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Empty, `false`, `0`, empty text and empty collections are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Empty => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty() && s != "false",
            Value::List(items) => !items.is_empty(),
            Value::Record(_) => true,
            Value::Map(map) => !map.is_empty(),
        }
    }

    /// Equality as the language sees it: numbers by value even when one
    /// side is text, records by identity, everything else by rendering.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => self.to_string() == other.to_string(),
            },
        }
    }

    /// Follows a field path through records, maps and lists (by index).
    /// Missing steps yield `None`.
    pub fn get_path(&self, path: &[String]) -> Option<&Value> {
        let mut current = self;
        for key in path {
            current = match current {
                Value::Record(record) => record.fields.get(key)?,
                Value::Map(map) => map.get(key.as_str())?,
                Value::List(items) => items.get(key.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Returns a copy with the value at `path` replaced, creating maps for
    /// missing steps.
    pub fn with_path(&self, path: &[String], value: Value) -> Value {
        let Some((key, rest)) = path.split_first() else {
            return value;
        };
        match self {
            Value::Record(record) => {
                let mut record = record.clone();
                let inner = record.fields.get(key).cloned().unwrap_or_default();
                record.fields.insert(key.clone(), inner.with_path(rest, value));
                Value::Record(record)
            }
            Value::Map(map) => {
                let inner = map.get(key.as_str()).cloned().unwrap_or_default();
                Value::Map(map.update(key.clone(), inner.with_path(rest, value)))
            }
            _ => Value::Map(HashMap::unit(key.clone(), Value::Empty.with_path(rest, value))),
        }
    }

    fn fmt_list(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }

    fn fmt_fields<'a>(
        f: &mut fmt::Formatter<'_>,
        fields: impl Iterator<Item = (&'a String, &'a Value)>,
    ) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in fields.enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Text(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => Value::fmt_list(f, items),
            Value::Record(record) => Value::fmt_fields(f, record.fields.iter()),
            Value::Map(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                Value::fmt_fields(f, entries.into_iter())
            }
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
