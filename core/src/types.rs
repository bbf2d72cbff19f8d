//! Value and snapshot types shared by the constraint engine.
//!
//! A [`Snapshot`] is the per-invocation view of resolved options. It is built
//! by the resolution driver in declaration order and read by predicates,
//! default callables and type selectors.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A resolved option value.
///
/// Raw command-line input always arrives as [`Value::Text`]; the other
/// variants are produced by coercion through a [`ValueType`] or returned by
/// default callables.
///
/// # Examples
///
/// ```
/// use constrained_option_core::Value;
///
/// let v = Value::from("123");
/// assert_eq!(v.as_str(), Some("123"));
/// assert_eq!(Value::Int(7).to_string(), "7");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value (also the form of every raw input).
    Text(String),
}

impl Value {
    /// Returns the text payload, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

const TRUTHY: &[&str] = &["1", "true", "t", "yes", "y", "on"];
const FALSY: &[&str] = &["0", "false", "f", "no", "n", "off"];

/// Coercion type for an option value.
///
/// Every option declares one (text by default). A type selector constraint
/// can replace it per invocation.
///
/// # Examples
///
/// ```
/// use constrained_option_core::{Value, ValueType};
///
/// assert_eq!(ValueType::Integer.coerce(&Value::from("42")), Some(Value::Int(42)));
/// assert_eq!(ValueType::Integer.coerce(&Value::from("str")), None);
/// assert_eq!(ValueType::Boolean.coerce(&Value::from("yes")), Some(Value::Bool(true)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValueType {
    /// Any text (the default).
    #[default]
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean, accepting `1/0`, `true/false`, `yes/no`, `on/off` and short forms.
    Boolean,
    /// One of a fixed set of text values.
    Choice(Vec<String>),
}

impl ValueType {
    /// Human-readable type name used in coercion error messages.
    pub fn describe(&self) -> String {
        match self {
            ValueType::Text => "text".to_string(),
            ValueType::Integer => "integer".to_string(),
            ValueType::Float => "float".to_string(),
            ValueType::Boolean => "boolean".to_string(),
            ValueType::Choice(choices) => format!("choice ({})", choices.join(", ")),
        }
    }

    /// Coerces a value into this type, returning `None` if it does not fit.
    ///
    /// Text is parsed; values that already carry a compatible type pass
    /// through (an integer is accepted where a float is expected).
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ValueType::Text, Value::Text(s)) => Some(Value::Text(s.clone())),
            (ValueType::Text, other) => Some(Value::Text(other.to_string())),

            (ValueType::Integer, Value::Int(n)) => Some(Value::Int(*n)),
            (ValueType::Integer, Value::Text(s)) => s.trim().parse().ok().map(Value::Int),
            (ValueType::Integer, _) => None,

            (ValueType::Float, Value::Float(x)) => Some(Value::Float(*x)),
            (ValueType::Float, Value::Int(n)) => Some(Value::Float(*n as f64)),
            (ValueType::Float, Value::Text(s)) => s.trim().parse().ok().map(Value::Float),
            (ValueType::Float, _) => None,

            (ValueType::Boolean, Value::Bool(b)) => Some(Value::Bool(*b)),
            (ValueType::Boolean, Value::Text(s)) => {
                let lowered = s.trim().to_ascii_lowercase();
                if TRUTHY.contains(&lowered.as_str()) {
                    Some(Value::Bool(true))
                } else if FALSY.contains(&lowered.as_str()) {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            (ValueType::Boolean, _) => None,

            (ValueType::Choice(choices), Value::Text(s)) => choices
                .iter()
                .any(|c| c == s)
                .then(|| Value::Text(s.clone())),
            (ValueType::Choice(_), _) => None,
        }
    }
}

/// Ordered `option name -> resolved value` state of one invocation.
///
/// Entries keep the order in which they were first set, which is the
/// declaration order when filled by the resolution driver. An entry whose
/// value is `None` was resolved and left unset.
///
/// # Examples
///
/// ```
/// use constrained_option_core::{Snapshot, Value};
///
/// let mut snapshot = Snapshot::new();
/// snapshot.set("a", Some(Value::from("0")));
/// snapshot.set("b", None);
///
/// assert!(snapshot.is_present("a"));
/// assert!(!snapshot.is_present("b"));
/// assert!(!snapshot.is_present("c"));
/// assert_eq!(snapshot.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: Vec<(String, Option<Value>)>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the resolved value of `name`, or `None` when unset or unknown.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Returns `true` if `name` has a resolved value.
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns `true` if `name` has been resolved, with or without a value.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Records the resolution of `name`, replacing an earlier entry in place.
    pub fn set(&mut self, name: impl Into<String>, value: Option<Value>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    /// Number of resolved entries (set or unset).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<Value>)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, Option<Value>)>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for (name, value) in iter {
            snapshot.set(name, value);
        }
        snapshot
    }
}

/// Serializes as a map in entry order, unset entries as `null`.
impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Formats an option name the way it appears in messages: `'--name'`.
pub(crate) fn quoted(name: &str) -> String {
    format!("'--{name}'")
}

/// Formats a list of option names as `'--a' '--b'`.
pub(crate) fn quoted_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| quoted(n))
        .collect::<Vec<_>>()
        .join(" ")
}
