//! Attribute values as they travel between a backend and the search layer.
//!
//! A backend hands out [`RawValue`]s where child elements are bare
//! [`Handle`]s. Once a value reaches a [`Node`] every handle is wrapped so
//! callers only ever see [`Value`], i.e. `Value<Node>`.

use std::fmt;

use crate::backend::Handle;
use crate::element::Node;

#[derive(Debug, Clone, PartialEq)]
pub enum Value<E = Node> {
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Range { location: usize, length: usize },
    Array(Vec<Value<E>>),
    Element(E),
}

/// A value as reported by a backend, before element handles are wrapped.
pub type RawValue = Value<Handle>;

impl<E> Value<E> {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
    pub fn as_element(&self) -> Option<&E> {
        match self {
            Value::Element(e) => Some(e),
            _ => None,
        }
    }
    /// Rebuild the value with every element (including those nested in
    /// arrays) passed through `wrap`.
    pub fn map_elements<T, F>(self, wrap: &mut F) -> Value<T>
    where
        F: FnMut(E) -> T,
    {
        match self {
            Value::Nil => Value::Nil,
            Value::Bool(b) => Value::Bool(b),
            Value::Integer(i) => Value::Integer(i),
            Value::Float(f) => Value::Float(f),
            Value::String(s) => Value::String(s),
            Value::Range { location, length } => Value::Range { location, length },
            Value::Array(values) => {
                Value::Array(values.into_iter().map(|v| v.map_elements(wrap)).collect())
            }
            Value::Element(e) => Value::Element(wrap(e)),
        }
    }
}

impl Value {
    /// The backend representation of this value.
    pub fn to_raw(&self) -> RawValue {
        self.clone().map_elements(&mut |node: Node| node.handle())
    }
}

impl<E: fmt::Display> Value<E> {
    /// Literal rendering used in qualifier descriptions: strings are quoted
    /// and nil is spelled out.
    pub fn inspect(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::String(s) => format!("{s:?}"),
            Value::Array(values) => {
                let items: Vec<String> = values.iter().map(|v| v.inspect()).collect();
                format!("[{}]", items.join(", "))
            }
            other => other.to_string(),
        }
    }
}

impl<E: fmt::Display> fmt::Display for Value<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            // nil has no text, so a pattern can only match it if it matches ""
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::Range { location, length } => write!(f, "{{{location}, {length}}}"),
            Value::Array(values) => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Element(e) => write!(f, "{e}"),
        }
    }
}

impl<E> From<&str> for Value<E> {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
impl<E> From<String> for Value<E> {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
impl<E> From<bool> for Value<E> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl<E> From<i64> for Value<E> {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}
impl<E> From<i32> for Value<E> {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}
impl<E> From<f64> for Value<E> {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}
impl<E> From<std::ops::Range<usize>> for Value<E> {
    fn from(range: std::ops::Range<usize>) -> Self {
        Value::Range {
            location: range.start,
            length: range.end.saturating_sub(range.start),
        }
    }
}
impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Element(node)
    }
}
