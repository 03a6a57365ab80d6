//! Values carried on node ports.

use std::fmt;

use crate::table::{GroupBy, Scalar, Series, Table};

/// A value bound to an input port or published on an output port.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Table(Table),
    Series(Series),
    Group(GroupBy),
    Scalar(Scalar),
    /// An ordered list of values (for example a list of tables).
    List(Vec<Value>),
    /// Structured data such as an interchange mapping.
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

/// The variant of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Table,
    Series,
    Group,
    Scalar,
    List,
    Json,
    Bytes,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Table => "table",
            ValueKind::Series => "series",
            ValueKind::Group => "group",
            ValueKind::Scalar => "scalar",
            ValueKind::List => "list",
            ValueKind::Json => "json",
            ValueKind::Bytes => "bytes",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Table(_) => ValueKind::Table,
            Value::Series(_) => ValueKind::Series,
            Value::Group(_) => ValueKind::Group,
            Value::Scalar(_) => ValueKind::Scalar,
            Value::List(_) => ValueKind::List,
            Value::Json(_) => ValueKind::Json,
            Value::Bytes(_) => ValueKind::Bytes,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Value::Series(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupBy> {
        match self {
            Value::Group(g) => Some(g),
            _ => None,
        }
    }

    /// The value as a single cell: scalars and JSON scalars qualify.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Value::Scalar(s) => Some(s.clone()),
            Value::Json(json) => Scalar::from_json(json).ok(),
            _ => None,
        }
    }

    /// The value as a list: lists and JSON arrays qualify.
    pub fn as_list(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) => Some(items.clone()),
            Value::Json(serde_json::Value::Array(items)) => {
                Some(items.iter().cloned().map(Value::from_json).collect())
            }
            _ => None,
        }
    }

    /// Wrap a JSON value, turning JSON scalars into [`Value::Scalar`].
    pub fn from_json(json: serde_json::Value) -> Self {
        match Scalar::from_json(&json) {
            Ok(scalar) => Value::Scalar(scalar),
            Err(_) => Value::Json(json),
        }
    }
}

impl From<Table> for Value {
    fn from(table: Table) -> Self {
        Value::Table(table)
    }
}

impl From<Series> for Value {
    fn from(series: Series) -> Self {
        Value::Series(series)
    }
}

impl From<GroupBy> for Value {
    fn from(group: GroupBy) -> Self {
        Value::Group(group)
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Value::Scalar(scalar)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::Json(json)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Scalar(Scalar::from(text))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Scalar(Scalar::from(text))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Scalar(Scalar::Int(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(Scalar::Float(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Scalar(Scalar::Bool(value))
    }
}
