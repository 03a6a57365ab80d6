//! Dictionary-style interchange orientations.
//!
//! `split` is the only orientation that carries row labels and column names
//! without ambiguity and is the default for machine-to-machine exchange.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FrameError, Result};
use crate::table::{RowIndex, Scalar, Table};

/// Named interchange shape of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// `{column: {label: value}}`
    Dict,
    /// `{column: [value...]}`
    List,
    /// `{index: [...], columns: [...], data: [[...]...]}`
    #[default]
    Split,
    /// `split` plus `index_names` and `column_names`.
    Tight,
    /// `[{column: value}...]`
    Records,
    /// `{label: {column: value}}`
    Index,
}

impl Orientation {
    pub const ALL: [Orientation; 6] = [
        Orientation::Dict,
        Orientation::List,
        Orientation::Split,
        Orientation::Tight,
        Orientation::Records,
        Orientation::Index,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Dict => "dict",
            Orientation::List => "list",
            Orientation::Split => "split",
            Orientation::Tight => "tight",
            Orientation::Records => "records",
            Orientation::Index => "index",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        Orientation::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| FrameError::InvalidOption(format!("unknown orientation '{}'", s)))
    }
}

/// Encode a table in the given orientation.
///
/// The `index` orientation needs unique row labels; `dict` keeps the last
/// value of a repeated label.
pub fn encode(table: &Table, orient: Orientation) -> Result<Value> {
    let columns: Vec<Value> = table
        .column_names()
        .into_iter()
        .map(|n| Value::String(n.to_string()))
        .collect();
    let index: Vec<Value> = table.index().labels().iter().map(Scalar::to_json).collect();
    let data = || -> Vec<Value> {
        table
            .rows()
            .map(|row| Value::Array(row.iter().map(Scalar::to_json).collect()))
            .collect()
    };

    let value = match orient {
        Orientation::Split => {
            let mut map = Map::new();
            map.insert("index".to_string(), Value::Array(index));
            map.insert("columns".to_string(), Value::Array(columns));
            map.insert("data".to_string(), Value::Array(data()));
            Value::Object(map)
        }
        Orientation::Tight => {
            let mut map = Map::new();
            map.insert("index".to_string(), Value::Array(index));
            map.insert("columns".to_string(), Value::Array(columns));
            map.insert("data".to_string(), Value::Array(data()));
            map.insert(
                "index_names".to_string(),
                Value::Array(vec![name_value(table.index().name())]),
            );
            map.insert(
                "column_names".to_string(),
                Value::Array(vec![name_value(table.columns_name())]),
            );
            Value::Object(map)
        }
        Orientation::Dict => Value::Object(
            table
                .columns()
                .map(|(name, column)| {
                    let cells: Map<String, Value> = table
                        .index()
                        .labels()
                        .iter()
                        .zip(column.values())
                        .map(|(label, v)| (label.to_key(), v.to_json()))
                        .collect();
                    (name.to_string(), Value::Object(cells))
                })
                .collect(),
        ),
        Orientation::List => Value::Object(
            table
                .columns()
                .map(|(name, column)| {
                    (
                        name.to_string(),
                        Value::Array(column.values().iter().map(Scalar::to_json).collect()),
                    )
                })
                .collect(),
        ),
        Orientation::Records => Value::Array(
            table
                .rows()
                .map(|row| Value::Object(row_object(table, &row)))
                .collect(),
        ),
        Orientation::Index => {
            let mut map = Map::new();
            for (label, row) in table.index().labels().iter().zip(table.rows()) {
                if map.insert(label.to_key(), Value::Object(row_object(table, &row))).is_some() {
                    return Err(FrameError::Interchange(format!(
                        "row label '{}' is not unique, the index orientation needs unique labels",
                        label
                    )));
                }
            }
            Value::Object(map)
        }
    };
    Ok(value)
}

fn name_value(name: Option<&str>) -> Value {
    name.map(|n| Value::String(n.to_string())).unwrap_or(Value::Null)
}

fn row_object(table: &Table, row: &[Scalar]) -> Map<String, Value> {
    table
        .column_names()
        .into_iter()
        .zip(row)
        .map(|(name, v)| (name.to_string(), v.to_json()))
        .collect()
}

/// Decode a value in the given orientation.
pub fn decode(value: &Value, orient: Orientation) -> Result<Table> {
    match orient {
        Orientation::Split | Orientation::Tight => decode_split(value),
        Orientation::Dict | Orientation::List => decode_columns(as_object(value, orient)?),
        Orientation::Records => decode_records(value),
        Orientation::Index => decode_index(as_object(value, orient)?),
    }
}

/// Decode a value whose orientation is not given.
///
/// Precedence: an object with `columns`, `index` and `data` is split (or
/// tight); an array holds records; an empty object is the empty table;
/// otherwise the first key decides: a key that parses as a number means
/// row-major (`index`), anything else column-major (`dict`).
///
/// JSON keys are always text, so column-major data whose column names are
/// numbers is decoded as row-major. This is a known limitation of decoding
/// without an orientation; use [`decode`] with an explicit orientation (or
/// `split`) when that matters.
pub fn decode_auto(value: &Value) -> Result<Table> {
    match value {
        Value::Object(map)
            if map.contains_key("columns") && map.contains_key("index") && map.contains_key("data") =>
        {
            decode_split(value)
        }
        Value::Array(_) => decode_records(value),
        Value::Object(map) if map.is_empty() => Ok(Table::empty()),
        Value::Object(map) => {
            let first = map.keys().next().map(String::as_str).unwrap_or_default();
            if is_numeric_key(first) {
                decode_index(map)
            } else {
                decode_columns(map)
            }
        }
        other => Err(FrameError::Interchange(format!(
            "cannot build a table from {}",
            kind(other)
        ))),
    }
}

fn is_numeric_key(key: &str) -> bool {
    let key = key.trim();
    key.parse::<f64>().is_ok() && key.bytes().any(|b| b.is_ascii_digit())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn as_object(value: &Value, orient: Orientation) -> Result<&Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        FrameError::Interchange(format!(
            "the {} orientation needs an object, got {}",
            orient,
            kind(value)
        ))
    })
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| {
        FrameError::Interchange(format!("'{}' must be an array, got {}", what, kind(value)))
    })
}

fn cells(values: &[Value]) -> Result<Vec<Scalar>> {
    values.iter().map(Scalar::from_json).collect()
}

fn column_name(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Ok(Scalar::from_json(other)?.to_string()),
    }
}

/// A single axis name from an `index_names`/`column_names` list.
///
/// Axes here have one level, so only a list of exactly one entry applies.
fn axis_name(value: Option<&Value>) -> Option<String> {
    match value?.as_array()?.as_slice() {
        [Value::String(name)] => Some(name.clone()),
        _ => None,
    }
}

fn decode_split(value: &Value) -> Result<Table> {
    let map = as_object(value, Orientation::Split)?;
    let rows: Vec<Vec<Scalar>> = match map.get("data") {
        Some(Value::Null) | None => Vec::new(),
        Some(data) => as_array(data, "data")?
            .iter()
            .map(|row| cells(as_array(row, "data row")?))
            .collect::<Result<_>>()?,
    };
    let names: Vec<String> = match map.get("columns") {
        Some(Value::Null) | None => {
            let width = rows.first().map(Vec::len).unwrap_or(0);
            (0..width).map(|i| i.to_string()).collect()
        }
        Some(columns) => as_array(columns, "columns")?
            .iter()
            .map(column_name)
            .collect::<Result<_>>()?,
    };
    let index = match map.get("index") {
        Some(Value::Null) | None => None,
        Some(labels) => Some(RowIndex::new(cells(as_array(labels, "index")?)?)),
    };
    let index = index.map(|i| i.with_name(axis_name(map.get("index_names"))));
    let table = Table::from_rows(names, rows, index)?;
    Ok(table.with_columns_name(axis_name(map.get("column_names"))))
}

/// Column-major build: every value is either an array (positional) or an
/// object keyed by row label.
fn decode_columns(map: &Map<String, Value>) -> Result<Table> {
    if map.values().all(Value::is_array) {
        let columns = map
            .iter()
            .map(|(name, values)| Ok((name.clone(), cells(as_array(values, name)?)?)))
            .collect::<Result<Vec<_>>>()?;
        return Table::new(columns, None);
    }

    let mut labels: IndexMap<&str, ()> = IndexMap::new();
    for (name, cells) in map {
        let cells = cells.as_object().ok_or_else(|| {
            FrameError::Interchange(format!(
                "column '{}' must map row labels to values, got {}",
                name,
                kind(cells)
            ))
        })?;
        for key in cells.keys() {
            labels.entry(key.as_str()).or_insert(());
        }
    }
    let mut columns = Vec::with_capacity(map.len());
    for (name, cells) in map {
        let values = labels
            .keys()
            .map(|label| match cells.get(*label) {
                Some(v) => Scalar::from_json(v),
                None => Ok(Scalar::Null),
            })
            .collect::<Result<Vec<_>>>()?;
        columns.push((name.clone(), values));
    }
    Table::new(columns, Some(RowIndex::from_keys(labels.keys().copied())))
}

/// Row-major build keyed by row label: the transpose of [`decode_columns`].
fn decode_index(map: &Map<String, Value>) -> Result<Table> {
    let mut rows = Vec::with_capacity(map.len());
    for (label, row) in map {
        let row = row.as_object().ok_or_else(|| {
            FrameError::Interchange(format!(
                "row '{}' must map column names to values, got {}",
                label,
                kind(row)
            ))
        })?;
        rows.push(row);
    }
    let names = union_keys(rows.iter().copied());
    let cells = rows
        .iter()
        .map(|row| {
            names
                .iter()
                .map(|n| row.get(n).map(Scalar::from_json).unwrap_or(Ok(Scalar::Null)))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    let index = RowIndex::from_keys(map.keys().map(String::as_str));
    Table::from_rows(names, cells, Some(index))
}

fn decode_records(value: &Value) -> Result<Table> {
    let records = as_array(value, "records")?;
    if records.iter().all(Value::is_array) {
        let rows = records
            .iter()
            .map(|row| cells(as_array(row, "record")?))
            .collect::<Result<Vec<_>>>()?;
        let width = rows.first().map(Vec::len).unwrap_or(0);
        return Table::from_rows((0..width).map(|i| i.to_string()).collect(), rows, None);
    }
    let objects = records
        .iter()
        .map(|record| {
            record.as_object().ok_or_else(|| {
                FrameError::Interchange(format!(
                    "records must all be objects, got {}",
                    kind(record)
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let names = union_keys(objects.iter().copied());
    let rows = objects
        .iter()
        .map(|record| {
            names
                .iter()
                .map(|n| record.get(n).map(Scalar::from_json).unwrap_or(Ok(Scalar::Null)))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    Table::from_rows(names, rows, None)
}

fn union_keys<'a>(maps: impl Iterator<Item = &'a Map<String, Value>>) -> Vec<String> {
    let mut names: IndexMap<String, ()> = IndexMap::new();
    for map in maps {
        for key in map.keys() {
            names.entry(key.clone()).or_insert(());
        }
    }
    names.into_keys().collect()
}
