//! Generic encoding of port values for hosts that exchange JSON.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{FrameError, Result};
use crate::interchange::{encode, Orientation};

use super::value::{Value, ValueKind};

/// Encodes one kind of value. The encoder is passed along for nested values.
pub type Strategy = Arc<dyn Fn(&Value, &ValueEncoder) -> Result<serde_json::Value> + Send + Sync>;

/// A table of encoding strategies keyed by value kind.
///
/// Hosts build one explicitly and may replace any strategy; there is no
/// process-wide registration.
#[derive(Clone)]
pub struct ValueEncoder {
    strategies: HashMap<ValueKind, Strategy>,
}

impl ValueEncoder {
    /// An encoder with no strategies.
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Replace the strategy for one kind of value.
    pub fn with_strategy(
        mut self,
        kind: ValueKind,
        strategy: impl Fn(&Value, &ValueEncoder) -> Result<serde_json::Value> + Send + Sync + 'static,
    ) -> Self {
        self.strategies.insert(kind, Arc::new(strategy));
        self
    }

    pub fn encode(&self, value: &Value) -> Result<serde_json::Value> {
        let strategy = self.strategies.get(&value.kind()).ok_or_else(|| {
            FrameError::Type(format!("no encoding strategy for {}", value.kind()))
        })?;
        strategy(value, self)
    }
}

fn mismatch(kind: &str) -> FrameError {
    FrameError::Type(format!("{} strategy applied to another kind of value", kind))
}

impl Default for ValueEncoder {
    /// Tables as split values, series as plain lists (labels dropped),
    /// groups as lists of split values, scalars as JSON scalars, bytes as
    /// arrays of numbers and lists item by item.
    fn default() -> Self {
        Self::empty()
            .with_strategy(ValueKind::Table, |value, _| {
                encode(value.as_table().ok_or_else(|| mismatch("table"))?, Orientation::Split)
            })
            .with_strategy(ValueKind::Series, |value, _| {
                let series = value.as_series().ok_or_else(|| mismatch("series"))?;
                Ok(serde_json::Value::Array(
                    series.values().iter().map(|v| v.to_json()).collect(),
                ))
            })
            .with_strategy(ValueKind::Group, |value, _| {
                let group = value.as_group().ok_or_else(|| mismatch("group"))?;
                group
                    .tables()
                    .iter()
                    .map(|t| encode(t, Orientation::Split))
                    .collect::<Result<Vec<_>>>()
                    .map(serde_json::Value::Array)
            })
            .with_strategy(ValueKind::Scalar, |value, _| match value {
                Value::Scalar(scalar) => Ok(scalar.to_json()),
                _ => Err(mismatch("scalar")),
            })
            .with_strategy(ValueKind::Bytes, |value, _| match value {
                Value::Bytes(bytes) => Ok(serde_json::Value::Array(
                    bytes.iter().map(|b| serde_json::Value::from(*b)).collect(),
                )),
                _ => Err(mismatch("bytes")),
            })
            .with_strategy(ValueKind::List, |value, encoder| match value {
                Value::List(items) => items
                    .iter()
                    .map(|item| encoder.encode(item))
                    .collect::<Result<Vec<_>>>()
                    .map(serde_json::Value::Array),
                _ => Err(mismatch("list")),
            })
            .with_strategy(ValueKind::Json, |value, _| match value {
                Value::Json(json) => Ok(json.clone()),
                _ => Err(mismatch("json")),
            })
    }
}

impl fmt::Debug for ValueEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<String> = self.strategies.keys().map(|k| k.to_string()).collect();
        kinds.sort();
        f.debug_struct("ValueEncoder").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Series, Table};
    use serde_json::json;

    #[test]
    fn test_default_strategies() {
        let encoder = ValueEncoder::default();
        let table = Table::new(vec![("A".to_string(), vec![1.into(), 2.into()])], None).unwrap();
        assert_eq!(
            encoder.encode(&table.into()).unwrap(),
            json!({"index": [0, 1], "columns": ["A"], "data": [[1], [2]]})
        );
        let series = Series::from_values(Some("s".to_string()), vec![1.5.into(), 2.5.into()]);
        assert_eq!(encoder.encode(&series.into()).unwrap(), json!([1.5, 2.5]));
        assert_eq!(encoder.encode(&Value::Bytes(vec![7, 8])).unwrap(), json!([7, 8]));
        let list = Value::List(vec![Value::from("a"), Value::from(true)]);
        assert_eq!(encoder.encode(&list).unwrap(), json!(["a", true]));
    }

    #[test]
    fn test_injected_strategy_replaces_default() {
        let encoder = ValueEncoder::default()
            .with_strategy(ValueKind::Bytes, |_, _| Ok(json!("<bytes>")));
        assert_eq!(encoder.encode(&Value::Bytes(vec![1])).unwrap(), json!("<bytes>"));
        assert!(ValueEncoder::empty().encode(&Value::from(1i64)).is_err());
    }
}
