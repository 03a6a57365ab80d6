//! Port declarations.

use serde::{Deserialize, Serialize};

use crate::table::Scalar;

use super::value::Value;

/// Semantic type declared by a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortType {
    Table,
    Series,
    Group,
    /// Any single cell value.
    Scalar,
    Text,
    Integer,
    Float,
    Boolean,
    /// A JSON object.
    Mapping,
    /// A list or JSON array.
    Sequence,
    /// Comma-separated text or a list of values.
    Names,
    Bytes,
    /// Any value (no validation).
    Any,
}

impl PortType {
    /// Whether a value may be bound to a port of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (PortType::Any, _) => true,
            (PortType::Table, Value::Table(_))
            | (PortType::Series, Value::Series(_))
            | (PortType::Group, Value::Group(_))
            | (PortType::Bytes, Value::Bytes(_))
            | (PortType::Sequence, Value::List(_))
            | (PortType::Sequence, Value::Json(serde_json::Value::Array(_)))
            | (
                PortType::Mapping,
                Value::Json(serde_json::Value::Object(_) | serde_json::Value::Array(_)),
            ) => true,
            (PortType::Names, v) => {
                v.as_list().is_some() || matches!(v.as_scalar(), Some(Scalar::Text(_)))
            }
            (PortType::Scalar, v) => v.as_scalar().is_some(),
            (PortType::Text, v) => matches!(v.as_scalar(), Some(Scalar::Text(_))),
            (PortType::Integer | PortType::Float, v) => {
                matches!(v.as_scalar(), Some(Scalar::Int(_) | Scalar::Float(_)))
            }
            (PortType::Boolean, v) => matches!(v.as_scalar(), Some(Scalar::Bool(_))),
            _ => false,
        }
    }
}

/// Constraints on the values a port offers: a choice list and/or numeric
/// bounds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueOptions {
    pub choices: Option<Vec<Scalar>>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
}

impl ValueOptions {
    /// Options offering exactly `choices`.
    pub fn choices(choices: Vec<Scalar>) -> Self {
        Self {
            choices: Some(choices),
            ..Self::default()
        }
    }

    /// Options bounding a number to `[min, max]` in increments of `step`.
    pub fn bounds(min: f64, max: f64, step: f64) -> Self {
        Self {
            choices: None,
            min: Some(min),
            max: Some(max),
            step: Some(step),
        }
    }
}

/// Declaration of one input or output port.
#[derive(Debug, Clone, PartialEq)]
pub struct PortSpec {
    /// Port name, unique among the node's inputs (or outputs).
    pub name: String,
    /// Declared semantic type.
    pub port_type: PortType,
    /// Whether the port must be bound before the node is ready.
    pub required: bool,
    /// Value used when the port is not bound.
    pub default: Option<Value>,
    /// Static value options.
    pub options: Option<ValueOptions>,
    pub description: String,
}

impl PortSpec {
    /// A port that must be bound.
    pub fn required(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            name: name.into(),
            port_type,
            required: true,
            default: None,
            options: None,
            description: String::new(),
        }
    }

    /// A port that may stay unbound.
    pub fn optional(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            required: false,
            ..Self::required(name, port_type)
        }
    }

    /// An output port.
    pub fn output(name: impl Into<String>, port_type: PortType) -> Self {
        Self::optional(name, port_type)
    }

    /// Set a default value. A port with a default is optional.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self.required = false;
        self
    }

    pub fn with_options(mut self, options: ValueOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    #[test]
    fn test_port_type_accepts() {
        assert!(PortType::Table.accepts(&Value::Table(Table::empty())));
        assert!(!PortType::Table.accepts(&Value::from("x")));
        assert!(PortType::Text.accepts(&Value::from("x")));
        assert!(PortType::Integer.accepts(&Value::from(2i64)));
        assert!(PortType::Sequence.accepts(&Value::Json(serde_json::json!([1, 2]))));
        assert!(PortType::Any.accepts(&Value::Bytes(vec![1])));
        assert!(PortType::Names.accepts(&Value::from("a, b")));
        assert!(PortType::Names.accepts(&Value::List(vec!["a".into(), 1i64.into()])));
        assert!(!PortType::Names.accepts(&Value::from(1i64)));
    }

    #[test]
    fn test_default_makes_port_optional() {
        let port = PortSpec::required("q", PortType::Float).with_default(0.5);
        assert!(!port.required);
        assert_eq!(port.default, Some(Value::from(0.5)));
    }
}
