//! Node descriptors: ports, reactive rules and the wrapped transform.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{FrameError, Result};
use crate::table::{GroupBy, Scalar, Series, Table};

use super::port::{PortSpec, ValueOptions};
use super::value::Value;

/// Values published by one invocation, keyed by output port name.
pub type Outputs = IndexMap<String, Value>;

/// Maps a newly bound source value to options for the derived port.
pub type Projection = Arc<dyn Fn(&Value) -> Option<ValueOptions> + Send + Sync>;

type SingleTransform = Arc<dyn Fn(&Inputs) -> Result<Value> + Send + Sync>;
type MultiTransform = Arc<dyn Fn(&Inputs) -> Result<Outputs> + Send + Sync>;

#[derive(Clone)]
enum Transform {
    Single(SingleTransform),
    Multi(MultiTransform),
}

/// Recomputes the options of one port whenever another port is set.
///
/// A projection that does not apply to the bound value returns `None` and
/// leaves the derived options unchanged.
#[derive(Clone)]
pub struct ReactiveRule {
    pub source: String,
    pub target: String,
    projection: Projection,
}

impl ReactiveRule {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        projection: impl Fn(&Value) -> Option<ValueOptions> + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            projection: Arc::new(projection),
        }
    }

    /// Choices become the column names of the bound table.
    pub fn column_choices(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target, |value| {
            let table = value.as_table()?;
            Some(ValueOptions::choices(
                table.column_names().into_iter().map(Scalar::from).collect(),
            ))
        })
    }

    /// Choices become the row labels of the bound table or series.
    pub fn row_choices(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target, |value| {
            let index = match value {
                Value::Table(t) => t.index(),
                Value::Series(s) => s.index(),
                _ => return None,
            };
            Some(ValueOptions::choices(index.labels().to_vec()))
        })
    }

    /// Bounds become `0..=len-1` in steps of one for the bound table or series.
    pub fn position_bounds(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target, |value| {
            let len = match value {
                Value::Table(t) => t.row_count(),
                Value::Series(s) => s.len(),
                _ => return None,
            };
            Some(ValueOptions::bounds(0.0, len as f64 - 1.0, 1.0))
        })
    }

    /// Choices become the group labels of the bound group.
    pub fn group_choices(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target, |value| {
            Some(ValueOptions::choices(value.as_group()?.labels()))
        })
    }

    /// Apply the projection to a newly bound value.
    pub fn apply(&self, value: &Value) -> Option<ValueOptions> {
        (self.projection)(value)
    }
}

impl fmt::Debug for ReactiveRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveRule")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Resolved input values for one invocation: bound values plus defaults.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    values: IndexMap<String, Value>,
}

impl Inputs {
    pub fn new(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }

    /// The value of a port, if bound or defaulted.
    pub fn get(&self, port: &str) -> Option<&Value> {
        self.values.get(port)
    }

    /// Whether the port holds a non-null value.
    pub fn is_set(&self, port: &str) -> bool {
        match self.values.get(port) {
            None => false,
            Some(Value::Scalar(s)) => !s.is_null(),
            Some(Value::Json(serde_json::Value::Null)) => false,
            Some(_) => true,
        }
    }

    fn require(&self, port: &str) -> Result<&Value> {
        self.values
            .get(port)
            .ok_or_else(|| FrameError::Type(format!("input '{}' has no value", port)))
    }

    fn mismatch(port: &str, expected: &str, value: &Value) -> FrameError {
        FrameError::Type(format!(
            "input '{}' expects {}, got {}",
            port,
            expected,
            value.kind()
        ))
    }

    pub fn table(&self, port: &str) -> Result<&Table> {
        let value = self.require(port)?;
        value
            .as_table()
            .ok_or_else(|| Self::mismatch(port, "a table", value))
    }

    pub fn series(&self, port: &str) -> Result<&Series> {
        let value = self.require(port)?;
        value
            .as_series()
            .ok_or_else(|| Self::mismatch(port, "a series", value))
    }

    pub fn group(&self, port: &str) -> Result<&GroupBy> {
        let value = self.require(port)?;
        value
            .as_group()
            .ok_or_else(|| Self::mismatch(port, "a group", value))
    }

    pub fn scalar(&self, port: &str) -> Result<Scalar> {
        let value = self.require(port)?;
        value
            .as_scalar()
            .ok_or_else(|| Self::mismatch(port, "a single value", value))
    }

    /// Text rendering of a scalar input.
    pub fn text(&self, port: &str) -> Result<String> {
        match self.scalar(port)? {
            Scalar::Text(s) => Ok(s),
            Scalar::Null => Err(FrameError::Type(format!("input '{}' has no value", port))),
            other => Ok(other.to_string()),
        }
    }

    /// Like [`Inputs::text`], but an unset port yields `None`.
    pub fn opt_text(&self, port: &str) -> Result<Option<String>> {
        if !self.is_set(port) {
            return Ok(None);
        }
        self.text(port).map(Some)
    }

    /// Integer input; floats are truncated and text is parsed.
    pub fn int(&self, port: &str) -> Result<i64> {
        let scalar = self.scalar(port)?;
        let parsed = match &scalar {
            Scalar::Text(s) => s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64),
            other => other.as_i64(),
        };
        parsed.ok_or_else(|| {
            FrameError::Type(format!("input '{}' expects an integer, got '{}'", port, scalar))
        })
    }

    pub fn float(&self, port: &str) -> Result<f64> {
        let scalar = self.scalar(port)?;
        let parsed = match &scalar {
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
            other => other.as_f64(),
        };
        parsed.ok_or_else(|| {
            FrameError::Type(format!("input '{}' expects a number, got '{}'", port, scalar))
        })
    }

    pub fn bool(&self, port: &str) -> Result<bool> {
        let scalar = self.scalar(port)?;
        scalar.as_bool().ok_or_else(|| {
            FrameError::Type(format!("input '{}' expects a boolean, got '{}'", port, scalar))
        })
    }

    pub fn bytes(&self, port: &str) -> Result<&[u8]> {
        match self.require(port)? {
            Value::Bytes(bytes) => Ok(bytes),
            other => Err(Self::mismatch(port, "bytes", other)),
        }
    }

    /// Structured input as JSON. Scalars convert to JSON scalars.
    pub fn json(&self, port: &str) -> Result<serde_json::Value> {
        match self.require(port)? {
            Value::Json(json) => Ok(json.clone()),
            Value::Scalar(scalar) => Ok(scalar.to_json()),
            other => Err(Self::mismatch(port, "structured data", other)),
        }
    }

    pub fn list(&self, port: &str) -> Result<Vec<Value>> {
        let value = self.require(port)?;
        value
            .as_list()
            .ok_or_else(|| Self::mismatch(port, "a list", value))
    }

    /// A list input whose items are all single values.
    pub fn scalars(&self, port: &str) -> Result<Vec<Scalar>> {
        self.list(port)?
            .iter()
            .map(|item| {
                item.as_scalar()
                    .ok_or_else(|| Self::mismatch(port, "a list of single values", item))
            })
            .collect()
    }

    /// Like [`Inputs::scalars`], but an unset port yields `None`.
    pub fn opt_scalars(&self, port: &str) -> Result<Option<Vec<Scalar>>> {
        if !self.is_set(port) {
            return Ok(None);
        }
        self.scalars(port).map(Some)
    }
}

/// A stateless node: metadata, ports, reactive rules and a pure transform.
///
/// Descriptors are built once, registered, and shared behind an `Arc`.
#[derive(Clone)]
pub struct NodeDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
    pub rules: Vec<ReactiveRule>,
    transform: Transform,
}

impl NodeDescriptor {
    /// Create a descriptor whose transform publishes on the first output port.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        transform: impl Fn(&Inputs) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            rules: Vec::new(),
            transform: Transform::Single(Arc::new(transform)),
        }
    }

    /// Create a descriptor whose transform publishes on several output ports.
    pub fn with_outputs_from(
        id: impl Into<String>,
        name: impl Into<String>,
        transform: impl Fn(&Inputs) -> Result<Outputs> + Send + Sync + 'static,
    ) -> Self {
        Self {
            transform: Transform::Multi(Arc::new(transform)),
            ..Self::new(id, name, |_| Ok(Value::Scalar(Scalar::Null)))
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The same node under another id and display name.
    pub fn renamed(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.id = id.into();
        self.name = name.into();
        self
    }

    pub fn input(mut self, port: PortSpec) -> Self {
        self.inputs.push(port);
        self
    }

    pub fn output(mut self, port: PortSpec) -> Self {
        self.outputs.push(port);
        self
    }

    pub fn rule(mut self, rule: ReactiveRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn get_input(&self, name: &str) -> Option<&PortSpec> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn get_output(&self, name: &str) -> Option<&PortSpec> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Check port names and rule wiring.
    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| {
            Err(FrameError::Registration(format!("node '{}': {}", self.id, message)))
        };
        if self.id.is_empty() {
            return fail("empty node id".to_string());
        }
        if self.outputs.is_empty() {
            return fail("no output ports".to_string());
        }
        for ports in [&self.inputs, &self.outputs] {
            for (i, port) in ports.iter().enumerate() {
                if ports[..i].iter().any(|p| p.name == port.name) {
                    return fail(format!("duplicate port '{}'", port.name));
                }
            }
        }
        for rule in &self.rules {
            if self.get_input(&rule.source).is_none() {
                return fail(format!("rule source '{}' is not an input", rule.source));
            }
            if self.get_input(&rule.target).is_none() {
                return fail(format!("rule target '{}' is not an input", rule.target));
            }
        }
        Ok(())
    }

    /// Resolve bound values and defaults. `None` when a required input is
    /// unbound.
    pub fn resolve_inputs(&self, bound: &IndexMap<String, Value>) -> Option<Inputs> {
        let mut values = IndexMap::with_capacity(self.inputs.len());
        for port in &self.inputs {
            match (bound.get(&port.name), &port.default) {
                (Some(value), _) => {
                    values.insert(port.name.clone(), value.clone());
                }
                (None, Some(default)) => {
                    values.insert(port.name.clone(), default.clone());
                }
                (None, None) if port.required => return None,
                (None, None) => {}
            }
        }
        Some(Inputs::new(values))
    }

    /// Run the transform on resolved inputs.
    pub fn call(&self, inputs: &Inputs) -> Result<Outputs> {
        match &self.transform {
            Transform::Single(transform) => {
                let port = self.outputs.first().ok_or_else(|| {
                    FrameError::Registration(format!("node '{}' has no output port", self.id))
                })?;
                let mut outputs = Outputs::with_capacity(1);
                outputs.insert(port.name.clone(), transform(inputs)?);
                Ok(outputs)
            }
            Transform::Multi(transform) => transform(inputs),
        }
    }
}

impl fmt::Debug for NodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}
