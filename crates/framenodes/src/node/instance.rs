//! Node instances: bound port values, derived options and invocation.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{FrameError, InvocationError, Result};

use super::descriptor::{NodeDescriptor, Outputs};
use super::port::ValueOptions;
use super::value::Value;

/// Readiness of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Some required input is unbound.
    Pending,
    /// Every required input is bound.
    Ready,
}

/// One placement of a node in a host graph.
///
/// Owns only its current port values, the options derived by reactive rules
/// and the outputs of the last successful invocation. The descriptor is
/// shared and never mutated.
#[derive(Debug, Clone)]
pub struct NodeInstance {
    descriptor: Arc<NodeDescriptor>,
    values: IndexMap<String, Value>,
    derived: IndexMap<String, ValueOptions>,
    outputs: Option<Outputs>,
}

impl NodeInstance {
    pub fn new(descriptor: Arc<NodeDescriptor>) -> Self {
        Self {
            descriptor,
            values: IndexMap::new(),
            derived: IndexMap::new(),
            outputs: None,
        }
    }

    pub fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    /// Bind a value to an input port and run the reactive rules sourced on it.
    ///
    /// A null scalar may be bound to an optional port to mark it unset.
    pub fn set_input(&mut self, port: &str, value: impl Into<Value>) -> Result<NodeState> {
        let value = value.into();
        let spec = self.descriptor.get_input(port).ok_or_else(|| {
            FrameError::Registration(format!(
                "node '{}' has no input port '{}'",
                self.descriptor.id, port
            ))
        })?;
        let unset = matches!(&value, Value::Scalar(s) if s.is_null());
        if !(spec.port_type.accepts(&value) || (unset && !spec.required)) {
            return Err(FrameError::Type(format!(
                "input '{}' of node '{}' expects {:?}, got {}",
                port,
                self.descriptor.id,
                spec.port_type,
                value.kind()
            )));
        }

        for rule in self.descriptor.rules.iter().filter(|r| r.source == port) {
            if let Some(options) = rule.apply(&value) {
                debug!(node = %self.descriptor.id, port = %rule.target, "refreshed value options");
                self.derived.insert(rule.target.clone(), options);
            }
        }
        self.values.insert(port.to_string(), value);
        Ok(self.state())
    }

    /// Unbind an input port. Published outputs are dropped.
    pub fn clear_input(&mut self, port: &str) -> NodeState {
        self.values.shift_remove(port);
        self.outputs = None;
        self.state()
    }

    pub fn input(&self, port: &str) -> Option<&Value> {
        self.values.get(port)
    }

    pub fn state(&self) -> NodeState {
        let ready = self
            .descriptor
            .inputs
            .iter()
            .filter(|p| p.required)
            .all(|p| self.values.contains_key(&p.name));
        if ready {
            NodeState::Ready
        } else {
            NodeState::Pending
        }
    }

    /// Current options of an input port: derived by a reactive rule if one
    /// has fired, otherwise the static options of the port spec.
    pub fn value_options(&self, port: &str) -> Option<&ValueOptions> {
        self.derived.get(port).or_else(|| {
            self.descriptor
                .get_input(port)
                .and_then(|spec| spec.options.as_ref())
        })
    }

    /// Outputs of the last successful invocation.
    pub fn outputs(&self) -> Option<&Outputs> {
        self.outputs.as_ref()
    }

    pub fn output(&self, port: &str) -> Option<&Value> {
        self.outputs.as_ref().and_then(|o| o.get(port))
    }

    /// Run the transform on the bound inputs plus defaults.
    ///
    /// Returns `Ok(None)` while a required input is unbound. On failure no
    /// output is published.
    pub fn invoke(&mut self) -> std::result::Result<Option<Outputs>, InvocationError> {
        let id = &self.descriptor.id;
        let inputs = match self.descriptor.resolve_inputs(&self.values) {
            Some(inputs) => inputs,
            None => {
                debug!(node = %id, "required input unbound, no output");
                self.outputs = None;
                return Ok(None);
            }
        };

        debug!(node = %id, "invoking");
        match self.descriptor.call(&inputs) {
            Ok(outputs) => {
                self.outputs = Some(outputs.clone());
                Ok(Some(outputs))
            }
            Err(source) => {
                warn!(node = %id, error = %source, "invocation failed");
                self.outputs = None;
                Err(InvocationError {
                    node_id: id.clone(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::descriptor::ReactiveRule;
    use crate::node::port::{PortSpec, PortType};
    use crate::table::{Scalar, Table};

    fn picker() -> Arc<NodeDescriptor> {
        Arc::new(
            NodeDescriptor::new("t.pick", "Pick", |inputs| {
                let table = inputs.table("df")?;
                Ok(table.get_column(&inputs.text("column")?)?.into())
            })
            .input(PortSpec::required("df", PortType::Table))
            .input(PortSpec::required("column", PortType::Text))
            .output(PortSpec::output("series", PortType::Series))
            .rule(ReactiveRule::column_choices("df", "column")),
        )
    }

    fn sample() -> Table {
        Table::new(
            vec![
                ("A".to_string(), vec![1.into(), 2.into()]),
                ("B".to_string(), vec![3.into(), 4.into()]),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_pending_until_required_bound() {
        let mut node = NodeInstance::new(picker());
        assert_eq!(node.state(), NodeState::Pending);
        assert_eq!(node.set_input("df", sample()).unwrap(), NodeState::Pending);
        assert!(node.invoke().unwrap().is_none());
        assert_eq!(node.set_input("column", "B").unwrap(), NodeState::Ready);
        let outputs = node.invoke().unwrap().unwrap();
        assert_eq!(outputs["series"].as_series().unwrap().values(), &[Scalar::Int(3), Scalar::Int(4)]);
    }

    #[test]
    fn test_rule_sets_choices() {
        let mut node = NodeInstance::new(picker());
        assert!(node.value_options("column").is_none());
        node.set_input("df", sample()).unwrap();
        let choices = node.value_options("column").unwrap().choices.clone().unwrap();
        assert_eq!(choices, vec![Scalar::from("A"), Scalar::from("B")]);
    }

    #[test]
    fn test_failure_publishes_nothing() {
        let mut node = NodeInstance::new(picker());
        node.set_input("df", sample()).unwrap();
        node.set_input("column", "A").unwrap();
        node.invoke().unwrap();
        assert!(node.output("series").is_some());

        node.set_input("column", "Z").unwrap();
        let err = node.invoke().unwrap_err();
        assert_eq!(err.node_id, "t.pick");
        assert!(matches!(err.source, FrameError::Lookup(_)));
        assert!(node.outputs().is_none());
    }

    #[test]
    fn test_rejects_unknown_port_and_wrong_type() {
        let mut node = NodeInstance::new(picker());
        assert!(matches!(node.set_input("nope", 1i64), Err(FrameError::Registration(_))));
        assert!(matches!(node.set_input("df", 1i64), Err(FrameError::Type(_))));
    }

    #[test]
    fn test_clear_input_drops_outputs() {
        let mut node = NodeInstance::new(picker());
        node.set_input("df", sample()).unwrap();
        node.set_input("column", "A").unwrap();
        node.invoke().unwrap();
        assert_eq!(node.clear_input("df"), NodeState::Pending);
        assert!(node.outputs().is_none());
    }
}
