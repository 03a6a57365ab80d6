//! Node adapter layer.
//!
//! Wraps pure functions into graph nodes: a [`NodeDescriptor`] declares
//! metadata, typed ports and reactive rules once; a [`NodeInstance`] holds
//! the values a host binds to one placement of the node and invokes the
//! transform when every required input is bound.

mod descriptor;
mod encoding;
mod instance;
mod port;
mod registry;
mod value;

pub use descriptor::{Inputs, NodeDescriptor, Outputs, Projection, ReactiveRule};
pub use encoding::{Strategy, ValueEncoder};
pub use instance::{NodeInstance, NodeState};
pub use port::{PortSpec, PortType, ValueOptions};
pub use registry::{NodeRegistry, Shelf};
pub use value::{Value, ValueKind};
