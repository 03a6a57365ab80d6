//! framenodes: tabular-data interchange codecs and graph nodes for dataflow
//! engines.
//!
//! Table operations (construction, conversion, row and column access,
//! filtering, grouping, aggregation, merging) are wrapped into discrete nodes
//! with typed ports and reactive UI hints, ready to be placed in a host
//! graph engine.
//!
//! # Layers
//!
//! - [`table`]: a compact, immutable table engine
//! - [`interchange`]: pure conversions between tables and dictionary
//!   orientations, CSV text, xlsx bytes and raw arrays
//! - [`node`]: descriptors, ports, reactive rules and node instances
//! - [`nodes`]: the node library, grouped into shelves
//!
//! # Example
//!
//! ```no_run
//! use framenodes::{nodes, LibraryConfig, Table};
//!
//! let registry = nodes::registry(&LibraryConfig::default()).unwrap();
//! let mut node = registry.instantiate("table.get_column").unwrap();
//!
//! let table = Table::new(vec![("A".to_string(), vec![1.into(), 2.into()])], None).unwrap();
//! node.set_input("df", table).unwrap();
//! node.set_input("column", "A").unwrap();
//!
//! let outputs = node.invoke().unwrap().unwrap();
//! println!("{:?}", outputs["series"]);
//! ```

pub mod config;
pub mod error;
pub mod interchange;
pub mod node;
pub mod nodes;
pub mod table;

pub use config::{CsvOptions, DecimalMarker, LibraryConfig, Separator, SheetOptions};
pub use error::{FrameError, InvocationError, Result};
pub use interchange::Orientation;
pub use node::{NodeDescriptor, NodeInstance, NodeRegistry, NodeState, Value, ValueEncoder};
pub use table::{GroupBy, RowIndex, Scalar, Series, Table};
