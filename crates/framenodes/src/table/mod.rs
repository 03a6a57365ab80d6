//! In-memory table engine.
//!
//! Provides the table, series and grouping values the node library operates
//! on. Tables are immutable: every operation returns a new value.

mod expr;
mod frame;
mod group;
mod index;
mod merge;
mod ops;
mod scalar;
mod stats;

pub use expr::Evaluated;
pub use frame::{Column, Series, Table};
pub use group::GroupBy;
pub use index::RowIndex;
pub use merge::JoinHow;
pub use ops::{split_names, to_valid_identifier, CellData, DropAxis, DropHow, RowData};
pub use scalar::{parse_timestamp, ColumnType, IndexType, Scalar, TIMESTAMP_FORMAT};
pub use stats::{describe_values, DESCRIBE_STATS};
