//! Row and column access nodes.

use crate::error::{FrameError, Result};
use crate::node::{Inputs, NodeDescriptor, PortSpec, PortType, ReactiveRule, Shelf};

use super::{cell_data, table_input, table_output};

pub(super) fn shelf() -> Shelf {
    Shelf::new("Rows and Columns")
        .with_description("Selecting and assigning rows and columns")
        .node(get_column())
        .node(set_column())
        .node(get_row())
        .node(get_rows())
        .node(set_row())
        .node(iloc())
        .node(ilocs())
        .node(rename_column())
        .node(rename_columns_valid_identifier())
}

/// Resolve a position against `len` items; negative values count from the end.
pub(super) fn position(value: i64, len: usize) -> Result<usize> {
    let resolved = if value < 0 {
        i64::try_from(len).ok().and_then(|n| n.checked_add(value))
    } else {
        Some(value)
    };
    resolved
        .and_then(|p| usize::try_from(p).ok())
        .ok_or_else(|| FrameError::Lookup(format!("position {} out of bounds", value)))
}

/// Positions from a list of numbers. Floats are truncated.
fn positions(inputs: &Inputs, port: &str, len: usize) -> Result<Vec<usize>> {
    inputs
        .scalars(port)?
        .iter()
        .map(|s| match s.as_f64() {
            Some(f) => position(f.trunc() as i64, len),
            None => Err(FrameError::Type(format!(
                "input '{}' expects positions, got '{}'",
                port, s
            ))),
        })
        .collect()
}

pub(super) fn get_column() -> NodeDescriptor {
    NodeDescriptor::new("table.get_column", "Get Column", |inputs| {
        Ok(inputs.table("df")?.get_column(&inputs.text("column")?)?.into())
    })
    .with_description("Selects one column as a series")
    .input(table_input("df"))
    .input(PortSpec::required("column", PortType::Text))
    .output(PortSpec::output("series", PortType::Series))
    .rule(ReactiveRule::column_choices("df", "column"))
}

pub(super) fn set_column() -> NodeDescriptor {
    NodeDescriptor::new("table.set_column", "Set Column", |inputs| {
        let table = inputs.table("df")?;
        Ok(table.set_column(&inputs.text("column")?, cell_data(inputs, "data")?)?.into())
    })
    .with_description("Assigns a value or a list of values to a column")
    .input(table_input("df"))
    .input(PortSpec::required("column", PortType::Text))
    .input(PortSpec::required("data", PortType::Any))
    .output(table_output("out"))
    .rule(ReactiveRule::column_choices("df", "column"))
}

fn get_row() -> NodeDescriptor {
    NodeDescriptor::new("table.get_row", "Get Row", |inputs| {
        Ok(inputs.table("df")?.get_row(&inputs.scalar("row")?)?.into())
    })
    .with_description("Selects the row with the given label as a series")
    .input(table_input("df"))
    .input(PortSpec::required("row", PortType::Scalar))
    .output(PortSpec::output("series", PortType::Series))
    .rule(ReactiveRule::row_choices("df", "row"))
}

fn get_rows() -> NodeDescriptor {
    NodeDescriptor::new("table.get_rows", "Get Rows", |inputs| {
        Ok(inputs.table("df")?.get_rows(&inputs.scalars("rows")?)?.into())
    })
    .input(table_input("df"))
    .input(PortSpec::required("rows", PortType::Sequence))
    .output(table_output("out"))
}

fn set_row() -> NodeDescriptor {
    NodeDescriptor::new("table.set_row", "Set Row", |inputs| {
        let table = inputs.table("df")?;
        Ok(table.set_row(&inputs.scalar("row")?, cell_data(inputs, "data")?)?.into())
    })
    .input(table_input("df"))
    .input(PortSpec::required("row", PortType::Scalar))
    .input(PortSpec::required("data", PortType::Any))
    .output(table_output("out"))
    .rule(ReactiveRule::row_choices("df", "row"))
}

fn iloc() -> NodeDescriptor {
    NodeDescriptor::new("table.iloc", "Get Row by Position", |inputs| {
        let table = inputs.table("df")?;
        Ok(table.iloc(position(inputs.int("index")?, table.row_count())?)?.into())
    })
    .input(table_input("df"))
    .input(PortSpec::optional("index", PortType::Integer).with_default(0i64))
    .output(PortSpec::output("row", PortType::Series))
    .rule(ReactiveRule::position_bounds("df", "index"))
}

fn ilocs() -> NodeDescriptor {
    NodeDescriptor::new("table.ilocs", "Get Rows by Position", |inputs| {
        let table = inputs.table("df")?;
        Ok(table.ilocs(&positions(inputs, "indices", table.row_count())?)?.into())
    })
    .input(table_input("df"))
    .input(PortSpec::required("indices", PortType::Sequence))
    .output(table_output("rows"))
}

fn rename_column() -> NodeDescriptor {
    NodeDescriptor::new("table.rename_column", "Rename Column", |inputs| {
        let table = inputs.table("df")?;
        Ok(table
            .rename_column(&inputs.text("old_name")?, &inputs.text("new_name")?)?
            .into())
    })
    .input(table_input("df"))
    .input(PortSpec::required("old_name", PortType::Text))
    .input(PortSpec::required("new_name", PortType::Text))
    .output(table_output("out"))
    .rule(ReactiveRule::column_choices("df", "old_name"))
}

fn rename_columns_valid_identifier() -> NodeDescriptor {
    NodeDescriptor::new(
        "table.rename_columns_valid_identifier",
        "Rename Columns to Identifiers",
        |inputs| Ok(inputs.table("df")?.rename_columns_valid_identifier()?.into()),
    )
    .input(table_input("df"))
    .output(table_output("out"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeInstance, NodeState, Value};
    use crate::table::{Scalar, Table};
    use std::sync::Arc;

    fn sample() -> Table {
        Table::new(
            vec![
                ("A".to_string(), vec![1.into(), 2.into(), 3.into()]),
                ("B".to_string(), vec![4.into(), 5.into(), 6.into()]),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_get_row_coerces_text_label() {
        let mut node = NodeInstance::new(Arc::new(get_row()));
        node.set_input("df", sample()).unwrap();
        assert_eq!(node.set_input("row", "1").unwrap(), NodeState::Ready);
        let outputs = node.invoke().unwrap().unwrap();
        let row = outputs["series"].as_series().unwrap();
        assert_eq!(row.values(), &[Scalar::Int(2), Scalar::Int(5)]);
        assert_eq!(row.name(), Some("1"));
    }

    #[test]
    fn test_iloc_bounds_follow_table() {
        let mut node = NodeInstance::new(Arc::new(iloc()));
        node.set_input("df", sample()).unwrap();
        let options = node.value_options("index").unwrap();
        assert_eq!((options.min, options.max, options.step), (Some(0.0), Some(2.0), Some(1.0)));
        assert!(node.invoke().unwrap().is_some());
    }

    #[test]
    fn test_negative_positions_count_from_end() {
        assert_eq!(position(-1, 3).unwrap(), 2);
        assert_eq!(position(-3, 3).unwrap(), 0);
        assert!(matches!(position(-4, 3), Err(FrameError::Lookup(_))));

        let mut node = NodeInstance::new(Arc::new(iloc()));
        node.set_input("df", sample()).unwrap();
        node.set_input("index", -1i64).unwrap();
        let outputs = node.invoke().unwrap().unwrap();
        let row = outputs["row"].as_series().unwrap();
        assert_eq!(row.values(), &[Scalar::Int(3), Scalar::Int(6)]);

        let mut node = NodeInstance::new(Arc::new(ilocs()));
        node.set_input("df", sample()).unwrap();
        node.set_input("indices", Value::List(vec![(-1i64).into(), 0i64.into()])).unwrap();
        let outputs = node.invoke().unwrap().unwrap();
        let rows = outputs["rows"].as_table().unwrap();
        assert_eq!(rows.index().labels(), &[Scalar::Int(2), Scalar::Int(0)]);
    }

    #[test]
    fn test_ilocs_truncates_floats() {
        let mut node = NodeInstance::new(Arc::new(ilocs()));
        node.set_input("df", sample()).unwrap();
        node.set_input("indices", Value::List(vec![0.9.into(), 2i64.into()])).unwrap();
        let outputs = node.invoke().unwrap().unwrap();
        let rows = outputs["rows"].as_table().unwrap();
        assert_eq!(rows.index().labels(), &[Scalar::Int(0), Scalar::Int(2)]);
    }

    #[test]
    fn test_set_column_length_mismatch() {
        let mut node = NodeInstance::new(Arc::new(set_column()));
        node.set_input("df", sample()).unwrap();
        node.set_input("column", "C").unwrap();
        node.set_input("data", Value::List(vec![1i64.into()])).unwrap();
        let err = node.invoke().unwrap_err();
        assert!(matches!(err.source, FrameError::Shape(_)));
    }
}
