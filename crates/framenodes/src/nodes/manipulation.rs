//! Manipulation nodes: missing values, dropping, appending, merging.

use indexmap::IndexMap;

use crate::config::LibraryConfig;
use crate::error::{FrameError, Result};
use crate::node::{Inputs, NodeDescriptor, PortSpec, PortType, ReactiveRule, Shelf, Value};
use crate::table::{DropAxis, DropHow, JoinHow, RowData, Scalar};

use super::{label_list, name_list, rows_cols, table_input, table_output, text_choices};

pub(super) fn shelf(config: &LibraryConfig) -> Shelf {
    Shelf::new("Manipulation")
        .with_description("Cleaning, reshaping and combining tables")
        .node(dropna())
        .node(fillna(config))
        .node(bfill())
        .node(ffill())
        .node(drop_duplicates())
        .node(numeric_only())
        .node(drop_column())
        .node(drop_row())
        .node(drop_columns())
        .node(drop_rows())
        .node(add_column())
        .node(add_row())
        .node(concat())
        .node(merge(config))
        .node(join(config))
}

fn subset_port() -> PortSpec {
    PortSpec::optional("subset", PortType::Names)
        .with_description("Column names, comma-separated or as a list")
}

fn subset(inputs: &Inputs) -> Result<Option<Vec<String>>> {
    name_list(inputs, "subset")
}

fn as_strs(names: &[String]) -> Vec<&str> {
    names.iter().map(String::as_str).collect()
}

fn dropna() -> NodeDescriptor {
    NodeDescriptor::new("table.dropna", "Drop Missing", |inputs| {
        let axis: DropAxis = inputs.text("axis")?.parse()?;
        let how: DropHow = inputs.text("how")?.parse()?;
        let names = subset(inputs)?;
        let names = names.as_deref().map(as_strs);
        Ok(inputs.table("df")?.dropna(axis, how, names.as_deref())?.into())
    })
    .with_description("Drops rows or columns holding missing values")
    .input(table_input("df"))
    .input(
        PortSpec::optional("axis", PortType::Text)
            .with_default(DropAxis::Index.as_str())
            .with_options(text_choices([DropAxis::Index.as_str(), DropAxis::Columns.as_str()])),
    )
    .input(
        PortSpec::optional("how", PortType::Text)
            .with_default(DropHow::Any.as_str())
            .with_options(text_choices([DropHow::Any.as_str(), DropHow::All.as_str()])),
    )
    .input(subset_port())
    .output(table_output("out"))
}

fn fillna(config: &LibraryConfig) -> NodeDescriptor {
    NodeDescriptor::new("table.fillna", "Fill Missing", |inputs| {
        Ok(inputs.table("df")?.fillna(&inputs.scalar("value")?)?.into())
    })
    .input(table_input("df"))
    .input(
        PortSpec::optional("value", PortType::Scalar)
            .with_default(Value::from_json(config.fill_value.clone())),
    )
    .output(table_output("out"))
}

fn bfill() -> NodeDescriptor {
    NodeDescriptor::new("table.bfill", "Backward Fill", |inputs| {
        Ok(inputs.table("df")?.bfill()?.into())
    })
    .input(table_input("df"))
    .output(table_output("out"))
}

fn ffill() -> NodeDescriptor {
    NodeDescriptor::new("table.ffill", "Forward Fill", |inputs| {
        Ok(inputs.table("df")?.ffill()?.into())
    })
    .input(table_input("df"))
    .output(table_output("out"))
}

fn drop_duplicates() -> NodeDescriptor {
    NodeDescriptor::new("table.drop_duplicates", "Drop Duplicates", |inputs| {
        let names = subset(inputs)?;
        let names = names.as_deref().map(as_strs);
        Ok(inputs.table("df")?.drop_duplicates(names.as_deref())?.into())
    })
    .with_description("Drops repeated rows, keeping the first")
    .input(table_input("df"))
    .input(subset_port())
    .output(table_output("out"))
}

fn numeric_only() -> NodeDescriptor {
    NodeDescriptor::new("table.numeric_only", "Numeric Only", |inputs| {
        Ok(inputs.table("df")?.numeric_only(inputs.bool("label_encode")?)?.into())
    })
    .with_description("Keeps numeric columns, converting what can be converted")
    .input(table_input("df"))
    .input(PortSpec::optional("label_encode", PortType::Boolean).with_default(false))
    .output(table_output("out"))
}

fn drop_column() -> NodeDescriptor {
    NodeDescriptor::new("table.drop_column", "Drop Column", |inputs| {
        let column = inputs.text("column")?;
        Ok(inputs.table("df")?.drop_columns(&[column.as_str()])?.into())
    })
    .input(table_input("df"))
    .input(PortSpec::required("column", PortType::Text))
    .output(table_output("out"))
    .rule(ReactiveRule::column_choices("df", "column"))
}

fn drop_row() -> NodeDescriptor {
    NodeDescriptor::new("table.drop_row", "Drop Row", |inputs| {
        Ok(inputs.table("df")?.drop_rows(&[inputs.scalar("row")?])?.into())
    })
    .input(table_input("df"))
    .input(PortSpec::required("row", PortType::Scalar))
    .output(table_output("out"))
    .rule(ReactiveRule::row_choices("df", "row"))
}

fn drop_columns() -> NodeDescriptor {
    NodeDescriptor::new("table.drop_columns", "Drop Columns", |inputs| {
        let names = name_list(inputs, "columns")?.unwrap_or_default();
        Ok(inputs.table("df")?.drop_columns(&as_strs(&names))?.into())
    })
    .input(table_input("df"))
    .input(
        PortSpec::required("columns", PortType::Names)
            .with_description("Column names, comma-separated or as a list"),
    )
    .output(table_output("out"))
}

fn drop_rows() -> NodeDescriptor {
    NodeDescriptor::new("table.drop_rows", "Drop Rows", |inputs| {
        let table = inputs.table("df")?;
        if table.is_empty() {
            return Ok(table.clone().into());
        }
        Ok(table.drop_rows(&label_list(inputs, "rows")?)?.into())
    })
    .input(table_input("df"))
    .input(
        PortSpec::required("rows", PortType::Names)
            .with_description("Row labels, comma-separated or as a list"),
    )
    .output(table_output("out"))
}

fn add_column() -> NodeDescriptor {
    rows_cols::set_column().renamed("table.add_column", "Add Column")
}

fn row_data(value: &Value) -> Result<RowData> {
    if let Value::Json(serde_json::Value::Object(map)) = value {
        let mapping = map
            .iter()
            .map(|(k, v)| Ok((k.clone(), Scalar::from_json(v)?)))
            .collect::<Result<IndexMap<_, _>>>()?;
        return Ok(RowData::Mapping(mapping));
    }
    let items = value
        .as_list()
        .ok_or_else(|| FrameError::Type("input 'row' expects a list or a mapping".to_string()))?;
    items
        .iter()
        .map(|item| {
            item.as_scalar()
                .ok_or_else(|| FrameError::Type("input 'row' expects single values".to_string()))
        })
        .collect::<Result<Vec<_>>>()
        .map(RowData::Values)
}

fn add_row() -> NodeDescriptor {
    NodeDescriptor::new("table.add_row", "Add Row", |inputs| {
        let row = inputs
            .get("row")
            .ok_or_else(|| FrameError::Type("input 'row' has no value".to_string()))?;
        Ok(inputs.table("df")?.add_row(row_data(row)?)?.into())
    })
    .with_description("Appends one row given as a list or a column mapping")
    .input(table_input("df"))
    .input(PortSpec::required("row", PortType::Any))
    .output(table_output("out"))
}

fn concat() -> NodeDescriptor {
    NodeDescriptor::new("table.concat", "Concatenate", |inputs| {
        Ok(inputs.table("df1")?.concat(inputs.table("df2")?)?.into())
    })
    .input(table_input("df1"))
    .input(table_input("df2"))
    .output(table_output("out"))
}

fn how_port(default: JoinHow) -> PortSpec {
    PortSpec::optional("how", PortType::Text)
        .with_default(default.as_str())
        .with_options(text_choices(JoinHow::ALL.iter().map(|h| h.as_str())))
}

fn merge(config: &LibraryConfig) -> NodeDescriptor {
    NodeDescriptor::new("table.merge", "Merge", |inputs| {
        let how: JoinHow = inputs.text("how")?.parse()?;
        let left_on = name_list(inputs, "left_on")?;
        let right_on = name_list(inputs, "right_on")?;
        let left_on = left_on.as_deref().map(as_strs);
        let right_on = right_on.as_deref().map(as_strs);
        let left = inputs.table("df_left")?;
        Ok(left
            .merge(inputs.table("df_right")?, how, left_on.as_deref(), right_on.as_deref())?
            .into())
    })
    .with_description("Database-style join on key columns")
    .input(table_input("df_left"))
    .input(table_input("df_right"))
    .input(how_port(config.merge_how))
    .input(PortSpec::optional("left_on", PortType::Names))
    .input(PortSpec::optional("right_on", PortType::Names))
    .output(table_output("df"))
    .rule(ReactiveRule::column_choices("df_left", "left_on"))
    .rule(ReactiveRule::column_choices("df_right", "right_on"))
}

fn join(config: &LibraryConfig) -> NodeDescriptor {
    NodeDescriptor::new("table.join", "Join", |inputs| {
        let how: JoinHow = inputs.text("how")?.parse()?;
        let on = inputs.opt_text("on")?;
        let lsuffix = inputs.opt_text("lsuffix")?.unwrap_or_default();
        let rsuffix = inputs.opt_text("rsuffix")?.unwrap_or_default();
        let left = inputs.table("df_left")?;
        Ok(left
            .join(inputs.table("df_right")?, how, on.as_deref(), &lsuffix, &rsuffix)?
            .into())
    })
    .with_description("Joins the right table's index to a left column or the left index")
    .input(table_input("df_left"))
    .input(table_input("df_right"))
    .input(how_port(config.join_how))
    .input(PortSpec::optional("on", PortType::Text))
    .input(PortSpec::optional("lsuffix", PortType::Text).with_default(""))
    .input(PortSpec::optional("rsuffix", PortType::Text).with_default(""))
    .output(table_output("df"))
    .rule(ReactiveRule::column_choices("df_left", "on"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeInstance;
    use crate::table::Table;
    use serde_json::json;
    use std::sync::Arc;

    fn sample() -> Table {
        Table::new(
            vec![
                ("A".to_string(), vec![1.into(), Scalar::Null, 1.into()]),
                ("B".to_string(), vec!["x".into(), "y".into(), "x".into()]),
            ],
            None,
        )
        .unwrap()
    }

    fn invoke(node: NodeDescriptor, inputs: Vec<(&str, Value)>) -> Table {
        let mut instance = NodeInstance::new(Arc::new(node));
        for (port, value) in inputs {
            instance.set_input(port, value).unwrap();
        }
        let outputs = instance.invoke().unwrap().unwrap();
        outputs[0].as_table().unwrap().clone()
    }

    #[test]
    fn test_dropna_defaults_drop_rows() {
        let out = invoke(dropna(), vec![("df", sample().into())]);
        assert_eq!(out.index().labels(), &[Scalar::Int(0), Scalar::Int(2)]);
        let out = invoke(
            dropna(),
            vec![("df", sample().into()), ("axis", "columns".into())],
        );
        assert_eq!(out.column_names(), vec!["B"]);
    }

    #[test]
    fn test_drop_duplicates_subset() {
        let out = invoke(
            drop_duplicates(),
            vec![("df", sample().into()), ("subset", "B".into())],
        );
        assert_eq!(out.row_count(), 2);
    }

    #[test]
    fn test_drop_rows_coerces_text_labels() {
        let out = invoke(drop_rows(), vec![("df", sample().into()), ("rows", "0, 2".into())]);
        assert_eq!(out.index().labels(), &[Scalar::Int(1)]);
        let empty = invoke(drop_rows(), vec![("df", Table::empty().into()), ("rows", "5".into())]);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_drop_nodes_accept_lists() {
        let out = invoke(
            drop_rows(),
            vec![("df", sample().into()), ("rows", Value::List(vec![0i64.into(), 2i64.into()]))],
        );
        assert_eq!(out.index().labels(), &[Scalar::Int(1)]);

        let out = invoke(
            drop_columns(),
            vec![("df", sample().into()), ("columns", Value::Json(json!(["A"])))],
        );
        assert_eq!(out.column_names(), vec!["B"]);
    }

    #[test]
    fn test_add_row_from_mapping_and_list() {
        let out = invoke(
            add_row(),
            vec![("df", sample().into()), ("row", json!({"A": 7, "B": "z"}).into())],
        );
        assert_eq!(out.row_count(), 4);
        assert_eq!(out.index().labels()[3], Scalar::Int(0));

        let mut node = NodeInstance::new(Arc::new(add_row()));
        node.set_input("df", sample()).unwrap();
        node.set_input("row", Value::List(vec![1i64.into()])).unwrap();
        let err = node.invoke().unwrap_err();
        assert!(matches!(err.source, FrameError::Arity { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_add_column_shares_set_column_ports() {
        let node = add_column();
        assert_eq!(node.id, "table.add_column");
        assert!(node.get_input("data").is_some());
        assert_eq!(node.rules.len(), 1);
    }
}
