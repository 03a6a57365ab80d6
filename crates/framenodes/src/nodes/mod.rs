//! The table node library.
//!
//! Every node here is a thin forwarding call into the [`table`](crate::table)
//! engine or the [`interchange`](crate::interchange) codec, declared with
//! ports and reactive rules. [`library`] assembles them into shelves.

mod convert;
mod grouping;
mod manipulation;
mod mask;
mod math;
mod rows_cols;
mod series;

use crate::config::LibraryConfig;
use crate::error::{FrameError, Result};
use crate::node::{Inputs, NodeRegistry, PortSpec, PortType, Shelf, Value, ValueOptions};
use crate::table::{split_names, CellData, Scalar};

/// The root shelf ("Tables") with its seven sub-shelves. Port defaults come
/// from `config`.
pub fn library(config: &LibraryConfig) -> Shelf {
    Shelf::new("Tables")
        .with_description("Tabular data operations")
        .subshelf(convert::shelf(config))
        .subshelf(rows_cols::shelf())
        .subshelf(manipulation::shelf(config))
        .subshelf(mask::shelf())
        .subshelf(math::shelf(config))
        .subshelf(grouping::shelf())
        .subshelf(series::shelf())
}

/// A registry holding every node of [`library`].
pub fn registry(config: &LibraryConfig) -> Result<NodeRegistry> {
    NodeRegistry::from_shelf(&library(config))
}

fn table_input(name: &str) -> PortSpec {
    PortSpec::required(name, PortType::Table)
}

fn table_output(name: &str) -> PortSpec {
    PortSpec::output(name, PortType::Table)
}

fn text_choices<'a>(choices: impl IntoIterator<Item = &'a str>) -> ValueOptions {
    ValueOptions::choices(choices.into_iter().map(Scalar::from).collect())
}

/// Row-major cells from a list of lists or a JSON array of arrays.
fn rows_from_value(port: &str, value: &Value) -> Result<Vec<Vec<Scalar>>> {
    let rows = value.as_list().ok_or_else(|| {
        FrameError::Type(format!("input '{}' expects a list of rows", port))
    })?;
    rows.iter()
        .map(|row| {
            row.as_list()
                .ok_or_else(|| FrameError::Type(format!("input '{}' expects row lists", port)))?
                .iter()
                .map(|cell| {
                    cell.as_scalar().ok_or_else(|| {
                        FrameError::Type(format!("input '{}' expects single-value cells", port))
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

/// Assigned cell data: a list assigns one value per cell, anything else
/// broadcasts.
fn cell_data(inputs: &Inputs, port: &str) -> Result<CellData> {
    let value = inputs
        .get(port)
        .ok_or_else(|| FrameError::Type(format!("input '{}' has no value", port)))?;
    if let Some(items) = value.as_list() {
        let values = items
            .iter()
            .map(|item| {
                item.as_scalar().ok_or_else(|| {
                    FrameError::Type(format!("input '{}' expects single values", port))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        return Ok(CellData::Values(values));
    }
    Ok(CellData::Broadcast(inputs.scalar(port)?))
}

/// Names given as comma-separated text or as a list. Unset yields `None`.
fn name_list(inputs: &Inputs, port: &str) -> Result<Option<Vec<String>>> {
    if !inputs.is_set(port) {
        return Ok(None);
    }
    match inputs.get(port).and_then(Value::as_list) {
        Some(items) => items
            .iter()
            .map(|item| match item.as_scalar() {
                Some(Scalar::Text(s)) => Ok(s),
                Some(other) if !other.is_null() => Ok(other.to_string()),
                _ => Err(FrameError::Type(format!("input '{}' expects names", port))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        None => Ok(Some(split_names(&inputs.text(port)?))),
    }
}

/// Row labels given as comma-separated text or as a list of values.
fn label_list(inputs: &Inputs, port: &str) -> Result<Vec<Scalar>> {
    match inputs.get(port).and_then(Value::as_list) {
        Some(_) => inputs.scalars(port),
        None => Ok(split_names(&inputs.text(port)?)
            .into_iter()
            .map(Scalar::from)
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_library_ids_unique_and_registered() {
        let shelf = library(&LibraryConfig::default());
        assert_eq!(shelf.subshelves.len(), 7);
        let nodes = shelf.all_nodes();
        let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids.len(), nodes.len());
        let registry = registry(&LibraryConfig::default()).unwrap();
        assert_eq!(registry.len(), nodes.len());
        for id in ["table.to_dict", "table.gr.mean", "table.ser.iloc", "table.eval"] {
            assert!(registry.get(id).is_some(), "missing {}", id);
        }
    }

    #[test]
    fn test_name_list_accepts_text_and_lists() {
        let mut values = indexmap::IndexMap::new();
        values.insert("a".to_string(), Value::from("x, y"));
        values.insert("b".to_string(), Value::List(vec!["p".into(), "q".into()]));
        let inputs = Inputs::new(values);
        assert_eq!(name_list(&inputs, "a").unwrap().unwrap(), vec!["x", "y"]);
        assert_eq!(name_list(&inputs, "b").unwrap().unwrap(), vec!["p", "q"]);
        assert!(name_list(&inputs, "c").unwrap().is_none());
    }
}
