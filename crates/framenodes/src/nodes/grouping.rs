//! Grouping nodes.

use crate::error::Result;
use crate::node::{NodeDescriptor, PortSpec, PortType, ReactiveRule, Shelf, Value};
use crate::table::{GroupBy, Table};

use super::{name_list, table_input, table_output};

pub(super) fn shelf() -> Shelf {
    Shelf::new("Grouping")
        .with_description("Grouping rows by key columns and aggregating")
        .node(groupby_column())
        .node(groupby())
        .node(aggregate("table.gr.mean", "Group Mean", GroupBy::mean))
        .node(aggregate("table.gr.sum", "Group Sum", GroupBy::sum))
        .node(aggregate("table.gr.max", "Group Max", GroupBy::max))
        .node(aggregate("table.gr.min", "Group Min", GroupBy::min))
        .node(aggregate("table.gr.std", "Group Standard Deviation", GroupBy::std))
        .node(aggregate("table.gr.var", "Group Variance", GroupBy::var))
        .node(aggregate("table.gr.count", "Group Count", GroupBy::count))
        .node(aggregate("table.gr.describe", "Group Describe", GroupBy::describe))
        .node(group_to_list())
        .node(get_df_from_group())
}

fn group_input() -> PortSpec {
    PortSpec::required("group", PortType::Group)
}

fn groupby_column() -> NodeDescriptor {
    NodeDescriptor::new("table.gr.groupby_column", "Group by Column", |inputs| {
        let column = inputs.text("column")?;
        Ok(inputs.table("df")?.group_by(&[column.as_str()])?.into())
    })
    .input(table_input("df"))
    .input(PortSpec::required("column", PortType::Text))
    .output(PortSpec::output("group", PortType::Group))
    .rule(ReactiveRule::column_choices("df", "column"))
}

fn groupby() -> NodeDescriptor {
    NodeDescriptor::new("table.gr.groupby", "Group by Columns", |inputs| {
        let keys = name_list(inputs, "by")?.unwrap_or_default();
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        Ok(inputs.table("df")?.group_by(&keys)?.into())
    })
    .input(table_input("df"))
    .input(
        PortSpec::required("by", PortType::Names)
            .with_description("Key columns, comma-separated or as a list"),
    )
    .output(PortSpec::output("grouped", PortType::Group))
}

fn aggregate(id: &str, name: &str, aggregation: fn(&GroupBy) -> Result<Table>) -> NodeDescriptor {
    NodeDescriptor::new(id, name, move |inputs| {
        Ok(aggregation(inputs.group("group")?)?.into())
    })
    .input(group_input())
    .output(table_output("out"))
}

fn group_to_list() -> NodeDescriptor {
    NodeDescriptor::new("table.gr.group_to_list", "Group to List", |inputs| {
        let tables = inputs.group("group")?.tables();
        Ok(Value::List(tables.into_iter().map(Value::Table).collect()))
    })
    .with_description("One table per group, in key order")
    .input(group_input())
    .output(PortSpec::output("list", PortType::Sequence))
}

fn get_df_from_group() -> NodeDescriptor {
    NodeDescriptor::new("table.gr.get_df_from_group", "Get Group", |inputs| {
        Ok(inputs.group("group")?.get_group(&inputs.scalar("name")?)?.into())
    })
    .input(group_input())
    .input(PortSpec::required("name", PortType::Scalar))
    .output(table_output("df"))
    .rule(ReactiveRule::group_choices("group", "name"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FrameError;
    use crate::node::NodeInstance;
    use crate::table::Scalar;
    use std::sync::Arc;

    fn sample() -> Table {
        Table::new(
            vec![
                ("k".to_string(), vec!["b".into(), "a".into(), "b".into()]),
                ("v".to_string(), vec![1.into(), 2.into(), 3.into()]),
            ],
            None,
        )
        .unwrap()
    }

    fn grouped() -> Value {
        let mut node = NodeInstance::new(Arc::new(groupby_column()));
        node.set_input("df", sample()).unwrap();
        node.set_input("column", "k").unwrap();
        node.invoke().unwrap().unwrap()["group"].clone()
    }

    #[test]
    fn test_group_sum_indexed_by_key() {
        let mut node = NodeInstance::new(Arc::new(aggregate("g.sum", "Sum", GroupBy::sum)));
        node.set_input("group", grouped()).unwrap();
        let outputs = node.invoke().unwrap().unwrap();
        let out = outputs["out"].as_table().unwrap();
        assert_eq!(out.index().labels(), &[Scalar::from("a"), Scalar::from("b")]);
        assert_eq!(out.index().name(), Some("k"));
        assert_eq!(out.column("v").unwrap().values(), &[Scalar::Int(2), Scalar::Int(4)]);
    }

    #[test]
    fn test_get_group_choices_and_lookup() {
        let mut node = NodeInstance::new(Arc::new(get_df_from_group()));
        node.set_input("group", grouped()).unwrap();
        let choices = node.value_options("name").unwrap().choices.clone().unwrap();
        assert_eq!(choices, vec![Scalar::from("a"), Scalar::from("b")]);

        node.set_input("name", "b").unwrap();
        let outputs = node.invoke().unwrap().unwrap();
        assert_eq!(outputs["df"].as_table().unwrap().row_count(), 2);

        node.set_input("name", "c").unwrap();
        assert!(matches!(node.invoke().unwrap_err().source, FrameError::Lookup(_)));
    }

    #[test]
    fn test_group_to_list() {
        let mut node = NodeInstance::new(Arc::new(group_to_list()));
        node.set_input("group", grouped()).unwrap();
        let outputs = node.invoke().unwrap().unwrap();
        assert_eq!(outputs["list"].as_list().unwrap().len(), 2);
    }
}
