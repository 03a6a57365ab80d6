//! Statistics and expression nodes.

use crate::config::LibraryConfig;
use crate::error::Result;
use crate::node::{NodeDescriptor, PortSpec, PortType, Shelf, Value, ValueOptions};
use crate::table::{Evaluated, Series, Table};

use super::{table_input, table_output};

pub(super) fn shelf(config: &LibraryConfig) -> Shelf {
    Shelf::new("Math")
        .with_description("Statistics over numeric columns")
        .node(table_stat("table.corr", "Correlation", "correlation", Table::corr))
        .node(table_stat("table.cov", "Covariance", "covariance", Table::cov))
        .node(column_stat("table.mean", "Mean", "mean", Table::mean))
        .node(column_stat("table.median", "Median", "median", Table::median))
        .node(column_stat("table.std", "Standard Deviation", "std", Table::std))
        .node(column_stat("table.sum", "Sum", "sum", Table::sum))
        .node(column_stat("table.var", "Variance", "var", Table::var))
        .node(quantile(config))
        .node(table_stat("table.describe", "Describe", "description", Table::describe))
        .node(table_stat("table.value_counts", "Value Counts", "value_counts", Table::value_counts))
        .node(eval())
}

fn table_stat(
    id: &str,
    name: &str,
    output: &str,
    stat: fn(&Table) -> Result<Table>,
) -> NodeDescriptor {
    NodeDescriptor::new(id, name, move |inputs| Ok(stat(inputs.table("df")?)?.into()))
        .input(table_input("df"))
        .output(table_output(output))
}

/// One value per numeric column, as a series indexed by column name.
fn column_stat(
    id: &str,
    name: &str,
    output: &str,
    stat: fn(&Table) -> Result<Series>,
) -> NodeDescriptor {
    NodeDescriptor::new(id, name, move |inputs| Ok(stat(inputs.table("df")?)?.into()))
        .input(table_input("df"))
        .output(PortSpec::output(output, PortType::Series))
}

fn quantile(config: &LibraryConfig) -> NodeDescriptor {
    NodeDescriptor::new("table.quantile", "Quantile", |inputs| {
        Ok(inputs.table("df")?.quantile(inputs.float("q")?)?.into())
    })
    .input(table_input("df"))
    .input(
        PortSpec::optional("q", PortType::Float)
            .with_default(config.quantile)
            .with_options(ValueOptions::bounds(0.0, 1.0, 0.01)),
    )
    .output(PortSpec::output("quantile", PortType::Series))
}

fn eval() -> NodeDescriptor {
    NodeDescriptor::new("table.eval", "Evaluate", |inputs| {
        Ok(match inputs.table("df")?.eval(&inputs.text("expr")?)? {
            Evaluated::Table(table) => Value::Table(table),
            Evaluated::Series(series) => Value::Series(series),
        })
    })
    .with_description("Evaluates an expression over the columns; `D = A + B` adds column D")
    .input(table_input("df"))
    .input(PortSpec::required("expr", PortType::Text))
    .output(PortSpec::output("result", PortType::Any))
}
