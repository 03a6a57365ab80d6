//! Series nodes.

use crate::error::{FrameError, Result};
use crate::node::{NodeDescriptor, PortSpec, PortType, ReactiveRule, Shelf, Value};
use crate::table::{RowIndex, Scalar, Series};

use super::rows_cols::position;

pub(super) fn shelf() -> Shelf {
    Shelf::new("Series")
        .with_description("Single labelled columns")
        .node(to_dict())
        .node(values())
        .node(values().renamed("table.ser.to_list", "To List"))
        .node(loc())
        .node(iloc())
        .node(from_dict())
        .node(from_list())
}

fn series_input() -> PortSpec {
    PortSpec::required("ser", PortType::Series)
}

fn name_port() -> PortSpec {
    PortSpec::optional("name", PortType::Text)
}

fn to_dict() -> NodeDescriptor {
    NodeDescriptor::new("table.ser.to_dict", "To Dictionary", |inputs| {
        let series = inputs.series("ser")?;
        let map = series
            .index()
            .labels()
            .iter()
            .zip(series.values())
            .map(|(label, value)| (label.to_key(), value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        Ok(Value::Json(serde_json::Value::Object(map)))
    })
    .with_description("Maps each label to its value")
    .input(series_input())
    .output(PortSpec::output("dict", PortType::Mapping))
}

fn values() -> NodeDescriptor {
    NodeDescriptor::new("table.ser.values", "Values", |inputs| {
        let series = inputs.series("ser")?;
        Ok(Value::List(series.values().iter().cloned().map(Value::Scalar).collect()))
    })
    .input(series_input())
    .output(PortSpec::output("list", PortType::Sequence))
}

fn loc() -> NodeDescriptor {
    NodeDescriptor::new("table.ser.loc", "Get by Label", |inputs| {
        Ok(inputs.series("ser")?.loc(&inputs.scalar("label")?)?.clone().into())
    })
    .input(series_input())
    .input(PortSpec::required("label", PortType::Scalar))
    .output(PortSpec::output("value", PortType::Scalar))
    .rule(ReactiveRule::row_choices("ser", "label"))
}

fn iloc() -> NodeDescriptor {
    NodeDescriptor::new("table.ser.iloc", "Get by Position", |inputs| {
        let series = inputs.series("ser")?;
        Ok(series.iloc(position(inputs.int("index")?, series.len())?)?.clone().into())
    })
    .input(series_input())
    .input(PortSpec::optional("index", PortType::Integer).with_default(0i64))
    .output(PortSpec::output("value", PortType::Scalar))
    .rule(ReactiveRule::position_bounds("ser", "index"))
}

fn from_dict() -> NodeDescriptor {
    NodeDescriptor::new("table.ser.from_dict", "From Dictionary", |inputs| {
        let data = inputs.json("data")?;
        let map = data.as_object().ok_or_else(|| {
            FrameError::Type("input 'data' expects a mapping".to_string())
        })?;
        let values = map.values().map(Scalar::from_json).collect::<Result<Vec<_>>>()?;
        let index = RowIndex::from_keys(map.keys().map(String::as_str));
        Ok(Series::new(inputs.opt_text("name")?, values, index)?.into())
    })
    .input(PortSpec::required("data", PortType::Mapping))
    .input(name_port())
    .output(PortSpec::output("series", PortType::Series))
}

fn from_list() -> NodeDescriptor {
    NodeDescriptor::new("table.ser.from_list", "From List", |inputs| {
        Ok(Series::from_values(inputs.opt_text("name")?, inputs.scalars("data")?).into())
    })
    .input(PortSpec::required("data", PortType::Sequence))
    .input(name_port())
    .output(PortSpec::output("series", PortType::Series))
}
