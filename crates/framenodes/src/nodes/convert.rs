//! Conversion nodes: interchange values, CSV text, spreadsheets, arrays.

use crate::config::{CsvOptions, DecimalMarker, LibraryConfig, Separator, SheetOptions};
use crate::error::{FrameError, Result};
use crate::interchange::{
    decode, decode_auto, decode_csv, decode_sheet, encode, encode_csv, encode_sheet, from_array,
    sheet_names, Orientation, SheetSelector,
};
use crate::node::{Inputs, NodeDescriptor, PortSpec, PortType, ReactiveRule, Shelf, Value, ValueOptions};
use crate::table::Scalar;

use super::{name_list, rows_from_value, table_input, table_output, text_choices};

pub(super) fn shelf(config: &LibraryConfig) -> Shelf {
    Shelf::new("Convert")
        .with_description("Conversions between tables and other formats")
        .node(to_dict())
        .node(to_orient_dict(config))
        .node(from_dict())
        .node(from_orient_dict(config))
        .node(from_csv_str(config))
        .node(to_csv_str(config))
        .node(from_xlsx(config))
        .node(to_xlsx(config))
        .node(from_array_node())
}

fn orient_port(config: &LibraryConfig) -> PortSpec {
    PortSpec::optional("orient", PortType::Text)
        .with_default(config.orient.as_str())
        .with_options(text_choices(Orientation::ALL.iter().map(|o| o.as_str())))
}

fn csv_ports(node: NodeDescriptor, csv: &CsvOptions) -> NodeDescriptor {
    let mut thousands = PortSpec::optional("thousands", PortType::Text)
        .with_options(text_choices(DecimalMarker::ALL.iter().map(|d| d.as_str())));
    if let Some(marker) = csv.thousands {
        thousands = thousands.with_default(marker.as_str());
    }
    node.input(
        PortSpec::optional("sep", PortType::Text)
            .with_default(csv.separator.as_str())
            .with_options(text_choices(Separator::ALL.iter().map(|s| s.as_str()))),
    )
    .input(
        PortSpec::optional("decimal", PortType::Text)
            .with_default(csv.decimal.as_str())
            .with_options(text_choices(DecimalMarker::ALL.iter().map(|d| d.as_str()))),
    )
    .input(thousands)
}

fn csv_options(inputs: &Inputs) -> Result<CsvOptions> {
    let mut options = CsvOptions::default()
        .with_separator(inputs.text("sep")?.parse()?)
        .with_decimal(inputs.text("decimal")?.parse()?);
    if let Some(thousands) = inputs.opt_text("thousands")? {
        options = options.with_thousands(Some(thousands.parse()?));
    }
    options.validate()?;
    Ok(options)
}

fn to_dict() -> NodeDescriptor {
    NodeDescriptor::new("table.to_dict", "To Dictionary", |inputs| {
        Ok(Value::Json(encode(inputs.table("df")?, Orientation::Split)?))
    })
    .with_description("Encodes a table in split orientation")
    .input(table_input("df"))
    .output(PortSpec::output("dict", PortType::Mapping))
}

fn to_orient_dict(config: &LibraryConfig) -> NodeDescriptor {
    NodeDescriptor::new("table.to_orient_dict", "To Dictionary with Orientation", |inputs| {
        let orient: Orientation = inputs.text("orient")?.parse()?;
        Ok(Value::Json(encode(inputs.table("df")?, orient)?))
    })
    .input(table_input("df"))
    .input(orient_port(config))
    .output(PortSpec::output("dict", PortType::Mapping))
}

fn from_dict() -> NodeDescriptor {
    NodeDescriptor::new("table.from_dict", "From Dictionary", |inputs| {
        Ok(decode_auto(&inputs.json("data")?)?.into())
    })
    .with_description("Decodes a table, detecting the orientation")
    .input(PortSpec::required("data", PortType::Mapping))
    .output(table_output("df"))
}

fn from_orient_dict(config: &LibraryConfig) -> NodeDescriptor {
    NodeDescriptor::new("table.from_orient_dict", "From Dictionary with Orientation", |inputs| {
        let orient: Orientation = inputs.text("orient")?.parse()?;
        Ok(decode(&inputs.json("data")?, orient)?.into())
    })
    .input(PortSpec::required("data", PortType::Mapping))
    .input(orient_port(config))
    .output(table_output("df"))
}

fn from_csv_str(config: &LibraryConfig) -> NodeDescriptor {
    let node = NodeDescriptor::new("table.from_csv_str", "From CSV", |inputs| {
        Ok(decode_csv(&inputs.text("source")?, &csv_options(inputs)?)?.into())
    })
    .with_description("Parses CSV text into a table")
    .input(PortSpec::required("source", PortType::Text));
    csv_ports(node, &config.csv).output(table_output("df"))
}

fn to_csv_str(config: &LibraryConfig) -> NodeDescriptor {
    let node = NodeDescriptor::new("table.to_csv_str", "To CSV", |inputs| {
        let options = csv_options(inputs)?.with_index(inputs.bool("index")?);
        Ok(encode_csv(inputs.table("df")?, &options)?.into())
    })
    .input(table_input("df"));
    csv_ports(node, &config.csv)
        .input(PortSpec::optional("index", PortType::Boolean).with_default(config.csv.include_index))
        .output(PortSpec::output("csv", PortType::Text))
}

fn sheet_selector(inputs: &Inputs) -> Result<Option<SheetSelector>> {
    if !inputs.is_set("sheet") {
        return Ok(None);
    }
    match inputs.scalar("sheet")? {
        Scalar::Text(name) => Ok(Some(SheetSelector::Name(name))),
        Scalar::Int(position) => usize::try_from(position)
            .map(|p| Some(SheetSelector::Position(p)))
            .map_err(|_| FrameError::Lookup(format!("no sheet at position {}", position))),
        other => Err(FrameError::Type(format!(
            "input 'sheet' expects a name or position, got '{}'",
            other
        ))),
    }
}

fn from_xlsx(config: &LibraryConfig) -> NodeDescriptor {
    NodeDescriptor::new("table.from_xlsx", "From Excel", |inputs| {
        let selector = sheet_selector(inputs)?;
        Ok(decode_sheet(inputs.bytes("data")?, selector.as_ref(), inputs.bool("with_index")?)?.into())
    })
    .with_description("Reads one sheet of an xlsx workbook")
    .input(PortSpec::required("data", PortType::Bytes))
    .input(PortSpec::optional("sheet", PortType::Scalar))
    .input(
        PortSpec::optional("with_index", PortType::Boolean)
            .with_default(config.sheet.use_first_column_as_index),
    )
    .output(table_output("df"))
    .rule(ReactiveRule::new("data", "sheet", |value| match value {
        Value::Bytes(bytes) => sheet_names(bytes)
            .ok()
            .map(|names| ValueOptions::choices(names.into_iter().map(Scalar::from).collect())),
        _ => None,
    }))
}

fn to_xlsx(config: &LibraryConfig) -> NodeDescriptor {
    NodeDescriptor::new("table.to_xlsx", "To Excel", |inputs| {
        let options = SheetOptions {
            sheet_name: inputs.text("sheet_name")?,
            include_index: inputs.bool("with_index")?,
            ..SheetOptions::default()
        };
        Ok(Value::Bytes(encode_sheet(inputs.table("df")?, &options)?))
    })
    .input(table_input("df"))
    .input(PortSpec::optional("sheet_name", PortType::Text).with_default(config.sheet.sheet_name.as_str()))
    .input(PortSpec::optional("with_index", PortType::Boolean).with_default(config.sheet.include_index))
    .output(PortSpec::output("xls", PortType::Bytes))
}

fn from_array_node() -> NodeDescriptor {
    NodeDescriptor::new("table.from_array", "From Array", |inputs| {
        let data = inputs
            .get("data")
            .ok_or_else(|| FrameError::Type("input 'data' has no value".to_string()))?;
        let rows = rows_from_value("data", data)?;
        let index = inputs.opt_scalars("index")?;
        Ok(from_array(rows, name_list(inputs, "columns")?, index)?.into())
    })
    .with_description("Builds a table from a two-dimensional array")
    .input(PortSpec::required("data", PortType::Sequence))
    .input(PortSpec::optional("columns", PortType::Sequence))
    .input(PortSpec::optional("index", PortType::Sequence))
    .output(table_output("df"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeInstance;
    use serde_json::json;
    use std::sync::Arc;

    fn run(node: NodeDescriptor, inputs: Vec<(&str, Value)>) -> Value {
        let mut instance = NodeInstance::new(Arc::new(node));
        for (port, value) in inputs {
            instance.set_input(port, value).unwrap();
        }
        let outputs = instance.invoke().unwrap().unwrap();
        outputs[0].clone()
    }

    #[test]
    fn test_csv_nodes_use_configured_defaults() {
        let config = LibraryConfig::default();
        let df = run(from_csv_str(&config), vec![("source", "A,B\n1,2.5\n".into())]);
        let csv = run(to_csv_str(&config), vec![("df", df)]);
        assert_eq!(csv, Value::from("A,B\n1,2.5\n"));
    }

    #[test]
    fn test_semicolon_comma_decimal() {
        let config = LibraryConfig::default();
        let df = run(
            from_csv_str(&config),
            vec![
                ("source", "A;B\n1,5;x\n".into()),
                ("sep", ";".into()),
                ("decimal", ",".into()),
            ],
        );
        let table = df.as_table().unwrap();
        assert_eq!(table.column("A").unwrap().values(), &[Scalar::Float(1.5)]);
    }

    #[test]
    fn test_from_array_with_json_rows() {
        let df = run(from_array_node(), vec![("data", json!([[1, 2], [3, 4]]).into())]);
        assert_eq!(df.as_table().unwrap().column_names(), vec!["Col 1", "Col 2"]);
    }

    #[test]
    fn test_orient_dict_round_trip() {
        let config = LibraryConfig::default();
        let data = json!({"A": [1, 2], "B": ["x", "y"]});
        let df = run(
            from_orient_dict(&config),
            vec![("data", data.clone().into()), ("orient", "list".into())],
        );
        let back = run(to_orient_dict(&config), vec![("df", df), ("orient", "list".into())]);
        assert_eq!(back, Value::Json(data));
    }
}
