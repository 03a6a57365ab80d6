//! Row filtering nodes.

use crate::error::{FrameError, Result};
use crate::node::{NodeDescriptor, PortSpec, PortType, Shelf};

use super::{table_input, table_output};

pub(super) fn shelf() -> Shelf {
    Shelf::new("Mask")
        .with_description("Filtering rows by condition or boolean mask")
        .node(filter())
        .node(mask())
}

fn filter() -> NodeDescriptor {
    NodeDescriptor::new("table.filter", "Filter", |inputs| {
        Ok(inputs.table("df")?.filter(&inputs.text("condition")?)?.into())
    })
    .with_description("Keeps the rows for which a boolean expression holds, e.g. `A > 1 and B != \"x\"`")
    .input(table_input("df"))
    .input(PortSpec::required("condition", PortType::Text))
    .output(table_output("filtered"))
}

fn mask() -> NodeDescriptor {
    NodeDescriptor::new("table.mask", "Mask", |inputs| {
        let flags = inputs
            .scalars("mask")?
            .iter()
            .map(|s| {
                s.as_bool().ok_or_else(|| {
                    FrameError::Type(format!("input 'mask' expects booleans, got '{}'", s))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(inputs.table("df")?.mask(&flags)?.into())
    })
    .with_description("Keeps the rows whose mask entry is true")
    .input(table_input("df"))
    .input(PortSpec::required("mask", PortType::Sequence))
    .output(table_output("masked"))
}
