//! Table interchange codec.
//!
//! Pure conversions between [`Table`](crate::table::Table) and external
//! representations: dictionary orientations, delimited text, spreadsheet
//! bytes and raw arrays. Nothing here performs I/O beyond the given buffer.

mod array;
mod delimited;
mod orient;
mod sheet;

pub use array::{from_array, rows_from_json};
pub use delimited::{decode_csv, encode_csv};
pub use orient::{decode, decode_auto, encode, Orientation};
pub use sheet::{decode_sheet, encode_sheet, sheet_names, SheetSelector};
