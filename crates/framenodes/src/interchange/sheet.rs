//! Spreadsheet (xlsx) codec.

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, DataType, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::config::SheetOptions;
use crate::error::{FrameError, Result};
use crate::table::{ColumnType, RowIndex, Scalar, Table};

/// Number format applied to timestamp cells.
const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Which sheet of a workbook to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    Name(String),
    Position(usize),
}

impl From<&str> for SheetSelector {
    fn from(name: &str) -> Self {
        SheetSelector::Name(name.to_string())
    }
}

impl From<usize> for SheetSelector {
    fn from(position: usize) -> Self {
        SheetSelector::Position(position)
    }
}

fn open(bytes: &[u8]) -> Result<Xlsx<Cursor<&[u8]>>> {
    Ok(open_workbook_from_rs(Cursor::new(bytes))?)
}

/// Names of the sheets in a workbook, in order.
pub fn sheet_names(bytes: &[u8]) -> Result<Vec<String>> {
    Ok(open(bytes)?.sheet_names())
}

/// Read one sheet into a table.
///
/// Without a selector the first sheet is read. The first row holds the
/// column names; empty header cells become `Unnamed: <position>`. Numeric
/// columns whose values are all integral and present decode as integers.
pub fn decode_sheet(
    bytes: &[u8],
    selector: Option<&SheetSelector>,
    use_first_column_as_index: bool,
) -> Result<Table> {
    let mut workbook = open(bytes)?;
    let range = match selector {
        None | Some(SheetSelector::Position(_)) => {
            let position = match selector {
                Some(SheetSelector::Position(p)) => *p,
                _ => 0,
            };
            workbook.worksheet_range_at(position).ok_or_else(|| {
                FrameError::Lookup(format!("worksheet at position {} not found", position))
            })??
        }
        Some(SheetSelector::Name(name)) => {
            if !workbook.sheet_names().iter().any(|n| n == name) {
                return Err(FrameError::Lookup(format!("worksheet '{}' not found", name)));
            }
            workbook.worksheet_range(name)?
        }
    };

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::empty());
    };
    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(position, cell)| match cell {
            Data::Empty => format!("Unnamed: {}", position),
            Data::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    let mut columns: Vec<Vec<Scalar>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (column, cell) in columns.iter_mut().zip(row) {
            column.push(read_cell(cell));
        }
    }
    let mut columns: Vec<(String, Vec<Scalar>)> = names
        .into_iter()
        .zip(columns)
        .map(|(name, values)| (name, integral_to_int(values)))
        .collect();

    if use_first_column_as_index && !columns.is_empty() {
        let (name, labels) = columns.remove(0);
        let name = (!name.starts_with("Unnamed: ")).then_some(name);
        let index = RowIndex::new(labels).with_name(name);
        return Table::new(columns, Some(index));
    }
    Table::new(columns, None)
}

fn read_cell(cell: &Data) -> Scalar {
    match cell {
        Data::Empty => Scalar::Null,
        Data::Int(i) => Scalar::Int(*i),
        Data::Float(f) => Scalar::Float(*f),
        Data::Bool(b) => Scalar::Bool(*b),
        Data::String(s) => Scalar::Text(s.clone()),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(Scalar::Timestamp)
            .unwrap_or_else(|| Scalar::Text(cell.to_string())),
        Data::DurationIso(s) => Scalar::Text(s.clone()),
        Data::Error(_) => Scalar::Null,
    }
}

/// Spreadsheets store every number as a float.
fn integral_to_int(values: Vec<Scalar>) -> Vec<Scalar> {
    let integral = ColumnType::infer(&values) == ColumnType::Float
        && !values.is_empty()
        && values.iter().all(|v| match v {
            Scalar::Float(f) => f.fract() == 0.0 && f.abs() < i64::MAX as f64,
            Scalar::Int(_) => true,
            _ => false,
        });
    if !integral {
        return values;
    }
    values
        .into_iter()
        .map(|v| match v {
            Scalar::Float(f) => Scalar::Int(f as i64),
            other => other,
        })
        .collect()
}

/// Write a table as a single-sheet workbook.
pub fn encode_sheet(table: &Table, options: &SheetOptions) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&options.sheet_name)?;
    let datetime_format = Format::new().set_num_format(DATETIME_NUM_FORMAT);

    let offset = usize::from(options.include_index);
    if options.include_index {
        if let Some(name) = table.index().name() {
            worksheet.write_string(0, 0, name)?;
        }
    }
    for (position, name) in table.column_names().into_iter().enumerate() {
        worksheet.write_string(0, column_number(position + offset)?, name)?;
    }

    for row in 0..table.row_count() {
        let row_number = u32::try_from(row + 1)
            .map_err(|_| FrameError::Shape(format!("row {} exceeds the sheet size", row)))?;
        if options.include_index {
            if let Some(label) = table.index().get(row) {
                write_cell(worksheet, row_number, 0, label, &datetime_format)?;
            }
        }
        for (position, (_, column)) in table.columns().enumerate() {
            write_cell(
                worksheet,
                row_number,
                column_number(position + offset)?,
                &column.values()[row],
                &datetime_format,
            )?;
        }
    }
    Ok(workbook.save_to_buffer()?)
}

fn column_number(position: usize) -> Result<u16> {
    u16::try_from(position)
        .map_err(|_| FrameError::Shape(format!("column {} exceeds the sheet size", position)))
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    column: u16,
    value: &Scalar,
    datetime_format: &Format,
) -> Result<()> {
    match value {
        v if v.is_null() => {}
        Scalar::Int(i) => {
            worksheet.write_number(row, column, *i as f64)?;
        }
        Scalar::Float(f) => {
            worksheet.write_number(row, column, *f)?;
        }
        Scalar::Bool(b) => {
            worksheet.write_boolean(row, column, *b)?;
        }
        Scalar::Text(s) => {
            worksheet.write_string(row, column, s)?;
        }
        Scalar::Timestamp(t) => {
            worksheet.write_datetime_with_format(row, column, t, datetime_format)?;
        }
        Scalar::Null => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec![
                ("A".to_string(), vec![1.into(), 2.into(), 3.into()]),
                ("B".to_string(), vec!["x".into(), "y".into(), "z".into()]),
                (
                    "C".to_string(),
                    vec![Scalar::Float(1.1), Scalar::Float(2.2), Scalar::Null],
                ),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let bytes = encode_sheet(&sample(), &SheetOptions::default()).unwrap();
        assert_eq!(sheet_names(&bytes).unwrap(), vec!["Sheet1".to_string()]);
        assert_eq!(decode_sheet(&bytes, None, false).unwrap(), sample());
    }

    #[test]
    fn test_round_trip_with_index() {
        let options = SheetOptions {
            sheet_name: "data".to_string(),
            include_index: true,
            ..SheetOptions::default()
        };
        let table = sample().drop_rows(&[Scalar::Int(0)]).unwrap();
        let bytes = encode_sheet(&table, &options).unwrap();
        let selector = SheetSelector::from("data");
        let decoded = decode_sheet(&bytes, Some(&selector), true).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn test_unknown_sheet() {
        let bytes = encode_sheet(&sample(), &SheetOptions::default()).unwrap();
        let selector = SheetSelector::from("missing");
        assert!(matches!(
            decode_sheet(&bytes, Some(&selector), false),
            Err(FrameError::Lookup(_))
        ));
        assert!(matches!(
            decode_sheet(&bytes, Some(&SheetSelector::Position(3)), false),
            Err(FrameError::Lookup(_))
        ));
    }
}
