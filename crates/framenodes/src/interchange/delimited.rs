//! Delimited text (CSV) codec.

use std::collections::HashMap;

use crate::config::CsvOptions;
use crate::error::{FrameError, Result};
use crate::table::{Column, ColumnType, Scalar, Table};

/// Cell texts read as missing values.
const NA_VALUES: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "<NA>"];

/// Timestamp layout written to CSV.
const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse delimited text into a table.
///
/// The first record is the header. Repeated header names get `.1`, `.2`
/// suffixes. Short records are padded with nulls; a record longer than the
/// header is a shape error. A column whose cells do not share one kind is
/// kept as text.
pub fn decode_csv(text: &str, options: &CsvOptions) -> Result<Table> {
    options.validate()?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.separator.as_byte())
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let names = dedupe_names(reader.headers()?.iter());
    if names.is_empty() {
        return Err(FrameError::Interchange("no columns to parse from CSV".to_string()));
    }
    let width = names.len();

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); width];
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > width {
            return Err(FrameError::Shape(format!(
                "expected {} fields in line {}, saw {}",
                width,
                line + 2,
                record.len()
            )));
        }
        for (column, cells) in raw.iter_mut().enumerate() {
            cells.push(record.get(column).unwrap_or_default().to_string());
        }
    }

    let decimal = options.decimal.as_char();
    let thousands = options.thousands.map(|t| t.as_char());
    let columns = names
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| (name, parse_column(&cells, decimal, thousands)))
        .collect();
    Table::new(columns, None)
}

fn dedupe_names<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();
    for header in headers {
        let count = seen.entry(header.to_string()).or_insert(0);
        names.push(if *count == 0 {
            header.to_string()
        } else {
            format!("{}.{}", header, count)
        });
        *count += 1;
    }
    names
}

fn parse_column(cells: &[String], decimal: char, thousands: Option<char>) -> Vec<Scalar> {
    let parsed: Vec<Scalar> = cells
        .iter()
        .map(|c| parse_cell(c, decimal, thousands))
        .collect();
    if ColumnType::infer(&parsed) != ColumnType::Mixed {
        return parsed;
    }
    cells
        .iter()
        .map(|c| {
            if NA_VALUES.contains(&c.trim()) {
                Scalar::Null
            } else {
                Scalar::Text(c.clone())
            }
        })
        .collect()
}

fn parse_cell(raw: &str, decimal: char, thousands: Option<char>) -> Scalar {
    let trimmed = raw.trim();
    if NA_VALUES.contains(&trimmed) {
        return Scalar::Null;
    }
    if let Some(number) = parse_number(trimmed, decimal, thousands) {
        return number;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Scalar::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Scalar::Bool(false);
    }
    Scalar::Text(raw.to_string())
}

fn parse_number(text: &str, decimal: char, thousands: Option<char>) -> Option<Scalar> {
    if !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut normalized = String::with_capacity(text.len());
    for c in text.chars() {
        if Some(c) == thousands {
            continue;
        }
        if c == decimal {
            normalized.push('.');
        } else if c == '.' || c == '_' {
            return None;
        } else {
            normalized.push(c);
        }
    }
    if let Ok(i) = normalized.parse::<i64>() {
        return Some(Scalar::Int(i));
    }
    normalized.parse::<f64>().ok().map(Scalar::Float)
}

/// Render a table as delimited text. Lines end with `\n`.
pub fn encode_csv(table: &Table, options: &CsvOptions) -> Result<String> {
    options.validate()?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.separator.as_byte())
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let decimal = options.decimal.as_char();
    let thousands = options.thousands.map(|t| t.as_char());

    let mut header: Vec<String> = Vec::with_capacity(table.column_count() + 1);
    if options.include_index {
        header.push(table.index().name().unwrap_or_default().to_string());
    }
    header.extend(table.column_names().into_iter().map(str::to_string));
    writer.write_record(&header)?;

    let columns: Vec<&Column> = table.columns().map(|(_, c)| c).collect();
    for row in 0..table.row_count() {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        if options.include_index {
            if let Some(label) = table.index().get(row) {
                record.push(format_cell(label, decimal, thousands));
            }
        }
        record.extend(
            columns
                .iter()
                .map(|c| format_cell(&c.values()[row], decimal, thousands)),
        );
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| FrameError::Interchange(format!("failed to flush CSV output: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| FrameError::Interchange(format!("CSV output is not UTF-8: {}", e)))
}

fn format_cell(value: &Scalar, decimal: char, thousands: Option<char>) -> String {
    match value {
        v if v.is_null() => String::new(),
        Scalar::Int(i) => group_digits(&i.to_string(), thousands),
        Scalar::Float(f) => {
            let text = format!("{:?}", f);
            let (whole, rest) = match text.find(['.', 'e']) {
                Some(split) => text.split_at(split),
                None => (text.as_str(), ""),
            };
            let grouped = group_digits(whole, thousands);
            format!("{}{}", grouped, rest.replacen('.', &decimal.to_string(), 1))
        }
        Scalar::Timestamp(t) => t.format(CSV_TIMESTAMP_FORMAT).to_string(),
        other => other.to_string(),
    }
}

fn group_digits(digits: &str, thousands: Option<char>) -> String {
    let Some(separator) = thousands else {
        return digits.to_string();
    };
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return format!("{}{}", sign, digits);
    }
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    format!("{}{}", sign, grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DecimalMarker, Separator};

    fn sample() -> Table {
        Table::new(
            vec![
                ("A".to_string(), vec![1.into(), 2.into(), 3.into()]),
                ("B".to_string(), vec![4.into(), 5.into(), 6.into()]),
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
    fn test_encode_default() {
        let text = encode_csv(&sample(), &CsvOptions::default()).unwrap();
        assert_eq!(text, "A,B,C\n1,4,1.1\n2,5,2.2\n3,6,\n");
    }

    #[test]
    fn test_round_trip() {
        let options = CsvOptions::default();
        let text = encode_csv(&sample(), &options).unwrap();
        assert_eq!(decode_csv(&text, &options).unwrap(), sample());
    }

    #[test]
    fn test_european_format() {
        let options = CsvOptions::default()
            .with_separator(Separator::Semicolon)
            .with_decimal(DecimalMarker::Comma)
            .with_thousands(Some(DecimalMarker::Dot));
        let table = decode_csv("x;y\n1.234,5;7\n", &options).unwrap();
        assert_eq!(table.column("x").unwrap().values(), &[Scalar::Float(1234.5)]);
        assert_eq!(table.column("y").unwrap().values(), &[Scalar::Int(7)]);
        assert_eq!(encode_csv(&table, &options).unwrap(), "x;y\n1.234,5;7\n");
    }

    #[test]
    fn test_include_index() {
        let options = CsvOptions::default().with_index(true);
        let text = encode_csv(&sample().drop_rows(&[Scalar::Int(0)]).unwrap(), &options).unwrap();
        assert!(text.starts_with(",A,B,C\n1,2,5,2.2\n"));
    }

    #[test]
    fn test_ragged_rows() {
        let options = CsvOptions::default();
        let padded = decode_csv("a,b\n1\n", &options).unwrap();
        assert!(padded.column("b").unwrap().values()[0].is_null());
        assert!(matches!(
            decode_csv("a,b\n1,2,3\n", &options),
            Err(FrameError::Shape(_))
        ));
    }

    #[test]
    fn test_mixed_column_stays_text() {
        let table = decode_csv("a\n1\nx\n", &CsvOptions::default()).unwrap();
        assert_eq!(
            table.column("a").unwrap().values(),
            &[Scalar::from("1"), Scalar::from("x")]
        );
    }

    #[test]
    fn test_duplicate_headers_renamed() {
        let table = decode_csv("a,a\n1,2\n", &CsvOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["a", "a.1"]);
    }

    #[test]
    fn test_booleans() {
        let table = decode_csv("flag\nTrue\nfalse\n", &CsvOptions::default()).unwrap();
        assert_eq!(table.column("flag").unwrap().dtype(), ColumnType::Boolean);
    }
}
