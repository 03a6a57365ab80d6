//! Row and column operations. Every operation returns a new table.

use std::collections::HashSet;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};

use super::frame::{Column, Series, Table};
use super::index::RowIndex;
use super::scalar::{ColumnType, Scalar};

static NON_IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9A-Za-z_]").unwrap());

/// Data assigned to a column or a row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellData {
    /// One value repeated for every cell.
    Broadcast(Scalar),
    /// One value per cell, in order.
    Values(Vec<Scalar>),
}

/// A row to append: positional values or a column → value mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum RowData {
    Values(Vec<Scalar>),
    Mapping(IndexMap<String, Scalar>),
}

/// Axis along which missing values are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropAxis {
    /// Drop rows.
    #[default]
    Index,
    /// Drop columns.
    Columns,
}

/// Whether any or all values must be missing for a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropHow {
    #[default]
    Any,
    All,
}

impl DropAxis {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropAxis::Index => "index",
            DropAxis::Columns => "columns",
        }
    }
}

impl std::str::FromStr for DropAxis {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "index" | "rows" | "0" => Ok(DropAxis::Index),
            "columns" | "1" => Ok(DropAxis::Columns),
            other => Err(FrameError::InvalidOption(format!("unknown axis '{}'", other))),
        }
    }
}

impl DropHow {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropHow::Any => "any",
            DropHow::All => "all",
        }
    }
}

impl std::str::FromStr for DropHow {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "any" => Ok(DropHow::Any),
            "all" => Ok(DropHow::All),
            other => Err(FrameError::InvalidOption(format!(
                "unknown drop rule '{}'",
                other
            ))),
        }
    }
}

/// Split a comma-separated selector into trimmed, non-empty names.
pub fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Turn a column label into a valid identifier.
pub fn to_valid_identifier(name: &str) -> String {
    let cleaned = NON_IDENTIFIER.replace_all(name.trim(), "_").into_owned();
    match cleaned.chars().next() {
        None => "_".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{}", cleaned),
        Some(_) => cleaned,
    }
}

impl Table {
    /// Select a column as a series named after it.
    pub fn get_column(&self, name: &str) -> Result<Series> {
        let column = self.column(name)?;
        Series::new(
            Some(name.to_string()),
            column.values().to_vec(),
            self.index().clone(),
        )
    }

    /// Select the first row labelled `label` as a series indexed by column name.
    pub fn get_row(&self, label: &Scalar) -> Result<Series> {
        let positions = self.index().positions(label)?;
        let name = self.index().get(positions[0]).map(|l| l.to_string());
        self.row_series(positions[0], name)
    }

    /// Select a row by position.
    pub fn iloc(&self, position: usize) -> Result<Series> {
        let label = self.index().get(position).cloned().ok_or_else(|| {
            FrameError::Lookup(format!(
                "position {} out of bounds for {} rows",
                position,
                self.row_count()
            ))
        })?;
        self.row_series(position, Some(label.to_string()))
    }

    fn row_series(&self, position: usize, name: Option<String>) -> Result<Series> {
        let values = self.row(position).unwrap_or_default();
        let index = RowIndex::new(self.column_names().into_iter().map(Scalar::from).collect())
            .with_name(self.columns_name().map(str::to_string));
        Series::new(name, values, index)
    }

    /// Select every row carrying one of `labels`, in label order.
    pub fn get_rows(&self, labels: &[Scalar]) -> Result<Table> {
        let mut positions = Vec::new();
        for label in labels {
            positions.extend(self.index().positions(label)?);
        }
        Ok(self.take_rows(&positions))
    }

    /// Select rows by position.
    pub fn ilocs(&self, positions: &[usize]) -> Result<Table> {
        if let Some(&bad) = positions.iter().find(|&&p| p >= self.row_count()) {
            return Err(FrameError::Lookup(format!(
                "position {} out of bounds for {} rows",
                bad,
                self.row_count()
            )));
        }
        Ok(self.take_rows(positions))
    }

    /// Add or replace a column.
    pub fn set_column(&self, name: &str, data: CellData) -> Result<Table> {
        let values = match data {
            CellData::Broadcast(value) => vec![value; self.row_count()],
            CellData::Values(values) => {
                if values.len() != self.row_count() {
                    return Err(FrameError::Shape(format!(
                        "length of values ({}) does not match length of index ({})",
                        values.len(),
                        self.row_count()
                    )));
                }
                values
            }
        };
        let (mut columns, index, columns_name) = self.clone().into_parts();
        columns.insert(name.to_string(), Column::new(values));
        Ok(Table::from_columns(columns, index)?.with_columns_name(columns_name))
    }

    /// Overwrite every row labelled `label`.
    pub fn set_row(&self, label: &Scalar, data: CellData) -> Result<Table> {
        let positions = self.index().positions(label)?;
        let values = match data {
            CellData::Broadcast(value) => vec![value; self.column_count()],
            CellData::Values(values) => {
                if values.len() != self.column_count() {
                    return Err(FrameError::Arity {
                        expected: self.column_count(),
                        actual: values.len(),
                    });
                }
                values
            }
        };
        let mut rebuilt = IndexMap::with_capacity(self.column_count());
        for ((name, column), value) in self.columns().zip(values) {
            let mut cells = column.values().to_vec();
            for &p in &positions {
                cells[p] = value.clone();
            }
            rebuilt.insert(name.to_string(), Column::new(cells));
        }
        Ok(Table::from_columns(rebuilt, self.index().clone())?
            .with_columns_name(self.columns_name().map(str::to_string)))
    }

    /// Drop named columns. Every name must exist.
    pub fn drop_columns(&self, names: &[&str]) -> Result<Table> {
        for name in names {
            self.column(name)?;
        }
        let keep: Vec<&str> = self
            .column_names()
            .into_iter()
            .filter(|n| !names.contains(n))
            .collect();
        self.select_columns(&keep)
    }

    /// Drop every row carrying one of `labels`. Every label must exist.
    pub fn drop_rows(&self, labels: &[Scalar]) -> Result<Table> {
        let mut dropped = HashSet::new();
        for label in labels {
            dropped.extend(self.index().positions(label)?);
        }
        let keep: Vec<usize> = (0..self.row_count()).filter(|p| !dropped.contains(p)).collect();
        Ok(self.take_rows(&keep))
    }

    /// Rename a column. Renaming a missing column leaves the table unchanged.
    pub fn rename_column(&self, old: &str, new: &str) -> Result<Table> {
        if !self.has_column(old) || old == new {
            return Ok(self.clone());
        }
        if self.has_column(new) {
            return Err(FrameError::Shape(format!("duplicate column name '{}'", new)));
        }
        self.rename_with(|name| {
            if name == old {
                new.to_string()
            } else {
                name.to_string()
            }
        })
    }

    /// Rename every column to a valid identifier.
    pub fn rename_columns_valid_identifier(&self) -> Result<Table> {
        self.rename_with(to_valid_identifier)
    }

    fn rename_with(&self, rename: impl Fn(&str) -> String) -> Result<Table> {
        let mut columns = IndexMap::with_capacity(self.column_count());
        for (name, column) in self.columns() {
            let renamed = rename(name);
            if columns.insert(renamed.clone(), column.clone()).is_some() {
                return Err(FrameError::Shape(format!(
                    "duplicate column name '{}' after renaming",
                    renamed
                )));
            }
        }
        Ok(Table::from_columns(columns, self.index().clone())?
            .with_columns_name(self.columns_name().map(str::to_string)))
    }

    /// Append one row. The appended row is labelled `0`.
    pub fn add_row(&self, row: RowData) -> Result<Table> {
        let values = match row {
            RowData::Values(values) => {
                if values.len() != self.column_count() {
                    return Err(FrameError::Arity {
                        expected: self.column_count(),
                        actual: values.len(),
                    });
                }
                values
            }
            RowData::Mapping(mapping) => {
                let appended = Table::from_rows(
                    mapping.keys().cloned().collect(),
                    vec![mapping.values().cloned().collect()],
                    None,
                )?;
                return self.concat(&appended);
            }
        };
        let appended = Table::from_rows(
            self.column_names().into_iter().map(str::to_string).collect(),
            vec![values],
            None,
        )?;
        self.concat(&appended)
    }

    /// Stack `other` below this table. Columns are the union in first-seen
    /// order; missing cells are null.
    pub fn concat(&self, other: &Table) -> Result<Table> {
        let mut names: Vec<&str> = self.column_names();
        for name in other.column_names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        let mut columns = IndexMap::with_capacity(names.len());
        for name in names {
            let mut values = column_or_nulls(self, name);
            values.extend(column_or_nulls(other, name));
            columns.insert(name.to_string(), Column::new(values));
        }
        let index = self.index().concat(other.index());
        let columns_name = if self.columns_name() == other.columns_name() {
            self.columns_name().map(str::to_string)
        } else {
            None
        };
        Ok(Table::from_columns(columns, index)?.with_columns_name(columns_name))
    }

    /// Keep the rows where `mask` is true.
    pub fn mask(&self, mask: &[bool]) -> Result<Table> {
        if mask.len() != self.row_count() {
            return Err(FrameError::Shape(format!(
                "mask has {} entries but the table has {} rows",
                mask.len(),
                self.row_count()
            )));
        }
        let keep: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(p, _)| p)
            .collect();
        Ok(self.take_rows(&keep))
    }

    /// Drop rows (or columns) containing missing values.
    ///
    /// `subset` restricts which columns are inspected when dropping rows.
    pub fn dropna(&self, axis: DropAxis, how: DropHow, subset: Option<&[&str]>) -> Result<Table> {
        match axis {
            DropAxis::Index => {
                let inspected: Vec<&Column> = match subset {
                    Some(names) => names
                        .iter()
                        .map(|n| self.column(n))
                        .collect::<Result<_>>()?,
                    None => self.columns().map(|(_, c)| c).collect(),
                };
                let keep: Vec<usize> = (0..self.row_count())
                    .filter(|&p| !is_dropped(inspected.iter().map(|c| &c.values()[p]), how))
                    .collect();
                Ok(self.take_rows(&keep))
            }
            DropAxis::Columns => {
                let rows: Vec<usize> = match subset {
                    Some(labels) => {
                        let mut positions = Vec::new();
                        for label in labels {
                            positions.extend(self.index().positions(&Scalar::from(*label))?);
                        }
                        positions
                    }
                    None => (0..self.row_count()).collect(),
                };
                let keep: Vec<&str> = self
                    .columns()
                    .filter(|(_, c)| !is_dropped(rows.iter().map(|&p| &c.values()[p]), how))
                    .map(|(n, _)| n)
                    .collect();
                self.select_columns(&keep)
            }
        }
    }

    /// Replace missing values with `value`.
    pub fn fillna(&self, value: &Scalar) -> Result<Table> {
        self.map_columns(|column| {
            column
                .values()
                .iter()
                .map(|v| if v.is_null() { value.clone() } else { v.clone() })
                .collect()
        })
    }

    /// Propagate the last valid value forward.
    pub fn ffill(&self) -> Result<Table> {
        self.map_columns(|column| {
            let mut last = Scalar::Null;
            column
                .values()
                .iter()
                .map(|v| {
                    if !v.is_null() {
                        last = v.clone();
                    }
                    if v.is_null() { last.clone() } else { v.clone() }
                })
                .collect()
        })
    }

    /// Propagate the next valid value backward.
    pub fn bfill(&self) -> Result<Table> {
        self.map_columns(|column| {
            let mut next = Scalar::Null;
            let mut filled: Vec<Scalar> = column
                .values()
                .iter()
                .rev()
                .map(|v| {
                    if !v.is_null() {
                        next = v.clone();
                    }
                    if v.is_null() { next.clone() } else { v.clone() }
                })
                .collect();
            filled.reverse();
            filled
        })
    }

    fn map_columns(&self, mut f: impl FnMut(&Column) -> Vec<Scalar>) -> Result<Table> {
        let columns = self
            .columns()
            .map(|(name, column)| (name.to_string(), Column::new(f(column))))
            .collect();
        Ok(Table::from_columns(columns, self.index().clone())?
            .with_columns_name(self.columns_name().map(str::to_string)))
    }

    /// Drop duplicate rows, keeping the first occurrence.
    pub fn drop_duplicates(&self, subset: Option<&[&str]>) -> Result<Table> {
        let inspected: Vec<&Column> = match subset {
            Some(names) => names
                .iter()
                .map(|n| self.column(n))
                .collect::<Result<_>>()?,
            None => self.columns().map(|(_, c)| c).collect(),
        };
        let mut seen = HashSet::new();
        let keep: Vec<usize> = (0..self.row_count())
            .filter(|&p| {
                let key: Vec<Scalar> = inspected.iter().map(|c| c.values()[p].clone()).collect();
                seen.insert(key)
            })
            .collect();
        Ok(self.take_rows(&keep))
    }

    /// Keep only numeric columns.
    ///
    /// Non-numeric columns are first converted to numbers where every value
    /// parses; a column that fails to convert is left as it is. With
    /// `label_encode`, remaining text columns become category codes (sorted
    /// categories, null → -1). Boolean columns are never converted, so they
    /// are dropped.
    pub fn numeric_only(&self, label_encode: bool) -> Result<Table> {
        let mut columns = IndexMap::with_capacity(self.column_count());
        for (name, column) in self.columns() {
            let dtype = column.dtype();
            let converted = if dtype.is_numeric() || dtype == ColumnType::Boolean {
                column.clone()
            } else {
                match to_numeric(column) {
                    Ok(converted) => converted,
                    Err(e) => {
                        tracing::debug!(column = name, error = %e, "numeric conversion skipped");
                        column.clone()
                    }
                }
            };
            let converted = if label_encode
                && matches!(converted.dtype(), ColumnType::Text | ColumnType::Mixed)
            {
                category_codes(&converted)
            } else {
                converted
            };
            if converted.dtype().is_numeric() {
                columns.insert(name.to_string(), converted);
            }
        }
        Ok(Table::from_columns(columns, self.index().clone())?
            .with_columns_name(self.columns_name().map(str::to_string)))
    }
}

fn is_dropped<'a>(cells: impl Iterator<Item = &'a Scalar>, how: DropHow) -> bool {
    let mut seen = false;
    let mut any_null = false;
    let mut all_null = true;
    for cell in cells {
        seen = true;
        if cell.is_null() {
            any_null = true;
        } else {
            all_null = false;
        }
    }
    match how {
        DropHow::Any => any_null,
        DropHow::All => seen && all_null,
    }
}

fn column_or_nulls(table: &Table, name: &str) -> Vec<Scalar> {
    match table.column(name) {
        Ok(column) => column.values().to_vec(),
        Err(_) => vec![Scalar::Null; table.row_count()],
    }
}

fn to_numeric(column: &Column) -> Result<Column> {
    let values = column
        .values()
        .iter()
        .map(|v| match v {
            Scalar::Null | Scalar::Int(_) | Scalar::Float(_) => Ok(v.clone()),
            Scalar::Bool(b) => Err(FrameError::Type(format!(
                "cannot convert boolean '{}' to a number",
                b
            ))),
            Scalar::Text(s) => match Scalar::infer_from_str(s) {
                parsed @ (Scalar::Int(_) | Scalar::Float(_) | Scalar::Null) => Ok(parsed),
                _ => Err(FrameError::Type(format!("unable to parse string '{}'", s))),
            },
            Scalar::Timestamp(_) => Err(FrameError::Type(format!(
                "cannot convert timestamp '{}' to a number",
                v
            ))),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Column::new(values))
}

fn category_codes(column: &Column) -> Column {
    let mut categories: Vec<&Scalar> = column.values().iter().filter(|v| !v.is_null()).collect();
    categories.sort_by(|a, b| a.total_cmp(b));
    categories.dedup();
    let codes = column
        .values()
        .iter()
        .map(|v| {
            if v.is_null() {
                return Scalar::Int(-1);
            }
            let code = categories.iter().position(|c| *c == v).unwrap_or(0);
            Scalar::Int(code as i64)
        })
        .collect();
    Column::new(codes)
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_get_column() {
        let series = sample().get_column("A").unwrap();
        assert_eq!(series.name(), Some("A"));
        assert_eq!(series.values(), &[Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)]);
        assert!(matches!(sample().get_column("Z"), Err(FrameError::Lookup(_))));
    }

    #[test]
    fn test_get_row_by_text_label() {
        let row = sample().get_row(&Scalar::from("1")).unwrap();
        assert_eq!(row.name(), Some("1"));
        assert_eq!(row.loc(&Scalar::from("B")).unwrap(), &Scalar::Float(5.0));
    }

    #[test]
    fn test_drop_row_keeps_labels() {
        let dropped = sample().drop_rows(&[Scalar::Int(0)]).unwrap();
        assert_eq!(dropped.index().labels(), &[Scalar::Int(1), Scalar::Int(2)]);
        assert_eq!(
            dropped.column("A").unwrap().values(),
            &[Scalar::Int(2), Scalar::Int(3)]
        );
    }

    #[test]
    fn test_drop_missing_row_is_lookup_error() {
        assert!(matches!(
            sample().drop_rows(&[Scalar::Int(7)]),
            Err(FrameError::Lookup(_))
        ));
    }

    #[test]
    fn test_set_column_broadcast_and_shape() {
        let table = sample().set_column("D", CellData::Broadcast(1.into())).unwrap();
        assert_eq!(table.column_names(), vec!["A", "B", "C", "D"]);
        assert!(matches!(
            sample().set_column("D", CellData::Values(vec![1.into(), 2.into()])),
            Err(FrameError::Shape(_))
        ));
    }

    #[test]
    fn test_set_row_broadcast() {
        let table = sample().set_row(&Scalar::Int(0), CellData::Broadcast(2.into())).unwrap();
        assert_eq!(
            table.row(0).unwrap(),
            vec![Scalar::Int(2), Scalar::Int(2), Scalar::Float(2.0)]
        );
    }

    #[test]
    fn test_add_row_arity() {
        let result = sample().add_row(RowData::Values(vec![1.into()]));
        assert!(matches!(
            result,
            Err(FrameError::Arity { expected: 3, actual: 1 })
        ));

        let table = sample()
            .add_row(RowData::Values(vec![1.into(), 2.into(), 3.into()]))
            .unwrap();
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.index().get(3), Some(&Scalar::Int(0)));
        assert_eq!(table.column("C").unwrap().values()[3], Scalar::Float(3.0));
    }

    #[test]
    fn test_dropna_and_fill() {
        let table = sample();
        assert_eq!(table.dropna(DropAxis::Index, DropHow::Any, None).unwrap().row_count(), 2);
        assert_eq!(
            table
                .dropna(DropAxis::Columns, DropHow::Any, None)
                .unwrap()
                .column_names(),
            vec!["A", "B"]
        );
        let filled = table.fillna(&Scalar::Int(0)).unwrap();
        assert_eq!(filled.column("C").unwrap().values()[2], Scalar::Float(0.0));
        let forward = table.ffill().unwrap();
        assert_eq!(forward.column("C").unwrap().values()[2], Scalar::Float(2.2));
        let backward = table.bfill().unwrap();
        assert!(backward.column("C").unwrap().values()[2].is_null());
    }

    #[test]
    fn test_numeric_only_label_encode() {
        let table = sample()
            .set_column(
                "D",
                CellData::Values(vec!["a".into(), "b".into(), "a".into()]),
            )
            .unwrap();
        assert_eq!(table.numeric_only(false).unwrap().column_names(), vec!["A", "B", "C"]);
        let encoded = table.numeric_only(true).unwrap();
        assert_eq!(encoded.column_names(), vec!["A", "B", "C", "D"]);
        assert_eq!(
            encoded.column("D").unwrap().values(),
            &[Scalar::Int(0), Scalar::Int(1), Scalar::Int(0)]
        );
    }

    #[test]
    fn test_numeric_only_converts_numeric_text() {
        let table = Table::new(
            vec![("n".to_string(), vec!["1".into(), "2.5".into()])],
            None,
        )
        .unwrap();
        let converted = table.numeric_only(false).unwrap();
        assert_eq!(converted.column("n").unwrap().dtype(), ColumnType::Float);
    }

    #[test]
    fn test_numeric_only_drops_booleans() {
        let table = Table::new(
            vec![
                ("n".to_string(), vec![1.into(), 2.into()]),
                ("b".to_string(), vec![true.into(), false.into()]),
            ],
            None,
        )
        .unwrap();
        assert_eq!(table.numeric_only(false).unwrap().column_names(), vec!["n"]);
        assert_eq!(table.numeric_only(true).unwrap().column_names(), vec!["n"]);
    }

    #[test]
    fn test_valid_identifier() {
        assert_eq!(to_valid_identifier("my col"), "my_col");
        assert_eq!(to_valid_identifier("1st"), "_1st");
        assert_eq!(to_valid_identifier("a-b.c"), "a_b_c");
    }

    #[test]
    fn test_drop_duplicates() {
        let table = sample().concat(&sample()).unwrap();
        assert_eq!(table.row_count(), 6);
        assert_eq!(table.drop_duplicates(None).unwrap().row_count(), 3);
    }
}
