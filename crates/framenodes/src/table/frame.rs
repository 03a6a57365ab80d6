//! Core table, column and series types.

use indexmap::IndexMap;

use crate::error::{FrameError, Result};

use super::index::RowIndex;
use super::scalar::{ColumnType, Scalar};

/// A typed sequence of cell values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    dtype: ColumnType,
    values: Vec<Scalar>,
}

impl Column {
    /// Create a column, inferring its type. In a float column integers are
    /// converted to floats and nulls to NaN.
    pub fn new(values: Vec<Scalar>) -> Self {
        let dtype = ColumnType::infer(&values);
        let values = if dtype == ColumnType::Float {
            values
                .into_iter()
                .map(|v| match v {
                    Scalar::Int(i) => Scalar::Float(i as f64),
                    Scalar::Null => Scalar::Float(f64::NAN),
                    other => other,
                })
                .collect()
        } else {
            values
        };
        Self { dtype, values }
    }

    pub fn dtype(&self) -> ColumnType {
        self.dtype
    }

    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Scalar> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Scalar> {
        self.values.get(position)
    }

    /// Non-null numeric values, in order.
    pub fn numbers(&self) -> Vec<f64> {
        self.values.iter().filter_map(Scalar::as_f64).collect()
    }

    /// Number of non-null values.
    pub fn count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_null()).count()
    }

    pub(crate) fn take(&self, positions: &[usize]) -> Self {
        Self::new(positions.iter().map(|&p| self.values[p].clone()).collect())
    }
}

/// Ordered named columns sharing one row index.
#[derive(Debug, Clone)]
pub struct Table {
    columns: IndexMap<String, Column>,
    index: RowIndex,
    columns_name: Option<String>,
}

impl Table {
    /// Create a table from named value vectors.
    ///
    /// Without an explicit index the default `0..n` index is used. Duplicate
    /// names and columns of unequal length are shape errors.
    pub fn new(columns: Vec<(String, Vec<Scalar>)>, index: Option<RowIndex>) -> Result<Self> {
        let mut map = IndexMap::with_capacity(columns.len());
        for (name, values) in columns {
            if map.contains_key(&name) {
                return Err(FrameError::Shape(format!("duplicate column name '{}'", name)));
            }
            map.insert(name, Column::new(values));
        }
        let index = match index {
            Some(index) => index,
            None => RowIndex::range(map.values().next().map(Column::len).unwrap_or(0)),
        };
        Self::from_columns(map, index)
    }

    /// Create a table from prepared columns, validating lengths.
    pub fn from_columns(columns: IndexMap<String, Column>, index: RowIndex) -> Result<Self> {
        for (name, column) in &columns {
            if column.len() != index.len() {
                return Err(FrameError::Shape(format!(
                    "column '{}' has {} values but the index has {} labels",
                    name,
                    column.len(),
                    index.len()
                )));
            }
        }
        Ok(Self {
            columns,
            index,
            columns_name: None,
        })
    }

    /// Create a table from row-major cells.
    pub fn from_rows(
        names: Vec<String>,
        rows: Vec<Vec<Scalar>>,
        index: Option<RowIndex>,
    ) -> Result<Self> {
        let width = names.len();
        let mut columns: Vec<Vec<Scalar>> = vec![Vec::with_capacity(rows.len()); width];
        let row_count = rows.len();
        for (position, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(FrameError::Shape(format!(
                    "row {} has {} values, expected {}",
                    position,
                    row.len(),
                    width
                )));
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
        let index = index.unwrap_or_else(|| RowIndex::range(row_count));
        if index.len() != row_count {
            return Err(FrameError::Shape(format!(
                "index has {} labels but there are {} rows",
                index.len(),
                row_count
            )));
        }
        Self::new(names.into_iter().zip(columns).collect(), Some(index))
    }

    /// A table with no rows and no columns.
    pub fn empty() -> Self {
        Self {
            columns: IndexMap::new(),
            index: RowIndex::default(),
            columns_name: None,
        }
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0 || self.column_count() == 0
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| FrameError::missing_column(name))
    }

    /// Iterate over `(name, column)` pairs in order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    /// Replace the row index. Its length must match the row count.
    pub fn with_index(mut self, index: RowIndex) -> Result<Self> {
        if index.len() != self.row_count() && !self.columns.is_empty() {
            return Err(FrameError::Shape(format!(
                "index has {} labels but the table has {} rows",
                index.len(),
                self.row_count()
            )));
        }
        self.index = index;
        Ok(self)
    }

    /// Reset the index to `0..n`.
    pub fn reset_index(mut self) -> Self {
        self.index = RowIndex::range(self.row_count());
        self
    }

    /// Name of the column axis.
    pub fn columns_name(&self) -> Option<&str> {
        self.columns_name.as_deref()
    }

    pub fn with_columns_name(mut self, name: Option<String>) -> Self {
        self.columns_name = name;
        self
    }

    /// Cells of one row by position.
    pub fn row(&self, position: usize) -> Option<Vec<Scalar>> {
        if position >= self.row_count() {
            return None;
        }
        Some(
            self.columns
                .values()
                .map(|c| c.values[position].clone())
                .collect(),
        )
    }

    /// Iterate over rows as cell vectors.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Scalar>> + '_ {
        (0..self.row_count()).filter_map(move |p| self.row(p))
    }

    /// A new table with the rows at `positions`, labels kept.
    pub fn take_rows(&self, positions: &[usize]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.take(positions)))
                .collect(),
            index: self.index.take(positions),
            columns_name: self.columns_name.clone(),
        }
    }

    /// A new table with only the named columns, in the given order.
    pub fn select_columns(&self, names: &[&str]) -> Result<Self> {
        let mut columns = IndexMap::with_capacity(names.len());
        for name in names {
            columns.insert(name.to_string(), self.column(name)?.clone());
        }
        Ok(Self {
            columns,
            index: self.index.clone(),
            columns_name: self.columns_name.clone(),
        })
    }

    pub(crate) fn into_parts(self) -> (IndexMap<String, Column>, RowIndex, Option<String>) {
        (self.columns, self.index, self.columns_name)
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.columns_name == other.columns_name
            && self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(other.columns.iter())
                .all(|(a, b)| a == b)
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::empty()
    }
}

/// A single labelled column.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: Option<String>,
    column: Column,
    index: RowIndex,
}

impl Series {
    /// Create a series. Values and index must have the same length.
    pub fn new(name: Option<String>, values: Vec<Scalar>, index: RowIndex) -> Result<Self> {
        if values.len() != index.len() {
            return Err(FrameError::Shape(format!(
                "series has {} values but the index has {} labels",
                values.len(),
                index.len()
            )));
        }
        Ok(Self {
            name,
            column: Column::new(values),
            index,
        })
    }

    /// Create a series with the default `0..n` index.
    pub fn from_values(name: Option<String>, values: Vec<Scalar>) -> Self {
        let index = RowIndex::range(values.len());
        Self {
            name,
            column: Column::new(values),
            index,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn column(&self) -> &Column {
        &self.column
    }

    pub fn values(&self) -> &[Scalar] {
        self.column.values()
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.column.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column.is_empty()
    }

    /// Value at the first position labelled `label`.
    pub fn loc(&self, label: &Scalar) -> Result<&Scalar> {
        let positions = self.index.positions(label)?;
        Ok(&self.column.values[positions[0]])
    }

    /// Value at a position.
    pub fn iloc(&self, position: usize) -> Result<&Scalar> {
        self.column.get(position).ok_or_else(|| {
            FrameError::Lookup(format!(
                "position {} out of bounds for length {}",
                position,
                self.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Scalar> {
        values.iter().map(|&v| Scalar::Int(v)).collect()
    }

    #[test]
    fn test_new_table_default_index() {
        let table = Table::new(
            vec![("A".to_string(), ints(&[1, 2, 3])), ("B".to_string(), ints(&[4, 5, 6]))],
            None,
        )
        .unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_names(), vec!["A", "B"]);
        assert_eq!(table.index(), &RowIndex::range(3));
    }

    #[test]
    fn test_unequal_columns_rejected() {
        let result = Table::new(
            vec![("A".to_string(), ints(&[1, 2])), ("B".to_string(), ints(&[1]))],
            None,
        );
        assert!(matches!(result, Err(FrameError::Shape(_))));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Table::new(
            vec![("A".to_string(), ints(&[1])), ("A".to_string(), ints(&[2]))],
            None,
        );
        assert!(matches!(result, Err(FrameError::Shape(_))));
    }

    #[test]
    fn test_from_rows_ragged() {
        let result = Table::from_rows(
            vec!["A".to_string(), "B".to_string()],
            vec![ints(&[1, 2]), ints(&[3])],
            None,
        );
        assert!(matches!(result, Err(FrameError::Shape(_))));
    }

    #[test]
    fn test_column_order_matters_for_equality() {
        let ab = Table::new(
            vec![("A".to_string(), ints(&[1])), ("B".to_string(), ints(&[2]))],
            None,
        )
        .unwrap();
        let ba = Table::new(
            vec![("B".to_string(), ints(&[2])), ("A".to_string(), ints(&[1]))],
            None,
        )
        .unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_float_column_widens_ints() {
        let column = Column::new(vec![Scalar::Int(1), Scalar::Float(2.5), Scalar::Null]);
        assert_eq!(column.dtype(), ColumnType::Float);
        assert_eq!(column.values()[0], Scalar::Float(1.0));
        assert_eq!(column.count(), 2);
    }
}
