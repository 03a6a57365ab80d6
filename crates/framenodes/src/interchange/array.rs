//! Tables from raw two-dimensional arrays.

use serde_json::Value;

use crate::error::{FrameError, Result};
use crate::table::{RowIndex, Scalar, Table};

/// Build a table from row-major cells.
///
/// Without `column_names` the columns are named `Col 1` .. `Col N` after the
/// width of the first row. Ragged rows, a name list of the wrong width and
/// an index of the wrong length are shape errors.
pub fn from_array(
    rows: Vec<Vec<Scalar>>,
    column_names: Option<Vec<String>>,
    index: Option<Vec<Scalar>>,
) -> Result<Table> {
    let names = match column_names {
        Some(names) => names,
        None => {
            let first = rows.first().ok_or_else(|| {
                FrameError::Shape("cannot name columns of an empty array".to_string())
            })?;
            (1..=first.len()).map(|i| format!("Col {}", i)).collect()
        }
    };
    if let Some(first) = rows.first() {
        if first.len() != names.len() {
            return Err(FrameError::Shape(format!(
                "{} columns passed, passed data had {} columns",
                names.len(),
                first.len()
            )));
        }
    }
    Table::from_rows(names, rows, index.map(RowIndex::new))
}

/// Read a JSON array of arrays as row-major cells.
pub fn rows_from_json(value: &Value) -> Result<Vec<Vec<Scalar>>> {
    let rows = value.as_array().ok_or_else(|| {
        FrameError::Interchange("expected an array of rows".to_string())
    })?;
    rows.iter()
        .map(|row| match row {
            Value::Array(cells) => cells.iter().map(Scalar::from_json).collect::<Result<Vec<_>>>(),
            other => Err(FrameError::Interchange(format!(
                "expected a row array, got {}",
                other
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_synthesized_names() {
        let rows = rows_from_json(&json!([[1, 2, 3], [4, 5, 6]])).unwrap();
        let table = from_array(rows, None, None).unwrap();
        assert_eq!(table.column_names(), vec!["Col 1", "Col 2", "Col 3"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.index(), &RowIndex::range(2));
    }

    #[test]
    fn test_explicit_names_and_index() {
        let table = from_array(
            vec![vec![1.into()], vec![2.into()]],
            Some(vec!["x".to_string()]),
            Some(vec!["a".into(), "b".into()]),
        )
        .unwrap();
        assert_eq!(table.get_row(&"b".into()).unwrap().values(), &[Scalar::Int(2)]);
    }

    #[test]
    fn test_shape_errors() {
        let ragged = vec![vec![1.into(), 2.into()], vec![3.into()]];
        assert!(matches!(from_array(ragged, None, None), Err(FrameError::Shape(_))));
        let narrow = vec![vec![1.into(), 2.into()]];
        assert!(matches!(
            from_array(narrow, Some(vec!["x".to_string()]), None),
            Err(FrameError::Shape(_))
        ));
        let short_index = vec![vec![1.into()], vec![2.into()]];
        assert!(matches!(
            from_array(short_index, None, Some(vec![0.into()])),
            Err(FrameError::Shape(_))
        ));
        assert!(matches!(from_array(Vec::new(), None, None), Err(FrameError::Shape(_))));
    }
}
