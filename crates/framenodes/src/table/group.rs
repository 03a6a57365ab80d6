//! Grouping by key columns and per-group aggregation.

use std::collections::HashMap;

use crate::error::{FrameError, Result};

use super::frame::{Column, Table};
use super::index::RowIndex;
use super::scalar::Scalar;
use super::stats::{self, DESCRIBE_STATS};

/// A table partitioned by the values of one or more key columns.
///
/// Groups are ordered by sorted key. Rows with a missing key value belong
/// to no group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    table: Table,
    keys: Vec<String>,
    groups: Vec<(Vec<Scalar>, Vec<usize>)>,
}

impl Table {
    /// Group rows by the named key columns.
    pub fn group_by(&self, keys: &[&str]) -> Result<GroupBy> {
        if keys.is_empty() {
            return Err(FrameError::InvalidOption(
                "at least one grouping column is required".to_string(),
            ));
        }
        let key_columns = keys
            .iter()
            .map(|k| self.column(k))
            .collect::<Result<Vec<_>>>()?;

        let mut positions: HashMap<Vec<Scalar>, Vec<usize>> = HashMap::new();
        for row in 0..self.row_count() {
            let key: Vec<Scalar> = key_columns.iter().map(|c| c.values()[row].clone()).collect();
            if key.iter().any(Scalar::is_null) {
                continue;
            }
            positions.entry(key).or_default().push(row);
        }
        let mut groups: Vec<(Vec<Scalar>, Vec<usize>)> = positions.into_iter().collect();
        groups.sort_by(|(a, _), (b, _)| {
            a.iter()
                .zip(b)
                .map(|(x, y)| x.total_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(GroupBy {
            table: self.clone(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            groups,
        })
    }
}

impl GroupBy {
    /// Names of the key columns.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The grouped table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// One label per group: the key itself for a single key column,
    /// `(k1, k2)` text for several.
    pub fn labels(&self) -> Vec<Scalar> {
        self.groups.iter().map(|(key, _)| group_label(key)).collect()
    }

    /// The rows of each group as separate tables, labels kept.
    pub fn tables(&self) -> Vec<Table> {
        self.groups
            .iter()
            .map(|(_, rows)| self.table.take_rows(rows))
            .collect()
    }

    /// The rows of the group labelled `label`.
    ///
    /// Text labels match by their rendering, so `"1"` finds the group of
    /// integer key `1`.
    pub fn get_group(&self, label: &Scalar) -> Result<Table> {
        let wanted = label.to_string();
        self.groups
            .iter()
            .find(|(key, _)| {
                let own = group_label(key);
                own == *label || own.to_string() == wanted
            })
            .map(|(_, rows)| self.table.take_rows(rows))
            .ok_or_else(|| FrameError::Lookup(format!("group '{}' not found", label)))
    }

    pub fn mean(&self) -> Result<Table> {
        self.aggregate(true, |c| Scalar::Float(stats::mean(&c.numbers())))
    }

    pub fn sum(&self) -> Result<Table> {
        self.aggregate(true, stats::column_sum)
    }

    pub fn std(&self) -> Result<Table> {
        self.aggregate(true, |c| Scalar::Float(stats::std_dev(&c.numbers())))
    }

    pub fn var(&self) -> Result<Table> {
        self.aggregate(true, |c| Scalar::Float(stats::variance(&c.numbers())))
    }

    /// Smallest non-null value of every non-key column.
    pub fn min(&self) -> Result<Table> {
        self.aggregate(false, |c| extreme(c, std::cmp::Ordering::Less))
    }

    /// Largest non-null value of every non-key column.
    pub fn max(&self) -> Result<Table> {
        self.aggregate(false, |c| extreme(c, std::cmp::Ordering::Greater))
    }

    /// Number of non-null values of every non-key column.
    pub fn count(&self) -> Result<Table> {
        self.aggregate(false, |c| Scalar::Int(c.count() as i64))
    }

    /// Summary statistics per group, one `<column>_<stat>` column per
    /// numeric column and statistic.
    pub fn describe(&self) -> Result<Table> {
        let value_columns = self.value_columns(true);
        let mut columns = Vec::with_capacity(value_columns.len() * DESCRIBE_STATS.len());
        for name in &value_columns {
            let column = self.table.column(name)?;
            let per_group: Vec<Vec<Scalar>> = self
                .groups
                .iter()
                .map(|(_, rows)| stats::describe_values(&column.take(rows).numbers()))
                .collect();
            for (s, stat) in DESCRIBE_STATS.iter().enumerate() {
                columns.push((
                    format!("{}_{}", name, stat),
                    per_group.iter().map(|values| values[s].clone()).collect(),
                ));
            }
        }
        Table::new(columns, Some(self.result_index()))
    }

    fn value_columns(&self, numeric: bool) -> Vec<&str> {
        self.table
            .columns()
            .filter(|(name, column)| {
                !self.keys.iter().any(|k| k == name) && (!numeric || column.dtype().is_numeric())
            })
            .map(|(name, _)| name)
            .collect()
    }

    fn aggregate(&self, numeric: bool, reduce: impl Fn(&Column) -> Scalar) -> Result<Table> {
        let mut columns = Vec::new();
        for name in self.value_columns(numeric) {
            let column = self.table.column(name)?;
            let values: Vec<Scalar> = self
                .groups
                .iter()
                .map(|(_, rows)| reduce(&column.take(rows)))
                .collect();
            columns.push((name.to_string(), values));
        }
        Table::new(columns, Some(self.result_index()))
    }

    fn result_index(&self) -> RowIndex {
        let name = match self.keys.as_slice() {
            [single] => Some(single.clone()),
            _ => None,
        };
        RowIndex::new(self.labels()).with_name(name)
    }
}

fn group_label(key: &[Scalar]) -> Scalar {
    match key {
        [single] => single.clone(),
        many => Scalar::Text(format!(
            "({})",
            many.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", ")
        )),
    }
}

fn extreme(column: &Column, keep: std::cmp::Ordering) -> Scalar {
    column
        .values()
        .iter()
        .filter(|v| !v.is_null())
        .fold(None::<&Scalar>, |best, v| match best {
            Some(b) if v.total_cmp(b) != keep => Some(b),
            _ => Some(v),
        })
        .cloned()
        .unwrap_or(Scalar::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales() -> Table {
        Table::new(
            vec![
                (
                    "region".to_string(),
                    vec!["b".into(), "a".into(), "b".into(), Scalar::Null],
                ),
                ("units".to_string(), vec![1.into(), 2.into(), 3.into(), 4.into()]),
                (
                    "label".to_string(),
                    vec!["x".into(), "y".into(), "z".into(), "w".into()],
                ),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_groups_sorted_and_null_keys_dropped() {
        let grouped = sales().group_by(&["region"]).unwrap();
        assert_eq!(grouped.labels(), vec![Scalar::from("a"), Scalar::from("b")]);
        let tables = grouped.tables();
        assert_eq!(tables[1].index().labels(), &[Scalar::Int(0), Scalar::Int(2)]);
    }

    #[test]
    fn test_mean_uses_numeric_columns() {
        let mean = sales().group_by(&["region"]).unwrap().mean().unwrap();
        assert_eq!(mean.column_names(), vec!["units"]);
        assert_eq!(mean.index().name(), Some("region"));
        assert_eq!(mean.column("units").unwrap().values()[1], Scalar::Float(2.0));
    }

    #[test]
    fn test_min_max_count_cover_all_columns() {
        let grouped = sales().group_by(&["region"]).unwrap();
        let max = grouped.max().unwrap();
        assert_eq!(max.column_names(), vec!["units", "label"]);
        assert_eq!(max.column("label").unwrap().values()[1], Scalar::from("z"));
        let min = grouped.min().unwrap();
        assert_eq!(min.column("units").unwrap().values()[1], Scalar::Int(1));
        let count = grouped.count().unwrap();
        assert_eq!(count.column("units").unwrap().values(), &[Scalar::Int(1), Scalar::Int(2)]);
    }

    #[test]
    fn test_describe_columns() {
        let description = sales().group_by(&["region"]).unwrap().describe().unwrap();
        assert_eq!(description.column_count(), 8);
        assert_eq!(description.column_names()[0], "units_count");
        assert_eq!(description.column("units_mean").unwrap().values()[1], Scalar::Float(2.0));
    }

    #[test]
    fn test_multi_key_labels_and_get_group() {
        let grouped = sales().group_by(&["region", "label"]).unwrap();
        assert_eq!(grouped.labels()[0], Scalar::from("(a, y)"));
        let group = grouped.get_group(&Scalar::from("(b, z)")).unwrap();
        assert_eq!(group.row_count(), 1);
        assert!(matches!(
            grouped.get_group(&Scalar::from("(c, q)")),
            Err(FrameError::Lookup(_))
        ));
    }

    #[test]
    fn test_missing_key_column() {
        assert!(matches!(sales().group_by(&["nope"]), Err(FrameError::Lookup(_))));
    }
}
