//! Database-style merges on columns and joins on the right index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};

use super::frame::Table;
use super::index::RowIndex;
use super::scalar::Scalar;

/// Which rows a merge or join keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinHow {
    /// Only rows with a match on both sides.
    #[default]
    Inner,
    /// Every row of both sides: left rows first, then unmatched right rows.
    Outer,
    /// Every left row.
    Left,
    /// Every right row, in right order.
    Right,
}

impl JoinHow {
    pub const ALL: [JoinHow; 4] = [JoinHow::Inner, JoinHow::Outer, JoinHow::Left, JoinHow::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            JoinHow::Inner => "inner",
            JoinHow::Outer => "outer",
            JoinHow::Left => "left",
            JoinHow::Right => "right",
        }
    }
}

impl std::str::FromStr for JoinHow {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "inner" => Ok(JoinHow::Inner),
            "outer" => Ok(JoinHow::Outer),
            "left" => Ok(JoinHow::Left),
            "right" => Ok(JoinHow::Right),
            other => Err(FrameError::InvalidOption(format!(
                "unknown join type '{}'",
                other
            ))),
        }
    }
}

type RowPairs = Vec<(Option<usize>, Option<usize>)>;

/// Pair left and right rows whose keys are equal.
fn pair_rows(left_keys: &[Vec<Scalar>], right_keys: &[Vec<Scalar>], how: JoinHow) -> RowPairs {
    let mut by_key: HashMap<&[Scalar], Vec<usize>> = HashMap::new();
    for (r, key) in right_keys.iter().enumerate() {
        by_key.entry(key.as_slice()).or_default().push(r);
    }
    let mut pairs = Vec::new();
    match how {
        JoinHow::Right => {
            let mut left_by_key: HashMap<&[Scalar], Vec<usize>> = HashMap::new();
            for (l, key) in left_keys.iter().enumerate() {
                left_by_key.entry(key.as_slice()).or_default().push(l);
            }
            for (r, key) in right_keys.iter().enumerate() {
                match left_by_key.get(key.as_slice()) {
                    Some(lefts) => pairs.extend(lefts.iter().map(|&l| (Some(l), Some(r)))),
                    None => pairs.push((None, Some(r))),
                }
            }
        }
        _ => {
            let mut matched_right = vec![false; right_keys.len()];
            for (l, key) in left_keys.iter().enumerate() {
                match by_key.get(key.as_slice()) {
                    Some(rights) => {
                        for &r in rights {
                            matched_right[r] = true;
                            pairs.push((Some(l), Some(r)));
                        }
                    }
                    None if how != JoinHow::Inner => pairs.push((Some(l), None)),
                    None => {}
                }
            }
            if how == JoinHow::Outer {
                pairs.extend(
                    matched_right
                        .iter()
                        .enumerate()
                        .filter(|(_, matched)| !**matched)
                        .map(|(r, _)| (None, Some(r))),
                );
            }
        }
    }
    pairs
}

fn row_keys(table: &Table, names: &[&str]) -> Result<Vec<Vec<Scalar>>> {
    let columns = names
        .iter()
        .map(|n| table.column(n))
        .collect::<Result<Vec<_>>>()?;
    Ok((0..table.row_count())
        .map(|row| columns.iter().map(|c| c.values()[row].clone()).collect())
        .collect())
}

fn pick(table: &Table, name: &str, rows: impl Iterator<Item = Option<usize>>) -> Result<Vec<Scalar>> {
    let values = table.column(name)?.values();
    Ok(rows
        .map(|row| row.map(|r| values[r].clone()).unwrap_or(Scalar::Null))
        .collect())
}

impl Table {
    /// Merge with `right` on key columns.
    ///
    /// Without keys the tables merge on their common columns. Key columns
    /// sharing a name appear once; other overlapping columns get `_x` and
    /// `_y` suffixes. The result has a default index.
    pub fn merge(
        &self,
        right: &Table,
        how: JoinHow,
        left_on: Option<&[&str]>,
        right_on: Option<&[&str]>,
    ) -> Result<Table> {
        let common: Vec<&str>;
        let (left_on, right_on) = match (left_on, right_on) {
            (Some(l), Some(r)) => (l, r),
            (None, None) => {
                common = self
                    .column_names()
                    .into_iter()
                    .filter(|n| right.has_column(n))
                    .collect();
                if common.is_empty() {
                    return Err(FrameError::InvalidOption(
                        "no common columns to merge on".to_string(),
                    ));
                }
                (common.as_slice(), common.as_slice())
            }
            _ => {
                return Err(FrameError::InvalidOption(
                    "both left_on and right_on are required".to_string(),
                ));
            }
        };
        if left_on.len() != right_on.len() {
            return Err(FrameError::InvalidOption(format!(
                "left_on has {} keys but right_on has {}",
                left_on.len(),
                right_on.len()
            )));
        }

        let pairs = pair_rows(&row_keys(self, left_on)?, &row_keys(right, right_on)?, how);
        let shared_keys: Vec<&str> = left_on
            .iter()
            .zip(right_on)
            .filter(|(l, r)| l == r)
            .map(|(l, _)| *l)
            .collect();

        let mut columns = Vec::new();
        for name in self.column_names() {
            let mut values = pick(self, name, pairs.iter().map(|p| p.0))?;
            let label = if shared_keys.contains(&name) {
                for (cell, (l, r)) in values.iter_mut().zip(&pairs) {
                    if let (None, Some(r)) = (l, r) {
                        *cell = right.column(name)?.values()[*r].clone();
                    }
                }
                name.to_string()
            } else if right.has_column(name) {
                format!("{}_x", name)
            } else {
                name.to_string()
            };
            columns.push((label, values));
        }
        for name in right.column_names() {
            if shared_keys.contains(&name) {
                continue;
            }
            let label = if self.has_column(name) {
                format!("{}_y", name)
            } else {
                name.to_string()
            };
            columns.push((label, pick(right, name, pairs.iter().map(|p| p.1))?));
        }
        Table::new(columns, None)
    }

    /// Join `right` on its index.
    ///
    /// The left key is the column `on` or, without it, the left index. Left
    /// keys are coerced to the right index type before matching; keys that
    /// cannot be coerced match nothing. Overlapping column names need at
    /// least one non-empty suffix.
    pub fn join(
        &self,
        right: &Table,
        how: JoinHow,
        on: Option<&str>,
        lsuffix: &str,
        rsuffix: &str,
    ) -> Result<Table> {
        let overlap: Vec<&str> = self
            .column_names()
            .into_iter()
            .filter(|n| right.has_column(n))
            .collect();
        if !overlap.is_empty() && lsuffix.is_empty() && rsuffix.is_empty() {
            return Err(FrameError::Shape(format!(
                "columns overlap but no suffix specified: {:?}",
                overlap
            )));
        }

        let raw_keys: Vec<Scalar> = match on {
            Some(name) => self.column(name)?.values().to_vec(),
            None => self.index().labels().to_vec(),
        };
        let left_keys: Vec<Vec<Scalar>> = raw_keys
            .iter()
            .map(|k| vec![right.index().coerce(k).unwrap_or(Scalar::Null)])
            .collect();
        let right_keys: Vec<Vec<Scalar>> = right
            .index()
            .labels()
            .iter()
            .map(|l| vec![l.clone()])
            .collect();
        let pairs = pair_rows(&left_keys, &right_keys, how);

        let mut columns = Vec::new();
        for name in self.column_names() {
            let label = if overlap.contains(&name) {
                format!("{}{}", name, lsuffix)
            } else {
                name.to_string()
            };
            columns.push((label, pick(self, name, pairs.iter().map(|p| p.0))?));
        }
        for name in right.column_names() {
            let label = if overlap.contains(&name) {
                format!("{}{}", name, rsuffix)
            } else {
                name.to_string()
            };
            columns.push((label, pick(right, name, pairs.iter().map(|p| p.1))?));
        }

        let labels = pairs
            .iter()
            .map(|(l, r)| match (l, r) {
                (Some(l), _) => self.index().labels()[*l].clone(),
                (None, Some(r)) => right.index().labels()[*r].clone(),
                (None, None) => Scalar::Null,
            })
            .collect();
        let name = if how == JoinHow::Right {
            right.index().name()
        } else {
            self.index().name()
        };
        Table::new(
            columns,
            Some(RowIndex::new(labels).with_name(name.map(str::to_string))),
        )
    }
}
