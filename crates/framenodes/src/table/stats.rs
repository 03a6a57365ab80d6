//! Descriptive statistics over numeric columns.

use std::collections::HashMap;

use crate::error::{FrameError, Result};

use super::frame::{Column, Series, Table};
use super::index::RowIndex;
use super::scalar::{ColumnType, Scalar};

/// Row labels of [`Table::describe`].
pub const DESCRIBE_STATS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Arithmetic mean, NaN when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (ddof 1), NaN with fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Sample standard deviation (ddof 1).
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Minimum, NaN when empty.
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(f64::NAN)
}

/// Maximum, NaN when empty.
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
}

/// Sum of a column: integer columns stay integer.
pub fn column_sum(column: &Column) -> Scalar {
    match column.dtype() {
        ColumnType::Integer => column
            .values()
            .iter()
            .filter_map(|v| match v {
                Scalar::Int(i) => Some(*i),
                _ => None,
            })
            .try_fold(0i64, |acc, i| acc.checked_add(i))
            .map(Scalar::Int)
            // Overflowing totals fall back to float.
            .unwrap_or_else(|| Scalar::Float(column.numbers().iter().sum())),
        _ => Scalar::Float(column.numbers().iter().sum()),
    }
}

fn pairwise(a: &Column, b: &Column) -> (Vec<f64>, Vec<f64>) {
    a.values()
        .iter()
        .zip(b.values())
        .filter_map(|(x, y)| Some((x.as_f64()?, y.as_f64()?)))
        .unzip()
}

fn covariance(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() < 2 {
        return f64::NAN;
    }
    let mx = mean(xs);
    let my = mean(ys);
    xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum::<f64>() / (xs.len() - 1) as f64
}

fn correlation(xs: &[f64], ys: &[f64]) -> f64 {
    covariance(xs, ys) / (std_dev(xs) * std_dev(ys))
}

impl Table {
    /// Names of integer and float columns.
    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.columns()
            .filter(|(_, c)| c.dtype().is_numeric())
            .map(|(n, _)| n)
            .collect()
    }

    /// Apply a reduction to every numeric column, producing a series indexed
    /// by column name.
    pub fn reduce_numeric(&self, mut reduce: impl FnMut(&Column) -> Scalar) -> Result<Series> {
        let names = self.numeric_column_names();
        let values = names
            .iter()
            .map(|n| self.column(n).map(&mut reduce))
            .collect::<Result<Vec<_>>>()?;
        let index = RowIndex::new(names.into_iter().map(Scalar::from).collect());
        Series::new(None, values, index)
    }

    pub fn mean(&self) -> Result<Series> {
        self.reduce_numeric(|c| Scalar::Float(mean(&c.numbers())))
    }

    pub fn median(&self) -> Result<Series> {
        self.quantile(0.5)
    }

    pub fn std(&self) -> Result<Series> {
        self.reduce_numeric(|c| Scalar::Float(std_dev(&c.numbers())))
    }

    pub fn var(&self) -> Result<Series> {
        self.reduce_numeric(|c| Scalar::Float(variance(&c.numbers())))
    }

    pub fn sum(&self) -> Result<Series> {
        self.reduce_numeric(column_sum)
    }

    /// Quantile of every numeric column. `q` must lie in `[0, 1]`.
    pub fn quantile(&self, q: f64) -> Result<Series> {
        if !(0.0..=1.0).contains(&q) {
            return Err(FrameError::InvalidOption(format!(
                "quantile {} is outside [0, 1]",
                q
            )));
        }
        self.reduce_numeric(|c| Scalar::Float(quantile(&c.numbers(), q)))
    }

    /// Pairwise Pearson correlation of numeric columns.
    pub fn corr(&self) -> Result<Table> {
        self.pairwise_matrix(correlation)
    }

    /// Pairwise covariance of numeric columns.
    pub fn cov(&self) -> Result<Table> {
        self.pairwise_matrix(covariance)
    }

    fn pairwise_matrix(&self, f: impl Fn(&[f64], &[f64]) -> f64) -> Result<Table> {
        let names = self.numeric_column_names();
        let mut columns = Vec::with_capacity(names.len());
        for a in &names {
            let column_a = self.column(a)?;
            let values = names
                .iter()
                .map(|b| {
                    let (xs, ys) = pairwise(self.column(b)?, column_a);
                    Ok(Scalar::Float(f(&xs, &ys)))
                })
                .collect::<Result<Vec<_>>>()?;
            columns.push((a.to_string(), values));
        }
        let index = RowIndex::new(names.iter().map(|n| Scalar::from(*n)).collect());
        Table::new(columns, Some(index))
    }

    /// Summary statistics of numeric columns.
    pub fn describe(&self) -> Result<Table> {
        let mut columns = Vec::new();
        for name in self.numeric_column_names() {
            columns.push((name.to_string(), describe_values(&self.column(name)?.numbers())));
        }
        let index = RowIndex::new(DESCRIBE_STATS.iter().map(|s| Scalar::from(*s)).collect());
        Table::new(columns, Some(index))
    }

    /// Count unique complete rows, most frequent first.
    ///
    /// Rows containing a missing value are not counted. The result carries
    /// the input columns plus `count`, with a default index.
    pub fn value_counts(&self) -> Result<Table> {
        let mut counts: HashMap<Vec<Scalar>, usize> = HashMap::new();
        for row in self.rows().filter(|r| !r.iter().any(Scalar::is_null)) {
            *counts.entry(row).or_insert(0) += 1;
        }
        let mut entries: Vec<(Vec<Scalar>, usize)> = counts.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| {
            a.iter()
                .zip(b)
                .map(|(x, y)| x.total_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        entries.sort_by(|(_, a), (_, b)| b.cmp(a));

        let mut names: Vec<String> = self.column_names().into_iter().map(str::to_string).collect();
        names.push("count".to_string());
        let rows = entries
            .into_iter()
            .map(|(mut row, count)| {
                row.push(Scalar::Int(count as i64));
                row
            })
            .collect();
        Table::from_rows(names, rows, None)
    }
}

/// The eight [`DESCRIBE_STATS`] values for one column.
pub fn describe_values(values: &[f64]) -> Vec<Scalar> {
    vec![
        Scalar::Float(values.len() as f64),
        Scalar::Float(mean(values)),
        Scalar::Float(std_dev(values)),
        Scalar::Float(min(values)),
        Scalar::Float(quantile(values, 0.25)),
        Scalar::Float(quantile(values, 0.5)),
        Scalar::Float(quantile(values, 0.75)),
        Scalar::Float(max(values)),
    ]
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

    fn approx(a: &Scalar, b: f64) -> bool {
        (a.as_f64().unwrap() - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_skips_nulls() {
        let means = sample().mean().unwrap();
        assert!(approx(means.loc(&"A".into()).unwrap(), 2.0));
        assert!(approx(means.loc(&"C".into()).unwrap(), 1.65));
    }

    #[test]
    fn test_sum_widens_across_columns() {
        let sums = sample().sum().unwrap();
        assert_eq!(sums.loc(&"A".into()).unwrap(), &Scalar::Float(6.0));
    }

    #[test]
    fn test_integer_sum_overflow_widens_to_float() {
        let column = Column::new(vec![Scalar::Int(i64::MAX), Scalar::Int(1)]);
        assert_eq!(column_sum(&column), Scalar::Float(i64::MAX as f64 + 1.0));
        assert_eq!(
            column_sum(&Column::new(vec![Scalar::Int(i64::MAX), Scalar::Int(-1)])),
            Scalar::Int(i64::MAX - 1)
        );

        let table = Table::new(
            vec![("v".to_string(), vec![Scalar::Int(i64::MAX), Scalar::Int(1)])],
            None,
        )
        .unwrap();
        let sums = table.sum().unwrap();
        assert_eq!(sums.loc(&"v".into()).unwrap(), &Scalar::Float(i64::MAX as f64 + 1.0));
    }

    #[test]
    fn test_std_and_var() {
        let vars = sample().var().unwrap();
        assert!(approx(vars.loc(&"A".into()).unwrap(), 1.0));
        let stds = sample().std().unwrap();
        assert!(approx(stds.loc(&"B".into()).unwrap(), 1.0));
    }

    #[test]
    fn test_quantile_interpolates() {
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 0.5), 2.5);
        assert!(sample().quantile(1.5).is_err());
    }

    #[test]
    fn test_corr_diagonal() {
        let corr = sample().corr().unwrap();
        assert_eq!(corr.column_names(), vec!["A", "B", "C"]);
        assert!(approx(&corr.column("A").unwrap().values()[0], 1.0));
        assert!(approx(&corr.column("B").unwrap().values()[0], 1.0));
    }

    #[test]
    fn test_describe_shape() {
        let description = sample().describe().unwrap();
        assert_eq!(description.row_count(), 8);
        assert_eq!(description.column("C").unwrap().values()[0], Scalar::Float(2.0));
    }

    #[test]
    fn test_value_counts() {
        let doubled = sample().concat(&sample()).unwrap();
        let counts = doubled.value_counts().unwrap();
        assert_eq!(counts.column_names(), vec!["A", "B", "C", "count"]);
        assert_eq!(counts.row_count(), 2);
        assert_eq!(counts.column("count").unwrap().values()[0], Scalar::Int(2));
    }
}
