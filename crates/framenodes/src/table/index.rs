//! Row index: ordered row labels with a declared element type.

use crate::error::{FrameError, Result};

use super::scalar::{IndexType, Scalar};

/// Ordered row labels. Labels need not be unique.
#[derive(Debug, Clone, PartialEq)]
pub struct RowIndex {
    labels: Vec<Scalar>,
    dtype: IndexType,
    name: Option<String>,
}

impl RowIndex {
    /// Build an index from labels, normalizing them to a single element type.
    pub fn new(labels: Vec<Scalar>) -> Self {
        let dtype = infer_index_type(&labels);
        let labels = match dtype {
            IndexType::Integer | IndexType::Timestamp | IndexType::Text
                if labels.iter().all(|l| index_type_of(l) == Some(dtype)) =>
            {
                labels
            }
            IndexType::Float => labels
                .into_iter()
                .map(|l| match l {
                    Scalar::Int(i) => Scalar::Float(i as f64),
                    other => other,
                })
                .collect(),
            _ => labels
                .into_iter()
                .map(|l| match l {
                    Scalar::Text(s) => Scalar::Text(s),
                    other => Scalar::Text(other.to_string()),
                })
                .collect(),
        };
        Self {
            labels,
            dtype,
            name: None,
        }
    }

    /// The default `0..len` index.
    pub fn range(len: usize) -> Self {
        Self {
            labels: (0..len as i64).map(Scalar::Int).collect(),
            dtype: IndexType::Integer,
            name: None,
        }
    }

    /// Build an index from mapping keys.
    ///
    /// Keys that all parse as integers become integer labels, keys that all
    /// parse as numbers become float labels, anything else stays text.
    pub fn from_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let keys: Vec<&str> = keys.into_iter().collect();
        if let Some(ints) = keys
            .iter()
            .map(|k| k.parse::<i64>().ok().map(Scalar::Int))
            .collect::<Option<Vec<_>>>()
        {
            return Self::new(ints);
        }
        if let Some(floats) = keys
            .iter()
            .map(|k| {
                k.parse::<f64>()
                    .ok()
                    .filter(|_| k.bytes().any(|b| b.is_ascii_digit()))
                    .map(Scalar::Float)
            })
            .collect::<Option<Vec<_>>>()
        {
            return Self::new(floats);
        }
        Self::new(keys.into_iter().map(Scalar::from).collect())
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn dtype(&self) -> IndexType {
        self.dtype
    }

    pub fn labels(&self) -> &[Scalar] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Scalar> {
        self.labels.get(position)
    }

    /// Coerce a lookup key to this index's element type.
    pub fn coerce(&self, key: &Scalar) -> Result<Scalar> {
        self.dtype.coerce(key)
    }

    /// All positions holding `key` (after coercion).
    ///
    /// A key absent from the index is a lookup error, including one that
    /// cannot be coerced to the index type.
    pub fn positions(&self, key: &Scalar) -> Result<Vec<usize>> {
        let key = self.coerce(key).map_err(|_| {
            FrameError::Lookup(format!("row label '{}' not found in index", key))
        })?;
        let found: Vec<usize> = self
            .labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == key)
            .map(|(i, _)| i)
            .collect();
        if found.is_empty() {
            return Err(FrameError::Lookup(format!(
                "row label '{}' not found in index",
                key
            )));
        }
        Ok(found)
    }

    /// Select labels by position.
    pub fn take(&self, positions: &[usize]) -> Self {
        Self {
            labels: positions.iter().map(|&p| self.labels[p].clone()).collect(),
            dtype: self.dtype,
            name: self.name.clone(),
        }
    }

    /// Concatenate two indexes, re-normalizing the element type.
    pub fn concat(&self, other: &RowIndex) -> Self {
        let mut labels = self.labels.clone();
        labels.extend(other.labels.iter().cloned());
        let name = if self.name == other.name {
            self.name.clone()
        } else {
            None
        };
        Self::new(labels).with_name(name)
    }
}

impl Default for RowIndex {
    fn default() -> Self {
        Self::range(0)
    }
}

fn index_type_of(label: &Scalar) -> Option<IndexType> {
    match label {
        Scalar::Int(_) => Some(IndexType::Integer),
        Scalar::Float(_) => Some(IndexType::Float),
        Scalar::Text(_) => Some(IndexType::Text),
        Scalar::Timestamp(_) => Some(IndexType::Timestamp),
        Scalar::Null | Scalar::Bool(_) => None,
    }
}

fn infer_index_type(labels: &[Scalar]) -> IndexType {
    let mut inferred: Option<IndexType> = None;
    for label in labels {
        let Some(t) = index_type_of(label) else {
            return IndexType::Text;
        };
        inferred = Some(match (inferred, t) {
            (None, t) => t,
            (Some(current), t) if current == t => current,
            (Some(IndexType::Integer), IndexType::Float)
            | (Some(IndexType::Float), IndexType::Integer) => IndexType::Float,
            _ => return IndexType::Text,
        });
    }
    inferred.unwrap_or(IndexType::Integer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_index() {
        let index = RowIndex::range(3);
        assert_eq!(index.dtype(), IndexType::Integer);
        assert_eq!(index.labels(), &[Scalar::Int(0), Scalar::Int(1), Scalar::Int(2)]);
    }

    #[test]
    fn test_mixed_labels_become_text() {
        let index = RowIndex::new(vec![Scalar::Int(1), Scalar::from("b")]);
        assert_eq!(index.dtype(), IndexType::Text);
        assert_eq!(index.labels(), &[Scalar::from("1"), Scalar::from("b")]);
    }

    #[test]
    fn test_int_and_float_widen() {
        let index = RowIndex::new(vec![Scalar::Int(1), Scalar::Float(1.5)]);
        assert_eq!(index.dtype(), IndexType::Float);
        assert_eq!(index.labels()[0], Scalar::Float(1.0));
    }

    #[test]
    fn test_from_keys() {
        assert_eq!(RowIndex::from_keys(["0", "1"]).dtype(), IndexType::Integer);
        assert_eq!(RowIndex::from_keys(["0.5", "1"]).dtype(), IndexType::Float);
        assert_eq!(RowIndex::from_keys(["a", "1"]).dtype(), IndexType::Text);
    }

    #[test]
    fn test_positions_coerce_text_key() {
        let index = RowIndex::range(3);
        assert_eq!(index.positions(&Scalar::from("1")).unwrap(), vec![1]);
        assert!(matches!(
            index.positions(&Scalar::Int(9)),
            Err(FrameError::Lookup(_))
        ));
        assert!(matches!(
            index.positions(&Scalar::from("x")),
            Err(FrameError::Lookup(_))
        ));
    }
}
