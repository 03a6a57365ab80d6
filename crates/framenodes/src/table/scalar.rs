//! Cell values and the type tags carried by columns and indexes.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FrameError, Result};

/// Timestamp format used for text and JSON renderings.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A single cell value.
#[derive(Debug, Clone, Default)]
pub enum Scalar {
    /// Missing value.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Scalar {
    /// Returns true for `Null` and for NaN floats.
    pub fn is_null(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the value (integers widen, booleans do not).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            Scalar::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The column type this single value implies, `None` for nulls.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Scalar::Null => None,
            Scalar::Float(f) if f.is_nan() => None,
            Scalar::Bool(_) => Some(ColumnType::Boolean),
            Scalar::Int(_) => Some(ColumnType::Integer),
            Scalar::Float(_) => Some(ColumnType::Float),
            Scalar::Text(_) => Some(ColumnType::Text),
            Scalar::Timestamp(_) => Some(ColumnType::DateTime),
        }
    }

    /// Convert a JSON value to a scalar. Nested arrays and objects are rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Scalar::Null),
            Value::Bool(b) => Ok(Scalar::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Scalar::Int(i)),
                None => n
                    .as_f64()
                    .map(Scalar::Float)
                    .ok_or_else(|| FrameError::Type(format!("unsupported number {}", n))),
            },
            Value::String(s) => Ok(Scalar::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => Err(FrameError::Type(format!(
                "expected a scalar cell value, got {}",
                value
            ))),
        }
    }

    /// Convert to a JSON value. NaN becomes null.
    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::from(*i),
            Scalar::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Scalar::Text(s) => Value::String(s.clone()),
            Scalar::Timestamp(t) => Value::String(t.format(TIMESTAMP_FORMAT).to_string()),
        }
    }

    /// Render as a mapping key (used by the `dict` and `index` orientations).
    pub fn to_key(&self) -> String {
        match self {
            Scalar::Null => "null".to_string(),
            Scalar::Float(f) => format!("{:?}", f),
            other => other.to_string(),
        }
    }

    /// Parse a text cell: integers, floats and booleans are recognized,
    /// empty text is null, anything else stays text.
    pub fn infer_from_str(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Scalar::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Scalar::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Scalar::Float(f);
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Scalar::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Scalar::Bool(false);
        }
        Scalar::Text(raw.to_string())
    }

    /// Total order used for sorting group keys and categories.
    ///
    /// Nulls sort last; integers and floats compare numerically; otherwise
    /// values of different kinds order by kind.
    pub fn total_cmp(&self, other: &Scalar) -> Ordering {
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.total_cmp(&b);
        }
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Text(a), Scalar::Text(b)) => a.cmp(b),
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Scalar::Bool(_) => 0,
            Scalar::Int(_) => 1,
            Scalar::Float(f) if !f.is_nan() => 1,
            Scalar::Timestamp(_) => 2,
            Scalar::Text(_) => 3,
            Scalar::Float(_) | Scalar::Null => 4,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Scalar::Null => {}
            Scalar::Bool(b) => b.hash(state),
            Scalar::Int(i) => i.hash(state),
            Scalar::Float(f) => {
                let bits = if f.is_nan() {
                    f64::NAN.to_bits()
                } else if *f == 0.0 {
                    0.0f64.to_bits()
                } else {
                    f.to_bits()
                };
                bits.hash(state)
            }
            Scalar::Text(s) => s.hash(state),
            Scalar::Timestamp(t) => t.hash(state),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, ""),
            Scalar::Bool(true) => write!(f, "True"),
            Scalar::Bool(false) => write!(f, "False"),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(v) => write!(f, "{:?}", v),
            Scalar::Text(s) => write!(f, "{}", s),
            Scalar::Timestamp(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(i64::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(value: NaiveDateTime) -> Self {
        Scalar::Timestamp(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Null)
    }
}

/// Declared data type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// Boolean values.
    Boolean,
    /// Text values.
    Text,
    /// Date and time values.
    DateTime,
    /// Values of more than one kind.
    Mixed,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Infer the type of a sequence of values.
    ///
    /// Nulls are ignored, except that integers with missing values widen to
    /// float like integer and float do. An empty or all-null sequence is float.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Scalar>) -> ColumnType {
        let mut inferred: Option<ColumnType> = None;
        let mut saw_null = false;
        for value in values {
            let Some(t) = value.column_type() else {
                saw_null = true;
                continue;
            };
            inferred = Some(match inferred {
                None => t,
                Some(current) if current == t => current,
                Some(current) if current.is_numeric() && t.is_numeric() => ColumnType::Float,
                Some(_) => return ColumnType::Mixed,
            });
        }
        match inferred {
            Some(ColumnType::Integer) if saw_null => ColumnType::Float,
            Some(t) => t,
            None => ColumnType::Float,
        }
    }
}

/// Declared element type of a row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    Integer,
    Float,
    Text,
    Timestamp,
}

impl IndexType {
    /// Coerce a lookup key to this type.
    ///
    /// Text keys are parsed; numbers convert between integer and float when
    /// the conversion is exact.
    pub fn coerce(&self, key: &Scalar) -> Result<Scalar> {
        let fail = || {
            FrameError::Type(format!(
                "cannot use '{}' as a {:?} index label",
                key,
                self
            ))
        };
        match (self, key) {
            (IndexType::Integer, Scalar::Int(_)) => Ok(key.clone()),
            (IndexType::Integer, Scalar::Float(f)) if f.fract() == 0.0 && f.is_finite() => {
                Ok(Scalar::Int(*f as i64))
            }
            (IndexType::Integer, Scalar::Text(s)) => {
                let s = s.trim();
                s.parse::<i64>().map(Scalar::Int).or_else(|_| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.fract() == 0.0 && f.is_finite())
                        .map(|f| Scalar::Int(f as i64))
                        .ok_or_else(fail)
                })
            }
            (IndexType::Float, Scalar::Int(i)) => Ok(Scalar::Float(*i as f64)),
            (IndexType::Float, Scalar::Float(_)) => Ok(key.clone()),
            (IndexType::Float, Scalar::Text(s)) => {
                s.trim().parse::<f64>().map(Scalar::Float).map_err(|_| fail())
            }
            (IndexType::Text, Scalar::Text(_)) => Ok(key.clone()),
            (IndexType::Text, other) => Ok(Scalar::Text(other.to_string())),
            (IndexType::Timestamp, Scalar::Timestamp(_)) => Ok(key.clone()),
            (IndexType::Timestamp, Scalar::Text(s)) => parse_timestamp(s.trim())
                .map(Scalar::Timestamp)
                .ok_or_else(fail),
            _ => Err(fail()),
        }
    }
}

/// Parse the timestamp renderings this crate produces (and a date-only form).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_column_type() {
        let ints = [Scalar::Int(1), Scalar::Int(3)];
        assert_eq!(ColumnType::infer(&ints), ColumnType::Integer);

        let gapped = [Scalar::Int(1), Scalar::Null, Scalar::Int(3)];
        assert_eq!(ColumnType::infer(&gapped), ColumnType::Float);

        let widened = [Scalar::Int(1), Scalar::Float(2.5)];
        assert_eq!(ColumnType::infer(&widened), ColumnType::Float);

        let mixed = [Scalar::Int(1), Scalar::from("a")];
        assert_eq!(ColumnType::infer(&mixed), ColumnType::Mixed);

        assert_eq!(ColumnType::infer(&[Scalar::Null]), ColumnType::Float);
    }

    #[test]
    fn test_nan_equality() {
        assert_eq!(Scalar::Float(f64::NAN), Scalar::Float(f64::NAN));
        assert!(Scalar::Float(f64::NAN).is_null());
        assert_ne!(Scalar::Int(1), Scalar::Float(1.0));
    }

    #[test]
    fn test_infer_from_str() {
        assert_eq!(Scalar::infer_from_str("42"), Scalar::Int(42));
        assert_eq!(Scalar::infer_from_str("4.5"), Scalar::Float(4.5));
        assert_eq!(Scalar::infer_from_str("TRUE"), Scalar::Bool(true));
        assert_eq!(Scalar::infer_from_str(""), Scalar::Null);
        assert_eq!(Scalar::infer_from_str("abc"), Scalar::from("abc"));
    }

    #[test]
    fn test_coerce_index_keys() {
        assert_eq!(
            IndexType::Integer.coerce(&Scalar::from("0")).unwrap(),
            Scalar::Int(0)
        );
        assert_eq!(
            IndexType::Integer.coerce(&Scalar::Float(1.0)).unwrap(),
            Scalar::Int(1)
        );
        assert_eq!(
            IndexType::Text.coerce(&Scalar::Int(7)).unwrap(),
            Scalar::from("7")
        );
        assert!(IndexType::Integer.coerce(&Scalar::from("x")).is_err());
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(Scalar::Float(f64::NAN).to_json(), Value::Null);
        assert_eq!(
            Scalar::from_json(&serde_json::json!(3)).unwrap(),
            Scalar::Int(3)
        );
        assert!(Scalar::from_json(&serde_json::json!([1])).is_err());
    }

    #[test]
    fn test_total_cmp_numeric() {
        assert_eq!(Scalar::Int(2).total_cmp(&Scalar::Float(1.5)), Ordering::Greater);
        assert_eq!(Scalar::Null.total_cmp(&Scalar::Int(0)), Ordering::Greater);
    }
}
