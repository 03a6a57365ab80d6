//! Codec options and node library defaults.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};
use crate::interchange::Orientation;
use crate::table::JoinHow;

/// CSV field separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Separator {
    #[default]
    Comma,
    Semicolon,
    Tab,
    Pipe,
    Space,
}

impl Separator {
    /// All separators, in the order offered as port choices.
    pub const ALL: [Separator; 5] = [
        Separator::Comma,
        Separator::Semicolon,
        Separator::Tab,
        Separator::Pipe,
        Separator::Space,
    ];

    pub fn as_byte(&self) -> u8 {
        match self {
            Separator::Comma => b',',
            Separator::Semicolon => b';',
            Separator::Tab => b'\t',
            Separator::Pipe => b'|',
            Separator::Space => b' ',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Separator::Comma => ",",
            Separator::Semicolon => ";",
            Separator::Tab => "\t",
            Separator::Pipe => "|",
            Separator::Space => " ",
        }
    }
}

impl FromStr for Separator {
    type Err = FrameError;

    /// Accepts the separator character itself or its name.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "," | "comma" => Ok(Separator::Comma),
            ";" | "semicolon" => Ok(Separator::Semicolon),
            "\t" | "\\t" | "tab" => Ok(Separator::Tab),
            "|" | "pipe" => Ok(Separator::Pipe),
            " " | "space" => Ok(Separator::Space),
            other => Err(FrameError::InvalidOption(format!(
                "unknown separator '{}'",
                other
            ))),
        }
    }
}

/// Decimal (or thousands) marker character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecimalMarker {
    #[default]
    Dot,
    Comma,
}

impl DecimalMarker {
    pub const ALL: [DecimalMarker; 2] = [DecimalMarker::Dot, DecimalMarker::Comma];

    pub fn as_char(&self) -> char {
        match self {
            DecimalMarker::Dot => '.',
            DecimalMarker::Comma => ',',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecimalMarker::Dot => ".",
            DecimalMarker::Comma => ",",
        }
    }
}

impl FromStr for DecimalMarker {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "." | "dot" => Ok(DecimalMarker::Dot),
            "," | "comma" => Ok(DecimalMarker::Comma),
            other => Err(FrameError::InvalidOption(format!(
                "unknown decimal marker '{}'",
                other
            ))),
        }
    }
}

/// CSV codec options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Field separator.
    pub separator: Separator,
    /// Decimal point marker.
    pub decimal: DecimalMarker,
    /// Optional thousands grouping marker. Must differ from `decimal`.
    pub thousands: Option<DecimalMarker>,
    /// Emit the row index as a leading column when encoding.
    pub include_index: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            separator: Separator::Comma,
            decimal: DecimalMarker::Dot,
            thousands: None,
            include_index: false,
        }
    }
}

impl CsvOptions {
    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_decimal(mut self, decimal: DecimalMarker) -> Self {
        self.decimal = decimal;
        self
    }

    pub fn with_thousands(mut self, thousands: Option<DecimalMarker>) -> Self {
        self.thousands = thousands;
        self
    }

    pub fn with_index(mut self, include_index: bool) -> Self {
        self.include_index = include_index;
        self
    }

    /// Reject a thousands marker equal to the decimal marker.
    pub fn validate(&self) -> Result<()> {
        if self.thousands == Some(self.decimal) {
            return Err(FrameError::InvalidOption(format!(
                "thousands marker '{}' equals the decimal marker",
                self.decimal.as_str()
            )));
        }
        Ok(())
    }
}

/// Spreadsheet codec options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetOptions {
    /// Name of the sheet written by the encoder.
    pub sheet_name: String,
    /// Emit the row index as a leading column when encoding.
    pub include_index: bool,
    /// Use the first column as the row index when decoding.
    pub use_first_column_as_index: bool,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_string(),
            include_index: false,
            use_first_column_as_index: false,
        }
    }
}

/// Defaults applied to the ports of the node library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// CSV port defaults.
    pub csv: CsvOptions,
    /// Spreadsheet port defaults.
    pub sheet: SheetOptions,
    /// Default orientation of the orientation-aware convert nodes.
    pub orient: Orientation,
    /// Default join type of the merge node.
    pub merge_how: JoinHow,
    /// Default join type of the join node.
    pub join_how: JoinHow,
    /// Default quantile.
    pub quantile: f64,
    /// Default value used by the fill node.
    pub fill_value: serde_json::Value,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            csv: CsvOptions::default(),
            sheet: SheetOptions::default(),
            orient: Orientation::Split,
            merge_how: JoinHow::Inner,
            join_how: JoinHow::Left,
            quantile: 0.5,
            fill_value: serde_json::Value::from(0),
        }
    }
}

impl LibraryConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(source: &str) -> Result<Self> {
        let config: LibraryConfig = serde_json::from_str(source)?;
        config.csv.validate()?;
        if !(0.0..=1.0).contains(&config.quantile) {
            return Err(FrameError::InvalidOption(format!(
                "quantile {} is outside [0, 1]",
                config.quantile
            )));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LibraryConfig::default();
        assert_eq!(config.csv.separator, Separator::Comma);
        assert_eq!(config.sheet.sheet_name, "Sheet1");
        assert_eq!(config.orient, Orientation::Split);
    }

    #[test]
    fn test_partial_json_config() {
        let config = LibraryConfig::from_json(r#"{"csv": {"separator": "semicolon"}}"#).unwrap();
        assert_eq!(config.csv.separator, Separator::Semicolon);
        assert_eq!(config.csv.decimal, DecimalMarker::Dot);
        assert_eq!(config.join_how, JoinHow::Left);
    }

    #[test]
    fn test_thousands_equal_to_decimal_rejected() {
        let options = CsvOptions::default().with_thousands(Some(DecimalMarker::Dot));
        assert!(matches!(options.validate(), Err(FrameError::InvalidOption(_))));
        assert!(LibraryConfig::from_json(r#"{"csv": {"thousands": "dot"}}"#).is_err());
    }

    #[test]
    fn test_separator_from_str() {
        assert_eq!(";".parse::<Separator>().unwrap(), Separator::Semicolon);
        assert_eq!("tab".parse::<Separator>().unwrap(), Separator::Tab);
        assert!("#".parse::<Separator>().is_err());
    }
}
