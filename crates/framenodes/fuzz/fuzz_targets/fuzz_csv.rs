//! Fuzz target for the CSV decoder.
//!
//! Decoding arbitrary text with any separator and decimal marker must never
//! panic, and whatever decodes must encode again.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use framenodes::config::{DecimalMarker, Separator};
use framenodes::interchange::{decode_csv, encode_csv};
use framenodes::CsvOptions;

#[derive(Debug, Arbitrary)]
struct Input {
    text: String,
    separator: u8,
    comma_decimal: bool,
}

fuzz_target!(|input: Input| {
    if input.text.len() > 100_000 {
        return;
    }

    let separator = Separator::ALL[input.separator as usize % Separator::ALL.len()];
    let decimal = if input.comma_decimal {
        DecimalMarker::Comma
    } else {
        DecimalMarker::Dot
    };
    let options = CsvOptions::default()
        .with_separator(separator)
        .with_decimal(decimal);

    if let Ok(table) = decode_csv(&input.text, &options) {
        let _ = encode_csv(&table, &options);
    }
});
