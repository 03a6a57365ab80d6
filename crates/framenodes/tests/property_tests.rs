//! Property-based tests for the interchange codec and table operations.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p framenodes --test property_tests
//! PROPTEST_CASES=10000 cargo test -p framenodes --test property_tests
//! ```

use proptest::prelude::*;

use framenodes::interchange::{decode, decode_auto, decode_csv, encode, encode_csv, Orientation};
use framenodes::{CsvOptions, Scalar, Table};

// =============================================================================
// Test Strategies
// =============================================================================

fn column_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

fn text_cell() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        9 => "[a-z]{1,8}".prop_map(Scalar::Text),
        1 => Just(Scalar::Null),
    ]
}

fn int_cell() -> impl Strategy<Value = Scalar> {
    (-1_000_000i64..1_000_000).prop_map(Scalar::Int)
}

fn float_cell() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        9 => (-1.0e6f64..1.0e6).prop_map(Scalar::Float),
        1 => Just(Scalar::Null),
    ]
}

/// Columns of one kind each: integers, floats with gaps, or text with gaps.
fn column(rows: usize) -> impl Strategy<Value = Vec<Scalar>> {
    prop_oneof![
        prop::collection::vec(int_cell(), rows),
        prop::collection::vec(float_cell(), rows),
        prop::collection::vec(text_cell(), rows),
    ]
}

fn table() -> impl Strategy<Value = Table> {
    (1usize..8, prop::collection::hash_set(column_name(), 1..5)).prop_flat_map(|(rows, names)| {
        let names: Vec<String> = names.into_iter().collect();
        prop::collection::vec(column(rows), names.len()).prop_map(move |columns| {
            Table::new(names.iter().cloned().zip(columns).collect(), None)
                .expect("columns share a length")
        })
    })
}

// =============================================================================
// Round-Trip Properties
// =============================================================================

proptest! {
    #[test]
    fn split_round_trip(table in table()) {
        let encoded = encode(&table, Orientation::Split).unwrap();
        prop_assert_eq!(decode(&encoded, Orientation::Split).unwrap(), table);
    }

    #[test]
    fn dict_decodes_without_orientation(table in table()) {
        let encoded = encode(&table, Orientation::Dict).unwrap();
        prop_assert_eq!(decode_auto(&encoded).unwrap(), table);
    }

    #[test]
    fn records_round_trip(table in table()) {
        let encoded = encode(&table, Orientation::Records).unwrap();
        prop_assert_eq!(decode(&encoded, Orientation::Records).unwrap(), table);
    }

    #[test]
    fn csv_round_trip_preserves_shape(table in table()) {
        let options = CsvOptions::default();
        let text = encode_csv(&table, &options).unwrap();
        let decoded = decode_csv(&text, &options).unwrap();
        prop_assert_eq!(decoded.column_names(), table.column_names());
        prop_assert_eq!(decoded.row_count(), table.row_count());
    }
}

// =============================================================================
// Operation Invariants
// =============================================================================

proptest! {
    #[test]
    fn csv_decode_never_panics(text in "[a-z0-9,.;\"\n ]{0,200}") {
        let _ = decode_csv(&text, &CsvOptions::default());
    }

    #[test]
    fn drop_duplicates_is_idempotent(table in table()) {
        let once = table.drop_duplicates(None).unwrap();
        prop_assert_eq!(once.drop_duplicates(None).unwrap(), once.clone());
        prop_assert!(once.row_count() <= table.row_count());
    }

    #[test]
    fn mask_keeps_selected_rows(table in table(), seed in any::<u64>()) {
        let flags: Vec<bool> = (0..table.row_count()).map(|i| (seed >> (i % 64)) & 1 == 1).collect();
        let masked = table.mask(&flags).unwrap();
        prop_assert_eq!(masked.row_count(), flags.iter().filter(|f| **f).count());
    }
}
