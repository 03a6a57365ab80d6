//! Fuzz target for orientation-free decoding.
//!
//! Any JSON document either decodes to a table that survives a split
//! round-trip, or fails with an error.

#![no_main]

use libfuzzer_sys::fuzz_target;

use framenodes::interchange::{decode, decode_auto, encode, Orientation};

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    if let Ok(table) = decode_auto(&value) {
        let encoded = encode(&table, Orientation::Split).expect("split encoding is total");
        let decoded = decode(&encoded, Orientation::Split).expect("split output decodes");
        assert_eq!(decoded, table);
    }
});
