//! Property tests: arbitrary records survive the trip through wire JSON

use crate::common::*;
use crate::documents::*;
use chrono::{TimeZone, Utc};
use grove::{decode_entity, encode_entity};
use proptest::prelude::*;

fn line() -> impl Strategy<Value = Line> {
    ("[A-Z]-[0-9]{1,3}", any::<i64>()).prop_map(|(sku, quantity)| Line { sku, quantity })
}

fn invoice() -> impl Strategy<Value = Invoice> {
    (
        "[a-z]{1,12}",
        0i64..4_000_000_000,
        0u32..1_000_000_000,
        prop::collection::vec(line(), 0..5),
        prop::collection::vec("\\PC{0,8}", 0..4),
        prop::option::of("\\PC{0,16}"),
        (-4_000_000i32..4_000_000).prop_map(|n| f64::from(n) / 4.0),
        any::<bool>(),
        prop::collection::vec(any::<u8>(), 0..32),
        ("\\PC{0,12}", "\\PC{0,12}"),
    )
        .prop_map(
            |(customer, secs, nanos, lines, tags, notes, total, paid, signature, (street, city))| {
                Invoice {
                    customer: Key::name("Customer", customer),
                    issued: Utc.timestamp_opt(secs, nanos).unwrap(),
                    lines,
                    tags,
                    notes,
                    total,
                    paid,
                    signature,
                    billing: Address { street, city },
                    cache: String::new(),
                }
            },
        )
}

proptest! {
    #[test]
    fn invoices_survive_wire_json(original in invoice()) {
        let entity = encode_entity(&original, Some(Key::id("Invoice", 1))).unwrap();
        let text = serde_json::to_string(&entity).unwrap();
        let parsed: Entity = serde_json::from_str(&text).unwrap();
        let decoded: Invoice = decode_entity(&parsed).unwrap();

        prop_assert_eq!(parsed.key, Some(Key::id("Invoice", 1)));
        prop_assert_eq!(decoded, original);
    }

    #[test]
    fn canonical_strings_tell_keys_apart(a in "[a-z0-9,/\"]{0,6}", b in "[a-z0-9,/\"]{0,6}") {
        let ka = Key::name("K", a.clone());
        let kb = Key::name("K", b.clone());
        prop_assert_eq!(ka.canonical_string() == kb.canonical_string(), a == b);
    }
}
