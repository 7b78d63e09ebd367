//! Property-based tests for the decoder
//!
//! Generated frames exercise the invariants that must hold for any input of
//! a given shape, not just the captured fixtures.

use proptest::prelude::*;
use tl1_parser::{decode, route, ResponseStatus, Route, Shape};

// ============================================================================
// Strategies
// ============================================================================

fn aid_strategy() -> impl Strategy<Value = String> {
    (1u8..20, 1u8..20, 1u8..99).prop_map(|(shelf, slot, port)| format!("FAC-{shelf}-{slot}-{port}"))
}

fn distinct_aids(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(aid_strategy(), 1..max).prop_map(|set| set.into_iter().collect())
}

fn state_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["IS-NR", "OOS-AU", "OOS-MA", "OOS-AUMA"]).prop_map(str::to_string)
}

fn blank_lines() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!["", "   ", "\t"]), 0..4)
        .prop_map(|lines| lines.iter().map(|l| format!("{l}\n")).collect())
}

fn std_frame(tag: &str, aids: &[String], state: &str) -> String {
    let mut raw = format!("\n   \"NE-1\" 24-03-05 10:00:00\nM  {tag} COMPLD\n");
    for aid in aids {
        raw.push_str(&format!("   \"{aid}::RATE=10GE,FEC=ON:{state}\"\n"));
    }
    raw.push_str(&format!("   /* RTRV-FAC::ALL [{tag}] (1) */\n;\n"));
    raw
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Decoding the same text twice yields equal messages
    #[test]
    fn prop_decode_is_idempotent(aids in distinct_aids(20), state in state_strategy()) {
        let raw = std_frame("42", &aids, &state);
        prop_assert_eq!(decode(&raw).unwrap(), decode(&raw).unwrap());
    }

    /// N distinct AID lines give N body entries in wire order
    #[test]
    fn prop_std_body_counts_distinct_aids(aids in distinct_aids(40)) {
        let raw = std_frame("7", &aids, "IS-NR");
        let message = decode(&raw).unwrap();
        prop_assert_eq!(message.response_size(), aids.len());
        prop_assert_eq!(message.aids(), aids.iter().map(String::as_str).collect::<Vec<_>>());
    }

    /// RTRV-CRS responses route to the CRS shape whatever the surrounding blank lines
    #[test]
    fn prop_crs_routing_ignores_whitespace(
        before in blank_lines(),
        between in blank_lines(),
        indent in "[ ]{0,6}",
    ) {
        let raw = format!(
            concat!(
                "{before}{indent}NE-1 24-03-05 10:00:00\n",
                "M  9 COMPLD\n",
                "{between}{indent}\"A,B:2WAY:CCT=ACT:IS-NR\"\n",
                "{indent}/* RTRV-CRS-VC4::ALL [9] (1) */\n",
                ";\n",
            ),
            before = before,
            between = between,
            indent = indent,
        );
        prop_assert_eq!(
            route(&raw).unwrap(),
            Route::Response { shape: Shape::RtrvCrs, fallback: false }
        );
        let decoded = decode(&raw).unwrap();
        prop_assert_eq!(decoded.aids(), vec!["A,B"]);
    }

    /// The first four-character line of a DENY body is the error code
    #[test]
    fn prop_deny_extracts_code(
        code in "[A-Z]{4}",
        first in "[a-z ]{5,20}",
        last in "[a-z ]{5,20}",
    ) {
        let raw = format!(
            "   NE-1 24-03-05 10:00:00\nM  3 DENY\n   \"{first}\"\n   {code}\n   /* {last} */\n;\n"
        );
        let message = decode(&raw).unwrap();
        prop_assert_eq!(message.status(), Some(ResponseStatus::Deny));
        let frame = message.error_frame().unwrap();
        prop_assert_eq!(&frame.code, &code);
        prop_assert_eq!(frame.free_lines.len(), 2);
        prop_assert!(frame.free_lines[1].contains(last.trim()));
    }

    /// Empty-AID profile rows are numbered 1..=n in row order
    #[test]
    fn prop_pseudo_aids_are_sequential(count in 1usize..30) {
        let mut raw = String::from("   NE-1 24-03-05 10:00:00\nM  5 COMPLD\n");
        for index in 0..count {
            raw.push_str(&format!("   \"::LOS=MJ,IDX={index}:\"\n"));
        }
        raw.push_str("   /* RTRV-ASAP-PROF::ALL [5] */\n;\n");

        let message = decode(&raw).unwrap();
        let expected: Vec<String> = (1..=count).map(|n| n.to_string()).collect();
        prop_assert_eq!(message.aids(), expected.iter().map(String::as_str).collect::<Vec<_>>());
    }
}
