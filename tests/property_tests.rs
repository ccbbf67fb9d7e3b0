// this_file: tests/property_tests.rs

use proptest::prelude::*;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use serde_json::Value;
use turbomin::{minify, minify_with_mode, validate, ProcessingMode};

/// Generates arbitrary JSON values via `serde_json`, which doubles as the
/// independent oracle for "does minified output parse back to the same
/// value as the input".
fn arb_json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 _]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-zA-Z_][a-zA-Z0-9_]{0,8}", inner), 0..6)
                .prop_map(|pairs| Value::Object(pairs.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn minify_preserves_semantic_value(value in arb_json_value()) {
        let input = serde_json::to_string(&value).unwrap();
        let output = minify(input.as_bytes()).unwrap();
        let reparsed: Value = serde_json::from_slice(&output).unwrap();
        prop_assert_eq!(reparsed, value);
    }

    #[test]
    fn minify_never_expands(value in arb_json_value()) {
        let input = serde_json::to_string(&value).unwrap();
        let output = minify(input.as_bytes()).unwrap();
        prop_assert!(output.len() <= input.len());
    }

    #[test]
    fn minify_is_idempotent(value in arb_json_value()) {
        let input = serde_json::to_string(&value).unwrap();
        let once = minify(input.as_bytes()).unwrap();
        let twice = minify(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn modes_agree_on_valid_json(value in arb_json_value()) {
        let input = serde_json::to_string(&value).unwrap();
        let eco = minify_with_mode(input.as_bytes(), Some(ProcessingMode::Eco)).unwrap();
        let sport = minify_with_mode(input.as_bytes(), Some(ProcessingMode::Sport)).unwrap();
        let turbo = minify_with_mode(input.as_bytes(), Some(ProcessingMode::Turbo)).unwrap();
        prop_assert_eq!(&eco, &sport);
        prop_assert_eq!(&sport, &turbo);
    }

    /// Inserting whitespace runs directly after every structural byte
    /// must never change the semantic value minification produces —
    /// this is the "chunking invariance" / "whitespace elision outside
    /// strings" property, exercised without needing to construct chunk
    /// boundaries by hand.
    #[test]
    fn extra_whitespace_outside_strings_never_changes_the_value(
        value in arb_json_value(),
        pad in "[ \t\n\r]{0,4}",
    ) {
        let compact = serde_json::to_string(&value).unwrap();
        let mut padded = String::new();
        for b in compact.bytes() {
            padded.push(b as char);
            if matches!(b, b'{' | b'}' | b'[' | b']' | b',' | b':') {
                padded.push_str(&pad);
            }
        }
        let output = minify(padded.as_bytes()).unwrap();
        let reparsed: Value = serde_json::from_slice(&output).unwrap();
        prop_assert_eq!(reparsed, value);
    }

    #[test]
    fn validate_is_deterministic(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let first = validate(&bytes);
        let second = validate(&bytes);
        prop_assert_eq!(first.is_ok(), second.is_ok());
        if let (Err(e1), Err(e2)) = (&first, &second) {
            prop_assert_eq!(e1, e2);
        }
    }

    #[test]
    fn turbo_chunk_size_does_not_affect_the_result(value in arb_json_value(), chunk_size in 1usize..64) {
        let input = serde_json::to_string(&value).unwrap();
        let mut config = turbomin::TurboConfig::default();
        config.chunk_size = Some(chunk_size);
        let output = turbomin::strategies::minify_turbo(input.as_bytes(), &config).unwrap();
        let reparsed: Value = serde_json::from_slice(&output).unwrap();
        prop_assert_eq!(reparsed, value);
    }
}

#[quickcheck]
fn minify_never_panics_on_random_bytes(bytes: Vec<u8>) -> bool {
    let _ = minify(&bytes);
    true
}

#[quickcheck]
fn estimate_matches_actual_length_for_valid_json(bytes: Vec<u8>) -> TestResult {
    if validate(&bytes).is_err() {
        return TestResult::discard();
    }
    let minified_len = minify(&bytes).unwrap().len();
    let estimate = turbomin::strategies::estimate_minified_size(&bytes);
    TestResult::from_bool(estimate == minified_len)
}

#[test]
fn known_documents_minify_to_the_expected_bytes() {
    let cases: &[(&str, &str)] = &[
        (r#"{}"#, r#"{}"#),
        (r#"  [ ]  "#, r#"[]"#),
        (r#"{ "a" : 1 , "b" : [ true , false , null ] }"#, r#"{"a":1,"b":[true,false,null]}"#),
        (r#"{"s": "has \"quotes\" and \\backslash\\"}"#, r#"{"s":"has \"quotes\" and \\backslash\\"}"#),
        ("-0.5e+10", "-0.5e+10"),
    ];
    for (input, expected) in cases {
        assert_eq!(minify(input.as_bytes()).unwrap(), expected.as_bytes());
    }
}

#[test]
fn rejects_common_malformations() {
    let cases: &[&str] = &[
        r#"{"a":}"#,
        r#"{"a" 1}"#,
        r#"[1,]"#,
        r#"{"a":1"#,
        r#""unterminated"#,
        "01",
        "1.",
        "1e",
        r#""bad\escape""#,
    ];
    for input in cases {
        assert!(minify(input.as_bytes()).is_err(), "expected {input:?} to be rejected");
    }
}
