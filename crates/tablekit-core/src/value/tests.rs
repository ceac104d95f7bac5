use super::*;
use proptest::prelude::*;
use time::macros::datetime;

#[test]
fn number_accepts_decimal_literals() {
    for text in ["0", "-1", "3.14", "1e10", "2.5E-3", "-0.0", "  42 "] {
        assert!(Number::parse(text).is_ok(), "{text} should parse");
    }
    assert_eq!(Number::parse(" 42 ").unwrap().as_str(), "42");
}

#[test]
fn number_rejects_garbage() {
    for text in ["", "abc", "1.", ".5", "--1", "1e", "1e+", "0x10", "1 2", "NaN"] {
        assert!(Number::parse(text).is_err(), "{text} should be rejected");
    }
    assert!(Number::from_f64(f64::INFINITY).is_err());
}

#[test]
fn number_zero_detection() {
    assert!(Number::parse("0").unwrap().is_zero());
    assert!(Number::parse("-0.000").unwrap().is_zero());
    assert!(Number::parse("0e5").unwrap().is_zero());
    assert!(!Number::parse("0.001").unwrap().is_zero());
    assert!(!Number::from(7).is_zero());
}

#[test]
fn emptiness_dispatches_on_semantic_kind() {
    assert!(Value::Null.is_empty());
    assert!(Value::from("").is_empty());
    assert!(!Value::from("x").is_empty());
    assert!(Value::from(0).is_empty());
    assert!(!Value::from(5).is_empty());
    assert!(Value::Bool(false).is_empty());
    assert!(!Value::Bool(true).is_empty());
    assert!(Value::List(vec![]).is_empty());
    assert!(Value::TextSet(vec![]).is_empty());
    assert!(Value::Blob(vec![]).is_empty());
    assert!(Value::Timestamp(time::OffsetDateTime::UNIX_EPOCH).is_empty());
    assert!(!Value::Timestamp(datetime!(2024-01-01 0:00 UTC)).is_empty());
    assert!(Value::Json(serde_json::Value::Null).is_empty());
    assert!(!Value::Json(serde_json::json!({})).is_empty());
}

#[test]
fn record_is_empty_when_all_fields_are_empty() {
    let empty = Record::new().with("A", "").with("B", 0);
    assert!(Value::Record(empty).is_empty());

    let nested = Record::new().with("Inner", Record::new().with("X", ""));
    assert!(Value::Record(nested).is_empty());

    let filled = Record::new().with("A", "").with("B", 1);
    assert!(!Value::Record(filled).is_empty());
}

#[test]
fn semantic_kinds_are_closed() {
    assert_eq!(Value::Map(Default::default()).semantic_kind(), SemanticKind::Container);
    assert_eq!(Value::Record(Record::new()).semantic_kind(), SemanticKind::Composite);
    assert_eq!(
        Value::Timestamp(time::OffsetDateTime::UNIX_EPOCH).semantic_kind(),
        SemanticKind::Temporal
    );
}

#[test]
fn wire_value_serde_shape() {
    let value = WireValue::Document(
        [
            ("name".to_string(), WireValue::string("x")),
            ("n".to_string(), WireValue::number(5)),
            ("raw".to_string(), WireValue::Binary(vec![1, 2, 3])),
            ("nil".to_string(), WireValue::Null),
        ]
        .into_iter()
        .collect(),
    );

    let json = serde_json::to_value(&value).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "M": {
                "n": { "N": "5" },
                "name": { "S": "x" },
                "nil": { "NULL": true },
                "raw": { "B": "AQID" },
            }
        })
    );

    let back: WireValue = serde_json::from_value(json).unwrap();
    assert_eq!(back, value);
}

#[test]
fn wire_value_rejects_bad_payloads() {
    assert!(serde_json::from_str::<WireValue>(r#"{"N":"abc"}"#).is_err());
    assert!(serde_json::from_str::<WireValue>(r#"{"B":"!!!"}"#).is_err());
    assert!(serde_json::from_str::<WireValue>(r#"{"X":"1"}"#).is_err());
}

#[test]
fn wire_kind_descriptors() {
    assert_eq!(WireValue::string("a").kind().descriptor(), "S");
    assert_eq!(WireValue::StringSet(vec![]).kind().descriptor(), "SS");
    assert_eq!(WireValue::Null.kind().descriptor(), "NULL");
}

proptest! {
    #[test]
    fn integer_numbers_round_trip(n in any::<i64>()) {
        let number = Number::from(n);
        prop_assert_eq!(number.as_i64(), Some(n));
        prop_assert_eq!(Number::parse(number.as_str()).unwrap(), number);
    }

    #[test]
    fn finite_floats_parse_back(f in any::<f64>().prop_filter("finite", |f| f.is_finite())) {
        let number = Number::from_f64(f).unwrap();
        prop_assert_eq!(number.as_f64(), Some(f));
    }
}
