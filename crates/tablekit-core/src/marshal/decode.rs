use crate::{
    error::{Error, ErrorOrigin},
    model::{AttributeKind, AttributeSpec, Shape},
    value::{Record, Value, WireValue},
};
use std::collections::BTreeMap;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Decode a wire value under its attribute's declared kind. A stored null
/// reads back as the attribute's zero value.
pub fn decode_value(attr: &AttributeSpec, wire: &WireValue) -> Result<Value, Error> {
    if matches!(wire, WireValue::Null) {
        return Ok(attr.zero_value());
    }

    let mismatch = || {
        Error::invalid_model(
            ErrorOrigin::Marshal,
            format!(
                "attribute '{}' of kind {:?} cannot decode a {} wire value",
                attr.name(),
                attr.kind(),
                wire.kind().descriptor()
            ),
        )
    };

    if attr.flags().json {
        let WireValue::String(text) = wire else {
            return Err(mismatch());
        };
        return serde_json::from_str(text).map(Value::Json).map_err(|err| {
            Error::invalid_model(
                ErrorOrigin::Marshal,
                format!("json attribute '{}' holds invalid json: {err}", attr.name()),
            )
        });
    }

    let value = match (attr.kind(), wire) {
        (AttributeKind::String, WireValue::String(s)) => Value::Text(s.clone()),
        (AttributeKind::Number, WireValue::Number(n)) => Value::Number(n.clone()),
        (AttributeKind::Binary, WireValue::Binary(b)) => Value::Blob(b.clone()),
        (AttributeKind::Boolean, WireValue::Bool(b)) => Value::Bool(*b),
        (AttributeKind::Timestamp, WireValue::String(s)) => {
            Value::Timestamp(OffsetDateTime::parse(s, &Rfc3339).map_err(|err| {
                Error::invalid_model(
                    ErrorOrigin::Marshal,
                    format!("timestamp attribute '{}': {err}", attr.name()),
                )
            })?)
        }
        (AttributeKind::List, WireValue::List(items)) => Value::List(items.iter().map(infer_value).collect()),
        (AttributeKind::Document, WireValue::Document(map)) => match attr.nested_shape() {
            Some(shape) => Value::Record(decode_fields(shape, map)?),
            None => infer_value(wire),
        },
        (AttributeKind::StringSet, WireValue::StringSet(set)) => Value::TextSet(set.clone()),
        (AttributeKind::NumberSet, WireValue::NumberSet(set)) => Value::NumberSet(set.clone()),
        (AttributeKind::BinarySet, WireValue::BinarySet(set)) => Value::BlobSet(set.clone()),
        _ => return Err(mismatch()),
    };

    Ok(value)
}

/// Decode a wire value with no declared kind.
#[must_use]
pub fn infer_value(wire: &WireValue) -> Value {
    match wire {
        WireValue::Binary(b) => Value::Blob(b.clone()),
        WireValue::BinarySet(set) => Value::BlobSet(set.clone()),
        WireValue::Bool(b) => Value::Bool(*b),
        WireValue::Document(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), infer_value(v)))
                .collect(),
        ),
        WireValue::List(items) => Value::List(items.iter().map(infer_value).collect()),
        WireValue::Null => Value::Null,
        WireValue::Number(n) => Value::Number(n.clone()),
        WireValue::NumberSet(set) => Value::NumberSet(set.clone()),
        WireValue::String(s) => Value::Text(s.clone()),
        WireValue::StringSet(set) => Value::TextSet(set.clone()),
    }
}

fn decode_fields(shape: &Shape, map: &BTreeMap<String, WireValue>) -> Result<Record, Error> {
    let mut record = Record::new();

    for attr in shape.attributes() {
        let value = match map.get(attr.stored_name()) {
            Some(wire) => decode_value(attr, wire)?,
            None => attr.zero_value(),
        };
        record.set(attr.name(), value);
    }

    Ok(record)
}
