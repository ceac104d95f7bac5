use crate::{
    error::{Error, ErrorOrigin},
    model::{AttributeKind, AttributeSpec},
    value::{Item, Record, Value, WireValue},
};
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;

/// Encode a native value under its attribute's declared kind.
pub fn encode_value(attr: &AttributeSpec, value: &Value) -> Result<WireValue, Error> {
    let mismatch = || {
        Error::invalid_model(
            ErrorOrigin::Marshal,
            format!(
                "attribute '{}' of kind {:?} cannot hold a {} value",
                attr.name(),
                attr.kind(),
                value.label()
            ),
        )
    };

    if attr.flags().json {
        return encode_json(attr, value);
    }

    let wire = match (attr.kind(), value) {
        (AttributeKind::String, Value::Text(s)) => WireValue::String(s.clone()),
        (AttributeKind::Number, Value::Number(n)) => WireValue::Number(n.clone()),
        (AttributeKind::Binary, Value::Blob(b)) => WireValue::Binary(b.clone()),
        (AttributeKind::Boolean, Value::Bool(b)) => WireValue::Bool(*b),
        (AttributeKind::Null, Value::Null) => WireValue::Null,
        (AttributeKind::Timestamp, Value::Timestamp(t)) => WireValue::String(
            t.format(&Rfc3339)
                .map_err(|err| Error::invalid_model(ErrorOrigin::Marshal, err.to_string()))?,
        ),
        (AttributeKind::List, Value::List(items)) => {
            WireValue::List(items.iter().map(infer_wire).collect::<Result<_, _>>()?)
        }
        (AttributeKind::Document, Value::Record(record)) => match attr.nested_shape() {
            Some(shape) => WireValue::Document(encode_fields(shape.attributes(), record)?),
            None => WireValue::Document(infer_document(record.iter())?),
        },
        (AttributeKind::Document, Value::Map(map)) => match attr.nested_shape() {
            Some(shape) => {
                let record = Record::from(map.clone());
                WireValue::Document(encode_fields(shape.attributes(), &record)?)
            }
            None => infer_wire(value)?,
        },
        (AttributeKind::StringSet, Value::TextSet(set)) => empty_set_as_null(set, || {
            WireValue::StringSet(set.clone())
        }),
        (AttributeKind::NumberSet, Value::NumberSet(set)) => empty_set_as_null(set, || {
            WireValue::NumberSet(set.clone())
        }),
        (AttributeKind::BinarySet, Value::BlobSet(set)) => empty_set_as_null(set, || {
            WireValue::BinarySet(set.clone())
        }),
        _ => return Err(mismatch()),
    };

    Ok(wire)
}

// The store has no empty set; an empty set is stored as null.
fn empty_set_as_null<T>(set: &[T], wire: impl FnOnce() -> WireValue) -> WireValue {
    if set.is_empty() { WireValue::Null } else { wire() }
}

fn encode_json(attr: &AttributeSpec, value: &Value) -> Result<WireValue, Error> {
    let json = match value {
        Value::Json(json) => json,
        other => {
            return Err(Error::invalid_model(
                ErrorOrigin::Marshal,
                format!(
                    "json attribute '{}' cannot hold a {} value",
                    attr.name(),
                    other.label()
                ),
            ));
        }
    };

    serde_json::to_string(json)
        .map(WireValue::String)
        .map_err(|err| Error::invalid_model(ErrorOrigin::Marshal, err.to_string()))
}

/// Encode a value with no declared kind, by shape alone.
///
/// Only values that read back unchanged through `infer_value` are
/// accepted; timestamps, json and nested records need a declared
/// attribute or shape.
pub fn infer_wire(value: &Value) -> Result<WireValue, Error> {
    Ok(match value {
        Value::Blob(b) => WireValue::Binary(b.clone()),
        Value::BlobSet(set) => empty_set_as_null(set, || WireValue::BinarySet(set.clone())),
        Value::Bool(b) => WireValue::Bool(*b),
        Value::Json(_) | Value::Record(_) | Value::Timestamp(_) => {
            return Err(Error::invalid_model(
                ErrorOrigin::Marshal,
                format!(
                    "a {} value cannot be stored without a declared kind",
                    value.label()
                ),
            ));
        }
        Value::List(items) => {
            WireValue::List(items.iter().map(infer_wire).collect::<Result<_, _>>()?)
        }
        Value::Map(map) => WireValue::Document(infer_document(map.iter())?),
        Value::Null => WireValue::Null,
        Value::Number(n) => WireValue::Number(n.clone()),
        Value::NumberSet(set) => empty_set_as_null(set, || WireValue::NumberSet(set.clone())),
        Value::Text(s) => WireValue::String(s.clone()),
        Value::TextSet(set) => empty_set_as_null(set, || WireValue::StringSet(set.clone())),
    })
}

fn infer_document<'a>(
    entries: impl Iterator<Item = (&'a String, &'a Value)>,
) -> Result<BTreeMap<String, WireValue>, Error> {
    entries
        .map(|(k, v)| Ok((k.clone(), infer_wire(v)?)))
        .collect()
}

/// Encode plain (unencrypted, role-free) attributes of a nested shape.
pub(crate) fn encode_fields(attrs: &[AttributeSpec], record: &Record) -> Result<Item, Error> {
    let mut out = Item::new();

    for attr in attrs {
        let value = resolve_native(attr, record);
        if attr.flags().omit_if_empty && value.is_empty() {
            continue;
        }
        out.insert(attr.stored_name().to_string(), encode_value(attr, &value)?);
    }

    Ok(out)
}

/// The native value to write: absent and null both mean "zero".
pub(crate) fn resolve_native(attr: &AttributeSpec, record: &Record) -> Value {
    match record.get(attr.name()) {
        Some(Value::Null) | None => attr.zero_value(),
        Some(value) => value.clone(),
    }
}
