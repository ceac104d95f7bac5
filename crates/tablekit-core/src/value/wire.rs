use crate::value::Number;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

///
/// WireValue
///
/// Tagged union mirroring the store's attribute-value kinds.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WireValue {
    Binary(Vec<u8>),
    BinarySet(Vec<Vec<u8>>),
    Bool(bool),
    Document(BTreeMap<String, Self>),
    List(Vec<Self>),
    Null,
    Number(Number),
    NumberSet(Vec<Number>),
    String(String),
    StringSet(Vec<String>),
}

impl WireValue {
    #[must_use]
    pub const fn kind(&self) -> WireKind {
        match self {
            Self::Binary(_) => WireKind::Binary,
            Self::BinarySet(_) => WireKind::BinarySet,
            Self::Bool(_) => WireKind::Bool,
            Self::Document(_) => WireKind::Document,
            Self::List(_) => WireKind::List,
            Self::Null => WireKind::Null,
            Self::Number(_) => WireKind::Number,
            Self::NumberSet(_) => WireKind::NumberSet,
            Self::String(_) => WireKind::String,
            Self::StringSet(_) => WireKind::StringSet,
        }
    }

    #[must_use]
    pub fn as_document(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Document(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    #[must_use]
    pub fn number(value: impl Into<Number>) -> Self {
        Self::Number(value.into())
    }
}

///
/// WireKind
///
/// Type tag of a wire value; the `attribute_type` condition operand.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum WireKind {
    Binary,
    BinarySet,
    Bool,
    Document,
    List,
    Null,
    Number,
    NumberSet,
    String,
    StringSet,
}

impl WireKind {
    pub const ALL: [Self; 10] = [
        Self::Binary,
        Self::BinarySet,
        Self::Bool,
        Self::Document,
        Self::List,
        Self::Null,
        Self::Number,
        Self::NumberSet,
        Self::String,
        Self::StringSet,
    ];

    #[must_use]
    pub fn from_descriptor(descriptor: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.descriptor() == descriptor)
    }

    /// The store's type descriptor for this kind.
    #[must_use]
    pub const fn descriptor(self) -> &'static str {
        match self {
            Self::Binary => "B",
            Self::BinarySet => "BS",
            Self::Bool => "BOOL",
            Self::Document => "M",
            Self::List => "L",
            Self::Null => "NULL",
            Self::Number => "N",
            Self::NumberSet => "NS",
            Self::String => "S",
            Self::StringSet => "SS",
        }
    }
}

///
/// WireRepr
/// Serde shape of a wire value: `{"S": "..."}`, `{"N": "1"}`, binary as
/// standard base64. Decoding re-checks number and binary payloads.
///

#[derive(Deserialize, Serialize)]
enum WireRepr {
    #[serde(rename = "B")]
    Binary(String),
    #[serde(rename = "BS")]
    BinarySet(Vec<String>),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "M")]
    Document(BTreeMap<String, Self>),
    #[serde(rename = "L")]
    List(Vec<Self>),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "N")]
    Number(Number),
    #[serde(rename = "NS")]
    NumberSet(Vec<Number>),
    #[serde(rename = "S")]
    String(String),
    #[serde(rename = "SS")]
    StringSet(Vec<String>),
}

impl WireRepr {
    fn from_value(value: &WireValue) -> Self {
        match value {
            WireValue::Binary(v) => Self::Binary(STANDARD.encode(v)),
            WireValue::BinarySet(v) => {
                Self::BinarySet(v.iter().map(|b| STANDARD.encode(b)).collect())
            }
            WireValue::Bool(v) => Self::Bool(*v),
            WireValue::Document(map) => Self::Document(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_value(v)))
                    .collect(),
            ),
            WireValue::List(items) => Self::List(items.iter().map(Self::from_value).collect()),
            WireValue::Null => Self::Null(true),
            WireValue::Number(n) => Self::Number(n.clone()),
            WireValue::NumberSet(v) => Self::NumberSet(v.clone()),
            WireValue::String(s) => Self::String(s.clone()),
            WireValue::StringSet(v) => Self::StringSet(v.clone()),
        }
    }

    // Decode recursively while re-checking binary payloads.
    fn into_value(self) -> Result<WireValue, base64::DecodeError> {
        Ok(match self {
            Self::Binary(v) => WireValue::Binary(STANDARD.decode(v)?),
            Self::BinarySet(v) => WireValue::BinarySet(
                v.into_iter()
                    .map(|b| STANDARD.decode(b))
                    .collect::<Result<_, _>>()?,
            ),
            Self::Bool(v) => WireValue::Bool(v),
            Self::Document(map) => WireValue::Document(
                map.into_iter()
                    .map(|(k, v)| Ok((k, v.into_value()?)))
                    .collect::<Result<_, base64::DecodeError>>()?,
            ),
            Self::List(items) => WireValue::List(
                items
                    .into_iter()
                    .map(Self::into_value)
                    .collect::<Result<_, _>>()?,
            ),
            Self::Null(_) => WireValue::Null,
            Self::Number(n) => WireValue::Number(n),
            Self::NumberSet(v) => WireValue::NumberSet(v),
            Self::String(s) => WireValue::String(s),
            Self::StringSet(v) => WireValue::StringSet(v),
        })
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireRepr::from_value(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = WireRepr::deserialize(deserializer)?;
        repr.into_value().map_err(serde::de::Error::custom)
    }
}
