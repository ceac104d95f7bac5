mod empty;
mod number;
mod wire;

#[cfg(test)]
mod tests;

pub use empty::SemanticKind;
pub use number::{Number, NumberError};
pub use wire::{WireKind, WireValue};

use derive_more::{Deref, DerefMut};
use std::collections::BTreeMap;
use time::OffsetDateTime;

///
/// Item
///
/// One stored record as the transport sees it: stored attribute name to
/// wire value.
///

pub type Item = BTreeMap<String, WireValue>;

///
/// Value
///
/// Native value the caller reads and writes. Each attribute kind accepts a
/// fixed set of variants; the marshal engine enforces the pairing.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    Blob(Vec<u8>),
    BlobSet(Vec<Vec<u8>>),
    Bool(bool),
    Json(serde_json::Value),
    List(Vec<Self>),
    Map(BTreeMap<String, Self>),
    Null,
    Number(Number),
    NumberSet(Vec<Number>),
    Record(Record),
    Text(String),
    TextSet(Vec<String>),
    Timestamp(OffsetDateTime),
}

impl Value {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<&Number> {
        match self {
            Self::Number(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Short variant label used in error messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Blob(_) => "blob",
            Self::BlobSet(_) => "blob set",
            Self::Bool(_) => "bool",
            Self::Json(_) => "json",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Null => "null",
            Self::Number(_) => "number",
            Self::NumberSet(_) => "number set",
            Self::Record(_) => "record",
            Self::Text(_) => "text",
            Self::TextSet(_) => "text set",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Self::Number(value)
    }
}

macro_rules! impl_value_from_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_value_from_int!(i32, i64, u32, u64, usize);

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(value: OffsetDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::Record(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<Vec<Self>> for Value {
    fn from(value: Vec<Self>) -> Self {
        Self::List(value)
    }
}

///
/// Record
///
/// Native record keyed by logical attribute name.
///

#[derive(Clone, Debug, Default, Deref, DerefMut, Eq, PartialEq)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Self(value)
    }
}
