use crate::{
    model::Shape,
    value::{Number, Record, Value, WireKind},
};
use std::{collections::BTreeMap, sync::Arc};
use time::OffsetDateTime;

///
/// AttributeKind
///
/// Declared storage kind of an attribute. `Timestamp` is stored as an
/// RFC 3339 string.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum AttributeKind {
    Binary,
    BinarySet,
    Boolean,
    Document,
    List,
    Null,
    Number,
    NumberSet,
    String,
    StringSet,
    Timestamp,
}

impl AttributeKind {
    /// Kinds a table or index key may use.
    #[must_use]
    pub const fn is_key_capable(self) -> bool {
        matches!(self, Self::String | Self::Number | Self::Binary)
    }

    #[must_use]
    pub const fn wire_kind(self) -> WireKind {
        match self {
            Self::Binary => WireKind::Binary,
            Self::BinarySet => WireKind::BinarySet,
            Self::Boolean => WireKind::Bool,
            Self::Document => WireKind::Document,
            Self::List => WireKind::List,
            Self::Null => WireKind::Null,
            Self::Number => WireKind::Number,
            Self::NumberSet => WireKind::NumberSet,
            Self::String | Self::Timestamp => WireKind::String,
            Self::StringSet => WireKind::StringSet,
        }
    }

    #[must_use]
    pub const fn is_set(self) -> bool {
        matches!(self, Self::StringSet | Self::NumberSet | Self::BinarySet)
    }
}

///
/// AttributeRole
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AttributeRole {
    PartitionKey,
    SortKey,
    /// Optimistic-locking counter, incremented on every put.
    Version,
    /// Expiry time in epoch seconds.
    Ttl,
}

impl AttributeRole {
    #[must_use]
    pub const fn is_key(self) -> bool {
        matches!(self, Self::PartitionKey | Self::SortKey)
    }
}

///
/// AttributeFlags
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct AttributeFlags {
    pub required: bool,
    pub omit_if_empty: bool,
    pub json: bool,
    pub binary: bool,
    pub encrypted: bool,
}

///
/// AttributeSpec
///

#[derive(Clone, Debug, PartialEq)]
pub struct AttributeSpec {
    pub(crate) name: String,
    pub(crate) stored: String,
    pub(crate) stored_explicit: bool,
    pub(crate) kind: AttributeKind,
    pub(crate) flags: AttributeFlags,
    pub(crate) role: Option<AttributeRole>,
    pub(crate) shape: Option<Arc<Shape>>,
}

impl AttributeSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        let name = name.into();

        Self {
            stored: name.clone(),
            name,
            stored_explicit: false,
            kind,
            flags: AttributeFlags::default(),
            role: None,
            shape: None,
        }
    }

    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::String)
    }

    #[must_use]
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Number)
    }

    #[must_use]
    pub fn binary(name: impl Into<String>) -> Self {
        let mut spec = Self::new(name, AttributeKind::Binary);
        spec.flags.binary = true;
        spec
    }

    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Boolean)
    }

    #[must_use]
    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Timestamp)
    }

    #[must_use]
    pub fn list(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::List)
    }

    #[must_use]
    pub fn document(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Document)
    }

    /// A string attribute holding a JSON-encoded native value.
    #[must_use]
    pub fn json(name: impl Into<String>) -> Self {
        let mut spec = Self::new(name, AttributeKind::String);
        spec.flags.json = true;
        spec
    }

    ///
    /// BUILDER
    ///

    #[must_use]
    pub const fn partition_key(mut self) -> Self {
        self.role = Some(AttributeRole::PartitionKey);
        self
    }

    #[must_use]
    pub const fn sort_key(mut self) -> Self {
        self.role = Some(AttributeRole::SortKey);
        self
    }

    #[must_use]
    pub const fn version(mut self) -> Self {
        self.role = Some(AttributeRole::Version);
        self
    }

    #[must_use]
    pub const fn ttl(mut self) -> Self {
        self.role = Some(AttributeRole::Ttl);
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.flags.required = true;
        self
    }

    #[must_use]
    pub const fn omit_if_empty(mut self) -> Self {
        self.flags.omit_if_empty = true;
        self
    }

    #[must_use]
    pub const fn encrypted(mut self) -> Self {
        self.flags.encrypted = true;
        self
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: AttributeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Pin the stored attribute name, bypassing the naming convention.
    #[must_use]
    pub fn stored_as(mut self, stored: impl Into<String>) -> Self {
        self.stored = stored.into();
        self.stored_explicit = true;
        self
    }

    /// Declare the nested record shape of a document attribute.
    #[must_use]
    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = Some(Arc::new(shape));
        self
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn stored_name(&self) -> &str {
        &self.stored
    }

    #[must_use]
    pub const fn kind(&self) -> AttributeKind {
        self.kind
    }

    #[must_use]
    pub const fn flags(&self) -> AttributeFlags {
        self.flags
    }

    #[must_use]
    pub const fn role(&self) -> Option<AttributeRole> {
        self.role
    }

    #[must_use]
    pub fn nested_shape(&self) -> Option<&Shape> {
        self.shape.as_deref()
    }

    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.flags.encrypted
    }

    #[must_use]
    pub fn is_key(&self) -> bool {
        self.role.is_some_and(AttributeRole::is_key)
    }

    /// Native value an absent attribute reads back as.
    #[must_use]
    pub fn zero_value(&self) -> Value {
        if self.flags.json {
            return Value::Json(serde_json::Value::Null);
        }

        match self.kind {
            AttributeKind::Binary => Value::Blob(Vec::new()),
            AttributeKind::BinarySet => Value::BlobSet(Vec::new()),
            AttributeKind::Boolean => Value::Bool(false),
            AttributeKind::Document => match &self.shape {
                Some(shape) => Value::Record(shape.zero_record()),
                None => Value::Map(BTreeMap::new()),
            },
            AttributeKind::List => Value::List(Vec::new()),
            AttributeKind::Null => Value::Null,
            AttributeKind::Number => Value::Number(Number::zero()),
            AttributeKind::NumberSet => Value::NumberSet(Vec::new()),
            AttributeKind::String => Value::Text(String::new()),
            AttributeKind::StringSet => Value::TextSet(Vec::new()),
            AttributeKind::Timestamp => Value::Timestamp(OffsetDateTime::UNIX_EPOCH),
        }
    }
}

impl Shape {
    /// A record with every attribute at its zero value.
    #[must_use]
    pub fn zero_record(&self) -> Record {
        self.attributes()
            .iter()
            .map(|attr| (attr.name().to_string(), attr.zero_value()))
            .collect()
    }
}
