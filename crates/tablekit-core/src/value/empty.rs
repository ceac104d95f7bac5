use crate::value::Value;
use time::OffsetDateTime;

///
/// SemanticKind
///
/// Closed set of kinds the emptiness rule dispatches on.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SemanticKind {
    Bool,
    Composite,
    Container,
    Json,
    Null,
    Number,
    Temporal,
    Text,
}

impl Value {
    #[must_use]
    pub const fn semantic_kind(&self) -> SemanticKind {
        match self {
            Self::Null => SemanticKind::Null,
            Self::Bool(_) => SemanticKind::Bool,
            Self::Number(_) => SemanticKind::Number,
            Self::Text(_) => SemanticKind::Text,
            Self::Timestamp(_) => SemanticKind::Temporal,
            Self::Record(_) => SemanticKind::Composite,
            Self::Json(_) => SemanticKind::Json,
            Self::Blob(_)
            | Self::List(_)
            | Self::Map(_)
            | Self::TextSet(_)
            | Self::NumberSet(_)
            | Self::BlobSet(_) => SemanticKind::Container,
        }
    }

    /// Emptiness used by omit-if-empty.
    ///
    /// Zero-length strings and containers, zero numbers, `false`, the epoch
    /// timestamp, JSON null, and records whose fields are all empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self.semantic_kind() {
            SemanticKind::Null => true,
            SemanticKind::Bool => matches!(self, Self::Bool(false)),
            SemanticKind::Number => matches!(self, Self::Number(n) if n.is_zero()),
            SemanticKind::Text => matches!(self, Self::Text(s) if s.is_empty()),
            SemanticKind::Temporal => {
                matches!(self, Self::Timestamp(t) if *t == OffsetDateTime::UNIX_EPOCH)
            }
            SemanticKind::Composite => match self {
                Self::Record(record) => record.values().all(Self::is_empty),
                _ => false,
            },
            SemanticKind::Json => matches!(self, Self::Json(serde_json::Value::Null)),
            SemanticKind::Container => match self {
                Self::Blob(v) => v.is_empty(),
                Self::List(v) => v.is_empty(),
                Self::Map(v) => v.is_empty(),
                Self::TextSet(v) => v.is_empty(),
                Self::NumberSet(v) => v.is_empty(),
                Self::BlobSet(v) => v.is_empty(),
                _ => false,
            },
        }
    }
}
