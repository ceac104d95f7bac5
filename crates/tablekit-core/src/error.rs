use derive_more::Display;
use thiserror::Error as ThisError;

///
/// Error
///
/// Error with a stable kind + origin taxonomy.
/// Messages never carry plaintext of encrypted attributes or key material.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{origin}:{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Construct a read-miss error.
    pub fn item_not_found(table: &str) -> Self {
        Self::new(
            ErrorKind::ItemNotFound,
            ErrorOrigin::Engine,
            format!("no item found in table '{table}'"),
        )
    }

    /// Construct a conditional-write failure.
    pub fn condition_failed(table: &str) -> Self {
        Self::new(
            ErrorKind::ConditionFailed,
            ErrorOrigin::Transport,
            format!("conditional write on table '{table}' was rejected"),
        )
    }

    pub fn invalid_model(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidModel, origin, message)
    }

    pub fn missing_primary_key(model: &str, attribute: &str) -> Self {
        Self::new(
            ErrorKind::MissingPrimaryKey,
            ErrorOrigin::Marshal,
            format!("model '{model}' is missing key attribute '{attribute}'"),
        )
    }

    pub fn invalid_operator(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::InvalidOperator,
            ErrorOrigin::Expression,
            message,
        )
    }

    pub fn unknown_attribute(model: &str, attribute: &str) -> Self {
        Self::new(
            ErrorKind::UnknownAttribute,
            ErrorOrigin::Expression,
            format!("model '{model}' has no attribute '{attribute}'"),
        )
    }

    pub fn encrypted_not_queryable(attribute: &str) -> Self {
        Self::new(
            ErrorKind::EncryptedFieldNotQueryable,
            ErrorOrigin::Expression,
            format!("encrypted attribute '{attribute}' cannot be used in a condition"),
        )
    }

    pub fn encryption_not_configured(model: &str) -> Self {
        Self::new(
            ErrorKind::EncryptionNotConfigured,
            ErrorOrigin::Crypto,
            format!("model '{model}' has encrypted attributes but no key provider is bound"),
        )
    }

    pub fn invalid_envelope(attribute: &str, reason: &str) -> Self {
        Self::new(
            ErrorKind::InvalidEncryptedEnvelope,
            ErrorOrigin::Crypto,
            format!("invalid encrypted envelope for '{attribute}': {reason}"),
        )
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, ErrorOrigin::Crypto, message)
    }

    pub fn key_provider(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::KeyProvider, ErrorOrigin::Crypto, message)
    }

    pub fn scan_required(model: &str) -> Self {
        Self::new(
            ErrorKind::ScanRequired,
            ErrorOrigin::Index,
            format!("no key path serves this query on '{model}'; opt into a scan explicitly"),
        )
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, ErrorOrigin::Transport, message)
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::ItemNotFound)
    }

    #[must_use]
    pub const fn is_condition_failed(&self) -> bool {
        matches!(self.kind, ErrorKind::ConditionFailed)
    }
}

///
/// ErrorKind
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum ErrorKind {
    /// The caller cancelled a key-management call, or its deadline passed.
    #[display("cancelled")]
    Cancelled,

    /// A conditional write's precondition did not hold at the store.
    #[display("condition_failed")]
    ConditionFailed,

    /// Configuration could not be loaded or validated.
    #[display("config")]
    Config,

    /// A condition references an encrypted attribute.
    #[display("encrypted_field_not_queryable")]
    EncryptedFieldNotQueryable,

    /// The schema requires encryption but no key provider was bound.
    #[display("encryption_not_configured")]
    EncryptionNotConfigured,

    /// Envelope shape, version, or authentication mismatch on decrypt.
    #[display("invalid_encrypted_envelope")]
    InvalidEncryptedEnvelope,

    /// Schema invariant violated, or a value incompatible with its kind.
    #[display("invalid_model")]
    InvalidModel,

    /// Unsupported operator or malformed document path.
    #[display("invalid_operator")]
    InvalidOperator,

    /// A read found no matching record.
    #[display("item_not_found")]
    ItemNotFound,

    /// The key-management collaborator failed.
    #[display("key_provider")]
    KeyProvider,

    /// A key attribute could not be resolved.
    #[display("missing_primary_key")]
    MissingPrimaryKey,

    /// No key path serves the query and no scan was requested.
    #[display("scan_required")]
    ScanRequired,

    /// The transport collaborator failed.
    #[display("transport")]
    Transport,

    /// A reference to an attribute absent from the schema.
    #[display("unknown_attribute")]
    UnknownAttribute,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum ErrorOrigin {
    #[display("config")]
    Config,
    #[display("crypto")]
    Crypto,
    #[display("cursor")]
    Cursor,
    #[display("engine")]
    Engine,
    #[display("expression")]
    Expression,
    #[display("index")]
    Index,
    #[display("marshal")]
    Marshal,
    #[display("schema")]
    Schema,
    #[display("transport")]
    Transport,
}
