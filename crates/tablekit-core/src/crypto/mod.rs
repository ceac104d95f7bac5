//! Attribute-level envelope encryption.

mod cipher;
mod context;
mod envelope;
mod provider;


pub use cipher::{EncryptionContext, EnvelopeCipher};
pub use context::{CallContext, CancelToken};
pub use envelope::EncryptedEnvelope;
pub use provider::{DATA_KEY_LEN, DataKey, KeyProvider, LocalKeyProvider};
