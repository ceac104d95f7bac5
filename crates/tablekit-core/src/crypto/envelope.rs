use crate::{
    ENVELOPE_VERSION,
    error::Error,
    value::{Number, WireValue},
};
use ring::aead::NONCE_LEN;
use std::collections::BTreeMap;

const FIELD_VERSION: &str = "v";
const FIELD_WRAPPED_KEY: &str = "edk";
const FIELD_NONCE: &str = "nonce";
const FIELD_CIPHERTEXT: &str = "ct";

///
/// EncryptedEnvelope
///
/// Stored form of one encrypted attribute:
/// `{ v: N, edk: B, nonce: B, ct: B }` where `ct` carries the tag.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncryptedEnvelope {
    pub version: u32,
    pub wrapped_key: Vec<u8>,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl EncryptedEnvelope {
    /// Structurally valid envelope carrying no real key or payload.
    #[must_use]
    pub fn stand_in() -> Self {
        Self {
            version: ENVELOPE_VERSION,
            wrapped_key: vec![0],
            nonce: vec![0; NONCE_LEN],
            ciphertext: vec![0],
        }
    }

    #[must_use]
    pub fn to_wire(&self) -> WireValue {
        let mut doc = BTreeMap::new();
        doc.insert(
            FIELD_VERSION.to_string(),
            WireValue::Number(Number::from(self.version)),
        );
        doc.insert(
            FIELD_WRAPPED_KEY.to_string(),
            WireValue::Binary(self.wrapped_key.clone()),
        );
        doc.insert(FIELD_NONCE.to_string(), WireValue::Binary(self.nonce.clone()));
        doc.insert(
            FIELD_CIPHERTEXT.to_string(),
            WireValue::Binary(self.ciphertext.clone()),
        );

        WireValue::Document(doc)
    }

    /// Parse a stored envelope. Anything other than exactly the four
    /// fields at the current version is rejected.
    pub fn from_wire(attribute: &str, value: &WireValue) -> Result<Self, Error> {
        let Some(doc) = value.as_document() else {
            return Err(Error::invalid_envelope(attribute, "not a document"));
        };
        if doc.len() != 4 {
            return Err(Error::invalid_envelope(attribute, "unexpected field set"));
        }

        let version = match doc.get(FIELD_VERSION) {
            Some(WireValue::Number(n)) => n
                .as_i64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| Error::invalid_envelope(attribute, "malformed version"))?,
            _ => return Err(Error::invalid_envelope(attribute, "missing version")),
        };
        if version != ENVELOPE_VERSION {
            return Err(Error::invalid_envelope(
                attribute,
                &format!("unsupported version {version}"),
            ));
        }

        let wrapped_key = binary_field(attribute, doc, FIELD_WRAPPED_KEY)?;
        let nonce = binary_field(attribute, doc, FIELD_NONCE)?;
        let ciphertext = binary_field(attribute, doc, FIELD_CIPHERTEXT)?;

        if nonce.len() != NONCE_LEN {
            return Err(Error::invalid_envelope(attribute, "bad nonce length"));
        }

        Ok(Self {
            version,
            wrapped_key,
            nonce,
            ciphertext,
        })
    }
}

fn binary_field(
    attribute: &str,
    doc: &BTreeMap<String, WireValue>,
    field: &str,
) -> Result<Vec<u8>, Error> {
    match doc.get(field) {
        Some(WireValue::Binary(bytes)) if !bytes.is_empty() => Ok(bytes.clone()),
        _ => Err(Error::invalid_envelope(
            attribute,
            &format!("missing or empty '{field}'"),
        )),
    }
}
