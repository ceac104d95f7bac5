//! Native record <-> wire item conversion.

mod decode;
mod encode;


pub use decode::{decode_value, infer_value};
pub use encode::{encode_value, infer_wire};

use crate::{
    crypto::{CallContext, EncryptedEnvelope, EncryptionContext, EnvelopeCipher},
    error::{Error, ErrorKind, ErrorOrigin},
    model::{AttributeSpec, ModelSchema},
    value::{Item, Record, Value, WireValue},
};
use encode::resolve_native;
use std::sync::Arc;

///
/// Marshaller
///
/// Binds one schema to an optional envelope cipher. Construction fails
/// closed when the schema has encrypted attributes and no cipher is given,
/// so no per-request check is needed.
///

#[derive(Clone, Debug)]
pub struct Marshaller {
    schema: Arc<ModelSchema>,
    cipher: Option<EnvelopeCipher>,
}

impl Marshaller {
    pub fn new(schema: Arc<ModelSchema>, cipher: Option<EnvelopeCipher>) -> Result<Self, Error> {
        if schema.has_encrypted() && cipher.is_none() {
            return Err(Error::encryption_not_configured(schema.name()));
        }

        Ok(Self { schema, cipher })
    }

    #[must_use]
    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    /// Convert a native record into a wire item.
    pub async fn marshal(&self, record: &Record, cx: &CallContext) -> Result<Item, Error> {
        self.check_known_fields(record)?;

        let mut item = Item::new();

        for attr in self.schema.attributes() {
            let present = matches!(record.get(attr.name()), Some(v) if !matches!(v, Value::Null));

            if attr.is_key() && !present {
                return Err(Error::missing_primary_key(self.schema.name(), attr.name()));
            }
            if attr.flags().required && !present {
                return Err(Error::invalid_model(
                    ErrorOrigin::Marshal,
                    format!(
                        "required attribute '{}.{}' is absent",
                        self.schema.name(),
                        attr.name()
                    ),
                ));
            }

            let value = resolve_native(attr, record);
            if attr.flags().omit_if_empty && value.is_empty() {
                continue;
            }

            let wire = if attr.is_encrypted() {
                self.seal(attr, &value, cx).await?
            } else {
                encode_value(attr, &value)?
            };
            item.insert(attr.stored_name().to_string(), wire);
        }

        Ok(item)
    }

    /// Convert a wire item back into a native record. Absent attributes
    /// read back as zero values; absent keys are an error.
    pub async fn unmarshal(&self, item: &Item, cx: &CallContext) -> Result<Record, Error> {
        let mut record = Record::new();

        for attr in self.schema.attributes() {
            let Some(wire) = item.get(attr.stored_name()) else {
                if attr.is_key() {
                    return Err(Error::missing_primary_key(self.schema.name(), attr.name()));
                }
                record.set(attr.name(), attr.zero_value());
                continue;
            };

            let value = if attr.is_encrypted() {
                self.open(attr, wire, cx).await?
            } else {
                decode_value(attr, wire)?
            };
            record.set(attr.name(), value);
        }

        Ok(record)
    }

    /// Encode only the primary key attributes of `key`.
    pub fn marshal_key(&self, key: &Record) -> Result<Item, Error> {
        let mut item = Item::new();

        for attr in self.schema.key_attributes() {
            let value = match key.get(attr.name()) {
                Some(value) if !matches!(value, Value::Null) => value,
                _ => return Err(Error::missing_primary_key(self.schema.name(), attr.name())),
            };
            item.insert(attr.stored_name().to_string(), encode_value(attr, value)?);
        }

        Ok(item)
    }

    /// Extract the primary key from a full item.
    pub fn key_of(&self, item: &Item) -> Result<Item, Error> {
        self.schema
            .key_attributes()
            .map(|attr| {
                item.get(attr.stored_name())
                    .map(|wire| (attr.stored_name().to_string(), wire.clone()))
                    .ok_or_else(|| Error::missing_primary_key(self.schema.name(), attr.name()))
            })
            .collect()
    }

    /// Seal a native value for an encrypted attribute, for use as an
    /// update operand.
    pub async fn seal_value(
        &self,
        attribute: &str,
        value: &Value,
        cx: &CallContext,
    ) -> Result<WireValue, Error> {
        let attr = self.encrypted_attribute(attribute)?;

        self.seal(attr, value, cx).await
    }

    /// Check that `value` would seal for `attribute` and return a
    /// well-formed envelope that opens under no key. Makes no
    /// key-management call.
    pub fn stand_in_value(&self, attribute: &str, value: &Value) -> Result<WireValue, Error> {
        let attr = self.encrypted_attribute(attribute)?;
        self.cipher()?;
        encode_value(attr, value)?;

        Ok(EncryptedEnvelope::stand_in().to_wire())
    }

    fn encrypted_attribute(&self, attribute: &str) -> Result<&AttributeSpec, Error> {
        let attr = self
            .schema
            .attribute(attribute)
            .ok_or_else(|| Error::unknown_attribute(self.schema.name(), attribute))?;
        if !attr.is_encrypted() {
            return Err(Error::invalid_model(
                ErrorOrigin::Marshal,
                format!("attribute '{}' is not encrypted", attr.name()),
            ));
        }

        Ok(attr)
    }

    async fn seal(
        &self,
        attr: &AttributeSpec,
        value: &Value,
        cx: &CallContext,
    ) -> Result<WireValue, Error> {
        let cipher = self.cipher()?;

        let plain = encode_value(attr, value)?;
        let bytes = zeroize::Zeroizing::new(serde_json::to_vec(&plain).map_err(|err| {
            Error::invalid_model(ErrorOrigin::Marshal, err.to_string())
        })?);

        let envelope = cipher.seal(&bytes, self.context(attr), cx).await?;

        Ok(envelope.to_wire())
    }

    async fn open(
        &self,
        attr: &AttributeSpec,
        wire: &WireValue,
        cx: &CallContext,
    ) -> Result<Value, Error> {
        let cipher = self.cipher()?;

        let envelope = EncryptedEnvelope::from_wire(attr.name(), wire)?;
        let bytes = cipher.open(&envelope, self.context(attr), cx).await?;

        let plain: WireValue = serde_json::from_slice(&bytes)
            .map_err(|_| Error::invalid_envelope(attr.name(), "decrypted payload is malformed"))?;

        decode_value(attr, &plain)
    }

    fn cipher(&self) -> Result<&EnvelopeCipher, Error> {
        self.cipher
            .as_ref()
            .ok_or_else(|| Error::encryption_not_configured(self.schema.name()))
    }

    fn context<'a>(&'a self, attr: &'a AttributeSpec) -> EncryptionContext<'a> {
        EncryptionContext::new(self.schema.name(), attr.name())
    }

    fn check_known_fields(&self, record: &Record) -> Result<(), Error> {
        match record
            .keys()
            .find(|name| {
                self.schema
                    .attribute(name)
                    .is_none_or(|attr| attr.name() != name.as_str())
            })
        {
            Some(name) => Err(Error::new(
                ErrorKind::UnknownAttribute,
                ErrorOrigin::Marshal,
                format!(
                    "model '{}' has no attribute '{name}'",
                    self.schema.name()
                ),
            )),
            None => Ok(()),
        }
    }
}
