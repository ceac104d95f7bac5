use crate::{
    ENVELOPE_VERSION,
    crypto::{CallContext, EncryptedEnvelope, KeyProvider},
    error::Error,
};
use rand::{RngCore, rngs::OsRng};
use ring::{
    aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey},
    hkdf,
};
use std::{sync::Arc, time::Duration};
use zeroize::Zeroizing;

const HKDF_SALT: &[u8] = b"tablekit:envelope:v1";

///
/// EncryptionContext
///
/// What a ciphertext is bound to. Decrypting under any other context
/// fails authentication.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EncryptionContext<'a> {
    pub model: &'a str,
    pub attribute: &'a str,
}

impl<'a> EncryptionContext<'a> {
    #[must_use]
    pub const fn new(model: &'a str, attribute: &'a str) -> Self {
        Self { model, attribute }
    }

    /// Length-prefixed so `("ab", "c")` and `("a", "bc")` differ.
    #[must_use]
    pub fn aad(&self) -> Vec<u8> {
        let mut aad = Vec::with_capacity(32 + self.model.len() + self.attribute.len());
        aad.extend_from_slice(b"tablekit:encrypted:v1|");
        for part in [self.model, self.attribute] {
            aad.extend_from_slice(&(part.len() as u64).to_be_bytes());
            aad.extend_from_slice(part.as_bytes());
        }

        aad
    }
}

///
/// EnvelopeCipher
///
/// Per-attribute envelope encryption over a key provider. Each seal uses
/// a fresh data key and nonce; the AEAD key is HKDF-derived from the data
/// key and bound to the encryption context.
///

#[derive(Clone)]
pub struct EnvelopeCipher {
    provider: Arc<dyn KeyProvider>,
    default_timeout: Option<Duration>,
}

impl EnvelopeCipher {
    #[must_use]
    pub fn new(provider: Arc<dyn KeyProvider>) -> Self {
        Self {
            provider,
            default_timeout: None,
        }
    }

    /// Deadline applied when the caller's context carries none.
    #[must_use]
    pub const fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub async fn seal(
        &self,
        plaintext: &[u8],
        context: EncryptionContext<'_>,
        cx: &CallContext,
    ) -> Result<EncryptedEnvelope, Error> {
        let cx = cx.clone().or_timeout(self.default_timeout);
        let data_key = cx
            .run("wrap_data_key", self.provider.wrap_data_key(&cx))
            .await?;

        let key = derive_key(&data_key.plaintext, &context)?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let mut ciphertext = plaintext.to_vec();
        key.seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce),
            Aad::from(context.aad()),
            &mut ciphertext,
        )
        .map_err(|_| Error::key_provider("authenticated encryption failed"))?;

        tracing::debug!(
            model = context.model,
            attribute = context.attribute,
            version = ENVELOPE_VERSION,
            "sealed attribute envelope"
        );

        Ok(EncryptedEnvelope {
            version: ENVELOPE_VERSION,
            wrapped_key: data_key.wrapped,
            nonce: nonce.to_vec(),
            ciphertext,
        })
    }

    /// Either the full plaintext or an error; never a partial result.
    pub async fn open(
        &self,
        envelope: &EncryptedEnvelope,
        context: EncryptionContext<'_>,
        cx: &CallContext,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        if envelope.version != ENVELOPE_VERSION {
            return Err(Error::invalid_envelope(
                context.attribute,
                &format!("unsupported version {}", envelope.version),
            ));
        }
        let nonce = Nonce::try_assume_unique_for_key(&envelope.nonce)
            .map_err(|_| Error::invalid_envelope(context.attribute, "bad nonce length"))?;

        let cx = cx.clone().or_timeout(self.default_timeout);
        let data_key = cx
            .run(
                "unwrap_data_key",
                self.provider.unwrap_data_key(&envelope.wrapped_key, &cx),
            )
            .await?;

        let key = derive_key(&data_key, &context)?;

        let mut buf = Zeroizing::new(envelope.ciphertext.clone());
        let Ok(plaintext) = key.open_in_place(nonce, Aad::from(context.aad()), buf.as_mut_slice())
        else {
            tracing::warn!(
                model = context.model,
                attribute = context.attribute,
                "envelope authentication failed"
            );
            return Err(Error::invalid_envelope(
                context.attribute,
                "authentication failed",
            ));
        };

        Ok(Zeroizing::new(plaintext.to_vec()))
    }
}

impl std::fmt::Debug for EnvelopeCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeCipher")
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}

// HKDF-SHA256(data key) with the context as info.
fn derive_key(data_key: &[u8], context: &EncryptionContext<'_>) -> Result<LessSafeKey, Error> {
    let aad = context.aad();
    let info = [aad.as_slice()];

    let prk = hkdf::Salt::new(hkdf::HKDF_SHA256, HKDF_SALT).extract(data_key);
    let okm = prk
        .expand(&info, &AES_256_GCM)
        .map_err(|_| Error::key_provider("key derivation failed"))?;

    Ok(LessSafeKey::new(UnboundKey::from(okm)))
}
