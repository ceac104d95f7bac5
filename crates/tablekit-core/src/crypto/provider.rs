use crate::{crypto::CallContext, error::Error};
use async_trait::async_trait;
use rand::{RngCore, rngs::OsRng};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use zeroize::Zeroizing;

/// Length of a plaintext data key in bytes.
pub const DATA_KEY_LEN: usize = 32;

///
/// DataKey
///
/// Fresh data key from the key-management collaborator. The plaintext half
/// is wiped on drop.
///

pub struct DataKey {
    pub plaintext: Zeroizing<Vec<u8>>,
    pub wrapped: Vec<u8>,
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataKey")
            .field("plaintext", &"<redacted>")
            .field("wrapped_len", &self.wrapped.len())
            .finish()
    }
}

///
/// KeyProvider
///
/// Capability boundary to an external key-management service.
/// Implementations should observe `cx` for cancellation; callers also
/// enforce it around every call.
///

#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn wrap_data_key(&self, cx: &CallContext) -> Result<DataKey, Error>;

    async fn unwrap_data_key(
        &self,
        wrapped: &[u8],
        cx: &CallContext,
    ) -> Result<Zeroizing<Vec<u8>>, Error>;
}

///
/// LocalKeyProvider
///
/// In-process provider that wraps data keys under a local key-encryption
/// key. Wrapped form: `nonce || ciphertext || tag`.
///

pub struct LocalKeyProvider {
    kek: Zeroizing<[u8; DATA_KEY_LEN]>,
}

const LOCAL_WRAP_AAD: &[u8] = b"tablekit:local-kek:v1";

impl LocalKeyProvider {
    #[must_use]
    pub fn new(kek: [u8; DATA_KEY_LEN]) -> Self {
        Self {
            kek: Zeroizing::new(kek),
        }
    }

    /// Provider with a random key-encryption key.
    #[must_use]
    pub fn generate() -> Self {
        let mut kek = [0u8; DATA_KEY_LEN];
        OsRng.fill_bytes(&mut kek);

        Self::new(kek)
    }

    fn key(&self) -> Result<LessSafeKey, Error> {
        let unbound = UnboundKey::new(&AES_256_GCM, &self.kek[..])
            .map_err(|_| Error::key_provider("local key-encryption key is unusable"))?;

        Ok(LessSafeKey::new(unbound))
    }
}

impl std::fmt::Debug for LocalKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeyProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyProvider for LocalKeyProvider {
    async fn wrap_data_key(&self, cx: &CallContext) -> Result<DataKey, Error> {
        if cx.is_cancelled() {
            return Err(Error::cancelled("wrap_data_key cancelled"));
        }

        let mut plaintext = Zeroizing::new(vec![0u8; DATA_KEY_LEN]);
        OsRng.fill_bytes(plaintext.as_mut_slice());

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let mut sealed = plaintext.to_vec();
        self.key()?
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce),
                Aad::from(LOCAL_WRAP_AAD),
                &mut sealed,
            )
            .map_err(|_| Error::key_provider("failed to wrap data key"))?;

        let mut wrapped = Vec::with_capacity(NONCE_LEN + sealed.len());
        wrapped.extend_from_slice(&nonce);
        wrapped.extend_from_slice(&sealed);

        Ok(DataKey { plaintext, wrapped })
    }

    async fn unwrap_data_key(
        &self,
        wrapped: &[u8],
        cx: &CallContext,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        if cx.is_cancelled() {
            return Err(Error::cancelled("unwrap_data_key cancelled"));
        }
        if wrapped.len() <= NONCE_LEN {
            return Err(Error::key_provider("wrapped data key is truncated"));
        }

        let (nonce, sealed) = wrapped.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce)
            .map_err(|_| Error::key_provider("wrapped data key has a bad nonce"))?;

        let mut buf = Zeroizing::new(sealed.to_vec());
        let plaintext = self
            .key()?
            .open_in_place(nonce, Aad::from(LOCAL_WRAP_AAD), buf.as_mut_slice())
            .map_err(|_| Error::key_provider("failed to unwrap data key"))?;

        Ok(Zeroizing::new(plaintext.to_vec()))
    }
}
