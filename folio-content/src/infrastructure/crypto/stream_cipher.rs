use std::sync::Arc;

use aes::Aes256;
use cbc::cipher::{
    block_padding::Pkcs7, generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut,
    KeyIvInit,
};

use crate::infrastructure::crypto::iv::{Iv, IvError, IvGenerator};
use crate::infrastructure::crypto::secret_key::SecretKey;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES block length in bytes.
pub const BLOCK_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Iv(#[from] IvError),

    #[error("corrupt ciphertext: {0}")]
    Corrupt(&'static str),
}

/// AES-256-CBC (PKCS#7) codec keyed by the process secret.
///
/// Cloning is cheap; all clones share one copy of the key.
#[derive(Debug, Clone)]
pub struct ContentCipher {
    key: Arc<SecretKey>,
    iv_generator: IvGenerator,
}

impl ContentCipher {
    pub fn new(key: SecretKey) -> Self {
        Self {
            key: Arc::new(key),
            iv_generator: IvGenerator::new(),
        }
    }

    /// Draws a fresh IV and returns it with a forward transform seeded by it.
    pub fn new_encrypt_transform(&self) -> Result<(Iv, EncryptTransform), CodecError> {
        let iv = self.iv_generator.generate()?;
        let inner = Aes256CbcEnc::new(
            GenericArray::from_slice(self.key.as_bytes()),
            GenericArray::from_slice(iv.as_bytes()),
        );
        Ok((
            iv,
            EncryptTransform {
                inner,
                pending: Vec::with_capacity(BLOCK_LEN),
            },
        ))
    }

    /// Reverse transform for a file whose IV prefix is `iv`.
    pub fn new_decrypt_transform(&self, iv: &Iv) -> DecryptTransform {
        let inner = Aes256CbcDec::new(
            GenericArray::from_slice(self.key.as_bytes()),
            GenericArray::from_slice(iv.as_bytes()),
        );
        DecryptTransform {
            inner,
            pending: Vec::with_capacity(2 * BLOCK_LEN),
        }
    }
}

/// Incremental CBC encryptor.
///
/// `update` emits every complete block as soon as it is available; the
/// remainder (< 16 bytes) is padded and emitted by `finalize`.
pub struct EncryptTransform {
    inner: Aes256CbcEnc,
    pending: Vec<u8>,
}

impl EncryptTransform {
    pub fn update(&mut self, input: &[u8]) -> Vec<u8> {
        self.pending.extend_from_slice(input);
        let ready = self.pending.len() - self.pending.len() % BLOCK_LEN;
        let mut out: Vec<u8> = self.pending.drain(..ready).collect();
        for block in out.chunks_exact_mut(BLOCK_LEN) {
            self.inner
                .encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        out
    }

    /// Pads and encrypts the tail. Always yields exactly one block.
    pub fn finalize(self) -> Result<Vec<u8>, CodecError> {
        let len = self.pending.len();
        let mut block = [0u8; BLOCK_LEN];
        block[..len].copy_from_slice(&self.pending);
        let ciphertext = self
            .inner
            .encrypt_padded_mut::<Pkcs7>(&mut block, len)
            .map_err(|_| CodecError::Corrupt("padding overflow"))?;
        Ok(ciphertext.to_vec())
    }
}

/// Incremental CBC decryptor.
///
/// The last ciphertext block is always held back until `finalize`, where
/// the PKCS#7 padding is checked and stripped.
pub struct DecryptTransform {
    inner: Aes256CbcDec,
    pending: Vec<u8>,
}

impl DecryptTransform {
    pub fn update(&mut self, input: &[u8]) -> Vec<u8> {
        self.pending.extend_from_slice(input);
        if self.pending.len() <= BLOCK_LEN {
            return Vec::new();
        }
        let keep = match self.pending.len() % BLOCK_LEN {
            0 => BLOCK_LEN,
            rem => rem,
        };
        let ready = self.pending.len() - keep;
        let mut out: Vec<u8> = self.pending.drain(..ready).collect();
        for block in out.chunks_exact_mut(BLOCK_LEN) {
            self.inner
                .decrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        out
    }

    pub fn finalize(mut self) -> Result<Vec<u8>, CodecError> {
        if self.pending.len() != BLOCK_LEN {
            return Err(CodecError::Corrupt("ciphertext is not block aligned"));
        }
        let plaintext = self
            .inner
            .decrypt_padded_mut::<Pkcs7>(&mut self.pending)
            .map_err(|_| CodecError::Corrupt("invalid padding"))?;
        Ok(plaintext.to_vec())
    }
}
