use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::ConfigError;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// Process-wide content encryption secret.
///
/// Loaded once at startup and shared read-only by every codec instance.
/// The key bytes are wiped when the last copy is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parses a hex-encoded key (64 hex characters).
    pub fn from_hex(encoded: &str) -> Result<Self, ConfigError> {
        let mut decoded =
            hex::decode(encoded.trim()).map_err(|e| ConfigError::SecretEncoding(e.to_string()))?;

        let result = <[u8; KEY_LEN]>::try_from(decoded.as_slice())
            .map(Self)
            .map_err(|_| ConfigError::SecretLength {
                expected: KEY_LEN,
                actual: decoded.len(),
            });
        decoded.zeroize();
        result
    }

    /// Reads and parses the key from the given environment variable.
    pub fn from_env(var: &str) -> Result<Self, ConfigError> {
        let mut value = std::env::var(var).map_err(|_| ConfigError::MissingSecret(var.to_string()))?;
        let key = Self::from_hex(&value);
        value.zeroize();
        key
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}
