use rand::{rngs::OsRng, RngCore};

/// CBC initialization vector length in bytes.
pub const IV_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
#[error("os random source failed: {0}")]
pub struct IvError(String);

/// Per-file initialization vector, stored in clear as the file prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Iv([u8; IV_LEN]);

impl Iv {
    pub fn from_bytes(bytes: [u8; IV_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IV_LEN] {
        &self.0
    }
}

/// Draws fresh IVs from the operating system CSPRNG.
///
/// Every call yields an independent 128-bit value, so two files encrypted
/// under the same key never share an IV.
#[derive(Debug, Clone, Copy, Default)]
pub struct IvGenerator;

impl IvGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self) -> Result<Iv, IvError> {
        let mut bytes = [0u8; IV_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| IvError(e.to_string()))?;
        Ok(Iv(bytes))
    }
}
