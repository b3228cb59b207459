pub mod iv;
pub mod secret_key;
pub mod stream_cipher;

pub use iv::{Iv, IvGenerator, IV_LEN};
pub use secret_key::{SecretKey, KEY_LEN};
pub use stream_cipher::{CodecError, ContentCipher, DecryptTransform, EncryptTransform, BLOCK_LEN};
