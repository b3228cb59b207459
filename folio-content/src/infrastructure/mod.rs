pub mod catalog;
pub mod content_id;
pub mod crypto;
pub mod decrypt_session;
pub mod encrypted_file;
pub mod ingest;

pub use catalog::InMemoryContentCatalog;
pub use decrypt_session::{DecryptSession, Window};
pub use encrypted_file::{DeliveryError, EncryptedFile};
pub use ingest::{IngestEncoder, IngestError, IngestReport};
