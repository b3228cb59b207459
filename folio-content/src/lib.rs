pub mod application_service;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use config::{ConfigError, ContentServerConfig};
pub use infrastructure::crypto::{ContentCipher, SecretKey};
