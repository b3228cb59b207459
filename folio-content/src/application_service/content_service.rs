mod command;
mod delivery;
mod port;
mod upload;

pub use command::{RegisterUploadCommand, RegisterUploadResult};
pub use delivery::{DeliveryService, LocateError};
pub use port::{CatalogError, ContentCatalog};
pub use upload::{sanitize_file_name, UploadError, UploadService};
pub(crate) use upload::discard_temp;
