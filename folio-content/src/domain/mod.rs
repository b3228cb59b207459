pub mod byte_range;
pub mod content_id;
pub mod metadata;

pub use byte_range::{ByteRange, RangeError, RangeSpec};
pub use content_id::{ContentId, ContentIdGenerator};
pub use metadata::ContentMetadata;
