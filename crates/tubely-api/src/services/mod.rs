//! Business logic services.

pub mod staging;
pub mod upload;

pub use staging::{ScratchFile, StagedFile};
pub use upload::{parse_media_type, NotOwner, UploadService, ACCEPTED_MEDIA_TYPE, VIDEO_FIELD};
