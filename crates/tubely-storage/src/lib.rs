//! Object storage for uploaded videos.
//!
//! This crate provides:
//! - Random storage key generation with an injectable entropy source
//! - The `ObjectStore` seam used by the upload pipeline
//! - An S3 implementation and a local `assets/` directory implementation
//! - Public URL derivation (and key recovery from those URLs)

pub mod error;
pub mod keys;
pub mod local;
pub mod s3;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use keys::{
    media_type_to_ext, object_key, EntropyError, EntropySource, KeyGenerator, OsEntropy,
    SeededEntropy, TOKEN_BYTES,
};
pub use local::{asset_url, LocalAssetStore};
pub use s3::{object_url, S3Config, S3Store};
pub use store::ObjectStore;
