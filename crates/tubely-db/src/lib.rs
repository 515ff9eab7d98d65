//! Video record persistence.
//!
//! The upload pipeline talks to persistence only through [`VideoRepository`].
//! [`InMemoryVideoRepository`] is the bundled implementation.

pub mod error;
pub mod repos;

pub use error::{DbError, DbResult};
pub use repos::{InMemoryVideoRepository, VideoRepository};
