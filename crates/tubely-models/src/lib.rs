//! Shared data models for the Tubely backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video records and their identifiers
//! - Aspect-ratio classification labels

pub mod aspect;
pub mod video;

// Re-export common types
pub use aspect::AspectClass;
pub use video::{CreateVideoRequest, InvalidVideoId, VideoId, VideoRecord};
