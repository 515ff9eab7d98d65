//! FFprobe/FFmpeg CLI wrappers for upload processing.
//!
//! This crate provides:
//! - Geometry probing of staged uploads (`ffprobe`) and aspect classification
//! - Fast-start container repackaging (`ffmpeg -movflags faststart`)
//! - Canned-output fakes for both, so callers can test without the binaries

pub mod command;
pub mod error;
pub mod probe;
pub mod remux;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand};
pub use error::{MediaError, MediaResult};
pub use probe::{parse_probe_output, Dimensions, FfprobeProber, GeometryProber, StaticProber};
pub use remux::{processed_path, FfmpegRepackager, PassthroughRepackager, Repackager, PROCESSED_SUFFIX};
