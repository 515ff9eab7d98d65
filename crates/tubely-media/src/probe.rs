//! FFprobe geometry probing.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use tubely_models::AspectClass;

use crate::error::{MediaError, MediaResult};

/// Pixel dimensions of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn aspect_class(&self) -> AspectClass {
        AspectClass::from_dimensions(self.width, self.height)
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl FfprobeStream {
    fn is_video(&self) -> bool {
        self.codec_type.as_deref().map_or(true, |t| t == "video")
    }
}

/// Parse `ffprobe -print_format json -show_streams` output.
///
/// Streams without a `codec_type` are treated as video. Missing width or
/// height read as zero.
pub fn parse_probe_output(stdout: &[u8]) -> MediaResult<Dimensions> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.is_video())
        .ok_or(MediaError::NoStream)?;

    Ok(Dimensions {
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
    })
}

/// Reads the geometry of a local media file.
#[async_trait]
pub trait GeometryProber: Send + Sync {
    /// Dimensions of the first video stream. Must not modify the file.
    async fn probe_dimensions(&self, path: &Path) -> MediaResult<Dimensions>;

    /// Classify the file's aspect ratio.
    async fn probe_aspect_ratio(&self, path: &Path) -> MediaResult<AspectClass> {
        let dimensions = self.probe_dimensions(path).await?;
        Ok(dimensions.aspect_class())
    }
}

/// Prober backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    binary: PathBuf,
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeProber {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl GeometryProber for FfprobeProber {
    async fn probe_dimensions(&self, path: &Path) -> MediaResult<Dimensions> {
        debug!(path = %path.display(), "Probing video geometry");

        let output = Command::new(&self.binary)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                MediaError::probe_execution(
                    format!("could not run {}: {}", self.binary.display(), e),
                    None,
                )
            })?;

        if !output.status.success() {
            return Err(MediaError::probe_execution(
                format!("ffprobe exited with {}", output.status),
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }

        parse_probe_output(&output.stdout)
    }
}

/// Prober that returns canned ffprobe output instead of running a process.
///
/// The canned bytes go through the same parser as real output, so malformed
/// JSON and empty stream lists fail the same way.
#[derive(Debug, Clone)]
pub struct StaticProber {
    stdout: Vec<u8>,
}

impl StaticProber {
    /// Use raw bytes as the ffprobe stdout.
    pub fn new(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
        }
    }

    /// Canned output with a single video stream.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        let json = serde_json::json!({
            "streams": [{ "codec_type": "video", "width": width, "height": height }]
        });
        Self::new(json.to_string())
    }
}

#[async_trait]
impl GeometryProber for StaticProber {
    async fn probe_dimensions(&self, _path: &Path) -> MediaResult<Dimensions> {
        parse_probe_output(&self.stdout)
    }
}
