//! Fast-start container repackaging.
//!
//! Rewrites an MP4 so its metadata sits at the front of the file, which lets
//! players start before the download finishes. Streams are copied verbatim.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};

/// Suffix appended to the input path to name the repackaged output.
pub const PROCESSED_SUFFIX: &str = ".processing";

/// Output path for a repackaged file: the input path plus [`PROCESSED_SUFFIX`].
pub fn processed_path(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(PROCESSED_SUFFIX);
    PathBuf::from(os)
}

/// Rewrites a file's container layout for progressive playback.
///
/// Returns the path of the new file. The caller owns both files afterwards:
/// it promotes the output and deletes the original.
#[async_trait]
pub trait Repackager: Send + Sync {
    async fn repackage_for_streaming(&self, path: &Path) -> MediaResult<PathBuf>;
}

/// Repackager backed by the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegRepackager {
    binary: PathBuf,
}

impl Default for FfmpegRepackager {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegRepackager {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The command that repackages `path`.
    pub fn command(path: &Path) -> FfmpegCommand {
        FfmpegCommand::new(path, processed_path(path))
            .faststart()
            .stream_copy()
            .format("mp4")
    }
}

#[async_trait]
impl Repackager for FfmpegRepackager {
    async fn repackage_for_streaming(&self, path: &Path) -> MediaResult<PathBuf> {
        let cmd = Self::command(path);
        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", self.binary.display(), args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| MediaError::repackage(e.to_string(), String::new(), None))?;

        if !output.status.success() {
            return Err(MediaError::repackage(
                format!("ffmpeg exited with {}", output.status),
                String::from_utf8_lossy(&output.stderr).to_string(),
                output.status.code(),
            ));
        }

        let processed = cmd.output_path().to_path_buf();
        info!(output = %processed.display(), "Repackaged for fast start");
        Ok(processed)
    }
}

/// Repackager that copies the file to the output path unchanged.
#[derive(Debug, Clone, Default)]
pub struct PassthroughRepackager;

#[async_trait]
impl Repackager for PassthroughRepackager {
    async fn repackage_for_streaming(&self, path: &Path) -> MediaResult<PathBuf> {
        let processed = processed_path(path);
        tokio::fs::copy(path, &processed)
            .await
            .map_err(|e| MediaError::repackage("copy failed", e.to_string(), None))?;
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processed_path_appends_suffix() {
        assert_eq!(
            processed_path(Path::new("/tmp/tubely-upload123.mp4")),
            PathBuf::from("/tmp/tubely-upload123.mp4.processing")
        );
    }

    #[test]
    fn test_command_shape() {
        let args = FfmpegRepackager::command(Path::new("/tmp/v.mp4")).build_args();
        assert_eq!(args[0], "-i");
        assert_eq!(args[1], "/tmp/v.mp4");
        assert!(args.windows(2).any(|w| w == ["-movflags", "faststart"]));
        assert!(args.windows(2).any(|w| w == ["-codec", "copy"]));
        assert!(args.windows(2).any(|w| w == ["-f", "mp4"]));
        assert_eq!(args.last().unwrap(), "/tmp/v.mp4.processing");
    }

    #[tokio::test]
    async fn test_passthrough_copies_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        tokio::fs::write(&input, b"moov-last").await.unwrap();

        let output = PassthroughRepackager
            .repackage_for_streaming(&input)
            .await
            .unwrap();

        assert_eq!(output, dir.path().join("clip.mp4.processing"));
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"moov-last");
        assert!(input.exists());
    }

    #[tokio::test]
    async fn test_missing_binary_is_repackage_error() {
        let err = FfmpegRepackager::new("tubely-no-such-ffmpeg")
            .repackage_for_streaming(Path::new("/tmp/v.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Repackage { exit_code: None, .. }));
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_ffmpeg_failure_captures_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("garbage.mp4");
        tokio::fs::write(&input, b"not a container").await.unwrap();

        let err = FfmpegRepackager::default()
            .repackage_for_streaming(&input)
            .await
            .unwrap_err();
        match err {
            MediaError::Repackage { stderr, exit_code, .. } => {
                assert!(!stderr.is_empty());
                assert!(exit_code.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
