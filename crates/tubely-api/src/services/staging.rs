//! Staged upload files.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

const STAGED_PREFIX: &str = "tubely-upload";
const STAGED_SUFFIX: &str = ".mp4";

/// Exclusively owned local copy of an upload.
///
/// The file is removed from disk when the value is dropped, whichever way
/// the request ends.
#[derive(Debug)]
pub struct StagedFile {
    file: File,
    path: TempPath,
}

impl StagedFile {
    /// Create an empty staged file in `dir`, or the system temp dir.
    pub fn create(dir: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGED_PREFIX).suffix(STAGED_SUFFIX);
        let named = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        let (file, path) = named.into_parts();
        Ok(Self {
            file: File::from_std(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append bytes at the current position.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_all(chunk).await
    }

    /// Flush pending writes and move the cursor back to the start.
    pub async fn rewind(&mut self) -> io::Result<()> {
        self.file.flush().await?;
        self.file.seek(SeekFrom::Start(0)).await?;
        Ok(())
    }

    /// Handle for reading the staged bytes from the current position.
    pub async fn body(&self) -> io::Result<File> {
        self.file.try_clone().await
    }
}

/// Output of an external tool that should not outlive the request.
#[derive(Debug)]
pub struct ScratchFile {
    path: TempPath,
}

impl ScratchFile {
    /// Take ownership of `path`; the file is deleted on drop.
    pub fn adopt(path: PathBuf) -> Self {
        Self {
            path: TempPath::from_path(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn open(&self) -> io::Result<File> {
        File::open(&self.path).await
    }
}
