//! The on-disk report file shared by the encoder and the delivery channels.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::io::AsyncWriteExt;

use crate::error::ReportError;

/// A rendered report that is fully written and synced to disk.
///
/// Holding a `ReportFile` means the write completed; there is no window
/// where a reader can observe a partially flushed file. The file is removed
/// by [`ReportFile::discard`], or on drop if `discard` was never called.
#[derive(Debug)]
pub struct ReportFile {
    path: PathBuf,
    name: String,
    report_date: NaiveDate,
    discarded: bool,
}

impl ReportFile {
    /// Write `bytes` to `dir/name`, creating `dir` if needed, and wait for
    /// the data to reach storage.
    pub async fn write(
        dir: &Path,
        name: &str,
        report_date: NaiveDate,
        bytes: &[u8],
    ) -> Result<Self, ReportError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(name);
        let mut file = tokio::fs::File::create(&path).await?;
        // From here on the handle owns the file, so a failed write removes it.
        let report = Self {
            path,
            name: name.to_string(),
            report_date,
            discarded: false,
        };
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        tracing::debug!(path = %report.path.display(), bytes = bytes.len(), "Report file written");
        Ok(report)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name, also used as the remote and attachment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn report_date(&self) -> NaiveDate {
        self.report_date
    }

    /// Read the complete file back.
    pub async fn read_bytes(&self) -> Result<Vec<u8>, ReportError> {
        Ok(tokio::fs::read(&self.path).await?)
    }

    /// Delete the file. Consumes the handle, so this runs at most once.
    pub async fn discard(mut self) -> std::io::Result<()> {
        self.discarded = true;
        tokio::fs::remove_file(&self.path).await
    }
}

impl Drop for ReportFile {
    fn drop(&mut self) {
        if self.discarded {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove dropped report file");
            }
        }
    }
}
