//! Handing the log file to a host share mechanism

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// MIME type of a shared log file
pub const SHARE_MIME_TYPE: &str = "text/plain";

/// Subject attached to a shared log file
pub const SHARE_SUBJECT: &str = "App Logs";

/// Title for the host's target picker
pub const SHARE_CHOOSER_TITLE: &str = "Share log file";

/// Why a log file could not be shared
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no log directory configured")]
    NotInitialized,

    #[error("no log file to share at {}", .0.display())]
    Missing(PathBuf),

    #[error("log file at {} is not readable: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to share log file: {0}")]
    Share(#[source] io::Error),
}

/// What is handed to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub path: PathBuf,
    pub mime_type: &'static str,
    pub subject: &'static str,
    pub chooser_title: &'static str,
}

impl ShareRequest {
    pub fn for_log_file(path: PathBuf) -> Self {
        Self {
            path,
            mime_type: SHARE_MIME_TYPE,
            subject: SHARE_SUBJECT,
            chooser_title: SHARE_CHOOSER_TITLE,
        }
    }
}

/// Host share capability
pub trait ShareTarget: Send + Sync {
    fn share(&self, request: &ShareRequest) -> io::Result<()>;
}

/// Check that `path` exists and is readable, then build the share request
pub fn prepare_share(path: Option<PathBuf>) -> Result<ShareRequest, ExportError> {
    let path = path.ok_or(ExportError::NotInitialized)?;
    if !path.is_file() {
        return Err(ExportError::Missing(path));
    }
    if let Err(source) = File::open(&path) {
        return Err(ExportError::Unreadable { path, source });
    }
    Ok(ShareRequest::for_log_file(path))
}

/// Share the log file at `path` through `target`
pub fn export_log_file(
    path: Option<PathBuf>,
    target: &dyn ShareTarget,
) -> Result<ShareRequest, ExportError> {
    let request = prepare_share(path)?;
    target.share(&request).map_err(ExportError::Share)?;
    Ok(request)
}

/// Shares by copying the file into a directory
#[derive(Debug, Clone)]
pub struct DirectoryShare {
    dir: PathBuf,
}

impl DirectoryShare {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ShareTarget for DirectoryShare {
    fn share(&self, request: &ShareRequest) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let file_name = request.path.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name")
        })?;
        let dest = self.dir.join(file_name);
        // Copying a file onto itself truncates it
        if let Ok(existing) = fs::canonicalize(&dest) {
            if existing == fs::canonicalize(&request.path)? {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "export directory already holds the log file",
                ));
            }
        }
        fs::copy(&request.path, dest)?;
        Ok(())
    }
}
