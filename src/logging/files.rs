//! Log file lifecycle: read, size, stat, clear, purge
//!
//! Reads go straight to disk and are not ordered against the writer queue; a
//! read racing a rotation may see the file before or after it. Anything that
//! mutates the file goes through the [`FileSink`].

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, warn};

use super::disk_error::describe_io_error;
use super::sink::{FileSink, LogLocation};

const SIZE_UNITS: &[char] = &['K', 'M', 'G', 'T', 'P', 'E'];

/// Information about the current log file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogFileInfo {
    pub exists: bool,
    /// Human readable size, e.g. "1.5 KB"
    pub size: String,
    /// Absolute path, `None` when no log directory is configured
    pub path: Option<PathBuf>,
}

/// File operations on the log file
pub struct LogFileManager {
    location: Arc<LogLocation>,
    sink: Arc<FileSink>,
}

impl LogFileManager {
    pub fn new(location: Arc<LogLocation>, sink: Arc<FileSink>) -> Self {
        Self { location, sink }
    }

    /// Current log file path
    pub fn path(&self) -> Option<PathBuf> {
        self.location.log_file()
    }

    /// Whole log with every line terminated by `\n`
    ///
    /// `None` when there is no file or it cannot be read.
    pub fn read_all(&self) -> Option<String> {
        let path = self.path()?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                error!("{}", describe_io_error(&e, "Failed to open log file"));
                return None;
            }
        };

        let mut content = String::new();
        for line in BufReader::new(file).lines() {
            match line {
                Ok(line) => {
                    content.push_str(&line);
                    content.push('\n');
                }
                Err(e) => {
                    error!("{}", describe_io_error(&e, "Failed to read log file"));
                    return None;
                }
            }
        }
        Some(content)
    }

    /// Size in bytes, 0 when the file is absent
    pub fn size(&self) -> u64 {
        self.path()
            .and_then(|path| fs::metadata(path).ok())
            .map(|metadata| metadata.len())
            .unwrap_or(0)
    }

    pub fn stat(&self) -> LogFileInfo {
        let Some(path) = self.path() else {
            return LogFileInfo {
                exists: false,
                size: format_file_size(0),
                path: None,
            };
        };

        let metadata = fs::metadata(&path).ok().filter(|m| m.is_file());
        let bytes = metadata.as_ref().map(|m| m.len()).unwrap_or(0);

        LogFileInfo {
            exists: metadata.is_some(),
            size: format_file_size(bytes),
            path: Some(std::path::absolute(&path).unwrap_or(path)),
        }
    }

    /// Delete the log file once every queued write has finished
    pub fn clear(&self) {
        self.sink.delete();
    }

    /// Delete every entry directly inside `dir`
    ///
    /// See [`remove_all_in`].
    pub fn remove_all_in(dir: &Path) -> bool {
        remove_all_in(dir)
    }
}

/// Format a byte count with binary units, e.g. "512 bytes", "1.5 KB"
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} bytes", bytes);
    }

    let mut value = bytes as f64;
    let mut exp = 0;
    while value >= 1024.0 && exp < SIZE_UNITS.len() {
        value /= 1024.0;
        exp += 1;
    }
    format!("{:.1} {}B", value, SIZE_UNITS[exp - 1])
}

/// Delete every entry directly inside `dir`, in file name order
///
/// Files are removed; empty sub-directories are removed, non-empty ones fail.
/// Stops at the first failure and returns `false`. Returns `true` when the
/// directory is empty or cannot be listed.
pub fn remove_all_in(dir: &Path) -> bool {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return true,
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    paths.sort();

    for path in paths {
        let result = if path.is_dir() {
            fs::remove_dir(&path)
        } else {
            fs::remove_file(&path)
        };
        if let Err(e) = result {
            warn!(
                "{}",
                describe_io_error(&e, &format!("Failed to delete {}", path.display()))
            );
            return false;
        }
    }

    true
}
