//! Logging system for loglane
//!
//! Leveled, tagged logging mirrored to the console and persisted through a
//! single-writer queue to one rotating log file.

mod call_site;
mod console;
mod disk_error;
mod files;
mod format;
mod level;
mod logger;
mod sink;

pub use call_site::{render_token, CallSite, CallSiteResolver, WebSource};
pub use console::{init_console_logging, DEFAULT_FILTER};
pub use disk_error::{categorize_io_error, describe_io_error, DiskErrorKind};
pub use files::{format_file_size, remove_all_in, LogFileInfo, LogFileManager};
pub use format::{format_record, LogRecord, Lines, RenderedLine, MAX_CHUNK_CHARS, TIMESTAMP_FORMAT};
pub use level::{LevelFilter, LevelSet, ParseSeverityError, Severity};
pub use logger::{
    ConsoleLevel, Logger, DEFAULT_MAX_FILE_BYTES, TAG_DEV, TAG_ERR, TAG_INFO, TAG_WEB,
};
pub use sink::{FileSink, LogLocation, Rotation, LOG_FILE_NAME};
