//! The logger: filtering, rendering, console mirroring and file persistence
//!
//! One [`Logger`] lives for the whole process and is passed around by
//! reference (usually behind an `Arc`). Logging calls never fail and never
//! wait for disk.

use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::config::LoggerConfig;
use crate::export::{self, ExportError, ShareRequest, ShareTarget};

use super::call_site::{CallSite, CallSiteResolver, WebSource};
use super::files::{LogFileInfo, LogFileManager};
use super::format::{LogRecord, RenderedLine};
use super::level::{LevelFilter, LevelSet, Severity};
use super::sink::{FileSink, LogLocation, LOG_FILE_NAME};

/// Tag for development logs
pub const TAG_DEV: &str = "LOGLANE_DEV";
/// Tag for informational and warning logs
pub const TAG_INFO: &str = "LOGLANE_INFO";
/// Tag for error logs
pub const TAG_ERR: &str = "LOGLANE_ERR";
/// Tag for messages bridged from a web console
pub const TAG_WEB: &str = "LOGLANE_WEB";

/// Default rotation threshold
pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Message levels reported by an embedded web page's console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Tip,
    Log,
    Warning,
    Error,
    Debug,
}

impl ConsoleLevel {
    /// Severity a console message is logged at; `Debug` is not bridged
    pub fn severity(&self) -> Option<Severity> {
        match self {
            ConsoleLevel::Log => Some(Severity::Dev),
            ConsoleLevel::Tip => Some(Severity::Info),
            ConsoleLevel::Warning => Some(Severity::Warn),
            ConsoleLevel::Error => Some(Severity::Error),
            ConsoleLevel::Debug => None,
        }
    }
}

fn tag_for(level: Severity) -> &'static str {
    match level {
        Severity::Dev => TAG_DEV,
        Severity::Info | Severity::Warn => TAG_INFO,
        Severity::Error => TAG_ERR,
    }
}

/// Process-wide logging context
pub struct Logger {
    filter: LevelFilter,
    resolver: CallSiteResolver,
    location: Arc<LogLocation>,
    sink: Arc<FileSink>,
    files: LogFileManager,
    max_file_bytes: u64,
}

impl Logger {
    /// Create a disabled logger writing to `location`
    pub fn new(location: LogLocation) -> Result<Self> {
        let location = Arc::new(location);
        let sink = Arc::new(FileSink::spawn(Arc::clone(&location))?);
        let files = LogFileManager::new(Arc::clone(&location), Arc::clone(&sink));

        Ok(Self {
            filter: LevelFilter::new(),
            resolver: CallSiteResolver::default(),
            location,
            sink,
            files,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        })
    }

    /// Create a logger in `log_dir` with every level enabled
    pub fn in_dir(log_dir: impl Into<PathBuf>) -> Result<Self> {
        let logger = Self::new(LogLocation::new(log_dir, LOG_FILE_NAME))?;
        logger.set_enabled(true);
        Ok(logger)
    }

    /// Build a logger from configuration
    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        let mut logger = Self::new(LogLocation::new(
            config.resolved_log_dir(),
            config.file_name.clone(),
        ))?;
        logger.max_file_bytes = config.max_file_bytes();
        logger.set_enabled(config.enabled);
        if !config.levels.is_empty() {
            logger.set_levels_by_name(&config.levels);
        }
        logger.set_call_site_printing(config.print_call_site);
        Ok(logger)
    }

    // Configuration

    /// Turn logging on (every level) or off (no level)
    pub fn set_enabled(&self, enabled: bool) {
        self.filter.set_enabled(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.filter.is_enabled()
    }

    /// Restrict output to `levels`. Ignored while disabled or when empty.
    pub fn set_levels(&self, levels: &[Severity]) {
        self.filter.set_levels(levels);
    }

    /// Restrict output to the named levels
    ///
    /// Unknown names are logged as errors against the caller's location and
    /// skipped.
    #[track_caller]
    pub fn set_levels_by_name<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let call_site = self.resolver.resolve();
        self.filter.set_levels_by_name(names, |e| {
            if self.filter.is_allowed(Severity::Error) {
                self.emit(
                    LogRecord::new(Severity::Error, TAG_ERR, e.to_string())
                        .with_call_site(call_site.clone()),
                );
            }
        });
    }

    pub fn levels(&self) -> LevelSet {
        self.filter.levels()
    }

    pub fn is_allowed(&self, level: Severity) -> bool {
        self.filter.is_allowed(level)
    }

    pub fn set_call_site_printing(&self, enabled: bool) {
        self.resolver.set_capture(enabled);
    }

    pub fn is_printing_call_site(&self) -> bool {
        self.resolver.is_capturing()
    }

    /// Move the log file to a new directory; takes effect for the next job
    pub fn set_log_dir(&self, log_dir: impl Into<PathBuf>) {
        self.location.set_base_dir(log_dir);
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    // Logging

    #[track_caller]
    pub fn dev(&self, message: impl AsRef<str>) {
        self.log(Severity::Dev, message);
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(Severity::Info, message);
    }

    #[track_caller]
    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(Severity::Warn, message);
    }

    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(Severity::Error, message);
    }

    /// Log at `level` with the level's default tag
    #[track_caller]
    pub fn log(&self, level: Severity, message: impl AsRef<str>) {
        if !self.filter.is_allowed(level) {
            return;
        }
        let call_site = self.resolver.resolve();
        self.emit(
            LogRecord::new(level, tag_for(level), message.as_ref()).with_call_site(call_site),
        );
    }

    /// Log with an explicit location, e.g. from [`callsite!`](crate::callsite)
    ///
    /// The location is still only printed while call-site printing is on.
    pub fn log_at(&self, level: Severity, site: CallSite, message: impl AsRef<str>) {
        if !self.filter.is_allowed(level) {
            return;
        }
        let call_site = self.resolver.accept(site);
        self.emit(
            LogRecord::new(level, tag_for(level), message.as_ref()).with_call_site(call_site),
        );
    }

    /// Log an error followed by its chain of sources, one per line
    #[track_caller]
    pub fn error_chain(&self, err: &(dyn StdError + 'static)) {
        if !self.filter.is_allowed(Severity::Error) {
            return;
        }
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        let message = format!("{} >>> {}", err, causes.join("\n"));

        let call_site = self.resolver.resolve();
        self.emit(LogRecord::new(Severity::Error, TAG_ERR, message).with_call_site(call_site));
    }

    /// Log a message from an embedded web page's console
    #[track_caller]
    pub fn web(&self, level: ConsoleLevel, source_id: &str, line: u32, message: impl AsRef<str>) {
        let Some(severity) = level.severity() else {
            return;
        };
        if !self.filter.is_allowed(severity) {
            return;
        }
        let call_site = self.resolver.resolve();
        self.emit(
            LogRecord::new(severity, TAG_WEB, message.as_ref())
                .with_call_site(call_site)
                .with_web_source(Some(WebSource::new(source_id, line))),
        );
    }

    /// Mirror and persist an already filtered record
    fn emit(&self, record: LogRecord) {
        for line in record.lines() {
            mirror_to_console(&record.tag, &line);
            self.sink.append(line);
        }
    }

    // File operations

    /// Queue a rotation check against the configured threshold
    pub fn rotate_if_needed(&self) {
        self.sink.rotate(self.max_file_bytes);
    }

    /// Queue a rotation check against `max_bytes`
    pub fn rotate(&self, max_bytes: u64) {
        self.sink.rotate(max_bytes);
    }

    /// Queue deletion of the log file
    pub fn clear_logs(&self) {
        self.files.clear();
    }

    pub fn read_logs(&self) -> Option<String> {
        self.files.read_all()
    }

    pub fn log_file_size(&self) -> u64 {
        self.files.size()
    }

    pub fn log_file_info(&self) -> LogFileInfo {
        self.files.stat()
    }

    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.files.path()
    }

    pub fn files(&self) -> &LogFileManager {
        &self.files
    }

    /// Hand the log file to `target`
    ///
    /// Failures are logged as errors and returned.
    #[track_caller]
    pub fn share_log_file(&self, target: &dyn ShareTarget) -> Result<ShareRequest, ExportError> {
        match export::export_log_file(self.files.path(), target) {
            Ok(request) => {
                self.dev("Log file share started");
                Ok(request)
            }
            Err(e) => {
                self.error(e.to_string());
                Err(e)
            }
        }
    }

    /// Wait for every queued file operation to finish
    pub async fn flush(&self) {
        self.sink.flush().await;
    }

    /// Blocking form of [`flush`](Self::flush); not for use inside async code
    pub fn flush_blocking(&self) {
        self.sink.flush_blocking();
    }
}

fn mirror_to_console(tag: &str, line: &RenderedLine) {
    let message = line.message();
    match line.level {
        Severity::Dev => tracing::debug!(tag = %tag, "{}", message),
        Severity::Info => tracing::info!(tag = %tag, "{}", message),
        Severity::Warn => tracing::warn!(tag = %tag, "{}", message),
        Severity::Error => tracing::error!(tag = %tag, "{}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::fs;
    use tempfile::TempDir;

    fn logged_lines(logger: &Logger) -> Vec<String> {
        logger.flush_blocking();
        logger
            .read_logs()
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_new_logger_is_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::new(LogLocation::new(temp_dir.path(), LOG_FILE_NAME)).unwrap();

        logger.info("dropped");
        assert!(logged_lines(&logger).is_empty());
    }

    #[test]
    fn test_levels_are_written_with_tags_stripped() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::in_dir(temp_dir.path()).unwrap();

        logger.dev("d");
        logger.info("i");
        logger.warn("w");
        logger.error("e");

        let lines = logged_lines(&logger);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("[DEV] d"));
        assert!(lines[1].ends_with("[INFO] i"));
        assert!(lines[2].ends_with("[WARN] w"));
        assert!(lines[3].ends_with("[ERROR] e"));
    }

    #[test]
    fn test_filtered_levels_are_not_written() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::in_dir(temp_dir.path()).unwrap();
        logger.set_levels(&[Severity::Error]);

        logger.info("quiet");
        logger.error("loud");

        let lines = logged_lines(&logger);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("loud"));
    }

    #[test]
    fn test_unknown_level_name_is_reported_and_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::in_dir(temp_dir.path()).unwrap();

        logger.set_levels_by_name(["WARN", "LOUD", "ERROR"]);

        assert!(logger.is_allowed(Severity::Warn));
        assert!(logger.is_allowed(Severity::Error));
        assert!(!logger.is_allowed(Severity::Info));

        let lines = logged_lines(&logger);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("[ERROR]"));
        assert!(lines[0].contains("LOUD"));
    }

    #[test]
    fn test_call_site_printing() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::in_dir(temp_dir.path()).unwrap();
        logger.set_call_site_printing(true);

        let line = line!() + 1;
        logger.info("located");

        let lines = logged_lines(&logger);
        assert!(lines[0].contains(&format!("logger.rs, {}] located", line)));
    }

    #[test]
    fn test_unknown_level_name_reports_caller_location() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::in_dir(temp_dir.path()).unwrap();
        logger.set_call_site_printing(true);

        let line = line!() + 1;
        logger.set_levels_by_name(["NOPE", "INFO"]);

        let lines = logged_lines(&logger);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(&format!("logger.rs, {}] undefined log level", line)));
    }

    #[test]
    fn test_log_at_uses_explicit_site_only_when_printing() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::in_dir(temp_dir.path()).unwrap();

        logger.log_at(Severity::Info, crate::callsite!(), "plain");
        logger.set_call_site_printing(true);
        logger.log_at(Severity::Info, crate::callsite!(), "located");

        let lines = logged_lines(&logger);
        assert!(lines[0].ends_with("[INFO] plain"));
        assert!(lines[1].contains("test_log_at_uses_explicit_site_only_when_printing"));
    }

    #[test]
    fn test_long_message_spans_lines() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::in_dir(temp_dir.path()).unwrap();

        logger.info("z".repeat(6001));

        let lines = logged_lines(&logger);
        assert_eq!(lines.len(), 3);
        assert!(lines[2].ends_with("[INFO] z"));
    }

    #[derive(Debug)]
    struct Wrapped {
        inner: std::io::Error,
    }

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "request failed")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.inner)
        }
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::in_dir(temp_dir.path()).unwrap();
        let err = Wrapped {
            inner: std::io::Error::new(std::io::ErrorKind::Other, "socket closed"),
        };

        logger.error_chain(&err);

        let content = logged_lines(&logger).join("\n");
        assert!(content.contains("[ERROR] request failed >>> socket closed"));
    }

    #[derive(Debug)]
    struct Outer {
        inner: Wrapped,
    }

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "sync aborted")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.inner)
        }
    }

    #[test]
    fn test_error_chain_lists_every_source() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::in_dir(temp_dir.path()).unwrap();
        let err = Outer {
            inner: Wrapped {
                inner: std::io::Error::new(std::io::ErrorKind::Other, "socket closed"),
            },
        };

        logger.error_chain(&err);

        let lines = logged_lines(&logger);
        assert!(lines[0].contains("[ERROR] sync aborted >>> request failed"));
        assert!(lines.join("\n").contains("socket closed"));
    }

    #[test]
    fn test_error_chain_without_source_keeps_separator() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::in_dir(temp_dir.path()).unwrap();
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");

        logger.error_chain(&err);

        let lines = logged_lines(&logger);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("[ERROR] disk full >>>"));
    }

    #[test]
    fn test_web_console_bridge() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::in_dir(temp_dir.path()).unwrap();

        logger.web(ConsoleLevel::Warning, "app.js", 17, "slow render");
        logger.web(ConsoleLevel::Debug, "app.js", 18, "ignored");

        let lines = logged_lines(&logger);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("[WARN] [app.js, 17] slow render"));
    }

    #[test]
    fn test_rotate_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::in_dir(temp_dir.path()).unwrap();

        for i in 0..10 {
            logger.info(format!("entry {i}"));
        }
        logger.rotate(1);
        assert_eq!(logged_lines(&logger).len(), 5);

        logger.clear_logs();
        logger.flush_blocking();
        assert!(!logger.log_file_info().exists);
    }

    #[test]
    fn test_rotate_if_needed_respects_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = LoggerConfig::default();
        config.log_dir = temp_dir.path().to_path_buf();

        let logger = Logger::from_config(&config).unwrap();
        logger.info("tiny");
        logger.rotate_if_needed();

        assert_eq!(logged_lines(&logger).len(), 1);
    }

    #[test]
    fn test_from_config_applies_levels() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = LoggerConfig::default();
        config.log_dir = temp_dir.path().to_path_buf();
        config.levels = vec!["ERROR".to_string()];
        config.print_call_site = true;

        let logger = Logger::from_config(&config).unwrap();
        assert!(logger.is_enabled());
        assert!(logger.is_printing_call_site());
        assert!(!logger.is_allowed(Severity::Info));
        assert!(logger.is_allowed(Severity::Error));
    }

    #[test]
    fn test_set_log_dir_redirects_writes() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("first");
        let second = temp_dir.path().join("second");
        let logger = Logger::in_dir(&first).unwrap();

        logger.info("one");
        logger.set_log_dir(&second);
        logger.info("two");
        logger.flush_blocking();

        let first_content = fs::read_to_string(first.join(LOG_FILE_NAME)).unwrap();
        let second_content = fs::read_to_string(second.join(LOG_FILE_NAME)).unwrap();
        assert!(first_content.contains("one"));
        assert!(second_content.contains("two"));
    }

    #[test]
    fn test_share_missing_file_logs_error() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::in_dir(temp_dir.path()).unwrap();
        let target = crate::export::DirectoryShare::new(temp_dir.path().join("out"));

        let result = logger.share_log_file(&target);
        assert!(matches!(result, Err(ExportError::Missing(_))));

        let lines = logged_lines(&logger);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("no log file to share"));
    }

    #[test]
    fn test_concurrent_logging_from_threads() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Arc::new(Logger::in_dir(temp_dir.path()).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let logger = Arc::clone(&logger);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        logger.info(format!("t{t}-{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = logged_lines(&logger);
        assert_eq!(lines.len(), 100);
        assert!(lines.iter().all(|l| l.contains("[INFO] t")));
    }
}
