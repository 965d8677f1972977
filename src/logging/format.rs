//! Log records and line rendering
//!
//! A record renders into one or more lines. Bodies longer than
//! [`MAX_CHUNK_CHARS`] are split; only the first line carries the call-site
//! token.

use std::fmt;

use chrono::{DateTime, Local};

use super::call_site::{render_token, CallSite, WebSource};
use super::level::Severity;

/// Maximum characters of body per rendered line
pub const MAX_CHUNK_CHARS: usize = 3000;

/// Timestamp layout used in the log file
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// A single log record
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub level: Severity,
    pub tag: String,
    pub call_site: Option<CallSite>,
    pub web_source: Option<WebSource>,
    pub body: String,
}

impl LogRecord {
    /// Create a record stamped with the current local time
    pub fn new(level: Severity, tag: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            tag: tag.into(),
            call_site: None,
            web_source: None,
            body: body.into(),
        }
    }

    pub fn with_call_site(mut self, call_site: Option<CallSite>) -> Self {
        self.call_site = call_site;
        self
    }

    pub fn with_web_source(mut self, web_source: Option<WebSource>) -> Self {
        self.web_source = web_source;
        self
    }

    /// Bracketed location token, `None` when there is no location at all
    pub fn call_site_token(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(site) = &self.call_site {
            parts.extend(site.parts());
        }
        if let Some(web) = &self.web_source {
            parts.extend(web.parts());
        }
        if parts.is_empty() {
            None
        } else {
            Some(render_token(&parts))
        }
    }

    /// Render this record into lines
    pub fn lines(&self) -> Lines<'_> {
        Lines {
            record: self,
            token: self.call_site_token(),
            rest: &self.body,
            started: false,
        }
    }
}

/// One rendered line of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub timestamp: DateTime<Local>,
    pub level: Severity,
    /// Location token, present on the first line of a record only
    pub call_site: Option<String>,
    pub chunk: String,
}

impl RenderedLine {
    /// The line without timestamp and level, as mirrored to the console
    pub fn message(&self) -> String {
        match &self.call_site {
            Some(token) => format!("{} {}", token, self.chunk),
            None => self.chunk.clone(),
        }
    }
}

impl fmt::Display for RenderedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.level,
            self.message()
        )
    }
}

/// Lazy sequence of rendered lines for one record
///
/// Always yields at least one line, and at most `ceil(chars / MAX_CHUNK_CHARS)`.
pub struct Lines<'a> {
    record: &'a LogRecord,
    token: Option<String>,
    rest: &'a str,
    started: bool,
}

impl Iterator for Lines<'_> {
    type Item = RenderedLine;

    fn next(&mut self) -> Option<Self::Item> {
        if self.started && self.rest.is_empty() {
            return None;
        }

        let split = self
            .rest
            .char_indices()
            .nth(MAX_CHUNK_CHARS)
            .map(|(idx, _)| idx)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(split);
        self.rest = rest;

        let call_site = if self.started {
            None
        } else {
            self.token.take()
        };
        self.started = true;

        Some(RenderedLine {
            timestamp: self.record.timestamp,
            level: self.record.level,
            call_site,
            chunk: chunk.to_string(),
        })
    }
}

/// Render `record` into lines
pub fn format_record(record: &LogRecord) -> Lines<'_> {
    record.lines()
}
