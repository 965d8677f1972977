//! loglane - leveled, tagged logging with a rotating log file
//!
//! A [`Logger`](logging::Logger) filters by severity set, optionally prefixes
//! the caller's location, mirrors every line to `tracing`, and appends it to a
//! log file through a single writer thread that also owns rotation and
//! deletion. The log file can be read, inspected and handed to a host share
//! mechanism.

pub mod config;
pub mod export;
pub mod logging;
