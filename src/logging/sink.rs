//! Single-writer log file sink
//!
//! Every mutation of the log file (append, rotate, delete) is a [`Job`] on one
//! queue drained by one dedicated thread, so mutations run one at a time in
//! submission order. Callers only pay for the queue insertion.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use super::disk_error::describe_io_error;
use super::format::RenderedLine;

/// Default log file name
pub const LOG_FILE_NAME: &str = "app_logs.txt";

/// Where the log file lives
///
/// The path is resolved on every access, so changing the base directory
/// takes effect for the next job.
#[derive(Debug)]
pub struct LogLocation {
    base_dir: RwLock<Option<PathBuf>>,
    file_name: String,
}

impl LogLocation {
    pub fn new(base_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            base_dir: RwLock::new(Some(base_dir.into())),
            file_name: file_name.into(),
        }
    }

    /// A location with no base directory yet
    pub fn unset(file_name: impl Into<String>) -> Self {
        Self {
            base_dir: RwLock::new(None),
            file_name: file_name.into(),
        }
    }

    pub fn set_base_dir(&self, base_dir: impl Into<PathBuf>) {
        if let Ok(mut dir) = self.base_dir.write() {
            *dir = Some(base_dir.into());
        }
    }

    pub fn base_dir(&self) -> Option<PathBuf> {
        self.base_dir.read().ok().and_then(|dir| dir.clone())
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Current log file path, `None` until a base directory is set
    pub fn log_file(&self) -> Option<PathBuf> {
        self.base_dir().map(|dir| dir.join(&self.file_name))
    }
}

/// Work item for the writer thread
#[derive(Debug)]
enum Job {
    Append(RenderedLine),
    Rotate { max_bytes: u64 },
    Delete,
    Flush(oneshot::Sender<()>),
}

/// Outcome of a rotation check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// File at or under the threshold (or missing), left alone
    Skipped,
    /// File rewritten with its newer half
    Rotated { kept: usize, dropped: usize },
}

/// Asynchronous, single-writer log file sink
///
/// Dropping the sink closes the queue, lets the writer finish every job
/// already submitted, then joins it.
pub struct FileSink {
    tx: Option<mpsc::UnboundedSender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl FileSink {
    /// Start the writer thread for `location`
    pub fn spawn(location: Arc<LogLocation>) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = thread::Builder::new()
            .name("loglane-writer".to_string())
            .spawn(move || run_worker(rx, location))
            .context("Failed to spawn log writer thread")?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Queue one line for appending. Never waits for the write.
    pub fn append(&self, line: RenderedLine) {
        self.submit(Job::Append(line));
    }

    /// Queue a rotation check against `max_bytes`
    pub fn rotate(&self, max_bytes: u64) {
        self.submit(Job::Rotate { max_bytes });
    }

    /// Queue deletion of the log file
    pub fn delete(&self) {
        self.submit(Job::Delete);
    }

    /// Wait until every job submitted before this call has run
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.submit(Job::Flush(done_tx));
        // Err only if the writer is gone, in which case there is nothing to wait for
        let _ = done_rx.await;
    }

    /// Blocking form of [`flush`](Self::flush)
    ///
    /// Must not be called from inside an async context.
    pub fn flush_blocking(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.submit(Job::Flush(done_tx));
        let _ = done_rx.blocking_recv();
    }

    fn submit(&self, job: Job) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(job).is_err() {
            error!("Log writer has stopped, dropping job");
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once the queue is drained
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Log writer thread panicked");
            }
        }
    }
}

fn run_worker(mut rx: mpsc::UnboundedReceiver<Job>, location: Arc<LogLocation>) {
    debug!("Log writer started");

    while let Some(job) = rx.blocking_recv() {
        match job {
            Job::Flush(done) => {
                let _ = done.send(());
            }
            Job::Append(line) => {
                let Some(path) = resolve_log_file(&location) else {
                    continue;
                };
                if let Err(e) = append_line(&path, &line) {
                    error!("{}", describe_io_error(&e, "Failed to write log file"));
                }
            }
            Job::Rotate { max_bytes } => {
                let Some(path) = resolve_log_file(&location) else {
                    continue;
                };
                match rotate_file(&path, max_bytes) {
                    Ok(Rotation::Rotated { kept, dropped }) => {
                        info!(kept, dropped, "Log file exceeded {} bytes, rotated", max_bytes);
                    }
                    Ok(Rotation::Skipped) => {}
                    Err(e) => error!("{}", describe_io_error(&e, "Failed to rotate log file")),
                }
            }
            Job::Delete => {
                let Some(path) = resolve_log_file(&location) else {
                    continue;
                };
                match delete_file(&path) {
                    Ok(true) => info!("Log file deleted"),
                    Ok(false) => {}
                    Err(e) => error!("{}", describe_io_error(&e, "Failed to delete log file")),
                }
            }
        }
    }

    debug!("Log writer stopped");
}

fn resolve_log_file(location: &LogLocation) -> Option<PathBuf> {
    let path = location.log_file();
    if path.is_none() {
        error!("Logger is not initialized: no log directory configured");
    }
    path
}

/// Append one rendered line, opening and closing the file around the write
fn append_line(path: &Path, line: &RenderedLine) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format!("{}\n", line).as_bytes())?;
    file.flush()
}

/// Keep only the newer half of the file's lines when it exceeds `max_bytes`
pub(crate) fn rotate_file(path: &Path, max_bytes: u64) -> io::Result<Rotation> {
    let size = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Rotation::Skipped),
        Err(e) => return Err(e),
    };
    if size <= max_bytes {
        return Ok(Rotation::Skipped);
    }

    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = content.lines().collect();
    let half = lines.len() / 2;

    let mut kept = String::with_capacity(content.len() / 2 + 1);
    for line in &lines[half..] {
        kept.push_str(line);
        kept.push('\n');
    }

    let mut file = File::create(path)?;
    file.write_all(kept.as_bytes())?;
    file.flush()?;

    Ok(Rotation::Rotated {
        kept: lines.len() - half,
        dropped: half,
    })
}

/// Returns whether a file was actually removed
fn delete_file(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
