//! Per-organization DEBUG log files
//!
//! [`OrganizationLog`] is installed once as a `tracing` writer. Events are
//! dropped until [`OrganizationLog::start`] opens a file for an organization,
//! and go to that file until [`OrganizationLog::finish`].

use crate::checkpoint::sanitize_name;
use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::Subscriber;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, Layer};

/// Shared handle to the current organization's log file
#[derive(Debug, Clone, Default)]
pub struct OrganizationLog {
    file: Arc<Mutex<Option<File>>>,
}

impl OrganizationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `<log_dir>/<org>_<timestamp>.log` and directs events to it
    ///
    /// # Returns
    ///
    /// The path of the new log file
    pub fn start(&self, log_dir: &Path, organization: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!(
            "{}_{}.log",
            sanitize_name(organization),
            Utc::now().format("%Y%m%d_%H%M%S")
        ));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        if let Some(mut previous) = self.lock().replace(file) {
            previous.flush()?;
        }
        Ok(path)
    }

    /// Flushes and closes the current file; later events are dropped
    pub fn finish(&self) {
        if let Some(mut file) = self.lock().take() {
            if let Err(e) = file.flush() {
                eprintln!("Failed to flush log file: {}", e);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for OrganizationLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(file) = self.lock().as_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.lock().as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for OrganizationLog {
    type Writer = OrganizationLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Formatting layer writing this crate's DEBUG events (and other crates'
/// warnings) to `log`, independent of the console filter
pub fn organization_log_layer<S>(log: OrganizationLog) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let targets = Targets::new()
        .with_target("orgcrawl", LevelFilter::DEBUG)
        .with_default(LevelFilter::WARN);

    fmt::layer()
        .with_ansi(false)
        .with_writer(log)
        .with_filter(targets)
}
