//! Checkpoint persistence
//!
//! A checkpoint is a single self-describing JSON file holding the frontier
//! snapshot, the crawl statistics and the time it was written. Saves go
//! through a temporary file in the same directory followed by a rename, so
//! a crash mid-save leaves the previous checkpoint intact.

use crate::crawler::CrawlStatsSnapshot;
use crate::frontier::{Frontier, FrontierSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Format marker written into every checkpoint
pub const CHECKPOINT_FORMAT: &str = "orgcrawl-checkpoint";

/// Current checkpoint schema version
pub const CHECKPOINT_VERSION: u32 = 1;

/// Checkpoint errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("no checkpoint at {0}")]
    NotFound(PathBuf),

    #[error("corrupt checkpoint {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("checkpoint {path} has unsupported version {version}")]
    UnsupportedVersion { path: PathBuf, version: u32 },

    #[error("checkpoint I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode checkpoint: {0}")]
    Encode(#[from] serde_json::Error),
}

/// On-disk checkpoint document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub format: String,
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub frontier: FrontierSnapshot,
    #[serde(default)]
    pub stats: CrawlStatsSnapshot,
}

impl Checkpoint {
    pub fn new(frontier: FrontierSnapshot, stats: CrawlStatsSnapshot) -> Self {
        Self {
            format: CHECKPOINT_FORMAT.to_string(),
            version: CHECKPOINT_VERSION,
            saved_at: Utc::now(),
            frontier,
            stats,
        }
    }
}

/// Minimal view used to check format and version before a full decode
#[derive(Deserialize)]
struct Header {
    #[serde(default)]
    format: String,
    #[serde(default)]
    version: u32,
}

/// Writes a checkpoint of the frontier and statistics to `path`
///
/// The parent directory is created if needed.
///
/// # Returns
///
/// The timestamp recorded in the checkpoint
pub fn save(
    frontier: &Frontier,
    stats: CrawlStatsSnapshot,
    path: &Path,
) -> Result<DateTime<Utc>, CheckpointError> {
    let checkpoint = Checkpoint::new(frontier.export_state(), stats);
    write_checkpoint(&checkpoint, path)?;

    tracing::debug!(
        "Saved checkpoint to {} ({} pending, {} visited)",
        path.display(),
        checkpoint.frontier.pending.len(),
        checkpoint.frontier.visited.len()
    );

    Ok(checkpoint.saved_at)
}

/// Atomically writes an already built checkpoint
pub fn write_checkpoint(checkpoint: &Checkpoint, path: &Path) -> Result<(), CheckpointError> {
    let io_err = |source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_err)?;

    let tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, checkpoint)?;
        writer.flush().map_err(io_err)?;
    }
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    Ok(())
}

/// Reads the checkpoint at `path`
///
/// # Returns
///
/// * `Ok(Checkpoint)` - The decoded checkpoint
/// * `Err(NotFound)` - No file exists; the caller starts fresh
/// * `Err(Corrupt)` - The file exists but is not a readable checkpoint
/// * `Err(UnsupportedVersion)` - Written by a newer schema
pub fn load(path: &Path) -> Result<Checkpoint, CheckpointError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CheckpointError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(CheckpointError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let corrupt = |reason: String| CheckpointError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    let header: Header = serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;
    if header.format != CHECKPOINT_FORMAT {
        return Err(corrupt(format!("unknown format marker '{}'", header.format)));
    }
    if header.version == 0 || header.version > CHECKPOINT_VERSION {
        return Err(CheckpointError::UnsupportedVersion {
            path: path.to_path_buf(),
            version: header.version,
        });
    }

    serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))
}

/// Deletes the checkpoint at `path`; a missing file is not an error
///
/// # Returns
///
/// True if a file was removed
pub fn discard(path: &Path) -> Result<bool, CheckpointError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Path of an organization's checkpoint file inside `dir`
pub fn checkpoint_path(dir: &Path, organization: &str) -> PathBuf {
    dir.join(format!("{}.checkpoint.json", sanitize_name(organization)))
}

/// Reduces a name to characters safe for a file name
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "organization".to_string()
    } else {
        cleaned
    }
}
