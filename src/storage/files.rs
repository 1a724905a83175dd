//! File-backed storage with a SQLite index
//!
//! Layout for one session:
//!
//! ```text
//! <data-dir>/raw/<org>/<session>/pages/...
//! <data-dir>/raw/<org>/<session>/documents/...
//! <data-dir>/raw/<org>/<session>/index.sqlite
//! <data-dir>/raw/<org>/<session>/links.json
//! <data-dir>/raw/<org>/<session>/metadata.json
//! ```

use crate::checkpoint::sanitize_name;
use crate::crawler::{CrawlReport, ExtractedLink, PageMetadata};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Longest file stem derived from a URL path
const MAX_STEM_LEN: usize = 200;

/// Counters kept by the store itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    pub pages_saved: u64,
    pub documents_saved: u64,
    pub duplicate_content: u64,
    pub links_recorded: u64,
}

/// One row of `links.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRecord {
    pub source_url: String,
    pub target_url: String,
    pub anchor_text: String,
    pub link_type: String,
    pub discovered_at: String,
}

#[derive(Debug, Serialize)]
struct SessionMetadata<'a> {
    organization: &'a str,
    session: &'a str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    storage: &'a StorageStats,
    report: &'a CrawlReport,
    paths: SessionPaths,
}

#[derive(Debug, Serialize)]
struct SessionPaths {
    session_dir: PathBuf,
    pages_dir: PathBuf,
    documents_dir: PathBuf,
    index: PathBuf,
    links_file: PathBuf,
}

/// Saves pages and documents as files and indexes them in SQLite
pub struct FileStore {
    organization: String,
    session: String,
    started_at: DateTime<Utc>,
    session_dir: PathBuf,
    check_content_hash: bool,
    conn: Option<Connection>,
    content_hashes: HashSet<String>,
    stats: StorageStats,
}

impl FileStore {
    /// Creates a store for one organization's session
    ///
    /// Nothing touches the disk until [`Storage::initialize`].
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Root output directory
    /// * `organization` - Organization name, sanitized for the path
    /// * `check_content_hash` - Skip pages whose bytes were already saved
    pub fn new(data_dir: &Path, organization: &str, check_content_hash: bool) -> Self {
        let started_at = Utc::now();
        let session = started_at.format("%Y%m%d_%H%M%S").to_string();
        let session_dir = data_dir
            .join("raw")
            .join(sanitize_name(organization))
            .join(&session);

        Self {
            organization: organization.to_string(),
            session,
            started_at,
            session_dir,
            check_content_hash,
            conn: None,
            content_hashes: HashSet::new(),
            stats: StorageStats::default(),
        }
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.session_dir.join("pages")
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.session_dir.join("documents")
    }

    fn index_path(&self) -> PathBuf {
        self.session_dir.join("index.sqlite")
    }

    fn links_path(&self) -> PathBuf {
        self.session_dir.join("links.json")
    }

    fn metadata_path(&self) -> PathBuf {
        self.session_dir.join("metadata.json")
    }

    pub fn stats(&self) -> &StorageStats {
        &self.stats
    }

    fn conn(&self) -> StorageResult<&Connection> {
        self.conn.as_ref().ok_or(StorageError::NotInitialized)
    }

    /// Returns true (and counts it) if these bytes were saved before
    ///
    /// Hashes are only remembered once a save succeeds, so content whose
    /// save failed is tried again when it turns up elsewhere.
    fn is_duplicate_content(&mut self, hash: &str) -> bool {
        if self.content_hashes.contains(hash) {
            self.stats.duplicate_content += 1;
            return true;
        }
        false
    }

    /// Reads every recorded link, in insertion order
    pub fn load_links(&self) -> StorageResult<Vec<LinkRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT source_url, target_url, anchor_text, link_type, discovered_at
             FROM links ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(LinkRecord {
                source_url: row.get(0)?,
                target_url: row.get(1)?,
                anchor_text: row.get(2)?,
                link_type: row.get(3)?,
                discovered_at: row.get(4)?,
            })
        })?;

        let mut links = Vec::new();
        for row in rows {
            links.push(row?);
        }
        Ok(links)
    }
}

impl Storage for FileStore {
    fn initialize(&mut self) -> StorageResult<()> {
        fs::create_dir_all(self.pages_dir())?;
        fs::create_dir_all(self.documents_dir())?;

        let conn = Connection::open(self.index_path())?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        initialize_schema(&conn)?;
        self.conn = Some(conn);

        tracing::info!(
            "Storage initialized for {} at {}",
            self.organization,
            self.session_dir.display()
        );
        Ok(())
    }

    fn save_page(
        &mut self,
        url: &str,
        bytes: &[u8],
        encoding: &str,
        metadata: &PageMetadata,
    ) -> StorageResult<Option<PathBuf>> {
        self.conn()?;

        let hash = content_hash(bytes);
        if self.check_content_hash && self.is_duplicate_content(&hash) {
            tracing::debug!("Duplicate content not saved: {}", url);
            return Ok(None);
        }

        let path = self.pages_dir().join(url_to_filename(url, ".html"));
        fs::write(&path, bytes)?;

        self.conn()?.execute(
            "INSERT OR REPLACE INTO pages
                (url, path, size_bytes, encoding, title, description, content_hash, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                url,
                path.to_string_lossy(),
                bytes.len() as i64,
                encoding,
                metadata.title,
                metadata.description,
                hash,
                Utc::now().to_rfc3339(),
            ],
        )?;

        if self.check_content_hash {
            self.content_hashes.insert(hash);
        }
        self.stats.pages_saved += 1;
        tracing::debug!("Saved page: {}", path.display());
        Ok(Some(path))
    }

    fn save_document(
        &mut self,
        url: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> StorageResult<Option<PathBuf>> {
        self.conn()?;

        let hash = content_hash(bytes);
        if self.is_duplicate_content(&hash) {
            tracing::debug!("Duplicate document not saved: {}", url);
            return Ok(None);
        }

        let extension = document_extension(url, content_type);
        let path = self
            .documents_dir()
            .join(url_to_filename(url, &extension));
        fs::write(&path, bytes)?;

        self.conn()?.execute(
            "INSERT OR REPLACE INTO documents
                (url, path, size_bytes, content_type, content_hash, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                url,
                path.to_string_lossy(),
                bytes.len() as i64,
                content_type,
                hash,
                Utc::now().to_rfc3339(),
            ],
        )?;

        self.content_hashes.insert(hash);
        self.stats.documents_saved += 1;
        tracing::info!("Saved document: {}", path.display());
        Ok(Some(path))
    }

    fn add_links(&mut self, source_url: &str, links: &[ExtractedLink]) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.as_mut().ok_or(StorageError::NotInitialized)?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO links
                    (source_url, target_url, anchor_text, link_type, discovered_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for link in links {
                inserted += stmt.execute(params![
                    source_url,
                    link.url,
                    link.anchor_text,
                    link.kind.as_str(),
                    now,
                ])?;
            }
        }
        tx.commit()?;

        self.stats.links_recorded += inserted as u64;
        Ok(())
    }

    fn finalize(&mut self, report: &CrawlReport) -> StorageResult<()> {
        if self.conn.is_none() {
            // initialize() failed, nothing was written
            return Ok(());
        }

        let links = self.load_links()?;
        fs::write(self.links_path(), serde_json::to_vec_pretty(&links)?)?;
        tracing::info!("Saved {} links to {}", links.len(), self.links_path().display());

        let metadata = SessionMetadata {
            organization: &self.organization,
            session: &self.session,
            started_at: self.started_at,
            finished_at: Utc::now(),
            storage: &self.stats,
            report,
            paths: SessionPaths {
                session_dir: self.session_dir.clone(),
                pages_dir: self.pages_dir(),
                documents_dir: self.documents_dir(),
                index: self.index_path(),
                links_file: self.links_path(),
            },
        };
        fs::write(self.metadata_path(), serde_json::to_vec_pretty(&metadata)?)?;

        tracing::info!(
            "Storage finalized: {} pages, {} documents, {} duplicates",
            self.stats.pages_saved,
            self.stats.documents_saved,
            self.stats.duplicate_content
        );
        Ok(())
    }
}

/// Hex SHA-256 of content, used for duplicate detection
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Converts a URL into a unique, filesystem-safe file name
///
/// The URL path becomes the stem (slashes to underscores), followed by the
/// first 8 hex characters of the URL's SHA-256 and the extension.
pub fn url_to_filename(url: &str, extension: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_default();

    let mut stem = sanitize_filename(&path.trim_matches('/').replace('/', "_"));
    if stem.is_empty() {
        stem = "index".to_string();
    }
    if let Some(stripped) = stem.strip_suffix(extension) {
        stem = stripped.to_string();
    }
    if stem.is_empty() {
        stem = "index".to_string();
    }

    let url_hash = &content_hash(url.as_bytes())[..8];
    format!("{}_{}{}", stem, url_hash, extension)
}

/// Replaces characters that are unsafe in file names and caps the length
fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    replaced
        .trim_matches(|c| c == '.' || c == ' ')
        .chars()
        .take(MAX_STEM_LEN)
        .collect()
}

/// Picks a document extension from the URL, then the content type
pub fn document_extension(url: &str, content_type: &str) -> String {
    let from_url = Url::parse(url).ok().and_then(|u| {
        let last = u.path_segments()?.last()?.to_lowercase();
        let (_, ext) = last.rsplit_once('.')?;
        if ext.is_empty() || ext.len() > 5 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            None
        } else {
            Some(format!(".{}", ext))
        }
    });

    if let Some(ext) = from_url {
        return ext;
    }

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    match mime.as_str() {
        "application/pdf" => ".pdf",
        "application/msword" => ".doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => ".docx",
        "application/vnd.ms-excel" => ".xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => ".xlsx",
        _ => ".bin",
    }
    .to_string()
}
