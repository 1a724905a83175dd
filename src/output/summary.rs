//! Overall JSON summary across organizations

use crate::crawler::CrawlReport;
use crate::state::CrawlState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Totals across all organizations in one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryTotals {
    pub organizations: usize,
    pub completed: usize,
    pub paused: usize,
    pub failed: usize,
    pub requests_attempted: u64,
    pub requests_succeeded: u64,
    pub pages_saved: u64,
    pub documents_saved: u64,
    pub links_extracted: u64,
}

impl SummaryTotals {
    pub fn from_reports(reports: &[CrawlReport]) -> Self {
        let mut totals = Self {
            organizations: reports.len(),
            ..Default::default()
        };
        for report in reports {
            match report.state {
                CrawlState::Completed => totals.completed += 1,
                CrawlState::Paused => totals.paused += 1,
                CrawlState::Failed => totals.failed += 1,
                CrawlState::Idle | CrawlState::Running => {}
            }
            totals.requests_attempted += report.stats.requests_attempted;
            totals.requests_succeeded += report.stats.requests_succeeded;
            totals.pages_saved += report.stats.pages_saved;
            totals.documents_saved += report.stats.documents_saved;
            totals.links_extracted += report.stats.links_extracted;
        }
        totals
    }
}

#[derive(Debug, Serialize)]
struct OverallSummary<'a> {
    generated_at: DateTime<Utc>,
    config_hash: &'a str,
    totals: SummaryTotals,
    organizations: &'a [CrawlReport],
}

/// Path of the overall summary inside the data directory
pub fn summary_path(data_dir: &Path) -> PathBuf {
    data_dir.join("metadata").join("overall_stats.json")
}

/// Writes `<data-dir>/metadata/overall_stats.json`, replacing any previous one
///
/// # Returns
///
/// The path written
pub fn write_overall_summary(
    data_dir: &Path,
    config_hash: &str,
    reports: &[CrawlReport],
) -> std::io::Result<PathBuf> {
    let path = summary_path(data_dir);
    let dir = path.parent().unwrap_or(data_dir);
    fs::create_dir_all(dir)?;

    let summary = OverallSummary {
        generated_at: Utc::now(),
        config_hash,
        totals: SummaryTotals::from_reports(reports),
        organizations: reports,
    };

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, &summary)?;
        writer.flush()?;
    }
    tmp.persist(&path).map_err(|e| e.error)?;

    tracing::info!("Overall statistics saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_reports() -> Vec<CrawlReport> {
        let mut done = CrawlReport::failed("Done", "unused");
        done.state = CrawlState::Completed;
        done.error = None;
        done.stats.requests_attempted = 4;
        done.stats.pages_saved = 3;

        vec![done, CrawlReport::failed("Broken", "no client")]
    }

    #[test]
    fn test_totals() {
        let totals = SummaryTotals::from_reports(&create_test_reports());
        assert_eq!(totals.organizations, 2);
        assert_eq!(totals.completed, 1);
        assert_eq!(totals.failed, 1);
        assert_eq!(totals.requests_attempted, 4);
        assert_eq!(totals.pages_saved, 3);
    }

    #[test]
    fn test_write_overall_summary() {
        let dir = TempDir::new().unwrap();
        let path = write_overall_summary(dir.path(), "abc123", &create_test_reports()).unwrap();
        assert_eq!(path, dir.path().join("metadata/overall_stats.json"));

        let json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(json["config_hash"], "abc123");
        assert_eq!(json["totals"]["failed"], 1);
        assert_eq!(json["organizations"][1]["organization"], "Broken");
        assert_eq!(json["organizations"][1]["error"], "no client");
    }
}
