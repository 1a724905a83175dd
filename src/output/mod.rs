//! Output module for crawl reports and summaries
//!
//! This module handles:
//! - Printing per-organization reports
//! - Printing checkpoint contents for `--stats`
//! - Writing the overall JSON summary
//! - Per-organization DEBUG log files

mod log_file;
mod report;
mod summary;

pub use log_file::{organization_log_layer, OrganizationLog};
pub use report::{print_checkpoint_summary, print_report};
pub use summary::{summary_path, write_overall_summary, SummaryTotals};
