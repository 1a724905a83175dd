//! Human-readable crawl reports on stdout

use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::crawler::CrawlReport;

/// Prints one organization's final report
pub fn print_report(report: &CrawlReport) {
    println!("=== {} ===", report.organization);
    println!("  State: {}", report.state);
    if let Some(error) = &report.error {
        println!("  Error: {}", error);
    }
    if let Some(resumed_from) = report.resumed_from {
        println!("  Resumed from checkpoint: {}", resumed_from.to_rfc3339());
    }
    println!("  Duration: {}s", report.duration_secs());
    println!();

    let stats = &report.stats;
    println!("Requests:");
    println!("  Attempted: {}", stats.requests_attempted);
    println!("  Succeeded: {}", stats.requests_succeeded);
    println!("  Failed: {}", stats.requests_failed);
    println!("  Denied by robots.txt: {}", stats.robots_denied);
    println!();

    println!("Content:");
    println!("  Pages processed: {}", stats.pages_processed);
    println!("  Pages saved: {}", stats.pages_saved);
    println!("  Documents saved: {}", stats.documents_saved);
    println!("  Links extracted: {}", stats.links_extracted);
    if stats.storage_errors > 0 {
        println!("  Storage errors: {}", stats.storage_errors);
    }
    println!();

    let frontier = &report.frontier;
    println!("Frontier:");
    println!("  Queued: {}", frontier.queued);
    println!("  Visited: {}", frontier.visited);
    println!("  Failed: {}", frontier.failed);
    println!("  Skipped: {}", frontier.skipped);
    println!("  Duplicates: {}", frontier.duplicates);
    println!("  Still pending: {}", report.pending);
    println!();
}

/// Prints what a saved checkpoint holds, for `--stats`
pub fn print_checkpoint_summary(
    organization: &str,
    checkpoint: &Result<Checkpoint, CheckpointError>,
) {
    println!("=== {} ===", organization);

    let checkpoint = match checkpoint {
        Ok(checkpoint) => checkpoint,
        Err(CheckpointError::NotFound(path)) => {
            println!("  No checkpoint at {}", path.display());
            println!();
            return;
        }
        Err(e) => {
            println!("  Unreadable checkpoint: {}", e);
            println!();
            return;
        }
    };

    let frontier = &checkpoint.frontier;
    println!("  Saved at: {}", checkpoint.saved_at.to_rfc3339());
    if let Some(scope) = &frontier.scope {
        println!(
            "  Scope: {} (depth {}, {} pages)",
            scope.base_domain, scope.max_depth, scope.max_pages
        );
    }
    println!("  Pending: {}", frontier.pending.len());
    println!("  Visited: {}", frontier.visited.len());
    println!("  Failed: {}", frontier.failed.len());
    println!(
        "  Requests: {} attempted, {} succeeded",
        checkpoint.stats.requests_attempted, checkpoint.stats.requests_succeeded
    );
    println!("  Documents saved: {}", checkpoint.stats.documents_saved);

    if !frontier.failed.is_empty() {
        println!("  Recent failures:");
        for (url, error) in frontier.failed.iter().take(5) {
            println!("    {} ({})", url, error);
        }
    }
    println!();
}
