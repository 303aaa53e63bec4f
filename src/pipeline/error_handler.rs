use log::{info, warn};

use crate::types::RunReport;
use crate::utils::config::ReportConsts;
use crate::utils::logger::Colors;

/// Log the final counts of a run. Call once the collection is complete.
pub fn report_run_summary(report: &RunReport, unique_keys: usize) {
    info!(
        "{} of {} items processed: {}, {} unique keys, {}",
        report.items_attempted,
        report.items_total,
        Colors::colorize(
            Colors::RECORDS,
            &format!("{} records", report.records_produced)
        ),
        unique_keys,
        Colors::colorize(
            Colors::DUPLICATES,
            &format!("{} duplicate keys", report.duplicate_keys)
        )
    );
    if report.fetch_failures > 0 || report.decode_failures > 0 || report.panicked_items > 0 {
        let skipped = format!(
            "Skipped {} items (fetch failed), {} items (panicked) and {} fragments (decode failed)",
            report.fetch_failures, report.panicked_items, report.decode_failures
        );
        warn!("{}", Colors::colorize(Colors::SKIPPED, &skipped));
    }
    if !report.is_complete() {
        warn!(
            "Run truncated: {} of {} items dispatched, {} attempted{}",
            report.items_dispatched,
            report.items_total,
            report.items_attempted,
            if report.cancelled { " (cancelled)" } else { "" }
        );
    }
}

/// Print the skipped list to stderr, capped at [`ReportConsts::SKIPPED_LIST_LIMIT`] lines.
pub fn print_skipped(report: &RunReport) {
    let limit = ReportConsts::SKIPPED_LIST_LIMIT;
    for s in report.skipped.iter().take(limit) {
        eprintln!("  skipped: {}", s);
    }
    if report.skipped.len() > limit {
        eprintln!("  ... and {} more", report.skipped.len() - limit);
    }
}
