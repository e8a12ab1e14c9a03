//! Per-batch status output

use colored::Colorize;
use pot_xcm::{BatchOutcome, ProvisionReport};

/// Dry-run batches go to stdout as hex; submission statuses go to stderr
pub fn print_report(report: &ProvisionReport) {
    for entry in &report.batches {
        let batch = &entry.batch;
        let label = format!("batch {} ({} intents)", batch.index, batch.intents.len());
        match &entry.outcome {
            BatchOutcome::Planned => println!("batch {}: {}", batch.index, batch.call_hex()),
            BatchOutcome::Succeeded(result) => eprintln!(
                "{} {}: {:?} in {}",
                "✓".green(),
                label,
                result.status,
                result.block_hash.as_deref().unwrap_or("unknown block")
            ),
            BatchOutcome::Failed(e) => eprintln!("{} {}: {}", "✗".red(), label, e),
            BatchOutcome::NotAttempted => eprintln!("{} {}: not attempted", "-".yellow(), label),
            BatchOutcome::Cancelled => eprintln!("{} {}: cancelled", "-".yellow(), label),
        }
    }

    if report.is_success() {
        return;
    }
    let last = report
        .last_confirmed()
        .map_or_else(|| "none".to_string(), |i| i.to_string());
    if let Some(failed) = report.first_failed() {
        eprintln!(
            "{}",
            format!(
                "SubmissionError: batch {} failed; last confirmed batch: {}",
                failed.batch.index, last
            )
            .red()
        );
    } else if report.was_cancelled() {
        eprintln!(
            "{}",
            format!("cancelled; last confirmed batch: {}", last).yellow()
        );
    }
}
