//! Formatted output helpers for CLI commands.

use mqfixture::CleanupReport;

/// Prints the outcome of a cleanup, one line per failed step.
pub fn print_report(report: &CleanupReport) {
    if report.is_clean() {
        println!("cleanup complete");
        return;
    }
    for failure in report.failures() {
        println!("{:<20} {}", failure.step, failure.error);
    }
}
