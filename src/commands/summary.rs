use crate::manifest::RecordedManifest;
use crate::package::{BatchReport, RemovalReport};

/// Print one step's outcome, listing every failed item.
pub(crate) fn print_batch(step: &str, batch: &BatchReport) {
    println!(
        "{}: {} succeeded, {} failed",
        step,
        batch.succeeded.len(),
        batch.failed.len()
    );
    for (item, message) in &batch.failed {
        println!("  FAILED {}: {}", item, message);
    }
}

pub(crate) fn print_removals(reports: &[RemovalReport]) {
    for report in reports {
        println!(
            "WinPython {}: keeping {} packages, removing {}",
            report.arch,
            report.kept.len(),
            report.marked.len()
        );
        for (source, message) in &report.lookup_failures {
            println!("  unreadable {}: {}", source.display(), message);
        }
    }
}

pub(crate) fn print_manifest(manifest: &RecordedManifest) {
    println!(
        "Wrote {} ({} folders, {} files, {} purged)",
        manifest.path.display(),
        manifest.folders,
        manifest.files,
        manifest.purged.len()
    );
}
