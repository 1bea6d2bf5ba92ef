//! Fatal pipeline errors.
//!
//! Per-item failures (one package, one file) never surface here; they are collected
//! in a [`BatchReport`](crate::package::BatchReport) and the loop continues.

use std::path::PathBuf;

/// Conditions that stop the whole run.
#[derive(Debug)]
pub enum BundleError {
    /// No distribution folder matched the expected name prefix.
    DistributionNotFound { pattern: String },
    /// More than one distribution folder matched the expected name prefix.
    AmbiguousDistribution { pattern: String, matches: Vec<PathBuf> },
    /// The interpreter folder inside a distribution could not be resolved to one directory.
    InterpreterNotFound { root: PathBuf, matches: usize },
    /// The installer template does not exist.
    TemplateNotFound(PathBuf),
}

impl std::fmt::Display for BundleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BundleError::DistributionNotFound { pattern } => {
                write!(f, "No distribution folder matches {}", pattern)
            }
            BundleError::AmbiguousDistribution { pattern, matches } => {
                write!(
                    f,
                    "Expected exactly one distribution folder matching {}, found {}: {:?}",
                    pattern,
                    matches.len(),
                    matches
                )
            }
            BundleError::InterpreterNotFound { root, matches } => {
                write!(
                    f,
                    "Expected exactly one interpreter folder in {:?}, found {}",
                    root, matches
                )
            }
            BundleError::TemplateNotFound(path) => {
                write!(f, "Installer template not found: {:?}", path)
            }
        }
    }
}

impl std::error::Error for BundleError {}
