//! Glob pattern expansion.

use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn glob_impl(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let entries = ::glob::glob(pattern)
            .with_context(|| format!("Invalid glob pattern: {}", pattern))?;

        let mut matches = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => matches.push(path),
                // Unreadable directories are skipped, like a shell glob does.
                Err(e) => debug!("Skipping unreadable glob entry: {}", e),
            }
        }
        matches.sort();
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime, glob_pattern_under};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_glob_matches_sorted() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("QtDesigner.exe"), "").unwrap();
        fs::write(dir.path().join("Qt Assistant.exe"), "").unwrap();
        fs::write(dir.path().join("README.txt"), "").unwrap();

        let pattern = glob_pattern_under(dir.path(), "Qt*").unwrap();
        let matches = runtime.glob(&pattern).unwrap();

        assert_eq!(matches.len(), 2);
        assert!(matches[0].ends_with("Qt Assistant.exe"));
        assert!(matches[1].ends_with("QtDesigner.exe"));
    }

    #[test]
    fn test_glob_no_match_is_empty() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();

        let pattern = glob_pattern_under(dir.path(), "TortoiseHg*").unwrap();
        assert!(runtime.glob(&pattern).unwrap().is_empty());
    }

    #[test]
    fn test_glob_invalid_pattern() {
        let runtime = RealRuntime;
        assert!(runtime.glob("[").is_err());
    }
}
