//! Home directory and current-directory operations.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn home_dir_impl(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn absolute_impl(&self, path: &Path) -> Result<PathBuf> {
        std::path::absolute(path).with_context(|| format!("Failed to make {:?} absolute", path))
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};
    use std::path::Path;

    #[test]
    fn test_real_runtime_home_dir() {
        let runtime = RealRuntime;

        let home = runtime.home_dir();
        assert!(home.is_some() || cfg!(target_os = "linux")); // CI might not have home
    }

    #[test]
    fn test_real_runtime_absolute() {
        let runtime = RealRuntime;

        let abs = runtime.absolute(Path::new("bundle")).unwrap();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("bundle"));
    }
}
