//! Subcommand entry points.
//!
//! Each function discovers the bundle layout, runs one pipeline step and prints a
//! summary. Per-item failures end up in the returned [`BatchReport`](crate::package::BatchReport);
//! only fatal conditions are returned as errors.

mod bundle;
pub mod config;
mod curate;
mod record;
mod summary;

pub use bundle::{BundleOptions, bundle};
pub use config::{Config, GlobalOptions};
pub use curate::{install, install_local, prune, remove_tools, run_tests};
pub use record::{installers, license, manifest};

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::BundleConfig;
    use crate::http::HttpClient;
    use crate::process::MockCommandRunner;
    use crate::runtime::RealRuntime;
    use crate::version::FixedVersion;
    use std::path::Path;

    /// A real-filesystem config rooted at `root`, at version 0.8.1, with a mocked runner.
    pub(crate) fn test_config(root: &Path, runner: MockCommandRunner) -> Config<RealRuntime, MockCommandRunner> {
        Config {
            runtime: RealRuntime,
            runner,
            http: HttpClient::new(reqwest::Client::new()),
            versions: Box::new(FixedVersion("0.8.1".into())),
            root: root.to_path_buf(),
            bundle: BundleConfig::default(),
        }
    }
}
