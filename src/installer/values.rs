use anyhow::Result;
use log::warn;
use std::path::Path;

use crate::layout::{Arch, BundleLayout, Distribution, PathResolver, PathResult, PerArch};
use crate::manifest::manifest_name;
use crate::runtime::Runtime;

/// Installer icon shipped with hyperspy, relative to a distribution root.
pub const ICON_PATTERN: &str = "python-*/Lib/site-packages/hyperspy/data/hyperspy_bundle_installer.ico";

/// Token values for one architecture's installer script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitutions {
    pub arch: Arch,
    pub version: String,
    pub winpython_path: String,
    pub python_folder: String,
    pub install_log: String,
    pub nsis_plugins: String,
    /// `None` when the icon is not installed in this distribution.
    pub icon: Option<String>,
}

impl Substitutions {
    #[tracing::instrument(skip(runtime, dist), fields(arch = %dist.arch))]
    pub fn resolve<R: Runtime>(
        runtime: &R,
        dist: &Distribution,
        version: &str,
        nsis_plugins: &Path,
    ) -> Result<Self> {
        let icon = match PathResolver::new(runtime).resolve(&dist.root, ICON_PATTERN)? {
            PathResult::Single(path) => Some(path.display().to_string()),
            other => {
                warn!(
                    "Expected one installer icon in WinPython {}, found {}",
                    dist.arch,
                    other.len()
                );
                None
            }
        };

        Ok(Self {
            arch: dist.arch,
            version: version.to_string(),
            winpython_path: dist.root.display().to_string(),
            python_folder: dist.python_folder_name(),
            install_log: manifest_name(dist.arch, version),
            nsis_plugins: nsis_plugins.display().to_string(),
            icon,
        })
    }

    pub fn resolve_all<R: Runtime>(
        runtime: &R,
        layout: &BundleLayout,
        version: &str,
        nsis_plugins: &Path,
    ) -> Result<PerArch<Self>> {
        Ok(PerArch {
            x86: Self::resolve(runtime, &layout.distributions.x86, version, nsis_plugins)?,
            x64: Self::resolve(runtime, &layout.distributions.x64, version, nsis_plugins)?,
        })
    }
}
