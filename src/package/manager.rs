use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{PackageRecord, parse_metadata};
use crate::layout::Distribution;
use crate::process::CommandRunner;
use crate::runtime::Runtime;

/// Package management inside one distribution.
///
/// Every call may fail on its own; callers treat a failure as affecting that item only.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Metadata locations of every installed package, in a stable order.
    fn package_sources(&self, dist: &Distribution) -> Result<Vec<PathBuf>>;

    /// Read one package record from a location returned by `package_sources`.
    fn read_package(&self, source: &Path) -> Result<PackageRecord>;

    async fn install_package(&self, dist: &Distribution, artifact: &Path) -> Result<()>;

    async fn uninstall_package(&self, dist: &Distribution, package: &PackageRecord) -> Result<()>;
}

/// Reads installed packages from `site-packages` metadata and delegates changes to
/// `pip`, run with the distribution's own interpreter.
pub struct PipPackageManager<'a, R: Runtime, C: CommandRunner> {
    runtime: &'a R,
    runner: &'a C,
    python_exe: String,
}

impl<'a, R: Runtime, C: CommandRunner> PipPackageManager<'a, R, C> {
    pub fn new(runtime: &'a R, runner: &'a C, python_exe: impl Into<String>) -> Self {
        Self {
            runtime,
            runner,
            python_exe: python_exe.into(),
        }
    }

    fn site_packages(dist: &Distribution) -> PathBuf {
        dist.python_dir.join("Lib").join("site-packages")
    }

    async fn pip(&self, dist: &Distribution, args: &[&str]) -> Result<()> {
        let python = dist.python_dir.join(&self.python_exe).display().to_string();
        let mut full_args = vec!["-m".to_string(), "pip".to_string()];
        full_args.extend(args.iter().map(|a| a.to_string()));

        let status = self.runner.run(&python, &full_args).await?;
        if !status.success() {
            bail!("pip {} failed with {}", args.join(" "), status);
        }
        Ok(())
    }
}

#[async_trait]
impl<R: Runtime, C: CommandRunner> PackageManager for PipPackageManager<'_, R, C> {
    #[tracing::instrument(skip(self, dist))]
    fn package_sources(&self, dist: &Distribution) -> Result<Vec<PathBuf>> {
        let site_packages = Self::site_packages(dist);
        if !self.runtime.exists(&site_packages) {
            return Ok(Vec::new());
        }

        let mut sources: Vec<PathBuf> = self
            .runtime
            .read_dir(&site_packages)?
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".dist-info") || n.ends_with(".egg-info"))
            })
            .collect();
        sources.sort();
        Ok(sources)
    }

    #[tracing::instrument(skip(self))]
    fn read_package(&self, source: &Path) -> Result<PackageRecord> {
        let metadata_file = if self.runtime.is_dir(source) {
            let is_wheel = source
                .extension()
                .is_some_and(|ext| ext == "dist-info");
            source.join(if is_wheel { "METADATA" } else { "PKG-INFO" })
        } else {
            source.to_path_buf()
        };

        let content = self
            .runtime
            .read_to_string(&metadata_file)
            .with_context(|| format!("Failed to read package metadata {:?}", metadata_file))?;
        let (name, version) = parse_metadata(&content)
            .with_context(|| format!("Malformed package metadata {:?}", metadata_file))?;

        Ok(PackageRecord {
            name,
            version,
            source: source.to_path_buf(),
        })
    }

    #[tracing::instrument(skip(self, dist))]
    async fn install_package(&self, dist: &Distribution, artifact: &Path) -> Result<()> {
        let artifact = artifact.display().to_string();
        self.pip(dist, &["install", "--no-deps", &artifact]).await
    }

    #[tracing::instrument(skip(self, dist, package), fields(name = %package.name))]
    async fn uninstall_package(&self, dist: &Distribution, package: &PackageRecord) -> Result<()> {
        self.pip(dist, &["uninstall", "-y", &package.name]).await
    }
}
