//! Bringing both distributions down to the curated package set.

use anyhow::Result;
use log::{debug, info, warn};
use std::path::PathBuf;

use super::{AllowList, BatchReport, PackageAliases, PackageManager, PackageRecord};
use crate::layout::{Arch, BundleLayout, Distribution, PathResolver};
use crate::process::{CommandRunner, Launcher};
use crate::runtime::Runtime;

/// Bundled tools the curated distribution does not ship, relative to a distribution root.
const TOOL_PATTERNS: [&str; 2] = ["Qt*", "TortoiseHg*"];
const TOOL_DIRS: [&str; 1] = ["tools/TortoiseHg"];

/// Packages of one distribution, split by the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalReport {
    pub arch: Arch,
    pub marked: Vec<PackageRecord>,
    pub kept: Vec<String>,
    /// Metadata locations that could not be read, with the reason.
    pub lookup_failures: Vec<(PathBuf, String)>,
}

impl RemovalReport {
    pub fn marked_names(&self) -> Vec<&str> {
        self.marked.iter().map(|p| p.name.as_str()).collect()
    }
}

pub struct Curator<'a, R: Runtime, M: PackageManager, C: CommandRunner> {
    runtime: &'a R,
    manager: &'a M,
    runner: &'a C,
    allow_list: &'a AllowList,
    aliases: Option<&'a PackageAliases>,
    launcher: &'a Launcher,
}

impl<'a, R: Runtime, M: PackageManager, C: CommandRunner> Curator<'a, R, M, C> {
    pub fn new(
        runtime: &'a R,
        manager: &'a M,
        runner: &'a C,
        allow_list: &'a AllowList,
        launcher: &'a Launcher,
    ) -> Self {
        Self {
            runtime,
            manager,
            runner,
            allow_list,
            aliases: None,
            launcher,
        }
    }

    /// Also keep packages whose metadata name `aliases` maps to an allow-listed name.
    pub fn with_aliases(mut self, aliases: &'a PackageAliases) -> Self {
        self.aliases = Some(aliases);
        self
    }

    fn is_needed(&self, name: &str) -> bool {
        match self.aliases {
            Some(aliases) => self.allow_list.keeps(name, aliases),
            None => self.allow_list.contains(name),
        }
    }

    /// Mark every installed package that is not allow-listed.
    ///
    /// A package whose metadata cannot be read is logged and skipped.
    #[tracing::instrument(skip(self, dist), fields(arch = %dist.arch))]
    pub fn scan_removals(&self, dist: &Distribution) -> Result<RemovalReport> {
        let mut report = RemovalReport {
            arch: dist.arch,
            marked: Vec::new(),
            kept: Vec::new(),
            lookup_failures: Vec::new(),
        };

        for source in self.manager.package_sources(dist)? {
            match self.manager.read_package(&source) {
                Ok(package) if self.is_needed(&package.name) => {
                    debug!("Keeping {}", package.name);
                    report.kept.push(package.name);
                }
                Ok(package) => report.marked.push(package),
                Err(e) => {
                    warn!("Skipping unreadable package {:?}: {:#}", source, e);
                    report.lookup_failures.push((source, format!("{:#}", e)));
                }
            }
        }

        Ok(report)
    }

    /// Uninstall the packages marked by [`scan_removals`](Self::scan_removals).
    pub async fn remove_marked(&self, dist: &Distribution, report: &RemovalReport) -> BatchReport {
        let mut batch = BatchReport::default();
        for package in &report.marked {
            println!("Uninstalling: {}", package.name);
            match self.manager.uninstall_package(dist, package).await {
                Ok(()) => batch.success(&package.name),
                Err(e) => {
                    warn!("Failed to uninstall {} from WinPython {}: {:#}", package.name, dist.arch, e);
                    batch.failure(&package.name, &e);
                }
            }
        }
        batch
    }

    /// Scan both distributions and, unless `dry_run`, uninstall what is not allow-listed.
    ///
    /// A distribution whose package list cannot be read is reported and the other one
    /// is still processed.
    #[tracing::instrument(skip(self, layout))]
    pub async fn prune(&self, layout: &BundleLayout, dry_run: bool) -> (Vec<RemovalReport>, BatchReport) {
        println!("Uninstalling unneeded packages.");
        let mut reports = Vec::new();
        let mut batch = BatchReport::default();

        for (arch, dist) in layout.distributions.iter() {
            let report = match self.scan_removals(dist) {
                Ok(report) => report,
                Err(e) => {
                    warn!("Cannot list packages of WinPython {}: {:#}", arch, e);
                    batch.failure(format!("WinPython {}", arch), &e);
                    continue;
                }
            };

            info!(
                "WinPython {}: {} kept, {} marked for removal",
                arch,
                report.kept.len(),
                report.marked.len()
            );

            if dry_run {
                for name in report.marked_names() {
                    println!("Would uninstall from WinPython {}: {}", arch, name);
                }
            } else {
                batch.merge(self.remove_marked(dist, &report).await);
            }
            reports.push(report);
        }

        (reports, batch)
    }

    /// Delete bundled tools (`Qt*`, `TortoiseHg*`, `tools/TortoiseHg`) from both roots.
    #[tracing::instrument(skip(self, layout))]
    pub fn remove_tools(&self, layout: &BundleLayout) -> Result<BatchReport> {
        let resolver = PathResolver::new(self.runtime);
        let mut batch = BatchReport::default();

        for (arch, dist) in layout.distributions.iter() {
            let mut to_remove = Vec::new();
            for pattern in TOOL_PATTERNS {
                to_remove.extend(resolver.resolve(&dist.root, pattern)?.into_vec());
            }
            for dir in TOOL_DIRS {
                // Only a unique match is a tool folder; anything else means it is absent.
                if let Some(path) = resolver.resolve(&dist.root, dir)?.single() {
                    to_remove.push(path.to_path_buf());
                }
            }

            for path in to_remove {
                println!("Removing {} from WinPython {}", path.display(), arch);
                let result = if self.runtime.is_dir(&path) {
                    self.runtime.remove_dir_all(&path)
                } else {
                    self.runtime.remove_file(&path)
                };
                let item = path.display().to_string();
                match result {
                    Ok(()) => batch.success(item),
                    Err(e) => {
                        warn!("Failed to remove {}: {:#}", item, e);
                        batch.failure(item, &e);
                    }
                }
            }
        }

        Ok(batch)
    }

    /// Install the staged artifacts tagged for each architecture.
    #[tracing::instrument(skip(self, layout))]
    pub async fn install_local(&self, layout: &BundleLayout) -> Result<BatchReport> {
        let resolver = PathResolver::new(self.runtime);
        let mut batch = BatchReport::default();

        for descriptor in layout.descriptors() {
            let artifacts = resolver
                .resolve(&layout.staging_dir, &descriptor.artifact_pattern)?
                .into_vec();
            if artifacts.is_empty() {
                info!("No staged packages for WinPython {}", descriptor.arch);
            }

            for artifact in artifacts {
                println!("Installing {}", artifact.display());
                let item = artifact.display().to_string();
                match self
                    .manager
                    .install_package(descriptor.distribution, &artifact)
                    .await
                {
                    Ok(()) => batch.success(item),
                    Err(e) => {
                        warn!(
                            "Error installing {} in WinPython {}: {:#}",
                            item, descriptor.arch, e
                        );
                        batch.failure(item, &e);
                    }
                }
            }
        }

        Ok(batch)
    }

    /// `pip install --upgrade` each name in each distribution.
    #[tracing::instrument(skip(self, layout))]
    pub async fn install_named(&self, layout: &BundleLayout, names: &[String]) -> BatchReport {
        let mut batch = BatchReport::default();

        for (_, dist) in layout.distributions.iter() {
            for name in names {
                println!("Installing {} in {}", name, dist.root.display());
                let words = ["pip", "install", "--upgrade", name.as_str()];
                let item = format!("{} ({})", name, dist.arch);
                self.record_invocation(&mut batch, item, dist, &words).await;
            }
        }

        batch
    }

    /// Run the test-suite command inside each distribution.
    #[tracing::instrument(skip(self, layout))]
    pub async fn run_tests(&self, layout: &BundleLayout, command: &[String]) -> BatchReport {
        let mut batch = BatchReport::default();
        let words: Vec<&str> = command.iter().map(String::as_str).collect();

        for (arch, dist) in layout.distributions.iter() {
            println!("Testing WinPython {}: {}", arch, command.join(" "));
            let item = format!("WinPython {}", arch);
            self.record_invocation(&mut batch, item, dist, &words).await;
        }

        batch
    }

    async fn record_invocation(
        &self,
        batch: &mut BatchReport,
        item: String,
        dist: &Distribution,
        words: &[&str],
    ) {
        match self.launcher.run(self.runner, &dist.root, words).await {
            Ok(status) if status.success() => batch.success(item),
            Ok(status) => {
                warn!("{} finished with {}", item, status);
                batch.failure(item, &anyhow::anyhow!("finished with {}", status));
            }
            Err(e) => {
                warn!("{} could not be run: {:#}", item, e);
                batch.failure(item, &e);
            }
        }
    }
}
