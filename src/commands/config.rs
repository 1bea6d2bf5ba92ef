use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use std::path::PathBuf;

use crate::{
    config::BundleConfig,
    http::HttpClient,
    layout::BundleLayout,
    package::{Curator, PackageManager, PipPackageManager},
    process::{CommandRunner, TokioCommandRunner},
    runtime::{Runtime, expand_home},
    version::{FixedVersion, PypiVersionSource, VersionSource},
};

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub root: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub product_version: Option<String>,
    pub index_url: Option<String>,
}

pub struct Config<R: Runtime, C: CommandRunner> {
    pub runtime: R,
    pub runner: C,
    pub http: HttpClient,
    pub versions: Box<dyn VersionSource>,
    /// Absolute bundle root.
    pub root: PathBuf,
    pub bundle: BundleConfig,
}

impl<R: Runtime> Config<R, TokioCommandRunner> {
    pub fn new(runtime: R, options: GlobalOptions) -> Result<Self> {
        let root = options.root.unwrap_or_else(|| PathBuf::from("."));
        let root = expand_home(&root, runtime.home_dir().as_deref());
        let root = runtime
            .absolute(&root)
            .with_context(|| format!("Invalid bundle root {:?}", root))?;
        debug!("Bundle root: {:?}", root);

        let mut bundle = BundleConfig::discover(&runtime, &root, options.config.as_deref())?;
        if let Some(index_url) = options.index_url {
            bundle.index_url = index_url;
        }

        let client = Client::builder()
            .user_agent(concat!("hspy-bundle/", env!("HSPY_BUNDLE_VERSION")))
            .build()?;
        let http = HttpClient::new(client);

        let versions: Box<dyn VersionSource> = match options.product_version {
            Some(version) => Box::new(FixedVersion(version)),
            None => Box::new(PypiVersionSource::new(
                http.clone(),
                &bundle.index_url,
                &bundle.project,
            )),
        };

        let runner = TokioCommandRunner::new(bundle.command_timeout());

        Ok(Self {
            runtime,
            runner,
            http,
            versions,
            root,
            bundle,
        })
    }
}

impl<R: Runtime, C: CommandRunner> Config<R, C> {
    pub fn layout(&self) -> Result<BundleLayout> {
        BundleLayout::discover(&self.runtime, &self.root)
    }

    pub fn package_manager(&self) -> PipPackageManager<'_, R, C> {
        PipPackageManager::new(&self.runtime, &self.runner, self.bundle.python_exe.clone())
    }

    pub fn curator<'a, M: PackageManager>(&'a self, manager: &'a M) -> Curator<'a, R, M, C> {
        Curator::new(
            &self.runtime,
            manager,
            &self.runner,
            &self.bundle.needed_packages,
            &self.bundle.launcher,
        )
        .with_aliases(&self.bundle.package_aliases)
    }
}
