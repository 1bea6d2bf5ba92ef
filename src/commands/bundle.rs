use anyhow::Result;
use log::{info, warn};

use super::config::Config;
use super::record::{expand_installers, record_manifests};
use super::summary::{print_batch, print_removals};
use crate::download::fetch_license;
use crate::error::BundleError;
use crate::package::BatchReport;
use crate::process::CommandRunner;
use crate::runtime::Runtime;

#[derive(Debug, Clone, Copy, Default)]
pub struct BundleOptions {
    /// Skip installing staged artifacts and index packages.
    pub skip_install: bool,
    pub with_license: bool,
    pub keep_transient: bool,
}

/// Run the whole curation pipeline, then write manifests and installer scripts.
///
/// Per-item failures are collected and printed at the end; only a broken bundle layout,
/// an unknown version or a missing template stop the run.
#[tracing::instrument(skip(config))]
pub async fn bundle<R: Runtime, C: CommandRunner>(config: &Config<R, C>, options: BundleOptions) -> Result<BatchReport> {
    let layout = config.layout()?;
    let template = config.bundle.template_path(&config.root);
    if !config.runtime.exists(&template) {
        return Err(BundleError::TemplateNotFound(template).into());
    }
    let version = config.versions.current_version().await?;
    info!("Building HyperSpy bundle {}", version);

    let manager = config.package_manager();
    let curator = config.curator(&manager);
    let mut overall = BatchReport::default();

    let (reports, batch) = curator.prune(&layout, false).await;
    print_removals(&reports);
    print_batch("Uninstall", &batch);
    overall.merge(batch);

    let batch = curator.remove_tools(&layout)?;
    print_batch("Remove tools", &batch);
    overall.merge(batch);

    if options.skip_install {
        info!("Skipping package installation");
    } else {
        let batch = curator.install_local(&layout).await?;
        print_batch("Install staged packages", &batch);
        overall.merge(batch);

        let batch = curator
            .install_named(&layout, &config.bundle.pip_packages)
            .await;
        print_batch("Install from index", &batch);
        overall.merge(batch);
    }

    let output_dir = config.bundle.output_path(&config.root);
    if options.with_license {
        let fetched: Result<_> = async {
            config.runtime.create_dir_all(&output_dir)?;
            fetch_license(&config.runtime, &config.bundle.license_url, &output_dir, &config.http).await
        }
        .await;
        match fetched {
            Ok(path) => {
                println!("Saved license to {}", path.display());
                overall.success("license");
            }
            Err(e) => {
                warn!("License download failed: {:#}", e);
                overall.failure("license", &e);
            }
        }
    }

    record_manifests(config, &layout, &version, !options.keep_transient)?;
    expand_installers(config, &layout, &version, None)?;

    print_batch("Bundle", &overall);
    Ok(overall)
}
