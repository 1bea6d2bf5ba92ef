use anyhow::Result;

use super::config::Config;
use super::summary::{print_batch, print_removals};
use crate::package::BatchReport;
use crate::process::CommandRunner;
use crate::runtime::Runtime;

/// Uninstall every package that is not allow-listed, or only list them with `dry_run`.
#[tracing::instrument(skip(config))]
pub async fn prune<R: Runtime, C: CommandRunner>(config: &Config<R, C>, dry_run: bool) -> Result<BatchReport> {
    let layout = config.layout()?;
    let manager = config.package_manager();
    let (reports, batch) = config.curator(&manager).prune(&layout, dry_run).await;

    print_removals(&reports);
    print_batch("Uninstall", &batch);
    Ok(batch)
}

#[tracing::instrument(skip(config))]
pub fn remove_tools<R: Runtime, C: CommandRunner>(config: &Config<R, C>) -> Result<BatchReport> {
    let layout = config.layout()?;
    let manager = config.package_manager();
    let batch = config.curator(&manager).remove_tools(&layout)?;

    print_batch("Remove tools", &batch);
    Ok(batch)
}

/// Install the artifacts staged in `packages2install`.
#[tracing::instrument(skip(config))]
pub async fn install_local<R: Runtime, C: CommandRunner>(config: &Config<R, C>) -> Result<BatchReport> {
    let layout = config.layout()?;
    let manager = config.package_manager();
    let batch = config.curator(&manager).install_local(&layout).await?;

    print_batch("Install staged packages", &batch);
    Ok(batch)
}

/// Install `names` from the package index, or the configured list when empty.
#[tracing::instrument(skip(config))]
pub async fn install<R: Runtime, C: CommandRunner>(config: &Config<R, C>, names: &[String]) -> Result<BatchReport> {
    let names = if names.is_empty() {
        &config.bundle.pip_packages[..]
    } else {
        names
    };
    let layout = config.layout()?;
    let manager = config.package_manager();
    let batch = config.curator(&manager).install_named(&layout, names).await;

    print_batch("Install from index", &batch);
    Ok(batch)
}

#[tracing::instrument(skip(config))]
pub async fn run_tests<R: Runtime, C: CommandRunner>(config: &Config<R, C>) -> Result<BatchReport> {
    let layout = config.layout()?;
    let manager = config.package_manager();
    let batch = config
        .curator(&manager)
        .run_tests(&layout, &config.bundle.test_command)
        .await;

    print_batch("Test suite", &batch);
    Ok(batch)
}
