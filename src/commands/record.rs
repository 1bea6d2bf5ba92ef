use anyhow::Result;
use std::path::{Path, PathBuf};

use super::config::Config;
use super::summary::print_manifest;
use crate::download::fetch_license;
use crate::installer::{Substitutions, TemplateExpander};
use crate::layout::{BundleLayout, PerArch};
use crate::manifest::{ManifestRecorder, RecordedManifest};
use crate::process::CommandRunner;
use crate::runtime::Runtime;

/// Write the install manifest of both distributions.
#[tracing::instrument(skip(config))]
pub async fn manifest<R: Runtime, C: CommandRunner>(
    config: &Config<R, C>,
    keep_transient: bool,
) -> Result<PerArch<RecordedManifest>> {
    let layout = config.layout()?;
    let version = config.versions.current_version().await?;
    record_manifests(config, &layout, &version, !keep_transient)
}

pub(crate) fn record_manifests<R: Runtime, C: CommandRunner>(
    config: &Config<R, C>,
    layout: &BundleLayout,
    version: &str,
    purge_transient: bool,
) -> Result<PerArch<RecordedManifest>> {
    let recorder = ManifestRecorder::new(&config.runtime, &config.bundle.transient_extensions);
    let manifests = PerArch {
        x86: recorder.record(&layout.distributions.x86, version, purge_transient)?,
        x64: recorder.record(&layout.distributions.x64, version, purge_transient)?,
    };
    for (_, manifest) in manifests.iter() {
        print_manifest(manifest);
    }
    Ok(manifests)
}

/// Generate the 32-bit and 64-bit installer scripts from the template.
#[tracing::instrument(skip(config))]
pub async fn installers<R: Runtime, C: CommandRunner>(
    config: &Config<R, C>,
    output_dir: Option<&Path>,
) -> Result<PerArch<PathBuf>> {
    let layout = config.layout()?;
    let version = config.versions.current_version().await?;
    expand_installers(config, &layout, &version, output_dir)
}

pub(crate) fn expand_installers<R: Runtime, C: CommandRunner>(
    config: &Config<R, C>,
    layout: &BundleLayout,
    version: &str,
    output_dir: Option<&Path>,
) -> Result<PerArch<PathBuf>> {
    let plugins = config.bundle.nsis_plugins_path(&config.root);
    let values = Substitutions::resolve_all(&config.runtime, layout, version, &plugins)?;

    let output_dir = match output_dir {
        Some(dir) => config.root.join(dir),
        None => config.bundle.output_path(&config.root),
    };
    let scripts = TemplateExpander::new(&config.runtime).expand(
        &config.bundle.template_path(&config.root),
        &output_dir,
        &values,
    )?;

    for (arch, path) in scripts.iter() {
        println!("Created {} installer script {}", arch, path.display());
    }
    Ok(scripts)
}

/// Download the project license next to the installer scripts.
#[tracing::instrument(skip(config))]
pub async fn license<R: Runtime, C: CommandRunner>(config: &Config<R, C>) -> Result<PathBuf> {
    let dir = config.bundle.output_path(&config.root);
    config.runtime.create_dir_all(&dir)?;
    let path = fetch_license(&config.runtime, &config.bundle.license_url, &dir, &config.http).await?;
    println!("Saved license to {}", path.display());
    Ok(path)
}
