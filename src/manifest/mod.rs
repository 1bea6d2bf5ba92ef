//! Install manifest recording.
//!
//! The manifest lists every folder and file of a distribution in traversal order. The
//! companion uninstaller replays it in reverse to delete exactly what the installer
//! copied, so the format (Windows-1252, CRLF, `Folder:`/`File:` lines) is fixed.

mod writer;

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::layout::{Arch, Distribution};
use crate::runtime::{Runtime, relative_marker_path};

pub use writer::{ManifestEntry, ManifestWriter};

/// Manifest file name for an architecture and product version.
pub fn manifest_name(arch: Arch, version: &str) -> String {
    format!("hspy_bundle-{}bit_v{}_install.log", arch.bits(), version)
}

/// What a recording pass wrote and deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedManifest {
    pub path: PathBuf,
    pub folders: usize,
    pub files: usize,
    pub purged: Vec<PathBuf>,
}

pub struct ManifestRecorder<'a, R: Runtime> {
    runtime: &'a R,
    transient_extensions: &'a [String],
}

impl<'a, R: Runtime> ManifestRecorder<'a, R> {
    /// `transient_extensions` are matched against the file extension including its dot,
    /// e.g. `.pyc`.
    pub fn new(runtime: &'a R, transient_extensions: &'a [String]) -> Self {
        Self {
            runtime,
            transient_extensions,
        }
    }

    /// Write the manifest of `dist` into its root.
    ///
    /// With `purge_transient`, files with a transient extension are deleted instead of
    /// recorded. A file that cannot be deleted is recorded and reported.
    #[tracing::instrument(skip(self, dist), fields(arch = %dist.arch))]
    pub fn record(&self, dist: &Distribution, version: &str, purge_transient: bool) -> Result<RecordedManifest> {
        let root = &dist.root;
        let path = root.join(manifest_name(dist.arch, version));
        info!("Writing install manifest {:?}", path);

        let mut summary = RecordedManifest {
            path: path.clone(),
            ..Default::default()
        };

        let mut writer = ManifestWriter::new(
            self.runtime
                .create_file(&path)
                .with_context(|| format!("Failed to create manifest {:?}", path))?,
        );
        self.walk(root, root, purge_transient, &mut writer, &mut summary)?;
        writer.finish()?;

        debug!(
            "{:?}: {} folders, {} files, {} purged",
            path,
            summary.folders,
            summary.files,
            summary.purged.len()
        );
        Ok(summary)
    }

    fn walk(
        &self,
        root: &Path,
        dir: &Path,
        purge_transient: bool,
        writer: &mut ManifestWriter,
        summary: &mut RecordedManifest,
    ) -> Result<()> {
        let mut entries = match self.runtime.read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if dir != root => {
                warn!("Skipping unreadable folder {:?}: {:#}", dir, e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        entries.sort();

        let relative = relative_marker_path(root, dir)
            .ok_or_else(|| anyhow!("{:?} is not inside {:?}", dir, root))?;
        writer.write(&ManifestEntry::Folder(relative))?;
        summary.folders += 1;

        let mut subdirs = Vec::new();
        for entry in entries {
            if self.runtime.is_dir(&entry) {
                // Linked folders are not descended, and are not files either.
                if !self.runtime.is_symlink(&entry) {
                    subdirs.push(entry);
                }
                continue;
            }

            let name = entry
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            if purge_transient && self.is_transient(&entry) {
                match self.runtime.remove_file(&entry) {
                    Ok(()) => {
                        debug!("Purged {:?}", entry);
                        summary.purged.push(entry);
                        continue;
                    }
                    Err(e) => warn!("Could not purge {:?}, recording it instead: {:#}", entry, e),
                }
            }

            writer
                .write(&ManifestEntry::File(name))
                .with_context(|| format!("Cannot record {:?} in the install manifest", entry))?;
            summary.files += 1;
        }

        for subdir in subdirs {
            self.walk(root, &subdir, purge_transient, writer, summary)?;
        }
        Ok(())
    }

    fn is_transient(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.transient_extensions
            .iter()
            .any(|t| t.strip_prefix('.').unwrap_or(t) == ext)
    }
}
