//! Bundle layout: the two WinPython distributions and the staging folder.
//!
//! ```text
//! <bundle root>
//! ├── packages2install
//! ├── WinPython-32*
//! │   └── python-*
//! └── WinPython-64*
//!     └── python-*
//! ```

mod resolver;

use anyhow::Result;
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::BundleError;
use crate::runtime::{Runtime, glob_pattern_under};

pub use resolver::{PathResolver, PathResult};

/// Folder holding locally staged package artifacts.
pub const STAGING_DIR: &str = "packages2install";

/// Name prefix shared by both distribution folders.
pub const DISTRIBUTION_PREFIX: &str = "WinPython-";

/// Pattern of the interpreter folder inside a distribution root.
pub const INTERPRETER_PATTERN: &str = "python-*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arch {
    X86,
    X64,
}

impl Arch {
    pub const ALL: [Arch; 2] = [Arch::X86, Arch::X64];

    /// Bitness tag, `32` or `64`.
    pub fn bits(self) -> &'static str {
        match self {
            Arch::X86 => "32",
            Arch::X64 => "64",
        }
    }

    /// Value substituted for the architecture marker, `32bit` or `64bit`.
    pub fn label(self) -> &'static str {
        match self {
            Arch::X86 => "32bit",
            Arch::X64 => "64bit",
        }
    }

    /// Marker that staged artifacts carry in their file name.
    pub fn artifact_marker(self) -> &'static str {
        match self {
            Arch::X86 => "win32",
            Arch::X64 => "amd64",
        }
    }

    pub fn distribution_pattern(self) -> String {
        format!("{}{}*", DISTRIBUTION_PREFIX, self.bits())
    }

    pub fn artifact_pattern(self) -> String {
        format!("*{}*", self.artifact_marker())
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bit", self.bits())
    }
}

/// A pair of values, one per architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerArch<T> {
    pub x86: T,
    pub x64: T,
}

impl<T> PerArch<T> {
    pub fn get(&self, arch: Arch) -> &T {
        match arch {
            Arch::X86 => &self.x86,
            Arch::X64 => &self.x64,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(Arch, T) -> U) -> PerArch<U> {
        PerArch {
            x86: f(Arch::X86, self.x86),
            x64: f(Arch::X64, self.x64),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Arch, &T)> {
        [(Arch::X86, &self.x86), (Arch::X64, &self.x64)].into_iter()
    }
}

/// One WinPython distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub arch: Arch,
    pub root: PathBuf,
    pub python_dir: PathBuf,
}

impl Distribution {
    /// Name of the interpreter folder, e.g. `python-2.7.6`.
    pub fn python_folder_name(&self) -> String {
        self.python_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Everything the per-architecture pipeline needs to run once.
#[derive(Debug, Clone)]
pub struct ArchDescriptor<'a> {
    pub arch: Arch,
    pub distribution: &'a Distribution,
    pub artifact_pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLayout {
    pub root: PathBuf,
    pub staging_dir: PathBuf,
    pub distributions: PerArch<Distribution>,
}

impl BundleLayout {
    /// Discover both distributions under `root`.
    ///
    /// A missing or ambiguous distribution folder, or a distribution without exactly one
    /// interpreter folder, is fatal.
    #[tracing::instrument(skip(runtime))]
    pub fn discover<R: Runtime>(runtime: &R, root: &Path) -> Result<Self> {
        let x86 = discover_distribution(runtime, root, Arch::X86)?;
        let x64 = discover_distribution(runtime, root, Arch::X64)?;

        Ok(Self {
            root: root.to_path_buf(),
            staging_dir: root.join(STAGING_DIR),
            distributions: PerArch { x86, x64 },
        })
    }

    pub fn distribution(&self, arch: Arch) -> &Distribution {
        self.distributions.get(arch)
    }

    pub fn descriptors(&self) -> Vec<ArchDescriptor<'_>> {
        Arch::ALL
            .iter()
            .map(|&arch| ArchDescriptor {
                arch,
                distribution: self.distribution(arch),
                artifact_pattern: arch.artifact_pattern(),
            })
            .collect()
    }
}

fn discover_distribution<R: Runtime>(runtime: &R, root: &Path, arch: Arch) -> Result<Distribution> {
    let pattern = arch.distribution_pattern();
    let matches: Vec<PathBuf> = runtime
        .glob(&glob_pattern_under(root, &pattern)?)?
        .into_iter()
        .filter(|p| runtime.is_dir(p))
        .collect();

    let dist_root = match PathResult::from_matches(matches) {
        PathResult::Single(path) => path,
        PathResult::None => return Err(BundleError::DistributionNotFound { pattern }.into()),
        PathResult::Many(matches) => {
            return Err(BundleError::AmbiguousDistribution { pattern, matches }.into());
        }
    };

    let python_dir = match PathResolver::new(runtime).resolve(&dist_root, INTERPRETER_PATTERN)? {
        PathResult::Single(path) if runtime.is_dir(&path) => path,
        other => {
            return Err(BundleError::InterpreterNotFound {
                root: dist_root,
                matches: other.len(),
            }
            .into());
        }
    };

    debug!("{} distribution: {:?} ({:?})", arch, dist_root, python_dir);

    Ok(Distribution {
        arch,
        root: dist_root,
        python_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use crate::test_utils::create_bundle_tree;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_arch_values() {
        assert_eq!(Arch::X86.bits(), "32");
        assert_eq!(Arch::X64.label(), "64bit");
        assert_eq!(Arch::X86.distribution_pattern(), "WinPython-32*");
        assert_eq!(Arch::X64.artifact_pattern(), "*amd64*");
        assert_eq!(Arch::X86.to_string(), "32 bit");
    }

    #[test]
    fn test_per_arch_map_and_get() {
        let pair = PerArch { x86: 1, x64: 2 }.map(|arch, v| format!("{}:{}", arch.bits(), v));
        assert_eq!(pair.get(Arch::X86), "32:1");
        assert_eq!(pair.get(Arch::X64), "64:2");
        assert_eq!(pair.iter().count(), 2);
    }

    #[test]
    fn test_discover_layout() {
        let dir = tempdir().unwrap();
        let (root32, root64) = create_bundle_tree(dir.path());

        let layout = BundleLayout::discover(&RealRuntime, dir.path()).unwrap();

        assert_eq!(layout.distributions.x86.root, root32);
        assert_eq!(layout.distributions.x64.root, root64);
        assert_eq!(layout.distributions.x86.python_folder_name(), "python-2.7.6");
        assert_eq!(layout.staging_dir, dir.path().join(STAGING_DIR));

        let descriptors = layout.descriptors();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].artifact_pattern, "*win32*");
        assert_eq!(descriptors[1].distribution.arch, Arch::X64);
    }

    #[test]
    fn test_discover_missing_distribution_is_fatal() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("WinPython-32bit/python-2.7.6")).unwrap();

        let err = BundleLayout::discover(&RealRuntime, dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BundleError>(),
            Some(BundleError::DistributionNotFound { pattern }) if pattern == "WinPython-64*"
        ));
    }

    #[test]
    fn test_discover_ignores_files_matching_prefix() {
        let dir = tempdir().unwrap();
        create_bundle_tree(dir.path());
        fs::write(dir.path().join("WinPython-32bit-2.7.6.exe"), "installer").unwrap();

        assert!(BundleLayout::discover(&RealRuntime, dir.path()).is_ok());
    }

    #[test]
    fn test_discover_ambiguous_distribution_is_fatal() {
        let dir = tempdir().unwrap();
        create_bundle_tree(dir.path());
        fs::create_dir_all(dir.path().join("WinPython-32bit-old/python-2.7.5")).unwrap();

        let err = BundleLayout::discover(&RealRuntime, dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BundleError>(),
            Some(BundleError::AmbiguousDistribution { matches, .. }) if matches.len() == 2
        ));
    }

    #[test]
    fn test_discover_missing_interpreter_is_fatal() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("WinPython-32bit")).unwrap();
        fs::create_dir_all(dir.path().join("WinPython-64bit/python-2.7.6.amd64")).unwrap();

        let err = BundleLayout::discover(&RealRuntime, dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BundleError>(),
            Some(BundleError::InterpreterNotFound { matches: 0, .. })
        ));
    }
}
