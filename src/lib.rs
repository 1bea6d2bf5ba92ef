pub mod commands;
pub mod config;
pub mod download;
pub mod error;
pub mod http;
pub mod installer;
pub mod layout;
pub mod manifest;
pub mod package;
pub mod process;
pub mod runtime;
pub mod version;

/// Test utilities for cross-platform path handling and bundle fixtures.
#[cfg(test)]
pub mod test_utils {
    use crate::layout::{Arch, BundleLayout, Distribution, PerArch, STAGING_DIR};
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Returns the test bundle root based on the platform.
    /// - Unix: `/home/user/hspy_bundle`
    /// - Windows: `C:\Users\user\hspy_bundle`
    pub fn test_bundle_root() -> PathBuf {
        #[cfg(not(windows))]
        {
            PathBuf::from("/home/user/hspy_bundle")
        }
        #[cfg(windows)]
        {
            PathBuf::from(r"C:\Users\user\hspy_bundle")
        }
    }

    /// Returns a test home directory path based on the platform.
    /// - Unix: `/home/user`
    /// - Windows: `C:\Users\user`
    pub fn test_home() -> PathBuf {
        #[cfg(not(windows))]
        {
            PathBuf::from("/home/user")
        }
        #[cfg(windows)]
        {
            PathBuf::from(r"C:\Users\user")
        }
    }

    /// A layout under [`test_bundle_root`] that exists only on paper, for mocked runtimes.
    pub fn mock_layout() -> BundleLayout {
        let root = test_bundle_root();
        let root32 = root.join("WinPython-32bit");
        let root64 = root.join("WinPython-64bit");
        BundleLayout {
            staging_dir: root.join(STAGING_DIR),
            distributions: PerArch {
                x86: Distribution {
                    arch: Arch::X86,
                    python_dir: root32.join("python-2.7.6"),
                    root: root32,
                },
                x64: Distribution {
                    arch: Arch::X64,
                    python_dir: root64.join("python-2.7.6.amd64"),
                    root: root64,
                },
            },
            root,
        }
    }

    /// Create both distribution roots, their interpreter folders and the staging folder
    /// under `dir`. Returns the 32-bit and 64-bit roots.
    pub fn create_bundle_tree(dir: &Path) -> (PathBuf, PathBuf) {
        let root32 = dir.join("WinPython-32bit");
        let root64 = dir.join("WinPython-64bit");
        fs::create_dir_all(root32.join("python-2.7.6")).unwrap();
        fs::create_dir_all(root64.join("python-2.7.6.amd64")).unwrap();
        fs::create_dir_all(dir.join(STAGING_DIR)).unwrap();
        (root32, root64)
    }

    /// Install a fake wheel record for `name` into an interpreter folder.
    /// Returns the `.dist-info` directory.
    pub fn write_dist_info(python_dir: &Path, name: &str, version: &str) -> PathBuf {
        let dist_info = python_dir
            .join("Lib")
            .join("site-packages")
            .join(format!("{}-{}.dist-info", name, version));
        fs::create_dir_all(&dist_info).unwrap();
        fs::write(
            dist_info.join("METADATA"),
            format!("Metadata-Version: 2.1\nName: {}\nVersion: {}\n", name, version),
        )
        .unwrap();
        dist_info
    }
}
