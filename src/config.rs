//! Bundle configuration, read from an optional JSON file.
//!
//! Every field falls back to the values the HyperSpy bundle has always been built with,
//! so an empty `{}` document (or no file at all) reproduces the stock bundle.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::package::{AllowList, PackageAliases};
use crate::process::Launcher;
use crate::runtime::Runtime;

/// File name looked up in the bundle root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "hspy_bundle.json";

pub const DEFAULT_INDEX_URL: &str = "https://pypi.python.org";

const NEEDED_PACKAGES: &[&str] = &[
    "colorama",
    "configobj",
    "docutils",
    "ets",
    "formlayout",
    "guidata",
    "guiqwt",
    "h5py",
    "hyperspy",
    "ipython",
    "Jinja2",
    "logilab-astng",
    "logilab-common",
    "MarkupSafe",
    "matplotlib",
    "nose",
    "numexpr",
    "numpy-MKL",
    "Pillow",
    "pip",
    "Pygments",
    "pylint",
    "pyparsing",
    "PyQt",
    "PyQtdoc",
    "PyQwt",
    "pyreadline",
    "PySide",
    "python-dateutil",
    "pytz",
    "pywin32",
    "pyzmq",
    "scikit-image",
    "scikit-learn",
    "scipy",
    "setuptools",
    "simplejson",
    "six",
    "Sphinx",
    "spyder",
    "sympy",
    "tornado",
    "VTK",
    "winpython",
];

/// Installed metadata names that WinPython lists under another name. The Enthought
/// Tool Suite components all ship inside the single `ets` package.
const PACKAGE_ALIASES: &[(&str, &str)] = &[
    ("numpy", "numpy-MKL"),
    ("PyQt4", "PyQt"),
    ("vtk", "VTK"),
    ("apptools", "ets"),
    ("blockcanvas", "ets"),
    ("chaco", "ets"),
    ("codetools", "ets"),
    ("enable", "ets"),
    ("encore", "ets"),
    ("envisage", "ets"),
    ("etsdevtools", "ets"),
    ("etsproxy", "ets"),
    ("graphcanvas", "ets"),
    ("mayavi", "ets"),
    ("pyface", "ets"),
    ("scimath", "ets"),
    ("traits", "ets"),
    ("traitsui", "ets"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Packages kept in each distribution; everything else is uninstalled.
    pub needed_packages: AllowList,
    /// Metadata name to allow-list name, for packages WinPython names differently.
    pub package_aliases: PackageAliases,
    /// Packages installed by name from the index after local artifacts.
    pub pip_packages: Vec<String>,
    /// Project whose released version labels the bundle.
    pub project: String,
    pub index_url: String,
    pub license_url: String,
    /// Installer template, relative to the bundle root unless absolute.
    pub template: PathBuf,
    pub nsis_plugins: PathBuf,
    /// Where installer scripts and the license go. Defaults to the bundle root.
    pub output_dir: Option<PathBuf>,
    pub transient_extensions: Vec<String>,
    pub launcher: Launcher,
    pub test_command: Vec<String>,
    pub command_timeout_secs: Option<u64>,
    /// Interpreter executable inside the `python-*` folder.
    pub python_exe: String,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            needed_packages: AllowList::new(NEEDED_PACKAGES.iter().copied()),
            package_aliases: PackageAliases::new(PACKAGE_ALIASES.iter().copied()),
            pip_packages: vec!["configobj".into(), "hyperspy".into()],
            project: "hyperspy".into(),
            index_url: DEFAULT_INDEX_URL.into(),
            license_url: "https://github.com/hyperspy/hyperspy/blob/master/COPYING.txt".into(),
            template: PathBuf::from("NSIS_installer_script.nsi"),
            nsis_plugins: PathBuf::from("NSISPlugins"),
            output_dir: None,
            transient_extensions: vec![".pyc".into(), ".swp".into()],
            launcher: Launcher::default(),
            test_command: vec!["nosetests".into(), "hyperspy".into()],
            command_timeout_secs: None,
            python_exe: "python.exe".into(),
        }
    }
}

impl BundleConfig {
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: BundleConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        Ok(config)
    }

    /// Load `explicit` if given, else `<root>/hspy_bundle.json` if present, else defaults.
    #[tracing::instrument(skip(runtime))]
    pub fn discover<R: Runtime>(runtime: &R, root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(runtime, path);
        }
        let candidate = root.join(DEFAULT_CONFIG_FILE);
        if runtime.exists(&candidate) {
            debug!("Using config file {:?}", candidate);
            return Self::load(runtime, &candidate);
        }
        debug!("No config file, using built-in defaults");
        Ok(Self::default())
    }

    pub fn template_path(&self, root: &Path) -> PathBuf {
        root.join(&self.template)
    }

    pub fn nsis_plugins_path(&self, root: &Path) -> PathBuf {
        root.join(&self.nsis_plugins)
    }

    pub fn output_path(&self, root: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        }
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}
