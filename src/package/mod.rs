mod curator;
mod manager;
mod metadata;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

pub use curator::{Curator, RemovalReport};
pub use manager::{PackageManager, PipPackageManager};
pub use metadata::parse_metadata;

#[cfg(test)]
pub use manager::MockPackageManager;

/// A package installed in a distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub version: Option<String>,
    /// The metadata file or directory the record was read from.
    pub source: PathBuf,
}

/// Fold a package name to its comparison form: lowercase, with every run of `-`, `_`
/// and `.` collapsed to a single `-` (`Jinja2`, `python_dateutil`, `MarkupSafe`).
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            in_separator = true;
            continue;
        }
        if in_separator && !normalized.is_empty() {
            normalized.push('-');
        }
        in_separator = false;
        normalized.extend(c.to_lowercase());
    }
    normalized
}

/// The set of package names the curated bundle keeps.
///
/// Names are written the way WinPython's package manager lists them (`numpy-MKL`,
/// `PyQt`, `ets`) and compared after [`normalize_name`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList(BTreeSet<String>);

impl AllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        let wanted = normalize_name(name);
        self.0.iter().any(|n| normalize_name(n) == wanted)
    }

    /// Whether an installed package is kept, either under its own name or under the
    /// WinPython name `aliases` maps it to.
    pub fn keeps(&self, name: &str, aliases: &PackageAliases) -> bool {
        self.contains(name) || aliases.resolve(name).is_some_and(|alias| self.contains(alias))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Maps names found in installed package metadata (`numpy`, `PyQt4`, `traits`) to
/// the WinPython distribution names the allow-list is written in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageAliases(BTreeMap<String, String>);

impl PackageAliases {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        let wanted = normalize_name(name);
        self.0
            .iter()
            .find(|(from, _)| normalize_name(from) == wanted)
            .map(|(_, to)| to.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of a batch where each item may fail on its own.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn success(&mut self, item: impl Into<String>) {
        self.succeeded.push(item.into());
    }

    pub fn failure(&mut self, item: impl Into<String>, error: &anyhow::Error) {
        self.failed.push((item.into(), format!("{:#}", error)));
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Jinja2"), "jinja2");
        assert_eq!(normalize_name("python_dateutil"), "python-dateutil");
        assert_eq!(normalize_name("zope..interface"), "zope-interface");
        assert_eq!(normalize_name(" numpy-MKL "), "numpy-mkl");
    }

    #[test]
    fn test_allow_list_normalized_match() {
        let allow = AllowList::new(["numpy-MKL", "hyperspy", "MarkupSafe"]);
        assert!(allow.contains("hyperspy"));
        assert!(allow.contains("HyperSpy"));
        assert!(allow.contains("markupsafe"));
        assert!(allow.contains("numpy_mkl"));
        assert!(!allow.contains("numpy"));
        assert_eq!(allow.len(), 3);
    }

    #[test]
    fn test_allow_list_keeps_through_alias() {
        let allow = AllowList::new(["numpy-MKL", "ets"]);
        let aliases = PackageAliases::new([("numpy", "numpy-MKL"), ("traits", "ets")]);

        assert!(allow.keeps("numpy", &aliases));
        assert!(allow.keeps("Traits", &aliases));
        assert!(allow.keeps("numpy-MKL", &PackageAliases::default()));
        assert!(!allow.keeps("numpy", &PackageAliases::default()));
        assert!(!allow.keeps("nbconvert", &aliases));
    }

    #[test]
    fn test_allow_list_deserializes_from_array() {
        let allow: AllowList = serde_json::from_str(r#"["pip", "six", "pip"]"#).unwrap();
        assert_eq!(allow.len(), 2);
        assert!(allow.contains("six"));
    }

    #[test]
    fn test_batch_report_merge() {
        let mut a = BatchReport::default();
        a.success("numpy");
        let mut b = BatchReport::default();
        b.failure("scipy", &anyhow::anyhow!("boom"));

        a.merge(b);

        assert_eq!(a.succeeded, vec!["numpy".to_string()]);
        assert_eq!(a.failed, vec![("scipy".to_string(), "boom".to_string())]);
        assert!(!a.is_clean());
    }
}
