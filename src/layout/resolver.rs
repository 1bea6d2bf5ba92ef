use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use super::{BundleLayout, PerArch};
use crate::runtime::{Runtime, glob_pattern_under};

/// Outcome of resolving a relative glob against one distribution root.
///
/// A pattern that matches exactly one path collapses to [`PathResult::Single`];
/// zero or several matches stay a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathResult {
    None,
    Single(PathBuf),
    Many(Vec<PathBuf>),
}

impl PathResult {
    pub fn from_matches(mut matches: Vec<PathBuf>) -> Self {
        match matches.len() {
            0 => PathResult::None,
            1 => PathResult::Single(matches.remove(0)),
            _ => PathResult::Many(matches),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PathResult::None => 0,
            PathResult::Single(_) => 1,
            PathResult::Many(paths) => paths.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PathResult::None)
    }

    /// The single match, if the pattern was unique.
    pub fn single(&self) -> Option<&Path> {
        match self {
            PathResult::Single(path) => Some(path),
            _ => None,
        }
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        match self {
            PathResult::None => Vec::new(),
            PathResult::Single(path) => vec![path],
            PathResult::Many(paths) => paths,
        }
    }
}

/// Resolves root-relative glob patterns for each architecture.
pub struct PathResolver<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> PathResolver<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, root: &Path, pattern: &str) -> Result<PathResult> {
        let full_pattern = glob_pattern_under(root, pattern)?;
        let matches = self.runtime.glob(&full_pattern)?;
        debug!("{} matched {} path(s)", full_pattern, matches.len());
        Ok(PathResult::from_matches(matches))
    }

    /// Resolve the same pattern under both distribution roots.
    pub fn resolve_all(&self, layout: &BundleLayout, pattern: &str) -> Result<PerArch<PathResult>> {
        Ok(PerArch {
            x86: self.resolve(&layout.distributions.x86.root, pattern)?,
            x64: self.resolve(&layout.distributions.x64.root, pattern)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::{mock_layout, test_bundle_root};
    use mockall::predicate::eq;
    use std::path::MAIN_SEPARATOR;

    fn pattern_for(root: &Path, rel: &str) -> String {
        format!("{}{}{}", root.display(), MAIN_SEPARATOR, rel)
    }

    #[test]
    fn test_path_result_from_matches() {
        assert_eq!(PathResult::from_matches(vec![]), PathResult::None);
        assert_eq!(
            PathResult::from_matches(vec![PathBuf::from("a")]),
            PathResult::Single(PathBuf::from("a"))
        );
        let many = PathResult::from_matches(vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(many.len(), 2);
        assert!(many.single().is_none());
    }

    #[test]
    fn test_path_result_into_vec() {
        assert!(PathResult::None.into_vec().is_empty());
        assert_eq!(
            PathResult::Single(PathBuf::from("a")).into_vec(),
            vec![PathBuf::from("a")]
        );
    }

    #[test]
    fn test_resolve_single_match_is_scalar() {
        let mut runtime = MockRuntime::new();
        let root = test_bundle_root().join("WinPython-32bit");
        let python = root.join("python-2.7.6");

        let python_clone = python.clone();
        runtime
            .expect_glob()
            .with(eq(pattern_for(&root, "python-*")))
            .returning(move |_| Ok(vec![python_clone.clone()]));

        let resolver = PathResolver::new(&runtime);
        let result = resolver.resolve(&root, "python-*").unwrap();

        assert_eq!(result, PathResult::Single(python));
    }

    #[test]
    fn test_resolve_multiple_matches_is_collection() {
        let mut runtime = MockRuntime::new();
        let root = test_bundle_root().join("WinPython-64bit");

        let r = root.clone();
        runtime
            .expect_glob()
            .with(eq(pattern_for(&root, "Qt*")))
            .returning(move |_| Ok(vec![r.join("Qt Designer.exe"), r.join("Qt Linguist.exe")]));

        let resolver = PathResolver::new(&runtime);
        let result = resolver.resolve(&root, "Qt*").unwrap();

        assert_eq!(result.len(), 2);
        assert!(matches!(result, PathResult::Many(_)));
    }

    #[test]
    fn test_resolve_no_match_is_empty_not_error() {
        let mut runtime = MockRuntime::new();
        let root = test_bundle_root().join("WinPython-64bit");

        runtime.expect_glob().returning(|_| Ok(vec![]));

        let resolver = PathResolver::new(&runtime);
        let result = resolver.resolve(&root, "TortoiseHg*").unwrap();

        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_resolve_all_queries_both_roots() {
        let layout = mock_layout();
        let mut runtime = MockRuntime::new();

        let root32 = layout.distributions.x86.root.clone();
        let root64 = layout.distributions.x64.root.clone();

        let r32 = root32.clone();
        runtime
            .expect_glob()
            .with(eq(pattern_for(&root32, "Qt*")))
            .returning(move |_| Ok(vec![r32.join("Qt.exe")]));
        runtime
            .expect_glob()
            .with(eq(pattern_for(&root64, "Qt*")))
            .returning(|_| Ok(vec![]));

        let resolver = PathResolver::new(&runtime);
        let results = resolver.resolve_all(&layout, "Qt*").unwrap();

        assert_eq!(results.x86, PathResult::Single(root32.join("Qt.exe")));
        assert_eq!(results.x64, PathResult::None);
    }
}
