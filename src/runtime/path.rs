//! Path utility functions for home expansion, glob construction and root-relative rendering.

use anyhow::{Result, anyhow};
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

/// Separator used in paths written for the Windows installer side.
pub const TARGET_SEPARATOR: char = '\\';

/// Expand a leading `~` to the given home directory.
///
/// `~` alone and `~/rest` (or `~\rest`) are expanded; `~user` forms are left untouched.
pub fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return path.to_path_buf();
    };
    let Some(s) = path.to_str() else {
        return path.to_path_buf();
    };

    if s == "~" {
        return home.to_path_buf();
    }
    match s.strip_prefix("~/").or_else(|| s.strip_prefix("~\\")) {
        Some(rest) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Build a glob pattern that matches `pattern` below `root`.
///
/// The root is escaped so that characters such as `[` in a directory name are matched
/// literally; only the relative part is interpreted as a glob. An empty pattern yields
/// the escaped root itself.
pub fn glob_pattern_under(root: &Path, pattern: &str) -> Result<String> {
    let root_str = root
        .to_str()
        .ok_or_else(|| anyhow!("Path {:?} is not valid UTF-8", root))?;
    let trimmed = root_str.trim_end_matches(['/', '\\']);
    // Keep a bare root ("/") intact.
    let root_str = if trimmed.is_empty() { root_str } else { trimmed };
    let escaped = ::glob::Pattern::escape(root_str);

    if pattern.is_empty() {
        return Ok(escaped);
    }
    if escaped.ends_with(['/', '\\']) {
        Ok(format!("{}{}", escaped, pattern))
    } else {
        Ok(format!("{}{}{}", escaped, MAIN_SEPARATOR, pattern))
    }
}

/// Render `dir` relative to `root` using the `.` marker and Windows separators.
///
/// The root itself renders as `.`, a child as `.\child\grandchild`. Returns `None`
/// when `dir` is not inside `root`.
pub fn relative_marker_path(root: &Path, dir: &Path) -> Option<String> {
    let relative = pathdiff::diff_paths(dir, root)?;

    let mut rendered = String::from(".");
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                rendered.push(TARGET_SEPARATOR);
                rendered.push_str(&part.to_string_lossy());
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home() {
        let home = PathBuf::from("/home/user");

        assert_eq!(expand_home(Path::new("~"), Some(&home)), home);
        assert_eq!(
            expand_home(Path::new("~/bundle"), Some(&home)),
            home.join("bundle")
        );
        assert_eq!(
            expand_home(Path::new("/opt/bundle"), Some(&home)),
            PathBuf::from("/opt/bundle")
        );
        assert_eq!(
            expand_home(Path::new("~other/bundle"), Some(&home)),
            PathBuf::from("~other/bundle")
        );
        assert_eq!(expand_home(Path::new("~"), None), PathBuf::from("~"));
    }

    #[test]
    fn test_glob_pattern_under_escapes_root() {
        let root = Path::new("/dist/[test]");
        let pattern = glob_pattern_under(root, "python-*").unwrap();
        let expected = format!("/dist/[[]test[]]{}python-*", MAIN_SEPARATOR);
        assert_eq!(pattern, expected);
    }

    #[test]
    fn test_glob_pattern_under_trailing_separator() {
        let pattern = glob_pattern_under(Path::new("/dist/"), "Qt*").unwrap();
        assert_eq!(pattern, format!("/dist{}Qt*", MAIN_SEPARATOR));
    }

    #[test]
    fn test_glob_pattern_under_empty_pattern() {
        let pattern = glob_pattern_under(Path::new("/dist/WinPython-32"), "").unwrap();
        assert_eq!(pattern, "/dist/WinPython-32");
    }

    #[test]
    fn test_relative_marker_path_root() {
        let root = Path::new("/dist/WinPython-32");
        assert_eq!(relative_marker_path(root, root), Some(".".to_string()));
    }

    #[test]
    fn test_relative_marker_path_nested() {
        let root = Path::new("/dist/WinPython-32");
        let dir = root.join("python-2.7").join("Lib");
        assert_eq!(
            relative_marker_path(root, &dir),
            Some(".\\python-2.7\\Lib".to_string())
        );
    }

    #[test]
    fn test_relative_marker_path_outside_root() {
        let root = Path::new("/dist/WinPython-32");
        assert_eq!(relative_marker_path(root, Path::new("/dist/other")), None);
    }
}
