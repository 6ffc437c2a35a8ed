//! Path normalization for the virtual namespace.
//!
//! Virtual paths use `/` as the only separator. Resolution is pure: it turns
//! path text into a normalized segment list without touching the tree.

use crate::core::{FsError, Result};

/// Resolves `path` against `cwd` (used when `path` is relative) into a
/// normalized segment list. `.` segments are dropped, `..` pops the walk
/// position and fails with a conflict when it would ascend above the root.
/// Empty paths and paths of separators only resolve to `cwd` itself.
pub fn normalize(cwd: &[String], path: &str) -> Result<Vec<String>> {
    let mut segments: Vec<String> = if path.starts_with('/') {
        Vec::new()
    } else {
        cwd.to_vec()
    };

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(FsError::conflict(format!(
                        "{path} escapes the filesystem root"
                    )));
                }
            }
            name => segments.push(name.to_string()),
        }
    }

    Ok(segments)
}

/// Renders a segment list back as an absolute path.
pub fn display(segments: &[String]) -> String {
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Vec<String> {
        Vec::new()
    }

    fn segs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_absolute_path() -> Result<()> {
        assert_eq!(normalize(&root(), "/a/b/c")?, segs(&["a", "b", "c"]));
        Ok(())
    }

    #[test]
    fn test_relative_path_joins_cwd() -> Result<()> {
        let cwd = segs(&["home", "user"]);
        assert_eq!(normalize(&cwd, "docs/note.txt")?, segs(&["home", "user", "docs", "note.txt"]));
        Ok(())
    }

    #[test]
    fn test_absolute_path_ignores_cwd() -> Result<()> {
        let cwd = segs(&["home"]);
        assert_eq!(normalize(&cwd, "/etc")?, segs(&["etc"]));
        Ok(())
    }

    #[test]
    fn test_dot_segments_dropped() -> Result<()> {
        assert_eq!(normalize(&root(), "/a/./b/.")?, segs(&["a", "b"]));
        assert_eq!(normalize(&segs(&["a"]), ".")?, segs(&["a"]));
        Ok(())
    }

    #[test]
    fn test_double_dot_pops() -> Result<()> {
        assert_eq!(normalize(&root(), "/dir/../dir/file.txt")?, segs(&["dir", "file.txt"]));
        assert_eq!(normalize(&segs(&["home", "user"]), "..")?, segs(&["home"]));
        Ok(())
    }

    #[test]
    fn test_double_dot_above_root_is_conflict() {
        let result = normalize(&root(), "/..");
        assert!(matches!(result, Err(FsError::Conflict(_))));

        let result = normalize(&segs(&["a"]), "../../..");
        assert!(matches!(result, Err(FsError::Conflict(_))));
    }

    #[test]
    fn test_empty_and_separator_only_paths() -> Result<()> {
        let cwd = segs(&["home"]);
        assert_eq!(normalize(&cwd, "")?, cwd);
        assert_eq!(normalize(&cwd, "/")?, root());
        assert_eq!(normalize(&root(), "//")?, root());
        Ok(())
    }

    #[test]
    fn test_redundant_separators_collapse() -> Result<()> {
        assert_eq!(normalize(&root(), "/a//b///c")?, segs(&["a", "b", "c"]));
        assert_eq!(normalize(&root(), "/a/b/")?, segs(&["a", "b"]));
        Ok(())
    }

    #[test]
    fn test_display() {
        assert_eq!(display(&root()), "/");
        assert_eq!(display(&segs(&["a", "b"])), "/a/b");
    }
}
