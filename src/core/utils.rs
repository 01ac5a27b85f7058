//! Utility functions for SkinHost
//!
//! Path helpers shared by the orchestrator and the layout loader.

use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against `base` and collapse `.`/`..` lexically.
///
/// A relative `base` is itself resolved against the current directory.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else if base.is_absolute() {
        base.join(path)
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(base).join(path))
            .unwrap_or_else(|_| base.join(path))
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Case-fold a path into the identity key used by the skin collection
pub fn fold_path(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

/// Absolute + case-folded identity for a skin path
pub fn normalize_skin_path(path: &Path, base: &Path) -> (PathBuf, String) {
    let absolute = absolutize(path, base);
    let key = fold_path(&absolute);
    (absolute, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolutize_relative() {
        let path = absolutize(Path::new("Clock/Clock.ini"), Path::new("/home/u/Skins"));
        assert_eq!(path, PathBuf::from("/home/u/Skins/Clock/Clock.ini"));
    }

    #[test]
    fn test_absolutize_collapses_dots() {
        let path = absolutize(Path::new("./a/../b/./c.ini"), Path::new("/skins"));
        assert_eq!(path, PathBuf::from("/skins/b/c.ini"));
    }

    #[test]
    fn test_absolute_path_ignores_base() {
        let path = absolutize(Path::new("/x/y.ini"), Path::new("/skins"));
        assert_eq!(path, PathBuf::from("/x/y.ini"));
    }

    #[test]
    fn test_normalize_folds_case() {
        let (_, upper) = normalize_skin_path(Path::new("/Skins/A.ini"), Path::new("/"));
        let (_, lower) = normalize_skin_path(Path::new("/skins/a.ini"), Path::new("/"));
        assert_eq!(upper, lower);
        assert_eq!(upper, "/skins/a.ini");
    }
}
