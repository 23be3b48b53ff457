//! Resolution of a package directory to its definition file.

use std::path::{Path, PathBuf};

use crate::error::ContentError;

/// Suffix of generated unified files that may sit next to the definition.
const UNIFIED_SUFFIX: &str = "_unified.yml";

/// Maps a script/integration package directory to its definition yml.
pub trait Unifier {
    /// Repository-relative path of the definition file inside `package_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::MissingDefinition`] when the package has no
    /// definition file.
    fn package_definition(&self, package_dir: &str) -> Result<String, ContentError>;
}

/// Filesystem unifier rooted at the repository.
#[derive(Debug, Clone)]
pub struct PackageUnifier {
    root: PathBuf,
}

impl PackageUnifier {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Unifier for PackageUnifier {
    /// Prefers `<dir>/<dirname>.yml`; otherwise the first non-unified yml.
    fn package_definition(&self, package_dir: &str) -> Result<String, ContentError> {
        let dir = package_dir.trim_end_matches('/');
        let missing = || ContentError::MissingDefinition {
            dir: dir.to_owned(),
        };

        let dir_name = Path::new(dir)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(missing)?;
        let preferred = format!("{dir}/{dir_name}.yml");
        if self.root.join(&preferred).is_file() {
            return Ok(preferred);
        }

        let pattern = format!(
            "{}/*.yml",
            glob::Pattern::escape(&self.root.join(dir).to_string_lossy())
        );
        let mut candidates: Vec<String> = glob::glob(&pattern)
            .map_err(|_| missing())?
            .filter_map(Result::ok)
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_owned))
            .filter(|name| !name.ends_with(UNIFIED_SUFFIX))
            .collect();
        candidates.sort();

        candidates
            .into_iter()
            .next()
            .map(|name| format!("{dir}/{name}"))
            .ok_or_else(missing)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn package(files: &[&str]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("Scripts/Foo")).unwrap();
        for f in files {
            std::fs::write(tmp.path().join("Scripts/Foo").join(f), "name: Foo\n").unwrap();
        }
        tmp
    }

    #[test]
    fn test_prefers_same_name_definition() {
        let tmp = package(&["Foo.yml", "Another.yml"]);
        let unifier = PackageUnifier::new(tmp.path());
        assert_eq!(unifier.package_definition("Scripts/Foo").unwrap(), "Scripts/Foo/Foo.yml");
    }

    #[test]
    fn test_falls_back_to_single_yml() {
        let tmp = package(&["script.yml", "Foo_unified.yml"]);
        let unifier = PackageUnifier::new(tmp.path());
        assert_eq!(
            unifier.package_definition("Scripts/Foo/").unwrap(),
            "Scripts/Foo/script.yml"
        );
    }

    #[test]
    fn test_missing_definition() {
        let tmp = package(&["Foo.py"]);
        let unifier = PackageUnifier::new(tmp.path());
        let err = unifier.package_definition("Scripts/Foo").unwrap_err();
        assert!(matches!(err, ContentError::MissingDefinition { .. }));
    }
}
