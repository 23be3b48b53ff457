//! Discovery of content files for the full-repository sweep.
//!
//! Security properties enforced here:
//! - Symlinks are not followed by default (`follow_links: false`)
//! - Resolved paths are checked to remain within the repository root
//! - Device files, pipes, and sockets are skipped

use std::path::Path;

use contentcheck::{ContentType, Unifier, patterns};
use glob::Pattern;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::config::RepoConfig;
use crate::error::Finding;
use crate::router::{Route, route};

/// Whether `path` matches any of the exclude patterns, by full path or file name.
fn matches_exclude(path: &str, exclude_patterns: &[Pattern]) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    exclude_patterns
        .iter()
        .any(|pattern| pattern.matches(path) || pattern.matches(name))
}

fn is_special_file(entry: &DirEntry) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        if let Ok(ft) = entry.metadata().map(|m| m.file_type()) {
            return ft.is_block_device() || ft.is_char_device() || ft.is_fifo() || ft.is_socket();
        }
    }
    #[cfg(not(unix))]
    let _ = entry;
    false
}

/// Repository-relative form of `path`, always with forward slashes.
fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Find every content file the full sweep validates.
///
/// Visits each content directory one level deep: plain files are routed by
/// their path and, in package directories, every sub-directory contributes
/// its definition file as resolved by `unifier`. A package definition takes
/// its type from the package directory, so it is found whatever its file name.
///
/// Returns `(files, findings)`:
/// - `files`: sorted repository-relative paths with their content type.
///   Plain files no rule recognises are left out.
/// - `findings`: walk errors, boundary violations, invalid exclude patterns
///   and packages without a definition. None of them is silently discarded.
pub fn find_content_files(
    repo: &RepoConfig,
    unifier: &dyn Unifier,
) -> (Vec<(String, ContentType)>, Vec<Finding>) {
    let mut files = Vec::new();
    let mut findings = Vec::new();

    let mut exclude_patterns = Vec::with_capacity(repo.exclude.len());
    for pat_str in &repo.exclude {
        match Pattern::new(pat_str) {
            Ok(pat) => exclude_patterns.push(pat),
            Err(e) => findings.push(Finding::configuration(
                pat_str.as_str(),
                format!("invalid exclude glob pattern '{pat_str}': {e}"),
            )),
        }
    }

    let canonical_root = match repo.root.canonicalize() {
        Ok(r) => r,
        Err(e) => {
            findings.push(Finding::structural(
                repo.root.to_string_lossy(),
                format!("failed to canonicalize repository root: {e}"),
            ));
            return (files, findings);
        }
    };

    for dir in patterns::CONTENT_DIRS {
        let dir_path = repo.root.join(dir);
        if !dir_path.is_dir() {
            continue;
        }
        let package_type = patterns::package_dir_type(dir);

        for entry_result in WalkDir::new(&dir_path)
            .follow_links(repo.follow_links)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry_result {
                Ok(e) => e,
                Err(walk_err) => {
                    let path = walk_err.path().unwrap_or(&dir_path);
                    findings.push(Finding::structural(
                        relative(&repo.root, path),
                        format!("directory traversal error: {walk_err}"),
                    ));
                    continue;
                }
            };
            let rel_path = relative(&repo.root, entry.path());
            if patterns::is_hidden(&rel_path) || matches_exclude(&rel_path, &exclude_patterns) {
                continue;
            }

            // Catches symlink escapes even when follow_links is true.
            match entry.path().canonicalize() {
                Ok(canonical_path) if !canonical_path.starts_with(&canonical_root) => {
                    findings.push(Finding::structural(
                        rel_path.as_str(),
                        format!(
                            "path resolves outside repository root: {}",
                            canonical_path.display()
                        ),
                    ));
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    findings.push(Finding::structural(
                        rel_path.as_str(),
                        format!("failed to canonicalize path: {e}"),
                    ));
                    continue;
                }
            }

            if entry.path().is_dir() {
                if let Some(content_type) = package_type {
                    match unifier.package_definition(&rel_path) {
                        Ok(definition) => files.push((definition, content_type)),
                        Err(e) => findings.push(Finding::structural(rel_path.as_str(), e.to_string())),
                    }
                }
            } else if entry.path().is_file() && !is_special_file(&entry) {
                match route(&rel_path) {
                    Route::Content(content_type, _) => files.push((rel_path, content_type)),
                    Route::Schema | Route::Unrecognized => debug!(path = %rel_path, "not a content file"),
                }
            }
        }
    }

    files.sort();
    files.dedup();
    (files, findings)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use contentcheck::PackageUnifier;
    use std::fs;
    use tempfile::TempDir;

    fn repo_config(root: &Path) -> RepoConfig {
        RepoConfig {
            root: root.to_path_buf(),
            ..RepoConfig::default()
        }
    }

    #[test]
    fn test_matches_exclude_by_name_and_path() {
        let patterns = vec![Pattern::new("*.bak").unwrap(), Pattern::new("Layouts/*").unwrap()];
        assert!(matches_exclude("Scripts/script-a.bak", &patterns));
        assert!(matches_exclude("Layouts/layout-a.json", &patterns));
        assert!(!matches_exclude("Scripts/script-a.yml", &patterns));
    }

    #[test]
    fn test_finds_plain_and_package_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("Scripts/Foo")).unwrap();
        fs::write(root.join("Scripts/Foo/Foo.yml"), "name: Foo\n").unwrap();
        fs::write(root.join("Scripts/Foo/Foo.py"), "pass\n").unwrap();
        fs::write(root.join("Scripts/script-Old.yml"), "name: Old\n").unwrap();
        fs::create_dir_all(root.join("Layouts")).unwrap();
        fs::write(root.join("Layouts/layout-a.json"), "{}").unwrap();
        fs::write(root.join("Layouts/.hidden.json"), "{}").unwrap();
        fs::create_dir_all(root.join("Layouts/nested")).unwrap();
        fs::write(root.join("Layouts/nested/deep.json"), "{}").unwrap();

        let unifier = PackageUnifier::new(root);
        let (files, findings) = find_content_files(&repo_config(root), &unifier);
        assert!(findings.is_empty(), "{findings:?}");
        assert_eq!(
            files,
            vec![
                ("Layouts/layout-a.json".to_owned(), ContentType::Layout),
                ("Scripts/Foo/Foo.yml".to_owned(), ContentType::Script),
                ("Scripts/script-Old.yml".to_owned(), ContentType::Script),
            ]
        );
    }

    #[test]
    fn test_package_definition_typed_by_directory() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("Scripts/Hello")).unwrap();
        fs::write(root.join("Scripts/Hello/script.yml"), "name: Hello\n").unwrap();
        fs::create_dir_all(root.join("Beta_Integrations/Beta")).unwrap();
        fs::write(root.join("Beta_Integrations/Beta/integration.yml"), "name: Beta\n").unwrap();
        fs::create_dir_all(root.join("Layouts")).unwrap();
        fs::write(root.join("Layouts/notes.txt"), "not content").unwrap();

        let unifier = PackageUnifier::new(root);
        let (files, findings) = find_content_files(&repo_config(root), &unifier);
        assert!(findings.is_empty(), "{findings:?}");
        assert_eq!(
            files,
            vec![
                (
                    "Beta_Integrations/Beta/integration.yml".to_owned(),
                    ContentType::BetaIntegration
                ),
                ("Scripts/Hello/script.yml".to_owned(), ContentType::Script),
            ]
        );
    }

    #[test]
    fn test_package_without_definition() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("Integrations/Empty")).unwrap();
        fs::write(root.join("Integrations/Empty/Empty.py"), "pass\n").unwrap();

        let unifier = PackageUnifier::new(root);
        let (files, findings) = find_content_files(&repo_config(root), &unifier);
        assert!(files.is_empty());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].file, "Integrations/Empty");
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let tmp = TempDir::new().unwrap();
        let mut config = repo_config(tmp.path());
        config.exclude = vec!["[".to_owned()];
        let (_, findings) = find_content_files(&config, &PackageUnifier::new(tmp.path()));
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("invalid exclude"));
    }
}
