//! Collection of the changeset from version control.
//!
//! CI sees only the committed diff. Local runs additionally consult the
//! working tree so that files deleted or already modified locally do not
//! produce failures for files that are no longer part of the changeset.

use std::collections::{BTreeMap, BTreeSet};

use contentcheck::loader::parse_document;
use contentcheck::{ContentDocument, ContentLoader, patterns};
use tracing::{debug, warn};

use crate::classify::PathClassifier;
use crate::diff::{DiffStatus, parse_diff};
use crate::error::Finding;
use crate::fileset::{Changeset, ClassifiedFile, FileSet};
use crate::vcs::{DiffTarget, Vcs};

const DEFAULT_FROM_VERSION: &str = "0.0.0";
const DEFAULT_TO_VERSION: &str = "99.99.99";

/// Runs the diffs of one collection and reconciles them.
pub struct DiffCollector<'a> {
    vcs: &'a dyn Vcs,
    loader: &'a dyn ContentLoader,
    branch: &'a str,
    trunk: &'a str,
    is_ci: bool,
    print_ignored_files: bool,
}

impl<'a> DiffCollector<'a> {
    #[must_use]
    pub fn new(vcs: &'a dyn Vcs, loader: &'a dyn ContentLoader, branch: &'a str, trunk: &'a str) -> Self {
        Self {
            vcs,
            loader,
            branch,
            trunk,
            is_ci: false,
            print_ignored_files: false,
        }
    }

    /// In CI only the committed diff is considered.
    #[must_use]
    pub fn ci(mut self, is_ci: bool) -> Self {
        self.is_ci = is_ci;
        self
    }

    #[must_use]
    pub fn print_ignored_files(mut self, enabled: bool) -> Self {
        self.print_ignored_files = enabled;
        self
    }

    /// Collect the changeset of the current branch against `base_tag`.
    ///
    /// Classification warnings are appended to `warnings`.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the diffs cannot be computed.
    pub fn collect(&self, base_tag: &str, warnings: &mut Vec<Finding>) -> anyhow::Result<Changeset> {
        let committed_target = DiffTarget::Range {
            base: base_tag.to_owned(),
            head: self.branch.to_owned(),
            merge_base: !base_tag.contains(self.trunk),
        };
        let committed = self.files_from_diff(&committed_target, base_tag, warnings)?;

        if self.is_ci {
            return Ok(reconcile(committed, None));
        }

        // Files deleted in the working tree still exist at HEAD.
        let working_tree = self.files_from_diff(&DiffTarget::WorkingTree, "HEAD", warnings)?;
        let direct = self.files_from_diff(
            &DiffTarget::Direct {
                base: base_tag.to_owned(),
            },
            base_tag,
            warnings,
        )?;
        Ok(reconcile(committed, Some(LocalDiffs { working_tree, direct })))
    }

    /// Classify the diff for `target` and fold package migrations into
    /// renames, reading deleted files at `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the diff cannot be computed.
    pub fn files_from_diff(
        &self,
        target: &DiffTarget,
        tag: &str,
        warnings: &mut Vec<Finding>,
    ) -> anyhow::Result<FileSet> {
        let text = self.vcs.diff_name_status(target)?;
        debug!(?target, lines = text.lines().count(), "collected diff");
        Ok(self.files_from_text(&text, tag, warnings))
    }

    /// Same as [`Self::files_from_diff`] for already captured diff text.
    pub fn files_from_text(&self, text: &str, tag: &str, warnings: &mut Vec<Finding>) -> FileSet {
        let (records, parse_warnings) = parse_diff(text);
        warnings.extend(parse_warnings);

        let classifier = PathClassifier::new(self.loader).print_ignored_files(self.print_ignored_files);
        let mut set = FileSet::default();
        for record in &records {
            if let Some((bucket, file)) = classifier.classify(record, warnings) {
                set.insert(bucket, file);
            }
        }
        self.packagify(&mut set, tag);
        set
    }

    /// A unified file deleted and re-added as a package is a rename.
    ///
    /// Deleted files in package directories are read at `tag` and keyed by
    /// `name_fromversion_toversion`; an added package file with the same key
    /// becomes a renamed modification. Every modified path is then removed
    /// from the added set.
    fn packagify(&self, set: &mut FileSet, tag: &str) {
        let mut removed_by_key: BTreeMap<String, ClassifiedFile> = BTreeMap::new();
        for file in &set.deleted {
            if !in_package_dir(&file.path) {
                continue;
            }
            let doc = self
                .vcs
                .show_file(tag, &file.path)
                .map_err(|e| format!("{e:#}"))
                .and_then(|text| {
                    parse_document(&file.path, &text).map_err(|e| format!("{e:#}"))
                });
            match doc {
                Ok(doc) => match package_key(&doc) {
                    Some(key) => {
                        removed_by_key.insert(key, file.clone());
                    }
                    None => debug!(path = %file.path, "deleted file has no name"),
                },
                Err(e) => warn!(path = %file.path, tag, error = %e, "cannot read deleted file"),
            }
        }

        let mut added = BTreeSet::new();
        for file in std::mem::take(&mut set.added) {
            if in_package_dir(&file.path)
                && let Ok(doc) = self.loader.load(&file.path)
                && let Some(key) = package_key(&doc)
                && let Some(removed) = removed_by_key.get(&key)
            {
                debug!(from = %removed.path, to = %file.path, "package migration");
                set.deleted.remove(removed);
                set.modified.insert(ClassifiedFile {
                    old_path: Some(removed.path.clone()),
                    change: DiffStatus::Renamed,
                    ..file
                });
                continue;
            }
            added.insert(file);
        }

        let modified = FileSet::paths(&set.modified);
        added.retain(|f| !modified.contains(f.path.as_str()));
        set.added = added;
    }
}

/// Working-tree and direct diffs of a local run.
#[derive(Debug, Clone, Default)]
pub struct LocalDiffs {
    /// Uncommitted changes relative to `HEAD`.
    pub working_tree: FileSet,
    /// The working tree against the base tag.
    pub direct: FileSet,
}

/// Reconcile the committed diff with the local diffs.
///
/// - old format = committed ∪ working tree
/// - modified = committed ∪ (direct ∩ working tree)
/// - added = committed ∪ (direct ∩ working tree)
///
/// then drop every path deleted in the working tree from modified and added,
/// and every path modified in the working tree from added.
#[must_use]
pub fn reconcile(committed: FileSet, local: Option<LocalDiffs>) -> Changeset {
    let FileSet {
        mut modified,
        mut added,
        mut old_format,
        ..
    } = committed;

    let Some(LocalDiffs { working_tree, direct }) = local else {
        return Changeset {
            modified,
            added,
            old_format,
        };
    };

    old_format.extend(working_tree.old_format.iter().cloned());
    modified.extend(direct.modified.intersection(&working_tree.modified).cloned());
    added.extend(direct.added.intersection(&working_tree.added).cloned());

    let deleted = FileSet::paths(&working_tree.deleted);
    let locally_modified = FileSet::paths(&working_tree.modified);
    modified.retain(|f| !deleted.contains(f.path.as_str()));
    added.retain(|f| !deleted.contains(f.path.as_str()) && !locally_modified.contains(f.path.as_str()));

    Changeset {
        modified,
        added,
        old_format,
    }
}

fn in_package_dir(path: &str) -> bool {
    patterns::PACKAGE_DIRS.contains(&patterns::top_level_dir(path))
}

/// `name_fromversion_toversion`, or `None` for a document without a name.
fn package_key(doc: &ContentDocument) -> Option<String> {
    let name = doc.name().filter(|name| !name.is_empty())?;
    Some(format!(
        "{name}_{}_{}",
        doc.from_version().as_deref().unwrap_or(DEFAULT_FROM_VERSION),
        doc.to_version().as_deref().unwrap_or(DEFAULT_TO_VERSION)
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::fileset::Bucket;
    use contentcheck::ContentError;
    use std::collections::HashMap;

    /// In-memory working tree keyed by repository-relative path.
    struct MapLoader(HashMap<&'static str, &'static str>);

    impl ContentLoader for MapLoader {
        fn read_bytes(&self, path: &str) -> Result<Vec<u8>, ContentError> {
            self.0
                .get(path)
                .map(|s| s.as_bytes().to_vec())
                .ok_or_else(|| ContentError::Io {
                    path: path.to_owned(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
        }

        fn exists(&self, path: &str) -> bool {
            self.0.contains_key(path)
        }
    }

    /// Serves file content at one revision; diffs are never queried.
    struct RevisionVcs(HashMap<(&'static str, &'static str), &'static str>);

    impl Vcs for RevisionVcs {
        fn current_branch(&self) -> anyhow::Result<String> {
            Ok("feature".to_owned())
        }

        fn diff_name_status(&self, target: &DiffTarget) -> anyhow::Result<String> {
            anyhow::bail!("no diff for {target:?}")
        }

        fn show_file(&self, rev: &str, path: &str) -> anyhow::Result<String> {
            self.0
                .iter()
                .find(|((at, file), _)| *at == rev && *file == path)
                .map(|(_, content)| (*content).to_owned())
                .ok_or_else(|| anyhow::anyhow!("{path} does not exist at {rev}"))
        }
    }

    fn collect_text(vcs: &RevisionVcs, loader: &MapLoader, text: &str) -> FileSet {
        let collector = DiffCollector::new(vcs, loader, "feature", "master");
        let mut warnings = Vec::new();
        let set = collector.files_from_text(text, "origin/master", &mut warnings);
        assert!(warnings.is_empty(), "{warnings:?}");
        set
    }

    const UNIFIED_FOO: &str = "name: Foo\nscript:\n  type: javascript\n";
    const PACKAGE_FOO: &str = "name: Foo\nscript:\n  type: python\n";

    fn file(path: &str) -> ClassifiedFile {
        ClassifiedFile {
            path: path.to_owned(),
            old_path: None,
            change: DiffStatus::Modified,
            content_type: None,
            old_format: false,
        }
    }

    fn set(entries: &[(Bucket, &str)]) -> FileSet {
        let mut set = FileSet::default();
        for (bucket, path) in entries {
            set.insert(*bucket, file(path));
        }
        set
    }

    fn paths(files: &BTreeSet<ClassifiedFile>) -> Vec<&str> {
        files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_ci_uses_committed_only() {
        let committed = set(&[(Bucket::Modified, "a.yml"), (Bucket::Added, "b.yml")]);
        let changeset = reconcile(committed, None);
        assert_eq!(paths(&changeset.modified), vec!["a.yml"]);
        assert_eq!(paths(&changeset.added), vec!["b.yml"]);
    }

    #[test]
    fn test_modified_then_deleted_locally_is_dropped() {
        let committed = set(&[(Bucket::Modified, "a.yml"), (Bucket::Modified, "keep.yml")]);
        let local = LocalDiffs {
            working_tree: set(&[(Bucket::Deleted, "a.yml")]),
            direct: FileSet::default(),
        };
        let changeset = reconcile(committed, Some(local));
        assert_eq!(paths(&changeset.modified), vec!["keep.yml"]);
    }

    #[test]
    fn test_direct_and_working_tree_intersection() {
        let local = LocalDiffs {
            working_tree: set(&[
                (Bucket::Modified, "both.yml"),
                (Bucket::Modified, "tree-only.yml"),
                (Bucket::Added, "new.yml"),
            ]),
            direct: set(&[
                (Bucket::Modified, "both.yml"),
                (Bucket::Modified, "direct-only.yml"),
                (Bucket::Added, "new.yml"),
            ]),
        };
        let changeset = reconcile(FileSet::default(), Some(local));
        assert_eq!(paths(&changeset.modified), vec!["both.yml"]);
        assert_eq!(paths(&changeset.added), vec!["new.yml"]);
    }

    #[test]
    fn test_added_then_modified_locally_is_not_added() {
        let committed = set(&[(Bucket::Added, "a.yml")]);
        let local = LocalDiffs {
            working_tree: set(&[(Bucket::Modified, "a.yml")]),
            direct: FileSet::default(),
        };
        let changeset = reconcile(committed, Some(local));
        assert!(changeset.added.is_empty());
        assert!(changeset.modified.is_empty());
    }

    #[test]
    fn test_old_format_union() {
        let committed = set(&[(Bucket::OldFormat, "a.yml")]);
        let local = LocalDiffs {
            working_tree: set(&[(Bucket::OldFormat, "b.yml")]),
            direct: FileSet::default(),
        };
        let changeset = reconcile(committed, Some(local));
        assert_eq!(paths(&changeset.old_format), vec!["a.yml", "b.yml"]);
    }

    #[test]
    fn test_unified_file_migrated_to_package_is_a_rename() {
        let vcs = RevisionVcs(HashMap::from([(
            ("origin/master", "Integrations/integration-Foo.yml"),
            UNIFIED_FOO,
        )]));
        let loader = MapLoader(HashMap::from([("Integrations/Foo/Foo.yml", PACKAGE_FOO)]));

        let set = collect_text(
            &vcs,
            &loader,
            "D\tIntegrations/integration-Foo.yml\nA\tIntegrations/Foo/Foo.yml\nA\tIntegrations/Foo/Foo.py\n",
        );

        assert_eq!(set.modified.len(), 1);
        let renamed = set.modified.first().unwrap();
        assert_eq!(renamed.path, "Integrations/Foo/Foo.yml");
        assert_eq!(renamed.old_path.as_deref(), Some("Integrations/integration-Foo.yml"));
        assert_eq!(renamed.change, DiffStatus::Renamed);
        assert!(set.added.is_empty());
        assert!(set.deleted.is_empty());
    }

    #[test]
    fn test_migration_needs_matching_version_range() {
        let vcs = RevisionVcs(HashMap::from([(
            ("origin/master", "Integrations/integration-Foo.yml"),
            "name: Foo\ntoversion: 4.5.0\n",
        )]));
        let loader = MapLoader(HashMap::from([("Integrations/Foo/Foo.yml", PACKAGE_FOO)]));

        let set = collect_text(
            &vcs,
            &loader,
            "D\tIntegrations/integration-Foo.yml\nA\tIntegrations/Foo/Foo.yml\n",
        );

        assert!(set.modified.is_empty());
        assert_eq!(paths(&set.added), vec!["Integrations/Foo/Foo.yml"]);
        assert_eq!(paths(&set.deleted), vec!["Integrations/integration-Foo.yml"]);
    }

    #[test]
    fn test_nameless_files_are_not_paired() {
        let vcs = RevisionVcs(HashMap::from([(
            ("origin/master", "Integrations/integration-A.yml"),
            "commonfields:\n  id: A\n",
        )]));
        let loader = MapLoader(HashMap::from([("Integrations/B/B.yml", "commonfields:\n  id: B\n")]));

        let set = collect_text(&vcs, &loader, "D\tIntegrations/integration-A.yml\nA\tIntegrations/B/B.yml\n");

        assert!(set.modified.is_empty());
        assert_eq!(paths(&set.added), vec!["Integrations/B/B.yml"]);
        assert_eq!(paths(&set.deleted), vec!["Integrations/integration-A.yml"]);
    }

    #[test]
    fn test_code_added_with_modified_definition_stays_disjoint() {
        let vcs = RevisionVcs(HashMap::new());
        let loader = MapLoader(HashMap::from([("Scripts/Foo/Foo.yml", "name: Foo\n")]));

        let set = collect_text(&vcs, &loader, "A\tScripts/Foo/Foo.py\nM\tScripts/Foo/Foo.yml\n");

        assert_eq!(paths(&set.modified), vec!["Scripts/Foo/Foo.yml"]);
        assert!(set.added.is_empty());
        assert!(set.deleted.is_empty());
        assert!(set.old_format.is_empty());
    }
}
