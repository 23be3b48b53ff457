//! Classified files and the change partition built from them.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use contentcheck::ContentType;
use serde::Serialize;

use crate::diff::DiffStatus;

/// A diff record resolved to the definition file it concerns.
///
/// Identity (equality and ordering) is the `(path, old_path)` pair. The
/// remaining fields are derived from it and do not take part in set algebra.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedFile {
    /// Canonical path: the definition file, never a code file.
    pub path: String,
    /// Source path of a rename that kept its own identity.
    pub old_path: Option<String>,
    pub change: DiffStatus,
    pub content_type: Option<ContentType>,
    pub old_format: bool,
}

impl ClassifiedFile {
    fn key(&self) -> (&str, Option<&str>) {
        (&self.path, self.old_path.as_deref())
    }
}

impl PartialEq for ClassifiedFile {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ClassifiedFile {}

impl PartialOrd for ClassifiedFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassifiedFile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Set a classified file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Modified,
    Added,
    Deleted,
    OldFormat,
}

/// Partition of one diff into modified, added, deleted and old-format files.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    pub modified: BTreeSet<ClassifiedFile>,
    pub added: BTreeSet<ClassifiedFile>,
    pub deleted: BTreeSet<ClassifiedFile>,
    pub old_format: BTreeSet<ClassifiedFile>,
}

impl FileSet {
    pub fn insert(&mut self, bucket: Bucket, file: ClassifiedFile) {
        match bucket {
            Bucket::Modified => self.modified.insert(file),
            Bucket::Added => self.added.insert(file),
            Bucket::Deleted => self.deleted.insert(file),
            Bucket::OldFormat => self.old_format.insert(file),
        };
    }

    /// Canonical paths of the files in `set`.
    #[must_use]
    pub fn paths(set: &BTreeSet<ClassifiedFile>) -> BTreeSet<&str> {
        set.iter().map(|f| f.path.as_str()).collect()
    }
}

/// The final changeset handed to validation.
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    pub modified: BTreeSet<ClassifiedFile>,
    pub added: BTreeSet<ClassifiedFile>,
    pub old_format: BTreeSet<ClassifiedFile>,
}

impl Changeset {
    /// Whether any modified path is a schema definition.
    #[must_use]
    pub fn has_schema_change(&self) -> bool {
        self.modified
            .iter()
            .any(|f| contentcheck::patterns::is_schema_file(&f.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, change: DiffStatus) -> ClassifiedFile {
        ClassifiedFile {
            path: path.to_owned(),
            old_path: None,
            change,
            content_type: None,
            old_format: false,
        }
    }

    #[test]
    fn test_identity_ignores_derived_fields() {
        let a = file("Scripts/script-a.yml", DiffStatus::Modified);
        let b = file("Scripts/script-a.yml", DiffStatus::Renamed);
        assert_eq!(a, b);

        let mut renamed = file("Scripts/script-a.yml", DiffStatus::Renamed);
        renamed.old_path = Some("Scripts/script-old.yml".to_owned());
        assert_ne!(a, renamed);
    }

    #[test]
    fn test_schema_change() {
        let mut changeset = Changeset::default();
        changeset.modified.insert(file("Scripts/script-a.yml", DiffStatus::Modified));
        assert!(!changeset.has_schema_change());
        changeset.modified.insert(file("Tests/schemas/script.yml", DiffStatus::Modified));
        assert!(changeset.has_schema_change());
    }
}
