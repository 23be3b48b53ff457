//! The version-control seam.
//!
//! Everything the pipeline needs from version control is a branch name, diff
//! text and file content at a revision. Tests substitute captured output.

/// Which comparison to diff.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiffTarget {
    /// Committed changes between `base` and the branch `head`.
    ///
    /// `merge_base` selects the three-dot form, comparing against the last
    /// shared commit instead of `base` itself.
    Range {
        base: String,
        head: String,
        merge_base: bool,
    },
    /// Uncommitted changes in the working tree relative to `HEAD`.
    WorkingTree,
    /// The working tree against `base`, not bounded by the branch head.
    Direct { base: String },
}

/// Read-only version-control queries.
pub trait Vcs {
    /// Name of the checked-out branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be queried.
    fn current_branch(&self) -> anyhow::Result<String>;

    /// `--name-status` diff text for `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the diff cannot be computed.
    fn diff_name_status(&self, target: &DiffTarget) -> anyhow::Result<String>;

    /// Content of `path` at revision `rev`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist at `rev`.
    fn show_file(&self, rev: &str, path: &str) -> anyhow::Result<String>;
}
