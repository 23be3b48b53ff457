//! Configuration types for a validation run.
//!
//! Split into run options (what to validate and how strictly) and repository
//! options (where content and its supporting stores live).

use std::path::PathBuf;

use contentcheck::loader::DEFAULT_MAX_FILE_SIZE;

/// Options controlling which sweeps run and which checks are enabled.
#[derive(Debug, Clone)]
#[non_exhaustive]
#[allow(clippy::struct_excessive_bools)]
pub struct ValidateConfig {
    /// Compare modified files with their previous revision.
    pub backward_check: bool,
    /// Baseline ref for the changeset and previous-version sweeps.
    pub prev_ver: String,
    /// Query version control. Without it the whole repository is swept.
    pub use_git: bool,
    /// Running in CI: only the committed diff is considered.
    pub is_ci: bool,
    /// Report files that are neither content nor known auxiliary files.
    pub print_ignored_files: bool,
    /// Validate the test registry and require new test playbooks in it.
    pub validate_conf_json: bool,
    /// Check files against the id registry.
    pub validate_id_set: bool,
    /// Name of the trunk branch.
    pub trunk_branch: String,
    /// Branch to validate instead of the checked-out one. Required on a
    /// detached `HEAD`.
    pub branch: Option<String>,
    /// Branches matching this pattern are release branches and get a full sweep.
    pub release_branch_pattern: String,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            backward_check: true,
            prev_ver: "origin/master".to_owned(),
            use_git: true,
            is_ci: false,
            print_ignored_files: false,
            validate_conf_json: true,
            validate_id_set: false,
            trunk_branch: "master".to_owned(),
            branch: None,
            release_branch_pattern: r"^\d+\.\d+".to_owned(),
        }
    }
}

/// Repository layout options.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct RepoConfig {
    /// Repository root; every other path is relative to it.
    pub root: PathBuf,
    pub conf_json_path: String,
    pub id_set_path: String,
    /// Directory holding schema overrides.
    pub schema_dir: String,
    /// Maximum file size in bytes (default: 10 MB).
    pub max_file_size: u64,
    /// Whether the full sweep follows symbolic links.
    ///
    /// **Defaults to `false`**: a followed link can point outside the
    /// repository. Paths resolving outside the root are rejected either way.
    pub follow_links: bool,
    /// Glob patterns excluded from the full sweep.
    pub exclude: Vec<String>,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            conf_json_path: "Tests/conf.json".to_owned(),
            id_set_path: "Tests/id_set.json".to_owned(),
            schema_dir: "Tests/schemas".to_owned(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            follow_links: false,
            exclude: Vec::new(),
        }
    }
}
