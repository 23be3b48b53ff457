//! # contentcheck-validator
//!
//! Changeset validation pipeline for security-content repositories.
//!
//! The pipeline turns version-control diffs into classified file sets, routes
//! each file to the validators of its content type and folds the results into
//! a single verdict. Version control, file access and package resolution are
//! seams ([`Vcs`], [`contentcheck::ContentLoader`], [`contentcheck::Unifier`])
//! so the whole flow runs against captured diff text in tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use contentcheck_validator::{RepoConfig, ValidateConfig, validate};
//!
//! let mut repo = RepoConfig::default();
//! repo.root = PathBuf::from("content");
//!
//! let mut config = ValidateConfig::default();
//! config.prev_ver = "origin/master".to_owned();
//!
//! let report = validate(&config, &repo).unwrap();
//! println!("Files validated: {}", report.validated_files);
//! println!("Errors: {}", report.errors_count());
//! println!("OK: {}", report.ok);
//! ```

pub mod classify;
pub mod collect;
mod config;
pub mod diff;
mod error;
pub mod fileset;
pub mod gate;
pub mod orchestrator;
pub mod output;
pub mod registry;
mod report;
pub mod router;
pub mod strategy;
pub mod vcs;
pub mod verdict;

pub use config::{RepoConfig, ValidateConfig};
pub use error::{Finding, FindingKind};
pub use orchestrator::{Collaborators, State, ValidationOrchestrator};
pub use report::{SweepMode, ValidationReport};
pub use strategy::git::GitCli;
pub use vcs::{DiffTarget, Vcs};

use contentcheck::{FsLoader, PackageUnifier};

/// Validate the repository at `repo.root`.
///
/// This is the primary public API. It wires the `git` command line, the
/// filesystem loader and the package unifier into a
/// [`ValidationOrchestrator`] and runs it once.
///
/// # Errors
///
/// Returns an error if the repository root does not exist, the embedded
/// schemas fail to compile or the release branch pattern is invalid.
/// Validation problems are never errors; they are reported in the
/// returned report.
pub fn validate(config: &ValidateConfig, repo: &RepoConfig) -> anyhow::Result<ValidationReport> {
    if !repo.root.is_dir() {
        anyhow::bail!("Repository root does not exist: {}", repo.root.display());
    }

    let vcs: Option<Box<dyn Vcs>> = if config.use_git {
        Some(Box::new(GitCli::new(repo.root.clone())))
    } else {
        None
    };
    let collaborators = Collaborators {
        vcs,
        loader: Box::new(FsLoader::new(repo.root.clone()).with_max_file_size(repo.max_file_size)),
        unifier: Box::new(PackageUnifier::new(repo.root.clone())),
    };

    let mut orchestrator = ValidationOrchestrator::new(config.clone(), repo.clone(), collaborators)?;
    Ok(orchestrator.run())
}
