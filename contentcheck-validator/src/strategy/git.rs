//! Version control through the `git` command line.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, anyhow};
use tracing::debug;

use crate::vcs::{DiffTarget, Vcs};

/// [`Vcs`] backed by the `git` binary, run inside the repository root.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<String> {
        debug!(args = %args.join(" "), "git");
        let out = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .with_context(|| format!("run git {}", args.join(" ")))?;
        if !out.status.success() {
            return Err(anyhow!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&out.stderr).trim()
            ));
        }
        String::from_utf8(out.stdout).with_context(|| format!("git {} printed invalid UTF-8", args.join(" ")))
    }
}

/// Command line arguments of the diff for `target`.
fn diff_args(target: &DiffTarget) -> Vec<String> {
    let mut args = vec!["diff".to_owned(), "--name-status".to_owned()];
    match target {
        DiffTarget::Range { base, head, merge_base } => {
            let dots = if *merge_base { "..." } else { ".." };
            args.push(format!("{base}{dots}refs/heads/{head}"));
        }
        DiffTarget::WorkingTree => {
            args.push("--no-merges".to_owned());
            args.push("HEAD".to_owned());
        }
        DiffTarget::Direct { base } => args.push(base.clone()),
    }
    args
}

impl Vcs for GitCli {
    fn current_branch(&self) -> anyhow::Result<String> {
        Ok(self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?.trim().to_owned())
    }

    fn diff_name_status(&self, target: &DiffTarget) -> anyhow::Result<String> {
        let args = diff_args(target);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args)
    }

    fn show_file(&self, rev: &str, path: &str) -> anyhow::Result<String> {
        self.run(&["show", &format!("{rev}:{path}")])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_range_forms() {
        let two_dot = DiffTarget::Range {
            base: "origin/master".to_owned(),
            head: "feature".to_owned(),
            merge_base: false,
        };
        assert_eq!(
            diff_args(&two_dot),
            ["diff", "--name-status", "origin/master..refs/heads/feature"]
        );

        let three_dot = DiffTarget::Range {
            base: "20.1.0".to_owned(),
            head: "feature".to_owned(),
            merge_base: true,
        };
        assert_eq!(diff_args(&three_dot)[2], "20.1.0...refs/heads/feature");
    }

    #[test]
    fn test_local_forms() {
        assert_eq!(
            diff_args(&DiffTarget::WorkingTree),
            ["diff", "--name-status", "--no-merges", "HEAD"]
        );
        assert_eq!(
            diff_args(&DiffTarget::Direct {
                base: "origin/master".to_owned()
            }),
            ["diff", "--name-status", "origin/master"]
        );
    }

    #[test]
    fn test_outside_repository_fails() {
        let tmp = tempfile::TempDir::new().unwrap();
        let git = GitCli::new(tmp.path().join("missing"));
        assert!(git.current_branch().is_err());
    }
}
