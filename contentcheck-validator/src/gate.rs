//! Rejection of legacy unified content.

use std::collections::BTreeSet;

use contentcheck::ContentLoader;
use tracing::error;

use crate::error::Finding;
use crate::fileset::ClassifiedFile;

const MIGRATION_HINT: &str = "update the file to the package format";

/// Fails legacy unified files that are still the latest revision.
///
/// A file capped by `toversion` is historical and exempt.
pub struct OldFormatGate<'a> {
    loader: &'a dyn ContentLoader,
}

impl<'a> OldFormatGate<'a> {
    #[must_use]
    pub fn new(loader: &'a dyn ContentLoader) -> Self {
        Self { loader }
    }

    /// Findings for every file in `files` that must be migrated or could not be read.
    #[must_use]
    pub fn check(&self, files: &BTreeSet<ClassifiedFile>) -> Vec<Finding> {
        let mut findings = Vec::new();
        for file in files {
            match self.loader.load(&file.path) {
                Ok(doc) if doc.has_to_version() => {}
                Ok(_) => {
                    error!(path = %file.path, "old format file without toversion");
                    findings.push(Finding::legacy_format(
                        file.path.as_str(),
                        format!("{}: {MIGRATION_HINT}", file.path),
                    ));
                }
                Err(e) => findings.push(Finding::structural(file.path.as_str(), e.to_string())),
            }
        }
        findings
    }
}
