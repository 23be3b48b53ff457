//! Findings produced by a validation run.

use serde::Serialize;

/// What kind of problem a finding reports.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum FindingKind {
    /// The file failed a schema, semantic or compatibility check, or could
    /// not be read at all.
    Structural,
    /// A path could not be classified. Never fails the run.
    ClassificationWarning,
    /// A requested store (test registry, id registry) is missing or broken.
    Configuration,
    /// A legacy unified file without a `toversion` ceiling.
    LegacyFormat,
    /// A version-control query failed.
    Vcs,
}

/// A single problem found during validation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct Finding {
    /// Repository-relative file the finding is about; empty when not tied to a file.
    pub file: String,
    pub kind: FindingKind,
    /// Human-readable description.
    pub message: String,
    /// Raised by an advisory pass; never counts against the verdict.
    pub advisory: bool,
}

impl Finding {
    #[must_use]
    pub fn new(kind: FindingKind, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            kind,
            message: message.into(),
            advisory: false,
        }
    }

    #[must_use]
    pub fn structural(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FindingKind::Structural, file, message)
    }

    #[must_use]
    pub fn warning(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FindingKind::ClassificationWarning, file, message)
    }

    #[must_use]
    pub fn configuration(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FindingKind::Configuration, file, message)
    }

    #[must_use]
    pub fn legacy_format(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FindingKind::LegacyFormat, file, message)
    }

    #[must_use]
    pub fn vcs(message: impl Into<String>) -> Self {
        Self::new(FindingKind::Vcs, "", message)
    }

    /// Whether this finding fails the verdict when recorded outside an
    /// advisory pass.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.kind != FindingKind::ClassificationWarning
    }

    /// Format the finding for human-readable output.
    ///
    /// Messages from content checks already start with the file path, so the
    /// path is only prepended when missing.
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        let label = match self.kind {
            FindingKind::Structural => "error",
            FindingKind::ClassificationWarning => "warning",
            FindingKind::Configuration => "config",
            FindingKind::LegacyFormat => "old format",
            FindingKind::Vcs => "git",
        };
        let advisory = if self.advisory { " (advisory)" } else { "" };
        if self.file.is_empty() || self.message.starts_with(&self.file) {
            format!("[{label}]{advisory} {}", self.message)
        } else {
            format!("[{label}]{advisory} {}: {}", self.file, self.message)
        }
    }
}
