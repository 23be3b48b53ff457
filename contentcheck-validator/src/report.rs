//! Validation report types.

use serde::Serialize;

use crate::error::{Finding, FindingKind};

/// Which sweep the orchestrator ran.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum SweepMode {
    /// Every content file was checked against its schema.
    FullRepository,
    /// Only the changeset against the baseline was validated.
    Changeset,
    /// Modified files were compared against the previous version.
    PreviousVersion,
}

/// Result of a validation run.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct ValidationReport {
    /// The verdict. Advisory findings never affect it.
    pub ok: bool,
    /// Sweeps that ran, in order.
    pub modes: Vec<SweepMode>,
    /// Number of files handed to validators (a file seen by two sweeps counts twice).
    pub validated_files: usize,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    /// Number of findings that count against the verdict.
    #[must_use]
    pub fn errors_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.is_failure() && !f.advisory)
            .count()
    }

    #[must_use]
    pub fn warnings_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.kind == FindingKind::ClassificationWarning)
            .count()
    }

    /// Whether `mode` ran.
    #[must_use]
    pub fn ran(&self, mode: SweepMode) -> bool {
        self.modes.contains(&mode)
    }
}
