//! The run-wide pass/fail accumulator.

use crate::error::Finding;

/// Pass/fail state of one orchestration run.
///
/// Starts valid and only ever flips to invalid, except when an advisory pass
/// restores a [`Checkpoint`].
#[derive(Debug, Clone)]
pub struct Verdict {
    is_valid: bool,
    findings: Vec<Finding>,
}

/// State of a [`Verdict`] before an advisory pass.
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    is_valid: bool,
    findings: usize,
}

impl Default for Verdict {
    fn default() -> Self {
        Self::new()
    }
}

impl Verdict {
    #[must_use]
    pub fn new() -> Self {
        Self {
            is_valid: true,
            findings: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Record a finding. Anything but a classification warning fails the run.
    pub fn record(&mut self, finding: Finding) {
        if finding.is_failure() {
            self.is_valid = false;
        }
        self.findings.push(finding);
    }

    pub fn record_all(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            self.record(finding);
        }
    }

    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            is_valid: self.is_valid,
            findings: self.findings.len(),
        }
    }

    /// Restore the validity saved in `checkpoint`.
    ///
    /// Findings recorded since then are kept but marked advisory.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.is_valid = checkpoint.is_valid;
        for finding in self.findings.iter_mut().skip(checkpoint.findings) {
            finding.advisory = true;
        }
    }

    /// Reset to a fresh, valid state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_is_sticky() {
        let mut verdict = Verdict::new();
        verdict.record(Finding::structural("a", "bad"));
        verdict.record(Finding::warning("b", "odd"));
        assert!(!verdict.is_valid());
    }

    #[test]
    fn test_warning_keeps_valid() {
        let mut verdict = Verdict::new();
        verdict.record(Finding::warning("b", "odd"));
        assert!(verdict.is_valid());
        assert_eq!(verdict.findings().len(), 1);
    }

    #[test]
    fn test_restore_marks_advisory() {
        let mut verdict = Verdict::new();
        verdict.record(Finding::structural("a", "before"));
        let checkpoint = verdict.checkpoint();
        verdict.record(Finding::structural("b", "during"));
        verdict.restore(checkpoint);
        assert!(!verdict.is_valid());
        assert!(!verdict.findings()[0].advisory);
        assert!(verdict.findings()[1].advisory);

        let mut verdict = Verdict::new();
        let checkpoint = verdict.checkpoint();
        verdict.record(Finding::structural("b", "during"));
        verdict.restore(checkpoint);
        assert!(verdict.is_valid());
    }
}
