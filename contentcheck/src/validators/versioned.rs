use crate::check::{CheckResult, ContentCheck, expect_default_version};
use crate::document::ContentDocument;

/// Validator for plain JSON items (layouts, dashboards, widgets, reports,
/// classifiers, reputations, incident types) whose only rule is the version.
#[derive(Debug)]
pub struct VersionedValidator<'a> {
    doc: &'a ContentDocument,
}

impl<'a> VersionedValidator<'a> {
    #[must_use]
    pub fn new(doc: &'a ContentDocument) -> Self {
        Self { doc }
    }
}

impl ContentCheck for VersionedValidator<'_> {
    fn is_valid(&self) -> CheckResult {
        self.is_valid_version()
    }

    fn is_valid_version(&self) -> CheckResult {
        // Legacy reputation lists carry no version at all.
        if self.doc.version().is_none() && self.doc.has_key("reputations") {
            return Ok(());
        }
        expect_default_version(self.doc.path(), self.doc.version())
    }
}
