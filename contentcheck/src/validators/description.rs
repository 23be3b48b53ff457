use crate::check::{CheckResult, ContentCheck, fail};

/// Disclaimer every beta integration description must contain.
pub const BETA_DISCLAIMER: &str = "Note: This is a beta Integration";

/// Validator for integration detailed descriptions.
#[derive(Debug)]
pub struct DescriptionValidator {
    path: String,
    description_file: Option<String>,
    detailed_in_definition: Option<String>,
    beta: bool,
}

impl DescriptionValidator {
    /// `description_file` is the content of the package description file,
    /// `detailed_in_definition` the `detaileddescription` field of the yml.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        description_file: Option<String>,
        detailed_in_definition: Option<String>,
    ) -> Self {
        Self {
            path: path.into(),
            description_file,
            detailed_in_definition,
            beta: false,
        }
    }

    #[must_use]
    pub fn beta(mut self, beta: bool) -> Self {
        self.beta = beta;
        self
    }

    /// The beta disclaimer appears in whichever description the integration has.
    ///
    /// # Errors
    ///
    /// Returns the problems found.
    pub fn is_valid_beta_description(&self) -> CheckResult {
        let text = self
            .description_file
            .as_deref()
            .or(self.detailed_in_definition.as_deref())
            .unwrap_or_default();
        if text.contains(BETA_DISCLAIMER) {
            Ok(())
        } else {
            fail(format!(
                "{}: beta integration description must contain \"{BETA_DISCLAIMER}\"",
                self.path
            ))
        }
    }
}

impl ContentCheck for DescriptionValidator {
    fn is_valid(&self) -> CheckResult {
        if self.description_file.is_some()
            && self
                .detailed_in_definition
                .as_deref()
                .is_some_and(|d| !d.trim().is_empty())
        {
            return fail(format!(
                "{}: found both a description file and a detaileddescription field, keep only the file",
                self.path
            ));
        }
        if self.beta {
            return self.is_valid_beta_description();
        }
        Ok(())
    }
}
