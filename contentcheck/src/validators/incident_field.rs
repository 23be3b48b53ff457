use serde_json::Value;

use super::into_result;
use crate::check::{CheckResult, ContentCheck, all_of, expect_default_version, fail};
use crate::document::ContentDocument;

/// Field names owned by the platform that content may not redefine.
const RESERVED_CLI_NAMES: &[&str] = &[
    "id", "name", "type", "status", "owner", "severity", "created", "modified", "occurred",
    "closed", "labels", "details", "phase", "playbookid", "reason", "sla", "dbotdate",
];

/// Validator for incident field definitions.
#[derive(Debug)]
pub struct IncidentFieldValidator<'a> {
    doc: &'a ContentDocument,
    old: Option<&'a ContentDocument>,
}

impl<'a> IncidentFieldValidator<'a> {
    #[must_use]
    pub fn new(doc: &'a ContentDocument) -> Self {
        Self { doc, old: None }
    }

    #[must_use]
    pub fn with_previous(mut self, old: Option<&'a ContentDocument>) -> Self {
        self.old = old;
        self
    }

    fn cli_name(doc: &ContentDocument) -> Option<&str> {
        doc.get("cliName").and_then(Value::as_str)
    }

    /// # Errors
    ///
    /// Returns the problems found.
    pub fn is_valid_cli_name(&self) -> CheckResult {
        let path = self.doc.path();
        let Some(cli_name) = Self::cli_name(self.doc) else {
            return fail(format!("{path}: cliName is missing"));
        };
        let mut problems = Vec::new();
        if cli_name.is_empty()
            || !cli_name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            problems.push(format!(
                "{path}: cliName '{cli_name}' must contain only lowercase letters and digits"
            ));
        }
        if RESERVED_CLI_NAMES.contains(&cli_name) {
            problems.push(format!("{path}: cliName '{cli_name}' is reserved by the platform"));
        }
        into_result(problems)
    }

    /// Content fields must set `content: true` and may not be system fields.
    ///
    /// # Errors
    ///
    /// Returns the problems found.
    pub fn is_valid_content_flags(&self) -> CheckResult {
        let path = self.doc.path();
        let mut problems = Vec::new();
        if self.doc.get("content").and_then(Value::as_bool) != Some(true) {
            problems.push(format!("{path}: content must be true"));
        }
        if self.doc.get("system").and_then(Value::as_bool) == Some(true) {
            problems.push(format!("{path}: system must be false"));
        }
        into_result(problems)
    }
}

impl ContentCheck for IncidentFieldValidator<'_> {
    fn is_valid(&self) -> CheckResult {
        all_of([
            self.is_valid_version(),
            self.is_valid_cli_name(),
            self.is_valid_content_flags(),
        ])
    }

    fn is_backward_compatible(&self) -> CheckResult {
        let Some(old) = self.old else {
            return Ok(());
        };
        let path = self.doc.path();
        let mut problems = Vec::new();
        let field_type = |doc: &ContentDocument| doc.get("type").and_then(Value::as_str).map(str::to_owned);
        if field_type(old) != field_type(self.doc) {
            problems.push(format!("{path}: field type cannot be changed"));
        }
        if Self::cli_name(old) != Self::cli_name(self.doc) {
            problems.push(format!("{path}: cliName cannot be changed"));
        }
        into_result(problems)
    }

    fn is_valid_version(&self) -> CheckResult {
        expect_default_version(self.doc.path(), self.doc.version())
    }
}
