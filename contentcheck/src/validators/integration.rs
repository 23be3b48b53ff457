use std::collections::BTreeMap;

use serde_json::Value;

use super::{
    argument_map, compare_arguments, compare_context_paths, context_paths, duplicates,
    expect_id_equals_name, expect_valid_subtype, into_result, names_of,
};
use crate::check::{CheckResult, ContentCheck, all_of, expect_default_version, fail};
use crate::content_type::ContentType;
use crate::document::ContentDocument;

/// Validator for integration definitions, regular or beta.
#[derive(Debug)]
pub struct IntegrationValidator<'a> {
    doc: &'a ContentDocument,
    old: Option<&'a ContentDocument>,
    beta: bool,
    is_new: bool,
}

impl<'a> IntegrationValidator<'a> {
    #[must_use]
    pub fn new(doc: &'a ContentDocument) -> Self {
        Self {
            doc,
            old: None,
            beta: false,
            is_new: false,
        }
    }

    #[must_use]
    pub fn beta(mut self, beta: bool) -> Self {
        self.beta = beta;
        self
    }

    #[must_use]
    pub fn with_previous(mut self, old: Option<&'a ContentDocument>) -> Self {
        self.old = old;
        self
    }

    /// Mark the integration as newly added.
    #[must_use]
    pub fn new_file(mut self, is_new: bool) -> Self {
        self.is_new = is_new;
        self
    }

    fn content_type(&self) -> ContentType {
        if self.beta {
            ContentType::BetaIntegration
        } else {
            ContentType::Integration
        }
    }

    fn commands(doc: &ContentDocument) -> BTreeMap<&str, &Value> {
        doc.value()
            .pointer("/script/commands")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|cmd| Some((cmd.get("name")?.as_str()?, cmd)))
            .collect()
    }

    /// # Errors
    ///
    /// Returns the problems found.
    pub fn is_valid_subtype(&self) -> CheckResult {
        let language = self.doc.script_type(self.content_type());
        expect_valid_subtype(self.doc, language, self.doc.value().pointer("/script/subtype"))
    }

    /// # Errors
    ///
    /// Returns the problems found.
    pub fn has_no_duplicate_params(&self) -> CheckResult {
        let dups = duplicates(names_of(self.doc.get("configuration")));
        if dups.is_empty() {
            Ok(())
        } else {
            fail(format!(
                "{}: duplicate parameters: {}",
                self.doc.path(),
                dups.join(", ")
            ))
        }
    }

    /// # Errors
    ///
    /// Returns the problems found.
    pub fn has_no_duplicate_args(&self) -> CheckResult {
        let mut problems = Vec::new();
        for (name, cmd) in Self::commands(self.doc) {
            let dups = duplicates(names_of(cmd.get("arguments")));
            if !dups.is_empty() {
                problems.push(format!(
                    "{}: command '{name}' has duplicate arguments: {}",
                    self.doc.path(),
                    dups.join(", ")
                ));
            }
        }
        into_result(problems)
    }

    /// Beta integrations carry `beta: true`; new ones are named as beta in
    /// their display name only.
    ///
    /// # Errors
    ///
    /// Returns the problems found.
    pub fn is_valid_beta(&self) -> CheckResult {
        let mut problems = Vec::new();
        let path = self.doc.path();
        if self.doc.get("beta").and_then(Value::as_bool) != Some(true) {
            problems.push(format!("{path}: beta integrations must set 'beta: true'"));
        }
        if self.is_new {
            let contains_beta = |s: Option<&str>| s.is_some_and(|s| s.to_lowercase().contains("beta"));
            if contains_beta(self.doc.id()) {
                problems.push(format!("{path}: id of a new beta integration must not contain 'beta'"));
            }
            if contains_beta(self.doc.name()) {
                problems.push(format!("{path}: name of a new beta integration must not contain 'beta'"));
            }
            if !contains_beta(self.doc.get("display").and_then(Value::as_str)) {
                problems.push(format!("{path}: display of a new beta integration must contain 'beta'"));
            }
        }
        into_result(problems)
    }

    /// # Errors
    ///
    /// Returns the problems found.
    pub fn is_docker_image_unchanged(&self) -> CheckResult {
        let Some(old) = self.old else {
            return Ok(());
        };
        let content_type = self.content_type();
        if old.docker_image(content_type) == self.doc.docker_image(content_type) {
            Ok(())
        } else {
            fail(format!(
                "{}: docker image changed from {} to {}",
                self.doc.path(),
                old.docker_image(content_type).unwrap_or("<none>"),
                self.doc.docker_image(content_type).unwrap_or("<none>")
            ))
        }
    }
}

impl ContentCheck for IntegrationValidator<'_> {
    fn is_valid(&self) -> CheckResult {
        let mut checks = vec![
            self.is_valid_version(),
            self.is_valid_subtype(),
            self.has_no_duplicate_params(),
            self.has_no_duplicate_args(),
        ];
        if self.beta {
            checks.push(self.is_valid_beta());
        } else {
            checks.push(self.is_id_equals_name());
        }
        all_of(checks)
    }

    fn is_backward_compatible(&self) -> CheckResult {
        let Some(old) = self.old else {
            return Ok(());
        };
        let path = self.doc.path();
        let mut problems = Vec::new();
        let new_commands = Self::commands(self.doc);

        for (name, old_cmd) in Self::commands(old) {
            let Some(new_cmd) = new_commands.get(name) else {
                problems.push(format!("{path}: command '{name}' was removed"));
                continue;
            };
            let where_ = format!("{path}: command '{name}'");
            compare_arguments(
                &mut problems,
                &where_,
                &argument_map(old_cmd.get("arguments")),
                &argument_map(new_cmd.get("arguments")),
            );
            compare_context_paths(
                &mut problems,
                &where_,
                &context_paths(old_cmd.get("outputs")),
                &context_paths(new_cmd.get("outputs")),
            );
        }

        if let Err(docker) = self.is_docker_image_unchanged() {
            problems.extend(docker);
        }
        into_result(problems)
    }

    fn is_valid_version(&self) -> CheckResult {
        expect_default_version(self.doc.path(), self.doc.version())
    }

    fn is_id_equals_name(&self) -> CheckResult {
        expect_id_equals_name(self.doc)
    }
}
