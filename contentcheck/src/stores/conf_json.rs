use std::collections::BTreeMap;

use serde::Deserialize;

use crate::check::{CheckResult, fail};
use crate::error::ContentError;
use crate::loader::ContentLoader;

/// One registered test playbook.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestEntry {
    #[serde(rename = "playbookID", default)]
    pub playbook_id: String,
}

/// The test registry (`Tests/conf.json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfJson {
    #[serde(default)]
    pub tests: Vec<TestEntry>,
    /// Skipped test playbook id to the reason it is skipped.
    #[serde(default)]
    pub skipped_tests: BTreeMap<String, String>,
    #[serde(default)]
    pub skipped_integrations: BTreeMap<String, String>,
}

impl ConfJson {
    /// Load the registry at repository-relative `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid registry.
    pub fn load(loader: &dyn ContentLoader, path: &str) -> Result<Self, ContentError> {
        super::load_json(loader, path)
    }

    /// Every skipped test and integration must state why.
    ///
    /// # Errors
    ///
    /// Returns one problem per entry with an empty reason.
    pub fn is_valid_conf_json(&self) -> CheckResult {
        let problems: Vec<String> = self
            .skipped_tests
            .iter()
            .map(|(id, reason)| ("test", id, reason))
            .chain(
                self.skipped_integrations
                    .iter()
                    .map(|(id, reason)| ("integration", id, reason)),
            )
            .filter(|(_, _, reason)| reason.trim().is_empty())
            .map(|(kind, id, _)| format!("conf.json: skipped {kind} '{id}' has no reason"))
            .collect();
        if problems.is_empty() { Ok(()) } else { Err(problems) }
    }

    /// An added test playbook must be registered in `tests`.
    ///
    /// # Errors
    ///
    /// Returns a problem when `test_id` is not registered.
    pub fn is_test_in_conf_json(&self, test_id: &str) -> CheckResult {
        if self.tests.iter().any(|t| t.playbook_id == test_id) {
            Ok(())
        } else {
            fail(format!(
                "test playbook '{test_id}' is not registered in conf.json"
            ))
        }
    }
}
