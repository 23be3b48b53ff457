use std::collections::{BTreeSet, VecDeque};

use serde_json::Value;

use super::expect_id_equals_name;
use crate::check::{CheckResult, ContentCheck, all_of, expect_default_version, fail};
use crate::document::ContentDocument;

/// Validator for playbooks and test playbooks.
#[derive(Debug)]
pub struct PlaybookValidator<'a> {
    doc: &'a ContentDocument,
}

impl<'a> PlaybookValidator<'a> {
    #[must_use]
    pub fn new(doc: &'a ContentDocument) -> Self {
        Self { doc }
    }

    /// Every task must be reachable from `starttaskid` through `nexttasks`.
    ///
    /// # Errors
    ///
    /// Returns the problems found.
    pub fn is_root_connected_to_all_tasks(&self) -> CheckResult {
        let Some(tasks) = self.doc.get("tasks").and_then(Value::as_object) else {
            return Ok(());
        };
        let Some(start) = self.doc.get("starttaskid").and_then(Value::as_str) else {
            return fail(format!("{}: playbook has no starttaskid", self.doc.path()));
        };

        let mut reached = BTreeSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(task_id) = queue.pop_front() {
            if !reached.insert(task_id) {
                continue;
            }
            let next = tasks
                .get(task_id)
                .and_then(|task| task.get("nexttasks"))
                .and_then(Value::as_object);
            for branch in next.into_iter().flat_map(|m| m.values()) {
                queue.extend(branch.as_array().into_iter().flatten().filter_map(Value::as_str));
            }
        }

        let orphans: Vec<&str> = tasks
            .keys()
            .map(String::as_str)
            .filter(|id| !reached.contains(id))
            .collect();
        if orphans.is_empty() {
            Ok(())
        } else {
            fail(format!(
                "{}: tasks not connected to the start task: {}",
                self.doc.path(),
                orphans.join(", ")
            ))
        }
    }
}

impl ContentCheck for PlaybookValidator<'_> {
    fn is_valid(&self) -> CheckResult {
        all_of([
            self.is_valid_version(),
            self.is_id_equals_name(),
            self.is_root_connected_to_all_tasks(),
        ])
    }

    fn is_valid_version(&self) -> CheckResult {
        expect_default_version(self.doc.path(), self.doc.version())
    }

    fn is_id_equals_name(&self) -> CheckResult {
        expect_id_equals_name(self.doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn playbook(tasks: Value) -> ContentDocument {
        ContentDocument::new(
            "Playbooks/playbook-Foo.yml",
            json!({"id": "Foo", "name": "Foo", "version": -1, "starttaskid": "0", "tasks": tasks}),
        )
    }

    #[test]
    fn test_connected_playbook() {
        let doc = playbook(json!({
            "0": {"id": "0", "type": "start", "nexttasks": {"#none#": ["1"]}},
            "1": {"id": "1", "type": "condition", "nexttasks": {"yes": ["2"], "#default#": ["2"]}},
            "2": {"id": "2", "type": "title"}
        }));
        assert!(PlaybookValidator::new(&doc).is_valid().is_ok());
    }

    #[test]
    fn test_orphan_task() {
        let doc = playbook(json!({
            "0": {"id": "0", "type": "start", "nexttasks": {"#none#": ["1"]}},
            "1": {"id": "1", "type": "title"},
            "7": {"id": "7", "type": "regular"}
        }));
        let problems = PlaybookValidator::new(&doc).is_root_connected_to_all_tasks().unwrap_err();
        assert!(problems[0].ends_with(": 7"), "{problems:?}");
    }

    #[test]
    fn test_cycle_terminates() {
        let doc = playbook(json!({
            "0": {"id": "0", "type": "start", "nexttasks": {"#none#": ["1"]}},
            "1": {"id": "1", "type": "regular", "nexttasks": {"#none#": ["0"]}}
        }));
        assert!(PlaybookValidator::new(&doc).is_root_connected_to_all_tasks().is_ok());
    }
}
