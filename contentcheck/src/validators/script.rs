use super::{
    argument_map, compare_arguments, compare_context_paths, context_paths, duplicates,
    expect_id_equals_name, expect_valid_subtype, into_result, names_of,
};
use crate::check::{CheckResult, ContentCheck, all_of, expect_default_version, fail};
use crate::content_type::ContentType;
use crate::document::ContentDocument;

/// Validator for script definitions.
#[derive(Debug)]
pub struct ScriptValidator<'a> {
    doc: &'a ContentDocument,
    old: Option<&'a ContentDocument>,
}

impl<'a> ScriptValidator<'a> {
    #[must_use]
    pub fn new(doc: &'a ContentDocument) -> Self {
        Self { doc, old: None }
    }

    #[must_use]
    pub fn with_previous(mut self, old: Option<&'a ContentDocument>) -> Self {
        self.old = old;
        self
    }

    /// # Errors
    ///
    /// Returns the problems found.
    pub fn has_no_duplicate_args(&self) -> CheckResult {
        let dups = duplicates(names_of(self.doc.get("args")));
        if dups.is_empty() {
            Ok(())
        } else {
            fail(format!("{}: duplicate arguments: {}", self.doc.path(), dups.join(", ")))
        }
    }
}

impl ContentCheck for ScriptValidator<'_> {
    fn is_valid(&self) -> CheckResult {
        let language = self.doc.script_type(ContentType::Script);
        all_of([
            self.is_valid_version(),
            self.is_id_equals_name(),
            expect_valid_subtype(self.doc, language, self.doc.get("subtype")),
            self.has_no_duplicate_args(),
        ])
    }

    fn is_backward_compatible(&self) -> CheckResult {
        let Some(old) = self.old else {
            return Ok(());
        };
        let path = self.doc.path();
        let mut problems = Vec::new();

        let old_type = old.script_type(ContentType::Script);
        let new_type = self.doc.script_type(ContentType::Script);
        if old_type != new_type {
            problems.push(format!("{path}: script type changed from {old_type} to {new_type}"));
        }
        compare_arguments(
            &mut problems,
            path,
            &argument_map(old.get("args")),
            &argument_map(self.doc.get("args")),
        );
        compare_context_paths(
            &mut problems,
            path,
            &context_paths(old.get("outputs")),
            &context_paths(self.doc.get("outputs")),
        );
        into_result(problems)
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
    use serde_json::{Value, json};

    fn script(args: Value, language: &str) -> ContentDocument {
        ContentDocument::new(
            "Scripts/script-Foo.yml",
            json!({
                "commonfields": {"id": "Foo", "version": -1},
                "name": "Foo",
                "type": language,
                "script": "",
                "args": args,
                "outputs": [{"contextPath": "Foo.Result"}]
            }),
        )
    }

    #[test]
    fn test_valid_script() {
        let doc = script(json!([{"name": "input"}]), "python");
        assert!(ScriptValidator::new(&doc).is_valid().is_ok());
    }

    #[test]
    fn test_id_not_equal_name() {
        let mut value = script(json!([]), "python").value().clone();
        value["name"] = json!("Bar");
        let doc = ContentDocument::new("Scripts/script-Foo.yml", value);
        assert!(ScriptValidator::new(&doc).is_id_equals_name().is_err());
    }

    #[test]
    fn test_subtype_on_javascript_is_invalid() {
        let mut value = script(json!([]), "javascript").value().clone();
        value["subtype"] = json!("python3");
        let doc = ContentDocument::new("Scripts/script-Foo.yml", value);
        assert!(ScriptValidator::new(&doc).is_valid().is_err());
    }

    #[test]
    fn test_changed_type_breaks_compatibility() {
        let old = script(json!([]), "javascript");
        let new = script(json!([]), "python");
        let problems = ScriptValidator::new(&new)
            .with_previous(Some(&old))
            .is_backward_compatible()
            .unwrap_err();
        assert!(problems[0].contains("script type changed"));
    }

    #[test]
    fn test_removed_arg_breaks_compatibility() {
        let old = script(json!([{"name": "input"}, {"name": "extra"}]), "python");
        let new = script(json!([{"name": "input"}]), "python");
        let problems = ScriptValidator::new(&new)
            .with_previous(Some(&old))
            .is_backward_compatible()
            .unwrap_err();
        assert!(problems[0].contains("'extra' was removed"));
    }
}
