//! Structural JSON schemas for content types.
//!
//! Every schema ships embedded in the crate. A repository may override any of
//! them by committing `<schema_dir>/<name>.json` (or `.yml`); changing such a
//! file is what makes the pipeline re-validate the whole repository.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::check::CheckResult;
use crate::content_type::ContentType;
use crate::document::ContentDocument;
use crate::error::ContentError;
use crate::loader::ContentLoader;

const EMBEDDED: &[(&str, &str)] = &[
    ("integration", include_str!("../schemas/integration.json")),
    ("script", include_str!("../schemas/script.json")),
    ("playbook", include_str!("../schemas/playbook.json")),
    ("incidentfield", include_str!("../schemas/incidentfield.json")),
    ("incidenttype", include_str!("../schemas/incidenttype.json")),
    ("layout", include_str!("../schemas/layout.json")),
    ("dashboard", include_str!("../schemas/dashboard.json")),
    ("widget", include_str!("../schemas/widget.json")),
    ("report", include_str!("../schemas/report.json")),
    ("classifier", include_str!("../schemas/classifier.json")),
    ("reputation", include_str!("../schemas/reputation.json")),
];

const OVERRIDE_EXTENSIONS: &[&str] = &["json", "yml", "yaml"];

/// Compiled schemas keyed by schema name.
pub struct SchemaSet {
    validators: BTreeMap<&'static str, jsonschema::Validator>,
}

impl std::fmt::Debug for SchemaSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaSet")
            .field("schemas", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SchemaSet {
    /// The schemas embedded in the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded schema fails to compile.
    pub fn embedded() -> Result<Self, ContentError> {
        let mut validators = BTreeMap::new();
        for (name, source) in EMBEDDED {
            let value: Value = serde_json::from_str(source).map_err(|e| ContentError::InvalidSchema {
                name: (*name).to_owned(),
                message: e.to_string(),
            })?;
            validators.insert(*name, compile(name, &value)?);
        }
        Ok(Self { validators })
    }

    /// Embedded schemas, overridden by any schema found in `schema_dir`.
    ///
    /// Override files that fail to load or compile are returned as errors and
    /// the embedded schema stays in effect for that name.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded schema fails to compile.
    pub fn with_overrides(
        loader: &dyn ContentLoader,
        schema_dir: &str,
    ) -> Result<(Self, Vec<ContentError>), ContentError> {
        let mut set = Self::embedded()?;
        let mut problems = Vec::new();

        for (name, _) in EMBEDDED {
            let Some(path) = OVERRIDE_EXTENSIONS
                .iter()
                .map(|ext| format!("{}/{name}.{ext}", schema_dir.trim_end_matches('/')))
                .find(|p| loader.exists(p))
            else {
                continue;
            };

            match loader.load(&path).and_then(|doc| compile(name, doc.value())) {
                Ok(validator) => {
                    tracing::debug!("using repository schema {path}");
                    set.validators.insert(*name, validator);
                }
                Err(e) => problems.push(e),
            }
        }
        Ok((set, problems))
    }

    /// Whether a schema exists for `content_type`.
    #[must_use]
    pub fn has_schema(&self, content_type: ContentType) -> bool {
        content_type
            .schema_name()
            .is_some_and(|name| self.validators.contains_key(name))
    }

    /// Validate `doc` against the schema of `content_type`.
    ///
    /// Types without a schema always pass.
    ///
    /// # Errors
    ///
    /// Returns one problem per schema violation.
    pub fn validate(&self, content_type: ContentType, doc: &ContentDocument) -> CheckResult {
        let Some(validator) = content_type
            .schema_name()
            .and_then(|name| self.validators.get(name))
        else {
            return Ok(());
        };

        let problems: Vec<String> = validator
            .iter_errors(doc.value())
            .map(|error| format!("{}: {error}", doc.path()))
            .collect();

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

fn compile(name: &str, schema: &Value) -> Result<jsonschema::Validator, ContentError> {
    jsonschema::validator_for(schema).map_err(|e| ContentError::InvalidSchema {
        name: name.to_owned(),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::loader::FsLoader;
    use serde_json::json;
    use tempfile::TempDir;

    fn integration() -> Value {
        json!({
            "commonfields": {"id": "Foo", "version": -1},
            "name": "Foo",
            "display": "Foo",
            "category": "Utilities",
            "configuration": [{"name": "url", "type": 0}],
            "script": {"script": "", "type": "python", "subtype": "python3", "commands": []}
        })
    }

    #[test]
    fn test_embedded_schemas_compile() {
        let set = SchemaSet::embedded().unwrap();
        assert!(set.has_schema(ContentType::Integration));
        assert!(set.has_schema(ContentType::TestPlaybook));
        assert!(!set.has_schema(ContentType::Image));
    }

    #[test]
    fn test_valid_integration_passes() {
        let set = SchemaSet::embedded().unwrap();
        let doc = ContentDocument::new("Integrations/Foo/Foo.yml", integration());
        assert!(set.validate(ContentType::Integration, &doc).is_ok());
    }

    #[test]
    fn test_missing_commonfields_id_fails() {
        let set = SchemaSet::embedded().unwrap();
        let mut value = integration();
        value["commonfields"].as_object_mut().unwrap().remove("id");
        let doc = ContentDocument::new("Integrations/Foo/Foo.yml", value);
        let problems = set.validate(ContentType::Integration, &doc).unwrap_err();
        assert!(problems.iter().any(|p| p.contains("id")), "got: {problems:?}");
    }

    #[test]
    fn test_repository_schema_overrides_embedded() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("Tests/schemas")).unwrap();
        std::fs::write(
            tmp.path().join("Tests/schemas/layout.yml"),
            "type: object\nrequired: [id, version, kind]\n",
        )
        .unwrap();

        let loader = FsLoader::new(tmp.path());
        let (set, problems) = SchemaSet::with_overrides(&loader, "Tests/schemas").unwrap();
        assert!(problems.is_empty(), "{problems:?}");

        let doc = ContentDocument::new("Layouts/layout-a.json", json!({"id": "a", "version": -1}));
        assert!(set.validate(ContentType::Layout, &doc).is_err());
    }

    #[test]
    fn test_broken_override_is_reported_and_ignored() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("Tests/schemas")).unwrap();
        std::fs::write(tmp.path().join("Tests/schemas/layout.json"), "{broken").unwrap();

        let loader = FsLoader::new(tmp.path());
        let (set, problems) = SchemaSet::with_overrides(&loader, "Tests/schemas").unwrap();
        assert_eq!(problems.len(), 1);

        let doc = ContentDocument::new("Layouts/layout-a.json", json!({"id": "a", "version": -1}));
        assert!(set.validate(ContentType::Layout, &doc).is_ok());
    }
}
