//! Generic key-value view over a loaded content file.

use serde_json::Value;

use crate::content_type::ContentType;

/// Default script language when a definition does not declare one.
pub const DEFAULT_SCRIPT_TYPE: &str = "javascript";

/// A parsed YAML/JSON content file.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDocument {
    path: String,
    value: Value,
}

impl ContentDocument {
    #[must_use]
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }

    /// Repository-relative path the document was loaded from.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Top-level key lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.value.get(key)
    }

    /// Whether the top-level mapping contains `key`, whatever its value.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.value.as_object().is_some_and(|m| m.contains_key(key))
    }

    /// Item id: `commonfields.id` for scripts and integrations, `id` otherwise.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.value
            .pointer("/commonfields/id")
            .or_else(|| self.value.get("id"))
            .and_then(Value::as_str)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.value.get("name").and_then(Value::as_str)
    }

    /// Item version: `commonfields.version` or top-level `version`.
    #[must_use]
    pub fn version(&self) -> Option<i64> {
        self.value
            .pointer("/commonfields/version")
            .or_else(|| self.value.get("version"))
            .and_then(Value::as_i64)
    }

    /// Lowest server version the item applies to (`fromversion`/`fromVersion`).
    #[must_use]
    pub fn from_version(&self) -> Option<String> {
        version_string(
            self.value
                .get("fromversion")
                .or_else(|| self.value.get("fromVersion")),
        )
    }

    /// Highest server version the item applies to (`toversion`/`toVersion`).
    #[must_use]
    pub fn to_version(&self) -> Option<String> {
        version_string(
            self.value
                .get("toversion")
                .or_else(|| self.value.get("toVersion")),
        )
    }

    /// Whether the item is capped by a `toversion` ceiling.
    #[must_use]
    pub fn has_to_version(&self) -> bool {
        self.has_key("toversion") || self.has_key("toVersion")
    }

    /// Script language of an integration (`script.type`) or script (`type`).
    #[must_use]
    pub fn script_type(&self, content_type: ContentType) -> &str {
        let value = match content_type {
            ContentType::Integration | ContentType::BetaIntegration => {
                self.value.pointer("/script/type")
            }
            ContentType::Script => self.value.get("type"),
            _ => None,
        };
        value.and_then(Value::as_str).unwrap_or(DEFAULT_SCRIPT_TYPE)
    }

    /// Docker image declared by an integration or script.
    #[must_use]
    pub fn docker_image(&self, content_type: ContentType) -> Option<&str> {
        let value = match content_type {
            ContentType::Integration | ContentType::BetaIntegration => {
                self.value.pointer("/script/dockerimage")
            }
            _ => self.value.get("dockerimage"),
        };
        value.and_then(Value::as_str).filter(|s| !s.is_empty())
    }
}

fn version_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_prefers_commonfields() {
        let doc = ContentDocument::new(
            "Integrations/Foo/Foo.yml",
            json!({"commonfields": {"id": "Foo", "version": -1}, "id": "other"}),
        );
        assert_eq!(doc.id(), Some("Foo"));
        assert_eq!(doc.version(), Some(-1));
    }

    #[test]
    fn test_id_falls_back_to_top_level() {
        let doc = ContentDocument::new("Layouts/layout-x.json", json!({"id": "x", "version": -1}));
        assert_eq!(doc.id(), Some("x"));
    }

    #[test]
    fn test_script_type_defaults_to_javascript() {
        let doc = ContentDocument::new("Scripts/script-a.yml", json!({"name": "a"}));
        assert_eq!(doc.script_type(ContentType::Script), DEFAULT_SCRIPT_TYPE);
        let doc = ContentDocument::new(
            "Integrations/integration-a.yml",
            json!({"script": {"type": "python"}}),
        );
        assert_eq!(doc.script_type(ContentType::Integration), "python");
    }

    #[test]
    fn test_to_version_presence() {
        let doc = ContentDocument::new("x.yml", json!({"toversion": "4.1.9"}));
        assert!(doc.has_to_version());
        assert_eq!(doc.to_version().as_deref(), Some("4.1.9"));
        let doc = ContentDocument::new("x.yml", json!({"fromversion": 5}));
        assert!(!doc.has_to_version());
        assert_eq!(doc.from_version().as_deref(), Some("5"));
    }
}
