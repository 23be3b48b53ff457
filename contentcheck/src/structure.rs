//! File-level structural checks shared by every content type.

use std::path::Path;

use crate::check::{CheckResult, all_of, fail};
use crate::content_type::ContentType;
use crate::document::ContentDocument;
use crate::schema::SchemaSet;

const VALID_EXTENSIONS: &[&str] = &["yml", "json", "md", "png"];

/// Structural validator bound to one file and, for modified files, its
/// previous revision.
#[derive(Debug)]
pub struct StructureValidator<'a> {
    content_type: ContentType,
    doc: &'a ContentDocument,
    old: Option<&'a ContentDocument>,
    schemas: &'a SchemaSet,
    is_added: bool,
}

impl<'a> StructureValidator<'a> {
    #[must_use]
    pub fn new(content_type: ContentType, doc: &'a ContentDocument, schemas: &'a SchemaSet) -> Self {
        Self {
            content_type,
            doc,
            old: None,
            schemas,
            is_added: false,
        }
    }

    #[must_use]
    pub fn with_previous(mut self, old: Option<&'a ContentDocument>) -> Self {
        self.old = old;
        self
    }

    #[must_use]
    pub fn added(mut self, is_added: bool) -> Self {
        self.is_added = is_added;
        self
    }

    /// # Errors
    ///
    /// Returns the problems found.
    pub fn is_valid_file_extension(&self) -> CheckResult {
        let extension = Path::new(self.doc.path())
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .map(str::to_ascii_lowercase);
        match extension {
            Some(ext) if VALID_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
            _ => fail(format!(
                "{}: file type is not supported, use one of {}",
                self.doc.path(),
                VALID_EXTENSIONS.join(", ")
            )),
        }
    }

    /// # Errors
    ///
    /// Returns the problems found.
    pub fn is_valid_scheme(&self) -> CheckResult {
        self.schemas.validate(self.content_type, self.doc)
    }

    /// A modified file must keep its id.
    ///
    /// # Errors
    ///
    /// Returns the problems found.
    pub fn is_id_modified(&self) -> CheckResult {
        if self.is_added {
            return Ok(());
        }
        let Some(old) = self.old else {
            return Ok(());
        };
        if old.id() == self.doc.id() {
            Ok(())
        } else {
            fail(format!(
                "{}: id changed from '{}' to '{}'; ids of existing items cannot change",
                self.doc.path(),
                old.id().unwrap_or_default(),
                self.doc.id().unwrap_or_default()
            ))
        }
    }

    /// A modified file must keep its `fromversion`.
    ///
    /// # Errors
    ///
    /// Returns the problems found.
    pub fn is_valid_fromversion_on_modified(&self) -> CheckResult {
        if self.is_added {
            return Ok(());
        }
        let Some(old) = self.old else {
            return Ok(());
        };
        if old.from_version() == self.doc.from_version() {
            Ok(())
        } else {
            fail(format!(
                "{}: fromversion changed from {} to {}",
                self.doc.path(),
                old.from_version().unwrap_or_else(|| "<none>".to_owned()),
                self.doc.from_version().unwrap_or_else(|| "<none>".to_owned())
            ))
        }
    }

    /// # Errors
    ///
    /// Returns the problems found.
    pub fn is_file_valid(&self) -> CheckResult {
        all_of([
            self.is_valid_file_extension(),
            self.is_valid_scheme(),
            self.is_id_modified(),
            self.is_valid_fromversion_on_modified(),
        ])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layout(id: &str, from: &str) -> ContentDocument {
        ContentDocument::new(
            "Layouts/layout-a.json",
            json!({"id": id, "version": -1, "fromVersion": from}),
        )
    }

    #[test]
    fn test_unchanged_file_is_valid() {
        let schemas = SchemaSet::embedded().unwrap();
        let new = layout("a", "5.0.0");
        let old = layout("a", "5.0.0");
        let v = StructureValidator::new(ContentType::Layout, &new, &schemas).with_previous(Some(&old));
        assert!(v.is_file_valid().is_ok());
    }

    #[test]
    fn test_changed_id_is_rejected() {
        let schemas = SchemaSet::embedded().unwrap();
        let new = layout("b", "5.0.0");
        let old = layout("a", "5.0.0");
        let v = StructureValidator::new(ContentType::Layout, &new, &schemas).with_previous(Some(&old));
        assert!(v.is_id_modified().is_err());
    }

    #[test]
    fn test_changed_fromversion_is_rejected() {
        let schemas = SchemaSet::embedded().unwrap();
        let new = layout("a", "5.5.0");
        let old = layout("a", "5.0.0");
        let v = StructureValidator::new(ContentType::Layout, &new, &schemas).with_previous(Some(&old));
        assert!(v.is_valid_fromversion_on_modified().is_err());
    }

    #[test]
    fn test_added_file_skips_revision_checks() {
        let schemas = SchemaSet::embedded().unwrap();
        let new = layout("b", "5.5.0");
        let old = layout("a", "5.0.0");
        let v = StructureValidator::new(ContentType::Layout, &new, &schemas)
            .with_previous(Some(&old))
            .added(true);
        assert!(v.is_file_valid().is_ok());
    }

    #[test]
    fn test_unsupported_extension() {
        let schemas = SchemaSet::embedded().unwrap();
        let doc = ContentDocument::new("Layouts/layout-a.txt", json!({"id": "a", "version": -1}));
        let v = StructureValidator::new(ContentType::Layout, &doc, &schemas);
        assert!(v.is_valid_file_extension().is_err());
    }
}
