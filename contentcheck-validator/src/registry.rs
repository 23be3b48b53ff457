//! Selection of the validators that apply to one content file.

use std::path::Path;

use contentcheck::check::CheckResult;
use contentcheck::validators::{
    DescriptionValidator, ImageSource, ImageValidator, IncidentFieldValidator, IntegrationValidator,
    PlaybookValidator, ScriptValidator, VersionedValidator,
};
use contentcheck::{ContentCheck, ContentDocument, ContentError, ContentLoader, ContentType, FileLayout};
use serde_json::Value;

/// One validator bound to one file.
#[derive(Debug)]
pub enum ContentValidator<'d> {
    Integration(IntegrationValidator<'d>),
    Script(ScriptValidator<'d>),
    Playbook(PlaybookValidator<'d>),
    IncidentField(IncidentFieldValidator<'d>),
    Image(ImageValidator),
    Description(DescriptionValidator),
    Versioned(VersionedValidator<'d>),
}

macro_rules! dispatch {
    ($self:ident, $method:ident) => {
        match $self {
            Self::Integration(v) => v.$method(),
            Self::Script(v) => v.$method(),
            Self::Playbook(v) => v.$method(),
            Self::IncidentField(v) => v.$method(),
            Self::Image(v) => v.$method(),
            Self::Description(v) => v.$method(),
            Self::Versioned(v) => v.$method(),
        }
    };
}

impl ContentCheck for ContentValidator<'_> {
    fn is_valid(&self) -> CheckResult {
        dispatch!(self, is_valid)
    }

    fn is_backward_compatible(&self) -> CheckResult {
        dispatch!(self, is_backward_compatible)
    }

    fn is_valid_version(&self) -> CheckResult {
        dispatch!(self, is_valid_version)
    }

    fn is_id_equals_name(&self) -> CheckResult {
        dispatch!(self, is_id_equals_name)
    }
}

/// What the registry knows about the file being validated.
#[derive(Debug, Clone, Copy)]
pub struct FileContext<'d> {
    pub content_type: ContentType,
    pub layout: FileLayout,
    pub doc: &'d ContentDocument,
    /// Previous revision, when available.
    pub old: Option<&'d ContentDocument>,
    pub is_added: bool,
}

/// Builds the validators for a file, reading the sibling files some of them need.
pub struct ValidatorRegistry<'a> {
    loader: &'a dyn ContentLoader,
}

impl<'a> ValidatorRegistry<'a> {
    #[must_use]
    pub fn new(loader: &'a dyn ContentLoader) -> Self {
        Self { loader }
    }

    /// Validators for the file in `ctx`, in evaluation order.
    ///
    /// # Errors
    ///
    /// Returns an error if a sibling file exists but cannot be read.
    pub fn validators_for<'d>(&self, ctx: &FileContext<'d>) -> Result<Vec<ContentValidator<'d>>, ContentError> {
        let doc = ctx.doc;
        let path = doc.path();
        let validators = match ctx.content_type {
            ContentType::Integration => vec![
                ContentValidator::Image(ImageValidator::new(path, self.image_source(ctx)?)),
                ContentValidator::Description(self.integration_description(ctx)?),
                ContentValidator::Integration(
                    IntegrationValidator::new(doc)
                        .with_previous(ctx.old)
                        .new_file(ctx.is_added),
                ),
            ],
            // Beta integrations promise no compatibility.
            ContentType::BetaIntegration => vec![
                ContentValidator::Description(self.integration_description(ctx)?.beta(true)),
                ContentValidator::Integration(
                    IntegrationValidator::new(doc).beta(true).new_file(ctx.is_added),
                ),
            ],
            ContentType::Script => vec![ContentValidator::Script(
                ScriptValidator::new(doc).with_previous(ctx.old),
            )],
            ContentType::Playbook | ContentType::TestPlaybook => {
                vec![ContentValidator::Playbook(PlaybookValidator::new(doc))]
            }
            ContentType::IncidentField => vec![ContentValidator::IncidentField(
                IncidentFieldValidator::new(doc).with_previous(ctx.old),
            )],
            ContentType::Image => {
                let size = self.loader.read_bytes(path)?.len() as u64;
                vec![ContentValidator::Image(ImageValidator::new(
                    path,
                    ImageSource::File { size },
                ))]
            }
            ContentType::Description => vec![ContentValidator::Description(
                self.description_file(path)?,
            )],
            ContentType::IncidentType
            | ContentType::Layout
            | ContentType::Dashboard
            | ContentType::Widget
            | ContentType::Report
            | ContentType::Classifier
            | ContentType::Reputation => vec![ContentValidator::Versioned(VersionedValidator::new(doc))],
        };
        Ok(validators)
    }

    fn image_source(&self, ctx: &FileContext<'_>) -> Result<ImageSource, ContentError> {
        if ctx.layout == FileLayout::Package {
            let image = package_sibling(ctx.doc.path(), "_image.png");
            if self.loader.exists(&image) {
                let size = self.loader.read_bytes(&image)?.len() as u64;
                return Ok(ImageSource::File { size });
            }
        }
        Ok(ctx
            .doc
            .get("image")
            .and_then(Value::as_str)
            .filter(|data| !data.is_empty())
            .map_or(ImageSource::Missing, |data| ImageSource::Embedded(data.to_owned())))
    }

    fn integration_description(&self, ctx: &FileContext<'_>) -> Result<DescriptionValidator, ContentError> {
        let path = ctx.doc.path();
        let description_file = if ctx.layout == FileLayout::Package {
            self.read_if_exists(&package_sibling(path, "_description.md"))?
        } else {
            None
        };
        Ok(DescriptionValidator::new(
            path,
            description_file,
            detailed_description(ctx.doc),
        ))
    }

    /// A changed description file is checked together with its definition.
    fn description_file(&self, path: &str) -> Result<DescriptionValidator, ContentError> {
        let definition = package_sibling(path, ".yml");
        let detailed = if self.loader.exists(&definition) {
            detailed_description(&self.loader.load(&definition)?)
        } else {
            None
        };
        let beta = contentcheck::patterns::top_level_dir(path).eq_ignore_ascii_case("Beta_Integrations");
        Ok(DescriptionValidator::new(path, Some(self.loader.read_text(path)?), detailed).beta(beta))
    }

    fn read_if_exists(&self, path: &str) -> Result<Option<String>, ContentError> {
        if self.loader.exists(path) {
            self.loader.read_text(path).map(Some)
        } else {
            Ok(None)
        }
    }
}

fn detailed_description(doc: &ContentDocument) -> Option<String> {
    doc.get("detaileddescription")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// `<dir>/<dirname><suffix>` for a file inside package directory `<dir>`.
fn package_sibling(path: &str, suffix: &str) -> String {
    let dir = Path::new(path).parent().unwrap_or_else(|| Path::new(""));
    let name = dir.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    format!("{}/{name}{suffix}", dir.to_string_lossy())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use contentcheck::FsLoader;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn integration_doc(path: &str) -> ContentDocument {
        ContentDocument::new(
            path,
            json!({
                "commonfields": {"id": "Foo", "version": -1},
                "name": "Foo",
                "display": "Foo",
                "configuration": [],
                "script": {"type": "python", "subtype": "python3", "commands": []}
            }),
        )
    }

    #[test]
    fn test_package_sibling() {
        assert_eq!(
            package_sibling("Integrations/Foo/Foo.yml", "_image.png"),
            "Integrations/Foo/Foo_image.png"
        );
        assert_eq!(
            package_sibling("Integrations/Foo/Foo_description.md", ".yml"),
            "Integrations/Foo/Foo.yml"
        );
    }

    #[test]
    fn test_package_integration_with_image() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("Integrations/Foo")).unwrap();
        fs::write(tmp.path().join("Integrations/Foo/Foo_image.png"), [0u8; 64]).unwrap();
        let loader = FsLoader::new(tmp.path());
        let registry = ValidatorRegistry::new(&loader);

        let doc = integration_doc("Integrations/Foo/Foo.yml");
        let ctx = FileContext {
            content_type: ContentType::Integration,
            layout: FileLayout::Package,
            doc: &doc,
            old: None,
            is_added: true,
        };
        let validators = registry.validators_for(&ctx).unwrap();
        assert_eq!(validators.len(), 3);
        for v in &validators {
            assert!(v.is_valid().is_ok(), "{v:?}: {:?}", v.is_valid());
        }
    }

    #[test]
    fn test_package_integration_without_image_fails() {
        let tmp = TempDir::new().unwrap();
        let loader = FsLoader::new(tmp.path());
        let registry = ValidatorRegistry::new(&loader);

        let doc = integration_doc("Integrations/Foo/Foo.yml");
        let ctx = FileContext {
            content_type: ContentType::Integration,
            layout: FileLayout::Package,
            doc: &doc,
            old: None,
            is_added: false,
        };
        let validators = registry.validators_for(&ctx).unwrap();
        assert!(matches!(validators[0], ContentValidator::Image(_)));
        assert!(validators[0].is_valid().is_err());
    }

    #[test]
    fn test_versioned_types() {
        let tmp = TempDir::new().unwrap();
        let loader = FsLoader::new(tmp.path());
        let registry = ValidatorRegistry::new(&loader);
        let doc = ContentDocument::new("Widgets/widget-a.json", json!({"id": "a", "version": 3}));
        let ctx = FileContext {
            content_type: ContentType::Widget,
            layout: FileLayout::Single,
            doc: &doc,
            old: None,
            is_added: false,
        };
        let validators = registry.validators_for(&ctx).unwrap();
        assert_eq!(validators.len(), 1);
        assert!(validators[0].is_valid_version().is_err());
    }
}
