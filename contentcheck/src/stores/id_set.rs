use std::collections::BTreeMap;

use serde::Deserialize;

use crate::check::{CheckResult, fail};
use crate::content_type::ContentType;
use crate::document::ContentDocument;
use crate::error::ContentError;
use crate::loader::ContentLoader;

const LOWEST_VERSION: &str = "0.0.0";
const HIGHEST_VERSION: &str = "99.99.99";

/// Registered data of one content item.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct IdSetEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub fromversion: Option<String>,
    #[serde(default)]
    pub toversion: Option<String>,
}

/// The id registry (`Tests/id_set.json`).
///
/// Each section is a list of single-key maps from item id to its entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct IdSet {
    sections: BTreeMap<String, Vec<BTreeMap<String, IdSetEntry>>>,
}

impl IdSet {
    /// Load the registry at repository-relative `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid registry.
    pub fn load(loader: &dyn ContentLoader, path: &str) -> Result<Self, ContentError> {
        super::load_json(loader, path)
    }

    fn section_name(content_type: ContentType) -> Option<&'static str> {
        match content_type {
            ContentType::Integration | ContentType::BetaIntegration => Some("integrations"),
            ContentType::Script => Some("scripts"),
            ContentType::Playbook => Some("playbooks"),
            ContentType::TestPlaybook => Some("TestPlaybooks"),
            _ => None,
        }
    }

    fn entries(&self, content_type: ContentType) -> impl Iterator<Item = (&str, &IdSetEntry)> {
        Self::section_name(content_type)
            .and_then(|name| self.sections.get(name))
            .into_iter()
            .flatten()
            .flat_map(|item| item.iter().map(|(id, entry)| (id.as_str(), entry)))
    }

    /// The registered data for this file matches the file itself.
    ///
    /// Items of types the registry does not track always pass.
    ///
    /// # Errors
    ///
    /// Returns the mismatching fields, or a problem if the id is unknown.
    pub fn is_file_valid_in_set(&self, content_type: ContentType, doc: &ContentDocument) -> CheckResult {
        if Self::section_name(content_type).is_none() {
            return Ok(());
        }
        let Some(id) = doc.id() else {
            return fail(format!("{}: item has no id", doc.path()));
        };
        let mut same_id = self.entries(content_type).filter(|(other, _)| *other == id).peekable();
        if same_id.peek().is_none() {
            return fail(format!("{}: id '{id}' is not registered in the id set", doc.path()));
        }
        let Some((_, entry)) =
            same_id.find(|(_, e)| e.file_path.as_deref().is_none_or(|p| p == doc.path()))
        else {
            return Ok(());
        };

        let mut problems = Vec::new();
        if let Some(name) = &entry.name
            && doc.name() != Some(name.as_str())
        {
            problems.push(format!(
                "{}: id set lists name '{name}' for id '{id}'",
                doc.path()
            ));
        }
        if entry.fromversion != doc.from_version() {
            problems.push(format!(
                "{}: id set lists fromversion {} for id '{id}'",
                doc.path(),
                entry.fromversion.as_deref().unwrap_or(LOWEST_VERSION)
            ));
        }
        if problems.is_empty() { Ok(()) } else { Err(problems) }
    }

    /// An added file may not reuse the id of another file over an
    /// overlapping server version range.
    ///
    /// # Errors
    ///
    /// Returns one problem per conflicting registered file.
    pub fn is_file_has_used_id(&self, content_type: ContentType, doc: &ContentDocument) -> CheckResult {
        let Some(id) = doc.id() else {
            return Ok(());
        };
        let from = doc.from_version().unwrap_or_else(|| LOWEST_VERSION.to_owned());
        let to = doc.to_version().unwrap_or_else(|| HIGHEST_VERSION.to_owned());

        let problems: Vec<String> = self
            .entries(content_type)
            .filter(|(other, entry)| {
                *other == id && entry.file_path.as_deref() != Some(doc.path())
            })
            .filter(|(_, entry)| {
                let other_from = entry.fromversion.as_deref().unwrap_or(LOWEST_VERSION);
                let other_to = entry.toversion.as_deref().unwrap_or(HIGHEST_VERSION);
                ranges_overlap((&from, &to), (other_from, other_to))
            })
            .map(|(_, entry)| {
                format!(
                    "{}: id '{id}' is already used by {}",
                    doc.path(),
                    entry.file_path.as_deref().unwrap_or("another item")
                )
            })
            .collect();
        if problems.is_empty() { Ok(()) } else { Err(problems) }
    }
}

/// Dotted numeric version, compared component by component.
fn version_key(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| part.trim().parse().unwrap_or(0))
        .collect()
}

fn ranges_overlap(a: (&str, &str), b: (&str, &str)) -> bool {
    version_key(a.0) <= version_key(b.1) && version_key(b.0) <= version_key(a.1)
}
