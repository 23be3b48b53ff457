//! Per-type validators.
//!
//! Each validator is bound to exactly one file (plus optionally its previous
//! revision) and implements the [`ContentCheck`](crate::check::ContentCheck)
//! subset relevant to its type. Validators never touch the file system: the
//! caller hands them everything they inspect.

mod description;
mod image;
mod incident_field;
mod integration;
mod playbook;
mod script;
mod versioned;

pub use description::{BETA_DISCLAIMER, DescriptionValidator};
pub use image::{IMAGE_MAX_SIZE, ImageSource, ImageValidator};
pub use incident_field::IncidentFieldValidator;
pub use integration::IntegrationValidator;
pub use playbook::PlaybookValidator;
pub use script::ScriptValidator;
pub use versioned::VersionedValidator;

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::check::{CheckResult, fail};
use crate::document::ContentDocument;

const VALID_SUBTYPES: &[&str] = &["python2", "python3"];

/// `name -> required` for an argument list.
fn argument_map(args: Option<&Value>) -> BTreeMap<String, bool> {
    args.and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|arg| {
            let name = arg.get("name")?.as_str()?;
            let required = arg.get("required").and_then(Value::as_bool).unwrap_or(false);
            Some((name.to_owned(), required))
        })
        .collect()
}

fn context_paths(outputs: Option<&Value>) -> BTreeSet<String> {
    outputs
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|o| o.get("contextPath").and_then(Value::as_str))
        .map(str::to_owned)
        .collect()
}

fn duplicates<'v>(names: impl IntoIterator<Item = &'v str>) -> Vec<&'v str> {
    let mut seen = BTreeSet::new();
    let mut dups = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            dups.insert(name);
        }
    }
    dups.into_iter().collect()
}

fn names_of(list: Option<&Value>) -> impl Iterator<Item = &str> {
    list.and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
}

/// Compare argument lists of the same command/script across revisions.
fn compare_arguments(
    problems: &mut Vec<String>,
    where_: &str,
    old: &BTreeMap<String, bool>,
    new: &BTreeMap<String, bool>,
) {
    for name in old.keys() {
        if !new.contains_key(name) {
            problems.push(format!("{where_}: argument '{name}' was removed"));
        }
    }
    for (name, required) in new {
        if *required && !old.get(name).copied().unwrap_or(false) {
            problems.push(format!("{where_}: argument '{name}' became required"));
        }
    }
}

fn compare_context_paths(
    problems: &mut Vec<String>,
    where_: &str,
    old: &BTreeSet<String>,
    new: &BTreeSet<String>,
) {
    for path in old.difference(new) {
        problems.push(format!("{where_}: context path '{path}' was removed"));
    }
}

fn expect_id_equals_name(doc: &ContentDocument) -> CheckResult {
    match (doc.id(), doc.name()) {
        (Some(id), Some(name)) if id == name => Ok(()),
        (id, name) => fail(format!(
            "{}: id '{}' must be equal to name '{}'",
            doc.path(),
            id.unwrap_or_default(),
            name.unwrap_or_default()
        )),
    }
}

fn expect_valid_subtype(doc: &ContentDocument, language: &str, subtype: Option<&Value>) -> CheckResult {
    let Some(subtype) = subtype.and_then(Value::as_str) else {
        return Ok(());
    };
    if language != "python" {
        return fail(format!(
            "{}: subtype '{subtype}' is only allowed for python",
            doc.path()
        ));
    }
    if VALID_SUBTYPES.contains(&subtype) {
        Ok(())
    } else {
        fail(format!(
            "{}: subtype must be one of {}, found '{subtype}'",
            doc.path(),
            VALID_SUBTYPES.join(", ")
        ))
    }
}

fn into_result(problems: Vec<String>) -> CheckResult {
    if problems.is_empty() { Ok(()) } else { Err(problems) }
}
