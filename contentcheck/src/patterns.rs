//! Ordered path rules mapping repository paths to content types.
//!
//! Rules are evaluated in declaration order and the first match wins. All
//! patterns are anchored at the repository root and case-insensitive.
//!
//! The `regex` crate has no backreferences, so package rules of the shape
//! `Integrations/<name>/<name>.yml` capture both names and require them to be
//! equal (`same_stem`).

use std::sync::LazyLock;

use regex::Regex;

use crate::content_type::{ContentType, FileLayout};

/// Directories whose entries are package directories rather than plain files.
pub const PACKAGE_DIRS: &[&str] = &["Integrations", "Scripts", "Beta_Integrations"];

/// Content type of the packages held in one of the [`PACKAGE_DIRS`].
#[must_use]
pub fn package_dir_type(dir: &str) -> Option<ContentType> {
    match dir {
        "Integrations" => Some(ContentType::Integration),
        "Beta_Integrations" => Some(ContentType::BetaIntegration),
        "Scripts" => Some(ContentType::Script),
        _ => None,
    }
}

/// Top-level content directories visited by the full-repository sweep.
pub const CONTENT_DIRS: &[&str] = &[
    "Integrations",
    "Beta_Integrations",
    "Scripts",
    "Playbooks",
    "TestPlaybooks",
    "IncidentFields",
    "IncidentTypes",
    "Layouts",
    "Dashboards",
    "Widgets",
    "Reports",
    "Classifiers",
    "Misc",
];

/// One entry of the routing table.
#[derive(Debug)]
pub struct PathRule {
    regex: Regex,
    same_stem: bool,
    pub content_type: ContentType,
    pub layout: FileLayout,
}

impl PathRule {
    fn new(pattern: &str, same_stem: bool, content_type: ContentType, layout: FileLayout) -> Self {
        // Patterns are compile-time constants covered by tests.
        #[allow(clippy::unwrap_used)]
        let regex = Regex::new(&format!("(?i)^{pattern}$")).unwrap();
        Self {
            regex,
            same_stem,
            content_type,
            layout,
        }
    }

    /// Whether `path` matches this rule.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let Some(caps) = self.regex.captures(path) else {
            return false;
        };
        if !self.same_stem {
            return true;
        }
        match (caps.get(1), caps.get(2)) {
            (Some(dir), Some(stem)) => dir.as_str() == stem.as_str(),
            _ => false,
        }
    }
}

const NAME: &str = "([^/]+)";

static CONTENT_RULES: LazyLock<Vec<PathRule>> = LazyLock::new(|| {
    use ContentType as T;
    use FileLayout as L;
    vec![
        PathRule::new(r"TestPlaybooks/playbook-[^/]+\.yml", false, T::TestPlaybook, L::Single),
        PathRule::new(r"Playbooks/playbook-[^/]+\.yml", false, T::Playbook, L::Single),
        PathRule::new(r"Integrations/integration-[^/]+\.yml", false, T::Integration, L::Unified),
        PathRule::new(&format!(r"Integrations/{NAME}/{NAME}\.yml"), true, T::Integration, L::Package),
        PathRule::new(&format!(r"Integrations/{NAME}/{NAME}\.(?:py|js)"), true, T::Integration, L::Code),
        PathRule::new(&format!(r"Integrations/{NAME}/{NAME}_image\.png"), true, T::Image, L::Single),
        PathRule::new(
            &format!(r"Integrations/{NAME}/{NAME}_description\.md"),
            true,
            T::Description,
            L::Single,
        ),
        PathRule::new(r"Beta_Integrations/integration-[^/]+\.yml", false, T::BetaIntegration, L::Unified),
        PathRule::new(&format!(r"Beta_Integrations/{NAME}/{NAME}\.yml"), true, T::BetaIntegration, L::Package),
        PathRule::new(
            &format!(r"Beta_Integrations/{NAME}/{NAME}\.(?:py|js)"),
            true,
            T::BetaIntegration,
            L::Code,
        ),
        PathRule::new(&format!(r"Beta_Integrations/{NAME}/{NAME}_image\.png"), true, T::Image, L::Single),
        PathRule::new(
            &format!(r"Beta_Integrations/{NAME}/{NAME}_description\.md"),
            true,
            T::Description,
            L::Single,
        ),
        PathRule::new(r"Scripts/script-[^/]+\.yml", false, T::Script, L::Unified),
        PathRule::new(&format!(r"Scripts/{NAME}/{NAME}\.yml"), true, T::Script, L::Package),
        PathRule::new(&format!(r"Scripts/{NAME}/{NAME}\.(?:py|js)"), true, T::Script, L::Code),
        PathRule::new(r"IncidentFields/incidentfield-[^/]+\.json", false, T::IncidentField, L::Single),
        PathRule::new(r"IncidentTypes/incidenttype-[^/]+\.json", false, T::IncidentType, L::Single),
        PathRule::new(r"Layouts/layout-[^/]+\.json", false, T::Layout, L::Single),
        PathRule::new(r"Dashboards/dashboard-[^/]+\.json", false, T::Dashboard, L::Single),
        PathRule::new(r"Widgets/widget-[^/]+\.json", false, T::Widget, L::Single),
        PathRule::new(r"Reports/report-[^/]+\.json", false, T::Report, L::Single),
        PathRule::new(r"Classifiers/classifier-[^/]+\.json", false, T::Classifier, L::Single),
        PathRule::new(r"Misc/reputations?(?:-[^/]+)?\.json", false, T::Reputation, L::Single),
    ]
});

static SCHEMA_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(?i)^Tests/schemas/[^/]+\.ya?ml$", r"(?i)^Tests/schemas/[^/]+\.json$"]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

static IGNORED_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(^|/)Pipfile(\.lock)?$",
        r"(?i)(^|/)CHANGELOG\.md$",
        r"(?i)(^|/)README\.md$",
        r"(?i)_test\.py$",
        r"(?i)(^|/)conftest\.py$",
        r"(?i)(^|/)test_data/",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// First rule matching `path`, if any.
#[must_use]
pub fn match_rule(path: &str) -> Option<&'static PathRule> {
    CONTENT_RULES.iter().find(|rule| rule.matches(path))
}

/// Whether `path` is a content file the pipeline knows how to check.
///
/// Code files are recognised by [`is_code_file`] but are not content files
/// themselves: the package definition next to them is.
#[must_use]
pub fn is_checked_type(path: &str) -> bool {
    match_rule(path).is_some_and(|rule| rule.layout != FileLayout::Code)
}

/// Whether `path` is a package code file (integration or script source).
#[must_use]
pub fn is_code_file(path: &str) -> bool {
    match_rule(path).is_some_and(|rule| rule.layout == FileLayout::Code)
}

/// Whether `path` is a legacy unified integration or script.
#[must_use]
pub fn is_old_format_file(path: &str) -> bool {
    match_rule(path).is_some_and(|rule| {
        rule.layout == FileLayout::Unified
            && matches!(rule.content_type, ContentType::Integration | ContentType::Script)
    })
}

/// Whether `path` is one of the structural schema definitions.
#[must_use]
pub fn is_schema_file(path: &str) -> bool {
    SCHEMA_RULES.iter().any(|re| re.is_match(path))
}

/// Whether `path` is a known non-content file that should be ignored quietly.
#[must_use]
pub fn is_ignored_type(path: &str) -> bool {
    IGNORED_RULES.iter().any(|re| re.is_match(path))
}

/// Whether `path` points at a hidden file or lives under a hidden directory.
#[must_use]
pub fn is_hidden(path: &str) -> bool {
    path.split('/').any(|component| component.starts_with('.'))
}

/// Top-level directory of a repository-relative path.
#[must_use]
pub fn top_level_dir(path: &str) -> &str {
    path.split('/').next().unwrap_or_default()
}
