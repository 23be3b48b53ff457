//! Content types known to the repository and the way their files are laid out.

use std::fmt;

use serde::Serialize;

/// The kind of content item a file defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Integration,
    BetaIntegration,
    Script,
    Playbook,
    TestPlaybook,
    Image,
    Description,
    IncidentField,
    IncidentType,
    Layout,
    Dashboard,
    Widget,
    Report,
    Classifier,
    Reputation,
}

impl ContentType {
    /// Stable lowercase name, also used as the schema file stem.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integration => "integration",
            Self::BetaIntegration => "betaintegration",
            Self::Script => "script",
            Self::Playbook => "playbook",
            Self::TestPlaybook => "testplaybook",
            Self::Image => "image",
            Self::Description => "description",
            Self::IncidentField => "incidentfield",
            Self::IncidentType => "incidenttype",
            Self::Layout => "layout",
            Self::Dashboard => "dashboard",
            Self::Widget => "widget",
            Self::Report => "report",
            Self::Classifier => "classifier",
            Self::Reputation => "reputation",
        }
    }

    /// Name of the structural schema governing this type, if any.
    ///
    /// Beta integrations share the integration schema and test playbooks
    /// share the playbook schema. Images and descriptions are not structured.
    #[must_use]
    pub const fn schema_name(self) -> Option<&'static str> {
        match self {
            Self::Integration | Self::BetaIntegration => Some("integration"),
            Self::Playbook | Self::TestPlaybook => Some("playbook"),
            Self::Image | Self::Description => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a content item is laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileLayout {
    /// Legacy single file carrying both code and configuration ("old format").
    Unified,
    /// The definition file of a package directory.
    Package,
    /// A code file inside a package directory.
    Code,
    /// A standalone JSON/YAML item, or an asset belonging to a package.
    Single,
}
