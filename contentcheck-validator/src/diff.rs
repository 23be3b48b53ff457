//! Parsing of `git diff --name-status` output.

use serde::Serialize;

use crate::error::Finding;

/// Change status of one diff line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DiffStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
    /// Any other status letter (copies, type changes, unmerged).
    Unknown(String),
}

impl DiffStatus {
    fn parse(raw: &str) -> Self {
        match raw.chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('M') if raw.len() == 1 => Self::Modified,
            Some('A') if raw.len() == 1 => Self::Added,
            Some('D') if raw.len() == 1 => Self::Deleted,
            Some('R') if raw[1..].chars().all(|c| c.is_ascii_digit()) => Self::Renamed,
            _ => Self::Unknown(raw.to_owned()),
        }
    }
}

/// One line of diff output.
///
/// For renames and copies `path` is the destination and `old_path` the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRecord {
    pub status: DiffStatus,
    pub path: String,
    pub old_path: Option<String>,
}

impl DiffRecord {
    #[must_use]
    pub fn new(status: DiffStatus, path: impl Into<String>) -> Self {
        Self {
            status,
            path: path.into(),
            old_path: None,
        }
    }

    #[must_use]
    pub fn renamed(old_path: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            status: DiffStatus::Renamed,
            path: path.into(),
            old_path: Some(old_path.into()),
        }
    }
}

/// Parse `<status>\t<path>[\t<new_path>]` lines.
///
/// Empty lines are ignored. Lines without a tab are split on whitespace.
/// Rename lines lacking either path produce a classification warning and
/// are skipped.
#[must_use]
pub fn parse_diff(text: &str) -> (Vec<DiffRecord>, Vec<Finding>) {
    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = if line.contains('\t') {
            line.split('\t').map(str::trim).filter(|f| !f.is_empty()).collect()
        } else {
            line.split_whitespace().collect()
        };
        let [raw_status, rest @ ..] = fields.as_slice() else {
            continue;
        };

        let status = DiffStatus::parse(raw_status);
        match (status, rest) {
            (DiffStatus::Renamed, [old, new, ..]) => records.push(DiffRecord::renamed(*old, *new)),
            (DiffStatus::Renamed, _) => {
                warnings.push(Finding::warning(
                    rest.first().copied().unwrap_or_default(),
                    format!("rename without both paths ignored: '{line}'"),
                ));
            }
            (_, []) => {
                warnings.push(Finding::warning("", format!("diff line without a path ignored: '{line}'")));
            }
            (status, [path]) => records.push(DiffRecord::new(status, *path)),
            (status, [source, destination, ..]) => records.push(DiffRecord {
                status,
                path: (*destination).to_owned(),
                old_path: Some((*source).to_owned()),
            }),
        }
    }

    (records, warnings)
}
