//! Classification of diff records into canonical content files.

use std::path::Path;

use contentcheck::patterns;
use contentcheck::{ContentLoader, ContentType};
use tracing::warn;

use crate::diff::{DiffRecord, DiffStatus};
use crate::error::Finding;
use crate::fileset::{Bucket, ClassifiedFile};
use crate::router::{Route, route};

/// Maps diff records to canonical content files.
///
/// The loader is consulted only to tell python from javascript for legacy
/// unified files.
pub struct PathClassifier<'a> {
    loader: &'a dyn ContentLoader,
    print_ignored_files: bool,
}

impl<'a> PathClassifier<'a> {
    #[must_use]
    pub fn new(loader: &'a dyn ContentLoader) -> Self {
        Self {
            loader,
            print_ignored_files: false,
        }
    }

    #[must_use]
    pub fn print_ignored_files(mut self, enabled: bool) -> Self {
        self.print_ignored_files = enabled;
        self
    }

    /// Classify one record.
    ///
    /// Returns `None` for records that are not content; warnings for
    /// unknown statuses and ignored paths are pushed to `warnings`.
    /// The rules form an ordered cascade and the first matching branch wins.
    pub fn classify(
        &self,
        record: &DiffRecord,
        warnings: &mut Vec<Finding>,
    ) -> Option<(Bucket, ClassifiedFile)> {
        let raw_path = record.path.as_str();
        if patterns::is_hidden(raw_path) {
            return None;
        }

        // The unit of validation is the definition file, not its code.
        let path = if patterns::is_code_file(raw_path)
            && record.status != DiffStatus::Deleted
            && !raw_path.ends_with("_test.py")
        {
            Path::new(raw_path)
                .with_extension("yml")
                .to_string_lossy()
                .into_owned()
        } else if has_code_extension(raw_path) {
            return None;
        } else {
            raw_path.to_owned()
        };

        let route = route(&path);
        let file = |old_path: Option<&str>, old_format: bool| ClassifiedFile {
            path: path.clone(),
            old_path: old_path.map(str::to_owned),
            change: record.status.clone(),
            content_type: route.content_type(),
            old_format,
        };
        let is_content = patterns::is_checked_type(&path);

        match &record.status {
            status if *status != DiffStatus::Deleted
                && patterns::is_old_format_file(&path)
                && self.is_python(&path, route) =>
            {
                Some((Bucket::OldFormat, file(None, true)))
            }
            DiffStatus::Modified if is_content => Some((Bucket::Modified, file(None, false))),
            DiffStatus::Added if is_content => Some((Bucket::Added, file(None, false))),
            DiffStatus::Deleted if is_content => Some((Bucket::Deleted, file(None, false))),
            DiffStatus::Renamed if is_content => {
                // A renamed code file means its definition changed.
                if patterns::is_code_file(raw_path) {
                    Some((Bucket::Modified, file(None, false)))
                } else {
                    Some((Bucket::Modified, file(record.old_path.as_deref(), false)))
                }
            }
            _ if route == Route::Schema => Some((Bucket::Modified, file(None, false))),
            DiffStatus::Unknown(raw) => {
                warn!(path = %path, status = %raw, "unknown file status");
                warnings.push(Finding::warning(
                    path.as_str(),
                    format!("unknown file status '{raw}', please check"),
                ));
                None
            }
            _ => {
                if self.print_ignored_files && !patterns::is_ignored_type(&path) {
                    warn!(path = %path, "ignoring file");
                    warnings.push(Finding::warning(path.as_str(), "ignoring file path"));
                }
                None
            }
        }
    }

    /// Whether a unified definition declares a python script.
    ///
    /// Unreadable files are not python; their own validation reports them.
    fn is_python(&self, path: &str, route: Route) -> bool {
        let Some(content_type) = route.content_type() else {
            return false;
        };
        match self.loader.load(path) {
            Ok(doc) => {
                matches!(content_type, ContentType::Integration | ContentType::Script)
                    && doc.script_type(content_type) == "python"
            }
            Err(_) => false,
        }
    }
}

fn has_code_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("py") || ext.eq_ignore_ascii_case("js"))
}
