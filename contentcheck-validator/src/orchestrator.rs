//! The top-level validation flow.
//!
//! The orchestrator decides which sweeps to run for the checked-out branch,
//! feeds every file of a sweep through the structural, store and per-type
//! checks, and folds all problems into one [`Verdict`]. A failing file never
//! stops the run: every file is evaluated so one run reports every problem.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use contentcheck::check::CheckResult;
use contentcheck::loader::parse_document;
use contentcheck::{
    ConfJson, ContentCheck, ContentDocument, ContentError, ContentLoader, ContentType, FileLayout, IdSet,
    SchemaSet, StructureValidator, Unifier,
};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::collect::DiffCollector;
use crate::config::{RepoConfig, ValidateConfig};
use crate::error::Finding;
use crate::fileset::{Changeset, ClassifiedFile};
use crate::gate::OldFormatGate;
use crate::registry::{FileContext, ValidatorRegistry};
use crate::report::{SweepMode, ValidationReport};
use crate::router::{Route, route};
use crate::strategy::fs::find_content_files;
use crate::vcs::Vcs;
use crate::verdict::Verdict;

/// Where the orchestrator is in its flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    CollectingDiff,
    ClassifyingFiles,
    ValidatingModified,
    ValidatingAdded,
    GatingOldFormat,
    SweepingRepository,
    Done,
}

/// The outside world the orchestrator talks to.
pub struct Collaborators {
    /// `None` when version control is unavailable.
    pub vcs: Option<Box<dyn Vcs>>,
    pub loader: Box<dyn ContentLoader>,
    pub unifier: Box<dyn Unifier>,
}

/// Drives one or more validation runs over a repository.
pub struct ValidationOrchestrator {
    config: ValidateConfig,
    repo: RepoConfig,
    vcs: Option<Box<dyn Vcs>>,
    loader: Box<dyn ContentLoader>,
    unifier: Box<dyn Unifier>,
    schemas: SchemaSet,
    /// Broken schema overrides, reported at the start of every run.
    schema_problems: Vec<Finding>,
    release_branch: Regex,
    conf_json: Option<ConfJson>,
    id_set: Option<IdSet>,
    branch: Option<String>,
    verdict: Verdict,
    state: State,
    modes: Vec<SweepMode>,
    validated_files: usize,
}

impl ValidationOrchestrator {
    /// # Errors
    ///
    /// Returns an error if the embedded schemas fail to compile or the
    /// release branch pattern is not a valid regex.
    pub fn new(config: ValidateConfig, repo: RepoConfig, collaborators: Collaborators) -> anyhow::Result<Self> {
        let Collaborators { vcs, loader, unifier } = collaborators;
        let (schemas, problems) = SchemaSet::with_overrides(loader.as_ref(), &repo.schema_dir)
            .context("failed to compile the embedded schemas")?;
        let schema_problems = problems
            .into_iter()
            .map(|e| Finding::configuration(repo.schema_dir.as_str(), e.to_string()))
            .collect();
        let release_branch = Regex::new(&config.release_branch_pattern).with_context(|| {
            format!("invalid release branch pattern '{}'", config.release_branch_pattern)
        })?;

        Ok(Self {
            config,
            repo,
            vcs,
            loader,
            unifier,
            schemas,
            schema_problems,
            release_branch,
            conf_json: None,
            id_set: None,
            branch: None,
            verdict: Verdict::new(),
            state: State::Idle,
            modes: Vec::new(),
            validated_files: 0,
        })
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.verdict.is_valid()
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Snapshot of the current run.
    #[must_use]
    pub fn report(&self) -> ValidationReport {
        ValidationReport {
            ok: self.verdict.is_valid(),
            modes: self.modes.clone(),
            validated_files: self.validated_files,
            findings: self.verdict.findings().to_vec(),
        }
    }

    /// Run the validation appropriate for the checked-out branch.
    ///
    /// The trunk and release branches get a full-repository sweep; feature
    /// branches get their changeset validated. Either way an advisory
    /// previous-version pass runs too. Without version control the whole
    /// repository is swept.
    pub fn run(&mut self) -> ValidationReport {
        self.reset();
        self.load_stores();

        match self.branch() {
            Some(branch) if self.is_trunk_or_release(&branch) => {
                info!("on {branch}, validating the whole repository");
                self.validate_against_previous_version(true);
                self.validate_all_files();
            }
            Some(branch) => {
                info!("validating changes on {branch} against {}", self.config.prev_ver);
                self.validate_committed_files();
                self.validate_against_previous_version(true);
            }
            None => self.validate_all_files(),
        }

        self.transition(State::Done);
        self.report()
    }

    /// Start a fresh run. Schema override problems are recorded again.
    fn reset(&mut self) {
        self.verdict.reset();
        self.modes.clear();
        self.validated_files = 0;
        self.branch = None;
        self.conf_json = None;
        self.id_set = None;
        self.state = State::Idle;
        self.verdict.record_all(self.schema_problems.iter().cloned());
    }

    fn transition(&mut self, next: State) {
        debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }

    fn is_trunk_or_release(&self, branch: &str) -> bool {
        branch == self.config.trunk_branch || self.release_branch.is_match(branch)
    }

    fn load_stores(&mut self) {
        if self.config.validate_conf_json {
            let path = self.repo.conf_json_path.clone();
            self.conf_json = self.load_store(&path, ConfJson::load);
            if let Some(conf_json) = &self.conf_json {
                let result = conf_json.is_valid_conf_json();
                self.record_check(&path, result);
            }
        }
        if self.config.validate_id_set {
            let path = self.repo.id_set_path.clone();
            self.id_set = self.load_store(&path, IdSet::load);
        }
    }

    /// A requested store that is missing or broken disables its check and
    /// fails the run.
    fn load_store<T>(
        &mut self,
        path: &str,
        load: fn(&dyn ContentLoader, &str) -> Result<T, ContentError>,
    ) -> Option<T> {
        if !self.loader.exists(path) {
            error!("{path} is required but missing");
            self.verdict.record(Finding::configuration(
                path,
                format!("{path} is required but missing; the check is disabled"),
            ));
            return None;
        }
        match load(self.loader.as_ref(), path) {
            Ok(store) => Some(store),
            Err(e) => {
                error!("{e}");
                self.verdict.record(Finding::configuration(path, e.to_string()));
                None
            }
        }
    }

    /// Name of the checked-out branch, queried once per run.
    fn branch(&mut self) -> Option<String> {
        if let Some(branch) = &self.branch {
            return Some(branch.clone());
        }
        if !self.config.use_git {
            return None;
        }
        if let Some(branch) = self.config.branch.as_ref().filter(|b| !b.is_empty()) {
            self.branch = Some(branch.clone());
            return self.branch.clone();
        }
        let vcs = self.vcs.as_deref()?;
        match vcs.current_branch() {
            Ok(branch) if branch == "HEAD" => {
                error!("HEAD is detached; cannot tell which branch to validate");
                self.verdict.record(Finding::configuration(
                    "",
                    "HEAD is detached; name the branch to validate with --branch",
                ));
                None
            }
            Ok(branch) => {
                self.branch = Some(branch.clone());
                Some(branch)
            }
            Err(e) => {
                error!("cannot determine the current branch: {e:#}");
                self.verdict
                    .record(Finding::vcs(format!("cannot determine the current branch: {e:#}")));
                None
            }
        }
    }

    /// Collect the changeset against `base`; failures are recorded.
    fn collect_changeset(&mut self, base: &str) -> Option<Changeset> {
        self.transition(State::CollectingDiff);
        if !self.config.use_git || self.vcs.is_none() {
            self.verdict
                .record(Finding::vcs("version control is disabled; cannot collect changes"));
            return None;
        }
        let branch = self.branch()?;
        let vcs = self.vcs.as_deref()?;

        let mut warnings = Vec::new();
        let result = DiffCollector::new(vcs, self.loader.as_ref(), &branch, &self.config.trunk_branch)
            .ci(self.config.is_ci)
            .print_ignored_files(self.config.print_ignored_files)
            .collect(base, &mut warnings);
        self.verdict.record_all(warnings);

        match result {
            Ok(changeset) => {
                self.transition(State::ClassifyingFiles);
                debug!(
                    modified = changeset.modified.len(),
                    added = changeset.added.len(),
                    old_format = changeset.old_format.len(),
                    "classified changeset"
                );
                Some(changeset)
            }
            Err(e) => {
                error!("cannot collect changes against {base}: {e:#}");
                self.verdict
                    .record(Finding::vcs(format!("cannot collect changes against {base}: {e:#}")));
                None
            }
        }
    }

    /// Validate the branch changeset against the configured baseline.
    ///
    /// A changed schema escalates to a full-repository sweep, since it can
    /// invalidate files the diff does not list.
    pub fn validate_committed_files(&mut self) {
        let prev_ver = self.config.prev_ver.clone();
        let Some(changeset) = self.collect_changeset(&prev_ver) else {
            return;
        };
        if changeset.has_schema_change() {
            info!("a schema changed, validating the whole repository");
            self.validate_all_files();
            return;
        }

        self.modes.push(SweepMode::Changeset);
        self.validate_modified_files(&changeset.modified);
        self.validate_added_files(&changeset.added);
        self.validate_no_old_format(&changeset.old_format);
    }

    /// Validate modified files, including backward compatibility when enabled.
    pub fn validate_modified_files(&mut self, files: &BTreeSet<ClassifiedFile>) {
        self.transition(State::ValidatingModified);
        for file in files {
            self.validate_file(file, false);
        }
    }

    pub fn validate_added_files(&mut self, files: &BTreeSet<ClassifiedFile>) {
        self.transition(State::ValidatingAdded);
        for file in files {
            self.validate_file(file, true);
        }
    }

    /// Fail legacy unified files that are not capped by `toversion`.
    pub fn validate_no_old_format(&mut self, files: &BTreeSet<ClassifiedFile>) {
        self.transition(State::GatingOldFormat);
        let findings = OldFormatGate::new(self.loader.as_ref()).check(files);
        self.verdict.record_all(findings);
    }

    /// Check every content file in the repository against its schema.
    pub fn validate_all_files(&mut self) {
        self.transition(State::SweepingRepository);
        self.modes.push(SweepMode::FullRepository);

        let (files, findings) = find_content_files(&self.repo, self.unifier.as_ref());
        self.verdict.record_all(findings);

        for (path, content_type) in files {
            if content_type.schema_name().is_none() {
                continue;
            }
            info!("Validating {path}");
            self.validated_files += 1;
            let result = match self.loader.load(&path) {
                Ok(doc) => StructureValidator::new(content_type, &doc, &self.schemas).is_valid_scheme(),
                Err(e) => Err(vec![e.to_string()]),
            };
            self.record_check(&path, result);
        }
    }

    /// Re-validate the files modified since the baseline.
    ///
    /// With `no_error` the pass is advisory: its findings are kept but marked
    /// advisory and the verdict is restored to its value before the pass.
    /// Skipped when the baseline is the trunk branch itself.
    pub fn validate_against_previous_version(&mut self, no_error: bool) {
        let prev_ver = self.config.prev_ver.clone();
        if prev_ver.is_empty() || prev_ver == self.config.trunk_branch {
            debug!(prev_ver, "no previous version to compare against");
            return;
        }
        info!("validating against previous version {prev_ver}");

        let checkpoint = self.verdict.checkpoint();
        self.modes.push(SweepMode::PreviousVersion);
        if let Some(changeset) = self.collect_changeset(&prev_ver) {
            self.validate_modified_files(&changeset.modified);
        }
        if no_error {
            self.verdict.restore(checkpoint);
        }
    }

    fn validate_file(&mut self, file: &ClassifiedFile, is_added: bool) {
        let Some(content_type) = file.content_type else {
            debug!(path = %file.path, "no validator for file");
            return;
        };
        let path = match self.resolve_definition(&file.path) {
            Ok(path) => path,
            Err(e) => {
                self.record_check(&file.path, Err(vec![e.to_string()]));
                return;
            }
        };

        info!("Validating {path}");
        self.validated_files += 1;
        let doc = match self.load_subject(&path, content_type) {
            Ok(doc) => doc,
            Err(e) => {
                self.record_check(&path, Err(vec![e.to_string()]));
                return;
            }
        };
        let old = if is_added {
            None
        } else {
            self.previous_revision(file.old_path.as_deref().unwrap_or(&path), content_type)
        };

        let result = StructureValidator::new(content_type, &doc, &self.schemas)
            .with_previous(old.as_ref())
            .added(is_added || !self.config.backward_check)
            .is_file_valid();
        self.record_check(&path, result);

        for result in self.store_checks(content_type, &doc, is_added) {
            self.record_check(&path, result);
        }

        let layout = match route(&path) {
            Route::Content(_, layout) => layout,
            Route::Schema | Route::Unrecognized => FileLayout::Single,
        };
        let ctx = FileContext {
            content_type,
            layout,
            doc: &doc,
            old: old.as_ref(),
            is_added,
        };
        let validators = match ValidatorRegistry::new(self.loader.as_ref()).validators_for(&ctx) {
            Ok(validators) => validators,
            Err(e) => {
                self.record_check(&path, Err(vec![e.to_string()]));
                return;
            }
        };
        for validator in &validators {
            self.record_check(&path, validator.is_valid());
            if !is_added && self.config.backward_check {
                self.record_check(&path, validator.is_backward_compatible());
            }
        }
    }

    /// A package whose definition is not named after its directory is
    /// resolved through the unifier.
    fn resolve_definition(&self, path: &str) -> Result<String, ContentError> {
        if self.loader.exists(path) {
            return Ok(path.to_owned());
        }
        match route(path) {
            Route::Content(_, FileLayout::Package) => {
                let dir = Path::new(path)
                    .parent()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.unifier.package_definition(&dir)
            }
            _ => Ok(path.to_owned()),
        }
    }

    /// The document checked for `path`. Images and descriptions are not
    /// structured; they are checked through an empty placeholder.
    fn load_subject(&self, path: &str, content_type: ContentType) -> Result<ContentDocument, ContentError> {
        match content_type {
            ContentType::Image | ContentType::Description if self.loader.exists(path) => {
                Ok(ContentDocument::new(path, Value::Object(Map::new())))
            }
            ContentType::Image | ContentType::Description => Err(ContentError::Io {
                path: path.to_owned(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
            _ => self.loader.load(path),
        }
    }

    /// `path` as it was at the baseline, if it existed there.
    fn previous_revision(&self, path: &str, content_type: ContentType) -> Option<ContentDocument> {
        if matches!(content_type, ContentType::Image | ContentType::Description) {
            return None;
        }
        let vcs = self.vcs.as_deref()?;
        let text = match vcs.show_file(&self.config.prev_ver, path) {
            Ok(text) => text,
            Err(e) => {
                debug!(path, error = %format!("{e:#}"), "no previous revision");
                return None;
            }
        };
        match parse_document(path, &text) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(path, error = %e, "cannot parse previous revision");
                None
            }
        }
    }

    fn store_checks(&self, content_type: ContentType, doc: &ContentDocument, is_added: bool) -> Vec<CheckResult> {
        let mut results = Vec::new();
        if let Some(id_set) = &self.id_set {
            results.push(id_set.is_file_valid_in_set(content_type, doc));
            if is_added {
                results.push(id_set.is_file_has_used_id(content_type, doc));
            }
        }
        if is_added
            && content_type == ContentType::TestPlaybook
            && let Some(conf_json) = &self.conf_json
            && let Some(id) = doc.id()
        {
            results.push(conf_json.is_test_in_conf_json(id));
        }
        results
    }

    fn record_check(&mut self, path: &str, result: CheckResult) {
        if let Err(problems) = result {
            for problem in problems {
                error!("{problem}");
                self.verdict.record(Finding::structural(path, problem));
            }
        }
    }
}
