use std::io::Write;
use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use colored::{ColoredString, Colorize};
use contentcheck_validator::{RepoConfig, ValidateConfig, ValidationReport, output};
use tracing::debug;

use crate::logging;

#[derive(Parser, Debug)]
#[command(name = "contentcheck", version, about = "Validate security-content changes before they are merged")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides it.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the changes of the current branch, or the whole repository
    /// on the trunk and release branches
    Validate(ValidateArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Args, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct ValidateArgs {
    /// Running in CI: only committed changes are considered
    #[arg(short = 'c', long, default_value_t = false, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub ci: bool,

    /// Check modified files for backward compatibility
    #[arg(short = 'b', long = "backward-comp", default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub backward_comp: bool,

    /// Validate the test registry and require new test playbooks in it
    #[arg(short = 'j', long = "conf-json")]
    pub conf_json: bool,

    /// Check files against the id registry
    #[arg(short = 'i', long = "id-set")]
    pub id_set: bool,

    /// Baseline ref to compare against
    #[arg(short = 'p', long = "prev-ver", default_value = "origin/master")]
    pub prev_ver: String,

    /// Query git; without it the whole repository is validated
    #[arg(short = 'g', long = "use-git", default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub use_git: bool,

    /// Report files that are neither content nor known auxiliary files
    #[arg(long)]
    pub print_ignored_files: bool,

    /// Repository root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Name of the trunk branch
    #[arg(long, default_value = "master")]
    pub trunk: String,

    /// Branch to validate; defaults to the checked-out branch
    #[arg(long)]
    pub branch: Option<String>,

    /// Glob patterns excluded from the full-repository sweep
    #[arg(long)]
    pub exclude: Vec<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

impl ValidateArgs {
    fn validate_config(&self) -> ValidateConfig {
        let mut config = ValidateConfig::default();
        config.is_ci = self.ci;
        config.backward_check = self.backward_comp;
        config.validate_conf_json = self.conf_json;
        config.validate_id_set = self.id_set;
        config.prev_ver.clone_from(&self.prev_ver);
        config.use_git = self.use_git;
        config.print_ignored_files = self.print_ignored_files;
        config.trunk_branch.clone_from(&self.trunk);
        config.branch.clone_from(&self.branch);
        config
    }

    fn repo_config(&self) -> RepoConfig {
        let mut repo = RepoConfig::default();
        repo.root.clone_from(&self.root);
        repo.exclude.clone_from(&self.exclude);
        repo
    }
}

/// Parse the command line and run it. Returns whether validation passed.
///
/// # Errors
///
/// Returns an error if validation could not run or the report could not be written.
pub fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match cli.command {
        Command::Validate(args) => validate(&args),
    }
}

fn validate(args: &ValidateArgs) -> anyhow::Result<bool> {
    let config = args.validate_config();
    let repo = args.repo_config();
    debug!(root = %repo.root.display(), prev_ver = %config.prev_ver, "starting validation");

    let report = contentcheck_validator::validate(&config, &repo)?;
    let mut stdout = std::io::stdout().lock();
    match args.format {
        OutputFormat::Json => output::write_json(&report, &mut stdout)?,
        OutputFormat::Human => write_colored(&report, &mut stdout)?,
    }
    Ok(report.ok)
}

/// Human output with findings and the verdict line highlighted.
fn write_colored(report: &ValidationReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    let mut plain = Vec::new();
    output::write_human(report, &mut plain)?;
    for line in String::from_utf8_lossy(&plain).lines() {
        writeln!(writer, "{}", paint(line))?;
    }
    Ok(())
}

fn paint(line: &str) -> ColoredString {
    if line.contains("(advisory)") {
        line.dimmed()
    } else if line.starts_with("[warning]") {
        line.yellow()
    } else if line.starts_with('[') || line.starts_with('\u{2717}') {
        line.red()
    } else if line.starts_with('\u{2713}') {
        line.green()
    } else {
        line.normal()
    }
}
