//! Shared output formatting for validation reports.
//!
//! Provides JSON and plain-text formatters for `ValidationReport`.
//! Color/terminal formatting is intentionally excluded from this module;
//! that concern belongs to the CLI layer.

use std::io::Write;

use crate::error::FindingKind;
use crate::report::{SweepMode, ValidationReport};

/// Format a `ValidationReport` as JSON to a writer.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(report: &ValidationReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

fn mode_name(mode: SweepMode) -> &'static str {
    match mode {
        SweepMode::FullRepository => "full repository",
        SweepMode::Changeset => "changeset",
        SweepMode::PreviousVersion => "previous version",
    }
}

/// Format a `ValidationReport` as human-readable plain text to a writer.
///
/// Color/ANSI formatting is the responsibility of the caller (CLI layer).
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human(report: &ValidationReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    let modes: Vec<&str> = report.modes.iter().copied().map(mode_name).collect();

    writeln!(writer)?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer, "  CONTENT VALIDATION")?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer)?;
    writeln!(writer, "  Sweeps:          {}", modes.join(", "))?;
    writeln!(writer, "  Files validated: {}", report.validated_files)?;
    writeln!(writer, "  Errors found:    {}", report.errors_count())?;
    writeln!(writer, "  Warnings:        {}", report.warnings_count())?;
    writeln!(writer)?;

    let (warnings, problems): (Vec<_>, Vec<_>) = report
        .findings
        .iter()
        .partition(|f| f.kind == FindingKind::ClassificationWarning);

    for (title, findings) in [("WARNINGS", &warnings), ("ERRORS", &problems)] {
        if findings.is_empty() {
            continue;
        }
        writeln!(writer, "{}", "-".repeat(80))?;
        writeln!(writer, "  {title}")?;
        writeln!(writer, "{}", "-".repeat(80))?;
        for finding in findings {
            writeln!(writer, "{}", finding.format_human_readable())?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "{}", "=".repeat(80))?;
    if report.ok {
        writeln!(writer, "\u{2713} The files are valid")?;
    } else {
        writeln!(
            writer,
            "\u{2717} The files were found as invalid ({} error(s))",
            report.errors_count()
        )?;
        if report
            .findings
            .iter()
            .any(|f| f.kind == FindingKind::LegacyFormat && !f.advisory)
        {
            writeln!(writer)?;
            writeln!(writer, "  To fix:")?;
            writeln!(
                writer,
                "    - Split unified files into a package directory, or cap the old file with toversion"
            )?;
        }
    }
    writeln!(writer, "{}", "=".repeat(80))?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::Finding;

    fn report(ok: bool, findings: Vec<Finding>) -> ValidationReport {
        ValidationReport {
            ok,
            modes: vec![SweepMode::Changeset, SweepMode::PreviousVersion],
            validated_files: 2,
            findings,
        }
    }

    fn human(report: &ValidationReport) -> String {
        let mut out = Vec::new();
        write_human(report, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_human_valid() {
        let text = human(&report(true, vec![Finding::warning("docs/x.txt", "ignoring file path")]));
        assert!(text.contains("Sweeps:          changeset, previous version"));
        assert!(text.contains("WARNINGS"));
        assert!(!text.contains("ERRORS"));
        assert!(text.contains("The files are valid"));
    }

    #[test]
    fn test_human_invalid_with_old_format_hint() {
        let text = human(&report(
            false,
            vec![Finding::legacy_format(
                "Scripts/script-a.yml",
                "Scripts/script-a.yml: update the file to the package format",
            )],
        ));
        assert!(text.contains("[old format] Scripts/script-a.yml: update"));
        assert!(text.contains("found as invalid (1 error(s))"));
        assert!(text.contains("To fix:"));
    }

    #[test]
    fn test_json_roundtrips_fields() {
        let mut out = Vec::new();
        write_json(&report(true, Vec::new()), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["validated_files"], 2);
        assert_eq!(value["modes"][0], "Changeset");
    }
}
