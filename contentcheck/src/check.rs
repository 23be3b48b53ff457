//! The capability contract shared by every per-type validator.

/// Outcome of a single check: `Ok` when it passes, otherwise the problems found.
///
/// Validation failure is a value, never a panic or an error return: a
/// malformed file must be reported as invalid, not crash the run.
pub type CheckResult = Result<(), Vec<String>>;

/// Checks a validator bound to one content file may offer.
///
/// Each validator implements the subset relevant to its content type; the
/// remaining checks pass by default.
pub trait ContentCheck {
    /// Schema-independent semantic checks for the item.
    ///
    /// # Errors
    ///
    /// Returns every problem found, not only the first one.
    fn is_valid(&self) -> CheckResult;

    /// Compares the item with its previous revision, when one is available.
    ///
    /// # Errors
    ///
    /// Returns the changes that would break existing users of the item.
    fn is_backward_compatible(&self) -> CheckResult {
        Ok(())
    }

    /// The item carries the version expected in the repository (`-1`).
    ///
    /// # Errors
    ///
    /// Returns the offending version.
    fn is_valid_version(&self) -> CheckResult {
        Ok(())
    }

    /// The item id equals its name.
    ///
    /// # Errors
    ///
    /// Returns the mismatch.
    fn is_id_equals_name(&self) -> CheckResult {
        Ok(())
    }
}

/// Collects the problems of several checks into one result.
///
/// # Errors
///
/// Returns the concatenated problems of every failing check.
pub fn all_of(results: impl IntoIterator<Item = CheckResult>) -> CheckResult {
    let problems: Vec<String> = results
        .into_iter()
        .filter_map(Result::err)
        .flatten()
        .collect();
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

/// A failing result with a single problem.
///
/// # Errors
///
/// Always.
pub fn fail(problem: impl Into<String>) -> CheckResult {
    Err(vec![problem.into()])
}

/// Expect `version: -1`, the only version allowed for items in the repository.
pub(crate) fn expect_default_version(path: &str, version: Option<i64>) -> CheckResult {
    match version {
        Some(-1) => Ok(()),
        Some(other) => fail(format!(
            "{path}: version must be -1, found {other}; the server manages item versions"
        )),
        None => fail(format!("{path}: version must be -1, found none")),
    }
}
