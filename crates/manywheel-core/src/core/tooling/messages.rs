use serde_json::json;

use manywheel_domain::RuntimeIssue;

use crate::{BuildUserError, ExecutionOutcome};

pub(crate) fn runtime_issue_outcome(issue: &RuntimeIssue) -> ExecutionOutcome {
    ExecutionOutcome::user_error(issue.to_string(), runtime_issue_details(issue))
}

pub(crate) fn runtime_issue_error(issue: &RuntimeIssue) -> BuildUserError {
    BuildUserError::new(issue.to_string(), runtime_issue_details(issue))
}

fn runtime_issue_details(issue: &RuntimeIssue) -> serde_json::Value {
    json!({
        "code": issue.code(),
        "reason": issue.reason(),
        "hint": issue.hint(),
        "issue": issue,
    })
}

pub(crate) fn missing_python_version_error() -> BuildUserError {
    BuildUserError::new(
        "PYTHON_VERSION is not set",
        json!({
            "code": "MW103",
            "reason": "missing_python_version",
            "hint": "export PYTHON_VERSION (e.g. 2.7 or 3.6) or pass --python-version",
        }),
    )
}

/// Converts an error into an outcome, keeping user errors distinct from failures.
pub(crate) fn error_outcome(err: anyhow::Error, context: &str) -> ExecutionOutcome {
    match err.downcast::<BuildUserError>() {
        Ok(user) => ExecutionOutcome::user_error(user.message, user.details),
        Err(other) => {
            let issues: Vec<String> = other.chain().map(ToString::to_string).collect();
            ExecutionOutcome::failure(
                context,
                json!({
                    "reason": "internal_error",
                    "error": format!("{other:#}"),
                    "issues": issues,
                }),
            )
        }
    }
}
