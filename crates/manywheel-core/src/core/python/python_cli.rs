use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;
use tracing::debug;

use manywheel_domain::{lex_ver, RuntimeSpec};

use crate::tooling::runtime_issue_outcome;
use crate::{CommandContext, ExecutionOutcome};

#[derive(Clone, Debug)]
pub struct LexVersionRequest {
    pub version: String,
}

#[derive(Clone, Debug, Default)]
pub struct PythonPathRequest {
    pub version: Option<String>,
    pub width: Option<String>,
    pub root: Option<PathBuf>,
}

/// Prints the fixed-width encoding of a dotted version.
///
/// # Errors
/// Never fails; malformed versions are reported as user errors.
pub fn lex_version(_ctx: &CommandContext, request: &LexVersionRequest) -> Result<ExecutionOutcome> {
    match lex_ver(&request.version) {
        Ok(lexed) => Ok(ExecutionOutcome::success(
            lexed.to_string(),
            json!({
                "passthrough": true,
                "version": request.version,
                "lexed": lexed,
            }),
        )),
        Err(issue) => Ok(runtime_issue_outcome(&issue)),
    }
}

/// Resolves the interpreter directory for the requested (or configured) runtime.
///
/// # Errors
/// Never fails; invalid versions or widths are reported as user errors.
pub fn python_path(ctx: &CommandContext, request: &PythonPathRequest) -> Result<ExecutionOutcome> {
    let runtime = ctx.config().runtime();
    let spec = RuntimeSpec::new(
        request
            .version
            .as_deref()
            .or(runtime.python_version.as_deref()),
        request
            .width
            .as_deref()
            .or(Some(runtime.unicode_width.as_str())),
    );
    let variant = match spec.resolve() {
        Ok(variant) => variant,
        Err(issue) => return Ok(runtime_issue_outcome(&issue)),
    };
    let root = request.root.as_ref().unwrap_or(&runtime.python_root);
    let path = variant.path_under(root);
    debug!(version = %spec.version, width = %spec.width, path = %path.display(), "resolved runtime variant");
    Ok(ExecutionOutcome::success(
        path.display().to_string(),
        json!({
            "passthrough": true,
            "path": path.display().to_string(),
            "variant": variant.dir_name(),
            "version": spec.version,
            "width": spec.width,
            "wide_abi": variant.is_wide_abi(),
        }),
    ))
}
