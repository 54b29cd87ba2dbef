use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;
use tempfile::TempDir;
use tracing::{info, warn};

use super::artifacts::collect_artifact_summaries;
use super::pipeline::{PipelineError, WheelPipeline};
use super::plan::{plan_build, BuildPlan, BuildRequest};
use crate::effects::OutputMode;
use crate::tooling::error_outcome;
use crate::{CommandContext, ExecutionOutcome};

const WORK_DIR_PREFIX: &str = ".manywheel-";

/// Builds, repairs and publishes the wheels of one source tree.
///
/// # Errors
/// Returns an error only when the outcome itself cannot be assembled; user
/// mistakes and failing steps are reported through the outcome status.
pub fn build_wheels(ctx: &CommandContext, request: &BuildRequest) -> Result<ExecutionOutcome> {
    let plan = match plan_build(ctx.config(), request) {
        Ok(plan) => plan,
        Err(err) => return Ok(error_outcome(err, "could not plan the build")),
    };

    if request.dry_run {
        return Ok(dry_run_outcome(&plan));
    }

    let staging = match StagingDir::prepare(&plan) {
        Ok(staging) => staging,
        Err(err) => return Ok(error_outcome(err, "could not prepare a staging directory")),
    };
    let mode = if ctx.capture_tool_output() {
        OutputMode::Capture
    } else {
        OutputMode::Stream
    };

    info!(
        runtime = %plan.variant.dir_name(),
        source = %plan.source_dir.display(),
        out = %plan.out_dir.display(),
        "starting wheel build"
    );
    let report = match WheelPipeline::new(ctx.effects(), &plan, mode).run(staging.path()) {
        Ok(report) => report,
        Err(err) => return Ok(pipeline_failure(&plan, &err)),
    };

    let artifacts = collect_artifact_summaries(&plan.out_dir)
        .with_context(|| format!("summarizing wheels in {}", plan.out_dir.display()))?;
    let built = report.wheels.len();
    let message = format!(
        "built {built} wheel{} for {} into {}",
        if built == 1 { "" } else { "s" },
        plan.variant.dir_name(),
        plan.out_dir.display()
    );
    Ok(ExecutionOutcome::success(
        message,
        json!({
            "runtime": plan.variant.dir_name(),
            "python_version": plan.runtime.version,
            "unicode_width": plan.runtime.width,
            "out_dir": plan.out_dir.display().to_string(),
            "artifacts": artifacts,
            "steps": report.steps,
            "wheels": report.wheels,
            "dry_run": false,
        }),
    ))
}

fn dry_run_outcome(plan: &BuildPlan) -> ExecutionOutcome {
    let work_dir = plan
        .work_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("<{WORK_DIR_PREFIX}tmp>")));
    let mut commands = Vec::new();
    if let Some(install) = plan.install_invocation() {
        commands.push(install.to_string());
    }
    commands.push(plan.wheel_invocation(&work_dir).to_string());
    commands.push(format!(
        "{} repair <platform wheel> -w {}",
        plan.auditwheel,
        plan.out_dir.display()
    ));
    ExecutionOutcome::success(
        format!(
            "dry-run (runtime={}, out={})",
            plan.variant.dir_name(),
            plan.out_dir.display()
        ),
        json!({
            "plan": plan,
            "commands": commands,
            "set_permissions": plan.out_dir.display().to_string(),
            "dry_run": true,
        }),
    )
}

fn pipeline_failure(plan: &BuildPlan, err: &PipelineError) -> ExecutionOutcome {
    warn!(step = %err.step, "wheel build stopped");
    ExecutionOutcome::failure(
        err.to_string(),
        json!({
            "reason": "step_failed",
            "step": err.step,
            "code": err.step.code(),
            "error": err.message,
            "command": err.command,
            "exit_code": err.exit_code,
            "stderr": err.stderr,
            "runtime": plan.variant.dir_name(),
            "hint": step_hint(err),
        }),
    )
}

fn step_hint(err: &PipelineError) -> String {
    use super::pipeline::PipelineStep;

    match err.step {
        PipelineStep::InstallDependencies => {
            "check BUILD_DEPENDS names and that the interpreter can reach the package index"
                .to_string()
        }
        PipelineStep::BuildWheels => {
            "rerun with -v to stream pip output and inspect the compiler errors".to_string()
        }
        PipelineStep::RepairWheels => {
            "ensure auditwheel is installed or pass --auditwheel <path>".to_string()
        }
        PipelineStep::SetPermissions => {
            "check that the output directory is writable by the current user".to_string()
        }
    }
}

/// The directory `pip wheel` writes into before repair; temporary unless given.
struct StagingDir {
    path: PathBuf,
    _temp: Option<TempDir>,
}

impl StagingDir {
    fn prepare(plan: &BuildPlan) -> Result<Self> {
        if let Some(path) = &plan.work_dir {
            std::fs::create_dir_all(path)
                .with_context(|| format!("creating work directory at {}", path.display()))?;
            return Ok(Self {
                path: path.clone(),
                _temp: None,
            });
        }
        let temp = tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir()
            .context("creating temporary wheel directory")?;
        Ok(Self {
            path: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
