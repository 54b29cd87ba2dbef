use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use manywheel_domain::{RuntimeSpec, RuntimeVariant};

use crate::config::{split_build_depends, Config};
use crate::effects::ToolInvocation;
use crate::tooling::{missing_python_version_error, runtime_issue_error};

#[derive(Clone, Debug, Default)]
pub struct BuildRequest {
    pub python_version: Option<String>,
    pub unicode_width: Option<String>,
    pub build_depends: Option<String>,
    pub source: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub python_root: Option<PathBuf>,
    pub auditwheel: Option<String>,
    pub dry_run: bool,
}

/// Everything the pipeline needs, resolved from flags over environment over defaults.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct BuildPlan {
    pub(crate) runtime: RuntimeSpec,
    pub(crate) variant: RuntimeVariant,
    pub(crate) pip: PathBuf,
    pub(crate) build_depends: Vec<String>,
    pub(crate) source_dir: PathBuf,
    pub(crate) out_dir: PathBuf,
    pub(crate) work_dir: Option<PathBuf>,
    pub(crate) auditwheel: String,
}

impl BuildPlan {
    pub(crate) fn install_invocation(&self) -> Option<ToolInvocation> {
        if self.build_depends.is_empty() {
            return None;
        }
        let mut args = vec!["install".to_string()];
        args.extend(self.build_depends.iter().cloned());
        Some(ToolInvocation::new(
            self.pip.display().to_string(),
            args,
            &self.source_dir,
        ))
    }

    pub(crate) fn wheel_invocation(&self, work_dir: &Path) -> ToolInvocation {
        ToolInvocation::new(
            self.pip.display().to_string(),
            vec![
                "wheel".to_string(),
                "-w".to_string(),
                work_dir.display().to_string(),
                self.source_dir.display().to_string(),
            ],
            &self.source_dir,
        )
    }

    pub(crate) fn repair_invocation(&self, auditwheel: &str, wheel: &Path) -> ToolInvocation {
        ToolInvocation::new(
            auditwheel,
            vec![
                "repair".to_string(),
                wheel.display().to_string(),
                "-w".to_string(),
                self.out_dir.display().to_string(),
            ],
            &self.source_dir,
        )
    }
}

pub(crate) fn plan_build(config: &Config, request: &BuildRequest) -> Result<BuildPlan> {
    let runtime_config = config.runtime();
    let build_config = config.build();

    let version = given(request.python_version.as_deref())
        .or(runtime_config.python_version.as_deref())
        .filter(|value| !value.is_empty())
        .ok_or_else(missing_python_version_error)?;
    let runtime = RuntimeSpec::new(
        Some(version),
        given(request.unicode_width.as_deref()).or(Some(runtime_config.unicode_width.as_str())),
    );
    let variant = runtime
        .resolve()
        .map_err(|issue| runtime_issue_error(&issue))?;

    let python_root = absolute(
        given_path(request.python_root.as_deref()).unwrap_or(&runtime_config.python_root),
    )?;
    let source_dir = absolute(
        given_path(request.source.as_deref()).unwrap_or(&build_config.source_dir),
    )?;
    let out_dir = match (
        given_path(request.out.as_deref()),
        given_path(request.source.as_deref()),
    ) {
        (Some(out), _) => absolute(out)?,
        (None, Some(_)) => source_dir.join(crate::config::DEFAULT_OUT_SUBDIR),
        (None, None) => absolute(&build_config.out_dir)?,
    };
    let work_dir = given_path(request.work_dir.as_deref())
        .map(absolute)
        .transpose()?;
    let build_depends = request.build_depends.as_deref().map_or_else(
        || build_config.build_depends.clone(),
        split_build_depends,
    );

    Ok(BuildPlan {
        pip: variant.tool_under(&python_root, "pip"),
        runtime,
        variant,
        build_depends,
        source_dir,
        out_dir,
        work_dir,
        auditwheel: given(request.auditwheel.as_deref())
            .unwrap_or(&build_config.auditwheel)
            .to_string(),
    })
}

/// Flags given as empty strings fall back like unset environment variables.
fn given(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

fn given_path(value: Option<&Path>) -> Option<&Path> {
    value.filter(|path| !path.as_os_str().is_empty())
}

/// Tools run with the source tree as cwd, so relative paths are anchored here first.
fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("resolving {}", path.display()))
}
