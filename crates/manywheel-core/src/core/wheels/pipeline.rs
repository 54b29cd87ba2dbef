use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{anyhow, Context};
use serde::Serialize;
use tracing::{debug, info};

use manywheel_domain::is_platform_independent;

use super::artifacts::{file_name, is_wheel};
use super::permissions::relax_permissions;
use super::plan::BuildPlan;
use crate::effects::{Effects, OutputMode, ToolInvocation};
use crate::process::RunOutput;

const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStep {
    InstallDependencies,
    BuildWheels,
    RepairWheels,
    SetPermissions,
}

impl PipelineStep {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InstallDependencies => "install-dependencies",
            Self::BuildWheels => "build-wheels",
            Self::RepairWheels => "repair-wheels",
            Self::SetPermissions => "set-permissions",
        }
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::InstallDependencies => "MW410",
            Self::BuildWheels => "MW411",
            Self::RepairWheels => "MW412",
            Self::SetPermissions => "MW413",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The first step that failed; later steps never ran.
#[derive(Debug, thiserror::Error)]
#[error("{step} failed: {message}")]
pub struct PipelineError {
    pub step: PipelineStep,
    pub message: String,
    pub exit_code: Option<i32>,
    pub stderr: Option<String>,
    pub command: Option<String>,
}

impl PipelineError {
    fn from_error(step: PipelineStep, err: &anyhow::Error) -> Self {
        Self {
            step,
            message: format!("{err:#}"),
            exit_code: None,
            stderr: None,
            command: None,
        }
    }

    fn from_exit(step: PipelineStep, invocation: &ToolInvocation, output: &RunOutput) -> Self {
        Self {
            step,
            message: format!("{} exited with status {}", invocation.program, output.code),
            exit_code: Some(output.code),
            stderr: output.stderr_tail(STDERR_TAIL_LINES),
            command: Some(invocation.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WheelAction {
    Copied,
    Repaired,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: PipelineStep,
    pub status: StepStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct WheelRecord {
    pub wheel: String,
    pub action: WheelAction,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub steps: Vec<StepRecord>,
    pub wheels: Vec<WheelRecord>,
}

impl PipelineReport {
    fn record(&mut self, step: PipelineStep, status: StepStatus) {
        self.steps.push(StepRecord { step, status });
    }
}

pub(crate) struct WheelPipeline<'a> {
    effects: &'a dyn Effects,
    plan: &'a BuildPlan,
    mode: OutputMode,
}

impl<'a> WheelPipeline<'a> {
    pub(crate) fn new(effects: &'a dyn Effects, plan: &'a BuildPlan, mode: OutputMode) -> Self {
        Self {
            effects,
            plan,
            mode,
        }
    }

    /// Runs install → build → repair → permissions, stopping at the first failure.
    pub(crate) fn run(&self, work_dir: &Path) -> Result<PipelineReport, PipelineError> {
        let mut report = PipelineReport::default();

        let status = self.install_dependencies()?;
        report.record(PipelineStep::InstallDependencies, status);

        let built = self.build_wheels(work_dir)?;
        report.record(PipelineStep::BuildWheels, StepStatus::Ok);

        report.wheels = self.repair_wheels(&built)?;
        report.record(PipelineStep::RepairWheels, StepStatus::Ok);

        self.set_permissions()?;
        report.record(PipelineStep::SetPermissions, StepStatus::Ok);

        Ok(report)
    }

    fn install_dependencies(&self) -> Result<StepStatus, PipelineError> {
        let step = PipelineStep::InstallDependencies;
        let Some(invocation) = self.plan.install_invocation() else {
            debug!("no build dependencies requested");
            return Ok(StepStatus::Skipped);
        };
        info!(deps = %self.plan.build_depends.join(" "), "installing build dependencies");
        self.run_tool(step, &invocation)?;
        Ok(StepStatus::Ok)
    }

    /// Only wheels that `pip wheel` created or rewrote count; a reused work
    /// dir may still hold wheels from an earlier interpreter.
    fn build_wheels(&self, work_dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let step = PipelineStep::BuildWheels;
        let before = self.wheel_stamps(step, work_dir)?;
        if !before.is_empty() {
            debug!(stale = before.len(), "work dir already holds wheels");
        }
        info!(source = %self.plan.source_dir.display(), "building wheels");
        self.run_tool(step, &self.plan.wheel_invocation(work_dir))?;
        let built: Vec<PathBuf> = self
            .wheel_stamps(step, work_dir)?
            .into_iter()
            .filter(|(path, stamp)| before.get(path) != Some(stamp))
            .map(|(path, _)| path)
            .collect();
        if built.is_empty() {
            return Err(PipelineError::from_error(
                step,
                &anyhow!("pip wheel produced no wheels in {}", work_dir.display()),
            ));
        }
        debug!(count = built.len(), "wheels built");
        Ok(built)
    }

    fn repair_wheels(&self, built: &[PathBuf]) -> Result<Vec<WheelRecord>, PipelineError> {
        let step = PipelineStep::RepairWheels;
        let out_dir = &self.plan.out_dir;
        self.effects
            .fs()
            .create_dir_all(out_dir)
            .with_context(|| format!("creating output directory at {}", out_dir.display()))
            .map_err(|err| PipelineError::from_error(step, &err))?;

        let mut auditwheel: Option<String> = None;
        let mut records = Vec::new();
        for wheel in built {
            let name = file_name(wheel);
            if is_platform_independent(&name) {
                debug!(wheel = %name, "copying platform independent wheel");
                self.effects
                    .fs()
                    .copy(wheel, &out_dir.join(&name))
                    .map_err(|err| PipelineError::from_error(step, &err))?;
                records.push(WheelRecord {
                    wheel: name,
                    action: WheelAction::Copied,
                });
                continue;
            }
            let program = match &auditwheel {
                Some(program) => program.clone(),
                None => {
                    let resolved = resolve_program(&self.plan.auditwheel)
                        .map_err(|err| PipelineError::from_error(step, &err))?;
                    auditwheel = Some(resolved.clone());
                    resolved
                }
            };
            info!(wheel = %name, "repairing wheel");
            self.run_tool(step, &self.plan.repair_invocation(&program, wheel))?;
            records.push(WheelRecord {
                wheel: name,
                action: WheelAction::Repaired,
            });
        }
        Ok(records)
    }

    fn set_permissions(&self) -> Result<(), PipelineError> {
        let visited = relax_permissions(&self.plan.out_dir)
            .map_err(|err| PipelineError::from_error(PipelineStep::SetPermissions, &err))?;
        debug!(entries = visited, "relaxed output permissions");
        Ok(())
    }

    fn run_tool(
        &self,
        step: PipelineStep,
        invocation: &ToolInvocation,
    ) -> Result<RunOutput, PipelineError> {
        debug!(%step, command = %invocation, "running tool");
        let output = self
            .effects
            .tools()
            .run(invocation, self.mode)
            .map_err(|err| PipelineError::from_error(step, &err))?;
        if output.success() {
            Ok(output)
        } else {
            Err(PipelineError::from_exit(step, invocation, &output))
        }
    }

    fn wheel_stamps(
        &self,
        step: PipelineStep,
        dir: &Path,
    ) -> Result<BTreeMap<PathBuf, WheelStamp>, PipelineError> {
        let entries = self
            .effects
            .fs()
            .list_dir(dir)
            .map_err(|err| PipelineError::from_error(step, &err))?;
        let mut stamps = BTreeMap::new();
        for path in entries.into_iter().filter(|path| is_wheel(path)) {
            let metadata = fs::metadata(&path)
                .with_context(|| format!("reading metadata for {}", path.display()))
                .map_err(|err| PipelineError::from_error(step, &err))?;
            if metadata.is_file() {
                let stamp = WheelStamp {
                    len: metadata.len(),
                    modified: metadata.modified().ok(),
                };
                stamps.insert(path, stamp);
            }
        }
        Ok(stamps)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WheelStamp {
    len: u64,
    modified: Option<SystemTime>,
}

/// Bare program names are looked up on `PATH`; anything with a separator is used as-is.
fn resolve_program(program: &str) -> anyhow::Result<String> {
    if program.contains(std::path::MAIN_SEPARATOR) || program.contains('/') {
        return Ok(program.to_string());
    }
    let path = which::which(program).with_context(|| format!("{program} not found on PATH"))?;
    Ok(path.display().to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::{Config, EnvSnapshot};
    use crate::effects::{FileSystem, ToolRunner};
    use super::super::plan::{plan_build, BuildRequest};

    /// Pretends to be pip and auditwheel: `pip wheel` drops the configured
    /// wheel names into the work dir, `auditwheel repair` writes a
    /// `manylinux1` copy into the output dir.
    struct FakeTools {
        built: Vec<&'static str>,
        fail_program: Option<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTools {
        fn new(built: Vec<&'static str>) -> Self {
            Self {
                built,
                fail_program: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ToolRunner for FakeTools {
        fn run(&self, invocation: &ToolInvocation, _mode: OutputMode) -> anyhow::Result<RunOutput> {
            self.calls.lock().unwrap().push(invocation.to_string());
            let sub = invocation.args.first().map(String::as_str);
            if let Some(fail) = self.fail_program {
                if sub == Some(fail) {
                    return Ok(RunOutput {
                        code: 3,
                        stdout: String::new(),
                        stderr: format!("{fail} blew up\n"),
                    });
                }
            }
            match sub {
                Some("wheel") => {
                    let dir = PathBuf::from(&invocation.args[2]);
                    for name in &self.built {
                        fs::write(dir.join(name), name.as_bytes())?;
                    }
                }
                Some("repair") => {
                    let wheel = PathBuf::from(&invocation.args[1]);
                    let out = PathBuf::from(&invocation.args[3]);
                    let name = file_name(&wheel).replace("linux_x86_64", "manylinux1_x86_64");
                    fs::write(out.join(name), b"repaired")?;
                }
                _ => {}
            }
            Ok(RunOutput {
                code: 0,
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    struct FakeEffects {
        tools: FakeTools,
    }

    impl Effects for FakeEffects {
        fn tools(&self) -> &dyn ToolRunner {
            &self.tools
        }

        fn fs(&self) -> &dyn FileSystem {
            &crate::effects::SystemFileSystem
        }
    }

    fn plan_in(root: &Path, build_depends: &str) -> BuildPlan {
        let config = Config::from_snapshot(&EnvSnapshot::testing(&[
            ("PYTHON_VERSION", "2.7"),
            ("BUILD_DEPENDS", build_depends),
        ]));
        let request = BuildRequest {
            source: Some(root.join("src")),
            out: Some(root.join("dist")),
            python_root: Some(root.join("python")),
            auditwheel: Some("/usr/local/bin/auditwheel".into()),
            ..BuildRequest::default()
        };
        plan_build(&config, &request).unwrap()
    }

    #[test]
    fn pipeline_copies_pure_wheels_and_repairs_the_rest() {
        let temp = tempfile::tempdir().unwrap();
        let work = temp.path().join("work");
        fs::create_dir_all(&work).unwrap();
        let plan = plan_in(temp.path(), "numpy cython");
        let effects = FakeEffects {
            tools: FakeTools::new(vec![
                "six-1.16.0-py2.py3-none-any.whl",
                "nipy-0.4.2-cp27-cp27mu-linux_x86_64.whl",
            ]),
        };

        let report = WheelPipeline::new(&effects, &plan, OutputMode::Capture)
            .run(&work)
            .unwrap();

        let pip = temp.path().join("python/cp27-cp27mu/bin/pip");
        let calls = effects.tools.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], format!("{} install numpy cython", pip.display()));
        assert!(calls[1].starts_with(&format!("{} wheel -w", pip.display())));
        assert!(calls[2].starts_with("/usr/local/bin/auditwheel repair"));
        assert!(calls[2].contains("nipy-0.4.2-cp27-cp27mu-linux_x86_64.whl"));

        let dist = temp.path().join("dist");
        assert!(dist.join("six-1.16.0-py2.py3-none-any.whl").exists());
        assert!(dist.join("nipy-0.4.2-cp27-cp27mu-manylinux1_x86_64.whl").exists());
        assert!(!dist.join("nipy-0.4.2-cp27-cp27mu-linux_x86_64.whl").exists());

        let steps: Vec<_> = report.steps.iter().map(|r| (r.step, r.status)).collect();
        assert_eq!(
            steps,
            vec![
                (PipelineStep::InstallDependencies, StepStatus::Ok),
                (PipelineStep::BuildWheels, StepStatus::Ok),
                (PipelineStep::RepairWheels, StepStatus::Ok),
                (PipelineStep::SetPermissions, StepStatus::Ok),
            ]
        );
        let actions: Vec<_> = report.wheels.iter().map(|w| w.action).collect();
        assert_eq!(actions, vec![WheelAction::Repaired, WheelAction::Copied]);
    }

    #[test]
    fn pipeline_skips_install_without_build_depends() {
        let temp = tempfile::tempdir().unwrap();
        let work = temp.path().join("work");
        fs::create_dir_all(&work).unwrap();
        let plan = plan_in(temp.path(), "");
        let effects = FakeEffects {
            tools: FakeTools::new(vec!["six-1.16.0-py2.py3-none-any.whl"]),
        };

        let report = WheelPipeline::new(&effects, &plan, OutputMode::Capture)
            .run(&work)
            .unwrap();

        assert_eq!(effects.tools.calls().len(), 1);
        assert_eq!(report.steps[0].status, StepStatus::Skipped);
    }

    #[test]
    fn pipeline_stops_at_first_failing_step() {
        let temp = tempfile::tempdir().unwrap();
        let work = temp.path().join("work");
        fs::create_dir_all(&work).unwrap();
        let plan = plan_in(temp.path(), "numpy");
        let mut tools = FakeTools::new(vec!["nipy-0.4.2-cp27-cp27mu-linux_x86_64.whl"]);
        tools.fail_program = Some("install");
        let effects = FakeEffects { tools };

        let err = WheelPipeline::new(&effects, &plan, OutputMode::Capture)
            .run(&work)
            .unwrap_err();

        assert_eq!(err.step, PipelineStep::InstallDependencies);
        assert_eq!(err.exit_code, Some(3));
        assert_eq!(err.stderr.as_deref(), Some("install blew up"));
        assert_eq!(effects.tools.calls().len(), 1);
        assert!(!temp.path().join("dist").exists());
    }

    #[test]
    fn repair_failure_names_the_repair_step() {
        let temp = tempfile::tempdir().unwrap();
        let work = temp.path().join("work");
        fs::create_dir_all(&work).unwrap();
        let plan = plan_in(temp.path(), "");
        let mut tools = FakeTools::new(vec!["nipy-0.4.2-cp27-cp27mu-linux_x86_64.whl"]);
        tools.fail_program = Some("repair");
        let effects = FakeEffects { tools };

        let err = WheelPipeline::new(&effects, &plan, OutputMode::Capture)
            .run(&work)
            .unwrap_err();

        assert_eq!(err.step, PipelineStep::RepairWheels);
        assert!(err.to_string().starts_with("repair-wheels failed"));
    }

    #[test]
    fn empty_wheel_build_is_a_build_failure() {
        let temp = tempfile::tempdir().unwrap();
        let work = temp.path().join("work");
        fs::create_dir_all(&work).unwrap();
        let plan = plan_in(temp.path(), "");
        let effects = FakeEffects {
            tools: FakeTools::new(Vec::new()),
        };

        let err = WheelPipeline::new(&effects, &plan, OutputMode::Capture)
            .run(&work)
            .unwrap_err();

        assert_eq!(err.step, PipelineStep::BuildWheels);
        assert!(err.message.contains("produced no wheels"));
    }

    #[test]
    fn leftover_wheels_in_work_dir_are_not_rebuilt_output() {
        let temp = tempfile::tempdir().unwrap();
        let work = temp.path().join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(
            work.join("old-1.0-cp27-cp27mu-linux_x86_64.whl"),
            b"from an earlier run",
        )
        .unwrap();
        let plan = plan_in(temp.path(), "");

        let silent = FakeEffects {
            tools: FakeTools::new(Vec::new()),
        };
        let err = WheelPipeline::new(&silent, &plan, OutputMode::Capture)
            .run(&work)
            .unwrap_err();
        assert_eq!(err.step, PipelineStep::BuildWheels);
        assert_eq!(silent.tools.calls().len(), 1);

        let building = FakeEffects {
            tools: FakeTools::new(vec!["six-1.16.0-py2.py3-none-any.whl"]),
        };
        let report = WheelPipeline::new(&building, &plan, OutputMode::Capture)
            .run(&work)
            .unwrap();
        let names: Vec<_> = report.wheels.iter().map(|w| w.wheel.as_str()).collect();
        assert_eq!(names, vec!["six-1.16.0-py2.py3-none-any.whl"]);
        assert!(building.tools.calls().iter().all(|call| !call.contains("repair")));
    }
}
