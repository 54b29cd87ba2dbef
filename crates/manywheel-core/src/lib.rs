#![deny(clippy::all, warnings)]

mod core;

pub(crate) use crate::core::config;
pub(crate) use crate::core::runtime::{effects, process};
pub(crate) use crate::core::tooling;

pub use crate::core::config::context::{CommandContext, CommandInfo};
pub use crate::core::config::{BuildConfig, Config, GlobalOptions, RuntimeConfig};
pub use crate::core::runtime::effects::{
    Effects, FileSystem, OutputMode, SharedEffects, SystemEffects, ToolInvocation, ToolRunner,
};
pub use crate::core::runtime::process::RunOutput;
pub use crate::core::runtime::CommandGroup;
pub use crate::core::tooling::outcome::{BuildUserError, CommandStatus, ExecutionOutcome};

pub use crate::core::python::python_cli::{
    lex_version, python_path, LexVersionRequest, PythonPathRequest,
};
pub use crate::core::wheels::{build_wheels, BuildRequest, PipelineStep, StepStatus, WheelAction};

pub use crate::core::runtime::{format_status_message, to_json_response, MANYWHEEL_VERSION};
