use color_eyre::Result;
use manywheel_core::{
    build_wheels, lex_version, python_path, BuildRequest, BuildUserError, CommandContext,
    CommandGroup, CommandInfo, ExecutionOutcome, LexVersionRequest, PythonPathRequest,
};

use crate::cli::{BuildArgs, CommandGroupCli, PythonPathArgs};

pub fn dispatch_command(
    ctx: &CommandContext,
    group: &CommandGroupCli,
) -> Result<(CommandInfo, ExecutionOutcome)> {
    match group {
        CommandGroupCli::LexVer(args) => {
            let info = CommandInfo::new(CommandGroup::LexVer, "lex-ver");
            let request = LexVersionRequest {
                version: args.version.clone(),
            };
            core_call(info, || lex_version(ctx, &request))
        }
        CommandGroupCli::PythonPath(args) => {
            let info = CommandInfo::new(CommandGroup::PythonPath, "python-path");
            let request = python_path_request_from_args(args);
            core_call(info, || python_path(ctx, &request))
        }
        CommandGroupCli::Build(args) => {
            let info = CommandInfo::new(CommandGroup::Build, "build");
            let request = build_request_from_args(args);
            core_call(info, || build_wheels(ctx, &request))
        }
    }
}

fn python_path_request_from_args(args: &PythonPathArgs) -> PythonPathRequest {
    PythonPathRequest {
        version: args.version.clone(),
        width: args.width.clone(),
        root: args.root.clone(),
    }
}

fn build_request_from_args(args: &BuildArgs) -> BuildRequest {
    BuildRequest {
        python_version: args.python_version.clone(),
        unicode_width: args.unicode_width.clone(),
        build_depends: args.build_depends.clone(),
        source: args.source.clone(),
        out: args.out.clone(),
        work_dir: args.work_dir.clone(),
        python_root: args.python_root.clone(),
        auditwheel: args.auditwheel.clone(),
        dry_run: args.dry_run,
    }
}

fn core_call<F>(info: CommandInfo, action: F) -> Result<(CommandInfo, ExecutionOutcome)>
where
    F: FnOnce() -> anyhow::Result<ExecutionOutcome>,
{
    match action() {
        Ok(result) => Ok((info, result)),
        Err(err) => {
            if let Some(user) = err.downcast_ref::<BuildUserError>() {
                return Ok((
                    info,
                    ExecutionOutcome::user_error(user.message().to_string(), user.details().clone()),
                ));
            }
            let issues: Vec<String> = err.chain().map(ToString::to_string).collect();
            Ok((
                info,
                ExecutionOutcome::failure(
                    err.to_string(),
                    serde_json::json!({
                        "reason": "internal_error",
                        "error": format!("{err:#}"),
                        "issues": issues,
                    }),
                ),
            ))
        }
    }
}
