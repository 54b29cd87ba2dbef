use atty::Stream;
use color_eyre::Result;
use manywheel_core::{
    format_status_message, to_json_response, CommandInfo, CommandStatus, ExecutionOutcome,
};
use serde_json::Value;

use crate::style::Style;

#[derive(Clone, Copy, Debug)]
pub struct OutputOptions {
    pub quiet: bool,
    pub json: bool,
    pub no_color: bool,
    pub verbose: u8,
}

pub fn emit_output(
    opts: &OutputOptions,
    info: CommandInfo,
    outcome: &ExecutionOutcome,
) -> Result<i32> {
    let code = outcome.status.exit_code();

    if opts.json {
        let payload = to_json_response(info, outcome);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(code);
    }

    match outcome.status {
        CommandStatus::Ok => {
            if opts.quiet {
                return Ok(code);
            }
            if is_passthrough(&outcome.details) {
                println!("{}", outcome.message);
                return Ok(code);
            }
            let style = Style::new(opts.no_color, atty::is(Stream::Stdout));
            let message = format_status_message(info, &outcome.message);
            println!("{}", style.status(&outcome.status, &message));
            for line in detail_lines(&outcome.details, opts.verbose) {
                println!("{}", style.info(&line));
            }
        }
        CommandStatus::UserError | CommandStatus::Failure => {
            let style = Style::new(opts.no_color, atty::is(Stream::Stderr));
            let message = format_status_message(info, &outcome.message);
            let header = match string_field(&outcome.details, "code") {
                Some(code) => format!("{code}  {message}"),
                None => message,
            };
            eprintln!("{}", style.error_header(&outcome.status, &header));
            let why = why_bullets(&outcome.details);
            if !why.is_empty() {
                eprintln!();
                eprintln!("{}", style.section("Why:"));
                for reason in why {
                    eprintln!("  • {reason}");
                }
            }
            if let Some(hint) = string_field(&outcome.details, "hint") {
                eprintln!();
                eprintln!("{}", style.info(&format!("Hint: {hint}")));
            }
            if let Some(stderr) = string_field(&outcome.details, "stderr") {
                if !stderr.trim().is_empty() {
                    eprintln!();
                    eprintln!("{}", style.section("stderr:"));
                    eprintln!("{}", style.dimmed(stderr));
                }
            }
        }
    }

    Ok(code)
}

fn is_passthrough(details: &Value) -> bool {
    details
        .as_object()
        .and_then(|map| map.get("passthrough"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn string_field<'a>(details: &'a Value, key: &str) -> Option<&'a str> {
    details
        .as_object()
        .and_then(|map| map.get(key))
        .and_then(Value::as_str)
}

/// Per-wheel lines after a build, and the planned commands after a dry run.
fn detail_lines(details: &Value, verbose: u8) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(commands) = details.get("commands").and_then(Value::as_array) {
        lines.extend(
            commands
                .iter()
                .filter_map(Value::as_str)
                .map(|command| format!("  would run: {command}")),
        );
    }
    if let Some(dir) = string_field(details, "set_permissions") {
        lines.push(format!("  would set a+rwX permissions under {dir}"));
    }
    if let Some(wheels) = details.get("wheels").and_then(Value::as_array) {
        for wheel in wheels {
            let name = wheel.get("wheel").and_then(Value::as_str).unwrap_or_default();
            let action = wheel.get("action").and_then(Value::as_str).unwrap_or_default();
            lines.push(format!("  {action} {name}"));
        }
    }
    if verbose > 0 {
        if let Some(artifacts) = details.get("artifacts").and_then(Value::as_array) {
            for artifact in artifacts {
                let name = artifact
                    .get("filename")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let sha = artifact
                    .get("sha256")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                lines.push(format!("  {name} sha256={sha}"));
            }
        }
    }
    lines
}

fn why_bullets(details: &Value) -> Vec<String> {
    let mut bullets = Vec::new();
    if let Some(reason) = string_field(details, "reason") {
        bullets.push(reason_display(reason).to_string());
    }
    if let Some(command) = string_field(details, "command") {
        bullets.push(format!("command: {command}"));
    }
    if let Some(code) = details.get("exit_code").and_then(Value::as_i64) {
        bullets.push(format!("exit status {code}"));
    }
    if let Some(issues) = details.get("issues").and_then(Value::as_array) {
        for issue in issues.iter().filter_map(Value::as_str) {
            if !bullets.iter().any(|existing| existing == issue) {
                bullets.push(issue.to_string());
            }
        }
    } else if let Some(error) = string_field(details, "error") {
        bullets.push(error.to_string());
    }
    bullets
}

fn reason_display(reason: &str) -> &str {
    match reason {
        "invalid_version_format" => "version is not a dotted string of up to three numbers",
        "invalid_width_value" => "UNICODE_WIDTH must be 16 or 32 for this Python version",
        "missing_python_version" => "no Python version was requested",
        "step_failed" => "a build step exited unsuccessfully",
        "internal_error" => "unexpected internal error",
        other => other,
    }
}
