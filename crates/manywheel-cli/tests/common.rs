#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

const MANAGED_ENV: &[&str] = &[
    "PYTHON_VERSION",
    "UNICODE_WIDTH",
    "BUILD_DEPENDS",
    "MANYWHEEL_SOURCE",
    "MANYWHEEL_OUT",
    "MANYWHEEL_PYTHON_ROOT",
    "MANYWHEEL_AUDITWHEEL",
    "MANYWHEEL_MAX_CAPTURE_BYTES",
];

/// A `manywheel` command isolated from the caller's build environment.
pub fn manywheel() -> Command {
    let mut cmd = cargo_bin_cmd!("manywheel");
    for key in MANAGED_ENV {
        cmd.env_remove(key);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

pub fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("run manywheel");
    String::from_utf8(output.stdout).expect("utf8 stdout")
}

pub fn json_of(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().expect("run manywheel");
    serde_json::from_slice(&output.stdout).expect("json payload")
}

#[cfg(unix)]
pub fn write_script(path: &std::path::Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("script dir");
    }
    std::fs::write(path, format!("#!/bin/sh\n{body}")).expect("write script");
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).expect("chmod script");
}
