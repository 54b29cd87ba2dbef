use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use manywheel_domain::{DEFAULT_PYTHON_ROOT, DEFAULT_UNICODE_WIDTH};

pub const PYTHON_VERSION_ENV: &str = "PYTHON_VERSION";
pub const UNICODE_WIDTH_ENV: &str = "UNICODE_WIDTH";
pub const BUILD_DEPENDS_ENV: &str = "BUILD_DEPENDS";
pub const SOURCE_ENV: &str = "MANYWHEEL_SOURCE";
pub const OUT_ENV: &str = "MANYWHEEL_OUT";
pub const PYTHON_ROOT_ENV: &str = "MANYWHEEL_PYTHON_ROOT";
pub const AUDITWHEEL_ENV: &str = "MANYWHEEL_AUDITWHEEL";

pub const DEFAULT_SOURCE_DIR: &str = "/io";
pub const DEFAULT_OUT_SUBDIR: &str = "dist";
pub const DEFAULT_AUDITWHEEL: &str = "auditwheel";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Like [`EnvSnapshot::var`], but treats an empty value as unset.
    pub(crate) fn non_empty(&self, key: &str) -> Option<&str> {
        self.var(key).filter(|value| !value.is_empty())
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug)]
pub struct Config {
    pub(crate) runtime: RuntimeConfig,
    pub(crate) build: BuildConfig,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        let source_dir = snapshot
            .non_empty(SOURCE_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_SOURCE_DIR), PathBuf::from);
        Self {
            runtime: RuntimeConfig {
                python_version: snapshot.non_empty(PYTHON_VERSION_ENV).map(ToOwned::to_owned),
                unicode_width: snapshot
                    .non_empty(UNICODE_WIDTH_ENV)
                    .unwrap_or(DEFAULT_UNICODE_WIDTH)
                    .to_string(),
                python_root: snapshot
                    .non_empty(PYTHON_ROOT_ENV)
                    .map_or_else(|| PathBuf::from(DEFAULT_PYTHON_ROOT), PathBuf::from),
            },
            build: BuildConfig {
                build_depends: snapshot
                    .var(BUILD_DEPENDS_ENV)
                    .map(split_build_depends)
                    .unwrap_or_default(),
                out_dir: snapshot
                    .non_empty(OUT_ENV)
                    .map_or_else(|| source_dir.join(DEFAULT_OUT_SUBDIR), PathBuf::from),
                source_dir,
                auditwheel: snapshot
                    .non_empty(AUDITWHEEL_ENV)
                    .unwrap_or(DEFAULT_AUDITWHEEL)
                    .to_string(),
            },
        }
    }

    #[must_use]
    pub fn runtime(&self) -> &RuntimeConfig {
        &self.runtime
    }

    #[must_use]
    pub fn build(&self) -> &BuildConfig {
        &self.build
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// `None` when `PYTHON_VERSION` is unset; `build` requires it.
    pub python_version: Option<String>,
    pub unicode_width: String,
    pub python_root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub build_depends: Vec<String>,
    pub source_dir: PathBuf,
    pub out_dir: PathBuf,
    pub auditwheel: String,
}

pub(crate) fn split_build_depends(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(ToOwned::to_owned).collect()
}
