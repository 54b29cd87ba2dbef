//! Naming of the CPython builds installed under a manylinux interpreter root.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::RuntimeIssue;
use crate::version::{LexedVersion, Version};

pub const DEFAULT_PYTHON_ROOT: &str = "/opt/python";
pub const DEFAULT_PYTHON_VERSION: &str = "2.7";
pub const DEFAULT_UNICODE_WIDTH: &str = "32";

const LEGACY_WIDE_ALIAS: &str = "u";

// Interpreters from 3.3 on no longer ship separate narrow and wide builds.
const FLEXIBLE_STRINGS_SINCE: Version = Version::new(3, 3, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnicodeWidth {
    Narrow,
    Wide,
}

impl UnicodeWidth {
    /// Parses `16`, `32`, or the legacy `u` alias for `32`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "16" => Some(Self::Narrow),
            "32" | LEGACY_WIDE_ALIAS => Some(Self::Wide),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Narrow => "16",
            Self::Wide => "32",
        }
    }
}

/// Requested interpreter: a dotted version plus the raw unicode width selector.
///
/// The width is kept as given because it is only validated for versions that
/// still distinguish narrow and wide builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSpec {
    pub version: String,
    pub width: String,
}

impl Default for RuntimeSpec {
    fn default() -> Self {
        Self {
            version: DEFAULT_PYTHON_VERSION.to_string(),
            width: DEFAULT_UNICODE_WIDTH.to_string(),
        }
    }
}

impl RuntimeSpec {
    /// Builds a runtime request, falling back to the defaults for absent or empty values.
    #[must_use]
    pub fn new(version: Option<&str>, width: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            version: non_empty(version).map_or(defaults.version, ToOwned::to_owned),
            width: non_empty(width).map_or(defaults.width, ToOwned::to_owned),
        }
    }

    pub fn resolve(&self) -> Result<RuntimeVariant, RuntimeIssue> {
        let lexed = self.version.parse::<Version>()?.lexed();
        let width = if self.width.is_empty() {
            DEFAULT_UNICODE_WIDTH
        } else {
            self.width.as_str()
        };
        let wide_abi = if lexed >= flexible_cutoff() {
            false
        } else {
            match UnicodeWidth::parse(width) {
                Some(UnicodeWidth::Narrow) => false,
                Some(UnicodeWidth::Wide) => true,
                None => {
                    return Err(RuntimeIssue::InvalidWidthValue {
                        width: self.width.clone(),
                        version: self.version.clone(),
                    })
                }
            }
        };
        Ok(RuntimeVariant {
            tag: self.version.replace('.', ""),
            wide_abi,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|raw| !raw.is_empty())
}

fn flexible_cutoff() -> LexedVersion {
    FLEXIBLE_STRINGS_SINCE.lexed()
}

/// One installed interpreter build, e.g. `cp27-cp27mu`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeVariant {
    tag: String,
    wide_abi: bool,
}

impl RuntimeVariant {
    #[must_use]
    pub fn dir_name(&self) -> String {
        let suffix = if self.wide_abi { "u" } else { "" };
        format!("cp{tag}-cp{tag}m{suffix}", tag = self.tag)
    }

    /// `true` for the `mu` ABI of narrow/wide-split interpreters.
    #[must_use]
    pub fn is_wide_abi(&self) -> bool {
        self.wide_abi
    }

    #[must_use]
    pub fn path(&self) -> String {
        format!("{DEFAULT_PYTHON_ROOT}/{}", self.dir_name())
    }

    #[must_use]
    pub fn path_under(&self, root: &Path) -> PathBuf {
        root.join(self.dir_name())
    }

    #[must_use]
    pub fn bin_dir_under(&self, root: &Path) -> PathBuf {
        self.path_under(root).join("bin")
    }

    #[must_use]
    pub fn tool_under(&self, root: &Path, name: &str) -> PathBuf {
        self.bin_dir_under(root).join(name)
    }
}

/// Resolves the interpreter directory for `version` and `width` under `/opt/python`.
pub fn resolve_path(version: &str, width: &str) -> Result<String, RuntimeIssue> {
    RuntimeSpec::new(Some(version), Some(width))
        .resolve()
        .map(|variant| variant.path())
}
