#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod errors;
pub mod runtime;
pub mod version;
pub mod wheel;

pub use errors::RuntimeIssue;
pub use runtime::{
    resolve_path, RuntimeSpec, RuntimeVariant, UnicodeWidth, DEFAULT_PYTHON_ROOT,
    DEFAULT_PYTHON_VERSION, DEFAULT_UNICODE_WIDTH,
};
pub use version::{lex_ver, LexedVersion, Version};
pub use wheel::{has_wheel_extension, is_platform_independent, WheelTags};
