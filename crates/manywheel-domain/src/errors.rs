use serde::Serialize;

/// User-facing problems with a requested interpreter version or unicode width.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuntimeIssue {
    #[error("invalid version '{input}': {reason}")]
    InvalidVersionFormat { input: String, reason: &'static str },
    #[error("unicode width must be 16 or 32 for python {version} (got '{width}')")]
    InvalidWidthValue { width: String, version: String },
}

impl RuntimeIssue {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidVersionFormat { .. } => "MW101",
            Self::InvalidWidthValue { .. } => "MW102",
        }
    }

    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidVersionFormat { .. } => "invalid_version_format",
            Self::InvalidWidthValue { .. } => "invalid_width_value",
        }
    }

    #[must_use]
    pub fn hint(&self) -> &'static str {
        match self {
            Self::InvalidVersionFormat { .. } => {
                "Use one to three dot-separated numbers below 1000, e.g. 2.7 or 3.6.8."
            }
            Self::InvalidWidthValue { .. } => {
                "Set UNICODE_WIDTH to 16 or 32 (u is accepted as an alias for 32)."
            }
        }
    }
}
