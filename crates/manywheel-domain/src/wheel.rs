use serde::Serialize;

const WHEEL_EXTENSION: &str = ".whl";

/// Compatibility tags carried in a wheel filename
/// (`{name}-{version}(-{build})?-{python}-{abi}-{platform}.whl`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WheelTags {
    pub python: String,
    pub abi: String,
    pub platform: String,
}

impl WheelTags {
    #[must_use]
    pub fn from_filename(filename: &str) -> Option<Self> {
        let stem = strip_wheel_extension(filename)?;
        let parts: Vec<&str> = stem.split('-').collect();
        if !(5..=6).contains(&parts.len()) || parts.iter().any(|part| part.is_empty()) {
            return None;
        }
        let tail = &parts[parts.len() - 3..];
        Some(Self {
            python: tail[0].to_string(),
            abi: tail[1].to_string(),
            platform: tail[2].to_string(),
        })
    }

    #[must_use]
    pub fn is_platform_independent(&self) -> bool {
        self.abi == "none" && self.platform == "any"
    }
}

/// Matches `.whl` in any case, the way pip and auditwheel accept it.
#[must_use]
pub fn has_wheel_extension(filename: &str) -> bool {
    strip_wheel_extension(filename).is_some()
}

fn strip_wheel_extension(filename: &str) -> Option<&str> {
    let split = filename.len().checked_sub(WHEEL_EXTENSION.len())?;
    let (stem, ext) = (filename.get(..split)?, filename.get(split..)?);
    ext.eq_ignore_ascii_case(WHEEL_EXTENSION).then_some(stem)
}

/// Pure wheels are shipped as-is; anything else needs its shared libraries grafted in.
#[must_use]
pub fn is_platform_independent(filename: &str) -> bool {
    WheelTags::from_filename(filename).is_some_and(|tags| tags.is_platform_independent())
}
