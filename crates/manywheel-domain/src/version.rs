//! Dotted interpreter versions and their fixed-width lexical encoding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::RuntimeIssue;

const COMPONENT_WIDTH: usize = 3;
const MAX_COMPONENTS: usize = 3;
const LEXED_LEN: usize = COMPONENT_WIDTH * MAX_COMPONENTS;

/// A `major.minor.patch` triple; omitted trailing components are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl Version {
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Zero-pads every component to three digits and concatenates them.
    #[must_use]
    pub fn lexed(&self) -> LexedVersion {
        LexedVersion(format!(
            "{:03}{:03}{:03}",
            self.major, self.minor, self.patch
        ))
    }

    /// Decodes a nine-digit encoding produced by [`Version::lexed`].
    pub fn from_lexed(encoded: &str) -> Result<Self, RuntimeIssue> {
        if encoded.len() != LEXED_LEN || !encoded.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(encoded, "lexed form must be exactly nine digits"));
        }
        let component = |idx: usize| -> Result<u16, RuntimeIssue> {
            let start = idx * COMPONENT_WIDTH;
            encoded[start..start + COMPONENT_WIDTH]
                .parse::<u16>()
                .map_err(|_| invalid(encoded, "component is not a number"))
        };
        Ok(Self::new(component(0)?, component(1)?, component(2)?))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = RuntimeIssue;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err(invalid(input, "version is empty"));
        }
        let parts: Vec<&str> = input.split('.').collect();
        if parts.len() > MAX_COMPONENTS {
            return Err(invalid(input, "at most three components are allowed"));
        }
        let mut components = [0u16; MAX_COMPONENTS];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = parse_component(input, part)?;
        }
        Ok(Self::new(components[0], components[1], components[2]))
    }
}

fn parse_component(input: &str, part: &str) -> Result<u16, RuntimeIssue> {
    if part.is_empty() {
        return Err(invalid(input, "empty component"));
    }
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(input, "component is not a number"));
    }
    let significant = part.trim_start_matches('0');
    if significant.len() > COMPONENT_WIDTH {
        return Err(invalid(input, "component does not fit in three digits"));
    }
    if significant.is_empty() {
        return Ok(0);
    }
    significant
        .parse::<u16>()
        .map_err(|_| invalid(input, "component is not a number"))
}

fn invalid(input: &str, reason: &'static str) -> RuntimeIssue {
    RuntimeIssue::InvalidVersionFormat {
        input: input.to_string(),
        reason,
    }
}

/// Nine-digit encoding of a [`Version`]; byte order matches numeric order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LexedVersion(String);

impl LexedVersion {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LexedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lexes a dotted version string such as `3.2.1` into `003002001`.
pub fn lex_ver(input: &str) -> Result<LexedVersion, RuntimeIssue> {
    input.parse::<Version>().map(|version| version.lexed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_ver_pads_components() {
        assert_eq!(lex_ver("3.2.1").unwrap().as_str(), "003002001");
        assert_eq!(lex_ver("3").unwrap().as_str(), "003000000");
        assert_eq!(lex_ver("2.7").unwrap().as_str(), "002007000");
        assert_eq!(lex_ver("3.10").unwrap().as_str(), "003010000");
    }

    #[test]
    fn lex_ver_rejects_malformed_input() {
        for input in ["", "a.b", "3.", ".3", "3..1", "1.2.3.4", " 3.3", "+3", "3.-1", "1000"] {
            let err = lex_ver(input).expect_err(input);
            assert!(
                matches!(err, RuntimeIssue::InvalidVersionFormat { .. }),
                "unexpected error for {input:?}: {err:?}"
            );
        }
    }

    #[test]
    fn lexed_order_matches_numeric_order() {
        let versions = [
            "0", "0.0.1", "0.1", "1", "1.0.9", "1.9", "1.10", "2.7", "2.7.18", "3", "3.3",
            "3.3.0", "3.10.2", "10.0", "999.999.999",
        ];
        for left in versions {
            for right in versions {
                let l: Version = left.parse().unwrap();
                let r: Version = right.parse().unwrap();
                assert_eq!(
                    l.lexed().cmp(&r.lexed()),
                    l.cmp(&r),
                    "ordering mismatch between {left} and {right}"
                );
            }
        }
    }

    #[test]
    fn padded_input_lexes_to_the_same_encoding() {
        assert_eq!(lex_ver("003.002.001").unwrap(), lex_ver("3.2.1").unwrap());
        let encoded = lex_ver("3.6.8").unwrap();
        let decoded = Version::from_lexed(encoded.as_str()).unwrap();
        assert_eq!(decoded, Version::new(3, 6, 8));
        assert_eq!(lex_ver(&decoded.to_string()).unwrap(), encoded);
    }

    #[test]
    fn from_lexed_requires_nine_digits() {
        assert!(Version::from_lexed("00300200").is_err());
        assert!(Version::from_lexed("00300200x").is_err());
        assert!(Version::from_lexed("0030020010").is_err());
    }

    #[test]
    fn leading_zeros_are_tolerated() {
        assert_eq!("0007.0".parse::<Version>().unwrap(), Version::new(7, 0, 0));
    }
}
