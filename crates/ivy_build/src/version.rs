//! Toolchain version parsing and gating.

use crate::error::BuildError;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, error};

/// A three-part numeric version, ordered major first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Patch component.
    pub patch: u32,
}

impl Version {
    /// The version reported when nothing could be parsed.
    pub const ZERO: Version = Version::new(0, 0, 0);

    /// Creates a version from its components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns true if this version is at least `minimum`.
    pub fn is_supported(self, minimum: Version) -> bool {
        self >= minimum
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Error returned when a version literal is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version '{0}', expected MAJOR.MINOR[.PATCH]")]
pub struct ParseVersionError(String);

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseVersionError(s.to_string());
        let parts = s
            .trim()
            .split('.')
            .map(|p| p.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            [major, minor] => Ok(Version::new(*major, *minor, 0)),
            [major, minor, patch] => Ok(Version::new(*major, *minor, *patch)),
            _ => Err(invalid()),
        }
    }
}

fn version_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\D+version\s+(\d+)\.(\d+)(?:\.(\d+))?").ok())
        .as_ref()
}

/// Extracts a version from free-form toolchain output such as
/// `Icarus Verilog version 11.0 (stable) ()`.
///
/// Only the first line is read. The version must be the first number on it
/// and be preceded by the word `version`. A missing patch is read as 0. Text
/// that does not match yields [`Version::ZERO`].
pub fn parse_version(raw: &str) -> Version {
    let banner = raw.lines().next().unwrap_or("");
    let Some(caps) = version_pattern().and_then(|re| re.captures(banner)) else {
        return Version::ZERO;
    };
    let part = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    Version::new(part(1), part(2), part(3))
}

/// Parses `raw` and fails unless the result is at least `minimum`.
pub fn check_version(
    toolchain: &str,
    raw: &str,
    minimum: Version,
) -> Result<Version, BuildError> {
    let detected = parse_version(raw);
    debug!(toolchain, %detected, %minimum, "detected toolchain version");
    if detected.is_supported(minimum) {
        Ok(detected)
    } else {
        error!(toolchain, %detected, %minimum, "toolchain version not supported");
        Err(BuildError::ToolchainVersion {
            toolchain: toolchain.to_string(),
            detected,
            minimum,
        })
    }
}
