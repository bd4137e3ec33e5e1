//! Translation of caret/tilde version requirements into range expressions.
//!
//! Dependency requirements in the metadata document use cargo-style
//! shorthand (`^1.2.3`, `~1.2.3`, or a bare pin). Availability checks need
//! an explicit range, so the shorthand is translated to
//! `>=lower,<upper` with the lower bound inclusive and the upper bound
//! exclusive.

use semver::Version;

use crate::error::{Result, RewriteError};

/// Translate a requirement into an equivalent `>=X.Y.Z,<A.B.C` range.
///
/// Caret (and bare) requirements allow the same major version, or the same
/// minor version when the major is 0. Tilde requirements allow the same
/// minor version regardless of major.
///
/// Only exact three-component versions are supported; anything else
/// (missing components, pre-release, build metadata) is rejected rather
/// than guessed at.
pub fn translate(requirement: &str) -> Result<String> {
    let (base, tilde) = if let Some(rest) = requirement.strip_prefix('^') {
        (rest, false)
    } else if let Some(rest) = requirement.strip_prefix('~') {
        (rest, true)
    } else {
        (requirement, false)
    };

    let version = parse_plain_version(base)?;
    let upper = if tilde || version.major == 0 {
        Version::new(version.major, version.minor + 1, 0)
    } else {
        Version::new(version.major + 1, 0, 0)
    };

    Ok(format!(">={version},<{upper}"))
}

/// Parse `MAJOR.MINOR.PATCH` with no pre-release or build suffix.
fn parse_plain_version(input: &str) -> Result<Version> {
    let version =
        Version::parse(input).map_err(|e| RewriteError::malformed_version(input, e))?;
    if !version.pre.is_empty() || !version.build.is_empty() {
        return Err(RewriteError::malformed_version(
            input,
            "pre-release and build metadata are not supported in requirements",
        ));
    }
    Ok(version)
}
