//! Inventory of locally downloaded package archives.
//!
//! The download directory is the ground truth for what the public mirror
//! can serve: a reference is only rewritten when the exact package and
//! version (or a version satisfying its requirement) has actually been
//! downloaded as an archive.

use anyhow::Result;
use log::debug;
use semver::Version;
use std::collections::HashMap;
use std::path::Path;

use crate::error::RewriteError;
use crate::runtime::Runtime;

/// File extension of downloaded package archives.
pub const ARCHIVE_EXTENSION: &str = "crate";

/// Mapping from package name to every downloaded version of it.
///
/// Built once at startup by scanning the download directory; read-only
/// afterwards. Versions keep directory listing order and are not deduped,
/// membership tests only ever ask "is some version in here".
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Inventory {
    packages: HashMap<String, Vec<Version>>,
}

impl Inventory {
    /// Scan `dir` for `<name>@<version>.crate` files and accumulate them.
    ///
    /// An archive whose version does not parse as a semantic version aborts
    /// the scan: an unparsable cached artifact means the download cache is
    /// corrupted and nothing should be rewritten against it.
    #[tracing::instrument(skip(runtime, dir))]
    pub fn scan<R: Runtime>(runtime: &R, dir: &Path) -> Result<Self> {
        let mut packages: HashMap<String, Vec<Version>> = HashMap::new();

        for path in runtime.read_dir(dir)? {
            if path.extension().and_then(|e| e.to_str()) != Some(ARCHIVE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // Archives without a version marker are not name@version
            // artifacts and do not participate in availability checks.
            let Some((name, version)) = stem.rsplit_once('@') else {
                debug!("skipping archive without version marker: {}", path.display());
                continue;
            };
            let version = Version::parse(version)
                .map_err(|e| RewriteError::malformed_version(version, e))?;
            packages.entry(name.to_string()).or_default().push(version);
        }

        debug!("inventoried {} package name(s)", packages.len());
        Ok(Inventory { packages })
    }

    /// All downloaded versions of `name`, or `None` if no archive of that
    /// package exists.
    pub fn versions(&self, name: &str) -> Option<&[Version]> {
        self.packages.get(name).map(|v| v.as_slice())
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        let mut packages: HashMap<String, Vec<Version>> = HashMap::new();
        for (name, versions) in pairs {
            let parsed = versions.iter().map(|v| Version::parse(v).unwrap()).collect();
            packages.insert(name.to_string(), parsed);
        }
        Inventory { packages }
    }
}
