//! Error types for the registry rewrite.

/// Errors that can abort a rewrite run.
///
/// All of these are fatal: the run stops at the first one and nothing is
/// written back to disk.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// Package absent from the download inventory entirely.
    #[error("can not find '{name}' in the download inventory")]
    MissingPackage { name: String },

    /// Package known, but the exact version is not cached.
    #[error("can not find '{name}@{version}' in the download inventory")]
    MissingVersion { name: String, version: String },

    /// Package known, but no cached version satisfies the requirement.
    #[error("no downloaded version of '{name}' satisfies '{requirement}'")]
    UnsatisfiedConstraint { name: String, requirement: String },

    /// A version or requirement string does not parse.
    #[error("malformed version '{input}': {detail}")]
    MalformedVersion { input: String, detail: String },

    /// A qualified reference does not match `registry#name@version`.
    #[error("malformed package reference '{reference}': expected 'registry#name@version'")]
    MalformedReference { reference: String },
}

impl RewriteError {
    pub(crate) fn malformed_version(input: &str, detail: impl ToString) -> Self {
        RewriteError::MalformedVersion {
            input: input.to_string(),
            detail: detail.to_string(),
        }
    }
}

/// Result type alias for rewrite operations.
pub type Result<T> = std::result::Result<T, RewriteError>;
