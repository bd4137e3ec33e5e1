//! Registry identities, reference parsing, and the private→public rewrite.

use semver::{Version, VersionReq};
use std::str::FromStr;

use crate::error::{Result, RewriteError};
use crate::inventory::Inventory;

/// Default private registry index, as used by the build pipeline.
pub const DEFAULT_PRIVATE_REGISTRY: &str =
    "sparse+https://rust.gitlab-pages.protontech.ch/shared/registry/index/";

/// Default public mirror index.
pub const DEFAULT_PUBLIC_REGISTRY: &str =
    "sparse+https://rust.gitlab-pages.protontech.ch/shared/public-registry/index/";

/// The registry pair a rewrite run operates on.
///
/// Matching is exact string equality against `private`; nothing else is
/// ever rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct Registries {
    pub private: String,
    pub public: String,
}

/// A fully qualified package reference.
///
/// Format: `registry#name@version`, split at the first `#` and the last
/// `@` (package names may not contain `#`, registry URLs may not contain
/// `@` after the `#`).
#[derive(Debug, Clone, PartialEq)]
pub struct PackageRef {
    pub registry: String,
    pub name: String,
    pub version: String,
}

impl std::fmt::Display for PackageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}@{}", self.registry, self.name, self.version)
    }
}

impl FromStr for PackageRef {
    type Err = RewriteError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || RewriteError::MalformedReference {
            reference: s.to_string(),
        };

        let (registry, name_version) = s.split_once('#').ok_or_else(malformed)?;
        let (name, version) = name_version.rsplit_once('@').ok_or_else(malformed)?;
        if registry.is_empty() || name.is_empty() || version.is_empty() {
            return Err(malformed());
        }

        Ok(PackageRef {
            registry: registry.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        })
    }
}

/// Decides whether references may be redirected to the public mirror.
///
/// Holds the registry pair and the archive inventory; the inventory is the
/// sole gate preventing a rewrite to a registry that cannot actually serve
/// the resolved version.
pub struct Resolver<'a> {
    registries: &'a Registries,
    inventory: &'a Inventory,
}

impl<'a> Resolver<'a> {
    pub fn new(registries: &'a Registries, inventory: &'a Inventory) -> Self {
        Resolver {
            registries,
            inventory,
        }
    }

    pub fn is_private(&self, url: &str) -> bool {
        url == self.registries.private
    }

    pub fn public_url(&self) -> &str {
        &self.registries.public
    }

    /// Rewrite a qualified reference to the public mirror, if it points at
    /// the private registry.
    ///
    /// References qualified by any other registry are returned unchanged.
    /// Private references are only rewritten after the exact name@version
    /// is confirmed present in the inventory.
    pub fn rewrite_if_private(&self, reference: &str) -> Result<String> {
        let mut parsed: PackageRef = reference.parse()?;
        if !self.is_private(&parsed.registry) {
            return Ok(reference.to_string());
        }

        self.assert_exact(&parsed.name, &parsed.version)?;
        parsed.registry = self.registries.public.clone();
        Ok(parsed.to_string())
    }

    /// Assert that the exact `name@version` has been downloaded.
    pub fn assert_exact(&self, name: &str, version: &str) -> Result<()> {
        let versions = self.versions_of(name)?;
        let version_parsed =
            Version::parse(version).map_err(|e| RewriteError::malformed_version(version, e))?;
        if !versions.contains(&version_parsed) {
            return Err(RewriteError::MissingVersion {
                name: name.to_string(),
                version: version.to_string(),
            });
        }
        Ok(())
    }

    /// Assert that at least one downloaded version of `name` satisfies the
    /// translated range `requirement` (e.g. `>=1.2.3,<2.0.0`).
    pub fn assert_compatible(&self, name: &str, requirement: &str) -> Result<()> {
        let versions = self.versions_of(name)?;
        let req = VersionReq::parse(requirement)
            .map_err(|e| RewriteError::malformed_version(requirement, e))?;
        if !versions.iter().any(|v| req.matches(v)) {
            return Err(RewriteError::UnsatisfiedConstraint {
                name: name.to_string(),
                requirement: requirement.to_string(),
            });
        }
        Ok(())
    }

    fn versions_of(&self, name: &str) -> Result<&'a [Version]> {
        self.inventory
            .versions(name)
            .ok_or_else(|| RewriteError::MissingPackage {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_registries() -> Registries {
        Registries {
            private: "sparse+https://private.example/index/".to_string(),
            public: "sparse+https://public.example/index/".to_string(),
        }
    }

    fn test_inventory() -> Inventory {
        Inventory::from_pairs(&[("foo", &["1.2.3", "1.9.0"]), ("bar", &["0.4.1"])])
    }

    #[test]
    fn test_parse_package_ref() {
        let r: PackageRef = "sparse+https://private.example/index/#foo@1.2.3"
            .parse()
            .unwrap();
        assert_eq!(r.registry, "sparse+https://private.example/index/");
        assert_eq!(r.name, "foo");
        assert_eq!(r.version, "1.2.3");
    }

    #[test]
    fn test_parse_package_ref_display_round_trip() {
        let input = "sparse+https://private.example/index/#foo@1.2.3";
        let r: PackageRef = input.parse().unwrap();
        assert_eq!(r.to_string(), input);
    }

    #[test]
    fn test_parse_package_ref_malformed() {
        assert!("foo@1.2.3".parse::<PackageRef>().is_err());
        assert!("registry#foo".parse::<PackageRef>().is_err());
        assert!("#foo@1.2.3".parse::<PackageRef>().is_err());
        assert!("registry#@1.2.3".parse::<PackageRef>().is_err());
        assert!("registry#foo@".parse::<PackageRef>().is_err());
    }

    #[test]
    fn test_rewrite_private_reference() {
        let registries = test_registries();
        let inventory = test_inventory();
        let resolver = Resolver::new(&registries, &inventory);

        let rewritten = resolver
            .rewrite_if_private("sparse+https://private.example/index/#foo@1.2.3")
            .unwrap();
        assert_eq!(rewritten, "sparse+https://public.example/index/#foo@1.2.3");
    }

    #[test]
    fn test_rewrite_leaves_other_registries_byte_identical() {
        let registries = test_registries();
        let inventory = test_inventory();
        let resolver = Resolver::new(&registries, &inventory);

        let reference = "sparse+https://other.example/index/#foo@9.9.9";
        assert_eq!(
            resolver.rewrite_if_private(reference).unwrap(),
            reference.to_string()
        );
    }

    #[test]
    fn test_rewrite_fails_for_undownloaded_version() {
        let registries = test_registries();
        let inventory = test_inventory();
        let resolver = Resolver::new(&registries, &inventory);

        let err = resolver
            .rewrite_if_private("sparse+https://private.example/index/#foo@1.3.0")
            .unwrap_err();
        assert!(matches!(err, RewriteError::MissingVersion { .. }));
    }

    #[test]
    fn test_assert_exact_hit_and_miss() {
        let registries = test_registries();
        let inventory = test_inventory();
        let resolver = Resolver::new(&registries, &inventory);

        assert!(resolver.assert_exact("foo", "1.2.3").is_ok());
        assert!(matches!(
            resolver.assert_exact("foo", "1.3.0").unwrap_err(),
            RewriteError::MissingVersion { .. }
        ));
        assert!(matches!(
            resolver.assert_exact("baz", "1.0.0").unwrap_err(),
            RewriteError::MissingPackage { .. }
        ));
    }

    #[test]
    fn test_assert_compatible_range_membership() {
        let registries = test_registries();
        let inventory = test_inventory();
        let resolver = Resolver::new(&registries, &inventory);

        assert!(resolver.assert_compatible("foo", ">=1.2.3,<2.0.0").is_ok());
        assert!(matches!(
            resolver
                .assert_compatible("foo", ">=2.0.0,<3.0.0")
                .unwrap_err(),
            RewriteError::UnsatisfiedConstraint { .. }
        ));
        assert!(matches!(
            resolver
                .assert_compatible("baz", ">=1.0.0,<2.0.0")
                .unwrap_err(),
            RewriteError::MissingPackage { .. }
        ));
    }

    #[test]
    fn test_error_messages_name_the_offender() {
        let registries = test_registries();
        let inventory = test_inventory();
        let resolver = Resolver::new(&registries, &inventory);

        let err = resolver.assert_compatible("foo", ">=2.0.0,<3.0.0").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("foo"));
        assert!(message.contains(">=2.0.0,<3.0.0"));
    }
}
