//! The rewrite pipeline.
//!
//! Builds the inventory once, loads the metadata document, runs the
//! traversal passes, and only then (and only outside check-only mode)
//! writes the document back in a single commit. Any failed availability
//! check aborts before anything reaches disk.

use anyhow::{Result, anyhow};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::inventory::Inventory;
use crate::metadata::MetadataDocument;
use crate::registry::{Registries, Resolver};
use crate::requirement;
use crate::runtime::Runtime;

/// The `<name>-<version>` token naming which metadata file to process.
///
/// Split at the last `-` so dashed package names work
/// (e.g. "muon-impl-0.13.1" is muon-impl at 0.13.1).
#[derive(Debug, Clone, PartialEq)]
pub struct PackageSpec {
    pub name: String,
    pub version: String,
}

impl FromStr for PackageSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, version) = s
            .rsplit_once('-')
            .ok_or_else(|| anyhow!("Invalid package '{s}': expected '<name>-<version>'"))?;
        if name.is_empty() || version.is_empty() {
            return Err(anyhow!("Invalid package '{s}': expected '<name>-<version>'"));
        }
        Ok(PackageSpec {
            name: name.to_string(),
            version: version.to_string(),
        })
    }
}

impl PackageSpec {
    /// Path of the metadata document for this package under `downloads`.
    pub fn metadata_path(&self, downloads: &Path) -> PathBuf {
        downloads.join(format!("{}@{}.json", self.name, self.version))
    }
}

/// Run the full pipeline for one package.
#[tracing::instrument(skip(runtime, downloads, registries))]
pub fn run<R: Runtime>(
    runtime: &R,
    name_version: &str,
    downloads: &Path,
    registries: &Registries,
    check_only: bool,
) -> Result<()> {
    let spec: PackageSpec = name_version.parse()?;
    let metadata_path = spec.metadata_path(downloads);
    debug!("processing {}", metadata_path.display());

    if !runtime.exists(&metadata_path) {
        return Err(anyhow!(
            "no metadata document at {}; was '{}' downloaded?",
            metadata_path.display(),
            name_version
        ));
    }

    let inventory = Inventory::scan(runtime, downloads)?;
    let mut document = MetadataDocument::load(runtime, &metadata_path)?;

    let resolver = Resolver::new(registries, &inventory);
    rewrite_packages(&mut document, &resolver)?;
    rewrite_dependencies(&mut document, &resolver)?;
    rewrite_resolve_graph(&mut document, &resolver)?;

    if check_only {
        info!(
            "all registry references in {} are rewritable; not writing (check-only)",
            metadata_path.display()
        );
    } else {
        document.save(runtime, &metadata_path)?;
        info!("rewrote {}", metadata_path.display());
    }
    Ok(())
}

/// Pass 1: package `id` and `source` fields.
///
/// The `source` replacement does not re-check availability: the `id`
/// rewrite just above parsed and asserted the same name@version.
fn rewrite_packages(document: &mut MetadataDocument, resolver: &Resolver) -> Result<()> {
    for package in &mut document.packages {
        package.id = resolver.rewrite_if_private(&package.id)?;

        if package.source.as_deref().is_some_and(|s| resolver.is_private(s)) {
            package.source = Some(resolver.public_url().to_string());
        }
    }
    Ok(())
}

/// Pass 2: per-dependency `registry` and `source` fields.
///
/// Each field is checked and rewritten on its own; a dependency may carry
/// only one of the two from the private registry. `req` is translated for
/// the availability check but never modified in place.
fn rewrite_dependencies(document: &mut MetadataDocument, resolver: &Resolver) -> Result<()> {
    for package in &mut document.packages {
        for dependency in &mut package.dependencies {
            let registry_private = dependency
                .registry
                .as_deref()
                .is_some_and(|u| resolver.is_private(u));
            let source_private = dependency
                .source
                .as_deref()
                .is_some_and(|u| resolver.is_private(u));
            if !registry_private && !source_private {
                continue;
            }

            let translated = requirement::translate(&dependency.req)?;
            resolver.assert_compatible(&dependency.name, &translated)?;

            if registry_private {
                dependency.registry = Some(resolver.public_url().to_string());
            }
            if source_private {
                dependency.source = Some(resolver.public_url().to_string());
            }
        }
    }
    Ok(())
}

/// Pass 3: resolve-graph node ids, dependency lists, and edge `pkg` fields.
fn rewrite_resolve_graph(document: &mut MetadataDocument, resolver: &Resolver) -> Result<()> {
    for node in &mut document.resolve.nodes {
        node.id = resolver.rewrite_if_private(&node.id)?;
        for dependency in &mut node.dependencies {
            *dependency = resolver.rewrite_if_private(dependency)?;
        }
        for dep in &mut node.deps {
            dep.pkg = resolver.rewrite_if_private(&dep.pkg)?;
        }
    }
    Ok(())
}
