//! Serde model of the dependency-lock metadata document.
//!
//! Only the registry-related fields are typed; every struct carries a
//! flattened map so that fields this tool does not touch survive a
//! load/save round trip untouched.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::runtime::Runtime;

/// The full metadata document: resolved package list plus resolve graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MetadataDocument {
    pub packages: Vec<Package>,
    pub resolve: Resolve,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One resolved package entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Package {
    pub id: String,
    pub source: Option<String>,
    pub dependencies: Vec<Dependency>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One declared dependency of a package.
///
/// `registry` and `source` are independent: either one may point at the
/// private registry on its own. `req` is only ever read, never rewritten.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Dependency {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub req: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The resolve graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Resolve {
    pub nodes: Vec<Node>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One node of the resolve graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub dependencies: Vec<String>,
    pub deps: Vec<NodeDep>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One edge of the resolve graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeDep {
    pub pkg: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MetadataDocument {
    #[tracing::instrument(skip(runtime, path))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        let document: MetadataDocument = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse metadata document {}", path.display()))?;
        Ok(document)
    }

    #[tracing::instrument(skip(self, runtime, path))]
    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        let content = serde_json::to_string(self)
            .with_context(|| format!("Failed to serialize metadata document {}", path.display()))?;
        runtime.write(path, content.as_bytes())
    }
}
