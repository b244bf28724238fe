//! # Manifest
//!
//! The ordered set of desired resources for one component version.
//!
//! Manifests are loaded once at startup from a YAML file or a directory of
//! YAML/JSON files and are read-only afterwards. Directory entries are read in
//! lexical path order so that resource order is stable across restarts.

mod resource;

pub use resource::{Resource, ResourceKey};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk manifest directory {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to parse manifest document {index} in {origin}: {source}")]
    Parse {
        origin: String,
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("manifest document {index} in {origin} is missing {field}")]
    MissingField {
        origin: String,
        index: usize,
        field: &'static str,
    },
}

/// Ordered, read-only collection of desired resources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    resources: Vec<Resource>,
}

impl Manifest {
    #[must_use]
    pub fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    /// Parse a multi-document YAML stream. Empty documents are skipped.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ManifestError> {
        let mut manifest = Self::default();
        manifest.append_yaml(yaml, "<inline>")?;
        Ok(manifest)
    }

    /// Load a manifest from a single file or from every `.yaml`, `.yml` and
    /// `.json` file below a directory
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let mut manifest = Self::default();

        if path.is_file() {
            manifest.append_file(path)?;
            return Ok(manifest);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|source| ManifestError::Walk {
                path: path.to_path_buf(),
                source,
            })?;
            if entry.file_type().is_file() && is_manifest_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        for file in &files {
            manifest.append_file(file)?;
        }

        debug!(
            "Loaded {} resources from {} manifest files under {}",
            manifest.len(),
            files.len(),
            path.display()
        );
        Ok(manifest)
    }

    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Resources of one kind, in manifest order
    #[must_use]
    pub fn filter_by_kind(&self, kind: &str) -> Vec<&Resource> {
        self.resources.iter().filter(|r| r.kind == kind).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn append_file(&mut self, path: &Path) -> Result<(), ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.append_yaml(&content, &path.display().to_string())
    }

    fn append_yaml(&mut self, yaml: &str, origin: &str) -> Result<(), ManifestError> {
        for (index, document) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
            let value = serde_yaml::Value::deserialize(document).map_err(|source| {
                ManifestError::Parse {
                    origin: origin.to_string(),
                    index,
                    source,
                }
            })?;
            if value.is_null() {
                continue;
            }

            let resource: Resource =
                serde_yaml::from_value(value).map_err(|source| ManifestError::Parse {
                    origin: origin.to_string(),
                    index,
                    source,
                })?;

            if resource.kind.is_empty() {
                return Err(ManifestError::MissingField {
                    origin: origin.to_string(),
                    index,
                    field: "kind",
                });
            }
            if resource.name().is_empty() {
                return Err(ManifestError::MissingField {
                    origin: origin.to_string(),
                    index,
                    field: "metadata.name",
                });
            }
            self.resources.push(resource);
        }
        Ok(())
    }
}

impl FromIterator<Resource> for Manifest {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn is_manifest_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e, "yaml" | "yml" | "json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r"
apiVersion: v1
kind: Namespace
metadata:
  name: ns
  labels:
    app.kubernetes.io/part-of: pipeline
---
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
  namespace: ns
data:
  key: value
";

    #[test]
    fn test_from_yaml_str_skips_empty_documents() {
        let manifest = Manifest::from_yaml_str(MANIFEST).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.resources()[0].kind, "Namespace");
        assert_eq!(manifest.resources()[1].name(), "settings");
    }

    #[test]
    fn test_filter_by_kind() {
        let manifest = Manifest::from_yaml_str(MANIFEST).unwrap();
        let namespaces = manifest.filter_by_kind("Namespace");
        assert_eq!(namespaces.len(), 1);
        assert_eq!(
            namespaces[0].labels().get("app.kubernetes.io/part-of"),
            Some(&"pipeline".to_string())
        );
        assert!(manifest.filter_by_kind("Deployment").is_empty());
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let err = Manifest::from_yaml_str("apiVersion: v1\nkind: ConfigMap\nmetadata: {}\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::MissingField {
                field: "metadata.name",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        let err = Manifest::from_yaml_str("kind: [unterminated").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { index: 0, .. }));
    }
}
