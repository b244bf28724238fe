//! # Resource Envelope
//!
//! A manifest resource as a typed envelope: type information, object
//! metadata, and an opaque payload holding everything else (`spec`, `data`,
//! `rules`, `status`, ...). Structural conversion into concrete Kubernetes
//! types happens only at the fingerprint and typed-view boundaries.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One Kubernetes object, desired (from the manifest) or live (from the cluster)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Remaining top-level fields of the object
    #[serde(flatten)]
    pub data: serde_json::Value,
}

fn empty_payload() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Resource {
    pub fn new(api_version: &str, kind: &str, namespace: Option<&str>, name: &str) -> Self {
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: namespace.map(ToString::to_string),
                ..ObjectMeta::default()
            },
            data: empty_payload(),
        }
    }

    /// Attach a payload field, e.g. `spec`
    #[must_use]
    pub fn with_field(mut self, key: &str, value: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = &mut self.data {
            map.insert(key.to_string(), value);
        }
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.metadata.namespace.as_deref()
    }

    #[must_use]
    pub fn key(&self) -> ResourceKey {
        ResourceKey {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            namespace: self.metadata.namespace.clone(),
            name: self.name().to_string(),
        }
    }

    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(key))
            .map(String::as_str)
    }

    pub fn set_annotation(&mut self, key: &str, value: &str) {
        self.metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
    }

    /// Remove an annotation, dropping the annotation map when it becomes empty
    pub fn remove_annotation(&mut self, key: &str) {
        if let Some(annotations) = self.metadata.annotations.as_mut() {
            annotations.remove(key);
            if annotations.is_empty() {
                self.metadata.annotations = None;
            }
        }
    }

    #[must_use]
    pub fn labels(&self) -> BTreeMap<String, String> {
        self.metadata.labels.clone().unwrap_or_default()
    }

    /// Convert into a concrete Kubernetes type such as `Deployment`
    pub fn to_typed<K: DeserializeOwned>(&self) -> Result<K, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(self)?)
    }

    /// Build an envelope back from a concrete Kubernetes type
    pub fn from_typed<K: Serialize>(object: &K) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(object)?)
    }
}

/// Resource identity. Two keys are equal when kind, namespace and name match;
/// `api_version` only tells the cluster client which API group to talk to.
#[derive(Debug, Clone, Eq)]
pub struct ResourceKey {
    pub api_version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl PartialEq for ResourceKey {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.namespace == other.namespace && self.name == other.name
    }
}

impl std::hash::Hash for ResourceKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.namespace.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}: {}/{}", self.kind, ns, self.name),
            None => write!(f, "{}: {}", self.kind, self.name),
        }
    }
}
