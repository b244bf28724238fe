//! # Resource Classification
//!
//! Partition of a manifest into the four ordered install phases.
//!
//! The scope of a kind is looked up in a data table rather than matched in
//! code, so platforms with extra cluster-scoped kinds can extend it through
//! configuration. `ClusterRoleBinding` is absent from the default table: it
//! installs with the namespaced resources, after the service accounts it
//! refers to.

use crate::manifest::{Manifest, Resource};
use std::collections::HashMap;
use std::fmt;

/// Install phase. Declaration order is install order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Crd,
    ClusterScoped,
    NamespaceScoped,
    Workload,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Crd,
        Phase::ClusterScoped,
        Phase::NamespaceScoped,
        Phase::Workload,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Crd => "crd",
            Phase::ClusterScoped => "cluster-scoped",
            Phase::NamespaceScoped => "namespace-scoped",
            Phase::Workload => "workload",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const CRD_KIND: &str = "customresourcedefinition";
const WORKLOAD_KIND: &str = "Deployment";

const DEFAULT_CLUSTER_SCOPED_KINDS: &[&str] = &[
    "componentstatus",
    "namespace",
    "node",
    "persistentvolume",
    "mutatingwebhookconfiguration",
    "validatingwebhookconfiguration",
    "customresourcedefinition",
    "apiservice",
    "meshpolicy",
    "tokenreview",
    "selfsubjectaccessreview",
    "selfsubjectrulesreview",
    "subjectaccessreview",
    "certificatesigningrequest",
    "podsecuritypolicy",
    "clusterrole",
    "priorityclass",
    "storageclass",
    "volumeattachment",
];

/// Lower-cased kind to phase lookup for the scope-based phases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationTable {
    kinds: HashMap<String, Phase>,
}

impl Default for ClassificationTable {
    fn default() -> Self {
        Self {
            kinds: DEFAULT_CLUSTER_SCOPED_KINDS
                .iter()
                .map(|k| ((*k).to_string(), Phase::ClusterScoped))
                .collect(),
        }
    }
}

impl ClassificationTable {
    /// Treat `kinds` as cluster scoped
    #[must_use]
    pub fn with_cluster_scoped(self, kinds: &[String]) -> Self {
        self.with_phase(kinds, Phase::ClusterScoped)
    }

    /// Treat `kinds` as namespace scoped, overriding the defaults
    #[must_use]
    pub fn with_namespace_scoped(self, kinds: &[String]) -> Self {
        self.with_phase(kinds, Phase::NamespaceScoped)
    }

    fn with_phase(mut self, kinds: &[String], phase: Phase) -> Self {
        for kind in kinds {
            let kind = kind.trim().to_lowercase();
            if kind.is_empty() || kind == CRD_KIND {
                continue;
            }
            self.kinds.insert(kind, phase);
        }
        self
    }

    /// Phase of a resource kind. CRDs and `Deployment` are fixed; everything
    /// the table does not mark cluster scoped is namespace scoped.
    #[must_use]
    pub fn phase_of(&self, kind: &str) -> Phase {
        if kind.eq_ignore_ascii_case(CRD_KIND) {
            return Phase::Crd;
        }
        if kind == WORKLOAD_KIND {
            return Phase::Workload;
        }
        match self.kinds.get(&kind.to_lowercase()) {
            Some(Phase::ClusterScoped) => Phase::ClusterScoped,
            _ => Phase::NamespaceScoped,
        }
    }
}

/// A manifest split by phase, each group in manifest order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedResources {
    pub crds: Vec<Resource>,
    pub cluster_scoped: Vec<Resource>,
    pub namespace_scoped: Vec<Resource>,
    pub workloads: Vec<Resource>,
}

impl ClassifiedResources {
    #[must_use]
    pub fn phase(&self, phase: Phase) -> &[Resource] {
        match phase {
            Phase::Crd => &self.crds,
            Phase::ClusterScoped => &self.cluster_scoped,
            Phase::NamespaceScoped => &self.namespace_scoped,
            Phase::Workload => &self.workloads,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        Phase::ALL.iter().map(|p| self.phase(*p).len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition every manifest resource into exactly one phase
#[must_use]
pub fn classify(manifest: &Manifest, table: &ClassificationTable) -> ClassifiedResources {
    let mut classified = ClassifiedResources::default();
    for resource in manifest.resources() {
        let group = match table.phase_of(&resource.kind) {
            Phase::Crd => &mut classified.crds,
            Phase::ClusterScoped => &mut classified.cluster_scoped,
            Phase::NamespaceScoped => &mut classified.namespace_scoped,
            Phase::Workload => &mut classified.workloads,
        };
        group.push(resource.clone());
    }
    classified
}
