//! # ComponentInstall Spec
//!
//! Main CRD specification types and defaulting.

use crate::config::Platform;
use crate::constants::{
    DEFAULT_ENABLE_API_FIELDS, DEFAULT_OPENSHIFT_SERVICE_ACCOUNT, DEFAULT_TARGET_NAMESPACE,
};
use serde::{Deserialize, Serialize};

/// ComponentInstall Custom Resource Definition
///
/// A cluster administrator creates one `ComponentInstall` to request that the
/// controller installs the managed component and keeps it converged.
///
/// # Example
///
/// ```yaml
/// apiVersion: operator.installer.dev/v1alpha1
/// kind: ComponentInstall
/// metadata:
///   name: pipeline
/// spec:
///   targetNamespace: installer-pipelines
///   properties:
///     enableApiFields: beta
/// ```
#[derive(
    kube::CustomResource,
    Debug,
    Clone,
    Default,
    PartialEq,
    Deserialize,
    Serialize,
    schemars::JsonSchema,
)]
#[kube(
    kind = "ComponentInstall",
    group = "operator.installer.dev",
    version = "v1alpha1",
    status = "crate::crd::ComponentInstallStatus",
    shortname = "ci",
    printcolumn = r#"{"name":"Version", "type":"string", "jsonPath":".status.version"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Reason", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].message"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInstallSpec {
    /// Namespace the component's namespaced resources are installed into
    /// Default: "installer-pipelines"
    #[serde(default)]
    pub target_namespace: String,
    /// Component runtime properties
    #[serde(default)]
    pub properties: ComponentProperties,
}

/// Component runtime properties
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentProperties {
    /// Which API feature gate level the component enables ("stable", "beta", "alpha")
    #[serde(default)]
    pub enable_api_fields: String,
    /// Service account used by workloads that do not name one
    /// Defaulted on OpenShift only
    #[serde(default)]
    pub default_service_account: String,
}

impl ComponentInstallSpec {
    /// Fill empty optional fields with static defaults
    pub fn set_defaults(&mut self, platform: Platform) {
        if self.target_namespace.is_empty() {
            self.target_namespace = DEFAULT_TARGET_NAMESPACE.to_string();
        }
        self.properties.set_defaults(platform);
    }
}

impl ComponentProperties {
    fn set_defaults(&mut self, platform: Platform) {
        if self.enable_api_fields.is_empty() {
            self.enable_api_fields = DEFAULT_ENABLE_API_FIELDS.to_string();
        }

        if platform == Platform::OpenShift && self.default_service_account.is_empty() {
            self.default_service_account = DEFAULT_OPENSHIFT_SERVICE_ACCOUNT.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_empty_fields() {
        let mut spec = ComponentInstallSpec::default();
        spec.set_defaults(Platform::Kubernetes);
        assert_eq!(spec.target_namespace, "installer-pipelines");
        assert_eq!(spec.properties.enable_api_fields, "beta");
        assert_eq!(spec.properties.default_service_account, "");
    }

    #[test]
    fn test_defaults_keep_explicit_values() {
        let mut spec = ComponentInstallSpec {
            target_namespace: "ci-system".to_string(),
            properties: ComponentProperties {
                enable_api_fields: "alpha".to_string(),
                default_service_account: "builder".to_string(),
            },
        };
        spec.set_defaults(Platform::OpenShift);
        assert_eq!(spec.target_namespace, "ci-system");
        assert_eq!(spec.properties.enable_api_fields, "alpha");
        assert_eq!(spec.properties.default_service_account, "builder");
    }

    #[test]
    fn test_openshift_defaults_service_account() {
        let mut spec = ComponentInstallSpec::default();
        spec.set_defaults(Platform::OpenShift);
        assert_eq!(spec.properties.default_service_account, "pipeline");
    }
}
