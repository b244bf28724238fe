//! # ComponentInstall Status
//!
//! Status types and condition transitions for the owning `ComponentInstall`.
//!
//! Four dependent conditions track the stages of a reconcile pass. The `Ready`
//! condition is derived from them: it is `False` as soon as one dependent is
//! `False`, `True` only once every dependent is `True`, `Unknown` otherwise.

use serde::{Deserialize, Serialize};

pub const CONDITION_READY: &str = "Ready";
pub const CONDITION_PRE_RECONCILER: &str = "PreReconciler";
pub const CONDITION_INSTALLER_SET_AVAILABLE: &str = "InstallerSetAvailable";
pub const CONDITION_INSTALLER_SET_READY: &str = "InstallerSetReady";
pub const CONDITION_POST_RECONCILER: &str = "PostReconciler";

const DEPENDENT_CONDITIONS: [&str; 4] = [
    CONDITION_PRE_RECONCILER,
    CONDITION_INSTALLER_SET_AVAILABLE,
    CONDITION_INSTALLER_SET_READY,
    CONDITION_POST_RECONCILER,
];

const STATUS_TRUE: &str = "True";
const STATUS_FALSE: &str = "False";
const STATUS_UNKNOWN: &str = "Unknown";

/// Status of the ComponentInstall resource
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInstallStatus {
    /// Version of the component installed by the last pass
    #[serde(default)]
    pub version: Option<String>,
    /// Conditions represent the latest available observations
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Observed generation
    #[serde(default)]
    pub observed_generation: Option<i64>,
}

/// Condition represents a condition of a resource
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Last transition time
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Reason for the condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Message describing the condition
    #[serde(default)]
    pub message: Option<String>,
}

impl ComponentInstallStatus {
    /// Add every known condition as `Unknown` if it is not present yet
    pub fn initialize_conditions(&mut self) {
        for condition_type in DEPENDENT_CONDITIONS.iter().chain([&CONDITION_READY]) {
            if self.condition(condition_type).is_none() {
                self.conditions.push(Condition {
                    r#type: (*condition_type).to_string(),
                    status: STATUS_UNKNOWN.to_string(),
                    last_transition_time: Some(now()),
                    reason: None,
                    message: None,
                });
            }
        }
    }

    pub fn set_version(&mut self, version: &str) {
        self.version = Some(version.to_string());
    }

    #[must_use]
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == condition_type)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.condition(CONDITION_READY)
            .is_some_and(|c| c.status == STATUS_TRUE)
    }

    /// Mark the resource as not ready without touching the dependent conditions
    pub fn mark_not_ready(&mut self, message: &str) {
        self.set(CONDITION_READY, STATUS_FALSE, Some("Error"), Some(message));
    }

    pub fn mark_pre_reconciler_complete(&mut self) {
        self.set_dependent(CONDITION_PRE_RECONCILER, STATUS_TRUE, None, None);
    }

    pub fn mark_pre_reconciler_failed(&mut self, message: &str) {
        self.set_dependent(
            CONDITION_PRE_RECONCILER,
            STATUS_FALSE,
            Some("Error"),
            Some(message),
        );
    }

    pub fn mark_installer_set_available(&mut self) {
        self.set_dependent(CONDITION_INSTALLER_SET_AVAILABLE, STATUS_TRUE, None, None);
    }

    pub fn mark_installer_set_not_available(&mut self, message: &str) {
        self.set_dependent(
            CONDITION_INSTALLER_SET_AVAILABLE,
            STATUS_FALSE,
            Some("Error"),
            Some(message),
        );
    }

    pub fn mark_installer_set_ready(&mut self) {
        self.set_dependent(CONDITION_INSTALLER_SET_READY, STATUS_TRUE, None, None);
    }

    pub fn mark_installer_set_not_ready(&mut self, message: &str) {
        self.set_dependent(
            CONDITION_INSTALLER_SET_READY,
            STATUS_FALSE,
            Some("Error"),
            Some(message),
        );
    }

    pub fn mark_post_reconciler_complete(&mut self) {
        self.set_dependent(CONDITION_POST_RECONCILER, STATUS_TRUE, None, None);
    }

    pub fn mark_post_reconciler_failed(&mut self, message: &str) {
        self.set_dependent(
            CONDITION_POST_RECONCILER,
            STATUS_FALSE,
            Some("Error"),
            Some(message),
        );
    }

    fn set_dependent(
        &mut self,
        condition_type: &str,
        status: &str,
        reason: Option<&str>,
        message: Option<&str>,
    ) {
        self.set(condition_type, status, reason, message);
        self.recompute_ready();
    }

    fn recompute_ready(&mut self) {
        let failed = DEPENDENT_CONDITIONS
            .iter()
            .filter_map(|t| self.condition(t))
            .find(|c| c.status == STATUS_FALSE)
            .map(|c| (c.reason.clone(), c.message.clone()));

        if let Some((reason, message)) = failed {
            self.set(
                CONDITION_READY,
                STATUS_FALSE,
                reason.as_deref(),
                message.as_deref(),
            );
            return;
        }

        let all_true = DEPENDENT_CONDITIONS.iter().all(|t| {
            self.condition(t)
                .is_some_and(|c| c.status == STATUS_TRUE)
        });
        if all_true {
            self.set(CONDITION_READY, STATUS_TRUE, None, None);
        } else {
            self.set(CONDITION_READY, STATUS_UNKNOWN, None, None);
        }
    }

    /// Set a condition, keeping the transition time when the status does not change
    fn set(
        &mut self,
        condition_type: &str,
        status: &str,
        reason: Option<&str>,
        message: Option<&str>,
    ) {
        let reason = reason.map(ToString::to_string);
        let message = message.map(ToString::to_string);

        if let Some(existing) = self
            .conditions
            .iter_mut()
            .find(|c| c.r#type == condition_type)
        {
            if existing.status != status {
                existing.status = status.to_string();
                existing.last_transition_time = Some(now());
            }
            existing.reason = reason;
            existing.message = message;
            return;
        }

        self.conditions.push(Condition {
            r#type: condition_type.to_string(),
            status: status.to_string(),
            last_transition_time: Some(now()),
            reason,
            message,
        });
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
