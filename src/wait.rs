//! Wait errors with debugging context
//!
//! When polling gives up, the error says what was being waited on and what
//! the resource looked like on the last fetch.
//!
//! # Example
//!
//! ```ignore
//! match poll::until(conditions.pod_ready(&mut pod)).await_condition().await {
//!     Err(PollError::Timeout(err)) => {
//!         println!("Resource: {}", err.resource);
//!         println!("Last state: {}", err.last_state);
//!         println!("Elapsed: {:?}", err.elapsed);
//!     }
//!     _ => {}
//! }
//! ```

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use std::fmt;
use std::time::Duration;

/// Error context for a poll that ran out of time
#[derive(Debug, Clone)]
pub struct WaitError {
    /// Resource reference (e.g., "Pod/apps/web-0")
    pub resource: String,
    /// Description of the last observed state
    pub last_state: String,
    /// How long we waited before giving up
    pub elapsed: Duration,
    /// The timeout that was configured
    pub timeout: Duration,
}

impl WaitError {
    pub fn new(resource: impl Into<String>, timeout: Duration, elapsed: Duration) -> Self {
        Self {
            resource: resource.into(),
            last_state: "unknown".to_string(),
            elapsed,
            timeout,
        }
    }

    /// Set the last observed state
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.last_state = state.into();
        self
    }
}

impl fmt::Display for WaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Wait timeout for {}", self.resource)?;
        writeln!(f, "├─ Last state: {}", self.last_state)?;
        writeln!(f, "├─ Elapsed: {:?}", self.elapsed)?;
        write!(f, "└─ Timeout: {:?}", self.timeout)
    }
}

impl std::error::Error for WaitError {}

/// Human-readable summary of a resource's observed state
pub trait ResourceState {
    fn state_description(&self) -> String;
}

impl ResourceState for Pod {
    fn state_description(&self) -> String {
        let status = self.status.as_ref();
        let phase = status
            .and_then(|s| s.phase.as_deref())
            .unwrap_or("Unknown");

        let conditions: Vec<String> = status
            .and_then(|s| s.conditions.as_ref())
            .map(|conds| {
                conds
                    .iter()
                    .map(|c| format!("{}={}", c.type_, c.status))
                    .collect()
            })
            .unwrap_or_default();

        let waiting_reasons: Vec<&str> = status
            .and_then(|s| s.container_statuses.as_ref())
            .map(|statuses| {
                statuses
                    .iter()
                    .filter_map(|c| {
                        c.state
                            .as_ref()
                            .and_then(|s| s.waiting.as_ref())
                            .and_then(|w| w.reason.as_deref())
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut out = format!("phase={phase}");
        if !conditions.is_empty() {
            out.push_str(&format!(", conditions: {}", conditions.join(", ")));
        }
        if !waiting_reasons.is_empty() {
            out.push_str(&format!(", waiting: {}", waiting_reasons.join(", ")));
        }
        out
    }
}

impl ResourceState for Job {
    fn state_description(&self) -> String {
        let status = self.status.as_ref();
        let active = status.and_then(|s| s.active).unwrap_or(0);
        let succeeded = status.and_then(|s| s.succeeded).unwrap_or(0);
        let failed = status.and_then(|s| s.failed).unwrap_or(0);

        let conditions: Vec<String> = status
            .and_then(|s| s.conditions.as_ref())
            .map(|conds| {
                conds
                    .iter()
                    .map(|c| format!("{}={}", c.type_, c.status))
                    .collect()
            })
            .unwrap_or_default();

        if conditions.is_empty() {
            format!("{active} active, {succeeded} succeeded, {failed} failed")
        } else {
            format!(
                "{active} active, {succeeded} succeeded, {failed} failed, conditions: {}",
                conditions.join(", ")
            )
        }
    }
}

impl ResourceState for Deployment {
    fn state_description(&self) -> String {
        let spec_replicas = self.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
        let ready = self
            .status
            .as_ref()
            .and_then(|s| s.ready_replicas)
            .unwrap_or(0);
        let unavailable = self
            .status
            .as_ref()
            .and_then(|s| s.unavailable_replicas)
            .unwrap_or(0);

        let conditions: Vec<String> = self
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .map(|conds| {
                conds
                    .iter()
                    .map(|c| format!("{}={}", c.type_, c.status))
                    .collect()
            })
            .unwrap_or_default();

        let mut out = format!("{ready}/{spec_replicas} ready");
        if unavailable > 0 {
            out.push_str(&format!(", {unavailable} unavailable"));
        }
        if !conditions.is_empty() {
            out.push_str(&format!(", conditions: {}", conditions.join(", ")));
        }
        out
    }
}
