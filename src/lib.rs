//! kube-conditions - polling conditions for Kubernetes end-to-end tests
//!
//! A [`Conditions`] builder hands out predicates that re-fetch a resource
//! and report whether it reached the awaited state: Ready, Running,
//! Completed, Deleted, Scaled. [`poll::until`] drives a predicate until it
//! holds.
//!
//! # Example
//!
//! ```no_run
//! use k8s_openapi::api::core::v1::Pod;
//! use kube::api::ObjectMeta;
//! use kube_conditions::{poll, Conditions, KubeResources};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resources = KubeResources::try_default().await?;
//!     let conditions = Conditions::new(&resources).with_verbose_log();
//!
//!     let mut pod = Pod {
//!         metadata: ObjectMeta {
//!             name: Some("web-0".to_string()),
//!             ..Default::default()
//!         },
//!         ..Default::default()
//!     };
//!
//!     poll::until(conditions.pod_ready(&mut pod))
//!         .timeout(Duration::from_secs(60))
//!         .immediate(true)
//!         .await_condition()
//!         .await?;
//!
//!     println!("phase: {:?}", pod.status.and_then(|s| s.phase));
//!     Ok(())
//! }
//! ```

pub mod conditions;
pub mod fake;
pub mod poll;
pub mod resources;
pub mod telemetry;
pub mod wait;

// Re-export commonly used types
pub use conditions::{
    Condition, ConditionError, ConditionStatus, Conditions, FetchPolicy, PodPhase, Predicate,
};
pub use fake::FakeResources;
pub use poll::{Poll, PollError};
pub use resources::{FetchError, KubeResources, Object, ResourceAccessor};
pub use wait::{ResourceState, WaitError};
