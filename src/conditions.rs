//! Polling conditions for Kubernetes resources
//!
//! [`Conditions`] hands out [`Predicate`]s. Each check re-fetches the target
//! through a [`ResourceAccessor`], writes the fetched state into the
//! caller's object, and reports whether the awaited state holds.
//!
//! # Example
//!
//! ```ignore
//! use kube_conditions::{poll, Conditions, KubeResources};
//!
//! let resources = KubeResources::try_default().await?;
//! let conditions = Conditions::new(&resources).with_verbose_log();
//!
//! let mut pod = Pod { metadata: ObjectMeta { name: Some("web-0".into()), ..Default::default() }, ..Default::default() };
//! poll::until(conditions.pod_ready(&mut pod)).await_condition().await?;
//!
//! // `pod` now holds the state that satisfied the check
//! ```

use crate::resources::{FetchError, Object, ResourceAccessor};
use crate::wait::ResourceState;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use std::fmt;
use tracing::{debug, info};

/// Pod condition: all containers ready and the pod is serving
pub const POD_READY: &str = "Ready";
/// Pod condition: every container passed its readiness probe
pub const CONTAINERS_READY: &str = "ContainersReady";
/// Pod condition: the pod has been bound to a node
pub const POD_SCHEDULED: &str = "PodScheduled";
/// Job condition: the job ran to completion
pub const JOB_COMPLETE: &str = "Complete";
/// Job condition: the job exhausted its retries
pub const JOB_FAILED: &str = "Failed";
/// Deployment condition: minimum availability reached
pub const DEPLOYMENT_AVAILABLE: &str = "Available";
/// Deployment condition: rollout is making progress
pub const DEPLOYMENT_PROGRESSING: &str = "Progressing";

/// Status value of a resource condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase of a pod
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that end polling
#[derive(Debug, thiserror::Error)]
pub enum ConditionError {
    #[error("Failed to fetch resource: {0}")]
    Fetch(#[from] FetchError),

    #[error("{kind} target has no metadata.name")]
    MissingName { kind: String },
}

/// What a predicate does when the fetch fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Any fetch error ends polling
    Propagate,
    /// Any fetch error counts as "not yet"
    Tolerate,
    /// Not-found means done, other errors end polling, success means "not yet"
    AwaitAbsence,
}

/// A single-step check that a poller invokes repeatedly
#[async_trait]
pub trait Condition: Send {
    /// Fetch once and report whether the condition holds
    async fn check(&mut self) -> Result<bool, ConditionError>;

    /// Reference to the resource being checked
    fn resource(&self) -> String;

    /// Description of the state seen on the last fetch
    fn last_state(&self) -> String;
}

type Matcher<'a, K> = Box<dyn Fn(&K) -> bool + Send + Sync + 'a>;
type Describer<'a, K> = Box<dyn Fn(&K) -> String + Send + Sync + 'a>;

/// Predicate over one target object
///
/// The target is a scratch buffer owned by the caller. Every [`check`]
/// overwrites it with the freshly fetched state; nothing else is carried
/// between calls.
///
/// [`check`]: Condition::check
pub struct Predicate<'a, A, K> {
    resources: &'a A,
    verbose: bool,
    target: &'a mut K,
    description: String,
    policy: FetchPolicy,
    matcher: Matcher<'a, K>,
    describer: Describer<'a, K>,
}

impl<'a, A, K> Predicate<'a, A, K>
where
    A: ResourceAccessor,
    K: Object,
{
    /// State seen on the last fetch
    pub fn target(&self) -> &K {
        &*self.target
    }

    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }
}

#[async_trait]
impl<'a, A, K> Condition for Predicate<'a, A, K>
where
    A: ResourceAccessor,
    K: Object,
{
    async fn check(&mut self) -> Result<bool, ConditionError> {
        let kind = K::kind(&()).to_string();
        let name = self
            .target
            .meta()
            .name
            .clone()
            .ok_or_else(|| ConditionError::MissingName { kind: kind.clone() })?;
        let namespace = self.target.meta().namespace.clone().unwrap_or_default();

        if self.verbose {
            info!(
                namespace = %namespace,
                name = %name,
                kind = %kind,
                "Checking {}",
                self.description
            );
        }

        let fetched = self
            .resources
            .get_into(&name, &namespace, &mut *self.target)
            .await;

        match (fetched, self.policy) {
            (Ok(()), FetchPolicy::AwaitAbsence) => Ok(false),
            (Ok(()), _) => Ok((self.matcher)(&*self.target)),
            (Err(e), FetchPolicy::AwaitAbsence) if e.is_not_found() => Ok(true),
            (Err(e), FetchPolicy::Tolerate) => {
                debug!(
                    namespace = %namespace,
                    name = %name,
                    error = %e,
                    "Fetch failed, treating as not yet met"
                );
                Ok(false)
            }
            (Err(e), _) => Err(e.into()),
        }
    }

    fn resource(&self) -> String {
        let meta = self.target.meta();
        format!(
            "{}/{}/{}",
            K::kind(&()),
            meta.namespace.as_deref().unwrap_or_default(),
            meta.name.as_deref().unwrap_or_default()
        )
    }

    fn last_state(&self) -> String {
        (self.describer)(&*self.target)
    }
}

/// Whether any `(type, status)` pair matches both `condition_type` and `status`
fn has_condition<'c>(
    conditions: impl IntoIterator<Item = (&'c str, &'c str)>,
    condition_type: &str,
    status: ConditionStatus,
) -> bool {
    conditions
        .into_iter()
        .any(|(t, s)| t == condition_type && s == status.as_str())
}

/// Builder for pre-defined wait checks against a resource accessor
///
/// Created once per test. The accessor is borrowed, not owned.
pub struct Conditions<'r, A> {
    resources: &'r A,
    verbose: bool,
}

impl<'r, A: ResourceAccessor> Conditions<'r, A> {
    pub fn new(resources: &'r A) -> Self {
        Self {
            resources,
            verbose: false,
        }
    }

    /// Log every poll attempt, useful for debugging long-running tests
    pub fn with_verbose_log(mut self) -> Self {
        self.verbose = true;
        self
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    fn predicate<'a, K>(
        &'a self,
        target: &'a mut K,
        description: String,
        policy: FetchPolicy,
        matcher: Matcher<'a, K>,
        describer: Describer<'a, K>,
    ) -> Predicate<'a, A, K>
    where
        K: Object,
    {
        Predicate {
            resources: self.resources,
            verbose: self.verbose,
            target,
            description,
            policy,
            matcher,
            describer,
        }
    }

    /// Resource reports `replica` replicas through `scale_fetcher`
    ///
    /// Works for anything scalable: Deployments, StatefulSets, ReplicaSets.
    /// Fetch errors are treated as "not yet" rather than ending the poll.
    pub fn resource_scaled<'a, K, F>(
        &'a self,
        obj: &'a mut K,
        scale_fetcher: F,
        replica: i32,
    ) -> Predicate<'a, A, K>
    where
        K: Object,
        F: Fn(&K) -> i32 + Send + Sync + 'a,
    {
        let scale_fetcher = std::sync::Arc::new(scale_fetcher);
        let observed = std::sync::Arc::clone(&scale_fetcher);
        self.predicate(
            obj,
            format!("resource scaled to {replica}"),
            FetchPolicy::Tolerate,
            Box::new(move |k: &K| (*scale_fetcher)(k) == replica),
            Box::new(move |k: &K| format!("{} replicas, want {replica}", (*observed)(k))),
        )
    }

    /// Resource is gone from the cluster
    ///
    /// Useful after triggering DELETE on something with finalizers.
    pub fn resource_deleted<'a, K>(&'a self, obj: &'a mut K) -> Predicate<'a, A, K>
    where
        K: Object,
    {
        self.predicate(
            obj,
            "resource deletion".to_string(),
            FetchPolicy::AwaitAbsence,
            Box::new(|_: &K| false),
            Box::new(|_: &K| "still exists".to_string()),
        )
    }

    /// Resource satisfies a caller-supplied check
    ///
    /// Fetch errors are treated as "not yet".
    pub fn resource_match<'a, K, F>(&'a self, obj: &'a mut K, matcher: F) -> Predicate<'a, A, K>
    where
        K: Object,
        F: Fn(&K) -> bool + Send + Sync + 'a,
    {
        self.predicate(
            obj,
            "custom resource match".to_string(),
            FetchPolicy::Tolerate,
            Box::new(matcher),
            Box::new(|_: &K| "custom condition not met".to_string()),
        )
    }

    /// Job carries a condition of `condition_type` with `status`
    ///
    /// Works for both positive and negative cases, e.g. `Complete=False`.
    pub fn job_condition_match<'a>(
        &'a self,
        job: &'a mut Job,
        condition_type: &str,
        status: ConditionStatus,
    ) -> Predicate<'a, A, Job> {
        let wanted = condition_type.to_string();
        self.predicate(
            job,
            format!("Job condition {condition_type}/{status}"),
            FetchPolicy::Propagate,
            Box::new(move |job: &Job| {
                let conds = job.status.as_ref().and_then(|s| s.conditions.as_ref());
                has_condition(
                    conds
                        .into_iter()
                        .flatten()
                        .map(|c| (c.type_.as_str(), c.status.as_str())),
                    &wanted,
                    status,
                )
            }),
            Box::new(Job::state_description),
        )
    }

    /// Pod carries a condition of `condition_type` with `status`
    pub fn pod_condition_match<'a>(
        &'a self,
        pod: &'a mut Pod,
        condition_type: &str,
        status: ConditionStatus,
    ) -> Predicate<'a, A, Pod> {
        let wanted = condition_type.to_string();
        self.predicate(
            pod,
            format!("Pod condition {condition_type}/{status}"),
            FetchPolicy::Propagate,
            Box::new(move |pod: &Pod| {
                let conds = pod.status.as_ref().and_then(|s| s.conditions.as_ref());
                has_condition(
                    conds
                        .into_iter()
                        .flatten()
                        .map(|c| (c.type_.as_str(), c.status.as_str())),
                    &wanted,
                    status,
                )
            }),
            Box::new(Pod::state_description),
        )
    }

    /// Pod has reached `phase`
    ///
    /// Combine with [`pod_condition_match`](Self::pod_condition_match) to
    /// catch things like a crash-looping pod that stays Running.
    pub fn pod_phase_match<'a>(&'a self, pod: &'a mut Pod, phase: PodPhase) -> Predicate<'a, A, Pod> {
        self.predicate(
            pod,
            format!("Pod phase {phase}"),
            FetchPolicy::Propagate,
            Box::new(move |pod: &Pod| {
                pod.status.as_ref().and_then(|s| s.phase.as_deref()) == Some(phase.as_str())
            }),
            Box::new(Pod::state_description),
        )
    }

    /// Deployment carries a condition of `condition_type` with `status`
    pub fn deployment_condition_match<'a>(
        &'a self,
        deployment: &'a mut Deployment,
        condition_type: &str,
        status: ConditionStatus,
    ) -> Predicate<'a, A, Deployment> {
        let wanted = condition_type.to_string();
        self.predicate(
            deployment,
            format!("Deployment condition {condition_type}/{status}"),
            FetchPolicy::Propagate,
            Box::new(move |dep: &Deployment| {
                let conds = dep.status.as_ref().and_then(|s| s.conditions.as_ref());
                has_condition(
                    conds
                        .into_iter()
                        .flatten()
                        .map(|c| (c.type_.as_str(), c.status.as_str())),
                    &wanted,
                    status,
                )
            }),
            Box::new(Deployment::state_description),
        )
    }

    /// Pod condition `Ready` is `True`
    pub fn pod_ready<'a>(&'a self, pod: &'a mut Pod) -> Predicate<'a, A, Pod> {
        self.pod_condition_match(pod, POD_READY, ConditionStatus::True)
    }

    /// Pod condition `ContainersReady` is `True`
    pub fn containers_ready<'a>(&'a self, pod: &'a mut Pod) -> Predicate<'a, A, Pod> {
        self.pod_condition_match(pod, CONTAINERS_READY, ConditionStatus::True)
    }

    /// Pod phase is `Running`
    pub fn pod_running<'a>(&'a self, pod: &'a mut Pod) -> Predicate<'a, A, Pod> {
        self.pod_phase_match(pod, PodPhase::Running)
    }

    /// Job condition `Complete` is `True`
    pub fn job_completed<'a>(&'a self, job: &'a mut Job) -> Predicate<'a, A, Job> {
        self.job_condition_match(job, JOB_COMPLETE, ConditionStatus::True)
    }

    /// Job condition `Failed` is `True`
    pub fn job_failed<'a>(&'a self, job: &'a mut Job) -> Predicate<'a, A, Job> {
        self.job_condition_match(job, JOB_FAILED, ConditionStatus::True)
    }

    /// Deployment condition `Available` is `True`
    pub fn deployment_available<'a>(
        &'a self,
        deployment: &'a mut Deployment,
    ) -> Predicate<'a, A, Deployment> {
        self.deployment_condition_match(deployment, DEPLOYMENT_AVAILABLE, ConditionStatus::True)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeResources;
    use k8s_openapi::api::apps::v1::{DeploymentCondition, DeploymentSpec, DeploymentStatus};
    use k8s_openapi::api::batch::v1::{JobCondition, JobStatus};
    use k8s_openapi::api::core::v1::{PodCondition, PodStatus};
    use kube::api::ObjectMeta;

    const NS: &str = "e2e";

    fn meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NS.to_string()),
            ..Default::default()
        }
    }

    fn pod_target(name: &str) -> Pod {
        Pod {
            metadata: meta(name),
            ..Default::default()
        }
    }

    fn pod_with(name: &str, phase: &str, conditions: &[(&str, &str)]) -> Pod {
        Pod {
            metadata: meta(name),
            status: Some(PodStatus {
                phase: Some(phase.to_string()),
                conditions: Some(
                    conditions
                        .iter()
                        .map(|(t, s)| PodCondition {
                            type_: t.to_string(),
                            status: s.to_string(),
                            ..Default::default()
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn job_with(name: &str, conditions: &[(&str, &str)]) -> Job {
        Job {
            metadata: meta(name),
            status: Some(JobStatus {
                conditions: Some(
                    conditions
                        .iter()
                        .map(|(t, s)| JobCondition {
                            type_: t.to_string(),
                            status: s.to_string(),
                            ..Default::default()
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn deployment_with(name: &str, replicas: i32, ready: i32) -> Deployment {
        Deployment {
            metadata: meta(name),
            spec: Some(DeploymentSpec {
                replicas: Some(replicas),
                ..Default::default()
            }),
            status: Some(DeploymentStatus {
                ready_replicas: Some(ready),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn ready_replicas(d: &Deployment) -> i32 {
        d.status.as_ref().and_then(|s| s.ready_replicas).unwrap_or(0)
    }

    fn server_error() -> FetchError {
        FetchError::Api {
            code: 500,
            message: "etcdserver: leader changed".to_string(),
        }
    }

    /// Shared buffer the test subscriber writes into
    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    #[tokio::test]
    async fn test_verbose_log_only_when_enabled() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let fake = FakeResources::new();
        fake.push_object(NS, "web-0", &pod_with("web-0", "Running", &[]));

        let quiet = Conditions::new(&fake);
        let mut pod = pod_target("web-0");
        assert!(quiet.pod_running(&mut pod).check().await.unwrap());
        assert!(logs.lines().is_empty(), "quiet builder must not log");

        let verbose = Conditions::new(&fake).with_verbose_log();
        assert!(verbose.pod_running(&mut pod).check().await.unwrap());
        let lines = logs.lines();
        assert_eq!(lines.len(), 1, "got {lines:?}");
        assert!(lines[0].contains("Checking Pod phase Running"));
        assert!(lines[0].contains("name=web-0"));
    }

    #[test]
    fn test_has_condition_needs_type_and_status() {
        let conds = [("Ready", "False"), ("ContainersReady", "True")];
        assert!(has_condition(conds, "ContainersReady", ConditionStatus::True));
        assert!(has_condition(conds, "Ready", ConditionStatus::False));
        assert!(!has_condition(conds, "Ready", ConditionStatus::True));
        assert!(!has_condition(std::iter::empty(), "Ready", ConditionStatus::True));
    }

    #[test]
    fn test_builder_defaults_to_quiet() {
        let fake = FakeResources::new();
        assert!(!Conditions::new(&fake).is_verbose());
        assert!(Conditions::new(&fake).with_verbose_log().is_verbose());
    }

    #[test]
    fn test_vocabulary_strings() {
        assert_eq!(ConditionStatus::True.to_string(), "True");
        assert_eq!(ConditionStatus::Unknown.as_str(), "Unknown");
        assert_eq!(PodPhase::Running.to_string(), "Running");
        assert_eq!(PodPhase::Succeeded.as_str(), "Succeeded");
    }

    #[tokio::test]
    async fn test_resource_scaled_matches_replica_count() {
        let fake = FakeResources::new();
        fake.push_object(NS, "web", &deployment_with("web", 3, 1));
        fake.push_object(NS, "web", &deployment_with("web", 3, 3));
        let conditions = Conditions::new(&fake);

        let mut dep = deployment_with("web", 3, 0);
        let mut check = conditions.resource_scaled(&mut dep, ready_replicas, 3);

        assert!(!check.check().await.unwrap());
        assert_eq!(check.last_state(), "1 replicas, want 3");
        assert!(check.check().await.unwrap());
        assert_eq!(check.policy(), FetchPolicy::Tolerate);
    }

    #[tokio::test]
    async fn test_resource_scaled_swallows_fetch_errors() {
        let fake = FakeResources::new();
        fake.push_error(NS, "web", server_error());
        fake.push_not_found(NS, "web");
        let conditions = Conditions::new(&fake);

        let mut dep = deployment_with("web", 2, 0);
        let mut check = conditions.resource_scaled(&mut dep, ready_replicas, 2);

        assert!(!check.check().await.unwrap());
        assert!(!check.check().await.unwrap());
        assert_eq!(fake.fetch_count(NS, "web"), 2);
    }

    #[tokio::test]
    async fn test_resource_deleted_waits_for_not_found() {
        let fake = FakeResources::new();
        fake.push_object(NS, "web-0", &pod_with("web-0", "Running", &[]));
        fake.push_not_found(NS, "web-0");
        let conditions = Conditions::new(&fake);

        let mut pod = pod_target("web-0");
        let mut check = conditions.resource_deleted(&mut pod);

        assert!(!check.check().await.unwrap(), "pod still exists");
        assert_eq!(check.last_state(), "still exists");
        assert!(check.check().await.unwrap(), "pod is gone");
    }

    #[tokio::test]
    async fn test_resource_deleted_propagates_other_errors() {
        let fake = FakeResources::new();
        fake.push_error(NS, "web-0", server_error());
        let conditions = Conditions::new(&fake);

        let mut pod = pod_target("web-0");
        let err = conditions
            .resource_deleted(&mut pod)
            .check()
            .await
            .unwrap_err();

        match err {
            ConditionError::Fetch(FetchError::Api { code, .. }) => assert_eq!(code, 500),
            other => panic!("expected Fetch(Api), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resource_match_uses_custom_check() {
        let fake = FakeResources::new();
        fake.push_error(NS, "web", server_error());
        fake.push_object(NS, "web", &deployment_with("web", 5, 0));
        let conditions = Conditions::new(&fake);

        let mut dep = deployment_with("web", 1, 0);
        let mut check = conditions.resource_match(&mut dep, |d: &Deployment| {
            d.spec.as_ref().and_then(|s| s.replicas) == Some(5)
        });

        assert!(!check.check().await.unwrap(), "fetch error is tolerated");
        assert!(check.check().await.unwrap());
    }

    #[tokio::test]
    async fn test_pod_condition_match() {
        let fake = FakeResources::new();
        fake.push_object(
            NS,
            "web-0",
            &pod_with("web-0", "Running", &[(POD_SCHEDULED, "True"), (POD_READY, "False")]),
        );
        fake.push_object(
            NS,
            "web-0",
            &pod_with("web-0", "Running", &[(POD_SCHEDULED, "True"), (POD_READY, "True")]),
        );
        let conditions = Conditions::new(&fake);

        let mut pod = pod_target("web-0");
        let mut check = conditions.pod_condition_match(&mut pod, POD_READY, ConditionStatus::True);

        assert!(!check.check().await.unwrap());
        assert!(check.check().await.unwrap());
        assert!(check.last_state().contains("Ready=True"));
    }

    #[tokio::test]
    async fn test_pod_condition_match_negative_case() {
        let fake = FakeResources::new();
        fake.push_object(NS, "web-0", &pod_with("web-0", "Running", &[(POD_READY, "False")]));
        let conditions = Conditions::new(&fake);

        let mut pod = pod_target("web-0");
        let done = conditions
            .pod_condition_match(&mut pod, POD_READY, ConditionStatus::False)
            .check()
            .await
            .unwrap();

        assert!(done);
    }

    #[tokio::test]
    async fn test_pod_condition_requires_both_type_and_status() {
        let fake = FakeResources::new();
        fake.push_object(
            NS,
            "web-0",
            &pod_with("web-0", "Running", &[(POD_READY, "False"), (CONTAINERS_READY, "True")]),
        );
        let conditions = Conditions::new(&fake);

        let mut pod = pod_target("web-0");
        assert!(!conditions.pod_ready(&mut pod).check().await.unwrap());
        assert!(conditions.containers_ready(&mut pod).check().await.unwrap());
    }

    #[tokio::test]
    async fn test_pod_without_conditions_is_not_ready() {
        let fake = FakeResources::new();
        fake.push_object(NS, "web-0", &pod_target("web-0"));
        let conditions = Conditions::new(&fake);

        let mut pod = pod_target("web-0");
        assert!(!conditions.pod_ready(&mut pod).check().await.unwrap());
    }

    #[tokio::test]
    async fn test_pod_predicates_propagate_fetch_errors() {
        let fake = FakeResources::new();
        fake.push_not_found(NS, "web-0");
        let conditions = Conditions::new(&fake);

        let mut pod = pod_target("web-0");
        assert!(conditions.pod_ready(&mut pod).check().await.is_err());
        assert!(conditions.pod_running(&mut pod).check().await.is_err());
    }

    #[tokio::test]
    async fn test_pod_running_after_pending() {
        let fake = FakeResources::new();
        fake.push_object(NS, "web-0", &pod_with("web-0", "Pending", &[]));
        fake.push_object(NS, "web-0", &pod_with("web-0", "Running", &[]));
        let conditions = Conditions::new(&fake).with_verbose_log();

        let mut pod = pod_target("web-0");
        let mut check = conditions.pod_running(&mut pod);

        assert!(!check.check().await.unwrap());
        assert_eq!(check.last_state(), "phase=Pending");
        assert!(check.check().await.unwrap());
        drop(check);

        assert_eq!(
            pod.status.as_ref().and_then(|s| s.phase.as_deref()),
            Some("Running"),
            "target holds the last fetched state"
        );
    }

    #[tokio::test]
    async fn test_pod_phase_match_other_phases() {
        let fake = FakeResources::new();
        fake.push_object(NS, "batch-0", &pod_with("batch-0", "Succeeded", &[]));
        let conditions = Conditions::new(&fake);

        let mut pod = pod_target("batch-0");
        assert!(conditions
            .pod_phase_match(&mut pod, PodPhase::Succeeded)
            .check()
            .await
            .unwrap());
        assert!(!conditions.pod_running(&mut pod).check().await.unwrap());
    }

    #[tokio::test]
    async fn test_job_completed_and_failed() {
        let fake = FakeResources::new();
        fake.push_object(NS, "ok", &job_with("ok", &[(JOB_COMPLETE, "True")]));
        fake.push_object(NS, "bad", &job_with("bad", &[(JOB_FAILED, "True")]));
        let conditions = Conditions::new(&fake);

        let mut ok = job_with("ok", &[]);
        assert!(conditions.job_completed(&mut ok).check().await.unwrap());
        assert!(!conditions.job_failed(&mut ok).check().await.unwrap());

        let mut bad = job_with("bad", &[]);
        assert!(!conditions.job_completed(&mut bad).check().await.unwrap());
        assert!(conditions.job_failed(&mut bad).check().await.unwrap());
    }

    #[tokio::test]
    async fn test_job_with_both_conditions_satisfies_both() {
        let fake = FakeResources::new();
        fake.push_object(
            NS,
            "odd",
            &job_with("odd", &[(JOB_COMPLETE, "True"), (JOB_FAILED, "True")]),
        );
        let conditions = Conditions::new(&fake);

        let mut job = job_with("odd", &[]);
        assert!(conditions.job_completed(&mut job).check().await.unwrap());
        assert!(conditions.job_failed(&mut job).check().await.unwrap());
    }

    #[tokio::test]
    async fn test_job_condition_propagates_fetch_errors() {
        let fake = FakeResources::new();
        fake.push_error(NS, "migrate", server_error());
        let conditions = Conditions::new(&fake);

        let mut job = job_with("migrate", &[]);
        let err = conditions.job_completed(&mut job).check().await.unwrap_err();
        assert!(matches!(err, ConditionError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_deployment_available() {
        let mut available = deployment_with("web", 2, 2);
        if let Some(status) = available.status.as_mut() {
            status.conditions = Some(vec![DeploymentCondition {
                type_: DEPLOYMENT_AVAILABLE.to_string(),
                status: "True".to_string(),
                ..Default::default()
            }]);
        }

        let fake = FakeResources::new();
        fake.push_object(NS, "web", &deployment_with("web", 2, 0));
        fake.push_object(NS, "web", &available);
        let conditions = Conditions::new(&fake);

        let mut dep = deployment_with("web", 2, 0);
        let mut check = conditions.deployment_available(&mut dep);

        assert!(!check.check().await.unwrap());
        assert!(check.check().await.unwrap());
        assert!(check.last_state().contains("Available=True"));
    }

    #[tokio::test]
    async fn test_decode_failure_is_reported() {
        let fake = FakeResources::new();
        fake.push_json(
            NS,
            "web-0",
            serde_json::json!({
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": { "name": "web-0", "namespace": NS },
                "status": { "phase": 42 }
            }),
        );
        let conditions = Conditions::new(&fake);

        let mut pod = pod_target("web-0");
        let err = conditions.pod_running(&mut pod).check().await.unwrap_err();
        assert!(matches!(err, ConditionError::Fetch(FetchError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_missing_name_fails_without_fetching() {
        let fake = FakeResources::new();
        let conditions = Conditions::new(&fake);

        let mut pod = Pod::default();
        let err = conditions.resource_deleted(&mut pod).check().await.unwrap_err();

        match err {
            ConditionError::MissingName { kind } => assert_eq!(kind, "Pod"),
            other => panic!("expected MissingName, got {other:?}"),
        }
        assert_eq!(fake.fetch_count("", ""), 0);
    }

    #[tokio::test]
    async fn test_resource_reference() {
        let fake = FakeResources::new();
        let conditions = Conditions::new(&fake);

        let mut pod = pod_target("web-0");
        let check = conditions.pod_ready(&mut pod);
        assert_eq!(check.resource(), "Pod/e2e/web-0");
        assert_eq!(check.target().metadata.name.as_deref(), Some("web-0"));
    }
}
