//! Scripted in-memory accessor for unit tests
//!
//! `FakeResources` answers fetches from per-object queues of canned
//! responses, so predicates can be exercised without a cluster.
//!
//! # Example
//!
//! ```ignore
//! let fake = FakeResources::new();
//! fake.push_object("apps", "web-0", &pending_pod);
//! fake.push_object("apps", "web-0", &running_pod);
//!
//! // First fetch sees Pending, every fetch after that sees Running
//! ```

use crate::resources::{FetchError, Object, ResourceAccessor};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

type Key = (String, String);
type Response = Result<serde_json::Value, FetchError>;

#[derive(Default)]
struct Script {
    responses: VecDeque<Response>,
    fetches: usize,
}

/// [`ResourceAccessor`] that replays queued responses
///
/// Each fetch pops the next response for its `(namespace, name)`. The last
/// queued response is sticky and keeps being returned. Objects with nothing
/// queued are reported as not found.
#[derive(Default)]
pub struct FakeResources {
    scripts: Mutex<HashMap<Key, Script>>,
}

impl FakeResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a typed object as the next response
    pub fn push_object<T: serde::Serialize>(&self, namespace: &str, name: &str, obj: &T) {
        let response = serde_json::to_value(obj).map_err(|e| FetchError::Decode {
            kind: std::any::type_name::<T>().to_string(),
            message: e.to_string(),
        });
        self.push(namespace, name, response);
    }

    /// Queue a raw JSON payload as the next response
    pub fn push_json(&self, namespace: &str, name: &str, value: serde_json::Value) {
        self.push(namespace, name, Ok(value));
    }

    /// Queue a not-found error as the next response
    ///
    /// The kind is filled in from the type requested at fetch time.
    pub fn push_not_found(&self, namespace: &str, name: &str) {
        self.push(
            namespace,
            name,
            Err(FetchError::NotFound {
                kind: String::new(),
                name: name.to_string(),
                namespace: namespace.to_string(),
            }),
        );
    }

    /// Queue an arbitrary error as the next response
    pub fn push_error(&self, namespace: &str, name: &str, err: FetchError) {
        self.push(namespace, name, Err(err));
    }

    /// Number of fetches made for an object so far
    pub fn fetch_count(&self, namespace: &str, name: &str) -> usize {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(namespace.to_string(), name.to_string()))
            .map_or(0, |s| s.fetches)
    }

    fn push(&self, namespace: &str, name: &str, response: Response) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .responses
            .push_back(response);
    }

    fn next_response(&self, namespace: &str, name: &str) -> Option<Response> {
        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        let script = scripts
            .entry((namespace.to_string(), name.to_string()))
            .or_default();
        script.fetches += 1;

        if script.responses.len() > 1 {
            script.responses.pop_front()
        } else {
            script.responses.front().cloned()
        }
    }
}

#[async_trait]
impl ResourceAccessor for FakeResources {
    async fn get_into<K: Object>(
        &self,
        name: &str,
        namespace: &str,
        target: &mut K,
    ) -> Result<(), FetchError> {
        let value = match self.next_response(namespace, name) {
            Some(Ok(value)) => value,
            Some(Err(e)) if e.is_not_found() => {
                return Err(FetchError::not_found::<K>(name, namespace))
            }
            Some(Err(e)) => return Err(e),
            None => return Err(FetchError::not_found::<K>(name, namespace)),
        };

        *target = serde_json::from_value(value).map_err(|e| FetchError::Decode {
            kind: K::kind(&()).to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}
