//! Consensus readiness watcher
//!
//! Watches cluster objects until the external consensus client is
//! reachable, then raises the process-wide readiness flag exactly once.
//! Two strategies exist: watching a named pod for its `Ready` condition
//! (preferred), or watching a named service's endpoints for a first
//! address (fallback). A watch that fails or times out is terminal for
//! this process lifetime; the flag stays unset and the scheduler is
//! expected to restart the pod.

use std::fmt;
use std::time::Duration;

use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::{Endpoints, Pod};
use kube::api::Api;
use kube::runtime::{watcher, WatchStreamExt};
use kube::Client;
use tracing::info;

use crate::error::{Error, Result};
use crate::state::ReadinessFlag;

const NAMESPACE_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// What to watch for consensus readiness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchTarget {
    Pod(String),
    Service(String),
}

impl WatchTarget {
    /// Build the target from the CLI flags. The pod takes precedence when
    /// both are given; `None` when neither is usable.
    pub fn from_flags(pod: Option<String>, service: Option<String>) -> Option<Self> {
        match (pod, service) {
            (Some(pod), _) if !pod.is_empty() => Some(WatchTarget::Pod(pod)),
            (_, Some(service)) if !service.is_empty() => Some(WatchTarget::Service(service)),
            _ => None,
        }
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchTarget::Pod(name) => write!(f, "pod {name}"),
            WatchTarget::Service(name) => write!(f, "service {name}"),
        }
    }
}

/// Watch the target until ready, then mark the readiness flag.
///
/// `timeout` bounds the whole wait; zero means wait forever. Any failure
/// (missing target, API error, closed stream, timeout) is returned to the
/// caller for logging and leaves the flag untouched.
pub async fn wait_for_consensus(
    target: Option<WatchTarget>,
    namespace: Option<String>,
    timeout: Duration,
    readiness: &ReadinessFlag,
) -> Result<()> {
    let target = target.ok_or_else(|| {
        Error::WatchFailed("either the --pod or the --service flag is required".to_string())
    })?;
    let namespace = resolve_namespace(namespace).await;
    let client = Client::try_default().await?;

    let watch = watch_until_ready(client, &target, &namespace);
    if timeout.is_zero() {
        watch.await?;
    } else {
        tokio::time::timeout(timeout, watch)
            .await
            .map_err(|_| {
                Error::WatchFailed(format!("timed out waiting for {target} to be ready"))
            })??;
    }

    if readiness.mark_ready() {
        info!("Consensus client is ready");
    }
    Ok(())
}

async fn watch_until_ready(client: Client, target: &WatchTarget, namespace: &str) -> Result<()> {
    match target {
        WatchTarget::Pod(name) => {
            info!("Watching pod {}/{} for readiness", namespace, name);
            let api: Api<Pod> = Api::namespaced(client, namespace);
            let config = watcher::Config::default().fields(&format!("metadata.name={name}"));
            let mut stream = watcher(api, config).applied_objects().boxed();
            while let Some(pod) = stream
                .try_next()
                .await
                .map_err(|e| Error::WatchFailed(e.to_string()))?
            {
                if pod_is_ready(&pod) {
                    info!("Pod {} is ready", name);
                    return Ok(());
                }
            }
            Err(Error::WatchFailed(
                "pod watch stream closed unexpectedly".to_string(),
            ))
        }
        WatchTarget::Service(name) => {
            info!("Watching endpoints of service {}/{}", namespace, name);
            let api: Api<Endpoints> = Api::namespaced(client, namespace);
            let config = watcher::Config::default().fields(&format!("metadata.name={name}"));
            let mut stream = watcher(api, config).applied_objects().boxed();
            while let Some(endpoints) = stream
                .try_next()
                .await
                .map_err(|e| Error::WatchFailed(e.to_string()))?
            {
                if endpoints_are_ready(&endpoints) {
                    info!("Consensus client endpoints are ready");
                    return Ok(());
                }
            }
            Err(Error::WatchFailed(
                "endpoints watch stream closed unexpectedly".to_string(),
            ))
        }
    }
}

/// A pod is ready when a condition of type `Ready` has status `True`.
fn pod_is_ready(pod: &Pod) -> bool {
    if let Some(status) = &pod.status {
        if let Some(conditions) = &status.conditions {
            return conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True");
        }
    }
    false
}

/// Endpoints are ready when any subset carries at least one address.
fn endpoints_are_ready(endpoints: &Endpoints) -> bool {
    endpoints
        .subsets
        .as_ref()
        .map(|subsets| {
            subsets
                .iter()
                .any(|subset| subset.addresses.as_ref().is_some_and(|a| !a.is_empty()))
        })
        .unwrap_or(false)
}

/// Explicit flag, then the mounted service-account file, then `default`.
async fn resolve_namespace(explicit: Option<String>) -> String {
    if let Some(namespace) = explicit.filter(|s| !s.is_empty()) {
        return namespace;
    }
    match tokio::fs::read_to_string(NAMESPACE_FILE).await {
        Ok(contents) => contents.trim().to_string(),
        Err(_) => {
            info!("Could not read pod namespace, defaulting to 'default'");
            "default".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{EndpointAddress, EndpointSubset, PodCondition, PodStatus};

    fn pod_with_condition(type_: &str, status: &str) -> Pod {
        Pod {
            status: Some(PodStatus {
                conditions: Some(vec![PodCondition {
                    type_: type_.to_string(),
                    status: status.to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn pod_ready_condition_is_detected() {
        assert!(pod_is_ready(&pod_with_condition("Ready", "True")));
        assert!(!pod_is_ready(&pod_with_condition("Ready", "False")));
        assert!(!pod_is_ready(&pod_with_condition("PodScheduled", "True")));
        assert!(!pod_is_ready(&Pod::default()));
    }

    #[test]
    fn endpoints_need_at_least_one_address() {
        let ready = Endpoints {
            subsets: Some(vec![EndpointSubset {
                addresses: Some(vec![EndpointAddress {
                    ip: "10.0.0.7".to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }]),
            ..Default::default()
        };
        assert!(endpoints_are_ready(&ready));

        let empty_subset = Endpoints {
            subsets: Some(vec![EndpointSubset::default()]),
            ..Default::default()
        };
        assert!(!endpoints_are_ready(&empty_subset));
        assert!(!endpoints_are_ready(&Endpoints::default()));
    }

    #[test]
    fn pod_takes_precedence_over_service() {
        assert_eq!(
            WatchTarget::from_flags(Some("cl-node".into()), Some("cl-svc".into())),
            Some(WatchTarget::Pod("cl-node".into()))
        );
        assert_eq!(
            WatchTarget::from_flags(Some(String::new()), Some("cl-svc".into())),
            Some(WatchTarget::Service("cl-svc".into()))
        );
        assert_eq!(WatchTarget::from_flags(None, None), None);
    }

    #[tokio::test]
    async fn explicit_namespace_wins() {
        assert_eq!(
            resolve_namespace(Some("consensus".to_string())).await,
            "consensus"
        );
    }

    #[tokio::test]
    async fn missing_target_leaves_flag_unset() {
        let flag = ReadinessFlag::default();
        let err = wait_for_consensus(None, None, Duration::from_secs(1), &flag)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WatchFailed(_)));
        assert!(!flag.is_ready());
    }
}
