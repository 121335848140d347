//! Scale target descriptors.
//!
//! A descriptor is `kind/name`, with several targets separated by commas:
//!
//! ```text
//! deployment/coredns,statefulset/metrics-agent
//! ```
//!
//! Kinds are matched case-insensitively and accept the singular or plural
//! form. Anything of the shape `resource.group` addresses a generic
//! scalable resource (for example `scaledobjects.keda.sh/dns`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing a target descriptor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("target descriptor cannot be empty")]
    Empty,

    #[error("target format error: {0:?}, expected kind/name")]
    Format(String),

    #[error(
        "unsupported target kind {0:?}: use deployment, replicaset, statefulset, \
         replicationcontroller, or resource.group"
    )]
    UnsupportedKind(String),

    #[error("target {0:?} listed more than once")]
    Duplicate(String),
}

/// Kind of workload the autoscaler resizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Deployment,
    ReplicaSet,
    StatefulSet,
    ReplicationController,
    /// A scalable resource outside the built-in kinds.
    Resource { group: String, resource: String },
}

impl TargetKind {
    /// Canonical lower-case name used in keys and logs.
    pub fn as_str(&self) -> String {
        match self {
            Self::Deployment => "deployment".to_string(),
            Self::ReplicaSet => "replicaset".to_string(),
            Self::StatefulSet => "statefulset".to_string(),
            Self::ReplicationController => "replicationcontroller".to_string(),
            Self::Resource { group, resource } => format!("{resource}.{group}"),
        }
    }
}

impl FromStr for TargetKind {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = s.trim().to_ascii_lowercase();
        match kind.as_str() {
            "deployment" | "deployments" => Ok(Self::Deployment),
            "replicaset" | "replicasets" => Ok(Self::ReplicaSet),
            "statefulset" | "statefulsets" => Ok(Self::StatefulSet),
            "replicationcontroller" | "replicationcontrollers" => {
                Ok(Self::ReplicationController)
            }
            _ => match kind.split_once('.') {
                Some((resource, group))
                    if !resource.is_empty()
                        && !group.is_empty()
                        && !group.starts_with('.')
                        && !group.ends_with('.') =>
                {
                    Ok(Self::Resource {
                        group: group.to_string(),
                        resource: resource.to_string(),
                    })
                }
                _ => Err(TargetError::UnsupportedKind(s.to_string())),
            },
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// A single workload to resize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScaleTarget {
    pub kind: TargetKind,
    pub name: String,
    pub namespace: String,
}

impl ScaleTarget {
    /// Composite `{namespace}/{kind}/{name}` key.
    pub fn table_key(&self) -> String {
        format!("{}/{}/{}", self.namespace, self.kind, self.name)
    }
}

impl fmt::Display for ScaleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Every target one autoscaler instance resizes. All share a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleTargetSpec {
    namespace: String,
    targets: Vec<ScaleTarget>,
}

impl ScaleTargetSpec {
    /// Parse a comma-separated descriptor into targets in `namespace`.
    pub fn parse(descriptor: &str, namespace: &str) -> Result<Self, TargetError> {
        let mut targets: Vec<ScaleTarget> = Vec::new();
        for raw in descriptor.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let Some((kind, name)) = raw.split_once('/') else {
                return Err(TargetError::Format(raw.to_string()));
            };
            let name = name.trim();
            if name.is_empty() || name.contains('/') {
                return Err(TargetError::Format(raw.to_string()));
            }
            let target = ScaleTarget {
                kind: kind.parse()?,
                name: name.to_string(),
                namespace: namespace.to_string(),
            };
            if targets.contains(&target) {
                return Err(TargetError::Duplicate(target.to_string()));
            }
            targets.push(target);
        }
        if targets.is_empty() {
            return Err(TargetError::Empty);
        }
        Ok(Self {
            namespace: namespace.to_string(),
            targets,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn targets(&self) -> &[ScaleTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl fmt::Display for ScaleTargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.targets.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_deployment() {
        let spec = ScaleTargetSpec::parse("deployment/coredns", "kube-system").unwrap();
        assert_eq!(spec.len(), 1);
        assert_eq!(spec.namespace(), "kube-system");
        let target = &spec.targets()[0];
        assert_eq!(target.kind, TargetKind::Deployment);
        assert_eq!(target.name, "coredns");
        assert_eq!(target.namespace, "kube-system");
    }

    #[test]
    fn kinds_are_case_insensitive_and_accept_plurals() {
        let spec = ScaleTargetSpec::parse(
            "Deployments/a, REPLICASET/b, statefulsets/c, ReplicationController/d",
            "default",
        )
        .unwrap();
        let kinds: Vec<_> = spec.targets().iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TargetKind::Deployment,
                TargetKind::ReplicaSet,
                TargetKind::StatefulSet,
                TargetKind::ReplicationController,
            ]
        );
    }

    #[test]
    fn names_keep_their_case() {
        let spec = ScaleTargetSpec::parse("Deployment/CoreDNS, deployment/coredns", "default").unwrap();
        let names: Vec<_> = spec.targets().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["CoreDNS", "coredns"]);
        assert_eq!(spec.targets()[0].kind, TargetKind::Deployment);
    }

    #[test]
    fn generic_group_resource_kind() {
        let spec = ScaleTargetSpec::parse("scaledobjects.keda.sh/dns", "default").unwrap();
        assert_eq!(
            spec.targets()[0].kind,
            TargetKind::Resource {
                group: "keda.sh".to_string(),
                resource: "scaledobjects".to_string(),
            }
        );
        assert_eq!(spec.to_string(), "scaledobjects.keda.sh/dns");
    }

    #[test]
    fn unknown_kind_rejected() {
        assert_eq!(
            ScaleTargetSpec::parse("daemonset/agent", "default"),
            Err(TargetError::UnsupportedKind("daemonset".to_string()))
        );
        assert!(matches!(
            ScaleTargetSpec::parse("pods./x", "default"),
            Err(TargetError::UnsupportedKind(_))
        ));
    }

    #[test]
    fn malformed_descriptors_rejected() {
        assert_eq!(ScaleTargetSpec::parse("", "default"), Err(TargetError::Empty));
        assert_eq!(ScaleTargetSpec::parse(" , ", "default"), Err(TargetError::Empty));
        assert!(matches!(
            ScaleTargetSpec::parse("deployment", "default"),
            Err(TargetError::Format(_))
        ));
        assert!(matches!(
            ScaleTargetSpec::parse("deployment/", "default"),
            Err(TargetError::Format(_))
        ));
        assert!(matches!(
            ScaleTargetSpec::parse("deployment/a/b", "default"),
            Err(TargetError::Format(_))
        ));
    }

    #[test]
    fn duplicate_targets_rejected() {
        assert!(matches!(
            ScaleTargetSpec::parse("deployment/a,deployments/a", "default"),
            Err(TargetError::Duplicate(_))
        ));
    }

    #[test]
    fn table_key_includes_namespace_and_kind() {
        let spec = ScaleTargetSpec::parse("statefulset/agent", "monitoring").unwrap();
        assert_eq!(spec.targets()[0].table_key(), "monitoring/statefulset/agent");
    }
}
