//! The closed set of scaling policy variants.

use std::fmt;
use std::str::FromStr;

use proscale_core::ClusterStatus;
use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};
use crate::ladder::LadderPolicy;
use crate::linear::LinearPolicy;

/// Name of a policy variant, as used for the configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Ladder,
    Linear,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 2] = [PolicyKind::Ladder, PolicyKind::Linear];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ladder => "ladder",
            Self::Linear => "linear",
        }
    }

    /// Parse the variant's JSON parameters into a ready policy.
    pub fn parse(self, params: &str) -> PolicyResult<ScalingPolicy> {
        match self {
            Self::Ladder => LadderPolicy::parse(params).map(ScalingPolicy::Ladder),
            Self::Linear => LinearPolicy::parse(params).map(ScalingPolicy::Linear),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PolicyError::UnsupportedPolicyVariant(s.to_string()))
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully parsed and validated scaling policy.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalingPolicy {
    Ladder(LadderPolicy),
    Linear(LinearPolicy),
}

impl ScalingPolicy {
    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::Ladder(_) => PolicyKind::Ladder,
            Self::Linear(_) => PolicyKind::Linear,
        }
    }

    /// Replica count this policy asks for given the cluster size.
    pub fn expected_replicas(&self, status: &ClusterStatus) -> u32 {
        match self {
            Self::Ladder(p) => p.expected_replicas(status),
            Self::Linear(p) => p.expected_replicas(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in PolicyKind::ALL {
            assert_eq!(kind.as_str().parse::<PolicyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        assert_eq!(
            "exponential".parse::<PolicyKind>(),
            Err(PolicyError::UnsupportedPolicyVariant("exponential".to_string()))
        );
        // Keys are exact; no case folding.
        assert!("Linear".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn parse_dispatches_to_variant() {
        let policy = PolicyKind::Linear
            .parse(r#"{"coresPerReplica": 4}"#)
            .unwrap();
        assert_eq!(policy.kind(), PolicyKind::Linear);

        let policy = PolicyKind::Ladder
            .parse(r#"{"nodesToReplicas": [[1, 1]]}"#)
            .unwrap();
        assert_eq!(policy.kind(), PolicyKind::Ladder);
    }

    #[test]
    fn parse_errors_name_the_variant() {
        let err = PolicyKind::Ladder.parse("{").unwrap_err();
        assert!(matches!(
            err,
            PolicyError::ConfigParseInvalid {
                kind: PolicyKind::Ladder,
                ..
            }
        ));
    }
}
