use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Where a consumer group keeps its committed offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordinationKind {
    /// Offsets and owners live under `/consumers/<group>` in ZooKeeper.
    #[serde(rename = "zk")]
    LegacyZk,
    /// Offsets are committed to the brokers (`__consumer_offsets`).
    #[serde(rename = "kf")]
    BrokerManaged,
    /// The group is visible in both stores, usually while migrating.
    #[serde(rename = "any")]
    Any,
}

impl CoordinationKind {
    pub fn merge(self, other: CoordinationKind) -> CoordinationKind {
        if self == other {
            self
        } else {
            CoordinationKind::Any
        }
    }

    pub fn uses_legacy_store(self) -> bool {
        matches!(self, CoordinationKind::LegacyZk | CoordinationKind::Any)
    }

    pub fn uses_broker(self) -> bool {
        matches!(self, CoordinationKind::BrokerManaged | CoordinationKind::Any)
    }
}

impl Display for CoordinationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinationKind::LegacyZk => write!(f, "zk"),
            CoordinationKind::BrokerManaged => write!(f, "kf"),
            CoordinationKind::Any => write!(f, "any"),
        }
    }
}

/// Restricts group listings to one coordination backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KindSelector {
    #[default]
    All,
    LegacyZk,
    BrokerManaged,
}

impl KindSelector {
    pub fn matches(self, kind: CoordinationKind) -> bool {
        match self {
            KindSelector::All => true,
            KindSelector::LegacyZk => kind.uses_legacy_store(),
            KindSelector::BrokerManaged => kind.uses_broker(),
        }
    }
}

impl FromStr for KindSelector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "*" | "all" => Ok(KindSelector::All),
            "zk" => Ok(KindSelector::LegacyZk),
            "kf" => Ok(KindSelector::BrokerManaged),
            other => bail!("Unsupported consumer type '{}', expected one of zk, kf, *", other),
        }
    }
}
