use chrono::{DateTime, Local};

/// One inventory entry after its probe finished
///
/// Service fields are empty when the state could not be determined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRecord {
    pub name: String,
    pub readiness: String,
    pub agent_state: String,
    pub runtime_state: String,
    pub storage_agent_state: String,
}

/// `kubectl get deployment` summary: (name, ready ratio, up-to-date ratio)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStatus {
    pub name: String,
    pub ready: String,
    pub up_to_date: String,
}

/// Aggregate result of one refresh cycle
#[derive(Debug, Clone)]
pub struct ClusterSnapshot {
    /// Sorted by name, names unique
    pub nodes: Vec<NodeRecord>,
    pub deployments: [Option<DeploymentStatus>; 2],
    pub collected_at: DateTime<Local>,
}
