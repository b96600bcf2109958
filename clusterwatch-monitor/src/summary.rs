//! Summary aggregator
//!
//! Turns a cycle's node records into healthy/total tallies per tracked
//! dimension and gathers the two deployment summaries shown above them.

use std::fmt;
use tracing::debug;

use crate::config::{
    HealthConfig, MonitorConfig, AGENT_SERVICE, RUNTIME_SERVICE, STORAGE_AGENT_SERVICE,
};
use crate::execution::CommandRunner;
use crate::models::{ClusterSnapshot, DeploymentStatus, NodeRecord};

/// `healthy` out of `total`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub healthy: usize,
    pub total: usize,
}

impl Tally {
    pub fn new(healthy: usize, total: usize) -> Self {
        Self { healthy, total }
    }

    pub fn unhealthy(&self) -> usize {
        self.total - self.healthy
    }

    /// Unhealthy out of total, e.g. `1/3`
    pub fn unhealthy_ratio(&self) -> String {
        format!("{}/{}", self.unhealthy(), self.total)
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.healthy, self.total)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryCounts {
    pub node: Tally,
    pub agent: Tally,
    pub runtime: Tally,
    pub storage_agent: Tally,
}

/// Count records whose fields equal the healthy tokens exactly
pub fn summarize(records: &[NodeRecord], health: &HealthConfig) -> SummaryCounts {
    SummaryCounts {
        node: tally(records, &health.node_ready, |r| r.readiness.as_str()),
        agent: tally(records, &health.service_healthy, |r| r.agent_state.as_str()),
        runtime: tally(records, &health.service_healthy, |r| r.runtime_state.as_str()),
        storage_agent: tally(records, &health.service_healthy, |r| r.storage_agent_state.as_str()),
    }
}

fn tally(records: &[NodeRecord], token: &str, field: impl Fn(&NodeRecord) -> &str) -> Tally {
    let healthy = records.iter().filter(|r| field(r) == token).count();
    Tally::new(healthy, records.len())
}

/// First three tokens of the line after the header
pub fn parse_deployment(text: &str) -> Option<DeploymentStatus> {
    let line = text.lines().nth(1)?;
    let mut fields = line.split_whitespace();
    Some(DeploymentStatus {
        name: fields.next()?.to_string(),
        ready: fields.next()?.to_string(),
        up_to_date: fields.next()?.to_string(),
    })
}

/// `kubectl get deployment -n <namespace> <name>`; any failure yields `None`
pub async fn fetch_deployment<R>(
    runner: &R,
    config: &MonitorConfig,
    namespace: &str,
    name: &str,
) -> Option<DeploymentStatus>
where
    R: CommandRunner + ?Sized,
{
    let args = ["get", "deployment", "-n", namespace, name].map(String::from);

    match runner.run(&config.kubectl.binary, &args).await {
        Ok(output) if output.success() => {
            let status = parse_deployment(&output.stdout);
            if status.is_none() {
                debug!("Unparseable deployment output for {}/{}", namespace, name);
            }
            status
        }
        Ok(output) => {
            debug!(
                "Deployment {}/{} query exited with {:?}",
                namespace, name, output.exit_code
            );
            None
        }
        Err(e) => {
            debug!("Deployment {}/{} query failed: {}", namespace, name, e);
            None
        }
    }
}

/// One dashboard line: (service, READY, UP-TO-DATE)
pub type DashboardRow = Option<[String; 3]>;

/// Rows in display order; `None` marks an unavailable deployment
pub fn dashboard_rows(snapshot: &ClusterSnapshot, counts: &SummaryCounts) -> Vec<DashboardRow> {
    let deployment = |status: &Option<DeploymentStatus>| {
        status
            .as_ref()
            .map(|d| [d.name.clone(), d.ready.clone(), d.up_to_date.clone()])
    };
    let count_row =
        |label: &str, t: &Tally| Some([label.to_string(), t.to_string(), t.unhealthy_ratio()]);

    vec![
        deployment(&snapshot.deployments[0]),
        deployment(&snapshot.deployments[1]),
        Some([String::new(), String::new(), String::new()]),
        count_row("Node", &counts.node),
        count_row(AGENT_SERVICE, &counts.agent),
        count_row(RUNTIME_SERVICE, &counts.runtime),
        count_row(&STORAGE_AGENT_SERVICE.to_uppercase(), &counts.storage_agent),
    ]
}
