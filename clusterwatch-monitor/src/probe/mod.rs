//! Per-node service health probe
//!
//! One ssh round-trip per node asks systemd for the `Active:` state of the
//! three tracked units. The answer is parsed either by label
//! (`kubelet:active`) or by line position, depending on
//! [`ProbeParseMode`]. Each field is parsed independently: a unit that
//! reports nothing leaves only its own field empty.

use tracing::debug;

use crate::config::{
    MonitorConfig, ProbeParseMode, AGENT_SERVICE, RUNTIME_SERVICE, STORAGE_AGENT_SERVICE,
};
use crate::execution::CommandRunner;

const SERVICES: [&str; 3] = [AGENT_SERVICE, RUNTIME_SERVICE, STORAGE_AGENT_SERVICE];

/// Prints the `Active:` state word of unit `$s`
const STATE_QUERY: &str = "sudo systemctl status $s | grep Active | awk '{print $2}'";

/// States of the three probed units; empty means unknown/unreachable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceStates {
    pub agent: String,
    pub runtime: String,
    pub storage_agent: String,
}

impl ServiceStates {
    pub fn new(
        agent: impl Into<String>,
        runtime: impl Into<String>,
        storage_agent: impl Into<String>,
    ) -> Self {
        Self {
            agent: agent.into(),
            runtime: runtime.into(),
            storage_agent: storage_agent.into(),
        }
    }
}

/// Shell fragment executed on the node
pub fn remote_script(mode: ProbeParseMode) -> String {
    let prefix = match mode {
        ProbeParseMode::Labeled => "$s:",
        ProbeParseMode::Positional => "",
    };
    format!(
        "for s in {}; do echo \"{}$({})\"; done",
        SERVICES.join(" "),
        prefix,
        STATE_QUERY
    )
}

/// Parse `label:state` lines; unknown labels are ignored
pub fn parse_labeled(output: &str) -> ServiceStates {
    let mut states = ServiceStates::default();

    for line in output.lines().map(str::trim) {
        let Some((label, state)) = line.split_once(':') else {
            continue;
        };
        let slot = match label.trim() {
            AGENT_SERVICE => &mut states.agent,
            RUNTIME_SERVICE => &mut states.runtime,
            STORAGE_AGENT_SERVICE => &mut states.storage_agent,
            _ => continue,
        };
        *slot = state.trim().to_string();
    }

    states
}

/// Parse bare states at lines 0, 1 and 2
pub fn parse_positional(output: &str) -> ServiceStates {
    let mut lines = output.lines().map(|line| line.trim().to_string());
    ServiceStates {
        agent: lines.next().unwrap_or_default(),
        runtime: lines.next().unwrap_or_default(),
        storage_agent: lines.next().unwrap_or_default(),
    }
}

pub fn parse(mode: ProbeParseMode, output: &str) -> ServiceStates {
    match mode {
        ProbeParseMode::Labeled => parse_labeled(output),
        ProbeParseMode::Positional => parse_positional(output),
    }
}

/// Probes one node over ssh through a [`CommandRunner`]
pub struct NodeProbe<R: ?Sized> {
    user: String,
    ssh_options: Vec<String>,
    mode: ProbeParseMode,
    runner: std::sync::Arc<R>,
}

impl<R: CommandRunner + ?Sized> NodeProbe<R> {
    pub fn new(runner: std::sync::Arc<R>, config: &MonitorConfig) -> Self {
        Self {
            user: config.remote.user.clone(),
            ssh_options: config.remote.ssh_options.clone(),
            mode: config.probe.parse_mode,
            runner,
        }
    }

    /// ssh arguments for one node
    pub fn ssh_args(&self, address: &str) -> Vec<String> {
        let mut args = self.ssh_options.clone();
        args.push(format!("{}@{}", self.user, address));
        args.push(remote_script(self.mode));
        args
    }

    /// Query the three units; a channel error blanks all three fields
    pub async fn probe(&self, address: &str) -> ServiceStates {
        match self.runner.run("ssh", &self.ssh_args(address)).await {
            Ok(output) if output.success() => parse(self.mode, &output.stdout),
            Ok(output) => {
                debug!(
                    "Probe of {} exited with {:?}: {}",
                    address,
                    output.exit_code,
                    output.stderr.trim()
                );
                ServiceStates::default()
            }
            Err(e) => {
                debug!("Probe of {} failed: {}", address, e);
                ServiceStates::default()
            }
        }
    }
}
