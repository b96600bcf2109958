//! Clusterwatch - terminal dashboard for cluster node health
//!
//! Polls the cluster node inventory every five seconds, probes each node's
//! kubelet, containerd and scini units concurrently over ssh, and renders a
//! ready/not-ready summary while an interactive command loop runs alongside:
//! - Fan-out/fan-in node probing with deterministic ordering
//! - Summary tallies plus tracked deployment status
//! - Refresh and command loops joined by a single shutdown signal

pub mod collector;
pub mod commands;
pub mod config;
pub mod error;
pub mod execution;
pub mod inventory;
pub mod models;
pub mod pods;
pub mod probe;
pub mod refresh;
pub mod render;
pub mod state;
pub mod summary;

pub use collector::FanOutCollector;
pub use commands::{Command, CommandLoop, Exit};
pub use config::{MonitorConfig, ProbeParseMode};
pub use error::{ConfigError, ExecError};
pub use execution::{CommandOutput, CommandRunner, ProcessRunner};
pub use inventory::InventoryEntry;
pub use models::{ClusterSnapshot, DeploymentStatus, NodeRecord};
pub use probe::{NodeProbe, ServiceStates};
pub use refresh::RefreshLoop;
pub use render::{Screen, Terminal};
pub use summary::{summarize, SummaryCounts, Tally};
