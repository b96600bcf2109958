/*!
Test harness for clusterwatch

Wires a [`MockRunner`] and a [`RecordingScreen`] into the refresh and
command loops, and provides the assertions shared by scenario tests.
*/

use crate::fixtures;
use crate::mock_runner::{MockReply, MockRunner};
use anyhow::Result;
use clusterwatch::{CommandLoop, InventoryEntry, MonitorConfig, NodeRecord, RefreshLoop, Screen};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// One `show` call, stamped with the (possibly paused) tokio clock
#[derive(Debug, Clone)]
pub struct Frame {
    pub at: Instant,
    pub text: String,
}

#[derive(Default)]
struct ScreenLog {
    clears: Vec<Instant>,
    frames: Vec<Frame>,
}

/// Screen that records instead of drawing; clones share the same log
#[derive(Clone, Default)]
pub struct RecordingScreen {
    log: Arc<Mutex<ScreenLog>>,
}

impl RecordingScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.log.lock().unwrap().frames.clone()
    }

    pub fn clear_count(&self) -> usize {
        self.log.lock().unwrap().clears.len()
    }

    /// When each `clear` happened
    pub fn clears(&self) -> Vec<Instant> {
        self.log.lock().unwrap().clears.clone()
    }

    pub fn last_frame(&self) -> Option<String> {
        self.log.lock().unwrap().frames.last().map(|f| f.text.clone())
    }
}

impl Screen for RecordingScreen {
    fn clear(&mut self) {
        self.log.lock().unwrap().clears.push(Instant::now());
    }

    fn show(&mut self, text: &str) {
        self.log.lock().unwrap().frames.push(Frame {
            at: Instant::now(),
            text: text.to_string(),
        });
    }
}

/// Complete clusterwatch environment backed by mocks
pub struct TestHarness {
    pub runner: MockRunner,
    pub config: Arc<MonitorConfig>,
    pub screen: RecordingScreen,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(MonitorConfig::default())
    }

    pub fn with_config(config: MonitorConfig) -> Self {
        env_logger::try_init().ok();

        Self {
            runner: MockRunner::new(),
            config: Arc::new(config),
            screen: RecordingScreen::new(),
        }
    }

    pub fn refresh_loop(&self) -> RefreshLoop<MockRunner> {
        RefreshLoop::new(Arc::new(self.runner.clone()), Arc::clone(&self.config))
    }

    pub fn command_loop(&self) -> CommandLoop<MockRunner> {
        CommandLoop::new(Arc::new(self.runner.clone()), Arc::clone(&self.config))
    }

    /// Script the inventory and a labeled probe reply for each node
    pub fn script_nodes(&self, nodes: &[InventoryEntry], probe_output: &str) -> &Self {
        self.runner
            .set_inventory(MockReply::stdout(fixtures::nodes_wide(nodes)));
        for node in nodes {
            self.runner
                .set_host(&node.address, MockReply::stdout(probe_output));
        }
        log::info!("Scripted {} nodes", nodes.len());
        self
    }

    /// Both tracked deployments report fully available
    pub fn script_deployments(&self) -> &Self {
        self.runner
            .set_deployment(
                "coredns",
                MockReply::stdout(fixtures::deployment("coredns", "2/2", "2")),
            )
            .set_deployment(
                "ks-apiserver",
                MockReply::stdout(fixtures::deployment("ks-apiserver", "1/1", "1")),
            );
        self
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Records are sorted by name and names are unique
pub fn assert_sorted_unique(records: &[NodeRecord]) -> Result<()> {
    for pair in records.windows(2) {
        if pair[0].name >= pair[1].name {
            anyhow::bail!(
                "records not strictly ordered: {:?} before {:?}",
                pair[0].name,
                pair[1].name
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_screen_shares_log() {
        let screen = RecordingScreen::new();
        let mut writer = screen.clone();

        writer.clear();
        writer.show("frame 1");

        assert_eq!(screen.clear_count(), 1);
        assert_eq!(screen.last_frame().as_deref(), Some("frame 1"));
    }

    #[test]
    fn test_assert_sorted_unique() {
        let record = |name: &str| NodeRecord {
            name: name.to_string(),
            ..NodeRecord::default()
        };

        assert!(assert_sorted_unique(&[record("a"), record("b")]).is_ok());
        assert!(assert_sorted_unique(&[record("b"), record("a")]).is_err());
        assert!(assert_sorted_unique(&[record("a"), record("a")]).is_err());
        assert!(assert_sorted_unique(&[]).is_ok());
    }

    #[tokio::test]
    async fn test_harness_single_cycle() {
        let harness = TestHarness::new();
        let healthy = fixtures::labeled_probe("active", "active", "active");
        harness
            .script_nodes(&fixtures::ready_nodes(2), &healthy)
            .script_deployments();

        let snapshot = harness.refresh_loop().run_cycle().await.unwrap();

        assert_eq!(snapshot.nodes.len(), 2);
        assert!(snapshot.deployments.iter().all(Option::is_some));
        assert_eq!(harness.runner.calls_to("ssh").len(), 2);
    }
}
