//! Refresh loop
//!
//! Runs one cycle (inventory -> fan-out probes -> summary -> render) per
//! timer tick. Cycles are issued sequentially and never overlap. The
//! shutdown signal is only consulted between cycles: a cycle that already
//! started always finishes its probes.

use anyhow::{Context, Result};
use chrono::Local;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::collector::FanOutCollector;
use crate::config::{MonitorConfig, REFRESH_PERIOD, TRACKED_DEPLOYMENTS};
use crate::execution::CommandRunner;
use crate::inventory::fetch_inventory;
use crate::models::ClusterSnapshot;
use crate::probe::NodeProbe;
use crate::render::{render_dashboard, Screen};
use crate::summary::{dashboard_rows, fetch_deployment, summarize};

pub struct RefreshLoop<R: ?Sized> {
    runner: Arc<R>,
    config: Arc<MonitorConfig>,
    collector: FanOutCollector<R>,
}

impl<R> RefreshLoop<R>
where
    R: CommandRunner + ?Sized + 'static,
{
    pub fn new(runner: Arc<R>, config: Arc<MonitorConfig>) -> Self {
        let collector = FanOutCollector::new(NodeProbe::new(Arc::clone(&runner), &config));
        Self {
            runner,
            config,
            collector,
        }
    }

    /// One full inventory -> probe -> deployment pass
    pub async fn run_cycle(&self) -> Result<ClusterSnapshot> {
        let entries = fetch_inventory(&*self.runner, &self.config)
            .await
            .context("Failed to fetch node inventory")?;

        let nodes = self.collector.collect(entries).await;

        let [(first_ns, first_name), (second_ns, second_name)] = TRACKED_DEPLOYMENTS;
        let (first, second) = tokio::join!(
            fetch_deployment(&*self.runner, &self.config, first_ns, first_name),
            fetch_deployment(&*self.runner, &self.config, second_ns, second_name)
        );

        Ok(ClusterSnapshot {
            nodes,
            deployments: [first, second],
            collected_at: Local::now(),
        })
    }

    pub fn render(&self, snapshot: &ClusterSnapshot) -> String {
        let counts = summarize(&snapshot.nodes, &self.config.health);
        render_dashboard(&dashboard_rows(snapshot, &counts), snapshot.collected_at)
    }

    /// Tick every [`REFRESH_PERIOD`] until shutdown; returns rendered cycle count
    pub async fn run<S: Screen>(
        &self,
        screen: &mut S,
        mut shutdown: watch::Receiver<bool>,
    ) -> usize {
        let mut ticker = interval(REFRESH_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut rendered = 0;

        info!("Refresh loop started (period: {:?})", REFRESH_PERIOD);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!("Shutdown sender dropped");
                        break;
                    }
                    continue;
                }
            }

            screen.clear();
            match self.run_cycle().await {
                Ok(snapshot) => {
                    screen.show(&self.render(&snapshot));
                    rendered += 1;
                    debug!("Rendered cycle with {} nodes", snapshot.nodes.len());
                }
                Err(e) => warn!("Skipping refresh: {:#}", e),
            }
        }

        info!("Refresh loop stopped after {} rendered cycles", rendered);
        rendered
    }
}

/// Raise the shutdown signal, wait for the in-flight cycle, then clear the
/// screen. Returns the number of rendered cycles.
pub async fn shutdown<S: Screen>(
    signal: &watch::Sender<bool>,
    refresh: JoinHandle<usize>,
    screen: &mut S,
) -> Result<usize> {
    signal.send_replace(true);
    let cycles = refresh.await.context("Refresh loop task failed")?;
    screen.clear();
    info!("Refresh loop joined after {} cycles", cycles);
    Ok(cycles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::stub::StubRunner;

    const NODES: &str = "\
NAME   STATUS   ROLES    AGE   VERSION   INTERNAL-IP
b      Ready    <none>   1d    v1.28     10.9.0.2
a      Ready    <none>   1d    v1.28     10.9.0.1
";
    const HEALTHY: &str = "kubelet:active\ncontainerd:active\nscini:active\n";

    #[derive(Default)]
    struct Frames {
        clears: usize,
        shown: Vec<String>,
    }

    impl Screen for Frames {
        fn clear(&mut self) {
            self.clears += 1;
        }

        fn show(&mut self, text: &str) {
            self.shown.push(text.to_string());
        }
    }

    fn refresh(runner: StubRunner) -> RefreshLoop<StubRunner> {
        RefreshLoop::new(Arc::new(runner), Arc::new(MonitorConfig::default()))
    }

    #[tokio::test]
    async fn test_run_cycle_builds_snapshot() {
        let runner = StubRunner::new()
            .respond("nodes", NODES)
            .respond("10.9.0.1", HEALTHY)
            .respond("10.9.0.2", "kubelet:active\n")
            .respond("coredns", "NAME READY UP-TO-DATE\ncoredns 2/2 2\n");

        let refresh = refresh(runner);
        let snapshot = refresh.run_cycle().await.unwrap();

        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.nodes[0].name, "a");
        assert_eq!(snapshot.deployments[0].as_ref().unwrap().ready, "2/2");
        assert!(snapshot.deployments[1].is_none());

        let text = refresh.render(&snapshot);
        assert!(text.contains("containerd           1/2             1/2"));
    }

    #[tokio::test]
    async fn test_run_cycle_inventory_failure() {
        let refresh = refresh(StubRunner::new().exit("nodes", 1));
        let err = refresh.run_cycle().await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to fetch node inventory"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_between_cycles() {
        let refresh = refresh(
            StubRunner::new()
                .respond("nodes", NODES)
                .respond("10.9.0.1", HEALTHY)
                .respond("10.9.0.2", HEALTHY),
        );
        let (tx, rx) = watch::channel(false);
        let mut frames = Frames::default();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(REFRESH_PERIOD * 2 + REFRESH_PERIOD / 2).await;
            tx.send(true).unwrap();
            tx
        });

        let rendered = refresh.run(&mut frames, rx).await;
        let _tx = stopper.await.unwrap();

        // ticks at 0s, 5s and 10s; shutdown at 12.5s
        assert_eq!(rendered, 3);
        assert_eq!(frames.clears, 3);
        assert_eq!(frames.shown.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_inventory_renders_nothing() {
        let refresh = refresh(StubRunner::new().exit("nodes", 1));
        let (tx, rx) = watch::channel(false);
        let mut frames = Frames::default();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(REFRESH_PERIOD + REFRESH_PERIOD / 2).await;
            tx.send(true).unwrap();
            tx
        });

        let rendered = refresh.run(&mut frames, rx).await;
        let _tx = stopper.await.unwrap();

        assert_eq!(rendered, 0);
        assert_eq!(frames.clears, 2);
        assert!(frames.shown.is_empty());
    }

    #[tokio::test]
    async fn test_already_cancelled_runs_no_cycle() {
        let refresh = refresh(StubRunner::new());
        let (_tx, rx) = watch::channel(true);
        let mut frames = Frames::default();

        assert_eq!(refresh.run(&mut frames, rx).await, 0);
        assert_eq!(frames.clears, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_cycle_then_clears() {
        let refresh = refresh(
            StubRunner::new()
                .respond("nodes", NODES)
                .respond("10.9.0.1", HEALTHY)
                .respond("10.9.0.2", HEALTHY),
        );
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut frames = Frames::default();
            refresh.run(&mut frames, rx).await
        });

        tokio::time::sleep(REFRESH_PERIOD / 2).await;
        let mut screen = Frames::default();
        let cycles = shutdown(&tx, handle, &mut screen).await.unwrap();

        assert_eq!(cycles, 1);
        assert!(*tx.borrow());
        assert_eq!(screen.clears, 1);
        assert!(screen.shown.is_empty());
    }
}
