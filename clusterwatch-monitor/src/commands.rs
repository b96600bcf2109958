//! Interactive command loop
//!
//! Reads one operator line at a time and dispatches the single-character
//! commands of the dashboard menu. Only `q` touches the refresh loop, by
//! raising the shared shutdown signal.

use chrono::Local;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::collector::FanOutCollector;
use crate::config::MonitorConfig;
use crate::execution::CommandRunner;
use crate::inventory::fetch_inventory;
use crate::pods::{diff, fetch_pods, PodSnapshot};
use crate::probe::NodeProbe;
use crate::render::{render_node_table, Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NodeList,
    SavePods,
    DiffPods,
    StorageClass,
    Quit,
}

impl Command {
    /// Whitespace-trimmed single character; anything else is not a command
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "n" => Some(Self::NodeList),
            "s" => Some(Self::SavePods),
            "v" => Some(Self::DiffPods),
            "c" => Some(Self::StorageClass),
            "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Why the command loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    InputClosed,
}

pub struct CommandLoop<R: ?Sized> {
    runner: Arc<R>,
    config: Arc<MonitorConfig>,
    collector: FanOutCollector<R>,
    last_pods: Option<PodSnapshot>,
}

impl<R> CommandLoop<R>
where
    R: CommandRunner + ?Sized + 'static,
{
    pub fn new(runner: Arc<R>, config: Arc<MonitorConfig>) -> Self {
        let collector = FanOutCollector::new(NodeProbe::new(Arc::clone(&runner), &config));
        Self {
            runner,
            config,
            collector,
            last_pods: None,
        }
    }

    /// Read commands until `q` or end of input
    pub async fn run<I, S>(
        &mut self,
        input: I,
        screen: &mut S,
        shutdown: &watch::Sender<bool>,
    ) -> Exit
    where
        I: AsyncBufRead + Unpin,
        S: Screen,
    {
        let mut lines = input.lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Command input closed");
                    return Exit::InputClosed;
                }
                Err(e) => {
                    warn!("Failed to read command: {}", e);
                    return Exit::InputClosed;
                }
            };

            match Command::parse(&line) {
                Some(Command::Quit) => {
                    info!("Shutdown requested");
                    shutdown.send_replace(true);
                    return Exit::Quit;
                }
                Some(command) => {
                    let text = self.execute(command).await;
                    screen.show(&text);
                }
                None if line.trim().is_empty() => {}
                None => debug!("Ignoring unknown command {:?}", line.trim()),
            }
        }
    }

    /// Run a non-quit command and return what to display
    pub async fn execute(&mut self, command: Command) -> String {
        match command {
            Command::NodeList => self.node_list().await,
            Command::SavePods => self.save_pods().await,
            Command::DiffPods => self.diff_pods().await,
            Command::StorageClass => self.storage_classes().await,
            Command::Quit => String::new(),
        }
    }

    async fn node_list(&self) -> String {
        match fetch_inventory(&*self.runner, &self.config).await {
            Ok(entries) => render_node_table(&self.collector.collect(entries).await),
            Err(e) => format!("Failed to fetch node inventory: {}\n", e),
        }
    }

    async fn save_pods(&mut self) -> String {
        match fetch_pods(&*self.runner, &self.config).await {
            Ok(pods) => {
                let snapshot = PodSnapshot {
                    pods,
                    taken_at: Local::now(),
                };
                let text = format!(
                    "Saved {} pods at {}\n",
                    snapshot.pods.len(),
                    snapshot.taken_at.format("%H:%M:%S")
                );
                self.last_pods = Some(snapshot);
                text
            }
            Err(e) => format!("Failed to list pods: {}\n", e),
        }
    }

    async fn diff_pods(&self) -> String {
        let Some(saved) = &self.last_pods else {
            return "No pod snapshot saved yet (press s)\n".to_string();
        };

        match fetch_pods(&*self.runner, &self.config).await {
            Ok(current) => format!(
                "Changes since {}:\n{}",
                saved.taken_at.format("%H:%M:%S"),
                diff(&saved.pods, &current).render()
            ),
            Err(e) => format!("Failed to list pods: {}\n", e),
        }
    }

    async fn storage_classes(&self) -> String {
        let program = self.config.kubectl.binary.as_str();
        let args = ["get", "storageclass"].map(String::from);

        match self.runner.run(program, &args).await.and_then(|o| o.into_success(program)) {
            Ok(output) => output.stdout,
            Err(e) => format!("Failed to list storage classes: {}\n", e),
        }
    }
}
