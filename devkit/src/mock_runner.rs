/*!
Scripted command runner for development without a cluster

Stands in for kubectl and ssh: answers node inventory, per-node probes,
deployment, pod and storage class queries from scripted replies, with
optional per-call delays. Every call is recorded, and probe concurrency
is tracked so tests can assert on fan-out behaviour.
*/

use async_trait::async_trait;
use clusterwatch::{CommandOutput, CommandRunner, ExecError};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How a scripted command answers
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Exit 0 with this stdout
    Stdout(String),
    /// Non-zero exit with this stderr
    Exit(i32, String),
    /// The channel gives up (`ExecError::Timeout`)
    Timeout,
}

impl MockReply {
    pub fn stdout<S: Into<String>>(text: S) -> Self {
        MockReply::Stdout(text.into())
    }

    fn resolve(&self, program: &str) -> Result<CommandOutput, ExecError> {
        match self {
            MockReply::Stdout(text) => Ok(CommandOutput::ok(text.clone())),
            MockReply::Exit(code, stderr) => Ok(CommandOutput {
                stdout: String::new(),
                stderr: stderr.clone(),
                exit_code: Some(*code),
            }),
            MockReply::Timeout => Err(ExecError::Timeout {
                program: program.to_string(),
                secs: 0,
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct Scripted {
    reply: MockReply,
    delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Default)]
struct MockState {
    /// Consumed front to back; the last reply sticks
    inventory: VecDeque<MockReply>,
    hosts: HashMap<String, Scripted>,
    deployments: HashMap<String, MockReply>,
    pods: Option<MockReply>,
    storage_classes: Option<MockReply>,
    calls: Vec<RecordedCall>,
    probes_in_flight: usize,
    max_probes_in_flight: usize,
    probes_completed: usize,
}

/// Mock runner implementing [`CommandRunner`]
#[derive(Clone, Default)]
pub struct MockRunner {
    state: Arc<Mutex<MockState>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply for `kubectl get nodes -o wide`, replacing any queued ones
    pub fn set_inventory(&self, reply: MockReply) -> &Self {
        let mut state = self.state.lock().unwrap();
        state.inventory.clear();
        state.inventory.push_back(reply);
        self
    }

    /// Queue successive inventory replies, one per call
    pub fn queue_inventory(&self, reply: MockReply) -> &Self {
        self.state.lock().unwrap().inventory.push_back(reply);
        self
    }

    /// Probe reply for the node at `address`
    pub fn set_host(&self, address: &str, reply: MockReply) -> &Self {
        self.set_host_delayed(address, reply, Duration::ZERO)
    }

    /// Probe reply delivered after `delay`
    pub fn set_host_delayed(&self, address: &str, reply: MockReply, delay: Duration) -> &Self {
        self.state
            .lock()
            .unwrap()
            .hosts
            .insert(address.to_string(), Scripted { reply, delay });
        self
    }

    pub fn set_deployment(&self, name: &str, reply: MockReply) -> &Self {
        self.state
            .lock()
            .unwrap()
            .deployments
            .insert(name.to_string(), reply);
        self
    }

    pub fn set_pods(&self, reply: MockReply) -> &Self {
        self.state.lock().unwrap().pods = Some(reply);
        self
    }

    pub fn set_storage_classes(&self, reply: MockReply) -> &Self {
        self.state.lock().unwrap().storage_classes = Some(reply);
        self
    }

    /// All calls received so far (for test assertions)
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls made with `program`
    pub fn calls_to(&self, program: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.program == program)
            .collect()
    }

    pub fn probes_completed(&self) -> usize {
        self.state.lock().unwrap().probes_completed
    }

    pub fn probes_in_flight(&self) -> usize {
        self.state.lock().unwrap().probes_in_flight
    }

    /// Highest number of probes observed running at the same time
    pub fn max_probes_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_probes_in_flight
    }

    fn kubectl_reply(&self, args: &[String]) -> Option<MockReply> {
        let mut state = self.state.lock().unwrap();
        match args.get(1).map(String::as_str) {
            Some("nodes") => {
                if state.inventory.len() > 1 {
                    state.inventory.pop_front()
                } else {
                    state.inventory.front().cloned()
                }
            }
            Some("deployment") => args
                .last()
                .and_then(|name| state.deployments.get(name).cloned()),
            Some("pods") => state.pods.clone(),
            Some("storageclass") => state.storage_classes.clone(),
            _ => None,
        }
    }

    async fn probe(&self, args: &[String]) -> Result<CommandOutput, ExecError> {
        let address = args
            .iter()
            .find_map(|arg| arg.split_once('@').map(|(_, host)| host.to_string()))
            .unwrap_or_default();

        let scripted = {
            let mut state = self.state.lock().unwrap();
            state.probes_in_flight += 1;
            state.max_probes_in_flight = state.max_probes_in_flight.max(state.probes_in_flight);
            state.hosts.get(&address).cloned()
        };

        let result = match scripted {
            Some(scripted) => {
                if !scripted.delay.is_zero() {
                    tokio::time::sleep(scripted.delay).await;
                }
                scripted.reply.resolve("ssh")
            }
            None => Err(unreachable_host(&address)),
        };

        let mut state = self.state.lock().unwrap();
        state.probes_in_flight -= 1;
        state.probes_completed += 1;
        log::debug!("[MOCK] probe {} -> ok={}", address, result.is_ok());
        result
    }
}

fn unreachable_host(address: &str) -> ExecError {
    ExecError::Spawn {
        program: "ssh".to_string(),
        source: std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            format!("no scripted host {}", address),
        ),
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        self.state.lock().unwrap().calls.push(RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
        });

        if program == "ssh" {
            return self.probe(args).await;
        }

        match self.kubectl_reply(args) {
            Some(reply) => {
                log::debug!("[MOCK] {} {:?}", program, args);
                reply.resolve(program)
            }
            None => Err(ExecError::Spawn {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no scripted reply"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_inventory_queue_last_reply_sticks() {
        let runner = MockRunner::new();
        runner
            .queue_inventory(MockReply::Exit(1, "connection refused".into()))
            .queue_inventory(MockReply::stdout("NAME STATUS\n"));

        let get_nodes = args(&["get", "nodes", "-o", "wide"]);
        assert!(!runner.run("kubectl", &get_nodes).await.unwrap().success());
        assert!(runner.run("kubectl", &get_nodes).await.unwrap().success());
        assert!(runner.run("kubectl", &get_nodes).await.unwrap().success());
        assert_eq!(runner.calls_to("kubectl").len(), 3);
    }

    #[tokio::test]
    async fn test_probe_routing_by_address() {
        let runner = MockRunner::new();
        runner
            .set_host("10.0.0.1", MockReply::stdout("kubelet:active\n"))
            .set_host("10.0.0.2", MockReply::Timeout);

        let first = runner
            .run("ssh", &args(&["-o", "BatchMode=yes", "ops@10.0.0.1", "script"]))
            .await
            .unwrap();
        assert_eq!(first.stdout, "kubelet:active\n");

        let second = runner.run("ssh", &args(&["ops@10.0.0.2", "script"])).await;
        assert!(matches!(second, Err(ExecError::Timeout { .. })));

        let unknown = runner.run("ssh", &args(&["ops@10.0.0.3", "script"])).await;
        assert!(matches!(unknown, Err(ExecError::Spawn { .. })));

        assert_eq!(runner.probes_completed(), 3);
        assert_eq!(runner.probes_in_flight(), 0);
    }

    #[tokio::test]
    async fn test_unscripted_kubectl_fails() {
        let runner = MockRunner::new();
        let result = runner.run("kubectl", &args(&["get", "pods", "-A"])).await;
        assert!(result.is_err());
    }
}
