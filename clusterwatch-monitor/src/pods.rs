//! In-memory pod snapshots and their differences

use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::config::MonitorConfig;
use crate::error::ExecError;
use crate::execution::CommandRunner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodEntry {
    pub namespace: String,
    pub name: String,
    pub ready: String,
    pub status: String,
}

/// Pod listing saved by the operator
#[derive(Debug, Clone)]
pub struct PodSnapshot {
    pub pods: Vec<PodEntry>,
    pub taken_at: DateTime<Local>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PodDiff {
    pub added: Vec<PodEntry>,
    pub removed: Vec<PodEntry>,
    /// (before, after)
    pub changed: Vec<(PodEntry, PodEntry)>,
}

/// Parse `kubectl get pods -A --no-headers`
pub fn parse_pods(text: &str) -> Vec<PodEntry> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            Some(PodEntry {
                namespace: fields.next()?.to_string(),
                name: fields.next()?.to_string(),
                ready: fields.next()?.to_string(),
                status: fields.next()?.to_string(),
            })
        })
        .collect()
}

pub async fn fetch_pods<R>(runner: &R, config: &MonitorConfig) -> Result<Vec<PodEntry>, ExecError>
where
    R: CommandRunner + ?Sized,
{
    let program = config.kubectl.binary.as_str();
    let args = ["get", "pods", "-A", "--no-headers"].map(String::from);
    let output = runner.run(program, &args).await?.into_success(program)?;
    Ok(parse_pods(&output.stdout))
}

fn keyed(pods: &[PodEntry]) -> BTreeMap<(&str, &str), &PodEntry> {
    pods.iter()
        .map(|p| ((p.namespace.as_str(), p.name.as_str()), p))
        .collect()
}

/// Compare by `namespace/name`; ready or status changes count as changed
pub fn diff(before: &[PodEntry], after: &[PodEntry]) -> PodDiff {
    let old = keyed(before);
    let new = keyed(after);
    let mut result = PodDiff::default();

    for (key, pod) in &new {
        match old.get(key) {
            None => result.added.push((*pod).clone()),
            Some(prev) if prev.ready != pod.ready || prev.status != pod.status => {
                result.changed.push(((*prev).clone(), (*pod).clone()));
            }
            Some(_) => {}
        }
    }
    for (key, pod) in &old {
        if !new.contains_key(key) {
            result.removed.push((*pod).clone());
        }
    }

    result
}

impl PodDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    pub fn render(&self) -> String {
        if self.is_empty() {
            return "No pod differences\n".to_string();
        }

        let mut out = String::new();
        for pod in &self.added {
            let _ = writeln!(out, "+ {}/{} {} {}", pod.namespace, pod.name, pod.ready, pod.status);
        }
        for pod in &self.removed {
            let _ = writeln!(out, "- {}/{} {} {}", pod.namespace, pod.name, pod.ready, pod.status);
        }
        for (before, after) in &self.changed {
            let _ = writeln!(
                out,
                "~ {}/{} {} {} -> {} {}",
                after.namespace, after.name, before.ready, before.status, after.ready, after.status
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BEFORE: &str = "\
kube-system   coredns-1   1/1   Running   0     40d
default       web-1       1/1   Running   2 (3d ago)   5d
default       job-1       0/1   Pending   0     1m
";
    const AFTER: &str = "\
kube-system   coredns-1   1/1   Running   0     40d
default       web-1       0/1   CrashLoopBackOff   3 (1m ago)   5d
default       web-2       1/1   Running   0     10s
";

    #[test]
    fn test_parse_pods() {
        let pods = parse_pods(BEFORE);
        assert_eq!(pods.len(), 3);
        assert_eq!(pods[1].name, "web-1");
        assert_eq!(pods[1].status, "Running");
        assert!(parse_pods("short line\n").is_empty());
    }

    #[test]
    fn test_diff() {
        let result = diff(&parse_pods(BEFORE), &parse_pods(AFTER));

        assert_eq!(result.added.len(), 1);
        assert_eq!(result.added[0].name, "web-2");
        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.removed[0].name, "job-1");
        assert_eq!(result.changed.len(), 1);
        assert_eq!(result.changed[0].1.status, "CrashLoopBackOff");

        let text = result.render();
        assert!(text.contains("+ default/web-2 1/1 Running"));
        assert!(text.contains("- default/job-1 0/1 Pending"));
        assert!(text.contains("~ default/web-1 1/1 Running -> 0/1 CrashLoopBackOff"));
    }

    #[test]
    fn test_identical_listings() {
        let pods = parse_pods(BEFORE);
        let result = diff(&pods, &pods);
        assert!(result.is_empty());
        assert_eq!(result.render(), "No pod differences\n");
    }
}
