/*!
Builders for kubectl and probe output in the exact shapes clusterwatch parses
*/

use clusterwatch::InventoryEntry;

/// `kubectl get nodes -o wide` table for the given nodes
pub fn nodes_wide(nodes: &[InventoryEntry]) -> String {
    let mut out = format!(
        "{:<20} {:<10} {:<15} {:<5} {:<9} {:<15} {:<13} {}\n",
        "NAME", "STATUS", "ROLES", "AGE", "VERSION", "INTERNAL-IP", "EXTERNAL-IP", "OS-IMAGE"
    );
    for node in nodes {
        out.push_str(&format!(
            "{:<20} {:<10} {:<15} {:<5} {:<9} {:<15} {:<13} {}\n",
            node.name, node.status, "<none>", "12d", "v1.28.2", node.address, "<none>", "Ubuntu"
        ));
    }
    out
}

/// `count` nodes named `node-000`.. with distinct addresses, all Ready
pub fn ready_nodes(count: usize) -> Vec<InventoryEntry> {
    (0..count)
        .map(|i| InventoryEntry::new(format!("node-{:03}", i), "Ready", node_address(i)))
        .collect()
}

pub fn node_address(index: usize) -> String {
    format!("10.{}.{}.{}", 20 + index / 65536, (index / 256) % 256, index % 256)
}

/// Probe output in labeled mode
pub fn labeled_probe(agent: &str, runtime: &str, storage_agent: &str) -> String {
    format!("kubelet:{}\ncontainerd:{}\nscini:{}\n", agent, runtime, storage_agent)
}

/// Probe output in positional mode
pub fn positional_probe(agent: &str, runtime: &str, storage_agent: &str) -> String {
    format!("{}\n{}\n{}\n", agent, runtime, storage_agent)
}

/// `kubectl get deployment -n <ns> <name>` output
pub fn deployment(name: &str, ready: &str, up_to_date: &str) -> String {
    format!(
        "NAME           READY   UP-TO-DATE   AVAILABLE   AGE\n{:<14} {:<7} {:<12} {:<11} 40d\n",
        name, ready, up_to_date, up_to_date
    )
}

/// `kubectl get pods -A --no-headers` output: (namespace, name, ready, status)
pub fn pods(entries: &[(&str, &str, &str, &str)]) -> String {
    entries
        .iter()
        .map(|(ns, name, ready, status)| format!("{} {} {} {} 0 1d\n", ns, name, ready, status))
        .collect()
}
