//! Node inventory from `kubectl get nodes -o wide`

use tracing::{debug, trace};

use crate::config::MonitorConfig;
use crate::error::ExecError;
use crate::execution::CommandRunner;

/// Minimum whitespace fields of a wide listing line (INTERNAL-IP is the 6th)
const WIDE_MIN_FIELDS: usize = 6;
const ADDRESS_FIELD: usize = 5;

/// One node as reported by the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    pub name: String,
    pub status: String,
    pub address: String,
}

impl InventoryEntry {
    pub fn new(
        name: impl Into<String>,
        status: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            address: address.into(),
        }
    }
}

/// Parse a wide node listing, skipping the header and short lines
pub fn parse_inventory(text: &str) -> Vec<InventoryEntry> {
    text.lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < WIDE_MIN_FIELDS {
                if !line.trim().is_empty() {
                    trace!("Skipping short inventory line: {:?}", line);
                }
                return None;
            }
            Some(InventoryEntry::new(fields[0], fields[1], fields[ADDRESS_FIELD]))
        })
        .collect()
}

/// Run the inventory command; any failure aborts the whole cycle
pub async fn fetch_inventory<R>(
    runner: &R,
    config: &MonitorConfig,
) -> Result<Vec<InventoryEntry>, ExecError>
where
    R: CommandRunner + ?Sized,
{
    let program = config.kubectl.binary.as_str();
    let args = ["get", "nodes", "-o", "wide"].map(String::from);

    let output = runner.run(program, &args).await?.into_success(program)?;
    let entries = parse_inventory(&output.stdout);
    debug!("Inventory returned {} nodes", entries.len());
    Ok(entries)
}
