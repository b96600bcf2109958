//! Fan-out collector
//!
//! Launches one probe task per inventory entry, fans the finished records
//! back into a mutex-guarded result set and only reads that set once every
//! task has been joined. The result is sorted by node name; when a name
//! appears twice in the inventory the earlier entry wins, whatever order
//! the probes finish in.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::execution::CommandRunner;
use crate::inventory::InventoryEntry;
use crate::models::NodeRecord;
use crate::probe::NodeProbe;
use crate::state::new_state;

pub struct FanOutCollector<R: ?Sized> {
    probe: Arc<NodeProbe<R>>,
}

impl<R: ?Sized> Clone for FanOutCollector<R> {
    fn clone(&self) -> Self {
        Self {
            probe: Arc::clone(&self.probe),
        }
    }
}

impl<R> FanOutCollector<R>
where
    R: CommandRunner + ?Sized + 'static,
{
    pub fn new(probe: NodeProbe<R>) -> Self {
        Self {
            probe: Arc::new(probe),
        }
    }

    /// Probe every entry concurrently and return complete records sorted by name
    pub async fn collect(&self, entries: Vec<InventoryEntry>) -> Vec<NodeRecord> {
        let launched = entries.len();
        let results = new_state(Vec::<(usize, NodeRecord)>::with_capacity(launched));

        let handles: Vec<_> = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let probe = Arc::clone(&self.probe);
                let results = Arc::clone(&results);
                tokio::spawn(async move {
                    let states = probe.probe(&entry.address).await;
                    let record = NodeRecord {
                        name: entry.name,
                        readiness: entry.status,
                        agent_state: states.agent,
                        runtime_state: states.runtime,
                        storage_agent_state: states.storage_agent,
                    };
                    results.lock().push((index, record));
                })
            })
            .collect();

        // Nothing is read from the result set before every writer is done.
        for outcome in join_all(handles).await {
            if let Err(e) = outcome {
                error!("Probe task failed: {}", e);
            }
        }

        let mut tagged = std::mem::take(&mut *results.lock());
        tagged.sort_by(|(ia, a), (ib, b)| a.name.cmp(&b.name).then(ia.cmp(ib)));

        let before = tagged.len();
        tagged.dedup_by(|(_, later), (_, earlier)| later.name == earlier.name);
        if tagged.len() != before {
            warn!("Dropped {} duplicate node names", before - tagged.len());
        }

        let records: Vec<NodeRecord> = tagged.into_iter().map(|(_, record)| record).collect();

        debug!("Collected {}/{} node records", records.len(), launched);
        records
    }
}
