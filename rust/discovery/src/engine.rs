//! The discovery engine: a hop loop over a pending set with a bounded
//! worker pool, a join barrier per hop, and cooperative cancellation.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use netwatch_core::models::{DiscoveryRun, RunStatus, TopologyEdge, TopologyNode};
use netwatch_core::sink::{ProgressSink, ProgressUpdate};
use netwatch_core::snmp::ManagementClient;
use netwatch_core::store::DiscoveryStore;
use netwatch_core::{Error, Result};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::neighbors::{l2_neighbors, l3_neighbors};
use crate::probe::probe_device;
use crate::spec::{DiscoverySpec, SeedTarget};
use crate::sweep::LivenessScanner;

/// Handle to a started run. Cancellation through the handle is
/// cooperative: the engine observes it at the next checkpoint.
#[derive(Clone)]
pub struct RunHandle {
    pub id: Uuid,
    cancel: Arc<AtomicBool>,
}

impl RunHandle {
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

/// Accumulates nodes and edges during a run, keyed by identity so the
/// working set never holds duplicates.
#[derive(Default)]
struct TopologyAccumulator {
    nodes: Vec<TopologyNode>,
    node_index: HashMap<String, usize>,
    edges: Vec<TopologyEdge>,
    edge_keys: HashSet<(String, String)>,
}

impl TopologyAccumulator {
    fn add_node(&mut self, node: TopologyNode) {
        match self.node_index.get(&node.id) {
            Some(&slot) => {
                // A detailed probe result upgrades an earlier minimal
                // stub; otherwise first seen wins.
                let existing = &mut self.nodes[slot];
                if existing.is_minimal() && !node.is_minimal() {
                    let hop = existing.hop.min(node.hop);
                    *existing = node;
                    existing.hop = hop;
                }
            }
            None => {
                self.node_index.insert(node.id.clone(), self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    fn add_edge(&mut self, edge: TopologyEdge) {
        if edge.a == edge.b {
            return;
        }
        if self.edge_keys.insert(edge.key()) {
            self.edges.push(edge);
        }
    }

    fn nodes(&self) -> Vec<TopologyNode> {
        self.nodes.clone()
    }

    fn edges(&self) -> Vec<TopologyEdge> {
        self.edges.clone()
    }
}

/// First-seen-wins deduplication of nodes (by identity) and edges (by
/// unordered endpoint pair).
pub fn finalize(
    nodes: Vec<TopologyNode>,
    edges: Vec<TopologyEdge>,
) -> (Vec<TopologyNode>, Vec<TopologyEdge>) {
    let mut seen_nodes = HashSet::new();
    let mut out_nodes = Vec::with_capacity(nodes.len());
    for node in nodes {
        if seen_nodes.insert(node.id.clone()) {
            out_nodes.push(node);
        }
    }

    let mut seen_edges = HashSet::new();
    let mut out_edges = Vec::with_capacity(edges.len());
    for edge in edges {
        if edge.a != edge.b && seen_edges.insert(edge.key()) {
            out_edges.push(edge);
        }
    }
    (out_nodes, out_edges)
}

fn percent_for(hop: u32, max_hops: u32) -> u8 {
    let span = 80 * hop / max_hops.max(1);
    (10 + span).min(95) as u8
}

pub struct DiscoveryEngine<S, C> {
    store: Arc<S>,
    client: Arc<C>,
    scanner: Arc<dyn LivenessScanner>,
    progress: Arc<dyn ProgressSink>,
    cancel_flags: Mutex<HashMap<Uuid, Arc<AtomicBool>>>,
}

impl<S, C> DiscoveryEngine<S, C>
where
    S: DiscoveryStore,
    C: ManagementClient + 'static,
{
    pub fn new(
        store: Arc<S>,
        client: Arc<C>,
        scanner: Arc<dyn LivenessScanner>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            store,
            client,
            scanner,
            progress,
            cancel_flags: Mutex::new(HashMap::new()),
        }
    }

    /// Validates the spec and registers a new PENDING run.
    pub async fn start(&self, spec: &DiscoverySpec) -> Result<RunHandle> {
        spec.validate()?;
        let run = DiscoveryRun::new();
        let handle = RunHandle {
            id: run.id,
            cancel: Arc::new(AtomicBool::new(false)),
        };
        self.store.create_run(run).await?;
        self.cancel_flags
            .lock()
            .insert(handle.id, handle.cancel.clone());
        Ok(handle)
    }

    /// Requests cancellation by run id: flips the stored status right
    /// away and raises the flag the hop loop checks. Probes already in
    /// flight are allowed to finish.
    pub async fn cancel(&self, run_id: Uuid) -> Result<()> {
        let flag = self
            .cancel_flags
            .lock()
            .get(&run_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("discovery run {run_id}")))?;
        flag.store(true, Ordering::SeqCst);

        if let Some(mut run) = self.store.run(run_id).await? {
            if !run.status.is_terminal() {
                run.status = RunStatus::Cancelled;
                run.finished_at = Some(Utc::now());
                self.store.update_run(run).await?;
            }
        }
        Ok(())
    }

    /// Executes a started run until hop exhaustion, pending-set
    /// exhaustion, or cancellation.
    pub async fn execute(&self, handle: &RunHandle, spec: &DiscoverySpec) -> Result<DiscoveryRun> {
        let run_id = handle.id;
        let mut run = self
            .store
            .run(run_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("discovery run {run_id}")))?;
        run.status = RunStatus::InProgress;
        if !self.persist(&run).await? {
            return Ok(run);
        }

        let mut topology = TopologyAccumulator::default();
        let mut pending: Vec<IpAddr> = Vec::new();
        let mut processed: HashSet<IpAddr> = HashSet::new();

        self.publish(run_id, 5, "seeding", None, &topology);
        match (&spec.seed, spec.methods.liveness_sweep) {
            (SeedTarget::Range(_), true) => {
                let targets = spec
                    .seed_addresses()
                    .into_iter()
                    .map(|address| spec.target_for(address))
                    .collect();
                let live = self.scanner.sweep(targets, spec.concurrency).await;
                info!(%run_id, live = live.len(), "liveness sweep complete");
                for address in &live {
                    topology.add_node(TopologyNode::minimal(*address, 0));
                }
                pending.extend(live);
            }
            _ => pending.extend(spec.seed_addresses()),
        }
        run.nodes = topology.nodes();
        run.edges = topology.edges();
        if !self.persist(&run).await? {
            return Ok(run);
        }

        let pool = Arc::new(Semaphore::new(spec.concurrency.max(1)));
        for hop in 1..=spec.max_hops {
            if handle.is_cancelled() {
                info!(%run_id, hop, "cancellation observed before hop start");
                break;
            }
            let batch: Vec<IpAddr> = pending
                .drain(..)
                .filter(|address| !processed.contains(address))
                .collect();
            if batch.is_empty() {
                break;
            }
            debug!(%run_id, hop, batch = batch.len(), "starting hop");

            let mut tasks = Vec::with_capacity(batch.len());
            for address in batch {
                // Checkpoint inside the batch loop: stop scheduling
                // further probes once cancellation is requested.
                if handle.is_cancelled() {
                    break;
                }
                processed.insert(address);
                self.publish(
                    run_id,
                    percent_for(hop, spec.max_hops),
                    "probing",
                    Some(address.to_string()),
                    &topology,
                );

                let Ok(permit) = pool.clone().acquire_owned().await else {
                    break;
                };
                let client = self.client.clone();
                let target = spec.target_for(address);
                let methods = spec.methods;
                let walk_max = spec.walk_max_entries;
                tasks.push(tokio::spawn(async move {
                    let _permit = permit;
                    let node = if methods.snmp_probe {
                        probe_device(client.as_ref(), &target, hop).await
                    } else {
                        TopologyNode::minimal(target.address, hop)
                    };

                    let mut found = Vec::new();
                    if node.class.expands_neighbors() {
                        if methods.l3_neighbors {
                            found.extend(l3_neighbors(client.as_ref(), &target, walk_max).await);
                        }
                        if methods.l2_neighbors {
                            found.extend(l2_neighbors(client.as_ref(), &target, walk_max).await);
                        }
                    }
                    (node, found)
                }));
            }

            // Hop barrier: every probe of this batch completes before
            // the next hop is scheduled.
            for joined in join_all(tasks).await {
                match joined {
                    Ok((node, found)) => {
                        let node_id = node.id.clone();
                        topology.add_node(node);
                        for neighbor in found {
                            let stub = TopologyNode::minimal(neighbor.address, hop);
                            let stub_id = stub.id.clone();
                            topology.add_node(stub);
                            topology.add_edge(TopologyEdge::new(
                                node_id.clone(),
                                stub_id,
                                neighbor.relation,
                            ));
                            if !processed.contains(&neighbor.address) {
                                pending.push(neighbor.address);
                            }
                        }
                    }
                    Err(e) => {
                        warn!(%run_id, error = %e, "probe task failed");
                        run.warnings.push(format!("probe task failed: {e}"));
                    }
                }
            }
            pending.sort();
            pending.dedup();

            run.hops_completed = hop;
            run.progress_percent = percent_for(hop, spec.max_hops);
            run.nodes = topology.nodes();
            run.edges = topology.edges();
            if !self.persist(&run).await? {
                if let Some(stored) = self.store.run(run_id).await? {
                    run = stored;
                }
                return Ok(run);
            }
            self.publish(run_id, run.progress_percent, "hop-complete", None, &topology);
        }

        let (nodes, edges) = finalize(topology.nodes(), topology.edges());
        run.nodes = nodes;
        run.edges = edges;
        run.finished_at = Some(Utc::now());

        if handle.is_cancelled() {
            run.status = RunStatus::Cancelled;
            self.persist(&run).await?;
            self.publish(run_id, run.progress_percent, "cancelled", None, &topology);
            return Ok(run);
        }

        run.status = RunStatus::Complete;
        run.progress_percent = 100;
        self.persist(&run).await?;
        self.publish(run_id, 100, "complete", None, &topology);
        Ok(run)
    }

    /// Stores the run unless it already reached a terminal state
    /// elsewhere (a concurrent cancel). Returns whether the write
    /// landed.
    async fn persist(&self, run: &DiscoveryRun) -> Result<bool> {
        match self.store.update_run(run.clone()).await {
            Ok(()) => Ok(true),
            Err(Error::TerminalRun(_)) => {
                debug!(run_id = %run.id, "run reached a terminal state elsewhere");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn publish(
        &self,
        run_id: Uuid,
        percent: u8,
        stage: &str,
        current_target: Option<String>,
        topology: &TopologyAccumulator,
    ) {
        self.progress.publish(ProgressUpdate {
            run_id,
            percent,
            stage: stage.to_string(),
            current_target,
            nodes_found: topology.nodes.len(),
            edges_found: topology.edges.len(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netwatch_core::models::{DeviceClass, EdgeRelation};

    fn node(id: &str) -> TopologyNode {
        TopologyNode {
            id: id.into(),
            address: id.parse().ok(),
            mac: None,
            hostname: None,
            sys_descr: None,
            sys_object_id: None,
            class: DeviceClass::Unknown,
            reachable: true,
            hop: 1,
        }
    }

    #[test]
    fn finalize_keeps_first_seen_node() {
        let mut detailed = node("10.0.0.1");
        detailed.hostname = Some("first".into());
        let mut later = node("10.0.0.1");
        later.hostname = Some("second".into());

        let (nodes, _) = finalize(vec![detailed, later, node("10.0.0.2")], Vec::new());
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].hostname.as_deref(), Some("first"));
    }

    #[test]
    fn finalize_collapses_bidirectional_edges() {
        let edges = vec![
            TopologyEdge::new("10.0.0.1", "10.0.0.2", EdgeRelation::Arp),
            TopologyEdge::new("10.0.0.2", "10.0.0.1", EdgeRelation::Arp),
            TopologyEdge::new("10.0.0.1", "10.0.0.1", EdgeRelation::Arp),
        ];
        let (_, edges) = finalize(Vec::new(), edges);
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn accumulator_upgrades_minimal_stubs() {
        let mut topology = TopologyAccumulator::default();
        topology.add_node(TopologyNode::minimal("10.0.0.1".parse().unwrap(), 2));

        let mut detailed = node("10.0.0.1");
        detailed.hostname = Some("edge".into());
        detailed.hop = 3;
        topology.add_node(detailed);

        let nodes = topology.nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].hostname.as_deref(), Some("edge"));
        // the stub's earlier hop is kept
        assert_eq!(nodes[0].hop, 2);
    }

    #[test]
    fn progress_percent_is_monotonic_and_bounded() {
        assert_eq!(percent_for(1, 4), 30);
        assert_eq!(percent_for(4, 4), 90);
        assert!(percent_for(10, 1) <= 95);
    }
}
