//
//  session.rs
//  Lineage
//
//  Created by hak (tharun)
//

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::LineageConfig;
use crate::error::{LineageError, Result};
use crate::fetcher::{LineageLinkFetcher, ProcessDetails};
use crate::graph::{
    self, build_initial, check_expandable, splice_expansion, EntryDetails, GraphModel, NodeKind,
    Side,
};
use crate::link::{EntryRef, LineageDirection, LinkPair};
use crate::rows::{to_rows, RowProjection};

/// One committed state of the session graph.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Increases by one on every commit.
    pub version: u64,
    /// Anchor generation the graph belongs to.
    pub generation: u64,
    pub graph: Arc<GraphModel>,
    pub committed_at: DateTime<Utc>,
}

/// Transient, non-blocking notifications for whoever renders the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LineageSignal {
    /// A collaborator call failed; the operation left the graph unchanged.
    TransportFailed {
        operation: String,
        message: String,
        at: DateTime<Utc>,
    },
    /// A result arrived for an anchor that is no longer current.
    StaleResultDiscarded {
        operation: String,
        generation: u64,
        at: DateTime<Utc>,
    },
    RowSkipped {
        fqn: String,
        reason: String,
        at: DateTime<Utc>,
    },
    Committed {
        version: u64,
        nodes: usize,
        at: DateTime<Utc>,
    },
}

/// Owner of the lineage graph of one anchor at a time.
///
/// Mutations run one at a time through an async queue. Each reads the
/// current snapshot, fetches, derives a new graph from a copy and commits it
/// with a version check. Changing the anchor bumps the generation first, so
/// results still in flight for the old anchor are dropped when they land.
pub struct LineageSession {
    id: Uuid,
    fetcher: Arc<dyn LineageLinkFetcher>,
    config: LineageConfig,
    state: RwLock<Snapshot>,
    queue: Mutex<()>,
    generation: AtomicU64,
    signals: broadcast::Sender<LineageSignal>,
}

impl LineageSession {
    /// Fetch the one-hop neighbourhood of `anchor` and build the first snapshot.
    ///
    /// A transport failure yields a root-only graph.
    pub async fn open(
        fetcher: Arc<dyn LineageLinkFetcher>,
        config: LineageConfig,
        anchor: EntryRef,
    ) -> Result<Self> {
        let (signals, _) = broadcast::channel(64);
        let id = Uuid::new_v4();
        let scope = config.fetch.parent_scope.clone();

        let fetched = match tokio::time::timeout(
            config.fetch.timeout(),
            fetcher.search(&scope, &anchor.fully_qualified_name),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(LineageError::Timeout(config.fetch.timeout_ms)),
        };
        let links = match fetched {
            Ok(links) => links,
            Err(e) if e.is_transport() => {
                warn!(session = %id, error = %e, "initial lineage fetch failed");
                LinkPair::default()
            }
            Err(e) => return Err(e),
        };

        let graph = build_initial(&anchor, &links);
        info!(
            session = %id,
            anchor = %anchor.fully_qualified_name,
            nodes = graph.len(),
            "opened lineage session"
        );

        Ok(Self {
            id,
            fetcher,
            config,
            state: RwLock::new(Snapshot {
                version: 0,
                generation: 0,
                graph: Arc::new(graph),
                committed_at: Utc::now(),
            }),
            queue: Mutex::new(()),
            generation: AtomicU64::new(0),
            signals,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &LineageConfig {
        &self.config
    }

    /// Current anchor generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn current(&self) -> Snapshot {
        self.state.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LineageSignal> {
        self.signals.subscribe()
    }

    // ─── Mutations ──────────────────────────────────────────────

    /// Grow the graph one hop upstream of an asset node.
    pub async fn expand_upstream(&self, node_id: &str) -> Result<Snapshot> {
        self.expand(node_id, Side::Upstream).await
    }

    /// Grow the graph one hop downstream of an asset node.
    pub async fn expand_downstream(&self, node_id: &str) -> Result<Snapshot> {
        self.expand(node_id, Side::Downstream).await
    }

    async fn expand(&self, node_id: &str, side: Side) -> Result<Snapshot> {
        let generation = self.generation();
        let _turn = self.queue.lock().await;
        if !self.is_current("expand", generation) {
            return Ok(self.current().await);
        }
        let base = self.current().await;

        let node = check_expandable(&base.graph, node_id, side)?;
        let fqn = node
            .fully_qualified_name
            .clone()
            .ok_or_else(|| LineageError::NotAnAsset(node_id.to_string()))?;

        let search = self.fetcher.search(&self.config.fetch.parent_scope, &fqn);
        let Some(pair) = self.fetch_for("expand", generation, search).await? else {
            return Ok(self.current().await);
        };
        let links = match side {
            Side::Upstream => pair.target_links,
            Side::Root | Side::Downstream => pair.source_links,
        };

        let next = splice_expansion(&base.graph, node_id, side, &links)?;
        self.commit_at(base.version, generation, next).await
    }

    /// Replace the graph with the column-scoped view of the anchor.
    ///
    /// `direction` defaults to the configured column direction.
    pub async fn project_columns(
        &self,
        column: Option<&str>,
        direction: Option<LineageDirection>,
    ) -> Result<Snapshot> {
        let direction = direction.unwrap_or(self.config.graph.column_direction);
        let generation = self.generation();
        let _turn = self.queue.lock().await;
        if !self.is_current("column lineage", generation) {
            return Ok(self.current().await);
        }
        let base = self.current().await;

        let anchor = base.graph.anchor().fully_qualified_name.clone();
        let search =
            self.fetcher
                .search_columns(&self.config.fetch.parent_scope, &anchor, direction);
        let Some(response) = self.fetch_for("column lineage", generation, search).await? else {
            return Ok(self.current().await);
        };

        let next = graph::project_columns(&base.graph, &response, column, direction);
        self.commit_at(base.version, generation, next).await
    }

    /// Rebuild the one-hop baseline from the retained raw links. No fetch.
    pub async fn reset(&self) -> Result<Snapshot> {
        let generation = self.generation();
        let _turn = self.queue.lock().await;
        if !self.is_current("reset", generation) {
            return Ok(self.current().await);
        }
        let base = self.current().await;
        let baseline = graph::reset(
            base.graph.anchor(),
            base.graph.raw_upstream_links(),
            base.graph.raw_downstream_links(),
        );
        self.commit_at(base.version, generation, baseline).await
    }

    /// Switch to a new anchor entry.
    ///
    /// Requests queued or in flight for the previous anchor are discarded
    /// when they complete. A transport failure yields a root-only graph for
    /// the new anchor.
    pub async fn change_anchor(&self, anchor: EntryRef) -> Result<Snapshot> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            session = %self.id,
            anchor = %anchor.fully_qualified_name,
            generation,
            "changing anchor"
        );

        let _turn = self.queue.lock().await;
        if !self.is_current("change anchor", generation) {
            return Ok(self.current().await);
        }
        let base = self.current().await;

        let search = self
            .fetcher
            .search(&self.config.fetch.parent_scope, &anchor.fully_qualified_name);
        let links = match self.fetch(search).await {
            Ok(links) => links,
            Err(e) if e.is_transport() => {
                self.transport_failed("change anchor", &e);
                LinkPair::default()
            }
            Err(e) => return Err(e),
        };
        if !self.is_current("change anchor", generation) {
            return Ok(self.current().await);
        }

        let next = build_initial(&anchor, &links);
        self.commit_at(base.version, generation, next).await
    }

    /// Fetch the full entry of an asset node and store it on the node.
    pub async fn load_entry_details(&self, node_id: &str) -> Result<Snapshot> {
        let generation = self.generation();
        let _turn = self.queue.lock().await;
        if !self.is_current("entry details", generation) {
            return Ok(self.current().await);
        }
        let base = self.current().await;

        let node = base
            .graph
            .node(node_id)
            .ok_or_else(|| LineageError::NodeNotFound(node_id.to_string()))?;
        let fqn = match (&node.fully_qualified_name, node.is_asset()) {
            (Some(fqn), true) => fqn.clone(),
            _ => return Err(LineageError::NotAnAsset(node_id.to_string())),
        };
        if node.entry_details.is_loaded() {
            return Ok(base);
        }

        let lookup = self.fetcher.lookup_entry(&fqn);
        let Some(entry) = self.fetch_for("entry details", generation, lookup).await? else {
            return Ok(self.current().await);
        };

        let mut next = GraphModel::clone(&base.graph);
        if let Some(node) = next.node_mut(node_id) {
            node.entry_details = EntryDetails::Loaded(Box::new(entry));
        }
        self.commit_at(base.version, generation, next).await
    }

    /// Commit a graph derived from `base`.
    ///
    /// Fails with [`LineageError::AnchorChanged`] when the anchor has moved
    /// on since `base`, and with [`LineageError::StaleSnapshot`] when another
    /// commit landed since `base` was read.
    pub async fn commit(&self, base: &Snapshot, graph: GraphModel) -> Result<Snapshot> {
        if base.generation != self.generation() {
            return Err(LineageError::AnchorChanged(
                base.graph.anchor().fully_qualified_name.clone(),
            ));
        }
        let _turn = self.queue.lock().await;
        self.commit_at(base.version, base.generation, graph).await
    }

    // ─── Reads ──────────────────────────────────────────────────

    /// Job metadata of a query node's process.
    ///
    /// Returns `None` when the process service could not be reached.
    pub async fn inspect_query(&self, node_id: &str) -> Result<Option<ProcessDetails>> {
        let snapshot = self.current().await;
        let node = snapshot
            .graph
            .node(node_id)
            .ok_or_else(|| LineageError::NodeNotFound(node_id.to_string()))?;
        let process = match (node.kind, node.process()) {
            (NodeKind::Query, Some(process)) => process.name.clone(),
            _ => return Err(LineageError::NoProcess(node_id.to_string())),
        };

        match self.fetch(self.fetcher.process_details(&process)).await {
            Ok(details) => Ok(Some(details)),
            Err(e) if e.is_transport() => {
                self.transport_failed("inspect query", &e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Tabular view of the anchor's raw links.
    pub async fn rows(&self) -> RowProjection {
        let snapshot = self.current().await;
        let graph = &snapshot.graph;
        let projection = to_rows(
            graph.anchor(),
            graph.raw_downstream_links(),
            graph.raw_upstream_links(),
        );
        for skipped in &projection.skipped {
            self.signal(LineageSignal::RowSkipped {
                fqn: skipped.fqn.clone(),
                reason: skipped.reason.clone(),
                at: Utc::now(),
            });
        }
        projection
    }

    // ─── Internal Helpers ───────────────────────────────────────

    async fn commit_at(
        &self,
        base_version: u64,
        generation: u64,
        graph: GraphModel,
    ) -> Result<Snapshot> {
        graph.validate()?;
        let mut state = self.state.write().await;
        if state.version != base_version {
            warn!(
                session = %self.id,
                base = base_version,
                current = state.version,
                "rejected stale commit"
            );
            return Err(LineageError::StaleSnapshot {
                base: base_version,
                current: state.version,
            });
        }

        *state = Snapshot {
            version: base_version + 1,
            generation,
            graph: Arc::new(graph),
            committed_at: Utc::now(),
        };
        debug!(
            session = %self.id,
            version = state.version,
            nodes = state.graph.len(),
            "committed snapshot"
        );
        self.signal(LineageSignal::Committed {
            version: state.version,
            nodes: state.graph.len(),
            at: state.committed_at,
        });
        Ok(state.clone())
    }

    async fn fetch<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.config.fetch.timeout(), call).await {
            Ok(result) => result,
            Err(_) => Err(LineageError::Timeout(self.config.fetch.timeout_ms)),
        }
    }

    /// Run a fetch on behalf of `generation`.
    ///
    /// `Ok(None)` means the result must not be applied: the call failed at
    /// the transport level or the anchor changed meanwhile.
    async fn fetch_for<T>(
        &self,
        operation: &str,
        generation: u64,
        call: impl Future<Output = Result<T>>,
    ) -> Result<Option<T>> {
        let value = match self.fetch(call).await {
            Ok(value) => value,
            Err(e) if e.is_transport() => {
                self.transport_failed(operation, &e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if !self.is_current(operation, generation) {
            return Ok(None);
        }
        Ok(Some(value))
    }

    fn is_current(&self, operation: &str, generation: u64) -> bool {
        let current = self.generation();
        if current == generation {
            return true;
        }
        info!(
            session = %self.id,
            operation,
            generation,
            current,
            "discarding result for previous anchor"
        );
        self.signal(LineageSignal::StaleResultDiscarded {
            operation: operation.to_string(),
            generation,
            at: Utc::now(),
        });
        false
    }

    fn transport_failed(&self, operation: &str, error: &LineageError) {
        warn!(session = %self.id, operation, error = %error, "lineage fetch failed");
        self.signal(LineageSignal::TransportFailed {
            operation: operation.to_string(),
            message: error.to_string(),
            at: Utc::now(),
        });
    }

    fn signal(&self, signal: LineageSignal) {
        // No receivers is fine.
        let _ = self.signals.send(signal);
    }
}
