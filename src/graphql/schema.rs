//
//  schema.rs
//  Lineage
//
//  Created by hak (tharun)
//

use async_graphql::SimpleObject;

use crate::graph::{LineageNode, NodeKind};
use crate::rows::LineageRow;
use crate::session::Snapshot;

/// A committed lineage graph.
#[derive(SimpleObject)]
pub struct Graph {
    pub version: i64,
    pub generation: i64,
    pub anchor: String,
    pub committed_at: String,
    /// Nodes in layout order, furthest upstream first.
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// An asset or a query (process) node.
#[derive(SimpleObject)]
pub struct Node {
    pub id: String,
    pub kind: String,
    pub display_name: String,
    pub fully_qualified_name: Option<String>,
    pub level: i32,
    pub sequence: i64,
    pub is_root: bool,
    pub upstream_expandable: bool,
    pub downstream_expandable: bool,
    pub upstream_fetched: bool,
    pub downstream_fetched: bool,
    pub entry_loaded: bool,
    /// Process resource name, for query nodes that have one.
    pub process: Option<String>,
    pub source_node_id: Option<String>,
    pub target_node_id: Option<String>,
}

/// Data-flow edge between an asset and a query node.
#[derive(SimpleObject)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

#[derive(SimpleObject)]
pub struct Stats {
    pub version: i64,
    pub assets: i64,
    pub queries: i64,
    pub edges: i64,
    pub min_level: i32,
    pub max_level: i32,
}

#[derive(SimpleObject)]
pub struct Row {
    pub source_system: String,
    pub source_project: String,
    pub source: String,
    pub source_fqn: String,
    pub target_system: String,
    pub target_project: String,
    pub target: String,
    pub target_fqn: String,
}

/// Counters as GraphQL integers, clamped at `i64::MAX`.
fn saturating_int<N: TryInto<i64>>(n: N) -> i64 {
    n.try_into().unwrap_or(i64::MAX)
}

impl From<&LineageNode> for Node {
    fn from(node: &LineageNode) -> Self {
        let endpoints = node.endpoints.as_ref();
        Self {
            id: node.id.clone(),
            kind: node.kind.to_string(),
            display_name: node.display_name.clone(),
            fully_qualified_name: node.fully_qualified_name.clone(),
            level: node.level,
            sequence: saturating_int(node.sequence),
            is_root: node.is_root,
            upstream_expandable: node.upstream_expandable,
            downstream_expandable: node.downstream_expandable,
            upstream_fetched: node.upstream_fetched,
            downstream_fetched: node.downstream_fetched,
            entry_loaded: node.entry_details.is_loaded(),
            process: node.process().map(|p| p.name.clone()),
            source_node_id: endpoints.map(|e| e.source_node_id.clone()),
            target_node_id: endpoints.map(|e| e.target_node_id.clone()),
        }
    }
}

impl From<&Snapshot> for Graph {
    fn from(snapshot: &Snapshot) -> Self {
        let graph = &snapshot.graph;
        let nodes: Vec<Node> = graph.nodes().map(Node::from).collect();
        let edges = graph
            .nodes()
            .filter(|n| n.kind == NodeKind::Query)
            .filter_map(|q| q.endpoints.as_ref().map(|e| (q, e)))
            .flat_map(|(q, e)| {
                [
                    Edge {
                        source: e.source_node_id.clone(),
                        target: q.id.clone(),
                    },
                    Edge {
                        source: q.id.clone(),
                        target: e.target_node_id.clone(),
                    },
                ]
            })
            .collect();
        Self {
            version: saturating_int(snapshot.version),
            generation: saturating_int(snapshot.generation),
            anchor: graph.anchor().fully_qualified_name.clone(),
            committed_at: snapshot.committed_at.to_rfc3339(),
            nodes,
            edges,
        }
    }
}

impl From<&Snapshot> for Stats {
    fn from(snapshot: &Snapshot) -> Self {
        let s = snapshot.graph.stats();
        Self {
            version: saturating_int(snapshot.version),
            assets: saturating_int(s.asset_count),
            queries: saturating_int(s.query_count),
            edges: saturating_int(s.edge_count),
            min_level: s.min_level,
            max_level: s.max_level,
        }
    }
}

impl From<LineageRow> for Row {
    fn from(row: LineageRow) -> Self {
        Self {
            source_system: row.source_system,
            source_project: row.source_project,
            source: row.source,
            source_fqn: row.source_fqn,
            target_system: row.target_system,
            target_project: row.target_project,
            target: row.target,
            target_fqn: row.target_fqn,
        }
    }
}
