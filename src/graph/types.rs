//
//  types.rs
//  Lineage
//
//  Created by hak (tharun)
//

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::link::{ColumnLink, Entry, EntryRef, LineageLink, ProcessRef};

/// Kind of node in the lineage graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A data asset (table, view, file set...).
    Asset,
    /// The process that moved data between two assets.
    Query,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Asset => write!(f, "asset"),
            NodeKind::Query => write!(f, "query"),
        }
    }
}

/// Which side of the root a node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Root,
    Upstream,
    Downstream,
}

impl Side {
    /// Side implied by a signed level.
    pub fn of_level(level: i32) -> Self {
        match level {
            0 => Side::Root,
            l if l < 0 => Side::Upstream,
            _ => Side::Downstream,
        }
    }

    /// Direction of level growth: -1 upstream, +1 downstream.
    pub fn step(self) -> i32 {
        match self {
            Side::Root => 0,
            Side::Upstream => -1,
            Side::Downstream => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Root => write!(f, "root"),
            Side::Upstream => write!(f, "upstream"),
            Side::Downstream => write!(f, "downstream"),
        }
    }
}

/// Edge between an asset and a query node, in data-flow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// asset -> query: the asset is read by the process.
    Input,
    /// query -> asset: the process writes the asset.
    Output,
}

/// Structured identity of a node. Two insertions with the same key are one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub kind: NodeKind,
    pub side: Side,
    pub level: i32,
    /// Asset FQN; for query nodes the process name (if any) plus both endpoint FQNs.
    pub fqn: String,
    /// Occurrence of this neighbour among the links of one response. Zero
    /// for the first, so repeated links get their own node pair.
    #[serde(default)]
    pub ordinal: usize,
}

impl NodeKey {
    pub fn asset(fqn: &str, level: i32) -> Self {
        Self {
            kind: NodeKind::Asset,
            side: Side::of_level(level),
            level,
            fqn: fqn.to_string(),
            ordinal: 0,
        }
    }

    pub fn query(
        source_fqn: &str,
        target_fqn: &str,
        process: Option<&ProcessRef>,
        level: i32,
    ) -> Self {
        let edge = format!("{} -> {}", source_fqn, target_fqn);
        let fqn = match process {
            Some(p) if !p.name.is_empty() => format!("{}|{}", p.name, edge),
            _ => edge,
        };
        Self {
            kind: NodeKind::Query,
            side: Side::of_level(level),
            level,
            fqn,
            ordinal: 0,
        }
    }

    /// The same key for the `ordinal`-th repeat of a link.
    pub fn nth(mut self, ordinal: usize) -> Self {
        self.ordinal = ordinal;
        self
    }

    /// Canonical string id. Repeats carry a `#<ordinal>` suffix.
    pub fn id(&self) -> String {
        let id = format!("{}:{}:{}:{}", self.kind, self.side, self.level, self.fqn);
        match self.ordinal {
            0 => id,
            n => format!("{}#{}", id, n),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// The payload a node was created from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawLink {
    Table(LineageLink),
    /// Column link as received, minus its nested children.
    Column(ColumnLink),
}

impl RawLink {
    pub fn process(&self) -> Option<&ProcessRef> {
        match self {
            RawLink::Table(link) => link.process.as_ref(),
            RawLink::Column(link) => link.process.as_ref(),
        }
    }
}

/// Lazily fetched full entry payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "entry", rename_all = "lowercase")]
pub enum EntryDetails {
    #[default]
    Pending,
    Loaded(Box<Entry>),
}

impl EntryDetails {
    pub fn is_loaded(&self) -> bool {
        matches!(self, EntryDetails::Loaded(_))
    }
}

/// Endpoints of a query node. Both ids resolve to asset nodes in the same graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryEndpoints {
    pub source_node_id: String,
    pub target_node_id: String,
}

/// A node of the lineage graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageNode {
    pub id: String,
    #[serde(skip)]
    pub(crate) key: Option<NodeKey>,
    pub kind: NodeKind,
    pub display_name: String,
    /// Set on asset nodes only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_link: Option<RawLink>,
    /// Set on query nodes only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<QueryEndpoints>,
    pub is_root: bool,
    pub level: i32,
    pub sequence: usize,
    pub upstream_expandable: bool,
    pub downstream_expandable: bool,
    pub upstream_fetched: bool,
    pub downstream_fetched: bool,
    pub entry_details: EntryDetails,
}

impl LineageNode {
    /// The anchor node. Its one-hop neighbourhood is part of every build.
    pub fn root(anchor: &EntryRef) -> Self {
        let key = NodeKey {
            kind: NodeKind::Asset,
            side: Side::Root,
            level: 0,
            fqn: anchor.fully_qualified_name.clone(),
            ordinal: 0,
        };
        Self {
            id: key.id(),
            key: Some(key),
            kind: NodeKind::Asset,
            display_name: anchor.display_name().to_string(),
            fully_qualified_name: Some(anchor.fully_qualified_name.clone()),
            raw_link: None,
            endpoints: None,
            is_root: true,
            level: 0,
            sequence: 0,
            upstream_expandable: false,
            downstream_expandable: false,
            upstream_fetched: true,
            downstream_fetched: true,
            entry_details: EntryDetails::Pending,
        }
    }

    /// A producer (negative level) or consumer (positive level) asset.
    ///
    /// Producers may have producers of their own and consumers may have
    /// consumers, so only the outward affordance is enabled.
    pub fn asset(entry: &EntryRef, level: i32, raw_link: RawLink) -> Self {
        let key = NodeKey::asset(&entry.fully_qualified_name, level);
        let side = key.side;
        Self {
            id: key.id(),
            key: Some(key),
            kind: NodeKind::Asset,
            display_name: entry.display_name().to_string(),
            fully_qualified_name: Some(entry.fully_qualified_name.clone()),
            raw_link: Some(raw_link),
            endpoints: None,
            is_root: false,
            level,
            sequence: 0,
            upstream_expandable: side == Side::Upstream,
            downstream_expandable: side == Side::Downstream,
            upstream_fetched: false,
            downstream_fetched: false,
            entry_details: EntryDetails::Pending,
        }
    }

    /// A process node between `source_node_id` and `target_node_id`.
    pub fn query(
        source: &EntryRef,
        target: &EntryRef,
        level: i32,
        source_node_id: String,
        target_node_id: String,
        raw_link: RawLink,
    ) -> Self {
        let process = raw_link.process().cloned();
        let key = NodeKey::query(
            &source.fully_qualified_name,
            &target.fully_qualified_name,
            process.as_ref(),
            level,
        );
        let display_name = process
            .as_ref()
            .and_then(|p| p.display_name.clone())
            .or_else(|| process.as_ref().map(|p| p.name.clone()))
            .unwrap_or_else(|| format!("{} -> {}", source.display_name(), target.display_name()));
        Self {
            id: key.id(),
            key: Some(key),
            kind: NodeKind::Query,
            display_name,
            fully_qualified_name: None,
            raw_link: Some(raw_link),
            endpoints: Some(QueryEndpoints {
                source_node_id,
                target_node_id,
            }),
            is_root: false,
            level,
            sequence: 0,
            upstream_expandable: false,
            downstream_expandable: false,
            upstream_fetched: false,
            downstream_fetched: false,
            entry_details: EntryDetails::Pending,
        }
    }

    /// Identity key. Nodes deserialized without one are keyed by their id.
    pub fn key(&self) -> NodeKey {
        self.key.clone().unwrap_or_else(|| NodeKey {
            kind: self.kind,
            side: Side::of_level(self.level),
            level: self.level,
            fqn: self.id.clone(),
            ordinal: 0,
        })
    }

    /// Re-key this node as the `ordinal`-th repeat of its link.
    pub(crate) fn with_ordinal(mut self, ordinal: usize) -> Self {
        if let Some(key) = self.key.take() {
            let key = key.nth(ordinal);
            self.id = key.id();
            self.key = Some(key);
        }
        self
    }

    pub fn is_asset(&self) -> bool {
        self.kind == NodeKind::Asset
    }

    pub fn process(&self) -> Option<&ProcessRef> {
        self.raw_link.as_ref().and_then(RawLink::process)
    }

    pub fn expandable(&self, side: Side) -> bool {
        match side {
            Side::Upstream => self.upstream_expandable,
            Side::Downstream => self.downstream_expandable,
            Side::Root => false,
        }
    }

    pub fn fetched(&self, side: Side) -> bool {
        match side {
            Side::Upstream => self.upstream_fetched,
            Side::Downstream => self.downstream_fetched,
            Side::Root => true,
        }
    }

    pub(crate) fn set_expandable(&mut self, side: Side, value: bool) {
        match side {
            Side::Upstream => self.upstream_expandable = value,
            Side::Downstream => self.downstream_expandable = value,
            Side::Root => {}
        }
    }

    pub(crate) fn mark_fetched(&mut self, side: Side) {
        match side {
            Side::Upstream => self.upstream_fetched = true,
            Side::Downstream => self.downstream_fetched = true,
            Side::Root => {}
        }
    }

    /// Column-view nodes are fully resolved: no affordances, both sides fetched.
    pub(crate) fn freeze(&mut self) {
        self.upstream_expandable = false;
        self.downstream_expandable = false;
        self.upstream_fetched = true;
        self.downstream_fetched = true;
    }
}

/// Summary statistics about a lineage graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub asset_count: usize,
    pub query_count: usize,
    pub edge_count: usize,
    pub min_level: i32,
    pub max_level: i32,
}

impl GraphStats {
    pub fn total_nodes(&self) -> usize {
        self.asset_count + self.query_count
    }
}
