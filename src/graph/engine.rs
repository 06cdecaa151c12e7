//
//  engine.rs
//  Lineage
//
//  Created by hak (tharun)
//

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use super::types::*;
use crate::link::{EntryRef, LineageLink};

/// Where freshly inserted nodes go in the ordered node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Before every existing node (upstream growth).
    Prepend,
    /// After every existing node (downstream growth).
    Append,
}

impl Placement {
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Upstream => Placement::Prepend,
            Side::Root | Side::Downstream => Placement::Append,
        }
    }
}

/// One asset -> process -> asset step to attach to an existing asset node.
#[derive(Debug, Clone)]
pub(crate) struct Hop<'a> {
    /// Which way the hop grows away from the node it is attached to.
    pub side: Side,
    /// Level of the new asset; the query sits one step back toward the root.
    pub asset_level: i32,
    pub source: &'a EntryRef,
    pub target: &'a EntryRef,
    pub raw: RawLink,
    /// Repeat count of the neighbour within one response.
    pub ordinal: usize,
}

impl<'a> Hop<'a> {
    /// A table-level hop from a node at `from_level`.
    pub fn table(side: Side, from_level: i32, link: &'a LineageLink) -> Self {
        Self {
            side,
            asset_level: from_level + 2 * side.step(),
            source: &link.source,
            target: &link.target,
            raw: RawLink::Table(link.clone()),
            ordinal: 0,
        }
    }

    pub fn with_ordinal(mut self, ordinal: usize) -> Self {
        self.ordinal = ordinal;
        self
    }

    fn neighbour(&self) -> &'a EntryRef {
        match self.side {
            Side::Upstream => self.source,
            Side::Root | Side::Downstream => self.target,
        }
    }
}

/// Result of attaching a hop.
#[derive(Debug, Clone)]
pub(crate) struct Attached {
    /// The neighbour asset (new or deduplicated).
    pub asset: NodeIndex,
    /// Nodes actually inserted, in hop order (left to right).
    pub fresh: Vec<NodeIndex>,
}

/// The lineage graph for one anchor entry.
///
/// Nodes live in a petgraph `DiGraph` with data-flow edges
/// (asset -> query -> asset). `order` is the layout order of the nodes,
/// left (furthest upstream) to right (furthest downstream). The raw link
/// lists of the anchor are retained so the baseline can be rebuilt offline.
#[derive(Debug, Clone)]
pub struct GraphModel {
    pub(crate) graph: DiGraph<LineageNode, EdgeKind>,
    /// Index: node id -> node index.
    pub(crate) id_index: HashMap<String, NodeIndex>,
    /// Index: structured key -> node index (dedup lookup).
    pub(crate) key_index: HashMap<NodeKey, NodeIndex>,
    /// Index: level -> number of nodes at that level (for sequence numbers).
    level_counts: HashMap<i32, usize>,
    pub(crate) order: Vec<NodeIndex>,
    pub(crate) root: NodeIndex,
    anchor: EntryRef,
    raw_upstream_links: Vec<LineageLink>,
    raw_downstream_links: Vec<LineageLink>,
}

impl GraphModel {
    /// Create a graph holding only the root node for `anchor`.
    pub fn new(
        anchor: EntryRef,
        raw_upstream_links: Vec<LineageLink>,
        raw_downstream_links: Vec<LineageLink>,
    ) -> Self {
        let mut model = Self {
            graph: DiGraph::new(),
            id_index: HashMap::new(),
            key_index: HashMap::new(),
            level_counts: HashMap::new(),
            order: Vec::new(),
            root: NodeIndex::new(0),
            raw_upstream_links,
            raw_downstream_links,
            anchor: anchor.clone(),
        };
        let (root, _) = model.insert(LineageNode::root(&anchor));
        model.root = root;
        model.order.push(root);
        model
    }

    pub fn anchor(&self) -> &EntryRef {
        &self.anchor
    }

    pub fn root_id(&self) -> &str {
        &self.graph[self.root].id
    }

    pub fn root(&self) -> &LineageNode {
        &self.graph[self.root]
    }

    /// Upstream producer links of the anchor (`targetLinks` on the wire).
    pub fn raw_upstream_links(&self) -> &[LineageLink] {
        &self.raw_upstream_links
    }

    /// Downstream consumer links of the anchor (`sourceLinks` on the wire).
    pub fn raw_downstream_links(&self) -> &[LineageLink] {
        &self.raw_downstream_links
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// A graph always holds its root.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // ─── Node Operations ────────────────────────────────────────

    /// Insert a node unless a node with the same key exists.
    ///
    /// Returns the node index and whether it was inserted. The node is not
    /// placed in the layout order; see [`GraphModel::place`].
    pub(crate) fn insert(&mut self, mut node: LineageNode) -> (NodeIndex, bool) {
        let key = node.key();
        if let Some(&idx) = self.key_index.get(&key) {
            return (idx, false);
        }
        let count = self.level_counts.entry(node.level).or_insert(0);
        node.sequence = *count;
        *count += 1;

        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        self.key_index.insert(key, idx);
        (idx, true)
    }

    /// Put freshly inserted nodes into the layout order.
    pub(crate) fn place(&mut self, fresh: Vec<NodeIndex>, placement: Placement) {
        match placement {
            Placement::Prepend => {
                self.order.splice(0..0, fresh);
            }
            Placement::Append => self.order.extend(fresh),
        }
    }

    /// Attach one hop to the asset at `from`.
    ///
    /// Creates (or reuses) the neighbour asset and the query node between
    /// them, wiring data-flow edges for a newly created query.
    pub(crate) fn attach_hop(&mut self, from: NodeIndex, hop: Hop<'_>) -> Attached {
        let neighbour = hop.neighbour();
        let step = hop.side.step();
        let asset_node =
            LineageNode::asset(neighbour, hop.asset_level, hop.raw.clone()).with_ordinal(hop.ordinal);
        let (asset, asset_new) = self.insert(asset_node);

        let from_id = self.graph[from].id.clone();
        let asset_id = self.graph[asset].id.clone();
        let (source_idx, target_idx, source_id, target_id) = match hop.side {
            Side::Upstream => (asset, from, asset_id, from_id),
            Side::Root | Side::Downstream => (from, asset, from_id, asset_id),
        };

        let query_node = LineageNode::query(
            hop.source,
            hop.target,
            hop.asset_level - step,
            source_id,
            target_id,
            hop.raw,
        )
        .with_ordinal(hop.ordinal);
        let (query, query_new) = self.insert(query_node);
        if query_new {
            self.graph.add_edge(source_idx, query, EdgeKind::Input);
            self.graph.add_edge(query, target_idx, EdgeKind::Output);
        }

        let mut fresh = Vec::with_capacity(2);
        match hop.side {
            Side::Upstream => {
                if asset_new {
                    fresh.push(asset);
                }
                if query_new {
                    fresh.push(query);
                }
            }
            Side::Root | Side::Downstream => {
                if query_new {
                    fresh.push(query);
                }
                if asset_new {
                    fresh.push(asset);
                }
            }
        }
        Attached { asset, fresh }
    }

    /// Attach every link of one response to the asset at `from`.
    ///
    /// Each link gets its own asset and query: a neighbour repeated within
    /// `links` is numbered by occurrence. Attaching the same response again
    /// reproduces the same keys and adds nothing.
    pub(crate) fn attach_links(
        &mut self,
        from: NodeIndex,
        side: Side,
        links: &[LineageLink],
    ) -> Vec<NodeIndex> {
        let from_level = self.graph[from].level;
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut fresh = Vec::with_capacity(links.len() * 2);
        for link in links {
            let hop = Hop::table(side, from_level, link);
            let count = seen
                .entry(hop.neighbour().fully_qualified_name.as_str())
                .or_insert(0);
            let hop = hop.with_ordinal(*count);
            *count += 1;
            fresh.extend(self.attach_hop(from, hop).fresh);
        }
        fresh
    }

    // ─── Internal Helpers ───────────────────────────────────────

    pub(crate) fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.id_index.get(id).copied()
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut LineageNode> {
        let idx = self.index_of(id)?;
        self.graph.node_weight_mut(idx)
    }
}

/// Two graphs are equal when they describe the same anchor, raw links and
/// ordered node list. Edges are derived from query endpoints.
impl PartialEq for GraphModel {
    fn eq(&self, other: &Self) -> bool {
        self.anchor == other.anchor
            && self.raw_upstream_links == other.raw_upstream_links
            && self.raw_downstream_links == other.raw_downstream_links
            && self.order.len() == other.order.len()
            && self
                .order
                .iter()
                .zip(other.order.iter())
                .all(|(&a, &b)| self.graph[a] == other.graph[b])
    }
}
