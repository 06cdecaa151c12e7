//
//  column.rs
//  Lineage
//
//  Created by hak (tharun)
//

use petgraph::graph::NodeIndex;
use tracing::debug;

use super::engine::{GraphModel, Hop, Placement};
use super::types::*;
use crate::link::{ColumnLink, ColumnLinkPair, Entry, LineageDirection, LinkTree, LinkVisitor};

/// Build a column-scoped view of the anchor of `base`.
///
/// Walks every link tree of the requested direction(s). A link produces its
/// asset/query pair only when its relevant entry (the producer for upstream
/// links, the consumer for downstream links) has a schema field named
/// `column`; an empty or absent column keeps every link. Children are walked
/// regardless of their parent's match. The result is a fresh graph that keeps
/// the baseline raw links of `base`; `base` is not modified.
pub fn project_columns(
    base: &GraphModel,
    response: &ColumnLinkPair,
    column: Option<&str>,
    direction: LineageDirection,
) -> GraphModel {
    let column = column.filter(|c| !c.is_empty());
    let mut graph = GraphModel::new(
        base.anchor().clone(),
        base.raw_upstream_links().to_vec(),
        base.raw_downstream_links().to_vec(),
    );

    if direction.includes_upstream() {
        project_side(&mut graph, &response.target_links, Side::Upstream, column);
    }
    if direction.includes_downstream() {
        project_side(&mut graph, &response.source_links, Side::Downstream, column);
    }

    debug!(
        anchor = %base.anchor().fully_qualified_name,
        column = column.unwrap_or(""),
        %direction,
        nodes = graph.len(),
        "projected column lineage"
    );
    graph
}

fn project_side(
    graph: &mut GraphModel,
    links: &[ColumnLink],
    side: Side,
    column: Option<&str>,
) {
    let root = graph.root;
    let mut projection = ColumnProjection {
        graph: &mut *graph,
        side,
        column,
        ancestors: vec![root],
        emitted: Vec::new(),
        fresh: Vec::new(),
    };
    for tree in LinkTree::forest(links) {
        tree.walk(&mut projection);
    }

    let mut fresh = projection.fresh;
    // Deepest hops furthest from the root; siblings keep walk order.
    fresh.sort_by_key(|&idx| graph.graph[idx].level);
    graph.place(fresh, Placement::for_side(side));
}

/// Visitor that emits matching links and tracks the nearest emitted ancestor.
struct ColumnProjection<'g, 'c> {
    graph: &'g mut GraphModel,
    side: Side,
    column: Option<&'c str>,
    /// Stack of the closest emitted asset at each open depth (root at the bottom).
    ancestors: Vec<NodeIndex>,
    /// Whether each open link pushed onto `ancestors`.
    emitted: Vec<bool>,
    fresh: Vec<NodeIndex>,
}

impl ColumnProjection<'_, '_> {
    fn relevant_entry<'l>(&self, link: &'l ColumnLink) -> Option<&'l Entry> {
        match self.side {
            Side::Upstream => link.source_entry.as_ref(),
            Side::Root | Side::Downstream => link.target_entry.as_ref(),
        }
    }

    fn matches(&self, link: &ColumnLink) -> bool {
        match self.column {
            None => true,
            Some(column) => self
                .relevant_entry(link)
                .map(|entry| entry.has_column(column))
                .unwrap_or(false),
        }
    }
}

impl LinkVisitor for ColumnProjection<'_, '_> {
    fn enter(&mut self, link: &ColumnLink, depth: usize) {
        if !self.matches(link) {
            self.emitted.push(false);
            return;
        }

        let from = self.ancestors.last().copied().unwrap_or(self.graph.root);
        let hop = Hop {
            side: self.side,
            asset_level: self.side.step() * 2 * depth as i32,
            source: &link.source,
            target: &link.target,
            raw: RawLink::Column(link.clone()),
            ordinal: 0,
        };
        let attached = self.graph.attach_hop(from, hop);
        self.graph.graph[attached.asset].freeze();
        self.fresh.extend(attached.fresh);
        self.ancestors.push(attached.asset);
        self.emitted.push(true);
    }

    fn leave(&mut self, _link: &ColumnLink, _depth: usize) {
        if self.emitted.pop().unwrap_or(false) {
            self.ancestors.pop();
        }
    }
}
