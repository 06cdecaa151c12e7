//
//  builder.rs
//  Lineage
//
//  Created by hak (tharun)
//

use tracing::debug;

use super::engine::{GraphModel, Placement};
use super::types::Side;
use crate::link::{EntryRef, LineageLink, LinkPair};

/// Build the one-hop graph for an anchor entry.
///
/// Every producer in `links.target_links` becomes an asset at level -2 and a
/// query at level -1 targeting the root; every consumer in
/// `links.source_links` becomes a query at +1 sourced from the root and an
/// asset at +2. Input order is preserved.
pub fn build_initial(anchor: &EntryRef, links: &LinkPair) -> GraphModel {
    build_from_links(
        anchor,
        links.producers().to_vec(),
        links.consumers().to_vec(),
    )
}

/// Rebuild the baseline one-hop graph from cached raw links, without any
/// collaborator call. Produces exactly what [`build_initial`] produces.
pub fn reset(
    anchor: &EntryRef,
    raw_upstream_links: &[LineageLink],
    raw_downstream_links: &[LineageLink],
) -> GraphModel {
    debug!(
        anchor = %anchor.fully_qualified_name,
        upstream = raw_upstream_links.len(),
        downstream = raw_downstream_links.len(),
        "resetting graph to baseline"
    );
    build_from_links(
        anchor,
        raw_upstream_links.to_vec(),
        raw_downstream_links.to_vec(),
    )
}

fn build_from_links(
    anchor: &EntryRef,
    upstream: Vec<LineageLink>,
    downstream: Vec<LineageLink>,
) -> GraphModel {
    let mut graph = GraphModel::new(anchor.clone(), upstream, downstream);
    let root = graph.root;

    // Phase 1: producers, left of the root
    let producers = graph.raw_upstream_links().to_vec();
    let fresh = graph.attach_links(root, Side::Upstream, &producers);
    graph.place(fresh, Placement::Prepend);

    // Phase 2: consumers, right of the root
    let consumers = graph.raw_downstream_links().to_vec();
    let fresh = graph.attach_links(root, Side::Downstream, &consumers);
    graph.place(fresh, Placement::Append);

    debug!(
        anchor = %anchor.fully_qualified_name,
        nodes = graph.len(),
        "built initial lineage graph"
    );
    graph
}
