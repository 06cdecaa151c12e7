//
//  expand.rs
//  Lineage
//
//  Created by hak (tharun)
//

use tracing::debug;

use super::engine::{GraphModel, Placement};
use super::types::*;
use crate::error::{LineageError, Result};
use crate::link::LineageLink;

/// Check that `node_id` is an asset offering expansion on `side`.
pub fn check_expandable<'g>(
    graph: &'g GraphModel,
    node_id: &str,
    side: Side,
) -> Result<&'g LineageNode> {
    let node = graph
        .node(node_id)
        .ok_or_else(|| LineageError::NodeNotFound(node_id.to_string()))?;
    if !node.is_asset() {
        return Err(LineageError::NotAnAsset(node_id.to_string()));
    }
    if !node.expandable(side) {
        return Err(LineageError::NotExpandable {
            node_id: node_id.to_string(),
            side,
        });
    }
    Ok(node)
}

/// Grow `graph` by one hop from `node_id` using the fetched `links`.
///
/// `links` are the producers of the node for an upstream expansion, or its
/// consumers for a downstream one. The input graph is never touched: the
/// result is a new graph built from a copy. An empty `links` clears the
/// node's affordance on `side` and adds nothing.
pub fn splice_expansion(
    graph: &GraphModel,
    node_id: &str,
    side: Side,
    links: &[LineageLink],
) -> Result<GraphModel> {
    check_expandable(graph, node_id, side)?;

    let mut next = graph.clone();
    let idx = next
        .index_of(node_id)
        .ok_or_else(|| LineageError::NodeNotFound(node_id.to_string()))?;

    if links.is_empty() {
        debug!(node = %node_id, %side, "no further lineage, clearing affordance");
        let node = &mut next.graph[idx];
        node.set_expandable(side, false);
        node.mark_fetched(side);
        return Ok(next);
    }

    let fresh = next.attach_links(idx, side, links);
    let added = fresh.len();
    next.place(fresh, Placement::for_side(side));
    next.graph[idx].mark_fetched(side);

    debug!(node = %node_id, %side, links = links.len(), added, "spliced expansion");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_initial;
    use crate::link::{EntryRef, LinkPair};

    fn anchor() -> EntryRef {
        EntryRef::from_fqn("bq:proj.ds.orders")
    }

    fn baseline() -> GraphModel {
        let links = LinkPair::new(
            vec![LineageLink::new(anchor(), EntryRef::from_fqn("bq:proj.ds.report"))],
            vec![LineageLink::new(EntryRef::from_fqn("bq:proj.ds.raw"), anchor())],
        );
        build_initial(&anchor(), &links)
    }

    fn id_of(graph: &GraphModel, name: &str) -> String {
        graph
            .nodes()
            .find(|n| n.is_asset() && n.display_name == name)
            .map(|n| n.id.clone())
            .unwrap()
    }

    #[test]
    fn test_expand_upstream_prepends_new_hop() {
        let graph = baseline();
        let raw = id_of(&graph, "raw");
        let links = vec![LineageLink::new(
            EntryRef::from_fqn("bq:proj.ds.landing"),
            EntryRef::from_fqn("bq:proj.ds.raw"),
        )];

        let next = splice_expansion(&graph, &raw, Side::Upstream, &links).unwrap();

        assert_eq!(next.len(), graph.len() + 2);
        let first: Vec<_> = next.nodes().take(2).collect();
        assert_eq!(first[0].display_name, "landing");
        assert_eq!(first[0].level, -4);
        assert_eq!(first[1].kind, NodeKind::Query);
        assert_eq!(first[1].level, -3);
        assert_eq!(first[1].endpoints.as_ref().unwrap().target_node_id, raw);
        assert!(next.node(&raw).unwrap().upstream_fetched);
        assert!(next.validate().is_ok());
    }

    #[test]
    fn test_expand_downstream_appends_new_hop() {
        let graph = baseline();
        let report = id_of(&graph, "report");
        let links = vec![
            LineageLink::new(
                EntryRef::from_fqn("bq:proj.ds.report"),
                EntryRef::from_fqn("bq:proj.ds.dashboard"),
            ),
            LineageLink::new(
                EntryRef::from_fqn("bq:proj.ds.report"),
                EntryRef::from_fqn("bq:proj.ds.alerts"),
            ),
        ];

        let next = splice_expansion(&graph, &report, Side::Downstream, &links).unwrap();

        let tail: Vec<_> = next.nodes().skip(graph.len()).collect();
        let levels: Vec<i32> = tail.iter().map(|n| n.level).collect();
        assert_eq!(levels, vec![3, 4, 3, 4]);
        assert_eq!(tail[1].display_name, "dashboard");
        assert_eq!(tail[3].display_name, "alerts");
        assert_eq!(tail[0].endpoints.as_ref().unwrap().source_node_id, report);
        assert!(next.validate().is_ok());
    }

    #[test]
    fn test_empty_response_clears_affordance() {
        let graph = baseline();
        let raw = id_of(&graph, "raw");

        let next = splice_expansion(&graph, &raw, Side::Upstream, &[]).unwrap();

        assert_eq!(next.len(), graph.len());
        assert!(!next.node(&raw).unwrap().upstream_expandable);
        assert!(graph.node(&raw).unwrap().upstream_expandable);
    }

    #[test]
    fn test_input_graph_untouched() {
        let graph = baseline();
        let before = graph.clone();
        let raw = id_of(&graph, "raw");
        let links = vec![LineageLink::new(
            EntryRef::from_fqn("bq:proj.ds.landing"),
            EntryRef::from_fqn("bq:proj.ds.raw"),
        )];

        let _ = splice_expansion(&graph, &raw, Side::Upstream, &links).unwrap();
        assert_eq!(graph, before);
    }

    #[test]
    fn test_rejects_wrong_direction_and_queries() {
        let graph = baseline();
        let raw = id_of(&graph, "raw");
        let query = graph
            .nodes()
            .find(|n| n.kind == NodeKind::Query)
            .map(|n| n.id.clone())
            .unwrap();

        assert!(matches!(
            splice_expansion(&graph, &raw, Side::Downstream, &[]),
            Err(LineageError::NotExpandable { .. })
        ));
        assert!(matches!(
            splice_expansion(&graph, &query, Side::Upstream, &[]),
            Err(LineageError::NotAnAsset(_))
        ));
        assert!(matches!(
            splice_expansion(&graph, "missing", Side::Upstream, &[]),
            Err(LineageError::NodeNotFound(_))
        ));
        assert!(matches!(
            splice_expansion(&graph, graph.root_id(), Side::Upstream, &[]),
            Err(LineageError::NotExpandable { .. })
        ));
    }

    #[test]
    fn test_repeated_expansion_is_deduplicated() {
        let graph = baseline();
        let raw = id_of(&graph, "raw");
        let links = vec![LineageLink::new(
            EntryRef::from_fqn("bq:proj.ds.landing"),
            EntryRef::from_fqn("bq:proj.ds.raw"),
        )];

        let once = splice_expansion(&graph, &raw, Side::Upstream, &links).unwrap();
        let twice = splice_expansion(&once, &raw, Side::Upstream, &links).unwrap();
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn test_repeated_link_in_one_response_gets_own_pair() {
        let graph = baseline();
        let raw = id_of(&graph, "raw");
        let link = LineageLink::new(
            EntryRef::from_fqn("bq:proj.ds.landing"),
            EntryRef::from_fqn("bq:proj.ds.raw"),
        );
        let links = vec![link.clone(), link];

        let once = splice_expansion(&graph, &raw, Side::Upstream, &links).unwrap();
        assert_eq!(once.len(), graph.len() + 4);
        assert_eq!(once.nodes_at_level(-4).len(), 2);
        assert_eq!(once.nodes_at_level(-3).len(), 2);
        assert!(once.validate().is_ok());

        let twice = splice_expansion(&once, &raw, Side::Upstream, &links).unwrap();
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn test_shared_producer_is_one_node_with_two_queries() {
        let links = LinkPair::new(
            vec![],
            vec![
                LineageLink::new(EntryRef::from_fqn("bq:proj.ds.a"), anchor()),
                LineageLink::new(EntryRef::from_fqn("bq:proj.ds.b"), anchor()),
            ],
        );
        let graph = build_initial(&anchor(), &links);
        let a = id_of(&graph, "a");
        let b = id_of(&graph, "b");
        let shared = EntryRef::from_fqn("bq:proj.ds.src");

        let next = splice_expansion(
            &graph,
            &a,
            Side::Upstream,
            &[LineageLink::new(shared.clone(), EntryRef::from_fqn("bq:proj.ds.a"))],
        )
        .unwrap();
        let next = splice_expansion(
            &next,
            &b,
            Side::Upstream,
            &[LineageLink::new(shared, EntryRef::from_fqn("bq:proj.ds.b"))],
        )
        .unwrap();

        assert_eq!(next.nodes_at_level(-4).len(), 1);
        assert_eq!(next.nodes_at_level(-3).len(), 2);
        assert!(next.validate().is_ok());
    }
}
