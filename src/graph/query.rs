//
//  query.rs
//  Lineage
//
//  Created by hak (tharun)
//

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashSet;

use super::engine::GraphModel;
use super::types::*;
use crate::error::{LineageError, Result};

impl GraphModel {
    /// Nodes in layout order, furthest upstream first.
    pub fn nodes(&self) -> impl Iterator<Item = &LineageNode> + '_ {
        self.order.iter().map(move |&idx| &self.graph[idx])
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&LineageNode> {
        self.index_of(id).map(|idx| &self.graph[idx])
    }

    /// Look up a node by its structured key.
    pub fn node_by_key(&self, key: &NodeKey) -> Option<&LineageNode> {
        self.key_index.get(key).map(|&idx| &self.graph[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    /// Nodes at one level, ordered by sequence.
    pub fn nodes_at_level(&self, level: i32) -> Vec<&LineageNode> {
        let mut nodes: Vec<_> = self.nodes().filter(|n| n.level == level).collect();
        nodes.sort_by_key(|n| n.sequence);
        nodes
    }

    /// Asset nodes still offering expansion on `side`.
    pub fn expandable_nodes(&self, side: Side) -> Vec<&LineageNode> {
        self.nodes().filter(|n| n.expandable(side)).collect()
    }

    /// Assets feeding `id` through one query node.
    pub fn producers_of(&self, id: &str) -> Vec<&LineageNode> {
        self.hop_neighbours(id, Direction::Incoming)
    }

    /// Assets fed by `id` through one query node.
    pub fn consumers_of(&self, id: &str) -> Vec<&LineageNode> {
        self.hop_neighbours(id, Direction::Outgoing)
    }

    fn hop_neighbours(&self, id: &str, direction: Direction) -> Vec<&LineageNode> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut result = Vec::new();
        for first in self.graph.edges_directed(idx, direction) {
            let query = match direction {
                Direction::Incoming => first.source(),
                Direction::Outgoing => first.target(),
            };
            for second in self.graph.edges_directed(query, direction) {
                let asset = match direction {
                    Direction::Incoming => second.source(),
                    Direction::Outgoing => second.target(),
                };
                if seen.insert(asset) {
                    result.push(&self.graph[asset]);
                }
            }
        }
        result
    }

    /// Get graph statistics.
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            edge_count: self.graph.edge_count(),
            ..GraphStats::default()
        };
        for node in self.nodes() {
            match node.kind {
                NodeKind::Asset => stats.asset_count += 1,
                NodeKind::Query => stats.query_count += 1,
            }
            stats.min_level = stats.min_level.min(node.level);
            stats.max_level = stats.max_level.max(node.level);
        }
        stats
    }

    /// Check the structural invariants of the graph.
    ///
    /// Exactly one root, unique ids, every placed node indexed, query
    /// endpoints resolving to assets, and each query strictly between its
    /// endpoints' levels.
    pub fn validate(&self) -> Result<()> {
        let roots = self.nodes().filter(|n| n.is_root).count();
        if roots != 1 {
            return Err(LineageError::InvariantViolation(format!(
                "expected exactly one root, found {}",
                roots
            )));
        }

        let mut ids = HashSet::new();
        for node in self.nodes() {
            if !ids.insert(node.id.as_str()) {
                return Err(LineageError::InvariantViolation(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
        }
        if ids.len() != self.graph.node_count() {
            return Err(LineageError::InvariantViolation(format!(
                "{} nodes stored but {} placed",
                self.graph.node_count(),
                ids.len()
            )));
        }

        for node in self.nodes().filter(|n| n.kind == NodeKind::Query) {
            let endpoints = node.endpoints.as_ref().ok_or_else(|| {
                LineageError::InvariantViolation(format!("query {} has no endpoints", node.id))
            })?;
            let source = self.resolve_asset(&node.id, &endpoints.source_node_id)?;
            let target = self.resolve_asset(&node.id, &endpoints.target_node_id)?;
            let (low, high) = if source.level < target.level {
                (source.level, target.level)
            } else {
                (target.level, source.level)
            };
            if !(low < node.level && node.level < high) {
                return Err(LineageError::InvariantViolation(format!(
                    "query {} at level {} is not between {} and {}",
                    node.id, node.level, source.level, target.level
                )));
            }
        }
        Ok(())
    }

    fn resolve_asset(&self, query_id: &str, id: &str) -> Result<&LineageNode> {
        match self.node(id) {
            Some(node) if node.is_asset() => Ok(node),
            Some(_) => Err(LineageError::InvariantViolation(format!(
                "query {} points at non-asset {}",
                query_id, id
            ))),
            None => Err(LineageError::InvariantViolation(format!(
                "query {} points at missing node {}",
                query_id, id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::build_initial;
    use crate::graph::types::*;
    use crate::link::{EntryRef, LineageLink, LinkPair};

    fn anchor() -> EntryRef {
        EntryRef::from_fqn("bq:proj.ds.orders")
    }

    fn sample() -> crate::graph::GraphModel {
        let links = LinkPair::new(
            vec![
                LineageLink::new(anchor(), EntryRef::from_fqn("bq:proj.ds.report")),
                LineageLink::new(anchor(), EntryRef::from_fqn("bq:proj.ds.export")),
            ],
            vec![LineageLink::new(
                EntryRef::from_fqn("bq:proj.ds.raw"),
                anchor(),
            )],
        );
        build_initial(&anchor(), &links)
    }

    #[test]
    fn test_stats() {
        let stats = sample().stats();
        assert_eq!(stats.asset_count, 4);
        assert_eq!(stats.query_count, 3);
        assert_eq!(stats.edge_count, 6);
        assert_eq!(stats.min_level, -2);
        assert_eq!(stats.max_level, 2);
        assert_eq!(stats.total_nodes(), 7);
    }

    #[test]
    fn test_producers_and_consumers_of_root() {
        let graph = sample();
        let producers: Vec<_> = graph
            .producers_of(graph.root_id())
            .into_iter()
            .map(|n| n.display_name.clone())
            .collect();
        let consumers: Vec<_> = graph
            .consumers_of(graph.root_id())
            .into_iter()
            .map(|n| n.display_name.clone())
            .collect();
        assert_eq!(producers, vec!["raw"]);
        assert_eq!(consumers.len(), 2);
        assert!(consumers.contains(&"report".to_string()));
    }

    #[test]
    fn test_unknown_node_lookups() {
        let graph = sample();
        assert!(graph.node("nope").is_none());
        assert!(graph.producers_of("nope").is_empty());
        assert!(!graph.contains("nope"));
    }

    #[test]
    fn test_nodes_at_level_sorted_by_sequence() {
        let graph = sample();
        let names: Vec<_> = graph
            .nodes_at_level(2)
            .into_iter()
            .map(|n| n.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["report", "export"]);
    }

    #[test]
    fn test_node_by_key() {
        let graph = sample();
        let key = NodeKey::asset("bq:proj.ds.raw", -2);
        assert_eq!(graph.node_by_key(&key).unwrap().display_name, "raw");
    }

    #[test]
    fn test_validate_catches_dangling_query() {
        let mut graph = sample();
        let query_id = graph
            .nodes()
            .find(|n| n.kind == NodeKind::Query)
            .map(|n| n.id.clone())
            .unwrap();
        if let Some(node) = graph.node_mut(&query_id) {
            if let Some(endpoints) = node.endpoints.as_mut() {
                endpoints.source_node_id = "missing".to_string();
            }
        }
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_expandable_nodes() {
        let graph = sample();
        assert_eq!(graph.expandable_nodes(Side::Upstream).len(), 1);
        assert_eq!(graph.expandable_nodes(Side::Downstream).len(), 2);
    }
}
