//! Command handlers. Each one returns the JSON document the binary prints.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::Commands;
use crate::graph::{GraphStats, LineageNode, NodeKind, Side};
use crate::graphql::{build_schema, execute};
use crate::session::{LineageSession, Snapshot};

/// Serializable view of a snapshot.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphView<'a> {
    version: u64,
    generation: u64,
    anchor: &'a str,
    committed_at: String,
    nodes: Vec<&'a LineageNode>,
}

impl<'a> GraphView<'a> {
    fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            version: snapshot.version,
            generation: snapshot.generation,
            anchor: &snapshot.graph.anchor().fully_qualified_name,
            committed_at: snapshot.committed_at.to_rfc3339(),
            nodes: snapshot.graph.nodes().collect(),
        }
    }
}

fn graph_json(snapshot: &Snapshot) -> Result<Value> {
    Ok(serde_json::to_value(GraphView::new(snapshot))?)
}

/// Run one command against an open session.
pub async fn run(session: Arc<LineageSession>, command: Commands) -> Result<Value> {
    match command {
        Commands::Graph => graph_json(&session.current().await),

        Commands::Rows => {
            let projection = session.rows().await;
            let skipped: Vec<String> = projection.skipped.iter().map(|e| e.to_string()).collect();
            Ok(json!({ "rows": projection.rows, "skipped": skipped }))
        }

        Commands::Stats => {
            let snapshot = session.current().await;
            let stats: GraphStats = snapshot.graph.stats();
            Ok(json!({
                "version": snapshot.version,
                "assets": stats.asset_count,
                "queries": stats.query_count,
                "edges": stats.edge_count,
                "minLevel": stats.min_level,
                "maxLevel": stats.max_level,
            }))
        }

        Commands::Expand { node, direction } => {
            let snapshot = match Side::from(direction) {
                Side::Upstream => session.expand_upstream(&node).await,
                Side::Root | Side::Downstream => session.expand_downstream(&node).await,
            }
            .with_context(|| format!("Failed to expand {}", node))?;
            graph_json(&snapshot)
        }

        Commands::Columns { column, direction } => {
            let snapshot = session
                .project_columns(column.as_deref(), direction)
                .await
                .context("Failed to project column lineage")?;
            graph_json(&snapshot)
        }

        Commands::Details { node } => details(&session, &node).await,

        Commands::Query { request } => {
            let schema = build_schema(session);
            let response = execute(&schema, &request).await;
            Ok(serde_json::from_str(&response)?)
        }
    }
}

async fn details(session: &LineageSession, node_id: &str) -> Result<Value> {
    let kind = session
        .current()
        .await
        .graph
        .node(node_id)
        .map(|n| n.kind)
        .with_context(|| format!("Node not found: {}", node_id))?;

    match kind {
        NodeKind::Asset => {
            let snapshot = session.load_entry_details(node_id).await?;
            let node = snapshot
                .graph
                .node(node_id)
                .with_context(|| format!("Node not found: {}", node_id))?;
            Ok(json!({ "node": node.id, "entry": node.entry_details }))
        }
        NodeKind::Query => {
            let process = session.inspect_query(node_id).await?;
            Ok(json!({ "node": node_id, "process": process }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ExpandDirection;
    use crate::config::LineageConfig;
    use crate::fetcher::{FixtureFetcher, LineageFixture};
    use crate::link::EntryRef;

    const FIXTURE: &str = r#"{
        "links": {
            "bq:proj.ds.orders": {
                "sourceLinks": [{
                    "source": { "fullyQualifiedName": "bq:proj.ds.orders" },
                    "target": { "fullyQualifiedName": "bq:proj.ds.report" }
                }],
                "targetLinks": [{
                    "source": { "fullyQualifiedName": "bq:proj.ds.raw" },
                    "target": { "fullyQualifiedName": "bq:proj.ds.orders" },
                    "process": { "name": "processes/load" }
                }]
            },
            "bq:proj.ds.report": {
                "sourceLinks": [{
                    "source": { "fullyQualifiedName": "bq:proj.ds.report" },
                    "target": { "fullyQualifiedName": "bq:proj.ds.dashboard" }
                }]
            }
        },
        "entries": {
            "bq:proj.ds.raw": {
                "name": "entries/raw",
                "fullyQualifiedName": "bq:proj.ds.raw",
                "entryType": "projects/1/locations/global/entryTypes/bigquery-table"
            }
        },
        "processes": {
            "processes/load": { "name": "processes/load", "displayName": "nightly load" }
        }
    }"#;

    async fn session() -> Arc<LineageSession> {
        let fixture: LineageFixture = serde_json::from_str(FIXTURE).unwrap();
        let session = LineageSession::open(
            Arc::new(FixtureFetcher::new(fixture)),
            LineageConfig::default(),
            EntryRef::from_fqn("bq:proj.ds.orders"),
        )
        .await
        .unwrap();
        Arc::new(session)
    }

    #[tokio::test]
    async fn test_graph_command() {
        let value = run(session().await, Commands::Graph).await.unwrap();
        assert_eq!(value["anchor"], "bq:proj.ds.orders");
        assert_eq!(value["nodes"].as_array().unwrap().len(), 5);
        assert_eq!(value["nodes"][2]["isRoot"], true);
    }

    #[tokio::test]
    async fn test_expand_command() {
        let value = run(
            session().await,
            Commands::Expand {
                node: "asset:downstream:2:bq:proj.ds.report".to_string(),
                direction: ExpandDirection::Down,
            },
        )
        .await
        .unwrap();
        assert_eq!(value["version"], 1);
        let last = value["nodes"].as_array().unwrap().last().unwrap().clone();
        assert_eq!(last["fullyQualifiedName"], "bq:proj.ds.dashboard");
    }

    #[tokio::test]
    async fn test_expand_command_error() {
        let err = run(
            session().await,
            Commands::Expand {
                node: "missing".to_string(),
                direction: ExpandDirection::Up,
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Failed to expand missing"));
    }

    #[tokio::test]
    async fn test_rows_and_stats_commands() {
        let session = session().await;
        let rows = run(session.clone(), Commands::Rows).await.unwrap();
        assert_eq!(rows["rows"].as_array().unwrap().len(), 2);
        assert_eq!(rows["rows"][0]["targetFQN"], "bq:proj.ds.report");

        let stats = run(session, Commands::Stats).await.unwrap();
        assert_eq!(stats["assets"], 3);
        assert_eq!(stats["minLevel"], -2);
    }

    #[tokio::test]
    async fn test_details_command() {
        let session = session().await;
        let entry = run(
            session.clone(),
            Commands::Details {
                node: "asset:upstream:-2:bq:proj.ds.raw".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(entry["entry"]["state"], "loaded");
        assert_eq!(entry["entry"]["entry"]["name"], "entries/raw");

        let query_id = session
            .current()
            .await
            .graph
            .nodes()
            .find(|n| n.kind == NodeKind::Query && n.level == -1)
            .map(|n| n.id.clone())
            .unwrap();
        let process = run(session, Commands::Details { node: query_id })
            .await
            .unwrap();
        assert_eq!(process["process"]["displayName"], "nightly load");
    }

    #[tokio::test]
    async fn test_query_command() {
        let value = run(
            session().await,
            Commands::Query {
                request: "{ stats { assets } }".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(value["data"]["stats"]["assets"], 3);
    }
}
