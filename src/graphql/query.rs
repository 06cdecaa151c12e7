//
//  query.rs
//  Lineage
//
//  Created by hak (tharun)
//

use async_graphql::{Context, Object, Result};
use std::sync::Arc;

use super::schema::{Graph, Node, Row, Stats};
use crate::session::LineageSession;

/// Root query type
pub struct Query;

#[Object]
impl Query {
    /// The current lineage graph of the session.
    async fn graph(&self, ctx: &Context<'_>) -> Result<Graph> {
        let session = ctx.data::<Arc<LineageSession>>()?;
        Ok(Graph::from(&session.current().await))
    }

    /// Look up one node by id
    async fn node(&self, ctx: &Context<'_>, id: String) -> Result<Option<Node>> {
        let session = ctx.data::<Arc<LineageSession>>()?;
        let snapshot = session.current().await;
        Ok(snapshot.graph.node(&id).map(Node::from))
    }

    /// Tabular view of the anchor's one-hop lineage.
    ///
    /// Rows whose identifiers cannot be parsed are left out.
    async fn rows(&self, ctx: &Context<'_>) -> Result<Vec<Row>> {
        let session = ctx.data::<Arc<LineageSession>>()?;
        let projection = session.rows().await;
        Ok(projection.rows.into_iter().map(Row::from).collect())
    }

    /// Get graph statistics
    async fn stats(&self, ctx: &Context<'_>) -> Result<Stats> {
        let session = ctx.data::<Arc<LineageSession>>()?;
        Ok(Stats::from(&session.current().await))
    }
}
