//
//  mutation.rs
//  Lineage
//
//  Created by hak (tharun)
//

use async_graphql::{Context, Object, Result};
use std::sync::Arc;

use super::schema::Graph;
use crate::link::LineageDirection;
use crate::session::LineageSession;

/// Root mutation type
///
/// Every mutation returns the graph as committed. A failed fetch is not an
/// error: the unchanged graph comes back.
pub struct Mutation;

#[Object]
impl Mutation {
    /// Add the producers of an upstream asset
    async fn expand_upstream(&self, ctx: &Context<'_>, node_id: String) -> Result<Graph> {
        let session = ctx.data::<Arc<LineageSession>>()?;
        let snapshot = session.expand_upstream(&node_id).await?;
        Ok(Graph::from(&snapshot))
    }

    /// Add the consumers of a downstream asset
    async fn expand_downstream(&self, ctx: &Context<'_>, node_id: String) -> Result<Graph> {
        let session = ctx.data::<Arc<LineageSession>>()?;
        let snapshot = session.expand_downstream(&node_id).await?;
        Ok(Graph::from(&snapshot))
    }

    /// Replace the graph with the lineage of one column of the anchor.
    ///
    /// Without `column` every column-level link is shown.
    async fn column_lineage(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] column: Option<String>,
        #[graphql(default)] direction: Option<LineageDirection>,
    ) -> Result<Graph> {
        let session = ctx.data::<Arc<LineageSession>>()?;
        let snapshot = session
            .project_columns(column.as_deref(), direction)
            .await?;
        Ok(Graph::from(&snapshot))
    }

    /// Back to the one-hop baseline
    async fn reset(&self, ctx: &Context<'_>) -> Result<Graph> {
        let session = ctx.data::<Arc<LineageSession>>()?;
        let snapshot = session.reset().await?;
        Ok(Graph::from(&snapshot))
    }
}
