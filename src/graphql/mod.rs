//
//  mod.rs
//  Lineage
//
//  Created by hak (tharun)
//

pub mod mutation;
pub mod query;
pub mod schema;

use async_graphql::{EmptySubscription, Schema};
use std::sync::Arc;

use crate::session::LineageSession;
use mutation::Mutation;
use query::Query;

/// The lineage GraphQL schema type
pub type LineageSchema = Schema<Query, Mutation, EmptySubscription>;

/// Build the GraphQL schema with the session as context
pub fn build_schema(session: Arc<LineageSession>) -> LineageSchema {
    Schema::build(Query, Mutation, EmptySubscription)
        .data(session)
        .limit_depth(5)
        .limit_complexity(100)
        .finish()
}

/// Execute a GraphQL request and return JSON result
pub async fn execute(schema: &LineageSchema, query: &str) -> String {
    let result = schema.execute(query).await;
    serde_json::to_string_pretty(&result).unwrap_or_else(|_| "{}".to_string())
}
