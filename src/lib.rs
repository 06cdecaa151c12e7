//! # Lineage
//!
//! Data lineage graph engine.
//!
//! Turns lineage link responses for an anchor catalog entry into a layered
//! graph of asset and process nodes, then grows it on request: one hop at a
//! time in either direction, or as a column-scoped view built from
//! multi-hop column lineage trees.
//!
//! ## Key Features
//!
//! - **Layered**: signed levels place producers left of the anchor and
//!   consumers right of it, with a process node between every two assets
//! - **Copy-on-write**: every operation derives a new graph; committed
//!   snapshots are versioned and never mutated
//! - **Serialized**: concurrent expansions queue up instead of losing
//!   each other's additions
//! - **Pluggable**: all network access goes through [`LineageLinkFetcher`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lineage::{EntryRef, FixtureFetcher, LineageConfig, LineageSession};
//!
//! # async fn demo() -> lineage::Result<()> {
//! let fetcher = FixtureFetcher::from_path("lineage.json".as_ref())?;
//! let session = LineageSession::open(
//!     Arc::new(fetcher),
//!     LineageConfig::default(),
//!     EntryRef::from_fqn("bigquery:proj.sales.orders"),
//! )
//! .await?;
//!
//! let snapshot = session
//!     .expand_upstream("asset:upstream:-2:bigquery:proj.sales.raw_orders")
//!     .await?;
//! println!("{} nodes", snapshot.graph.len());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod graph;
pub mod graphql;
pub mod link;
pub mod rows;
pub mod session;

// Re-exports for convenience
pub use config::LineageConfig;
pub use error::{LineageError, MalformedIdentifier, Result};
pub use fetcher::{FixtureFetcher, LineageFixture, LineageLinkFetcher, ProcessDetails};
pub use graph::{
    build_initial, project_columns, reset, splice_expansion, GraphModel, GraphStats, LineageNode,
    NodeKind, Side,
};
pub use link::{
    ColumnLink, ColumnLinkPair, Entry, EntryRef, LineageDirection, LineageLink, LinkPair,
    ProcessRef,
};
pub use rows::{to_rows, LineageRow, RowProjection};
pub use session::{LineageSession, LineageSignal, Snapshot};
