//! Lineage graph module, the structural core of the crate.
//!
//! Provides the graph data model and the operations that derive new graphs
//! from it: the initial one-hop build, reset to baseline, incremental
//! expansion and column-level projection.

pub mod builder;
pub mod column;
pub mod engine;
pub mod expand;
pub mod query;
pub mod types;

pub use builder::{build_initial, reset};
pub use column::project_columns;
pub use engine::{GraphModel, Placement};
pub use expand::{check_expandable, splice_expansion};
pub use types::{
    EdgeKind, EntryDetails, GraphStats, LineageNode, NodeKey, NodeKind, QueryEndpoints, RawLink,
    Side,
};
