//! Raw lineage payloads as returned by the lineage collaborators.
//!
//! These are the inputs of the graph engine: table-level link pairs,
//! column-level link trees with embedded entries, and schema aspects.

pub mod tree;
pub mod types;

pub use tree::{LinkTree, LinkVisitor};
pub use types::{
    Aspect, ColumnLink, ColumnLinkPair, Entry, EntryRef, LineageDirection, LineageLink, LinkPair,
    ProcessRef, SchemaField, SCHEMA_ASPECT_SUFFIX,
};
