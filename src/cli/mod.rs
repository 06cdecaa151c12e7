//! CLI module for the lineage engine.
//!
//! Commands:
//! - View: graph, rows, stats
//! - Grow: expand, columns
//! - Inspect: details, query

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::graph::Side;
use crate::link::LineageDirection;

#[derive(Parser, Debug)]
#[command(name = "lineage")]
#[command(about = "Lineage - explore data lineage graphs", long_about = None)]
pub struct Cli {
    /// Lineage fixture to serve (JSON, or YAML by extension)
    #[arg(short, long)]
    pub fixture: PathBuf,

    /// Fully-qualified name of the anchor entry
    #[arg(short, long)]
    pub anchor: String,

    /// Config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    // ─── View ───────────────────────────────────────────────────
    /// Print the one-hop lineage graph of the anchor
    Graph,

    /// Print the anchor's lineage as table rows
    Rows,

    /// Show graph statistics
    Stats,

    // ─── Grow ───────────────────────────────────────────────────
    /// Expand one asset node by one hop
    Expand {
        /// Node id (see `graph`)
        node: String,

        #[arg(short, long, value_enum)]
        direction: ExpandDirection,
    },

    /// Show column-level lineage of the anchor
    Columns {
        /// Column name; all columns when omitted
        #[arg(short, long)]
        column: Option<String>,

        /// Defaults to the configured direction
        #[arg(short, long, value_enum)]
        direction: Option<LineageDirection>,
    },

    // ─── Inspect ────────────────────────────────────────────────
    /// Entry details for an asset node, process details for a query node
    Details {
        /// Node id
        node: String,
    },

    /// Run a GraphQL request against the session
    Query {
        /// GraphQL document
        request: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandDirection {
    Up,
    Down,
}

impl From<ExpandDirection> for Side {
    fn from(direction: ExpandDirection) -> Self {
        match direction {
            ExpandDirection::Up => Side::Upstream,
            ExpandDirection::Down => Side::Downstream,
        }
    }
}
