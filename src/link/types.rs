//
//  types.rs
//  Lineage
//
//  Created by hak (tharun)
//

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Suffix shared by every schema aspect key (`<numericId>.global.schema`).
pub const SCHEMA_ASPECT_SUFFIX: &str = ".global.schema";

/// A lightweight reference to a catalog entry, as carried on lineage edges.
///
/// Also used as the anchor entry of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRef {
    pub fully_qualified_name: String,
    #[serde(default)]
    pub name: String,
}

impl EntryRef {
    pub fn new(fully_qualified_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            fully_qualified_name: fully_qualified_name.into(),
            name: name.into(),
        }
    }

    /// Build a reference whose name is the last `.`-segment of the FQN.
    pub fn from_fqn(fully_qualified_name: impl Into<String>) -> Self {
        let fqn = fully_qualified_name.into();
        let name = fqn.rsplit('.').next().unwrap_or(&fqn).to_string();
        Self {
            fully_qualified_name: fqn,
            name,
        }
    }

    /// Name to show in the graph; falls back to the FQN when the name is empty.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.fully_qualified_name
        } else {
            &self.name
        }
    }
}

/// The transformation/job that links a source entry to a target entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRef {
    /// Process resource name, used as the key for process detail lookups.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// One table-level lineage edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageLink {
    pub source: EntryRef,
    pub target: EntryRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessRef>,
}

impl LineageLink {
    pub fn new(source: EntryRef, target: EntryRef) -> Self {
        Self {
            source,
            target,
            process: None,
        }
    }

    pub fn with_process(mut self, process: ProcessRef) -> Self {
        self.process = Some(process);
        self
    }
}

/// Response of a lineage search for one FQN.
///
/// `source_links` are edges where the FQN is the **source** (its downstream
/// consumers); `target_links` are edges where it is the **target** (its
/// upstream producers). The names follow the wire format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPair {
    #[serde(default)]
    pub source_links: Vec<LineageLink>,
    #[serde(default)]
    pub target_links: Vec<LineageLink>,
}

impl LinkPair {
    pub fn new(source_links: Vec<LineageLink>, target_links: Vec<LineageLink>) -> Self {
        Self {
            source_links,
            target_links,
        }
    }

    /// Upstream producers of the searched FQN.
    pub fn producers(&self) -> &[LineageLink] {
        &self.target_links
    }

    /// Downstream consumers of the searched FQN.
    pub fn consumers(&self) -> &[LineageLink] {
        &self.source_links
    }

    pub fn is_empty(&self) -> bool {
        self.source_links.is_empty() && self.target_links.is_empty()
    }
}

/// Which side(s) of the anchor a column lineage request covers.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    async_graphql::Enum,
)]
#[serde(rename_all = "lowercase")]
pub enum LineageDirection {
    Upstream,
    Downstream,
    #[default]
    Both,
}

impl LineageDirection {
    pub fn includes_upstream(self) -> bool {
        matches!(self, LineageDirection::Upstream | LineageDirection::Both)
    }

    pub fn includes_downstream(self) -> bool {
        matches!(self, LineageDirection::Downstream | LineageDirection::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineageDirection::Upstream => "upstream",
            LineageDirection::Downstream => "downstream",
            LineageDirection::Both => "both",
        }
    }
}

impl fmt::Display for LineageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Entries & Schema ───────────────────────────────────────

/// One field of a schema aspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    pub name: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub mode: String,
}

/// An aspect attached to an entry. Only the schema aspect is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aspect {
    #[serde(default)]
    pub aspect_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Full entry payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    pub fully_qualified_name: String,
    /// e.g. `projects/655216118709/locations/global/entryTypes/bigquery-table`
    #[serde(default)]
    pub entry_type: String,
    #[serde(default)]
    pub aspects: BTreeMap<String, Aspect>,
}

impl Entry {
    /// The key under which this entry's schema aspect is expected.
    ///
    /// Derived from the numeric project id in the entry type.
    pub fn schema_aspect_key(&self) -> Option<String> {
        let mut segments = self.entry_type.split('/');
        while let Some(segment) = segments.next() {
            if segment == "projects" {
                return segments
                    .next()
                    .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
                    .map(|id| format!("{}{}", id, SCHEMA_ASPECT_SUFFIX));
            }
        }
        None
    }

    fn schema_aspect(&self) -> Option<&Aspect> {
        match self.schema_aspect_key() {
            Some(key) => self.aspects.get(&key),
            None => self
                .aspects
                .iter()
                .find(|(key, _)| key.ends_with(SCHEMA_ASPECT_SUFFIX))
                .map(|(_, aspect)| aspect),
        }
    }

    /// Schema fields, or `None` when the entry carries no readable schema aspect.
    pub fn schema_fields(&self) -> Option<Vec<SchemaField>> {
        let fields = self.schema_aspect()?.data.get("fields")?;
        serde_json::from_value(fields.clone()).ok()
    }

    /// Exact, case-sensitive column membership. Missing schema means no match.
    pub fn has_column(&self, column: &str) -> bool {
        self.schema_fields()
            .map(|fields| fields.iter().any(|f| f.name == column))
            .unwrap_or(false)
    }
}

// ─── Column Lineage Payloads ────────────────────────────────

/// A column lineage edge with pre-resolved further hops in `children`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLink {
    pub source: EntryRef,
    pub target: EntryRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_entry: Option<Entry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_entry: Option<Entry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ColumnLink>,
}

impl ColumnLink {
    /// The table-level edge this column link describes.
    pub fn as_link(&self) -> LineageLink {
        LineageLink {
            source: self.source.clone(),
            target: self.target.clone(),
            process: self.process.clone(),
        }
    }
}

/// Response of a column lineage search, same naming convention as [`LinkPair`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLinkPair {
    #[serde(default)]
    pub source_links: Vec<ColumnLink>,
    #[serde(default)]
    pub target_links: Vec<ColumnLink>,
}
