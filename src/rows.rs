//
//  rows.rs
//  Lineage
//
//  Created by hak (tharun)
//

//! Flat, tabular view of lineage edges.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::MalformedIdentifier;
use crate::link::{EntryRef, LineageLink};

/// Parts of a `system:project.dataset.table` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FqnParts<'a> {
    pub system: &'a str,
    pub project: &'a str,
    pub dataset: &'a str,
    /// Everything after the dataset, dots included.
    pub table: &'a str,
}

/// Split a fully-qualified name on `:` and then on `.`.
pub fn parse_fqn(fqn: &str) -> Result<FqnParts<'_>, MalformedIdentifier> {
    let (system, path) = fqn
        .split_once(':')
        .ok_or_else(|| MalformedIdentifier::new(fqn, "missing ':' after the system"))?;
    let mut segments = path.splitn(3, '.');
    let (project, dataset, table) = match (segments.next(), segments.next(), segments.next()) {
        (Some(p), Some(d), Some(t)) => (p, d, t),
        _ => {
            return Err(MalformedIdentifier::new(
                fqn,
                "expected project.dataset.table",
            ))
        }
    };
    if [system, project, dataset, table].iter().any(|s| s.is_empty()) {
        return Err(MalformedIdentifier::new(fqn, "empty segment"));
    }
    Ok(FqnParts {
        system,
        project,
        dataset,
        table,
    })
}

/// One row of the tabular lineage view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageRow {
    pub source_system: String,
    pub source_project: String,
    pub source: String,
    #[serde(rename = "sourceFQN")]
    pub source_fqn: String,
    pub target_system: String,
    pub target_project: String,
    pub target: String,
    #[serde(rename = "targetFQN")]
    pub target_fqn: String,
}

impl LineageRow {
    fn from_link(link: &LineageLink) -> Result<Self, MalformedIdentifier> {
        let source = parse_fqn(&link.source.fully_qualified_name)?;
        let target = parse_fqn(&link.target.fully_qualified_name)?;
        Ok(Self {
            source_system: source.system.to_string(),
            source_project: source.project.to_string(),
            source: source.table.to_string(),
            source_fqn: link.source.fully_qualified_name.clone(),
            target_system: target.system.to_string(),
            target_project: target.project.to_string(),
            target: target.table.to_string(),
            target_fqn: link.target.fully_qualified_name.clone(),
        })
    }

    /// The anchor with empty target fields.
    fn placeholder(anchor: &EntryRef) -> Self {
        let fqn = &anchor.fully_qualified_name;
        match parse_fqn(fqn) {
            Ok(parts) => Self {
                source_system: parts.system.to_string(),
                source_project: parts.project.to_string(),
                source: parts.table.to_string(),
                source_fqn: fqn.clone(),
                ..Self::default()
            },
            Err(_) => Self {
                source: anchor.display_name().to_string(),
                source_fqn: fqn.clone(),
                ..Self::default()
            },
        }
    }
}

/// Rows plus the identifiers that could not be parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowProjection {
    pub rows: Vec<LineageRow>,
    #[serde(skip)]
    pub skipped: Vec<MalformedIdentifier>,
}

/// Flatten raw link lists into rows.
///
/// Consumer links (`source_links`) come first, then producer links
/// (`target_links`), each in input order. A link with a malformed FQN is
/// skipped on its own. When both lists are empty the result is a single
/// placeholder row for the anchor.
pub fn to_rows(
    anchor: &EntryRef,
    source_links: &[LineageLink],
    target_links: &[LineageLink],
) -> RowProjection {
    if source_links.is_empty() && target_links.is_empty() {
        return RowProjection {
            rows: vec![LineageRow::placeholder(anchor)],
            skipped: Vec::new(),
        };
    }

    let mut projection = RowProjection::default();
    for link in source_links.iter().chain(target_links.iter()) {
        match LineageRow::from_link(link) {
            Ok(row) => projection.rows.push(row),
            Err(e) => {
                warn!(error = %e, "skipping lineage row");
                projection.skipped.push(e);
            }
        }
    }
    projection
}
