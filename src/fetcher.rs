//
//  fetcher.rs
//  Lineage
//
//  Created by hak (tharun)
//

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::{LineageError, Result};
use crate::link::{ColumnLinkPair, Entry, LineageDirection, LinkPair};

/// Job metadata for a process, as returned by the process detail service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDetails {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// The network boundary of the lineage engine.
///
/// Every method maps to one remote call. Implementations report failures
/// as [`LineageError::Transport`].
#[async_trait]
pub trait LineageLinkFetcher: Send + Sync {
    /// One-hop lineage of `fqn`: `source_links` where it is the source,
    /// `target_links` where it is the target.
    async fn search(&self, parent_scope: &str, fqn: &str) -> Result<LinkPair>;

    /// Multi-hop column lineage trees of `fqn` with embedded entries.
    async fn search_columns(
        &self,
        parent_scope: &str,
        fqn: &str,
        direction: LineageDirection,
    ) -> Result<ColumnLinkPair>;

    /// Job metadata of a process node.
    async fn process_details(&self, process_id: &str) -> Result<ProcessDetails>;

    /// Full entry payload of an asset.
    async fn lookup_entry(&self, fqn: &str) -> Result<Entry>;
}

/// Canned lineage data keyed by FQN.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageFixture {
    #[serde(default)]
    pub links: BTreeMap<String, LinkPair>,
    #[serde(default)]
    pub column_links: BTreeMap<String, ColumnLinkPair>,
    #[serde(default)]
    pub entries: BTreeMap<String, Entry>,
    #[serde(default)]
    pub processes: BTreeMap<String, ProcessDetails>,
}

impl LineageFixture {
    /// Load a fixture from JSON, or YAML for `.yaml`/`.yml` files.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        let fixture: Self = if is_yaml {
            serde_yaml::from_str(&contents)?
        } else {
            serde_json::from_str(&contents)?
        };
        fixture.validate()?;
        debug!(
            path = %path.display(),
            links = fixture.links.len(),
            column_links = fixture.column_links.len(),
            "loaded lineage fixture"
        );
        Ok(fixture)
    }

    /// Check that every link pair is keyed by the FQN its links touch:
    /// `sourceLinks` start at the key, `targetLinks` end at it.
    pub fn validate(&self) -> Result<()> {
        for (fqn, pair) in &self.links {
            let misplaced = pair
                .source_links
                .iter()
                .find(|l| &l.source.fully_qualified_name != fqn)
                .or_else(|| {
                    pair.target_links
                        .iter()
                        .find(|l| &l.target.fully_qualified_name != fqn)
                });
            if let Some(link) = misplaced {
                return Err(LineageError::Fixture(format!(
                    "link {} -> {} listed under {}",
                    link.source.fully_qualified_name, link.target.fully_qualified_name, fqn
                )));
            }
        }
        Ok(())
    }
}

/// A fetcher that serves a [`LineageFixture`] from memory.
///
/// Unknown FQNs have no lineage; unknown entries and processes are
/// reported as transport errors, as a remote 404 would be.
#[derive(Debug, Clone, Default)]
pub struct FixtureFetcher {
    fixture: LineageFixture,
}

impl FixtureFetcher {
    pub fn new(fixture: LineageFixture) -> Self {
        Self { fixture }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(LineageFixture::load(path)?))
    }

    pub fn fixture(&self) -> &LineageFixture {
        &self.fixture
    }
}

#[async_trait]
impl LineageLinkFetcher for FixtureFetcher {
    async fn search(&self, parent_scope: &str, fqn: &str) -> Result<LinkPair> {
        debug!(parent_scope, fqn, "fixture lineage search");
        Ok(self.fixture.links.get(fqn).cloned().unwrap_or_default())
    }

    async fn search_columns(
        &self,
        parent_scope: &str,
        fqn: &str,
        direction: LineageDirection,
    ) -> Result<ColumnLinkPair> {
        debug!(parent_scope, fqn, %direction, "fixture column lineage search");
        let mut pair = self.fixture.column_links.get(fqn).cloned().unwrap_or_default();
        if !direction.includes_upstream() {
            pair.target_links.clear();
        }
        if !direction.includes_downstream() {
            pair.source_links.clear();
        }
        Ok(pair)
    }

    async fn process_details(&self, process_id: &str) -> Result<ProcessDetails> {
        self.fixture
            .processes
            .get(process_id)
            .cloned()
            .ok_or_else(|| LineageError::Transport(format!("process {} not found", process_id)))
    }

    async fn lookup_entry(&self, fqn: &str) -> Result<Entry> {
        self.fixture
            .entries
            .get(fqn)
            .cloned()
            .ok_or_else(|| LineageError::Transport(format!("entry {} not found", fqn)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIXTURE_JSON: &str = r#"{
        "links": {
            "bq:proj.ds.orders": {
                "sourceLinks": [],
                "targetLinks": [{
                    "source": { "fullyQualifiedName": "bq:proj.ds.raw_orders", "name": "raw_orders" },
                    "target": { "fullyQualifiedName": "bq:proj.ds.orders", "name": "orders" },
                    "process": { "name": "processes/load" }
                }]
            }
        },
        "columnLinks": {
            "bq:proj.ds.orders": {
                "sourceLinks": [{
                    "source": { "fullyQualifiedName": "bq:proj.ds.orders" },
                    "target": { "fullyQualifiedName": "bq:proj.ds.report" }
                }],
                "targetLinks": [{
                    "source": { "fullyQualifiedName": "bq:proj.ds.raw_orders" },
                    "target": { "fullyQualifiedName": "bq:proj.ds.orders" }
                }]
            }
        },
        "processes": {
            "processes/load": { "name": "processes/load", "displayName": "nightly load" }
        }
    }"#;

    fn fetcher() -> FixtureFetcher {
        FixtureFetcher::new(serde_json::from_str(FIXTURE_JSON).unwrap())
    }

    #[tokio::test]
    async fn test_search_known_and_unknown() {
        let fetcher = fetcher();
        let pair = fetcher.search("projects/p/locations/us", "bq:proj.ds.orders").await.unwrap();
        assert_eq!(pair.producers().len(), 1);
        assert_eq!(
            pair.producers()[0].process.as_ref().unwrap().name,
            "processes/load"
        );

        let empty = fetcher.search("projects/p/locations/us", "bq:proj.ds.nothing").await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_search_columns_respects_direction() {
        let fetcher = fetcher();
        let up = fetcher
            .search_columns("scope", "bq:proj.ds.orders", LineageDirection::Upstream)
            .await
            .unwrap();
        assert_eq!(up.target_links.len(), 1);
        assert!(up.source_links.is_empty());

        let both = fetcher
            .search_columns("scope", "bq:proj.ds.orders", LineageDirection::Both)
            .await
            .unwrap();
        assert_eq!(both.source_links.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_process_is_transport_error() {
        let fetcher = fetcher();
        let details = fetcher.process_details("processes/load").await.unwrap();
        assert_eq!(details.display_name.as_deref(), Some("nightly load"));

        let err = fetcher.process_details("processes/other").await.unwrap_err();
        assert!(err.is_transport());
        assert!(fetcher.lookup_entry("bq:proj.ds.orders").await.is_err());
    }

    #[test]
    fn test_load_yaml_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lineage.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            "links:\n  bq:proj.ds.orders:\n    targetLinks:\n      - source:\n          fullyQualifiedName: bq:proj.ds.raw\n        target:\n          fullyQualifiedName: bq:proj.ds.orders\n"
        )
        .unwrap();

        let fixture = LineageFixture::load(&path).unwrap();
        let pair = &fixture.links["bq:proj.ds.orders"];
        assert_eq!(pair.target_links.len(), 1);
        assert!(pair.source_links.is_empty());
    }

    #[test]
    fn test_demo_fixture_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/orders.json");
        let fixture = LineageFixture::load(&path).unwrap();
        let anchor = &fixture.links["bigquery:acme.sales.orders"];
        assert_eq!(anchor.producers().len(), 1);
        assert_eq!(anchor.consumers().len(), 1);

        let column = &fixture.column_links["bigquery:acme.sales.orders"].target_links[0];
        let entry = column.source_entry.as_ref().unwrap();
        assert!(entry.has_column("order_id"));
    }

    #[test]
    fn test_load_rejects_misplaced_link() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lineage.json");
        std::fs::write(
            &path,
            r#"{ "links": { "bq:proj.ds.orders": { "sourceLinks": [{
                "source": { "fullyQualifiedName": "bq:proj.ds.other" },
                "target": { "fullyQualifiedName": "bq:proj.ds.report" }
            }] } } }"#,
        )
        .unwrap();

        let err = LineageFixture::load(&path).unwrap_err();
        assert!(matches!(err, LineageError::Fixture(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = LineageFixture::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, LineageError::Io(_)));
    }
}
