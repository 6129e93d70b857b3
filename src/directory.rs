//! Account, zone and endpoint directories loaded once at startup.
//!
//! These are read-only after loading and are passed explicitly to the query
//! controller and the renderer.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Identifier of the synthetic catalog entry that expands to every endpoint.
pub const SELECT_ALL_ID: &str = "all";
pub const SELECT_ALL_LABEL: &str = "Select All";

/// Customer display name to account tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountDirectory(BTreeMap<String, String>);

impl AccountDirectory {
    pub fn new(accounts: BTreeMap<String, String>) -> Self {
        AccountDirectory(accounts)
    }

    pub fn account_tag(&self, customer: &str) -> Option<&str> {
        self.0.get(customer).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, tag)| (name.as_str(), tag.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Customer display name to the zones of that customer's account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ZoneDirectory(BTreeMap<String, Vec<String>>);

impl ZoneDirectory {
    /// Zone ids are kept in service order with duplicates removed.
    pub fn new(zones: BTreeMap<String, Vec<String>>) -> Self {
        let zones = zones
            .into_iter()
            .map(|(customer, ids)| {
                let mut seen = BTreeSet::new();
                let ids = ids
                    .into_iter()
                    .filter(|id| seen.insert(id.clone()))
                    .collect::<Vec<_>>();
                (customer, ids)
            })
            .collect();
        ZoneDirectory(zones)
    }

    /// Zones for a customer; empty when the customer has none on record.
    pub fn zone_ids(&self, customer: &str) -> &[String] {
        self.0.get(customer).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl<'de> Deserialize<'de> for ZoneDirectory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        BTreeMap::<String, Vec<String>>::deserialize(deserializer).map(ZoneDirectory::new)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointEntry {
    #[serde(alias = "value", alias = "identifier")]
    pub id: String,
    pub label: String,
}

impl EndpointEntry {
    pub fn new<S: Into<String>, L: Into<String>>(id: S, label: L) -> Self {
        EndpointEntry {
            id: id.into(),
            label: label.into(),
        }
    }

    pub fn is_select_all(&self) -> bool {
        self.id == SELECT_ALL_ID
    }
}

/// Ordered list of queryable endpoints, always led by the "select all" entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EndpointCatalog {
    entries: Vec<EndpointEntry>,
}

impl EndpointCatalog {
    pub fn new(entries: Vec<EndpointEntry>) -> Self {
        let mut seen = BTreeSet::new();
        let mut normalized = vec![EndpointEntry::new(SELECT_ALL_ID, SELECT_ALL_LABEL)];
        normalized.extend(
            entries
                .into_iter()
                .filter(|entry| !entry.is_select_all())
                .filter(|entry| seen.insert(entry.id.clone())),
        );
        EndpointCatalog {
            entries: normalized,
        }
    }

    /// Catalog built from the endpoints this crate knows how to format.
    #[cfg(test)]
    pub fn builtin() -> Self {
        use crate::endpoint::Endpoint;

        EndpointCatalog::new(
            Endpoint::KNOWN
                .iter()
                .map(|endpoint| EndpointEntry::new(endpoint.as_str(), endpoint.default_label()))
                .collect(),
        )
    }

    /// Every entry, including the synthetic "select all".
    pub fn entries(&self) -> &[EndpointEntry] {
        &self.entries
    }

    /// Entries that name a real metric.
    pub fn metrics(&self) -> impl Iterator<Item = &EndpointEntry> {
        self.entries.iter().filter(|entry| !entry.is_select_all())
    }

    pub fn label(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.label.as_str())
    }

    /// Resolve a selection into concrete endpoint ids, in selection order
    /// without duplicates. Selecting "all" yields every metric in catalog
    /// order.
    pub fn expand(&self, selected: &[String]) -> Vec<String> {
        if selected.iter().any(|id| id == SELECT_ALL_ID) {
            return self.metrics().map(|entry| entry.id.clone()).collect();
        }
        let mut seen = BTreeSet::new();
        selected
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }
}

impl Default for EndpointCatalog {
    fn default() -> Self {
        EndpointCatalog::new(Vec::new())
    }
}

impl<'de> Deserialize<'de> for EndpointCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Vec::<EndpointEntry>::deserialize(deserializer).map(EndpointCatalog::new)
    }
}

/// Everything fetched once before the first query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directories {
    pub accounts: AccountDirectory,
    pub zones: ZoneDirectory,
    pub catalog: EndpointCatalog,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Endpoint;

    #[test]
    fn catalog_leads_with_select_all() {
        let catalog: EndpointCatalog = serde_json::from_str(
            r#"[
                {"id": "workers_kv_read", "label": "KV Reads"},
                {"value": "all", "label": "Everything"},
                {"identifier": "images_stored", "label": "Images Stored"},
                {"id": "workers_kv_read", "label": "Duplicate"}
            ]"#,
        )
        .unwrap();

        let ids: Vec<&str> = catalog.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["all", "workers_kv_read", "images_stored"]);
        assert_eq!(catalog.label("all"), Some(SELECT_ALL_LABEL));
        assert_eq!(catalog.label("workers_kv_read"), Some("KV Reads"));
        assert_eq!(catalog.label("missing"), None);
    }

    #[test]
    fn expand_select_all_and_dedupe() {
        let catalog = EndpointCatalog::new(vec![
            EndpointEntry::new("a", "A"),
            EndpointEntry::new("b", "B"),
        ]);
        let all = catalog.expand(&["b".to_string(), "all".to_string()]);
        assert_eq!(all, ["a", "b"]);

        let picked = catalog.expand(&["b".to_string(), "a".to_string(), "b".to_string()]);
        assert_eq!(picked, ["b", "a"]);
    }

    #[test]
    fn builtin_catalog_covers_known_endpoints() {
        let catalog = EndpointCatalog::builtin();
        assert_eq!(catalog.metrics().count(), Endpoint::KNOWN.len());
        assert_eq!(
            catalog.label("data_transfer_request"),
            Some("Data Transfer & Requests")
        );
    }

    #[test]
    fn zones_dedupe_and_default_to_empty() {
        let zones: ZoneDirectory =
            serde_json::from_str(r#"{"Acme": ["z1", "z2", "z1"]}"#).unwrap();
        assert_eq!(zones.zone_ids("Acme"), ["z1", "z2"]);
        assert!(zones.zone_ids("Globex").is_empty());
    }

    #[test]
    fn accounts_resolve_tags() {
        let accounts: AccountDirectory =
            serde_json::from_str(r#"{"Acme": "tag-1", "Globex": "tag-2"}"#).unwrap();
        assert_eq!(accounts.account_tag("Acme"), Some("tag-1"));
        assert_eq!(accounts.account_tag("Initech"), None);
        assert_eq!(accounts.len(), 2);
    }
}
