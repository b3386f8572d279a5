//! Repository index data model

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::API_VERSION;
use crate::index::error::IndexError;
use crate::index::semver::{Constraint, parse_version};

/// One published version of a chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hex-encoded SHA-256 of the chart archive
    #[serde(default)]
    pub digest: String,
    /// Download locations, absolute or relative to the repository URL
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

/// Index of every chart version a repository serves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCatalog {
    #[serde(default)]
    pub api_version: String,
    #[serde(default = "Utc::now")]
    pub generated: DateTime<Utc>,
    #[serde(default)]
    pub entries: IndexMap<String, Vec<VersionRecord>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub public_keys: Vec<String>,
}

impl Default for VersionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionCatalog {
    pub fn new() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            generated: Utc::now(),
            entries: IndexMap::new(),
            public_keys: Vec::new(),
        }
    }

    /// Append a record unless the exact version is already indexed.
    pub fn add(&mut self, record: VersionRecord) {
        if self.has(&record.name, &record.version) {
            return;
        }
        self.entries
            .entry(record.name.clone())
            .or_default()
            .push(record);
    }

    pub fn has(&self, name: &str, version: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|records| records.iter().any(|r| r.version == version))
    }

    /// Look up a chart version.
    ///
    /// An empty `constraint` selects the first stable (non pre-release) version in
    /// the current ordering, which is the newest one once [`sort_entries`] has run.
    /// Otherwise an exact version match wins, then the highest version satisfying
    /// `constraint` as a range expression.
    ///
    /// [`sort_entries`]: VersionCatalog::sort_entries
    pub fn get(&self, name: &str, constraint: &str) -> Result<&VersionRecord, IndexError> {
        let not_found = || IndexError::ChartNotFound {
            name: name.to_string(),
            constraint: constraint.to_string(),
        };

        let records = self.entries.get(name).ok_or_else(not_found)?;

        if constraint.is_empty() {
            return records
                .iter()
                .find(|r| parse_version(&r.version).is_some_and(|v| v.pre.is_empty()))
                .ok_or_else(not_found);
        }

        if let Some(record) = records.iter().find(|r| r.version == constraint) {
            return Ok(record);
        }

        let range = Constraint::parse(constraint)
            .ok_or_else(|| IndexError::InvalidConstraint(constraint.to_string()))?;

        records
            .iter()
            .filter_map(|r| {
                let parsed = parse_version(&r.version)?;
                range.matches(&parsed).then_some((r, parsed))
            })
            .max_by(|(_, a), (_, b)| a.cmp(b))
            .map(|(record, _)| record)
            .ok_or_else(not_found)
    }

    /// Merge `other` into this catalog.
    ///
    /// Records already present here are kept as they are; only versions this
    /// catalog lacks are copied over. Ordering is not restored.
    pub fn merge(&mut self, other: &VersionCatalog) {
        for (name, records) in &other.entries {
            match self.entries.get_mut(name) {
                None => {
                    self.entries.insert(name.clone(), records.clone());
                }
                Some(existing) => {
                    for record in records {
                        if !existing.iter().any(|r| r.version == record.version) {
                            existing.push(record.clone());
                        }
                    }
                }
            }
        }
    }

    /// Sort every chart's versions newest first.
    ///
    /// Versions that are not valid semver go last, in their original order.
    pub fn sort_entries(&mut self) {
        for records in self.entries.values_mut() {
            records.sort_by_cached_key(|r| Reverse(parse_version(&r.version)));
        }
    }

    pub fn chart_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
