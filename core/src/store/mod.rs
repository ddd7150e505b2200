//! In-memory profile table.
//!
//! RULE: Only store/ingest.rs reads raw tabular input.
//! Engine components query the store through these read-only helpers.
//! The store is never mutated after ingestion.

use crate::{
    profile::Profile,
    signals::SignalVector,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

mod ingest;

pub use ingest::REQUIRED_COLUMNS;

/// Where the profiles came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum DataSource {
    Synthetic,
    File(String),
    InMemory,
}

impl DataSource {
    pub fn describe(&self) -> String {
        match self {
            Self::Synthetic  => "Synthetic (generated at startup)".to_string(),
            Self::File(path) => format!("File ({path})"),
            Self::InMemory   => "In-memory".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    profiles: Vec<Profile>,
    source:   DataSource,
}

impl ProfileStore {
    pub fn new(profiles: Vec<Profile>, source: DataSource) -> Self {
        Self { profiles, source }
    }

    /// Wrap already-typed profiles (used by tests and embedding callers).
    pub fn from_profiles(profiles: Vec<Profile>) -> Self {
        Self::new(profiles, DataSource::InMemory)
    }

    pub fn empty() -> Self {
        Self::from_profiles(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    // ── Grouping ─────────────────────────────────────────────────

    /// Distinct regions in order of first appearance.
    pub fn regions(&self) -> Vec<&str> {
        unique_in_order(self.profiles.iter().map(|p| p.region.as_str()))
    }

    /// Distinct domains in order of first appearance.
    pub fn domains(&self) -> Vec<&str> {
        unique_in_order(self.profiles.iter().map(|p| p.domain.as_str()))
    }

    pub fn has_region(&self, region: &str) -> bool {
        self.profiles.iter().any(|p| p.region == region)
    }

    pub fn in_region<'a>(&'a self, region: &'a str) -> impl Iterator<Item = &'a Profile> + 'a {
        self.profiles.iter().filter(move |p| p.region == region)
    }

    pub fn in_domain<'a>(&'a self, domain: &'a str) -> impl Iterator<Item = &'a Profile> + 'a {
        self.profiles.iter().filter(move |p| p.domain == domain)
    }

    // ── Training views ───────────────────────────────────────────

    pub fn feature_matrix(&self) -> Vec<SignalVector> {
        self.profiles.iter().map(|p| p.signals).collect()
    }

    pub fn targets(&self) -> Vec<f64> {
        self.profiles.iter().map(|p| p.skill_score).collect()
    }

    /// Length of the longest stored trajectory.
    pub fn max_history_len(&self) -> usize {
        self.profiles
            .iter()
            .filter_map(|p| p.skill_history.as_ref().map(Vec::len))
            .max()
            .unwrap_or(0)
    }
}

fn unique_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{DigitalAccess, OpportunityLevel, SettlementType};

    fn profile(region: &str, domain: &str) -> Profile {
        Profile {
            signals:           SignalVector::default(),
            region:            region.into(),
            digital_access:    DigitalAccess::High,
            opportunity_level: OpportunityLevel::High,
            settlement:        SettlementType::Urban,
            domain:            domain.into(),
            skill_score:       50.0,
            skill_history:     None,
        }
    }

    #[test]
    fn regions_keep_first_appearance_order() {
        let store = ProfileStore::from_profiles(vec![
            profile("Punjab", "Business"),
            profile("Bihar", "Technology"),
            profile("Punjab", "Technology"),
            profile("Kerala", "Business"),
        ]);
        assert_eq!(store.regions(), vec!["Punjab", "Bihar", "Kerala"]);
        assert_eq!(store.domains(), vec!["Business", "Technology"]);
        assert_eq!(store.in_region("Punjab").count(), 2);
        assert!(!store.has_region("Goa"));
    }

    #[test]
    fn empty_store_has_no_groups() {
        let store = ProfileStore::empty();
        assert!(store.is_empty());
        assert!(store.regions().is_empty());
        assert_eq!(store.max_history_len(), 0);
    }
}
