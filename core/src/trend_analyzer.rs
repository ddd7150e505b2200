//! Per-domain skill-growth velocity from stored trajectories.

use crate::{
    config::TrendConfig,
    profile::Profile,
    rng::{RngBank, StreamSlot},
    store::ProfileStore,
    types::{round1, DomainLabel},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendStatus {
    Emerging,
    Stable,
    Declining,
}

impl TrendStatus {
    pub fn classify(velocity: f64, threshold: f64) -> Self {
        if velocity > threshold {
            Self::Emerging
        } else if velocity < -threshold {
            Self::Declining
        } else {
            Self::Stable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainTrend {
    pub status:      TrendStatus,
    /// Annualized velocity, one decimal.
    pub growth_rate: f64,
}

/// Slope over the trailing `window` points: (last − first) / window.
/// `None` for trajectories too short to have a slope.
pub fn trajectory_slope(history: &[f64], window: usize) -> Option<f64> {
    if history.len() <= 1 || window == 0 {
        return None;
    }
    let recent = &history[history.len().saturating_sub(window)..];
    let (first, last) = (recent[0], recent[recent.len() - 1]);
    Some((last - first) / window as f64)
}

pub struct TrendAnalyzer<'a> {
    store:  &'a ProfileStore,
    config: &'a TrendConfig,
    bank:   &'a RngBank,
}

impl<'a> TrendAnalyzer<'a> {
    pub fn new(store: &'a ProfileStore, config: &'a TrendConfig, bank: &'a RngBank) -> Self {
        Self { store, config, bank }
    }

    /// Trend per domain. Sampling restarts from the same stream on every
    /// call, so repeated calls over the same store agree.
    pub fn analyze(&self) -> BTreeMap<DomainLabel, DomainTrend> {
        let mut rng = self.bank.for_stream(StreamSlot::TrendSampler);
        let mut trends = BTreeMap::new();

        for domain in self.store.domains() {
            let carrying: Vec<&Profile> = self
                .store
                .in_domain(domain)
                .filter(|p| p.skill_history.is_some())
                .collect();
            let sample = rng.sample_indices(carrying.len(), self.config.sample_cap);

            let slopes: Vec<f64> = sample
                .iter()
                .filter_map(|&i| carrying[i].skill_history.as_deref())
                .filter_map(|h| trajectory_slope(h, self.config.window))
                .collect();
            let velocity = if slopes.is_empty() {
                0.0
            } else {
                slopes.iter().sum::<f64>() / slopes.len() as f64
            };

            let trend = DomainTrend {
                status:      TrendStatus::classify(velocity, self.config.emerging_threshold),
                growth_rate: round1(velocity * self.config.periods_per_year),
            };
            log::debug!(
                "trend: domain={domain} sampled={} velocity={velocity:.3} status={:?}",
                slopes.len(),
                trend.status
            );
            trends.insert(domain.to_string(), trend);
        }
        trends
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{DigitalAccess, OpportunityLevel, SettlementType};
    use crate::signals::SignalVector;

    fn profile(domain: &str, history: Option<Vec<f64>>) -> Profile {
        Profile {
            signals:           SignalVector::default(),
            region:            "Kerala".into(),
            digital_access:    DigitalAccess::Regular,
            opportunity_level: OpportunityLevel::Moderate,
            settlement:        SettlementType::SemiUrban,
            domain:            domain.into(),
            skill_score:       60.0,
            skill_history:     history,
        }
    }

    fn analyze(store: &ProfileStore) -> BTreeMap<DomainLabel, DomainTrend> {
        let config = TrendConfig::default();
        let bank = RngBank::new(1);
        TrendAnalyzer::new(store, &config, &bank).analyze()
    }

    #[test]
    fn slope_uses_last_six_points() {
        let slope = trajectory_slope(&[10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 22.0], 6).unwrap();
        assert!((slope - 10.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn short_trajectories_divide_by_full_window() {
        assert_eq!(trajectory_slope(&[10.0, 16.0], 6), Some(1.0));
        assert_eq!(trajectory_slope(&[10.0], 6), None);
        assert_eq!(trajectory_slope(&[], 6), None);
    }

    #[test]
    fn rising_domain_is_emerging() {
        let store = ProfileStore::from_profiles(vec![profile(
            "Technology",
            Some(vec![10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 22.0]),
        )]);
        let trends = analyze(&store);
        let tech = trends["Technology"];
        assert_eq!(tech.status, TrendStatus::Emerging);
        assert_eq!(tech.growth_rate, 20.0);
    }

    #[test]
    fn falling_and_flat_domains() {
        let store = ProfileStore::from_profiles(vec![
            profile("Agriculture", Some(vec![80.0, 76.0, 72.0, 68.0, 64.0, 60.0])),
            profile("Business", Some(vec![50.0, 51.0, 50.0, 51.0, 50.0, 51.0])),
        ]);
        let trends = analyze(&store);
        assert_eq!(trends["Agriculture"].status, TrendStatus::Declining);
        assert_eq!(trends["Agriculture"].growth_rate, -40.0);
        assert_eq!(trends["Business"].status, TrendStatus::Stable);
    }

    #[test]
    fn domains_without_history_are_stable_at_zero() {
        let store = ProfileStore::from_profiles(vec![
            profile("Business", None),
            profile("Business", Some(vec![42.0])),
        ]);
        let trends = analyze(&store);
        assert_eq!(trends["Business"], DomainTrend { status: TrendStatus::Stable, growth_rate: 0.0 });
    }

    #[test]
    fn repeated_analysis_agrees() {
        let config = crate::config::EngineConfig::default_test();
        let bank = RngBank::new(config.seed);
        let store = ProfileStore::synthesize(&config, &bank).unwrap();
        let analyzer = TrendAnalyzer::new(&store, &config.trend, &bank);
        assert_eq!(analyzer.analyze(), analyzer.analyze());
    }
}
