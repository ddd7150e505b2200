//! Regional risk aggregation.
//!
//! Three factor rates per region, each a percentage of that region's
//! profiles, combined with fixed weights:
//!   risk = 0.4 * digital_divide + 0.4 * skill_deficit + 0.2 * migration
//!
//! Computed fresh on every call; nothing is cached.

use crate::{
    error::{EngineError, EngineResult},
    profile::{OpportunityLevel, Profile},
    signals::Signal,
    store::ProfileStore,
    types::{percentage, round1, RegionId},
};
use serde::{Deserialize, Serialize};

// ── Constants ────────────────────────────────────────────────────────────────

pub const DIGITAL_DIVIDE_WEIGHT: f64 = 0.4;
pub const SKILL_DEFICIT_WEIGHT: f64 = 0.4;
pub const MIGRATION_WEIGHT: f64 = 0.2;

const SKILL_DEFICIT_CUTOFF: f64 = 40.0; // learning_behavior below this
const MIGRATION_SKILL_CUTOFF: f64 = 70.0; // skill above this, with low opportunity
const CRITICAL_THRESHOLD: f64 = 50.0;
const MODERATE_THRESHOLD: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Moderate,
    Critical,
}

impl RiskTier {
    pub fn for_score(score: f64) -> Self {
        if score > CRITICAL_THRESHOLD {
            Self::Critical
        } else if score > MODERATE_THRESHOLD {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

/// The three factor rates, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskFactors {
    pub digital_divide: f64,
    pub skill_deficit:  f64,
    pub migration:      f64,
}

impl RiskFactors {
    /// Factor rates over one population in a single pass.
    /// An empty population yields all zeros.
    pub fn from_profiles<'a>(profiles: impl IntoIterator<Item = &'a Profile>) -> Self {
        let (mut total, mut divide, mut deficit, mut migration) = (0usize, 0usize, 0usize, 0usize);
        for p in profiles {
            total += 1;
            if p.digital_access.is_constrained() {
                divide += 1;
            }
            if p.signals.get(Signal::LearningBehavior) < SKILL_DEFICIT_CUTOFF {
                deficit += 1;
            }
            if p.skill_score > MIGRATION_SKILL_CUTOFF
                && p.opportunity_level == OpportunityLevel::Low
            {
                migration += 1;
            }
        }
        Self {
            digital_divide: percentage(divide, total),
            skill_deficit:  percentage(deficit, total),
            migration:      percentage(migration, total),
        }
    }

    pub fn weighted_score(&self) -> f64 {
        self.digital_divide * DIGITAL_DIVIDE_WEIGHT
            + self.skill_deficit * SKILL_DEFICIT_WEIGHT
            + self.migration * MIGRATION_WEIGHT
    }

    pub fn rounded(&self) -> Self {
        Self {
            digital_divide: round1(self.digital_divide),
            skill_deficit:  round1(self.skill_deficit),
            migration:      round1(self.migration),
        }
    }
}

/// Published risk for one region. Factors and score are rounded to one
/// decimal; the tier is decided on the unrounded score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub region:     RegionId,
    pub risk_score: f64,
    pub tier:       RiskTier,
    pub factors:    RiskFactors,
}

impl RiskRecord {
    pub fn from_factors(region: impl Into<RegionId>, factors: RiskFactors) -> Self {
        let score = factors.weighted_score();
        Self {
            region:     region.into(),
            risk_score: round1(score),
            tier:       RiskTier::for_score(score),
            factors:    factors.rounded(),
        }
    }
}

pub struct RiskAggregator<'a> {
    store: &'a ProfileStore,
}

impl<'a> RiskAggregator<'a> {
    pub fn new(store: &'a ProfileStore) -> Self {
        Self { store }
    }

    /// All regions in store order, or only `region_filter`.
    /// An unknown filtered region yields no records.
    pub fn calculate(&self, region_filter: Option<&str>) -> Vec<RiskRecord> {
        let regions: Vec<&str> = match region_filter {
            Some(region) if self.store.has_region(region) => vec![region],
            Some(region) => {
                log::debug!("risk: region '{region}' has no profiles");
                Vec::new()
            }
            None => self.store.regions(),
        };

        regions
            .into_iter()
            .map(|region| {
                let record =
                    RiskRecord::from_factors(region, RiskFactors::from_profiles(self.store.in_region(region)));
                log::debug!(
                    "risk: region={} score={:.1} tier={:?}",
                    record.region,
                    record.risk_score,
                    record.tier
                );
                record
            })
            .collect()
    }

    /// Risk for exactly one region.
    pub fn for_region(&self, region: &str) -> EngineResult<RiskRecord> {
        self.calculate(Some(region))
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::UnknownRegion { region: region.to_string() })
    }
}
