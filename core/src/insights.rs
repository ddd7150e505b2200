//! Supplementary read-only analytics over the profile store.
//!
//! None of these touch the models except `status` and `alerts`, which
//! only report whether training succeeded.

use crate::{
    config::EngineConfig,
    profile::{DigitalAccess, Profile, SettlementType},
    risk_aggregator::{RiskRecord, RiskTier},
    store::ProfileStore,
    trainer::{ModelState, DETECTOR_NAME, REGRESSOR_NAME},
    trend_analyzer::DomainTrend,
    types::{percentage, round1, DomainLabel, RegionId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SPECIALIZATION_HIDDEN_SKILL: f64 = 65.0;
const HIDDEN_TALENT_SKILL: f64 = 70.0;
const DEFAULT_SUPPLY: f64 = 50.0;
const BASELINE_RISK: f64 = 50.0;

// ── Engine status ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub active:            bool,
    pub training_accuracy: String,
    pub models:            Vec<String>,
    pub dataset_size:      usize,
    pub last_trained:      DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure:           Option<String>,
}

pub fn status(models: &ModelState, store: &ProfileStore) -> EngineStatus {
    EngineStatus {
        active:            models.is_active(),
        training_accuracy: format!("{}%", models.training_score()),
        models: [REGRESSOR_NAME, DETECTOR_NAME, "Time-Series Trend Engine"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        dataset_size:      store.len(),
        last_trained:      models.trained_at(),
        failure:           models.failure().map(str::to_string),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind:    AlertKind,
    pub title:   String,
    pub message: String,
}

pub fn alerts(models: &ModelState, store: &ProfileStore, config: &EngineConfig) -> Vec<Alert> {
    let mut alerts = Vec::new();
    if models.is_active() {
        alerts.push(Alert {
            kind:    AlertKind::Info,
            title:   "AI System Active".into(),
            message: format!(
                "National Intelligence Engine operational with {}% accuracy.",
                models.training_score()
            ),
        });
    } else {
        alerts.push(Alert {
            kind:    AlertKind::Warning,
            title:   "AI Models Offline".into(),
            message: "System running in fallback mode. Predictions may be less accurate.".into(),
        });
    }
    if store.len() < config.low_data_volume_threshold {
        alerts.push(Alert {
            kind:    AlertKind::Warning,
            title:   "Low Data Volume".into(),
            message: format!(
                "Only {} profiles available. Expand dataset for better insights.",
                store.len()
            ),
        });
    }
    alerts
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status:        String,
    pub census_size:   usize,
    pub engine_status: String,
}

pub fn health(models: &ModelState, store: &ProfileStore) -> Health {
    Health {
        status:        "Active".into(),
        census_size:   store.len(),
        engine_status: if models.is_active() { "Operational" } else { "Fallback" }.into(),
    }
}

// ── Population summaries ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFoundation {
    pub profiles:     usize,
    pub regions:      usize,
    pub rural_ratio:  String,
    pub time_history: String,
    pub sources:      String,
}

/// `None` for an empty store.
pub fn data_foundation(store: &ProfileStore) -> Option<DataFoundation> {
    if store.is_empty() {
        return None;
    }
    let rural = store
        .profiles()
        .iter()
        .filter(|p| p.settlement == SettlementType::Rural)
        .count();
    Some(DataFoundation {
        profiles:     store.len(),
        regions:      store.regions().len(),
        rural_ratio:  format!("{}%", percentage(rural, store.len()).round_ties_even()),
        time_history: format!("{} Months", store.max_history_len()),
        sources:      store.source().describe(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSpecialization {
    pub region:             RegionId,
    pub specialization:     DomainLabel,
    pub avg_skill:          f64,
    pub hidden_talent_rate: f64,
}

/// Per region: the domain with the highest mean skill, and the share of
/// rural profiles scoring above 65.
pub fn region_specializations(store: &ProfileStore) -> Vec<RegionSpecialization> {
    store
        .regions()
        .into_iter()
        .map(|region| {
            let members: Vec<&Profile> = store.in_region(region).collect();

            let mut by_domain: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
            for p in &members {
                let entry = by_domain.entry(p.domain.as_str()).or_insert((0.0, 0));
                entry.0 += p.skill_score;
                entry.1 += 1;
            }
            let (specialization, avg_skill) = by_domain
                .iter()
                .map(|(domain, (sum, n))| (*domain, sum / *n as f64))
                .fold(("", f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });

            let hidden = members
                .iter()
                .filter(|p| {
                    p.settlement == SettlementType::Rural
                        && p.skill_score > SPECIALIZATION_HIDDEN_SKILL
                })
                .count();

            RegionSpecialization {
                region:             region.to_string(),
                specialization:     specialization.to_string(),
                avg_skill:          round1(avg_skill),
                hidden_talent_rate: round1(percentage(hidden, members.len())),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketStatus {
    #[serde(rename = "Critical Shortage")]
    CriticalShortage,
    Shortage,
    Balanced,
    Surplus,
}

impl MarketStatus {
    pub fn for_gap(gap: f64) -> Self {
        if gap > 10.0 {
            Self::CriticalShortage
        } else if gap > 5.0 {
            Self::Shortage
        } else if gap < -5.0 {
            Self::Surplus
        } else {
            Self::Balanced
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSignal {
    pub demand_index: f64,
    pub supply_index: f64,
    pub skill_gap:    f64,
    pub status:       MarketStatus,
}

/// Demand (configured) against supply (mean skill of the domain).
pub fn market_intelligence(
    store: &ProfileStore,
    config: &EngineConfig,
) -> BTreeMap<DomainLabel, MarketSignal> {
    config
        .market_demand
        .iter()
        .map(|d| {
            let (sum, n) = store
                .in_domain(&d.domain)
                .fold((0.0, 0usize), |(sum, n), p| (sum + p.skill_score, n + 1));
            let supply = if n == 0 { DEFAULT_SUPPLY } else { sum / n as f64 };
            let gap = d.demand - supply;
            (
                d.domain.clone(),
                MarketSignal {
                    demand_index: d.demand,
                    supply_index: round1(supply),
                    skill_gap:    round1(gap),
                    status:       MarketStatus::for_gap(gap),
                },
            )
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalDistribution {
    pub stability_index:    f64,
    pub hidden_talent_rate: f64,
    pub critical_zones:     usize,
    pub skill_velocity:     f64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback:           bool,
}

impl NationalDistribution {
    fn baseline() -> Self {
        Self {
            stability_index:    100.0 - BASELINE_RISK,
            hidden_talent_rate: 0.0,
            critical_zones:     0,
            skill_velocity:     0.0,
            fallback:           true,
        }
    }
}

/// Country-wide roll-up of regional risk and domain trends.
pub fn national_distribution(
    store: &ProfileStore,
    risks: &[RiskRecord],
    trends: &BTreeMap<DomainLabel, DomainTrend>,
) -> NationalDistribution {
    if store.is_empty() {
        return NationalDistribution::baseline();
    }
    let avg_risk = if risks.is_empty() {
        BASELINE_RISK
    } else {
        risks.iter().map(|r| r.risk_score).sum::<f64>() / risks.len() as f64
    };
    let hidden = store
        .profiles()
        .iter()
        .filter(|p| {
            p.skill_score > HIDDEN_TALENT_SKILL
                && (p.settlement == SettlementType::Rural
                    || p.digital_access == DigitalAccess::Limited)
        })
        .count();
    let velocity = if trends.is_empty() {
        0.0
    } else {
        trends.values().map(|t| t.growth_rate).sum::<f64>() / trends.len() as f64
    };

    NationalDistribution {
        stability_index:    round1(100.0 - avg_risk),
        hidden_talent_rate: round1(percentage(hidden, store.len())),
        critical_zones:     risks.iter().filter(|r| r.tier == RiskTier::Critical).count(),
        skill_velocity:     round1(velocity),
        fallback:           false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillRiskLevel {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalSkill {
    pub region:     RegionId,
    pub avg_skill:  f64,
    pub risk_level: SkillRiskLevel,
}

/// Mean skill per region; low averages are high risk.
pub fn regional_analysis(store: &ProfileStore) -> Vec<RegionalSkill> {
    store
        .regions()
        .into_iter()
        .map(|region| {
            let (sum, n) = store
                .in_region(region)
                .fold((0.0, 0usize), |(sum, n), p| (sum + p.skill_score, n + 1));
            let avg = if n == 0 { 0.0 } else { sum / n as f64 };
            let risk_level = if avg < 50.0 {
                SkillRiskLevel::High
            } else if avg < 70.0 {
                SkillRiskLevel::Moderate
            } else {
                SkillRiskLevel::Low
            };
            RegionalSkill { region: region.to_string(), avg_skill: round1(avg), risk_level }
        })
        .collect()
}
