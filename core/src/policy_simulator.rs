//! What-if projection of regional risk under a policy intervention.
//!
//! Each policy scales specific factor rates by a fixed multiplier; the
//! score is then recomputed with the regional risk weights. The simulation
//! is a pure function of a published RiskRecord and a policy.

use crate::{
    risk_aggregator::{RiskFactors, RiskRecord},
    types::{round1, RegionId},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Intervention type. Unknown names are kept and simulate as no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Policy {
    /// Broadband rollout: digital divide −30%, migration −10%.
    Broadband,
    /// Skilling programmes: skill deficit −25%.
    Skilling,
    /// Regional employment hubs: migration −40%.
    Hubs,
    Unrecognized(String),
}

impl Policy {
    pub fn label(&self) -> &str {
        match self {
            Self::Broadband       => "Broadband",
            Self::Skilling        => "Skilling",
            Self::Hubs            => "Hubs",
            Self::Unrecognized(s) => s,
        }
    }

    /// Per-factor multipliers applied to the published factor rates.
    pub fn multipliers(&self) -> RiskFactors {
        let (digital_divide, skill_deficit, migration) = match self {
            Self::Broadband       => (0.7, 1.0, 0.9),
            Self::Skilling        => (1.0, 0.75, 1.0),
            Self::Hubs            => (1.0, 1.0, 0.6),
            Self::Unrecognized(_) => (1.0, 1.0, 1.0),
        };
        RiskFactors { digital_divide, skill_deficit, migration }
    }
}

impl From<&str> for Policy {
    fn from(name: &str) -> Self {
        match name.trim() {
            "Broadband" => Self::Broadband,
            "Skilling"  => Self::Skilling,
            "Hubs"      => Self::Hubs,
            other       => Self::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for Policy {
    fn from(name: String) -> Self {
        Policy::from(name.as_str())
    }
}

impl From<Policy> for String {
    fn from(policy: Policy) -> Self {
        policy.label().to_string()
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySimulationResult {
    pub region:            RegionId,
    pub policy:            Policy,
    pub original:          RiskRecord,
    pub simulated_factors: RiskFactors,
    pub original_risk:     f64,
    pub simulated_risk:    f64,
    pub reduction:         f64,
    /// Original factor minus simulated factor, per factor.
    pub factors_impact:    RiskFactors,
}

pub fn simulate(record: &RiskRecord, policy: &Policy) -> PolicySimulationResult {
    let before = record.factors;
    let m = policy.multipliers();
    let after = RiskFactors {
        digital_divide: before.digital_divide * m.digital_divide,
        skill_deficit:  before.skill_deficit * m.skill_deficit,
        migration:      before.migration * m.migration,
    };
    let simulated_score = after.weighted_score();

    log::debug!(
        "policy {policy} on {}: {:.1} -> {:.1}",
        record.region,
        record.risk_score,
        simulated_score
    );

    PolicySimulationResult {
        region:            record.region.clone(),
        policy:            policy.clone(),
        original:          record.clone(),
        simulated_factors: after.rounded(),
        original_risk:     record.risk_score,
        simulated_risk:    round1(simulated_score),
        reduction:         round1(record.risk_score - simulated_score),
        factors_impact: RiskFactors {
            digital_divide: round1(before.digital_divide - after.digital_divide),
            skill_deficit:  round1(before.skill_deficit - after.skill_deficit),
            migration:      round1(before.migration - after.migration),
        },
    }
}
