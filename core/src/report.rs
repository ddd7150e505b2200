//! Response payloads the engine fills for its callers.
//!
//! Field names are the wire contract of the boundary layer; keep them stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    Expert,
    Advanced,
    Intermediate,
}

impl SkillLevel {
    pub fn for_score(score: f64) -> Self {
        if score > 80.0 {
            Self::Expert
        } else if score > 60.0 {
            Self::Advanced
        } else {
            Self::Intermediate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationRisk {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthPotential {
    Exponential,
    Linear,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreAssessment {
    pub score:      f64,
    pub level:      SkillLevel,
    pub domain:     String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intelligence {
    pub is_anomaly:         bool,
    pub hidden_talent_flag: bool,
    pub migration_risk:     MigrationRisk,
    pub model_used:         String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Growth {
    pub growth_potential:  GrowthPotential,
    pub learning_momentum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub core:         CoreAssessment,
    pub intelligence: Intelligence,
    pub growth:       Growth,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback:     bool,
}

impl PredictionReport {
    /// Fixed payload served when a single prediction cannot be computed.
    pub fn heuristic_fallback() -> Self {
        Self {
            core: CoreAssessment {
                score:      55.0,
                level:      SkillLevel::Intermediate,
                domain:     "General".into(),
                confidence: 60.0,
            },
            intelligence: Intelligence {
                is_anomaly:         false,
                hidden_talent_flag: false,
                migration_risk:     MigrationRisk::Low,
                model_used:         "Fallback Heuristic".into(),
            },
            growth: Growth {
                growth_potential:  GrowthPotential::Moderate,
                learning_momentum: 50.0,
            },
            fallback: true,
        }
    }
}

/// Success-shaped response for any fault that escapes an operation.
/// The cause is logged by whoever builds this; it is never sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackNotice {
    pub status:    String,
    pub message:   String,
    pub fallback:  bool,
    pub timestamp: DateTime<Utc>,
}

impl FallbackNotice {
    pub fn new() -> Self {
        Self {
            status:    "error".into(),
            message:   "Internal processing error - System fail-safe active".into(),
            fallback:  true,
            timestamp: Utc::now(),
        }
    }
}

impl Default for FallbackNotice {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_boundaries_are_exclusive() {
        assert_eq!(SkillLevel::for_score(80.0), SkillLevel::Advanced);
        assert_eq!(SkillLevel::for_score(80.1), SkillLevel::Expert);
        assert_eq!(SkillLevel::for_score(60.0), SkillLevel::Intermediate);
        assert_eq!(SkillLevel::for_score(60.5), SkillLevel::Advanced);
        assert_eq!(SkillLevel::for_score(0.0), SkillLevel::Intermediate);
    }

    #[test]
    fn heuristic_fallback_payload() {
        let report = PredictionReport::heuristic_fallback();
        assert_eq!(report.core.score, 55.0);
        assert_eq!(report.core.level, SkillLevel::Intermediate);
        assert_eq!(report.core.confidence, 60.0);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["fallback"], true);
        assert_eq!(json["intelligence"]["model_used"], "Fallback Heuristic");
    }

    #[test]
    fn scored_reports_omit_fallback_flag() {
        let mut report = PredictionReport::heuristic_fallback();
        report.fallback = false;
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("fallback").is_none());
    }

    #[test]
    fn notice_is_soft_failure() {
        let json = serde_json::to_value(FallbackNotice::new()).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["fallback"], true);
    }
}
