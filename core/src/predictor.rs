//! Per-request skill inference and its presentation.

use crate::{
    error::{EngineError, EngineResult},
    profile::{DigitalAccess, OpportunityLevel, SettlementType},
    report::{
        CoreAssessment, Growth, GrowthPotential, Intelligence, MigrationRisk, PredictionReport,
        SkillLevel,
    },
    signals::{Signal, SignalInput, SignalVector},
    trainer::{ModelState, REGRESSOR_NAME},
    types::round1,
};
use serde::{Deserialize, Serialize};

const BASE_CONFIDENCE: f64 = 85.0;
const CONSISTENCY_CONFIDENCE_WEIGHT: f64 = 0.1;
const ANOMALY_CONFIDENCE: f64 = 10.0;
const HIDDEN_TALENT_SCORE: f64 = 70.0;
const MIGRATION_SCORE: f64 = 75.0;
const EXPONENTIAL_LEARNING: f64 = 80.0;

/// Context attributes as they arrive from a caller, all optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextInput {
    pub domain:            Option<String>,
    pub area_type:         Option<String>,
    pub digital_access:    Option<String>,
    pub opportunity_level: Option<String>,
}

/// Resolved context. Unrecognized labels resolve to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionContext {
    pub domain:            String,
    pub settlement:        Option<SettlementType>,
    pub digital_access:    Option<DigitalAccess>,
    pub opportunity_level: Option<OpportunityLevel>,
}

impl ContextInput {
    pub fn resolve(&self) -> PredictionContext {
        PredictionContext {
            domain: self.domain.clone().unwrap_or_else(|| "General".to_string()),
            settlement: self.area_type.as_deref().and_then(|s| s.parse().ok()),
            digital_access: self.digital_access.as_deref().and_then(|s| s.parse().ok()),
            opportunity_level: self.opportunity_level.as_deref().and_then(|s| s.parse().ok()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionRequest {
    pub signals: SignalInput,
    pub context: ContextInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateSource {
    Model,
    /// Models are offline; the estimate carries no information.
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillEstimate {
    pub score:      f64,
    pub is_anomaly: bool,
    pub source:     EstimateSource,
}

impl SkillEstimate {
    pub fn neutral() -> Self {
        Self { score: 0.0, is_anomaly: false, source: EstimateSource::Neutral }
    }
}

pub struct SkillPredictor<'a> {
    state: &'a ModelState,
}

impl<'a> SkillPredictor<'a> {
    pub fn new(state: &'a ModelState) -> Self {
        Self { state }
    }

    /// Score in [0, 100] plus the anomaly verdict.
    /// Inactive models give the neutral estimate, never an error.
    pub fn estimate(&self, signals: &SignalVector) -> EngineResult<SkillEstimate> {
        let Some(models) = self.state.models() else {
            return Ok(SkillEstimate::neutral());
        };
        if let Some(signal) = signals.first_non_finite() {
            return Err(EngineError::Inference(format!("signal {signal} is not finite")));
        }

        let raw = models.regressor.predict(signals);
        if !raw.is_finite() {
            return Err(EngineError::Inference(format!("regressor produced {raw}")));
        }
        let label = models.detector.predict(signals);

        Ok(SkillEstimate {
            score:      raw.clamp(0.0, 100.0),
            is_anomaly: label.is_outlier(),
            source:     EstimateSource::Model,
        })
    }
}

/// Either a scored report, or a signal that the caller must fall back.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    Scored(PredictionReport),
    Fallback { reason: String },
}

impl PredictionOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Render for the wire; fallbacks become the fixed heuristic payload.
    pub fn into_report(self) -> PredictionReport {
        match self {
            Self::Scored(report) => report,
            Self::Fallback { .. } => PredictionReport::heuristic_fallback(),
        }
    }
}

/// Caller-side presentation of an estimate.
pub fn present(
    estimate: &SkillEstimate,
    signals: &SignalVector,
    context: &PredictionContext,
) -> PredictionReport {
    let score = estimate.score;
    let consistency = signals.get(Signal::ExperienceConsistency);
    let learning = signals.get(Signal::LearningBehavior);

    let confidence = if estimate.is_anomaly {
        ANOMALY_CONFIDENCE
    } else {
        BASE_CONFIDENCE + consistency * CONSISTENCY_CONFIDENCE_WEIGHT
    };

    let hidden_talent_flag = score > HIDDEN_TALENT_SCORE
        && (context.settlement == Some(SettlementType::Rural)
            || context.digital_access == Some(DigitalAccess::Limited));

    let migration_risk = if score > MIGRATION_SCORE
        && context.opportunity_level == Some(OpportunityLevel::Low)
    {
        MigrationRisk::High
    } else {
        MigrationRisk::Low
    };

    let model_used = match estimate.source {
        EstimateSource::Model   => format!("{REGRESSOR_NAME} (boosted trees)"),
        EstimateSource::Neutral => "Offline (neutral estimate)".to_string(),
    };

    PredictionReport {
        core: CoreAssessment {
            score: round1(score),
            level: SkillLevel::for_score(score),
            domain: context.domain.clone(),
            confidence: round1(confidence),
        },
        intelligence: Intelligence {
            is_anomaly: estimate.is_anomaly,
            hidden_talent_flag,
            migration_risk,
            model_used,
        },
        growth: Growth {
            growth_potential: if learning > EXPONENTIAL_LEARNING {
                GrowthPotential::Exponential
            } else {
                GrowthPotential::Linear
            },
            learning_momentum: learning,
        },
        fallback: false,
    }
}
