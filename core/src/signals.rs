//! The ten behavioral/economic signals and their fixed feature order.
//!
//! RULE: Feature order is defined once, by `Signal::ALL`.
//! The trainer and the predictor both build vectors through this module,
//! so a model can never see features in a different order than it was fit on.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const SIGNAL_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    CreationOutput,
    LearningBehavior,
    ExperienceConsistency,
    EconomicActivity,
    InnovationProblemSolving,
    CollaborationCommunity,
    OfflineCapability,
    DigitalPresence,
    LearningHours,
    Projects,
}

impl Signal {
    /// Training and inference feature order. Append only.
    pub const ALL: [Signal; SIGNAL_COUNT] = [
        Signal::CreationOutput,
        Signal::LearningBehavior,
        Signal::ExperienceConsistency,
        Signal::EconomicActivity,
        Signal::InnovationProblemSolving,
        Signal::CollaborationCommunity,
        Signal::OfflineCapability,
        Signal::DigitalPresence,
        Signal::LearningHours,
        Signal::Projects,
    ];

    /// Column name in the profile table and key in request payloads.
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreationOutput           => "creation_output",
            Self::LearningBehavior         => "learning_behavior",
            Self::ExperienceConsistency    => "experience_consistency",
            Self::EconomicActivity         => "economic_activity",
            Self::InnovationProblemSolving => "innovation_problem_solving",
            Self::CollaborationCommunity   => "collaboration_community",
            Self::OfflineCapability        => "offline_capability",
            Self::DigitalPresence          => "digital_presence",
            Self::LearningHours            => "learning_hours",
            Self::Projects                 => "projects",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A complete, fixed-order feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalVector([f64; SIGNAL_COUNT]);

impl SignalVector {
    pub fn new(values: [f64; SIGNAL_COUNT]) -> Self {
        Self(values)
    }

    pub fn get(&self, signal: Signal) -> f64 {
        self.0[signal.index()]
    }

    pub fn set(&mut self, signal: Signal, value: f64) {
        self.0[signal.index()] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Feature by position, as the tree learners address it.
    pub fn feature(&self, index: usize) -> f64 {
        self.0[index]
    }

    /// First signal holding a NaN or infinity, if any.
    pub fn first_non_finite(&self) -> Option<Signal> {
        Signal::ALL.into_iter().find(|s| !self.get(*s).is_finite())
    }
}

/// Partial signal input as it arrives from a caller.
/// Every field is optional; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalInput {
    pub creation_output:            Option<f64>,
    pub learning_behavior:          Option<f64>,
    pub experience_consistency:     Option<f64>,
    pub economic_activity:          Option<f64>,
    pub innovation_problem_solving: Option<f64>,
    pub collaboration_community:    Option<f64>,
    pub offline_capability:         Option<f64>,
    pub digital_presence:           Option<f64>,
    pub learning_hours:             Option<f64>,
    pub projects:                   Option<f64>,
}

impl SignalInput {
    pub fn value(&self, signal: Signal) -> Option<f64> {
        match signal {
            Signal::CreationOutput           => self.creation_output,
            Signal::LearningBehavior         => self.learning_behavior,
            Signal::ExperienceConsistency    => self.experience_consistency,
            Signal::EconomicActivity         => self.economic_activity,
            Signal::InnovationProblemSolving => self.innovation_problem_solving,
            Signal::CollaborationCommunity   => self.collaboration_community,
            Signal::OfflineCapability        => self.offline_capability,
            Signal::DigitalPresence          => self.digital_presence,
            Signal::LearningHours            => self.learning_hours,
            Signal::Projects                 => self.projects,
        }
    }

    /// Complete the input: every absent signal becomes 0.
    pub fn complete(&self) -> SignalVector {
        let mut vector = SignalVector::default();
        for signal in Signal::ALL {
            vector.set(signal, self.value(signal).unwrap_or(0.0));
        }
        vector
    }
}

impl From<SignalVector> for SignalInput {
    fn from(vector: SignalVector) -> Self {
        Self {
            creation_output:            Some(vector.get(Signal::CreationOutput)),
            learning_behavior:          Some(vector.get(Signal::LearningBehavior)),
            experience_consistency:     Some(vector.get(Signal::ExperienceConsistency)),
            economic_activity:          Some(vector.get(Signal::EconomicActivity)),
            innovation_problem_solving: Some(vector.get(Signal::InnovationProblemSolving)),
            collaboration_community:    Some(vector.get(Signal::CollaborationCommunity)),
            offline_capability:         Some(vector.get(Signal::OfflineCapability)),
            digital_presence:           Some(vector.get(Signal::DigitalPresence)),
            learning_hours:             Some(vector.get(Signal::LearningHours)),
            projects:                   Some(vector.get(Signal::Projects)),
        }
    }
}
