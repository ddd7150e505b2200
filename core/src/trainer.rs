//! One-shot model training over the profile store.
//!
//! RULE: Training never fails the caller. Any error is logged and yields
//! an inactive ModelState, which every consumer treats as degraded mode.

use crate::{
    anomaly::IsolationForest,
    config::EngineConfig,
    error::EngineResult,
    regressor::GradientBoostedRegressor,
    rng::{RngBank, StreamSlot},
    store::ProfileStore,
    types::round1,
};
use chrono::{DateTime, Utc};

pub const REGRESSOR_NAME: &str = "GradientBoostingRegressor";
pub const DETECTOR_NAME: &str = "IsolationForest";

/// Both fitted models. Exists only when both fits succeeded.
#[derive(Debug, Clone)]
pub struct TrainedModels {
    pub regressor: GradientBoostedRegressor,
    pub detector:  IsolationForest,
}

/// Immutable result of startup training.
#[derive(Debug, Clone)]
pub struct ModelState {
    models:         Option<TrainedModels>,
    training_score: f64,
    trained_at:     DateTime<Utc>,
    failure:        Option<String>,
}

impl ModelState {
    /// A state with no models. Every prediction takes the neutral path.
    pub fn inactive(reason: impl Into<String>) -> Self {
        Self {
            models:         None,
            training_score: 0.0,
            trained_at:     Utc::now(),
            failure:        Some(reason.into()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.models.is_some()
    }

    pub fn models(&self) -> Option<&TrainedModels> {
        self.models.as_ref()
    }

    /// In-sample R² as a percentage, one decimal. 0 when inactive.
    pub fn training_score(&self) -> f64 {
        self.training_score
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Why training failed, when it did.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}

pub struct ModelTrainer<'a> {
    config: &'a EngineConfig,
    bank:   &'a RngBank,
}

impl<'a> ModelTrainer<'a> {
    pub fn new(config: &'a EngineConfig, bank: &'a RngBank) -> Self {
        Self { config, bank }
    }

    pub fn train(&self, store: &ProfileStore) -> ModelState {
        match self.try_train(store) {
            Ok((models, score)) => {
                log::info!("Models active (R2 accuracy {score}%)");
                ModelState {
                    models:         Some(models),
                    training_score: score,
                    trained_at:     Utc::now(),
                    failure:        None,
                }
            }
            Err(e) => {
                log::error!("Model training failed: {e}");
                log::warn!("Engine will continue without models (degraded mode)");
                ModelState::inactive(e.to_string())
            }
        }
    }

    fn try_train(&self, store: &ProfileStore) -> EngineResult<(TrainedModels, f64)> {
        let x = store.feature_matrix();
        let y = store.targets();

        log::info!("Training {REGRESSOR_NAME} on {} profiles", x.len());
        let regressor = GradientBoostedRegressor::fit(&x, &y, &self.config.regressor)?;
        let score = round1(regressor.r_squared(&x, &y) * 100.0);
        log::info!("Skill model trained (R2 accuracy {score}%)");

        log::info!("Training {DETECTOR_NAME} for anomaly detection");
        let mut rng = self.bank.for_stream(StreamSlot::AnomalyForest);
        let detector = IsolationForest::fit(&x, &self.config.anomaly, &mut rng)?;
        log::debug!("Anomaly threshold {:.4}", detector.threshold());

        Ok((TrainedModels { regressor, detector }, score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trains_on_synthetic_population() {
        let config = EngineConfig::default_test();
        let bank = RngBank::new(config.seed);
        let store = ProfileStore::synthesize(&config, &bank).unwrap();
        let state = ModelTrainer::new(&config, &bank).train(&store);

        assert!(state.is_active());
        assert!(state.failure().is_none());
        assert!(state.training_score() > 0.0 && state.training_score() <= 100.0);
    }

    #[test]
    fn empty_store_yields_inactive_state() {
        let config = EngineConfig::default_test();
        let bank = RngBank::new(config.seed);
        let state = ModelTrainer::new(&config, &bank).train(&ProfileStore::empty());

        assert!(!state.is_active());
        assert!(state.models().is_none());
        assert_eq!(state.training_score(), 0.0);
        assert!(state.failure().is_some());
    }
}
