//! The scoring engine: one immutable handle over the profile store and the
//! models trained from it.
//!
//! STARTUP ORDER (fixed):
//!   1. Profile store is loaded or synthesized by the caller
//!   2. Models are trained exactly once
//!   3. Every later call is a read
//!
//! RULES:
//!   - initialize() never fails. An invalid config or a training error
//!     leaves the engine inactive.
//!   - Nothing mutates after initialize(), so the engine is shared freely
//!     across threads behind an Arc.
//!   - All randomness flows through the RngBank.

use crate::{
    config::EngineConfig,
    error::EngineResult,
    insights::{self, Alert, DataFoundation, EngineStatus, Health, MarketSignal,
               NationalDistribution, RegionSpecialization, RegionalSkill},
    policy_simulator::{self, Policy, PolicySimulationResult},
    predictor::{present, PredictionOutcome, PredictionRequest, SkillPredictor},
    risk_aggregator::{RiskAggregator, RiskRecord},
    rng::RngBank,
    store::ProfileStore,
    trainer::{ModelState, ModelTrainer},
    trend_analyzer::{DomainTrend, TrendAnalyzer},
    types::DomainLabel,
};
use std::collections::BTreeMap;

pub struct SkillEngine {
    pub config:   EngineConfig,
    pub rng_bank: RngBank,
    store:        ProfileStore,
    models:       ModelState,
}

impl SkillEngine {
    /// Train once over `store` and wrap everything in an engine.
    pub fn initialize(store: ProfileStore, config: EngineConfig) -> Self {
        let rng_bank = RngBank::new(config.seed);
        log::info!(
            "Initializing engine: {} profiles from {}",
            store.len(),
            store.source().describe()
        );
        let models = match config.validate() {
            Ok(()) => ModelTrainer::new(&config, &rng_bank).train(&store),
            Err(e) => {
                log::error!("Invalid engine config, models stay offline: {e}");
                ModelState::inactive(format!("invalid config: {e}"))
            }
        };
        Self { config, rng_bank, store, models }
    }

    /// Synthetic population from the test config, trained and ready.
    pub fn build_test(seed: u64) -> Self {
        let config = EngineConfig::default_test().with_seed(seed);
        let bank = RngBank::new(seed);
        let store = ProfileStore::synthesize(&config, &bank).unwrap_or_else(|e| {
            log::error!("Synthetic population unavailable: {e}");
            ProfileStore::empty()
        });
        Self::initialize(store, config)
    }

    pub fn is_active(&self) -> bool {
        self.models.is_active()
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn models(&self) -> &ModelState {
        &self.models
    }

    // ── Core operations ──────────────────────────────────────────────────────

    /// Score one request. Inference errors are logged and turned into a
    /// fallback outcome; they never reach the caller as errors.
    pub fn predict(&self, request: &PredictionRequest) -> PredictionOutcome {
        let signals = request.signals.complete();
        let context = request.context.resolve();
        match SkillPredictor::new(&self.models).estimate(&signals) {
            Ok(estimate) => PredictionOutcome::Scored(present(&estimate, &signals, &context)),
            Err(e) => {
                log::warn!("Prediction fell back to heuristic: {e}");
                PredictionOutcome::Fallback { reason: e.to_string() }
            }
        }
    }

    pub fn regional_risks(&self, region: Option<&str>) -> Vec<RiskRecord> {
        RiskAggregator::new(&self.store).calculate(region)
    }

    pub fn simulate_policy(
        &self,
        region: &str,
        policy: &Policy,
    ) -> EngineResult<PolicySimulationResult> {
        let record = RiskAggregator::new(&self.store).for_region(region)?;
        Ok(policy_simulator::simulate(&record, policy))
    }

    pub fn skill_trends(&self) -> BTreeMap<DomainLabel, DomainTrend> {
        TrendAnalyzer::new(&self.store, &self.config.trend, &self.rng_bank).analyze()
    }

    // ── Reporting ────────────────────────────────────────────────────────────

    pub fn status(&self) -> EngineStatus {
        insights::status(&self.models, &self.store)
    }

    pub fn alerts(&self) -> Vec<Alert> {
        insights::alerts(&self.models, &self.store, &self.config)
    }

    pub fn health(&self) -> Health {
        insights::health(&self.models, &self.store)
    }

    pub fn data_foundation(&self) -> Option<DataFoundation> {
        insights::data_foundation(&self.store)
    }

    pub fn region_specializations(&self) -> Vec<RegionSpecialization> {
        insights::region_specializations(&self.store)
    }

    pub fn market_intelligence(&self) -> BTreeMap<DomainLabel, MarketSignal> {
        insights::market_intelligence(&self.store, &self.config)
    }

    pub fn national_distribution(&self) -> NationalDistribution {
        insights::national_distribution(&self.store, &self.regional_risks(None), &self.skill_trends())
    }

    pub fn regional_analysis(&self) -> Vec<RegionalSkill> {
        insights::regional_analysis(&self.store)
    }
}
