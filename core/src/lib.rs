//! SkillGenome scoring engine.
//!
//! Trains a skill regressor and an anomaly detector over a population of
//! talent profiles, then serves per-profile predictions, regional risk,
//! policy what-ifs and domain trends from one shared `SkillEngine`.

pub mod anomaly;
pub mod config;
pub mod engine;
pub mod error;
pub mod insights;
pub mod policy_simulator;
pub mod predictor;
pub mod profile;
pub mod regressor;
pub mod report;
pub mod risk_aggregator;
pub mod rng;
pub mod signals;
pub mod store;
pub mod trainer;
pub mod trend_analyzer;
pub mod types;
