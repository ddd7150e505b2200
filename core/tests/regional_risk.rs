//! Regional risk and policy simulation over a hand-built population.

use skillgenome_core::{
    config::EngineConfig,
    engine::SkillEngine,
    error::EngineError,
    policy_simulator::Policy,
    profile::{DigitalAccess, OpportunityLevel, Profile, SettlementType},
    risk_aggregator::{RiskFactors, RiskTier},
    signals::{Signal, SignalVector},
    store::ProfileStore,
};

fn profile(
    region: &str,
    access: DigitalAccess,
    learning: f64,
    skill: f64,
    opportunity: OpportunityLevel,
) -> Profile {
    let mut signals = SignalVector::new([50.0; 10]);
    signals.set(Signal::LearningBehavior, learning);
    Profile {
        signals,
        region:            region.into(),
        digital_access:    access,
        opportunity_level: opportunity,
        settlement:        SettlementType::Rural,
        domain:            "Agriculture".into(),
        skill_score:       skill,
        skill_history:     None,
    }
}

/// Maharashtra: 10 profiles, 5 constrained, 3 deficient, 2 migrating.
/// Karnataka: 4 profiles, none at risk.
fn engine() -> SkillEngine {
    use DigitalAccess::*;
    use OpportunityLevel as O;
    let mut profiles = Vec::new();
    for i in 0..10 {
        let access = if i < 5 { Limited } else { High };
        let learning = if i < 3 { 20.0 } else { 60.0 };
        let (skill, opp) = if i >= 8 { (85.0, O::Low) } else { (55.0, O::High) };
        profiles.push(profile("Maharashtra", access, learning, skill, opp));
    }
    for _ in 0..4 {
        profiles.push(profile("Karnataka", Regular, 70.0, 60.0, O::High));
    }
    SkillEngine::initialize(ProfileStore::from_profiles(profiles), EngineConfig::default_test())
}

#[test]
fn factor_rates_and_weighted_score() {
    let risks = engine().regional_risks(Some("Maharashtra"));
    assert_eq!(risks.len(), 1);
    let r = &risks[0];
    assert_eq!(
        r.factors,
        RiskFactors { digital_divide: 50.0, skill_deficit: 30.0, migration: 20.0 }
    );
    assert_eq!(r.risk_score, 36.0);
    assert_eq!(r.tier, RiskTier::Moderate);
}

#[test]
fn every_region_is_reported_in_store_order() {
    let risks = engine().regional_risks(None);
    let regions: Vec<&str> = risks.iter().map(|r| r.region.as_str()).collect();
    assert_eq!(regions, vec!["Maharashtra", "Karnataka"]);

    let calm = &risks[1];
    assert_eq!(calm.risk_score, 0.0);
    assert_eq!(calm.tier, RiskTier::Low);
    for r in &risks {
        assert!((0.0..=100.0).contains(&r.risk_score), "Score out of range: {}", r.risk_score);
    }
}

#[test]
fn unknown_region_filter_is_empty() {
    assert!(engine().regional_risks(Some("Atlantis")).is_empty());
}

#[test]
fn broadband_policy_on_maharashtra() {
    let sim = engine().simulate_policy("Maharashtra", &Policy::Broadband).unwrap();
    assert_eq!(sim.original_risk, 36.0);
    assert_eq!(
        sim.simulated_factors,
        RiskFactors { digital_divide: 35.0, skill_deficit: 30.0, migration: 18.0 }
    );
    assert_eq!(sim.simulated_risk, 29.6);
    assert_eq!(sim.reduction, 6.4);
}

#[test]
fn policies_never_raise_risk() {
    let engine = engine();
    for policy in [Policy::Broadband, Policy::Skilling, Policy::Hubs] {
        let sim = engine.simulate_policy("Maharashtra", &policy).unwrap();
        assert!(
            sim.simulated_risk <= sim.original_risk,
            "{policy} raised risk from {} to {}",
            sim.original_risk,
            sim.simulated_risk
        );
        assert!(sim.reduction >= 0.0);
    }
}

#[test]
fn unknown_policy_changes_nothing() {
    let sim = engine().simulate_policy("Karnataka", &Policy::from("Teleportation")).unwrap();
    assert_eq!(sim.reduction, 0.0);
    assert_eq!(sim.simulated_risk, sim.original_risk);
}

#[test]
fn policy_on_unknown_region_is_an_error() {
    let err = engine().simulate_policy("Atlantis", &Policy::Hubs).unwrap_err();
    assert!(matches!(err, EngineError::UnknownRegion { ref region } if region == "Atlantis"));
}

#[test]
fn synthetic_population_covers_configured_regions() {
    let engine = SkillEngine::build_test(3);
    let risks = engine.regional_risks(None);
    assert!(!risks.is_empty());
    for r in &risks {
        assert!(engine.config.regions.contains(&r.region), "Unexpected region {}", r.region);
    }
}
