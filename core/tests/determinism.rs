//! Two engines, same seed, same data.
//! Every output they serve must be identical.

use skillgenome_core::{
    engine::SkillEngine,
    predictor::PredictionRequest,
    signals::SignalInput,
};

fn request(level: f64) -> PredictionRequest {
    PredictionRequest {
        signals: SignalInput {
            creation_output:   Some(level),
            learning_behavior: Some(level - 5.0),
            digital_presence:  Some(level + 3.0),
            learning_hours:    Some(12.0),
            projects:          Some(4.0),
            ..SignalInput::default()
        },
        ..PredictionRequest::default()
    }
}

#[test]
fn same_seed_produces_identical_outputs() {
    let engine_a = SkillEngine::build_test(0xC0FFEE);
    let engine_b = SkillEngine::build_test(0xC0FFEE);

    assert_eq!(engine_a.status().training_accuracy, engine_b.status().training_accuracy);

    for level in [25.0, 50.0, 75.0, 95.0] {
        assert_eq!(
            engine_a.predict(&request(level)),
            engine_b.predict(&request(level)),
            "Predictions diverged at level {level}"
        );
    }

    assert_eq!(engine_a.regional_risks(None), engine_b.regional_risks(None));
    assert_eq!(engine_a.skill_trends(), engine_b.skill_trends());
    assert_eq!(engine_a.national_distribution(), engine_b.national_distribution());
}

#[test]
fn repeated_calls_on_one_engine_agree() {
    let engine = SkillEngine::build_test(11);
    let first = engine.predict(&request(60.0));
    for _ in 0..5 {
        assert_eq!(engine.predict(&request(60.0)), first);
    }
    assert_eq!(engine.skill_trends(), engine.skill_trends());
}

#[test]
fn different_seeds_produce_different_populations() {
    let a = SkillEngine::build_test(1);
    let b = SkillEngine::build_test(2);
    let targets_a: Vec<f64> = a.store().targets();
    let targets_b: Vec<f64> = b.store().targets();
    assert_ne!(targets_a, targets_b, "Seeds 1 and 2 generated the same population");
}
