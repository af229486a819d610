#![expect(clippy::expect_used, reason = "tests require contextual panics")]
//! Integration tests for `ExplanationProgram`, exercising the public API end
//! to end: an ensemble, a feature space, an oracle, a generator, and a
//! program wired together the way a CLI invocation would wire them.

use std::collections::BTreeMap;

use boxplain_core::{
    Ensemble, EntailmentOracle, ExplanationProgram, FeatureSpace, GreedyGenerator, Limits, Node,
    Objective, SeedGenerator, Tree, new_context,
};
use rstest::rstest;

fn two_feature_stump() -> Ensemble {
    let tree = Tree::new(
        vec![
            Node::Internal {
                split_index: 0,
                split_condition: 0.5,
                left: 1,
                right: 2,
            },
            Node::Internal {
                split_index: 1,
                split_condition: 0.5,
                left: 3,
                right: 4,
            },
            Node::Leaf { weight: 1.0 },
            Node::Leaf { weight: -1.0 },
            Node::Leaf { weight: 1.0 },
        ],
        vec![
            boxplain_core::NO_PARENT,
            0,
            0,
            1,
            1,
        ],
    );
    Ensemble::new(vec![tree], vec![0], 2, 1, Objective::BinaryLogistic)
}

fn feature_space() -> FeatureSpace {
    let ensemble = two_feature_stump();
    let thresholds = ensemble.thresholds();
    let limits: Limits = thresholds.keys().map(|&f| (f, (0.0, 1.0))).collect();
    FeatureSpace::build(&thresholds, &limits).expect("feature space must build")
}

#[rstest]
fn explain_returns_a_region_entailing_the_anchor_class() {
    let ensemble = two_feature_stump();
    let feature_space = feature_space();
    let ctx = new_context(21023);
    let oracle = EntailmentOracle::new(&ctx, ensemble);
    let generator = SeedGenerator::Greedy(GreedyGenerator::new(feature_space.clone()));
    let mut program = ExplanationProgram::new(oracle, &feature_space, generator, false);

    let explanation = program
        .explain(&[0.2, 0.2])
        .expect("explain must succeed on an in-domain point");

    assert!(explanation.stats.entailing);
    assert!(explanation.stats.score > 0.0);
    assert_eq!(explanation.stats.oracle_calls, program.oracle_calls());
}

#[rstest]
fn enumerate_explanations_reports_monotonic_best_score() {
    let ensemble = two_feature_stump();
    let feature_space = feature_space();
    let ctx = new_context(21023);
    let oracle = EntailmentOracle::new(&ctx, ensemble);
    let generator = SeedGenerator::Greedy(GreedyGenerator::new(feature_space.clone()));
    let mut program = ExplanationProgram::new(oracle, &feature_space, generator, false);

    let mut best_so_far = 0.0_f64;
    let mut yields = 0;
    while yields < 8 {
        let Some(explanation) = program
            .next_explanation(&[0.2, 0.2])
            .expect("next_explanation must succeed")
        else {
            break;
        };
        assert!(explanation.stats.best_score + f64::EPSILON >= best_so_far);
        best_so_far = explanation.stats.best_score;
        yields += 1;
    }
    assert!(yields > 0, "at least one region must entail the anchor class");
}

#[rstest]
fn next_explanation_returns_none_once_the_generator_is_exhausted() {
    let ensemble = two_feature_stump();
    let feature_space = feature_space();
    let ctx = new_context(21023);
    let oracle = EntailmentOracle::new(&ctx, ensemble);
    let generator = SeedGenerator::Greedy(GreedyGenerator::new(feature_space.clone()));
    let mut program = ExplanationProgram::new(oracle, &feature_space, generator, false);

    let mut exhausted = false;
    for _ in 0..10_000 {
        if program
            .next_explanation(&[0.2, 0.2])
            .expect("next_explanation must succeed")
            .is_none()
        {
            exhausted = true;
            break;
        }
    }
    assert!(exhausted, "a bounded domain must eventually exhaust");
}

#[rstest]
fn missing_feature_limits_rejects_construction() {
    let ensemble = two_feature_stump();
    let thresholds = ensemble.thresholds();
    let mut limits: Limits = BTreeMap::new();
    limits.insert(0, (0.0, 1.0));
    let err = FeatureSpace::build(&thresholds, &limits)
        .expect_err("a feature with thresholds but no limits entry must be rejected");
    assert!(matches!(
        err,
        boxplain_core::ConfigError::MissingFeatureLimits { feature: 1 }
    ));
}
