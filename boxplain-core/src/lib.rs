//! Boxplain core library: entailment-maximal region search over gradient
//! boosted ensembles.

mod ensemble;
mod error;
mod feature_space;
mod formula;
mod generators;
mod oracle;
mod program;
mod region;
mod score;
mod traverser;

pub use crate::{
    ensemble::{Branch, Ensemble, NO_PARENT, Node, Objective, PathStep, Tree, derive_class},
    error::{
        ConfigError, ConfigErrorCode, CoreError, CoreErrorCode, OracleError, OracleErrorCode,
        Result,
    },
    feature_space::{FeatureSpace, Limits},
    formula::Formula,
    generators::{
        GreedyGenerator, IncrementalHittingSetGenerator, MaxSatGenerator,
        SeedGenerator, SeedGeneratorOps, SeedPolicy, SmtGenerator, SmtMode,
        UniformCostGenerator, parse_policy,
    },
    oracle::{EntailResult, EntailmentOracle, new_context},
    program::{Explanation, ExplanationProgram, YieldStats},
    region::{Bound, EPSILON, Region},
    score::{score_to_f64, volume_score},
    traverser::LatticeTraverser,
};
