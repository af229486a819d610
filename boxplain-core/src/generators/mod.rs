//! The seed generator family: one capability trait, five policies, and a
//! tagged variant that dispatches to whichever is configured.

mod greedy;
mod hitting_set;
mod maxsat;
mod smt;
mod ucs;

pub use greedy::GreedyGenerator;
pub use hitting_set::IncrementalHittingSetGenerator;
pub use maxsat::MaxSatGenerator;
pub use smt::{SmtGenerator, SmtMode};
pub use ucs::UniformCostGenerator;

use num_rational::BigRational;

use crate::error::{ConfigError, CoreError};
use crate::region::Region;

/// The shared contract every seed generator policy implements.
pub trait SeedGeneratorOps {
    /// Constrain every future seed to contain `region`.
    fn must_contain(&mut self, region: &Region);

    /// Return the next unblocked seed, or `None` when the search space is
    /// exhausted.
    ///
    /// # Errors
    /// Returns [`CoreError`] if the underlying solver fails.
    fn get_seed(&mut self) -> Result<Option<Region>, CoreError>;

    /// Forbid any future seed that is a (non-strict) superset of `region`.
    fn block_up(&mut self, region: &Region);

    /// Forbid any future seed that is a (non-strict) subset of `region`.
    fn block_down(&mut self, region: &Region);

    /// Require every future seed's volume score to strictly exceed `score`.
    fn block_score(&mut self, score: &BigRational);

    /// Clear cumulative blocking/containment state.
    fn reset(&mut self);

    /// True for policies (MaxSAT family, greedy, UCS) that already emit a
    /// volume-maximal seed, letting the explanation program skip `grow`.
    fn trivially_optimal(&self) -> bool;
}

/// The seed generator policy selected by configuration.
pub enum SeedGenerator<'ctx> {
    /// `rand`/`min`: SMT-encoded bounds, optionally minimised for volume.
    Smt(SmtGenerator<'ctx>),
    /// `maxsat`/`maxstrat`: weighted MaxSAT over an indicator encoding.
    MaxSat(MaxSatGenerator<'ctx>),
    /// `greedy`: a min-heap over candidate index tuples.
    Greedy(GreedyGenerator),
    /// `incrmaxsat`: dual minimum hitting set over blocked-up regions.
    IncrementalHittingSet(IncrementalHittingSetGenerator),
    /// `ucs`: uniform-cost search over candidate index tuples.
    UniformCost(UniformCostGenerator),
}

impl<'ctx> SeedGeneratorOps for SeedGenerator<'ctx> {
    fn must_contain(&mut self, region: &Region) {
        match self {
            Self::Smt(g) => g.must_contain(region),
            Self::MaxSat(g) => g.must_contain(region),
            Self::Greedy(g) => g.must_contain(region),
            Self::IncrementalHittingSet(g) => g.must_contain(region),
            Self::UniformCost(g) => g.must_contain(region),
        }
    }

    fn get_seed(&mut self) -> Result<Option<Region>, CoreError> {
        match self {
            Self::Smt(g) => g.get_seed(),
            Self::MaxSat(g) => g.get_seed(),
            Self::Greedy(g) => g.get_seed(),
            Self::IncrementalHittingSet(g) => g.get_seed(),
            Self::UniformCost(g) => g.get_seed(),
        }
    }

    fn block_up(&mut self, region: &Region) {
        match self {
            Self::Smt(g) => g.block_up(region),
            Self::MaxSat(g) => g.block_up(region),
            Self::Greedy(g) => g.block_up(region),
            Self::IncrementalHittingSet(g) => g.block_up(region),
            Self::UniformCost(g) => g.block_up(region),
        }
    }

    fn block_down(&mut self, region: &Region) {
        match self {
            Self::Smt(g) => g.block_down(region),
            Self::MaxSat(g) => g.block_down(region),
            Self::Greedy(g) => g.block_down(region),
            Self::IncrementalHittingSet(g) => g.block_down(region),
            Self::UniformCost(g) => g.block_down(region),
        }
    }

    fn block_score(&mut self, score: &BigRational) {
        match self {
            Self::Smt(g) => g.block_score(score),
            Self::MaxSat(g) => g.block_score(score),
            Self::Greedy(g) => g.block_score(score),
            Self::IncrementalHittingSet(g) => g.block_score(score),
            Self::UniformCost(g) => g.block_score(score),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Smt(g) => g.reset(),
            Self::MaxSat(g) => g.reset(),
            Self::Greedy(g) => g.reset(),
            Self::IncrementalHittingSet(g) => g.reset(),
            Self::UniformCost(g) => g.reset(),
        }
    }

    fn trivially_optimal(&self) -> bool {
        match self {
            Self::Smt(g) => g.trivially_optimal(),
            Self::MaxSat(g) => g.trivially_optimal(),
            Self::Greedy(g) => g.trivially_optimal(),
            Self::IncrementalHittingSet(g) => g.trivially_optimal(),
            Self::UniformCost(g) => g.trivially_optimal(),
        }
    }
}

/// Parse a `seed_gen` configuration string into the policy name; the actual
/// generator is constructed by the program, which needs the feature space
/// and (for SMT-backed policies) the shared z3 context.
///
/// # Errors
/// Returns [`ConfigError::UnknownSeedGenerator`] for any value outside
/// `{rand, min, maxsat, maxstrat, incrmaxsat, ucs, greedy}`.
pub fn parse_policy(name: &str) -> Result<SeedPolicy, ConfigError> {
    match name {
        "rand" => Ok(SeedPolicy::Rand),
        "min" => Ok(SeedPolicy::Min),
        "maxsat" => Ok(SeedPolicy::MaxSat),
        "maxstrat" => Ok(SeedPolicy::StratifiedMaxSat),
        "incrmaxsat" => Ok(SeedPolicy::IncrementalMaxSat),
        "ucs" => Ok(SeedPolicy::Ucs),
        "greedy" => Ok(SeedPolicy::Greedy),
        other => Err(ConfigError::UnknownSeedGenerator {
            name: other.to_owned(),
        }),
    }
}

/// The named seed generator policies recognised by configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SeedPolicy {
    /// `rand`.
    Rand,
    /// `min`.
    Min,
    /// `maxsat`.
    MaxSat,
    /// `maxstrat`.
    StratifiedMaxSat,
    /// `incrmaxsat`.
    IncrementalMaxSat,
    /// `ucs`.
    Ucs,
    /// `greedy`.
    Greedy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_policy_accepts_every_documented_name() {
        for name in ["rand", "min", "maxsat", "maxstrat", "incrmaxsat", "ucs", "greedy"] {
            assert!(parse_policy(name).is_ok(), "{name} should parse");
        }
    }

    #[test]
    fn parse_policy_rejects_unknown_names() {
        let err = parse_policy("bogus").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSeedGenerator { .. }));
    }
}
