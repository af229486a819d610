//! The explanation program: orchestrates a seed generator, the entailment
//! oracle, and the lattice traverser into `explain`/`enumerate_explanations`.

use std::time::{Duration, Instant};

use num_rational::BigRational;
use tracing::{debug, instrument};

use crate::error::OracleError;
use crate::feature_space::FeatureSpace;
use crate::generators::{SeedGenerator, SeedGeneratorOps};
use crate::oracle::{EntailResult, EntailmentOracle};
use crate::region::Region;
use crate::score::{score_to_f64, volume_score};
use crate::traverser::LatticeTraverser;

/// Per-yield statistics reported alongside each region (§6, Output).
#[derive(Clone, Debug)]
pub struct YieldStats {
    /// Wall time spent drawing this seed from the generator.
    pub seed_time: Duration,
    /// Wall time spent traversing (growing/eliminating) this seed.
    pub traversal_time: Duration,
    /// Cumulative entailment-oracle calls since program construction.
    pub oracle_calls: u64,
    /// Running count of seeds that entailed the class.
    pub entailing_count: u64,
    /// Running count of seeds that did not entail the class.
    pub non_entailing_count: u64,
    /// This yield's volume score.
    pub score: f64,
    /// Whether this yield's region entails the class (always `true` for
    /// values returned from `enumerate_explanations`, kept for symmetry with
    /// internal bookkeeping).
    pub entailing: bool,
    /// Best score observed so far across this program's lifetime.
    pub best_score: f64,
}

/// A single explanation: the region plus the statistics gathered producing
/// it.
#[derive(Clone, Debug)]
pub struct Explanation {
    /// The entailment-maximal region.
    pub region: Region,
    /// Stats for the yield that produced this region.
    pub stats: YieldStats,
}

/// Orchestrates one model/anchor explanation search.
pub struct ExplanationProgram<'ctx> {
    oracle: EntailmentOracle<'ctx>,
    traverser: LatticeTraverser<'ctx>,
    feature_space: &'ctx FeatureSpace,
    generator: SeedGenerator<'ctx>,
    block_score: bool,
    oracle_calls_baseline: u64,
    entailing_count: u64,
    non_entailing_count: u64,
    max_score: BigRational,
    exhausted: bool,
}

impl<'ctx> ExplanationProgram<'ctx> {
    /// Build a program over `oracle`, traversing `feature_space` and
    /// drawing seeds from `generator`.
    #[must_use]
    pub fn new(
        oracle: EntailmentOracle<'ctx>,
        feature_space: &'ctx FeatureSpace,
        generator: SeedGenerator<'ctx>,
        block_score: bool,
    ) -> Self {
        Self {
            oracle,
            traverser: LatticeTraverser::new(feature_space),
            feature_space,
            generator,
            block_score,
            oracle_calls_baseline: 0,
            entailing_count: 0,
            non_entailing_count: 0,
            max_score: BigRational::from_integer(0.into()),
            exhausted: false,
        }
    }

    /// Compute `c = predict(x)`, map `x` to its anchor region, `grow` once,
    /// and return the result without further enumeration.
    ///
    /// # Errors
    /// Propagates [`OracleError`] from prediction or growth.
    #[instrument(skip(self, x))]
    pub fn explain(&mut self, x: &[f64]) -> Result<Explanation, OracleError> {
        let class = self.oracle.predict(x)?;
        let anchor = self.feature_space.anchor_region(x);
        let start = Instant::now();
        let mut grown = self.traverser.grow(&self.oracle, &anchor, class)?;
        self.traverser.drop_full_domain_features(&mut grown);
        let traversal_time = start.elapsed();
        let score = volume_score(&grown, self.feature_space);
        if score > self.max_score {
            self.max_score = score.clone();
        }
        self.entailing_count += 1;
        Ok(Explanation {
            region: grown,
            stats: YieldStats {
                seed_time: Duration::ZERO,
                traversal_time,
                oracle_calls: self.oracle.oracle_calls(),
                entailing_count: self.entailing_count,
                non_entailing_count: self.non_entailing_count,
                score: score_to_f64(&score),
                entailing: true,
                best_score: score_to_f64(&self.max_score),
            },
        })
    }

    /// Pull the next explanation in the enumeration, or `None` when the
    /// generator declares the search space exhausted.
    ///
    /// # Errors
    /// Propagates [`OracleError`] from the oracle or the traverser.
    #[instrument(skip(self, x))]
    pub fn next_explanation(&mut self, x: &[f64]) -> Result<Option<Explanation>, OracleError> {
        if self.exhausted {
            return Ok(None);
        }
        let class = self.oracle.predict(x)?;
        loop {
            let seed_start = Instant::now();
            let Some(seed) = self.generator.get_seed().map_err(|e| match e {
                crate::error::CoreError::Oracle(o) => o,
                crate::error::CoreError::Config(c) => OracleError::SolverFailure {
                    message: c.to_string(),
                },
            })?
            else {
                debug!("seed generator exhausted");
                return Ok(None);
            };
            let seed_time = seed_start.elapsed();

            let traversal_start = Instant::now();
            match self.oracle.entails(&seed, class)? {
                EntailResult::NotEntailed { counterexample } => {
                    let anchor = self.feature_space.anchor_region(&counterexample);
                    let reason = self.traverser.eliminate_vars(&self.oracle, &anchor, class)?;
                    self.generator.block_up(&reason);
                    self.non_entailing_count += 1;
                    continue;
                }
                EntailResult::Entails => {
                    let trivially_optimal = self.generator.trivially_optimal();
                    let mut region = seed;
                    if !trivially_optimal {
                        region = self.traverser.grow(&self.oracle, &region, class)?;
                    }
                    self.traverser.drop_full_domain_features(&mut region);
                    self.generator.block_down(&region);
                    let traversal_time = traversal_start.elapsed();

                    let score = volume_score(&region, self.feature_space);
                    let is_new_best = score > self.max_score;
                    if is_new_best {
                        self.max_score = score.clone();
                    }
                    if self.block_score {
                        self.generator.block_score(&score);
                    }
                    self.entailing_count += 1;

                    let stats = YieldStats {
                        seed_time,
                        traversal_time,
                        oracle_calls: self.oracle.oracle_calls(),
                        entailing_count: self.entailing_count,
                        non_entailing_count: self.non_entailing_count,
                        score: score_to_f64(&score),
                        entailing: true,
                        best_score: score_to_f64(&self.max_score),
                    };

                    if trivially_optimal {
                        // The generator already emits volume-maximal seeds in
                        // order, so its first entailing seed is the optimum;
                        // nothing later can improve on it.
                        self.exhausted = true;
                    }
                    return Ok(Some(Explanation { region, stats }));
                }
            }
        }
    }

    /// Number of entailment-oracle calls issued since construction.
    #[must_use]
    pub fn oracle_calls(&self) -> u64 {
        self.oracle.oracle_calls() - self.oracle_calls_baseline
    }
}
