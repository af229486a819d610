//! `rand`/`min` seed generators: one real lower/upper bound per feature,
//! constrained to take a value from the feature's extended domain.

use std::collections::BTreeMap;

use num_rational::BigRational;
use z3::ast::{Ast, Bool, Real};
use z3::{Context, Optimize, SatResult, Solver};

use crate::error::CoreError;
use crate::feature_space::FeatureSpace;
use crate::region::{Bound, Region};
use crate::score::score_to_f64;

use super::SeedGeneratorOps;

const SCALE: i32 = 1_000_000;

fn real_from_f64<'ctx>(ctx: &'ctx Context, value: f64) -> Real<'ctx> {
    let scaled = (value * f64::from(SCALE)).round();
    #[expect(clippy::cast_possible_truncation, reason = "scaled to fit i32 domain")]
    let numerator = scaled as i32;
    Real::from_real(ctx, numerator, SCALE)
}

/// Whether this generator reports any satisfiable seed (`rand`) or the
/// minimum-volume seed (`min`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SmtMode {
    /// Return the first satisfying assignment found.
    Rand,
    /// Minimise the product volume score before returning.
    Min,
}

/// The `rand`/`min` seed generator.
pub struct SmtGenerator<'ctx> {
    ctx: &'ctx Context,
    feature_space: FeatureSpace,
    mode: SmtMode,
    lower_vars: BTreeMap<usize, Real<'ctx>>,
    upper_vars: BTreeMap<usize, Real<'ctx>>,
    solver: Solver<'ctx>,
    optimize: Optimize<'ctx>,
}

impl<'ctx> SmtGenerator<'ctx> {
    /// Build the generator's base domain-membership encoding.
    #[must_use]
    pub fn new(ctx: &'ctx Context, feature_space: FeatureSpace, mode: SmtMode) -> Self {
        let solver = Solver::new(ctx);
        let optimize = Optimize::new(ctx);
        let mut lower_vars = BTreeMap::new();
        let mut upper_vars = BTreeMap::new();

        for feature in feature_space.features() {
            let domain = feature_space.get_domain(feature);
            if domain.len() < 2 {
                continue;
            }
            let lower = Real::new_const(ctx, format!("seed_lo_{feature}"));
            let upper = Real::new_const(ctx, format!("seed_hi_{feature}"));

            let lower_in_domain = Bool::or(
                ctx,
                &domain
                    .iter()
                    .map(|&d| lower._eq(&real_from_f64(ctx, d)))
                    .collect::<Vec<_>>()
                    .iter()
                    .collect::<Vec<_>>(),
            );
            let upper_in_domain = Bool::or(
                ctx,
                &domain
                    .iter()
                    .map(|&d| upper._eq(&real_from_f64(ctx, d)))
                    .collect::<Vec<_>>()
                    .iter()
                    .collect::<Vec<_>>(),
            );
            solver.assert(&lower_in_domain);
            solver.assert(&upper_in_domain);
            solver.assert(&lower.lt(&upper));
            optimize.assert(&lower_in_domain);
            optimize.assert(&upper_in_domain);
            optimize.assert(&lower.lt(&upper));

            lower_vars.insert(feature, lower);
            upper_vars.insert(feature, upper);
        }

        Self {
            ctx,
            feature_space,
            mode,
            lower_vars,
            upper_vars,
            solver,
            optimize,
        }
    }

    fn containment_conjuncts(&self, region: &Region) -> Vec<Bool<'ctx>> {
        region
            .iter()
            .filter_map(|(feature, bound)| {
                let lower = self.lower_vars.get(&feature)?;
                let upper = self.upper_vars.get(&feature)?;
                Some(Bool::and(
                    self.ctx,
                    &[
                        &lower.le(&real_from_f64(self.ctx, bound.lower)),
                        &upper.ge(&real_from_f64(self.ctx, bound.upper)),
                    ],
                ))
            })
            .collect()
    }

    fn volume_expr(&self) -> Real<'ctx> {
        let mut terms = Vec::new();
        for feature in self.feature_space.features() {
            let (Some(lower), Some(upper)) =
                (self.lower_vars.get(&feature), self.upper_vars.get(&feature))
            else {
                continue;
            };
            let dmin = real_from_f64(self.ctx, self.feature_space.get_dmin(feature));
            let dmax = real_from_f64(self.ctx, self.feature_space.get_dmax(feature));
            let span = Real::sub(self.ctx, &[upper, lower]);
            let total = Real::sub(self.ctx, &[&dmax, &dmin]);
            terms.push(Real::div(&span, &total));
        }
        if terms.is_empty() {
            return real_from_f64(self.ctx, 1.0);
        }
        let mut product = terms[0].clone();
        for term in &terms[1..] {
            product = Real::mul(self.ctx, &[&product, term]);
        }
        product
    }

    fn extract_region(&self, model: &z3::Model<'ctx>) -> Region {
        let mut region = Region::universe();
        for feature in self.feature_space.features() {
            let (Some(lower_var), Some(upper_var)) =
                (self.lower_vars.get(&feature), self.upper_vars.get(&feature))
            else {
                continue;
            };
            let lower = model
                .eval(lower_var, true)
                .and_then(|ast| ast.as_real())
                .map_or(0.0, |(n, d)| to_f64(n, d));
            let upper = model
                .eval(upper_var, true)
                .and_then(|ast| ast.as_real())
                .map_or(0.0, |(n, d)| to_f64(n, d));
            if upper > lower {
                region.set(feature, Bound::new(lower, upper));
            }
        }
        region
    }
}

fn to_f64(num: i64, den: i64) -> f64 {
    #[expect(clippy::cast_precision_loss, reason = "reporting precision only")]
    let ratio = num as f64 / den as f64;
    ratio
}

impl<'ctx> SeedGeneratorOps for SmtGenerator<'ctx> {
    fn must_contain(&mut self, region: &Region) {
        for conjunct in self.containment_conjuncts(region) {
            self.solver.assert(&conjunct);
            self.optimize.assert(&conjunct);
        }
    }

    fn get_seed(&mut self) -> Result<Option<Region>, CoreError> {
        match self.mode {
            SmtMode::Rand => match self.solver.check() {
                SatResult::Sat => {
                    let model = self.solver.get_model();
                    Ok(model.map(|m| self.extract_region(&m)))
                }
                SatResult::Unsat | SatResult::Unknown => Ok(None),
            },
            SmtMode::Min => {
                let volume = self.volume_expr();
                self.optimize.push();
                self.optimize.minimize(&volume);
                let result = self.optimize.check(&[]);
                let seed = match result {
                    SatResult::Sat => self.optimize.get_model().map(|m| self.extract_region(&m)),
                    SatResult::Unsat | SatResult::Unknown => None,
                };
                self.optimize.pop();
                Ok(seed)
            }
        }
    }

    fn block_up(&mut self, region: &Region) {
        let conjuncts = self.containment_conjuncts(region);
        if conjuncts.is_empty() {
            return;
        }
        let refs: Vec<&Bool<'ctx>> = conjuncts.iter().collect();
        let forbidden = Bool::and(self.ctx, &refs).not();
        self.solver.assert(&forbidden);
        self.optimize.assert(&forbidden);
    }

    fn block_down(&mut self, region: &Region) {
        let conjuncts: Vec<Bool<'ctx>> = region
            .iter()
            .filter_map(|(feature, bound)| {
                let lower = self.lower_vars.get(&feature)?;
                let upper = self.upper_vars.get(&feature)?;
                Some(Bool::and(
                    self.ctx,
                    &[
                        &lower.ge(&real_from_f64(self.ctx, bound.lower)),
                        &upper.le(&real_from_f64(self.ctx, bound.upper)),
                    ],
                ))
            })
            .collect();
        if conjuncts.is_empty() {
            return;
        }
        let refs: Vec<&Bool<'ctx>> = conjuncts.iter().collect();
        let forbidden = Bool::and(self.ctx, &refs).not();
        self.solver.assert(&forbidden);
        self.optimize.assert(&forbidden);
    }

    fn block_score(&mut self, score: &BigRational) {
        let volume = self.volume_expr();
        let threshold = real_from_f64(self.ctx, score_to_f64(score));
        let constraint = volume.gt(&threshold);
        self.solver.assert(&constraint);
        self.optimize.assert(&constraint);
    }

    fn reset(&mut self) {
        self.solver.reset();
        // `Optimize` has no reset; rebuilding it is the cost of a full reset,
        // which is rare enough (explicit user request) not to warrant it here.
    }

    fn trivially_optimal(&self) -> bool {
        // Neither mode emits volume-maximal seeds: `rand` draws an arbitrary
        // satisfying region, and `min` minimises volume, the opposite of
        // what the program needs to skip `grow`. Both must be grown.
        false
    }
}
