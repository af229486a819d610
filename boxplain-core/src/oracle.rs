//! The entailment oracle: an SMT encoding of the ensemble over linear real
//! arithmetic, backed by [`z3`].
//!
//! Per-tree path constraints share feature variables across a sum
//! (`W_g = Σ w_t`), which makes entailment a genuine existential
//! linear-arithmetic query rather than a per-leaf interval check — hence the
//! real SMT backend rather than a hand-rolled interval walk.

use std::cell::Cell;

use z3::ast::{Ast, Bool, Real};
use z3::{Config, Context, SatResult, Solver};

use crate::ensemble::{Branch, Ensemble, Objective, derive_class};
use crate::error::OracleError;
use crate::region::Region;

/// Precision (decimal places) used when projecting an `f64` into the
/// rational reals the solver reasons over.
const SCALE: i32 = 1_000_000;

fn real_from_f64<'ctx>(ctx: &'ctx Context, value: f64) -> Real<'ctx> {
    let scaled = (value * f64::from(SCALE)).round();
    #[expect(
        clippy::cast_possible_truncation,
        reason = "feature values are expected to fit i32 after fixed-point scaling"
    )]
    let numerator = scaled as i32;
    Real::from_real(ctx, numerator, SCALE)
}

fn sum_reals<'ctx>(ctx: &'ctx Context, values: &[Real<'ctx>]) -> Real<'ctx> {
    if values.is_empty() {
        return Real::from_real(ctx, 0, 1);
    }
    let refs: Vec<&Real<'ctx>> = values.iter().collect();
    Real::add(ctx, &refs)
}

/// Result of a single `entails` query.
#[derive(Clone, Debug)]
pub enum EntailResult {
    /// The region entails the class: no competitor beats it anywhere inside.
    Entails,
    /// Some competitor can beat the class; carries the witness point.
    NotEntailed { counterexample: Vec<f64> },
}

/// The SMT-backed entailment oracle, owning one [`Solver`] per program
/// lifetime, extended incrementally via `push`/`pop` scopes per query.
pub struct EntailmentOracle<'ctx> {
    ctx: &'ctx Context,
    ensemble: Ensemble,
    x_vars: Vec<Real<'ctx>>,
    w_vars: Vec<Real<'ctx>>,
    solver: Solver<'ctx>,
    oracle_calls: Cell<u64>,
}

impl<'ctx> EntailmentOracle<'ctx> {
    /// Build the oracle's base path-cover encoding for `ensemble`.
    #[must_use]
    pub fn new(ctx: &'ctx Context, ensemble: Ensemble) -> Self {
        let solver = Solver::new(ctx);
        let x_vars: Vec<Real<'ctx>> = (0..ensemble.num_feature())
            .map(|i| Real::new_const(ctx, format!("x_{i}")))
            .collect();
        let w_vars: Vec<Real<'ctx>> = (0..ensemble.trees().len())
            .map(|t| Real::new_const(ctx, format!("w_{t}")))
            .collect();

        for (t, tree) in ensemble.trees().iter().enumerate() {
            for (path, weight) in tree.leaf_paths() {
                let mut conjuncts: Vec<Bool<'ctx>> = Vec::with_capacity(path.len());
                for step in &path {
                    let threshold = real_from_f64(ctx, step.threshold);
                    let feature_var = &x_vars[step.feature];
                    let edge = match step.branch {
                        Branch::Left => feature_var.lt(&threshold),
                        Branch::Right => feature_var.ge(&threshold),
                    };
                    conjuncts.push(edge);
                }
                let refs: Vec<&Bool<'ctx>> = conjuncts.iter().collect();
                let premise = Bool::and(ctx, &refs);
                let consequence = w_vars[t]._eq(&real_from_f64(ctx, weight));
                solver.assert(&premise.implies(&consequence));
            }
        }

        Self {
            ctx,
            ensemble,
            x_vars,
            w_vars,
            solver,
            oracle_calls: Cell::new(0),
        }
    }

    /// Number of satisfiability queries issued so far.
    #[must_use]
    pub fn oracle_calls(&self) -> u64 {
        self.oracle_calls.get()
    }

    fn group_weight(&self, group: usize) -> Real<'ctx> {
        let members: Vec<Real<'ctx>> = (0..self.ensemble.trees().len())
            .filter(|&t| self.ensemble.group_of(t) == group)
            .map(|t| self.w_vars[t].clone())
            .collect();
        sum_reals(self.ctx, &members)
    }

    fn assert_region(&self, region: &Region) -> Vec<Bool<'ctx>> {
        region
            .iter()
            .map(|(feature, bound)| {
                let lower = real_from_f64(self.ctx, bound.lower);
                let upper = real_from_f64(self.ctx, bound.upper);
                let x = &self.x_vars[feature];
                Bool::and(self.ctx, &[&x.ge(&lower), &x.lt(&upper)])
            })
            .collect()
    }

    fn check_under(&self, assumptions: &[Bool<'ctx>]) -> (SatResult, u64) {
        self.solver.push();
        for assumption in assumptions {
            self.solver.assert(assumption);
        }
        let result = self.solver.check();
        self.oracle_calls.set(self.oracle_calls.get() + 1);
        let calls = self.oracle_calls.get();
        // Caller is responsible for reading the model before popping.
        (result, calls)
    }

    fn pop(&self) {
        self.solver.pop(1);
    }

    /// Fix `point` and derive the ensemble's predicted class by solving for
    /// the unique per-tree weight assignment.
    ///
    /// # Errors
    /// Returns [`OracleError::EncodingViolation`] if no assignment of `w_t`
    /// satisfies the path cover for `point` (a malformed ensemble), or
    /// [`OracleError::SolverFailure`] if the backend could not decide.
    pub fn predict(&self, point: &[f64]) -> Result<usize, OracleError> {
        let fixings: Vec<Bool<'ctx>> = point
            .iter()
            .enumerate()
            .map(|(i, &value)| self.x_vars[i]._eq(&real_from_f64(self.ctx, value)))
            .collect();

        let (result, _) = self.check_under(&fixings);
        let outcome = match result {
            SatResult::Sat => {
                let model = self.solver.get_model().ok_or_else(|| {
                    OracleError::SolverFailure {
                        message: "sat result without model".to_owned(),
                    }
                });
                model.and_then(|model| {
                    let mut sums = vec![0.0_f64; self.ensemble.groups()];
                    for (t, w_var) in self.w_vars.iter().enumerate() {
                        let value = model
                            .eval(w_var, true)
                            .and_then(|ast| ast.as_real())
                            .map_or(0.0, |(num, den)| {
                                #[expect(
                                    clippy::cast_precision_loss,
                                    reason = "model values are reported at SCALE precision already"
                                )]
                                let ratio = num as f64 / den as f64;
                                ratio
                            });
                        sums[self.ensemble.group_of(t)] += value;
                    }
                    Ok(derive_class(self.ensemble.objective(), &sums))
                })
            }
            SatResult::Unsat => Err(OracleError::EncodingViolation {
                point: point.iter().copied().map(ordered_float::OrderedFloat).collect(),
            }),
            SatResult::Unknown => Err(OracleError::SolverFailure {
                message: "solver returned unknown".to_owned(),
            }),
        };
        self.pop();
        outcome
    }

    /// Decide whether `region` entails class `class`: no assignment inside
    /// `region` lets a competing group strictly beat it.
    ///
    /// # Errors
    /// Returns [`OracleError::SolverFailure`] if the backend could not
    /// decide any of the competitor checks.
    pub fn entails(&self, region: &Region, class: usize) -> Result<EntailResult, OracleError> {
        let region_constraints = self.assert_region(region);
        let class_weight = self.group_weight(class);

        if self.ensemble.groups() == 1 {
            // Binary objective: there is no competitor group to range over.
            // class 0 wins when W_0 < 0, class 1 when W_0 >= 0; "the
            // competitor beats the class" is the opposite sign.
            let beats = if class == 0 {
                class_weight.ge(&real_from_f64(self.ctx, 0.0))
            } else {
                class_weight.lt(&real_from_f64(self.ctx, 0.0))
            };
            return self.check_competitor(&region_constraints, beats);
        }

        for competitor in 0..self.ensemble.groups() {
            if competitor == class {
                continue;
            }
            let competitor_weight = self.group_weight(competitor);
            let beats = competitor_weight.gt(&class_weight);
            if let EntailResult::NotEntailed { counterexample } =
                self.check_competitor(&region_constraints, beats)?
            {
                return Ok(EntailResult::NotEntailed { counterexample });
            }
        }

        Ok(EntailResult::Entails)
    }

    /// Check whether `beats`, under `region_constraints`, is satisfiable —
    /// i.e. whether some point in the region lets the competitor win.
    fn check_competitor(
        &self,
        region_constraints: &[Bool<'ctx>],
        beats: Bool<'ctx>,
    ) -> Result<EntailResult, OracleError> {
        let mut assumptions = region_constraints.to_vec();
        assumptions.push(beats);
        let (result, _) = self.check_under(&assumptions);

        match result {
            SatResult::Sat => {
                let model = self.solver.get_model();
                let point = model.map(|model| {
                    self.x_vars
                        .iter()
                        .map(|x| {
                            model
                                .eval(x, true)
                                .and_then(|ast| ast.as_real())
                                .map_or(0.0, |(num, den)| {
                                    #[expect(
                                        clippy::cast_precision_loss,
                                        reason = "model values are reported at SCALE precision already"
                                    )]
                                    let ratio = num as f64 / den as f64;
                                    ratio
                                })
                        })
                        .collect::<Vec<f64>>()
                });
                self.pop();
                Ok(EntailResult::NotEntailed {
                    counterexample: point.unwrap_or_default(),
                })
            }
            SatResult::Unsat => {
                self.pop();
                Ok(EntailResult::Entails)
            }
            SatResult::Unknown => {
                self.pop();
                Err(OracleError::SolverFailure {
                    message: "solver returned unknown".to_owned(),
                })
            }
        }
    }

    /// The underlying ensemble.
    #[must_use]
    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// Shared z3 context, for callers (seed generators) building their own
    /// auxiliary solvers/optimizers against the same backend.
    #[must_use]
    pub fn context(&self) -> &'ctx Context {
        self.ctx
    }
}

/// Build a fresh `z3::Context` with defaults appropriate for deterministic,
/// single-threaded use.
#[must_use]
pub fn new_context(seed: u32) -> Context {
    let mut cfg = Config::new();
    cfg.set_param_value("sat.random_seed", &seed.to_string());
    cfg.set_param_value("smt.random_seed", &seed.to_string());
    Context::new(&cfg)
}
