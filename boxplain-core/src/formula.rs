//! A small propositional formula algebra with conversion to conjunctive
//! normal form (CNF).
//!
//! Literals are `i32`s: a positive value names a boolean variable, its
//! negation the same variable negated. Variable `0` is not a valid literal.

/// A propositional formula over integer literals.
#[derive(Clone, Debug, PartialEq)]
pub enum Formula {
    /// A single literal.
    Lit(i32),
    /// Negation of a sub-formula.
    Not(Box<Formula>),
    /// Conjunction of sub-formulas.
    And(Vec<Formula>),
    /// Disjunction of sub-formulas.
    Or(Vec<Formula>),
    /// Material implication.
    Implies(Box<Formula>, Box<Formula>),
    /// Biconditional.
    Iff(Box<Formula>, Box<Formula>),
    /// Exactly one of the named literals is true.
    EqualsOne(Vec<i32>),
}

impl Formula {
    /// Negation of `self`.
    #[must_use]
    pub fn not(self) -> Self {
        Formula::Not(Box::new(self))
    }

    /// `self ⇒ other`.
    #[must_use]
    pub fn implies(self, other: Formula) -> Self {
        Formula::Implies(Box::new(self), Box::new(other))
    }

    /// `self ⇔ other`.
    #[must_use]
    pub fn iff(self, other: Formula) -> Self {
        Formula::Iff(Box::new(self), Box::new(other))
    }

    /// Convert this formula to CNF: a list of clauses, each a list of
    /// literals interpreted as their disjunction, the whole list as their
    /// conjunction. Clauses are deduplicated and tautological clauses
    /// (containing both a literal and its negation) are dropped.
    #[must_use]
    pub fn to_cnf(&self) -> Vec<Vec<i32>> {
        let nnf = to_nnf(self, false);
        let mut clauses = distribute(&nnf);
        for clause in &mut clauses {
            clause.sort_unstable();
            clause.dedup();
        }
        clauses.retain(|clause| !is_tautology(clause));
        clauses.sort();
        clauses.dedup();
        clauses
    }
}

fn is_tautology(clause: &[i32]) -> bool {
    clause.iter().any(|&lit| clause.contains(&-lit))
}

/// Desugar `Implies`/`Iff`/`EqualsOne` into `And`/`Or`/`Not`, then push
/// negation to the literals (negation normal form). `negate` tracks whether
/// the enclosing context has flipped polarity.
fn to_nnf(formula: &Formula, negate: bool) -> Formula {
    match formula {
        Formula::Lit(l) => Formula::Lit(if negate { -l } else { *l }),
        Formula::Not(inner) => to_nnf(inner, !negate),
        Formula::And(parts) => {
            let converted = parts.iter().map(|p| to_nnf(p, negate));
            if negate {
                Formula::Or(converted.collect())
            } else {
                Formula::And(converted.collect())
            }
        }
        Formula::Or(parts) => {
            let converted = parts.iter().map(|p| to_nnf(p, negate));
            if negate {
                Formula::And(converted.collect())
            } else {
                Formula::Or(converted.collect())
            }
        }
        Formula::Implies(a, b) => {
            // a => b  ==  !a | b
            let expanded = Formula::Or(vec![Formula::Not(a.clone()), (**b).clone()]);
            to_nnf(&expanded, negate)
        }
        Formula::Iff(a, b) => {
            // a <=> b == (a & b) | (!a & !b)
            let expanded = Formula::Or(vec![
                Formula::And(vec![(**a).clone(), (**b).clone()]),
                Formula::And(vec![Formula::Not(a.clone()), Formula::Not(b.clone())]),
            ]);
            to_nnf(&expanded, negate)
        }
        Formula::EqualsOne(vars) => to_nnf(&expand_equals_one(vars), negate),
    }
}

fn expand_equals_one(vars: &[i32]) -> Formula {
    let at_least_one = Formula::Or(vars.iter().copied().map(Formula::Lit).collect());
    let mut at_most_one = Vec::new();
    for i in 0..vars.len() {
        for j in (i + 1)..vars.len() {
            at_most_one.push(Formula::Or(vec![
                Formula::Not(Box::new(Formula::Lit(vars[i]))),
                Formula::Not(Box::new(Formula::Lit(vars[j]))),
            ]));
        }
    }
    let mut parts = vec![at_least_one];
    parts.extend(at_most_one);
    Formula::And(parts)
}

/// Distribute `Or` over `And` on an NNF tree (no `Not`, `Implies`, `Iff`, or
/// `EqualsOne` remain) to produce a flat clause list.
fn distribute(formula: &Formula) -> Vec<Vec<i32>> {
    match formula {
        Formula::Lit(l) => vec![vec![*l]],
        Formula::And(parts) => parts.iter().flat_map(distribute).collect(),
        Formula::Or(parts) => parts
            .iter()
            .map(distribute)
            .fold(vec![Vec::new()], |acc, part_clauses| {
                acc.iter()
                    .flat_map(|prefix| {
                        part_clauses.iter().map(move |clause| {
                            let mut merged = prefix.clone();
                            merged.extend(clause);
                            merged
                        })
                    })
                    .collect()
            }),
        Formula::Not(_) | Formula::Implies(_, _) | Formula::Iff(_, _) | Formula::EqualsOne(_) => {
            unreachable!("to_nnf eliminates Not/Implies/Iff/EqualsOne before distribute")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// Enumerate all models over variables `1..=n` that satisfy `clauses`.
    fn models(clauses: &[Vec<i32>], n: i32) -> BTreeSet<Vec<bool>> {
        let mut out = BTreeSet::new();
        for mask in 0..(1u32 << n) {
            let assignment: Vec<bool> = (0..n).map(|i| (mask >> i) & 1 == 1).collect();
            let satisfied = clauses.iter().all(|clause| {
                clause.iter().any(|&lit| {
                    let var = lit.unsigned_abs() as usize - 1;
                    let value = assignment[var];
                    if lit > 0 { value } else { !value }
                })
            });
            if satisfied {
                out.insert(assignment);
            }
        }
        out
    }

    /// Brute-force model set of a [`Formula`] by direct evaluation.
    fn formula_models(formula: &Formula, n: i32) -> BTreeSet<Vec<bool>> {
        let mut out = BTreeSet::new();
        for mask in 0..(1u32 << n) {
            let assignment: Vec<bool> = (0..n).map(|i| (mask >> i) & 1 == 1).collect();
            if eval(formula, &assignment) {
                out.insert(assignment);
            }
        }
        out
    }

    fn eval(formula: &Formula, assignment: &[bool]) -> bool {
        match formula {
            Formula::Lit(l) => {
                let v = assignment[l.unsigned_abs() as usize - 1];
                if *l > 0 { v } else { !v }
            }
            Formula::Not(inner) => !eval(inner, assignment),
            Formula::And(parts) => parts.iter().all(|p| eval(p, assignment)),
            Formula::Or(parts) => parts.iter().any(|p| eval(p, assignment)),
            Formula::Implies(a, b) => !eval(a, assignment) || eval(b, assignment),
            Formula::Iff(a, b) => eval(a, assignment) == eval(b, assignment),
            Formula::EqualsOne(vars) => {
                vars.iter()
                    .filter(|&&v| eval(&Formula::Lit(v), assignment))
                    .count()
                    == 1
            }
        }
    }

    #[test]
    fn cnf_equivalent_to_implies() {
        let f = Formula::Lit(1).implies(Formula::Lit(2));
        let cnf = f.to_cnf();
        assert_eq!(formula_models(&f, 2), models(&cnf, 2));
    }

    #[test]
    fn cnf_equivalent_to_iff() {
        let f = Formula::Lit(1).iff(Formula::Lit(2));
        let cnf = f.to_cnf();
        assert_eq!(formula_models(&f, 2), models(&cnf, 2));
    }

    #[test]
    fn cnf_equivalent_to_equals_one() {
        let f = Formula::EqualsOne(vec![1, 2, 3]);
        let cnf = f.to_cnf();
        assert_eq!(formula_models(&f, 3), models(&cnf, 3));
    }

    #[test]
    fn cnf_equivalent_to_nested_formula() {
        let f = Formula::And(vec![
            Formula::Lit(1).implies(Formula::Or(vec![Formula::Lit(2), Formula::Lit(3)])),
            Formula::Not(Box::new(Formula::Lit(2))).iff(Formula::Lit(3)),
        ]);
        let cnf = f.to_cnf();
        assert_eq!(formula_models(&f, 3), models(&cnf, 3));
    }
}
