//! `greedy` seed generator: a best-first search over per-feature boundary
//! index tuples, ranked by the sum of log interval lengths, without any SMT
//! backend.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, BTreeMap, BTreeSet};

use num_rational::BigRational;
use ordered_float::OrderedFloat;

use crate::error::CoreError;
use crate::feature_space::FeatureSpace;
use crate::region::{Bound, Region};
use crate::score::score_to_f64;

use super::SeedGeneratorOps;

/// One candidate in the search frontier: a lower/upper domain-index pair per
/// constrained feature, ranked by `score`.
#[derive(Clone, Debug, PartialEq)]
struct Candidate {
    score: OrderedFloat<f64>,
    indices: BTreeMap<usize, (usize, usize)>,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.cmp(&other.score)
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The `greedy` seed generator.
pub struct GreedyGenerator {
    feature_space: FeatureSpace,
    must_contain_region: Option<Region>,
    blocked_up: Vec<Region>,
    blocked_down: Vec<Region>,
    visited: BTreeSet<Vec<(usize, usize, usize)>>,
    frontier: BinaryHeap<Candidate>,
}

fn visited_key(indices: &BTreeMap<usize, (usize, usize)>) -> Vec<(usize, usize, usize)> {
    indices.iter().map(|(&f, &(lo, hi))| (f, lo, hi)).collect()
}

impl GreedyGenerator {
    /// Build the generator, seeding the frontier with the full-domain
    /// candidate for every feature.
    #[must_use]
    pub fn new(feature_space: FeatureSpace) -> Self {
        let mut indices = BTreeMap::new();
        let mut score = 0.0f64;
        for feature in feature_space.features() {
            let domain = feature_space.get_domain(feature);
            if domain.len() < 2 {
                continue;
            }
            let hi = domain.len() - 1;
            indices.insert(feature, (0, hi));
            score += (domain[hi] - domain[0]).max(f64::MIN_POSITIVE).ln();
        }
        let mut frontier = BinaryHeap::new();
        frontier.push(Candidate {
            score: OrderedFloat(score),
            indices,
        });
        Self {
            feature_space,
            must_contain_region: None,
            blocked_up: Vec::new(),
            blocked_down: Vec::new(),
            visited: BTreeSet::new(),
            frontier,
        }
    }

    fn to_region(&self, indices: &BTreeMap<usize, (usize, usize)>) -> Region {
        let mut region = Region::universe();
        for (&feature, &(lo, hi)) in indices {
            let domain = self.feature_space.get_domain(feature);
            region.set(feature, Bound::new(domain[lo], domain[hi]));
        }
        region
    }

    fn score_of(&self, indices: &BTreeMap<usize, (usize, usize)>) -> f64 {
        let mut score = 0.0;
        for (&feature, &(lo, hi)) in indices {
            let domain = self.feature_space.get_domain(feature);
            score += (domain[hi] - domain[lo]).max(f64::MIN_POSITIVE).ln();
        }
        score
    }

    fn violates_blocking(&self, region: &Region) -> bool {
        self.blocked_up.iter().any(|b| region.blocked_up_by(b))
            || self.blocked_down.iter().any(|b| region.blocked_down_by(b))
    }

    fn violates_must_contain(&self, region: &Region) -> bool {
        self.must_contain_region
            .as_ref()
            .is_some_and(|required| !region.contains(required))
    }

    /// Shrink one feature's interval by one domain step on either side,
    /// producing up to two children that are still valid (`lo < hi`).
    fn expand_children(&mut self, indices: &BTreeMap<usize, (usize, usize)>) {
        for (&feature, &(lo, hi)) in indices {
            if lo + 1 < hi {
                let mut child = indices.clone();
                child.insert(feature, (lo + 1, hi));
                self.push_if_new(child);
            }
            if hi.saturating_sub(1) > lo {
                let mut child = indices.clone();
                child.insert(feature, (lo, hi - 1));
                self.push_if_new(child);
            }
        }
    }

    fn push_if_new(&mut self, indices: BTreeMap<usize, (usize, usize)>) {
        let key = visited_key(&indices);
        if self.visited.contains(&key) {
            return;
        }
        self.visited.insert(key);
        let score = self.score_of(&indices);
        self.frontier.push(Candidate {
            score: OrderedFloat(score),
            indices,
        });
    }
}

impl SeedGeneratorOps for GreedyGenerator {
    fn must_contain(&mut self, region: &Region) {
        self.must_contain_region = Some(region.clone());
    }

    fn get_seed(&mut self) -> Result<Option<Region>, CoreError> {
        while let Some(candidate) = self.frontier.pop() {
            let region = self.to_region(&candidate.indices);
            // Blocking is honoured unconditionally, even for the very first
            // candidate drawn before `must_contain` narrows the frontier.
            if self.violates_blocking(&region) {
                self.expand_children(&candidate.indices);
                continue;
            }
            if self.violates_must_contain(&region) {
                self.expand_children(&candidate.indices);
                continue;
            }
            return Ok(Some(region));
        }
        Ok(None)
    }

    fn block_up(&mut self, region: &Region) {
        self.blocked_up.push(region.clone());
    }

    fn block_down(&mut self, region: &Region) {
        self.blocked_down.push(region.clone());
    }

    fn block_score(&mut self, score: &BigRational) {
        let _ = score_to_f64(score);
        // The greedy frontier already explores in strictly decreasing score
        // order, so once a score threshold is crossed every remaining
        // candidate is worse; nothing further to assert.
    }

    fn reset(&mut self) {
        self.must_contain_region = None;
        self.blocked_up.clear();
        self.blocked_down.clear();
        self.visited.clear();
        *self = Self::new(self.feature_space.clone());
    }

    fn trivially_optimal(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

    fn small_feature_space() -> FeatureSpace {
        let mut thresholds = Map::new();
        thresholds.insert(0, vec![1.0, 2.0, 3.0]);
        let mut limits = Map::new();
        limits.insert(0, (0.0, 4.0));
        FeatureSpace::build(&thresholds, &limits).unwrap()
    }

    #[test]
    fn first_seed_is_the_full_domain() {
        let fs = small_feature_space();
        let domain = fs.get_domain(0).to_vec();
        let mut gen = GreedyGenerator::new(fs);
        let seed = gen.get_seed().unwrap().unwrap();
        let bound = seed.get(0).unwrap();
        assert!((bound.lower - domain[0]).abs() < 1e-9);
        assert!((bound.upper - domain[domain.len() - 1]).abs() < 1e-9);
    }

    #[test]
    fn blocking_the_full_domain_yields_a_narrower_seed() {
        let fs = small_feature_space();
        let mut gen = GreedyGenerator::new(fs);
        let first = gen.get_seed().unwrap().unwrap();
        gen.block_up(&first);
        let second = gen.get_seed().unwrap();
        assert!(second.is_none_or(|r| !r.approx_eq(&first)));
    }
}
