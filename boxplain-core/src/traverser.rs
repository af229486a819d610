//! The lattice traverser: per-feature binary search that grows or shrinks a
//! region while preserving (or restoring) entailment, and variable
//! elimination to derive a minimal non-entailing reason.

use crate::error::OracleError;
use crate::feature_space::FeatureSpace;
use crate::oracle::{EntailResult, EntailmentOracle};
use crate::region::{Bound, Region};

/// Binary search for the index closest to `target` (inclusive) for which
/// `check` holds, given that `check(valid)` is known to hold. `check` need
/// not be evaluated monotonically beyond the assumption that everything
/// between `valid` and the returned index also holds; the search narrows
/// the admitted boundary one midpoint at a time.
fn bisect_boundary<F>(valid: usize, target: usize, mut check: F) -> Result<usize, OracleError>
where
    F: FnMut(usize) -> Result<bool, OracleError>,
{
    if check(target)? {
        return Ok(target);
    }
    let mut left = valid;
    let mut right = target;
    while left.abs_diff(right) > 1 {
        let mid = (left + right) / 2;
        if check(mid)? {
            left = mid;
        } else {
            right = mid;
        }
    }
    Ok(left)
}

/// Locates a bound's domain indices, or the full-domain endpoints if the
/// feature is currently unconstrained.
fn bound_indices(domain: &[f64], bound: Option<Bound>) -> (usize, usize) {
    let Some(bound) = bound else {
        return (0, domain.len().saturating_sub(1));
    };
    let lower_idx = domain
        .iter()
        .position(|&d| (d - bound.lower).abs() < crate::region::EPSILON)
        .unwrap_or(0);
    let upper_idx = domain
        .iter()
        .position(|&d| (d - bound.upper).abs() < crate::region::EPSILON)
        .unwrap_or(domain.len().saturating_sub(1));
    (lower_idx, upper_idx)
}

/// Grows, shrinks, and reduces regions along the feature-space lattice.
pub struct LatticeTraverser<'a> {
    feature_space: &'a FeatureSpace,
}

impl<'a> LatticeTraverser<'a> {
    /// Build a traverser over `feature_space`.
    #[must_use]
    pub fn new(feature_space: &'a FeatureSpace) -> Self {
        Self { feature_space }
    }

    /// Grow `region` to be locally maximal along each feature individually:
    /// for each feature and each side, binary-search the largest expansion
    /// that keeps `entails(region, class)` true. Order is fixed: ascending
    /// feature index, lo-side before hi-side.
    ///
    /// # Errors
    /// Propagates [`OracleError`] from the underlying entailment checks.
    pub fn grow(
        &self,
        oracle: &EntailmentOracle<'_>,
        region: &Region,
        class: usize,
    ) -> Result<Region, OracleError> {
        let mut result = region.clone();
        for feature in self.feature_space.features() {
            let domain = self.feature_space.get_domain(feature);
            if domain.len() < 2 {
                continue;
            }
            let (lower_idx, upper_idx) = bound_indices(domain, result.get(feature));

            let new_lower_idx = bisect_boundary(lower_idx, 0, |candidate_idx| {
                let mut probe = result.clone();
                probe.set(feature, Bound::new(domain[candidate_idx], domain[upper_idx]));
                Ok(matches!(oracle.entails(&probe, class)?, EntailResult::Entails))
            })?;
            result.set(feature, Bound::new(domain[new_lower_idx], domain[upper_idx]));

            let new_upper_idx = bisect_boundary(upper_idx, domain.len() - 1, |candidate_idx| {
                let mut probe = result.clone();
                probe.set(
                    feature,
                    Bound::new(domain[new_lower_idx], domain[candidate_idx]),
                );
                Ok(matches!(oracle.entails(&probe, class)?, EntailResult::Entails))
            })?;
            result.set(feature, Bound::new(domain[new_lower_idx], domain[new_upper_idx]));
        }
        Ok(result)
    }

    /// Shrink `region` toward `anchor` on each feature, binary-searching for
    /// the smallest contraction that restores `entails(region, class)`.
    /// Present for callers that want to minimise a known region, though the
    /// explanation program does not call it directly.
    ///
    /// # Errors
    /// Propagates [`OracleError`] from the underlying entailment checks.
    pub fn shrink(
        &self,
        oracle: &EntailmentOracle<'_>,
        region: &Region,
        anchor: &Region,
        class: usize,
    ) -> Result<Region, OracleError> {
        let mut result = region.clone();
        for feature in self.feature_space.features() {
            let domain = self.feature_space.get_domain(feature);
            if domain.len() < 2 {
                continue;
            }
            let (current_lower_idx, current_upper_idx) = bound_indices(domain, result.get(feature));
            let (anchor_lower_idx, anchor_upper_idx) = bound_indices(domain, anchor.get(feature));

            let new_lower_idx = bisect_boundary(anchor_lower_idx, current_lower_idx, |candidate_idx| {
                let mut probe = result.clone();
                probe.set(feature, Bound::new(domain[candidate_idx], domain[current_upper_idx]));
                Ok(matches!(oracle.entails(&probe, class)?, EntailResult::Entails))
            })?;
            result.set(feature, Bound::new(domain[new_lower_idx], domain[current_upper_idx]));

            let new_upper_idx = bisect_boundary(anchor_upper_idx, current_upper_idx, |candidate_idx| {
                let mut probe = result.clone();
                probe.set(feature, Bound::new(domain[new_lower_idx], domain[candidate_idx]));
                Ok(matches!(oracle.entails(&probe, class)?, EntailResult::Entails))
            })?;
            result.set(feature, Bound::new(domain[new_lower_idx], domain[new_upper_idx]));
        }
        Ok(result)
    }

    /// Reduce a minimal non-entailing witness: for each constrained
    /// feature, test whether removing it (replacing its bounds with the
    /// full domain) still fails to entail; if so the feature is not part of
    /// the minimal reason and is dropped.
    ///
    /// # Errors
    /// Propagates [`OracleError`] from the underlying entailment checks.
    pub fn eliminate_vars(
        &self,
        oracle: &EntailmentOracle<'_>,
        region: &Region,
        class: usize,
    ) -> Result<Region, OracleError> {
        let mut reduced = region.clone();
        let features: Vec<usize> = region.iter().map(|(feature, _)| feature).collect();
        for feature in features {
            let mut candidate = reduced.clone();
            candidate.unconstrain(feature);
            if matches!(oracle.entails(&candidate, class)?, EntailResult::NotEntailed { .. }) {
                reduced = candidate;
            }
        }
        Ok(reduced)
    }

    /// Drop every feature whose bound already spans the full extended
    /// domain, per the boundary rule that such features carry no
    /// information for blocking.
    pub fn drop_full_domain_features(&self, region: &mut Region) {
        let features: Vec<usize> = region.iter().map(|(feature, _)| feature).collect();
        for feature in features {
            let domain = self.feature_space.get_domain(feature);
            if let (Some(bound), Some(&lo), Some(&hi)) =
                (region.get(feature), domain.first(), domain.last())
            {
                if (bound.lower - lo).abs() < crate::region::EPSILON
                    && (bound.upper - hi).abs() < crate::region::EPSILON
                {
                    region.unconstrain(feature);
                }
            }
        }
    }
}
