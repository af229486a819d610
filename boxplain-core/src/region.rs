//! Axis-aligned hyperrectangles over the feature space.
//!
//! A [`Region`] maps a subset of feature indices to a half-open interval
//! `(lower, upper)`. A feature absent from the map is unconstrained: the
//! region spans the whole axis on that dimension.

use std::collections::BTreeMap;

/// Floating-point tolerance used by [`Region::approx_eq`].
pub const EPSILON: f64 = 1e-9;

/// A half-open interval `[lower, upper)` on a single feature axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bound {
    pub lower: f64,
    pub upper: f64,
}

impl Bound {
    /// Construct a bound, asserting `lower < upper`.
    ///
    /// # Panics
    /// Panics if `lower >= upper`; callers are expected to have validated
    /// bounds against the feature's domain before construction.
    #[must_use]
    pub fn new(lower: f64, upper: f64) -> Self {
        assert!(lower < upper, "bound lower must be < upper: {lower} vs {upper}");
        Self { lower, upper }
    }
}

/// An axis-aligned hyperrectangle keyed by feature index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Region {
    bounds: BTreeMap<usize, Bound>,
}

impl Region {
    /// The universe: unconstrained on every feature.
    #[must_use]
    pub fn universe() -> Self {
        Self::default()
    }

    /// Construct a region from an iterator of `(feature, bound)` pairs.
    #[must_use]
    pub fn from_bounds(bounds: impl IntoIterator<Item = (usize, Bound)>) -> Self {
        Self {
            bounds: bounds.into_iter().collect(),
        }
    }

    /// Return the bound for `feature`, if the region is constrained on it.
    #[must_use]
    pub fn get(&self, feature: usize) -> Option<Bound> {
        self.bounds.get(&feature).copied()
    }

    /// Set the bound for `feature`, replacing any existing constraint.
    pub fn set(&mut self, feature: usize, bound: Bound) {
        self.bounds.insert(feature, bound);
    }

    /// Remove the constraint on `feature`, leaving it unconstrained.
    pub fn unconstrain(&mut self, feature: usize) {
        self.bounds.remove(&feature);
    }

    /// Iterate over `(feature, bound)` pairs in ascending feature order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Bound)> + '_ {
        self.bounds.iter().map(|(&feature, &bound)| (feature, bound))
    }

    /// Number of features this region constrains.
    #[must_use]
    pub fn constrained_len(&self) -> usize {
        self.bounds.len()
    }

    /// True iff this region contains the point.
    #[must_use]
    pub fn contains_point(&self, point: &[f64]) -> bool {
        self.bounds.iter().all(|(&feature, bound)| {
            point
                .get(feature)
                .is_some_and(|&value| value >= bound.lower && value < bound.upper)
        })
    }

    /// True iff `self` contains `other`: `self` is constrained to a superset
    /// of every interval `other` constrains, treating an unconstrained
    /// feature in `self` as the whole axis.
    #[must_use]
    pub fn contains(&self, other: &Region) -> bool {
        other.bounds.iter().all(|(&feature, other_bound)| {
            self.bounds.get(&feature).is_none_or(|self_bound| {
                self_bound.lower <= other_bound.lower && self_bound.upper >= other_bound.upper
            })
        })
    }

    /// True iff `self` and `other` are equal up to [`EPSILON`] on shared
    /// features, and constrain exactly the same set of features.
    #[must_use]
    pub fn approx_eq(&self, other: &Region) -> bool {
        if self.bounds.len() != other.bounds.len() {
            return false;
        }
        self.bounds.iter().all(|(feature, bound)| {
            other.bounds.get(feature).is_some_and(|other_bound| {
                (bound.lower - other_bound.lower).abs() < EPSILON
                    && (bound.upper - other_bound.upper).abs() < EPSILON
            })
        })
    }

    /// True iff this region is blocked because some previously yielded
    /// region `blocker` makes it a (non-strict) superset: `blocker ⊆ self`.
    #[must_use]
    pub fn blocked_up_by(&self, blocker: &Region) -> bool {
        self.contains(blocker)
    }

    /// True iff this region is blocked because some previously yielded
    /// region `blocker` makes it a (non-strict) subset: `self ⊆ blocker`.
    #[must_use]
    pub fn blocked_down_by(&self, blocker: &Region) -> bool {
        blocker.contains(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(pairs: &[(usize, f64, f64)]) -> Region {
        Region::from_bounds(pairs.iter().map(|&(f, l, u)| (f, Bound::new(l, u))))
    }

    #[test]
    fn universe_contains_everything() {
        let universe = Region::universe();
        let tight = region(&[(0, 0.0, 1.0), (1, -5.0, 5.0)]);
        assert!(universe.contains(&tight));
        assert!(!tight.contains(&universe));
    }

    #[test]
    fn contains_respects_absent_features_as_whole_axis() {
        let wide = region(&[(0, 0.0, 10.0)]);
        let narrow = region(&[(0, 1.0, 2.0), (1, -1.0, 1.0)]);
        assert!(wide.contains(&narrow));
    }

    #[test]
    fn approx_eq_tolerates_small_drift() {
        let a = region(&[(0, 0.0, 1.0)]);
        let b = region(&[(0, 0.0 + 1e-12, 1.0 - 1e-12)]);
        assert!(a.approx_eq(&b));
    }

    #[test]
    fn contains_point_treats_absent_feature_as_unconstrained() {
        let r = region(&[(0, 0.0, 1.0)]);
        assert!(r.contains_point(&[0.5, 1000.0]));
        assert!(!r.contains_point(&[1.0, 0.0]));
    }

    #[test]
    fn blocked_up_and_down_are_duals() {
        let parent = region(&[(0, 0.0, 10.0)]);
        let child = region(&[(0, 2.0, 3.0)]);
        assert!(child.blocked_up_by(&parent));
        assert!(parent.blocked_down_by(&child));
        assert!(!parent.blocked_up_by(&child));
    }
}
