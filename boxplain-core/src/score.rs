//! Volume scoring: `Π_i (upper_i − lower_i) / (dmax_i − dmin_i)`, computed
//! in exact rational arithmetic so a high-dimensional product of small
//! fractions never underflows to zero in `f64`.

use num_rational::BigRational;
use num_traits::{One, ToPrimitive};

use crate::feature_space::FeatureSpace;
use crate::region::Region;

/// The volume score of `region` relative to `feature_space`'s extended
/// domains. Features `region` leaves unconstrained contribute a factor of
/// one (the whole axis).
#[must_use]
pub fn volume_score(region: &Region, feature_space: &FeatureSpace) -> BigRational {
    let mut score = BigRational::one();
    for (feature, bound) in region.iter() {
        let dmin = feature_space.get_dmin(feature);
        let dmax = feature_space.get_dmax(feature);
        let span = BigRational::from_float(bound.upper - bound.lower)
            .unwrap_or_else(BigRational::one);
        let total = BigRational::from_float(dmax - dmin).unwrap_or_else(BigRational::one);
        if !total.numer().eq(&num_bigint::BigInt::from(0)) {
            score *= span / total;
        }
    }
    score
}

/// Project a [`BigRational`] score to `f64` for reporting and logging.
#[must_use]
pub fn score_to_f64(score: &BigRational) -> f64 {
    score.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Bound;
    use std::collections::BTreeMap;

    #[test]
    fn universe_like_region_scores_toward_one() {
        let mut thresholds = BTreeMap::new();
        thresholds.insert(0, vec![0.5]);
        let mut limits = BTreeMap::new();
        limits.insert(0, (0.0, 1.0));
        let fs = FeatureSpace::build(&thresholds, &limits).unwrap();

        let mut region = Region::universe();
        region.set(0, Bound::new(0.0, 1.0));
        let score = volume_score(&region, &fs);
        assert!((score_to_f64(&score) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn half_span_scores_one_half() {
        let mut thresholds = BTreeMap::new();
        thresholds.insert(0, vec![0.5]);
        let mut limits = BTreeMap::new();
        limits.insert(0, (0.0, 1.0));
        let fs = FeatureSpace::build(&thresholds, &limits).unwrap();

        let mut region = Region::universe();
        region.set(0, Bound::new(0.0, 0.5));
        let score = volume_score(&region, &fs);
        assert!((score_to_f64(&score) - 0.5).abs() < 1e-6);
    }
}
