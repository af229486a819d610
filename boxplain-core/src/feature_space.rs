//! Per-feature threshold domains, extended with external limits.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::region::{Bound, Region};

/// Minimum gap enforced between a limit sentinel and an adjacent threshold.
const NUDGE: f64 = 1e-6;

/// External lower/upper limits supplied per feature.
pub type Limits = BTreeMap<usize, (f64, f64)>;

/// Per-feature sorted thresholds extended with limit sentinels.
#[derive(Clone, Debug)]
pub struct FeatureSpace {
    domains: BTreeMap<usize, Vec<f64>>,
}

impl FeatureSpace {
    /// Build the extended domain for every feature in `thresholds`, checked
    /// against `limits`.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingFeatureLimits`] if a feature with
    /// thresholds has no entry in `limits`, or
    /// [`ConfigError::InvalidLimitOrder`] if a limit pair is inverted.
    pub fn build(
        thresholds: &BTreeMap<usize, Vec<f64>>,
        limits: &Limits,
    ) -> Result<Self, ConfigError> {
        let mut domains = BTreeMap::new();
        for (&feature, raw_thresholds) in thresholds {
            let (lo, hi) = limits
                .get(&feature)
                .copied()
                .ok_or(ConfigError::MissingFeatureLimits { feature })?;
            if lo >= hi {
                return Err(ConfigError::InvalidLimitOrder {
                    feature,
                    lower: lo,
                    upper: hi,
                });
            }
            domains.insert(feature, build_domain(lo, hi, raw_thresholds));
        }
        Ok(Self { domains })
    }

    /// The extended domain for `feature`, sorted ascending.
    #[must_use]
    pub fn get_domain(&self, feature: usize) -> &[f64] {
        self.domains
            .get(&feature)
            .map_or(&[][..], Vec::as_slice)
    }

    /// The natural minimum of the feature's extended domain.
    #[must_use]
    pub fn get_dmin(&self, feature: usize) -> f64 {
        self.get_domain(feature).first().copied().unwrap_or(f64::NEG_INFINITY)
    }

    /// The natural maximum of the feature's extended domain.
    #[must_use]
    pub fn get_dmax(&self, feature: usize) -> f64 {
        self.get_domain(feature).last().copied().unwrap_or(f64::INFINITY)
    }

    /// Number of domain points for `feature` (`m_i`).
    #[must_use]
    pub fn domain_len(&self, feature: usize) -> usize {
        self.get_domain(feature).len()
    }

    /// Iterate over active feature indices in ascending order.
    pub fn features(&self) -> impl Iterator<Item = usize> + '_ {
        self.domains.keys().copied()
    }

    /// Number of elementary interval pairs for `feature`: `m_i(m_i-1)/2`.
    #[must_use]
    pub fn pair_count(&self, feature: usize) -> u64 {
        pairs(self.domain_len(feature))
    }

    /// Total pair count summed across all features.
    #[must_use]
    pub fn total_pair_count(&self) -> u64 {
        self.domains.keys().map(|&f| self.pair_count(f)).sum()
    }

    /// Total count of possible elementary regions: `Π_i m_i(m_i-1)/2`.
    #[must_use]
    pub fn total_region_count(&self) -> u128 {
        self.domains
            .keys()
            .map(|&f| u128::from(self.pair_count(f)))
            .product()
    }

    /// Map a concrete point to its anchor region: the smallest elementary
    /// hyperrectangle, with threshold-aligned corners, containing `point`.
    ///
    /// A feature whose value sits exactly on a threshold uses the half-open
    /// bracket containing that threshold as its lower endpoint.
    #[must_use]
    pub fn anchor_region(&self, point: &[f64]) -> Region {
        let mut region = Region::universe();
        for (feature, domain) in &self.domains {
            let Some(&value) = point.get(*feature) else {
                continue;
            };
            let idx = match domain.binary_search_by(|probe| probe.total_cmp(&value)) {
                Ok(exact) => exact.min(domain.len().saturating_sub(2)),
                Err(insert_at) => insert_at.saturating_sub(1).min(domain.len().saturating_sub(2)),
            };
            let lower = domain[idx];
            let upper = domain[idx + 1];
            region.set(*feature, Bound::new(lower, upper));
        }
        region
    }
}

fn pairs(m: usize) -> u64 {
    let m = m as u64;
    m.saturating_mul(m.saturating_sub(1)) / 2
}

fn build_domain(lo: f64, hi: f64, thresholds: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = thresholds.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup_by(|a, b| (*a - *b).abs() < f64::EPSILON);

    let mut lo = lo;
    let mut hi = hi;
    if let Some(&first) = sorted.first() {
        if (first - lo).abs() < NUDGE {
            lo = first - NUDGE;
        }
    }
    if let Some(&last) = sorted.last() {
        if (last - hi).abs() < NUDGE {
            hi = last + NUDGE;
        }
    }

    let mut domain = Vec::with_capacity(sorted.len() + 2);
    domain.push(lo);
    domain.extend(sorted);
    domain.push(hi);
    domain
}
