//! Region-search engine benchmarks.
//!
//! Measures the cost of the entailment oracle, the lattice traverser, and
//! the seed generator family on synthetic balanced ensembles of increasing
//! feature count.
#![allow(missing_docs, reason = "Criterion macros generate undocumented items")]
#![allow(
    clippy::expect_used,
    reason = "benchmark setup is infallible for valid constants"
)]
#![allow(
    clippy::shadow_reuse,
    reason = "Criterion bench_with_input closures rebind parameter names"
)]
#![allow(
    clippy::excessive_nesting,
    reason = "Criterion bench_with_input + b.iter pattern requires deep nesting"
)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use boxplain_benches::fixtures::{balanced_ensemble, balanced_feature_space, midpoint};
use boxplain_core::{EntailmentOracle, GreedyGenerator, LatticeTraverser, SeedGeneratorOps, new_context};

/// Seed used for all benchmark solver contexts.
const SEED: u32 = 21023;

/// Feature counts to benchmark.
const FEATURE_COUNTS: &[usize] = &[2, 4, 8];

fn entails_anchor(c: &mut Criterion) {
    let mut group = c.benchmark_group("entails_anchor");
    group.sample_size(20);

    for &feature_count in FEATURE_COUNTS {
        let ensemble = balanced_ensemble(3, feature_count);
        let feature_space =
            balanced_feature_space(3, feature_count).expect("feature space must build");
        let point = midpoint(feature_count);

        group.bench_with_input(
            BenchmarkId::from_parameter(feature_count),
            &feature_count,
            |b, _| {
                b.iter(|| {
                    let ctx = new_context(SEED);
                    let oracle = EntailmentOracle::new(&ctx, ensemble.clone());
                    let anchor = feature_space.anchor_region(&point);
                    let class = oracle.predict(&point).expect("predict must succeed");
                    oracle.entails(&anchor, class).expect("entails must succeed");
                });
            },
        );
    }

    group.finish();
}

fn grow_anchor(c: &mut Criterion) {
    let mut group = c.benchmark_group("grow_anchor");
    group.sample_size(20);

    for &feature_count in FEATURE_COUNTS {
        let ensemble = balanced_ensemble(3, feature_count);
        let feature_space =
            balanced_feature_space(3, feature_count).expect("feature space must build");
        let point = midpoint(feature_count);

        group.bench_with_input(
            BenchmarkId::from_parameter(feature_count),
            &feature_count,
            |b, _| {
                b.iter(|| {
                    let ctx = new_context(SEED);
                    let oracle = EntailmentOracle::new(&ctx, ensemble.clone());
                    let anchor = feature_space.anchor_region(&point);
                    let class = oracle.predict(&point).expect("predict must succeed");
                    let traverser = LatticeTraverser::new(&feature_space);
                    traverser
                        .grow(&oracle, &anchor, class)
                        .expect("grow must succeed");
                });
            },
        );
    }

    group.finish();
}

fn greedy_first_seed(c: &mut Criterion) {
    let mut group = c.benchmark_group("greedy_first_seed");
    group.sample_size(20);

    for &feature_count in FEATURE_COUNTS {
        let feature_space =
            balanced_feature_space(3, feature_count).expect("feature space must build");

        group.bench_with_input(
            BenchmarkId::from_parameter(feature_count),
            &feature_count,
            |b, _| {
                b.iter(|| {
                    let mut generator = GreedyGenerator::new(feature_space.clone());
                    generator.get_seed().expect("get_seed must succeed");
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, entails_anchor, grow_anchor, greedy_first_seed);
criterion_main!(benches);
