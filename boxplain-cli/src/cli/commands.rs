//! Command implementations and argument parsing for the boxplain CLI.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use boxplain_core::{
    ConfigError, CoreError, EntailmentOracle, Explanation, ExplanationProgram, FeatureSpace,
    GreedyGenerator, IncrementalHittingSetGenerator, MaxSatGenerator, OracleError, SeedGenerator,
    SeedPolicy, SmtGenerator, SmtMode, UniformCostGenerator, new_context, parse_policy,
};
use boxplain_providers_ensemble::{EnsembleProviderError, parse_ensemble};
use boxplain_providers_limits::{LimitsProviderError, parse_limits};

const DEFAULT_SEED: u32 = 21023;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "boxplain", about = "Explain gradient-boosted predictions with entailment-maximal regions.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Explain or enumerate explanations for a single point.
    Run(RunArgs),
    /// Run enumeration to completion (or a cap) and emit CSV rows.
    Bench(BenchArgs),
}

/// Options shared by `run` and `bench`: model, limits, and the seed
/// generator configuration.
#[derive(Debug, Args, Clone)]
pub struct SearchArgs {
    /// Path to the ensemble JSON file.
    #[arg(long)]
    pub model: PathBuf,

    /// Path to the headerless limits CSV file.
    #[arg(long)]
    pub limits: PathBuf,

    /// The point to explain: a comma-separated float list, or `random`.
    pub point: String,

    /// Seed generator policy: one of `rand`, `min`, `maxsat`, `maxstrat`,
    /// `incrmaxsat`, `ucs`, `greedy`.
    #[arg(long = "seed-gen", default_value = "rand")]
    pub seed_gen: String,

    /// Tighten the generator to require strictly larger volume score after
    /// each entailing yield.
    #[arg(long = "block-score")]
    pub block_score: bool,

    /// Determinism seed for the underlying solver.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u32,
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Enumerate explanations instead of computing a single `explain` result.
    #[arg(short = 'E', long = "enumerate", conflicts_with = "explain")]
    pub enumerate: bool,

    /// Compute a single `explain` result (the default).
    #[arg(short = 'e', long = "explain")]
    pub explain: bool,

    /// Cap the number of yields in enumerate mode.
    #[arg(long = "max-yields")]
    pub max_yields: Option<usize>,
}

/// Options accepted by the `bench` command.
#[derive(Debug, Args, Clone)]
pub struct BenchArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Cap the number of yields.
    #[arg(long = "max-yields")]
    pub max_yields: Option<usize>,

    /// Write CSV rows here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Errors surfaced while executing CLI commands.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while loading an input file.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The ensemble file was malformed.
    #[error(transparent)]
    Ensemble(#[from] EnsembleProviderError),
    /// The limits file was malformed.
    #[error(transparent)]
    Limits(#[from] LimitsProviderError),
    /// Configuration was invalid (unknown seed generator, missing limits).
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The entailment oracle failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),
    /// A point string was not a valid `x_csv` list.
    #[error("invalid point `{raw}`: {detail}")]
    InvalidPoint { raw: String, detail: String },
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Config(c) => Self::Config(c),
            CoreError::Oracle(o) => Self::Oracle(o),
        }
    }
}

impl CliError {
    /// Stable machine-readable code for the variants that carry one.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Ensemble(e) => Some(e.code().as_str()),
            Self::Limits(e) => Some(e.code().as_str()),
            Self::Config(e) => Some(e.code().as_str()),
            Self::Oracle(e) => Some(e.code().as_str()),
            Self::Io { .. } | Self::InvalidPoint { .. } => None,
        }
    }
}

/// One row of program output, corresponding to a single yielded explanation.
#[derive(Debug, Clone)]
pub struct OutputRow {
    pub region_description: String,
    pub score: f64,
    pub entailing: bool,
    pub oracle_calls: u64,
    pub entailing_count: u64,
    pub non_entailing_count: u64,
    pub best_score: f64,
    pub seed_time_ms: f64,
    pub traversal_time_ms: f64,
}

fn describe_region(region: &boxplain_core::Region) -> String {
    region
        .iter()
        .map(|(feature, bound)| format!("{feature}:[{:.6},{:.6})", bound.lower, bound.upper))
        .collect::<Vec<_>>()
        .join(";")
}

fn explanation_to_row(explanation: &Explanation) -> OutputRow {
    OutputRow {
        region_description: describe_region(&explanation.region),
        score: explanation.stats.score,
        entailing: explanation.stats.entailing,
        oracle_calls: explanation.stats.oracle_calls,
        entailing_count: explanation.stats.entailing_count,
        non_entailing_count: explanation.stats.non_entailing_count,
        best_score: explanation.stats.best_score,
        seed_time_ms: explanation.stats.seed_time.as_secs_f64() * 1000.0,
        traversal_time_ms: explanation.stats.traversal_time.as_secs_f64() * 1000.0,
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_point(raw: &str, feature_space: &FeatureSpace, seed: u32) -> Result<Vec<f64>, CliError> {
    if raw.trim().eq_ignore_ascii_case("random") {
        let mut rng = SmallRng::seed_from_u64(u64::from(seed));
        let num_features = feature_space.features().count();
        let mut point = vec![0.0; num_features.max(1)];
        for feature in feature_space.features() {
            let dmin = feature_space.get_dmin(feature);
            let dmax = feature_space.get_dmax(feature);
            if feature < point.len() {
                point[feature] = rng.gen_range(dmin..dmax);
            }
        }
        return Ok(point);
    }
    raw.split(',')
        .map(|field| {
            field.trim().parse::<f64>().map_err(|err| CliError::InvalidPoint {
                raw: raw.to_owned(),
                detail: err.to_string(),
            })
        })
        .collect()
}

fn build_generator<'ctx>(
    policy: SeedPolicy,
    ctx: &'ctx z3::Context,
    feature_space: FeatureSpace,
) -> SeedGenerator<'ctx> {
    match policy {
        SeedPolicy::Rand => SeedGenerator::Smt(SmtGenerator::new(ctx, feature_space, SmtMode::Rand)),
        SeedPolicy::Min => SeedGenerator::Smt(SmtGenerator::new(ctx, feature_space, SmtMode::Min)),
        SeedPolicy::MaxSat => SeedGenerator::MaxSat(MaxSatGenerator::new(ctx, feature_space, false)),
        SeedPolicy::StratifiedMaxSat => {
            SeedGenerator::MaxSat(MaxSatGenerator::new(ctx, feature_space, true))
        }
        SeedPolicy::IncrementalMaxSat => {
            SeedGenerator::IncrementalHittingSet(IncrementalHittingSetGenerator::new(feature_space))
        }
        SeedPolicy::Ucs => SeedGenerator::UniformCost(UniformCostGenerator::new(feature_space)),
        SeedPolicy::Greedy => SeedGenerator::Greedy(GreedyGenerator::new(feature_space)),
    }
}

/// Build the feature space, oracle, and seed generator for `args`, handing
/// back everything a caller needs to drive an [`ExplanationProgram`].
///
/// # Errors
/// Returns [`CliError`] if any input file is malformed or configuration is
/// invalid.
pub fn load_search_context(
    search: &SearchArgs,
    ctx: &z3::Context,
) -> Result<(FeatureSpace, EntailmentOracle<'_>), CliError> {
    let ensemble_bytes = read_file(&search.model)?;
    let ensemble = parse_ensemble(&ensemble_bytes)?;
    let limits_bytes = read_file(&search.limits)?;
    let limits_reader = io::Cursor::new(limits_bytes);
    let limits = parse_limits(limits_reader)?;

    let thresholds = ensemble.thresholds();
    let feature_space = FeatureSpace::build(&thresholds, &limits)?;
    let oracle = EntailmentOracle::new(ctx, ensemble);
    Ok((feature_space, oracle))
}

/// Execute the `run` command: either `explain` once, or enumerate up to
/// `max_yields` explanations, printing each row to stdout.
///
/// # Errors
/// Returns [`CliError`] on malformed inputs, invalid configuration, or
/// oracle failure.
pub fn run_run(args: RunArgs) -> Result<Vec<OutputRow>, CliError> {
    let ctx = new_context(args.search.seed);
    let (feature_space, oracle) = load_search_context(&args.search, &ctx)?;
    let policy = parse_policy(&args.search.seed_gen)?;
    let point = parse_point(&args.search.point, &feature_space, args.search.seed)?;
    let generator = build_generator(policy, &ctx, feature_space.clone());
    let mut program = ExplanationProgram::new(oracle, &feature_space, generator, args.search.block_score);

    if args.enumerate {
        let mut rows = Vec::new();
        let cap = args.max_yields.unwrap_or(usize::MAX);
        while rows.len() < cap {
            match program.next_explanation(&point)? {
                Some(explanation) => rows.push(explanation_to_row(&explanation)),
                None => break,
            }
        }
        Ok(rows)
    } else {
        let explanation = program.explain(&point)?;
        Ok(vec![explanation_to_row(&explanation)])
    }
}

/// Execute the `bench` command: enumerate to completion (or `max_yields`)
/// and return every row, for the caller to serialise as CSV.
///
/// # Errors
/// Returns [`CliError`] on malformed inputs, invalid configuration, or
/// oracle failure.
pub fn run_bench(args: &BenchArgs) -> Result<Vec<OutputRow>, CliError> {
    let ctx = new_context(args.search.seed);
    let (feature_space, oracle) = load_search_context(&args.search, &ctx)?;
    let policy = parse_policy(&args.search.seed_gen)?;
    let point = parse_point(&args.search.point, &feature_space, args.search.seed)?;
    let generator = build_generator(policy, &ctx, feature_space.clone());
    let mut program = ExplanationProgram::new(oracle, &feature_space, generator, args.search.block_score);

    let mut rows = Vec::new();
    let cap = args.max_yields.unwrap_or(usize::MAX);
    while rows.len() < cap {
        match program.next_explanation(&point)? {
            Some(explanation) => rows.push(explanation_to_row(&explanation)),
            None => break,
        }
    }
    Ok(rows)
}

/// Render output rows as CSV to `writer`.
///
/// # Errors
/// Returns [`io::Error`] if writing fails.
pub fn render_rows(rows: &[OutputRow], mut writer: impl Write) -> io::Result<()> {
    writeln!(
        writer,
        "region,score,entailing,oracle_calls,entailing_count,non_entailing_count,best_score,seed_time_ms,traversal_time_ms"
    )?;
    for row in rows {
        writeln!(
            writer,
            "{},{:.9},{},{},{},{},{:.9},{:.3},{:.3}",
            row.region_description,
            row.score,
            row.entailing,
            row.oracle_calls,
            row.entailing_count,
            row.non_entailing_count,
            row.best_score,
            row.seed_time_ms,
            row.traversal_time_ms,
        )?;
    }
    Ok(())
}

/// Entry point dispatching `cli.command`, returning the rows to render.
///
/// # Errors
/// Returns [`CliError`] if the underlying command fails.
pub fn run_cli(cli: Cli) -> Result<Vec<OutputRow>, CliError> {
    match cli.command {
        Command::Run(args) => run_run(args),
        Command::Bench(args) => {
            let rows = run_bench(&args)?;
            if let Some(out) = &args.out {
                let file = File::create(out).map_err(|source| CliError::Io {
                    path: out.clone(),
                    source,
                })?;
                render_rows(&rows, BufWriter::new(file)).map_err(|source| CliError::Io {
                    path: out.clone(),
                    source,
                })?;
            }
            Ok(rows)
        }
    }
}
