//! Unit tests for the CLI commands and input-loading helpers.

use super::commands::{BenchArgs, Cli, Command, RunArgs, SearchArgs, render_rows, run_bench, run_cli, run_run};
use super::CliError;

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use rstest::rstest;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn stump_json() -> &'static str {
    r#"{
        "learner": {
            "gradient_booster": {
                "model": {
                    "trees": [
                        {
                            "split_indices": [0, 0, 0],
                            "split_conditions": [0.5, -1.0, 1.0],
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "parents": [2147483647, 0, 0]
                        }
                    ],
                    "tree_info": [0],
                    "num_feature": 1,
                    "num_output_group": 1
                }
            },
            "objective": { "name": "binary:logistic" }
        }
    }"#
}

fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    let mut file = File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    Ok(path)
}

fn search_args(model: PathBuf, limits: PathBuf, point: &str) -> SearchArgs {
    SearchArgs {
        model,
        limits,
        point: point.to_owned(),
        seed_gen: "rand".into(),
        block_score: false,
        seed: 21023,
    }
}

#[rstest]
fn run_explain_succeeds_on_a_stump() -> TestResult {
    let dir = temp_dir();
    let model = write_file(&dir, "model.json", stump_json())?;
    let limits = write_file(&dir, "limits.csv", "0,0.0,1.0\n")?;
    let args = RunArgs {
        search: search_args(model, limits, "0.9"),
        enumerate: false,
        explain: true,
        max_yields: None,
    };
    let rows = run_run(args)?;
    assert_eq!(rows.len(), 1);
    assert!(rows[0].score > 0.0);
    Ok(())
}

#[rstest]
fn run_rejects_malformed_points() -> TestResult {
    let dir = temp_dir();
    let model = write_file(&dir, "model.json", stump_json())?;
    let limits = write_file(&dir, "limits.csv", "0,0.0,1.0\n")?;
    let args = RunArgs {
        search: search_args(model, limits, "not-a-number"),
        enumerate: false,
        explain: true,
        max_yields: None,
    };
    let err = run_run(args).expect_err("malformed point must fail");
    assert!(matches!(err, CliError::InvalidPoint { .. }));
    Ok(())
}

#[rstest]
fn run_rejects_unknown_seed_generator() -> TestResult {
    let dir = temp_dir();
    let model = write_file(&dir, "model.json", stump_json())?;
    let limits = write_file(&dir, "limits.csv", "0,0.0,1.0\n")?;
    let mut search = search_args(model, limits, "0.9");
    search.seed_gen = "unknown".into();
    let args = RunArgs {
        search,
        enumerate: false,
        explain: true,
        max_yields: None,
    };
    let err = run_run(args).expect_err("unknown seed generator must fail");
    assert!(matches!(err, CliError::Config(_)));
    Ok(())
}

#[rstest]
fn bench_enumerates_up_to_the_yield_cap() -> TestResult {
    let dir = temp_dir();
    let model = write_file(&dir, "model.json", stump_json())?;
    let limits = write_file(&dir, "limits.csv", "0,0.0,1.0\n")?;
    let args = BenchArgs {
        search: search_args(model, limits, "0.9"),
        max_yields: Some(1),
        out: None,
    };
    let rows = run_bench(&args)?;
    assert!(rows.len() <= 1);
    Ok(())
}

#[rstest]
fn bench_writes_csv_to_the_requested_file() -> TestResult {
    let dir = temp_dir();
    let model = write_file(&dir, "model.json", stump_json())?;
    let limits = write_file(&dir, "limits.csv", "0,0.0,1.0\n")?;
    let out_path = dir.path().join("rows.csv");
    let args = Cli {
        command: Command::Bench(BenchArgs {
            search: search_args(model, limits, "0.9"),
            max_yields: Some(1),
            out: Some(out_path.clone()),
        }),
    };
    run_cli(args)?;
    let contents = std::fs::read_to_string(&out_path)?;
    assert!(contents.starts_with("region,score,entailing"));
    Ok(())
}

#[rstest]
fn render_rows_emits_a_csv_header() -> TestResult {
    let mut buffer = Vec::new();
    render_rows(&[], &mut buffer)?;
    let text = String::from_utf8(buffer)?;
    assert!(text.starts_with("region,score,entailing"));
    Ok(())
}

#[rstest]
fn clap_rejects_conflicting_mode_flags() {
    let args = [
        "boxplain",
        "run",
        "--model",
        "model.json",
        "--limits",
        "limits.csv",
        "0.9",
        "-e",
        "-E",
    ];
    let result = Cli::try_parse_from(args);
    assert!(result.is_err());
}
