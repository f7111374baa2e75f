//! # Heavy-Computation Harness
//!
//! Runs the kernel once with a fixed domain size, measures the wall-clock
//! duration around the call and reports both. With `--compare` every
//! variant is evaluated at the same size and worker count and its deviation
//! from the canonical value is listed, so an "optimized" rewrite that drifts
//! from the canonical semantics is visible at a glance.
//!
//! ## Configuration
//!
//! Defaults come from `KernelConfig::default()`, then `HK_*` environment
//! variables, then command-line flags. Logging honours `RUST_LOG`.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hk_compute::{evaluate_config, Evaluation, KernelConfig, MergeStrategy, Variant};

/// Heavy-computation kernel harness
#[derive(Parser, Debug)]
#[command(name = "hk-harness")]
#[command(about = "Time one evaluation of the heavy-computation kernel")]
struct Args {
    /// Outer domain size (overrides HK_SIZE)
    #[arg(short, long)]
    size: Option<i64>,

    /// Worker count (overrides HK_WORKERS; default: available threads)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Semantic variant (overrides HK_VARIANT)
    #[arg(short, long)]
    variant: Option<Variant>,

    /// Merge strategy for partition results (overrides HK_MERGE)
    #[arg(short, long)]
    merge: Option<MergeStrategy>,

    /// Emit a JSON report instead of text
    #[arg(long)]
    json: bool,

    /// Evaluate every variant and report deviation from the canonical one
    #[arg(long)]
    compare: bool,
}

/// One timed evaluation.
#[derive(Debug, Serialize)]
struct Report {
    #[serde(flatten)]
    evaluation: Evaluation,
    elapsed_ms: f64,
    /// `value - canonical`, present in comparison runs
    #[serde(skip_serializing_if = "Option::is_none")]
    deviation: Option<f64>,
}

fn load_config(args: &Args) -> KernelConfig {
    let mut config = KernelConfig::from_env();
    if let Some(size) = args.size {
        config.size = size;
    }
    if let Some(workers) = args.workers {
        config.workers = Some(workers);
    }
    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    if let Some(merge) = args.merge {
        config.merge = merge;
    }
    config
}

fn timed(config: &KernelConfig) -> Result<(Evaluation, Duration)> {
    let start = Instant::now();
    let evaluation = evaluate_config(config)
        .with_context(|| format!("evaluating variant {}", config.variant))?;
    Ok((evaluation, start.elapsed()))
}

fn run_single(config: &KernelConfig, json: bool) -> Result<()> {
    if !json {
        println!("Starting heavy computation test...");
    }

    let (evaluation, elapsed) = timed(config)?;
    let report = Report {
        evaluation,
        elapsed_ms: elapsed.as_secs_f64() * 1e3,
        deviation: None,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Heavy computation finished.");
        println!("Final result: {}", report.evaluation.value);
        println!("Computation took {:.3} ms.", report.elapsed_ms);
    }
    Ok(())
}

fn run_comparison(config: &KernelConfig, json: bool) -> Result<()> {
    let canonical = config.clone().with_variant(Variant::CANONICAL);
    let (reference, _) = timed(&canonical)?;

    let mut reports = Vec::with_capacity(Variant::ALL.len());
    for variant in Variant::ALL {
        let (evaluation, elapsed) = timed(&config.clone().with_variant(variant))?;
        let deviation = evaluation.value - reference.value;
        if deviation != 0.0 {
            warn!(%variant, deviation, "variant differs from canonical value");
        }
        reports.push(Report {
            evaluation,
            elapsed_ms: elapsed.as_secs_f64() * 1e3,
            deviation: Some(deviation),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!(
        "{:<20} {:>24} {:>14} {:>12} {:>10}",
        "variant", "result", "deviation", "corrections", "ms"
    );
    for report in &reports {
        println!(
            "{:<20} {:>24.5} {:>14.5} {:>12} {:>10.3}",
            report.evaluation.variant.to_string(),
            report.evaluation.value,
            report.deviation.unwrap_or_default(),
            report.evaluation.corrections,
            report.elapsed_ms
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args);
    config.validate().context("invalid kernel configuration")?;

    info!(
        size = config.size,
        variant = %config.variant,
        workers = config.resolved_workers(),
        merge = %config.merge,
        "Heavy-computation harness"
    );

    if args.compare {
        run_comparison(&config, args.json)
    } else {
        run_single(&config, args.json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "hk-harness",
            "--size",
            "12",
            "--variant",
            "row-local",
            "--merge",
            "locked",
            "--workers",
            "2",
        ]);
        let config = load_config(&args);
        assert_eq!(config.size, 12);
        assert_eq!(config.variant, Variant::RowLocal);
        assert_eq!(config.merge, MergeStrategy::Locked);
        assert_eq!(config.workers, Some(2));
    }

    #[test]
    fn test_unknown_variant_is_rejected() {
        assert!(Args::try_parse_from(["hk-harness", "--variant", "fastest"]).is_err());
    }

    #[test]
    fn test_report_json_shape() {
        let config = KernelConfig::default().with_size(2).with_workers(1);
        let (evaluation, _) = timed(&config).unwrap();
        let report = Report {
            evaluation,
            elapsed_ms: 1.0,
            deviation: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["variant"], "closed-form");
        assert_eq!(json["value"], 1645.0);
        assert!(json.get("deviation").is_none());
    }
}
