// Cascade Benchmark Runner v0.2.0 — Ensemble Exploration of Runaway Dynamics
// Monte Carlo over parameter ranges, seedable PRNG, per-scenario JSON report
//
// Usage:
//   cargo run --release --bin bench                     # All scenarios (200 members each)
//   cargo run --release --bin bench -- --runs 50        # Quick mode
//   cargo run --release --bin bench -- CLIMATE          # Filter by name
//   cargo run --release --bin bench -- --seed 42        # Custom base seed

mod report;
mod scenarios;

use cascade_engine::ensemble::{percentile, run_ensemble};
use cascade_engine::phase::classify;
use cascade_engine::Phase;
use report::*;
use scenarios::*;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    runs: usize,
    seed: u64,
    filter: Option<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        runs: 200,
        seed: 42,
        filter: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" => {
                i += 1;
                if i < args.len() {
                    cli.runs = args[i].parse().unwrap_or(200);
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().unwrap_or(42);
                }
            }
            arg if !arg.starts_with('-') => {
                cli.filter = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    let cli = parse_args();
    let all_scenarios = scenarios();

    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f_lower = f.to_lowercase();
            all_scenarios
                .iter()
                .filter(|s| {
                    s.name.to_lowercase().contains(&f_lower)
                        || s.label.to_lowercase().contains(&f_lower)
                        || s.category.to_lowercase().contains(&f_lower)
                })
                .collect()
        }
        None => all_scenarios.iter().collect(),
    };

    if to_run.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    println!("\n  Cascade Benchmark Runner v0.2.0");
    println!(
        "  PRNG: ChaCha8Rng | Members/scenario: {} | Base seed: {}",
        cli.runs, cli.seed
    );
    println!("  Running {} scenario(s)...\n", to_run.len());
    println!(
        "  {:<44} {:>10} {:>10} {:>10} {:>6} {:>6} {:>7}",
        "Scenario", "Mean", "P5", "P95", "Tip%", "Div", "Time"
    );
    println!("  {}", "-".repeat(98));

    let suite_start = Instant::now();
    let mut scenario_reports = Vec::new();

    for scenario in &to_run {
        let thresholds = scenario.thresholds;
        let exceedance_levels = [thresholds.warning, thresholds.critical, thresholds.tipping];
        let ranges = (scenario.ranges)();

        let start = Instant::now();
        let result = match run_ensemble(
            &ranges,
            cli.runs,
            cli.seed,
            &exceedance_levels,
            scenario.member,
        ) {
            Ok(result) => result,
            Err(err) => {
                eprintln!("  {:<44} configuration error: {}", scenario.label, err);
                std::process::exit(1);
            }
        };
        let elapsed = start.elapsed();

        let mut phase_counts = [0usize; 4];
        for &terminal in &result.terminals {
            let phase = classify(terminal, &thresholds);
            phase_counts[(phase.index() - 1) as usize] += 1;
        }

        let terminal_energy = Stats::from_samples(&result.terminals);
        let mut exceedance = [0.0; 3];
        for (slot, &(_, fraction)) in exceedance.iter_mut().zip(result.exceedance.iter()) {
            *slot = fraction;
        }

        let report = ScenarioReport {
            scenario_name: scenario.name.to_string(),
            label: scenario.label.to_string(),
            category: scenario.category.to_string(),
            n_runs: cli.runs,
            diverged: result.failed.len(),
            p5: percentile(&result.terminals, 5.0),
            median: percentile(&result.terminals, 50.0),
            p95: percentile(&result.terminals, 95.0),
            terminal_energy,
            exceedance,
            phase_counts,
            elapsed_ms: elapsed.as_millis(),
        };

        println!(
            "  {:<44} {:>10.2} {:>10.2} {:>10.2} {:>5.1}% {:>6} {:>5}ms",
            report.label,
            report.terminal_energy.mean,
            report.p5,
            report.p95,
            report.exceedance[2] * 100.0,
            report.diverged,
            report.elapsed_ms,
        );

        scenario_reports.push(report);
    }

    let suite_elapsed = suite_start.elapsed();

    // ─── Summary ────────────────────────────────────────────────────────

    let total_members: usize = scenario_reports.iter().map(|r| r.n_runs).sum();
    let total_diverged: usize = scenario_reports.iter().map(|r| r.diverged).sum();
    let tipping_members: usize = scenario_reports
        .iter()
        .map(|r| r.phase_counts[(Phase::Tipping.index() - 1) as usize])
        .sum();
    let completed = total_members - total_diverged;
    let tipping_fraction = if completed > 0 {
        tipping_members as f64 / completed as f64
    } else {
        0.0
    };

    println!("  {}", "-".repeat(98));
    println!(
        "  Scenarios: {}  Members: {}  Diverged: {}  Tipping overall: {:.1}%  Suite time: {:.1}s\n",
        scenario_reports.len(),
        total_members,
        total_diverged,
        tipping_fraction * 100.0,
        suite_elapsed.as_secs_f64()
    );

    // ─── Write JSON Report ──────────────────────────────────────────────

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis();
    let timestamp = format!("{}", ts);

    let report = BenchReport {
        timestamp: timestamp.clone(),
        version: "0.2.0",
        prng: "ChaCha8Rng",
        n_runs_per_scenario: cli.runs,
        base_seed: cli.seed,
        summary: Summary {
            total_scenarios: scenario_reports.len(),
            total_members,
            total_diverged,
            tipping_fraction,
        },
        scenarios: scenario_reports,
    };

    let dir = std::path::Path::new("benchmark-results");
    if !dir.exists() {
        std::fs::create_dir_all(dir).expect("Failed to create benchmark-results/");
    }
    let path = dir.join(format!("bench-{}.json", timestamp));
    let json = serde_json::to_string_pretty(&report).expect("Failed to serialize");
    std::fs::write(&path, &json).expect("Failed to write benchmark file");
    println!("  Results saved to: {}\n", path.display());
}
