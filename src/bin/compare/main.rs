// Retarget Comparison Runner — every named algorithm over every scripted scenario
// Seedable ChaCha8 noise, per-pair statistics, optional per-block JSONL
//
// Usage:
//   cargo run --release --bin compare                          # All scenarios, 10 runs each
//   cargo run --release --bin compare -- --runs 3              # Quick mode
//   cargo run --release --bin compare -- SURGE                 # Filter by scenario name
//   cargo run --release --bin compare -- --network mainnet     # mainnet | testnet | simnet
//   cargo run --release --bin compare -- --params params.json  # Custom parameter set
//   cargo run --release --bin compare -- --gain 2.0            # Adaptive gain
//   cargo run --release --bin compare -- --time-series         # Per-block JSONL
//   RUST_LOG=debug cargo run --bin compare                     # Retarget diagnostics

mod report;
mod runner;
mod scenarios;

use log::info;
use report::*;
use scenarios::*;
use stake_retarget::{Algorithm, ParameterSet};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    runs: usize,
    seed: u64,
    gain: f64,
    network: String,
    params_path: Option<String>,
    time_series: bool,
    filter: Option<String>,
}

fn value_of<T: std::str::FromStr>(
    flag: &str,
    args: &mut impl Iterator<Item = String>,
) -> Result<T, String> {
    let raw = args.next().ok_or_else(|| format!("{} needs a value", flag))?;
    raw.parse().map_err(|_| format!("{}: cannot parse {:?}", flag, raw))
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs, String> {
    let mut cli = CliArgs {
        runs: 10,
        seed: 0,
        gain: 1.0,
        network: "simnet".to_string(),
        params_path: None,
        time_series: false,
        filter: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--runs" => cli.runs = value_of(&arg, &mut args)?,
            "--seed" => cli.seed = value_of(&arg, &mut args)?,
            "--gain" => cli.gain = value_of(&arg, &mut args)?,
            "--network" => cli.network = value_of(&arg, &mut args)?,
            "--params" => cli.params_path = Some(value_of(&arg, &mut args)?),
            "--time-series" => cli.time_series = true,
            flag if flag.starts_with('-') => return Err(format!("unknown argument: {}", flag)),
            _ => cli.filter = Some(arg),
        }
    }
    Ok(cli)
}

fn load_params(cli: &CliArgs) -> Result<ParameterSet, String> {
    if let Some(path) = &cli.params_path {
        let json = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
        return ParameterSet::from_json(&json).map_err(|e| format!("{}: {}", path, e));
    }
    match cli.network.as_str() {
        "mainnet" => Ok(ParameterSet::mainnet()),
        "testnet" => Ok(ParameterSet::testnet()),
        "simnet" => Ok(ParameterSet::simnet()),
        other => Err(format!("unknown network: {}", other)),
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    env_logger::init();
    let cli = match parse_args(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let params = match load_params(&cli) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Invalid parameters: {}", e);
            std::process::exit(2);
        }
    };

    let all_scenarios = scenarios();
    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f_lower = f.to_lowercase();
            all_scenarios.iter()
                .filter(|s| s.name.to_lowercase().contains(&f_lower)
                          || s.label.to_lowercase().contains(&f_lower))
                .collect()
        }
        None => all_scenarios.iter().collect(),
    };

    if to_run.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    let ts_dir = if cli.time_series {
        Some(std::path::Path::new("retarget-results/time-series").to_path_buf())
    } else {
        None
    };

    let algorithms = Algorithm::catalog(cli.gain);
    info!("parameters: {:?}", params);

    println!("\n  Retarget Comparison Runner");
    println!("  PRNG: ChaCha8Rng | Runs/pair: {} | Base seed: {} | Adaptive gain: {}",
        cli.runs, cli.seed, cli.gain);
    println!("  Running {} scenario(s) x {} algorithm(s)...\n", to_run.len(), algorithms.len());
    println!("  {:<14} {:<16} {:>12} {:>10} {:>10} {:>8} {:>7}",
        "Scenario", "Algorithm", "Final", "PoolDev%", "Vol", "Clamp%", "Fault%");
    println!("  {}", "-".repeat(84));

    let suite_start = Instant::now();
    let mut comparisons = Vec::new();

    for scenario in &to_run {
        for algorithm in &algorithms {
            let report = runner::run_pair(
                scenario,
                algorithm,
                &params,
                cli.runs,
                cli.seed,
                ts_dir.as_deref(),
            );

            println!("  {:<14} {:<16} {:>12.4} {:>9.2}% {:>10.4} {:>7.1}% {:>6.0}%",
                report.scenario,
                report.algorithm,
                report.final_price_coins.mean,
                report.mean_pool_deviation.mean * 100.0,
                report.price_volatility.mean,
                report.clamp_rate.mean * 100.0,
                report.fault_rate * 100.0,
            );
            if let Some(fault) = &report.first_fault {
                println!("  {:<14} ↳ {}", "", fault);
            }

            comparisons.push(report);
        }
    }

    println!("  {}", "-".repeat(84));
    println!("  Pairs: {}  Suite time: {:.1}s\n", comparisons.len(), suite_start.elapsed().as_secs_f64());

    // ─── Write JSON Report ──────────────────────────────────────────────

    let ts = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis();
    let timestamp = format!("{}", ts);

    let report = CompareReport {
        timestamp: timestamp.clone(),
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        network: cli.params_path.clone().unwrap_or(cli.network.clone()),
        gain: cli.gain,
        n_runs: cli.runs,
        comparisons,
    };

    let dir = std::path::Path::new("retarget-results");
    if !dir.exists() {
        std::fs::create_dir_all(dir).expect("Failed to create retarget-results/");
    }
    let path = dir.join(format!("compare-{}.json", timestamp));
    let json = serde_json::to_string_pretty(&report).expect("Failed to serialize");
    std::fs::write(&path, &json).expect("Failed to write comparison file");
    println!("  Results saved to: {}\n", path.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn flags_and_filter_parse() {
        let cli = parse_args(args(&["--runs", "3", "--gain", "2.5", "--time-series", "surge"]))
            .expect("test: valid args");
        assert_eq!(cli.runs, 3);
        assert_eq!(cli.gain, 2.5);
        assert!(cli.time_series);
        assert_eq!(cli.filter.as_deref(), Some("surge"));
        assert_eq!(cli.network, "simnet");
    }

    #[test]
    fn bad_values_are_reported() {
        assert!(parse_args(args(&["--runs", "many"])).is_err());
        assert!(parse_args(args(&["--seed"])).is_err());
        assert!(parse_args(args(&["--verbose"])).is_err());
    }
}
