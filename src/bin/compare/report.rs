// Comparison Report Types
// Structured output for offline analysis of retarget behaviour

use serde::Serialize;

// ─── Spread Across Seeds ────────────────────────────────────────────────────

/// Spread of one metric over the non-faulted seeds of a pair.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    /// All-zero for an empty sample; `std_dev` is the sample deviation.
    pub fn from_samples(samples: &[f64]) -> Self {
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
            return Self::default();
        };

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        let sq_dev: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum();
        let std_dev = if n > 1 { (sq_dev / (n - 1) as f64).sqrt() } else { 0.0 };

        Self { n, mean, median, std_dev, min, max }
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub scenario: String,
    pub algorithm: String,
    pub seed: u64,
    pub blocks: u32,
    pub final_price_coins: f64,
    pub min_price_coins: f64,
    pub max_price_coins: f64,
    /// Mean |pool - target| / target over the run.
    pub mean_pool_deviation: f64,
    /// Std-dev of log price change across retargets.
    pub price_volatility: f64,
    pub retarget_count: u64,
    pub clamp_count: u64,
    pub fault: Option<String>,
}

// ─── Aggregate Per Scenario x Algorithm ─────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub scenario: String,
    pub label: String,
    pub algorithm: String,
    pub runs: usize,
    pub fault_rate: f64,
    pub final_price_coins: Stats,
    pub mean_pool_deviation: Stats,
    pub price_volatility: Stats,
    pub clamp_rate: Stats,
    pub first_fault: Option<String>,
}

impl ComparisonReport {
    pub fn from_runs(scenario: &str, label: &str, algorithm: &str, runs: &[RunResult]) -> Self {
        let ok: Vec<&RunResult> = runs.iter().filter(|r| r.fault.is_none()).collect();
        let collect = |f: fn(&RunResult) -> f64| -> Vec<f64> { ok.iter().map(|r| f(r)).collect() };
        let faults = runs.len() - ok.len();
        Self {
            scenario: scenario.to_string(),
            label: label.to_string(),
            algorithm: algorithm.to_string(),
            runs: runs.len(),
            fault_rate: if runs.is_empty() { 0.0 } else { faults as f64 / runs.len() as f64 },
            final_price_coins: Stats::from_samples(&collect(|r| r.final_price_coins)),
            mean_pool_deviation: Stats::from_samples(&collect(|r| r.mean_pool_deviation)),
            price_volatility: Stats::from_samples(&collect(|r| r.price_volatility)),
            clamp_rate: Stats::from_samples(&collect(|r| {
                if r.retarget_count == 0 { 0.0 } else { r.clamp_count as f64 / r.retarget_count as f64 }
            })),
            first_fault: runs.iter().find_map(|r| r.fault.clone()),
        }
    }
}

// ─── Full Report ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CompareReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub network: String,
    pub gain: f64,
    pub n_runs: usize,
    pub comparisons: Vec<ComparisonReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fault: Option<&str>, price: f64) -> RunResult {
        RunResult {
            scenario: "STEADY".into(),
            algorithm: "ratio".into(),
            seed: 0,
            blocks: 10,
            final_price_coins: price,
            min_price_coins: price,
            max_price_coins: price,
            mean_pool_deviation: 0.0,
            price_volatility: 0.0,
            retarget_count: 4,
            clamp_count: 1,
            fault: fault.map(str::to_string),
        }
    }

    #[test]
    fn stats_of_constant_samples() {
        let s = Stats::from_samples(&[2.0, 2.0, 2.0]);
        assert_eq!(s.mean, 2.0);
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.n, 3);
    }

    #[test]
    fn stats_median_and_range_ignore_order() {
        let s = Stats::from_samples(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.median, 2.5);
        assert_eq!((s.min, s.max), (1.0, 4.0));
        assert_eq!(Stats::from_samples(&[]).n, 0);
    }

    #[test]
    fn faulted_runs_excluded_from_stats() {
        let runs = vec![run(None, 1.0), run(Some("pole"), 99.0), run(None, 3.0)];
        let report = ComparisonReport::from_runs("STEADY", "Steady", "ratio", &runs);
        assert_eq!(report.runs, 3);
        assert!((report.fault_rate - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.final_price_coins.mean, 2.0);
        assert_eq!(report.clamp_rate.mean, 0.25);
        assert_eq!(report.first_fault.as_deref(), Some("pole"));
    }
}
